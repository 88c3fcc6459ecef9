//! Static extraction configuration: selector cascades, regex pattern lists,
//! vocabularies and bounds. Everything here is read-only and process-wide;
//! the compiled chains share it across worker threads.

use std::sync::LazyLock;

use regex::Regex;

/// Placeholder recorded for any field with no validated candidate.
pub const SENTINEL: &str = "N/A";

pub const RETAILER: &str = "Babylist";

// ── Selector cascades (tried in order, first selector with matches wins) ──

pub const NAME_SELECTORS: &[&str] = &[
    r#"h1[data-testid*="title"]"#,
    r#"h1[class*="title"]"#,
    r#"h1[class*="name"]"#,
    ".product-title",
    ".product-name",
    "h1",
];

pub const TITLE_SELECTOR: &[&str] = &["title"];

pub const BRAND_SELECTORS: &[&str] =
    &[r#"[data-testid*="brand"]"#, ".brand", r#"[class*="brand"]"#];

pub const DESCRIPTION_META_SELECTORS: &[&str] =
    &[r#"meta[name="description"]"#, r#"meta[property="og:description"]"#];

pub const DESCRIPTION_SELECTORS: &[&str] = &[
    r#"[data-testid*="description"]"#,
    ".product-description",
    r#"[class*="ProductDescription"]"#,
    r#"[class*="description"]"#,
    "main p",
];

pub const PRICE_SELECTORS: &[&str] = &[
    r#"[data-testid*="price"]"#,
    ".price",
    ".product-price",
    ".current-price",
    r#"[class*="price"]"#,
    ".cost",
    ".amount",
];

pub const SKU_SELECTORS: &[&str] = &[
    r#"[data-testid*="sku"]"#,
    ".sku",
    ".product-sku",
    ".item-number",
    r#"[class*="sku"]"#,
];

pub const RATING_SELECTORS: &[&str] = &[
    r#"[data-testid*="rating"]"#,
    ".rating",
    ".stars",
    ".review-score",
    r#"[class*="rating"]"#,
    r#"[class*="stars"]"#,
];

pub const IMAGE_META_SELECTORS: &[&str] = &[r#"meta[property="og:image"]"#];

pub const IMAGE_SELECTORS: &[&str] = &[
    r#"img[data-testid*="product"]"#,
    ".product-image img",
    ".product-hero img",
    ".product-gallery img",
    r#"[data-testid*="image"] img"#,
    "main img",
    r#"img[src*="product"]"#,
    r#"img[class*="product"]"#,
    "img[src]",
];

pub const COLOR_SELECTORS: &[&str] = &[
    r#"[data-testid*="color"]"#,
    r#"[data-testid*="variant"]"#,
    ".color-option",
    ".variant-option",
    r#"[class*="ColorOption"]"#,
    r#"[class*="VariantOption"]"#,
    "button[data-color]",
    r#"[role="radio"]"#,
    r#"[class*="swatch"]"#,
    r#"select[name*="color"] option"#,
    r#"select[aria-label*="color"] option"#,
];

pub const ALT_IMAGE_SELECTORS: &[&str] = &["img[alt]"];

pub const TAG_SELECTORS: &[&str] = &[
    r#"[data-testid*="tag"]"#,
    r#"[class*="tag"]"#,
    r#"[data-testid*="feature"]"#,
    r#"[class*="feature"]"#,
];

/// Attributes read off color swatch/variant elements, most specific first.
pub const COLOR_ATTRS: &[&str] = &["data-color", "data-value", "title", "aria-label", "alt"];

pub const META_CONTENT_ATTRS: &[&str] = &["content"];

pub const IMAGE_ATTRS: &[&str] = &["content", "src"];

// ── Regex pattern lists (ordered, first match wins) ──

pub static PRICE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_patterns(&[
        r"\$(\d+(?:,\d{3})*(?:\.\d{2})?)",
        r"(?i)price[:\s]*\$?(\d+(?:,\d{3})*(?:\.\d{2})?)",
        r"(?i)costs?\s*\$?(\d+(?:,\d{3})*(?:\.\d{2})?)",
    ])
});

pub static SKU_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_patterns(&[
        r"(?i)sku[:\s#]*([A-Za-z0-9_-]+)",
        r"(?i)item\s*#?[:\s]*([A-Za-z0-9_-]+)",
        r"(?i)model[:\s#]*([A-Za-z0-9_-]+)",
    ])
});

pub static DIMENSION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_patterns(&[
        // Labeled triple: 33.3" L x 25.7" W x 39.5" H
        r#"(?i)(\d+(?:\.\d+)?)\s*["″']*\s*L\s*[xX×]\s*(\d+(?:\.\d+)?)\s*["″']*\s*W\s*[xX×]\s*(\d+(?:\.\d+)?)\s*["″']*\s*H"#,
        // "Dimensions: 12 x 24 x 36" (units optional)
        r#"(?i)dimensions?[:\s]*(\d+(?:\.\d+)?)\s*["″']*\s*[xX×]\s*(\d+(?:\.\d+)?)\s*["″']*\s*[xX×]\s*(\d+(?:\.\d+)?)"#,
        // Fold-state prefixed: "Unfolded: 36 x 25.7 x 39.5"
        r#"(?i)(?:unfolded|folded|open)[:\s]*(\d+(?:\.\d+)?)\s*["″']*\s*[xX×]\s*(\d+(?:\.\d+)?)\s*["″']*\s*[xX×]\s*(\d+(?:\.\d+)?)"#,
        // Other labels seen in product spec tables
        r#"(?i)(?:overall|seat)\s+dimensions?[:\s]*(\d+(?:\.\d+)?)\s*["″']*\s*[xX×]\s*(\d+(?:\.\d+)?)\s*["″']*\s*[xX×]\s*(\d+(?:\.\d+)?)"#,
        r#"(?i)size[:\s]*(\d+(?:\.\d+)?)\s*["″']*\s*[xX×]\s*(\d+(?:\.\d+)?)\s*["″']*\s*[xX×]\s*(\d+(?:\.\d+)?)"#,
    ])
});

pub static WEIGHT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_patterns(&[
        r"(?i)weight[:\s]*(\d+(?:\.\d+)?)\s*(?:lbs?|pounds?)",
        r"(?i)weighs?\s*(\d+(?:\.\d+)?)\s*(?:lbs?|pounds?)",
        r"(?i)(\d+(?:\.\d+)?)\s*(?:lbs?|pounds?)\s*(?:weight|when folded)",
        r"(?i)(?:frame\s*\+\s*seat|stroller)[:\s]*(\d+(?:\.\d+)?)\s*lbs?",
    ])
});

pub static RATING_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_patterns(&[
        r"(?i)(\d+(?:\.\d+)?)\s*(?:out of|/)\s*5\s*stars?",
        r"(?i)rating[:\s]*(\d+(?:\.\d+)?)",
        r"(?i)rated\s*(\d+(?:\.\d+)?)",
    ])
});

/// Title decompositions that may carry a color: trailing "- X", "in X",
/// parenthetical "(X)".
pub static NAME_COLOR_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_patterns(&[
        r"\s+-\s+([A-Za-z][A-Za-z\s/&-]*?)\s*$",
        r"(?i)\bin\s+(\w+(?:\s+\w+)?)\s*$",
        r"\(([A-Za-z][A-Za-z\s/&-]*)\)",
    ])
});

/// Color mention inside an image alt text: "... in Midnight Navy, front view".
pub static ALT_COLOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:in|frame|seat)\s+([A-Za-z][A-Za-z\s/&-]+?)(?:,|\.|$)").unwrap()
});

pub static TITLE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\|\s*Babylist.*$").unwrap());

pub static COLOR_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\s/&-]+$").unwrap());

// ── Vocabularies ──

/// Known brands; the brand validator is exact (case-insensitive) membership.
pub const BRANDS: &[&str] = &[
    "UPPAbaby",
    "Bugaboo",
    "Baby Jogger",
    "BOB",
    "Chicco",
    "Graco",
    "Britax",
    "Nuna",
    "Maxi-Cosi",
    "Cybex",
    "Stokke",
    "Doona",
    "Evenflo",
    "Summer Infant",
    "Joovy",
    "Phil & Teds",
    "Mountain Buggy",
    "Thule",
    "Safety 1st",
    "Cosco",
    "Peg Perego",
    "Clek",
    "Diono",
];

/// Action phrases that disqualify a string from being a color, no matter
/// what else it contains.
pub const NON_COLOR_PHRASES: &[&str] =
    &["select", "choose", "add", "cart", "buy", "quantity", "shipping", "size"];

/// Substrings that positively indicate a color name. Wider than the ten
/// canonical names: includes synonyms and the frame/seat/canopy words that
/// product listings attach to colorway names.
pub const COLOR_VOCABULARY: &[&str] = &[
    "black", "white", "gray", "grey", "blue", "red", "green", "brown", "pink", "purple",
    "yellow", "navy", "teal", "sage", "olive", "burgundy", "plum", "coral", "cream", "ivory",
    "charcoal", "slate", "midnight", "forest", "ocean", "rose", "gold", "silver", "bronze",
    "copper", "beige", "taupe", "almond", "frame", "seat", "canopy",
];

/// Product words that rule out a title-derived fragment as a color.
pub const NAME_COLOR_STOPWORDS: &[&str] =
    &["stroller", "car", "seat", "system", "baby", "jogger", "travel"];

/// Feature keywords scanned in page text for the tags field.
pub const FEATURE_KEYWORDS: &[&str] = &[
    "lightweight",
    "compact",
    "foldable",
    "travel",
    "jogging",
    "all-terrain",
    "reversible",
    "adjustable",
    "safety",
    "storage",
    "canopy",
    "one-hand",
    "quick-fold",
    "umbrella",
];

/// Heading words that mark the product details/specs region of a page.
pub const DETAIL_KEYWORDS: &[&str] = &["detail", "spec", "dimension", "size", "measurement"];

pub const DETAIL_HEADING_SELECTORS: &[&str] = &["h2", "h3", "h4", "strong", "b", "dt", "th"];

// ── JSON-LD field aliases ──

pub const JSON_DESCRIPTION_ALIASES: &[&str] = &["description", "productDescription"];

pub const JSON_SKU_ALIASES: &[&str] = &["sku"];

// ── Bounds ──

pub const COLOR_MIN_LEN: usize = 3;
pub const COLOR_MAX_LEN: usize = 100;
pub const DESCRIPTION_MIN_LEN: usize = 20;
pub const SKU_TEXT_MIN_LEN: usize = 5;
pub const SKU_TEXT_MAX_LEN: usize = 20;
pub const SKU_ELEMENT_MAX_LEN: usize = 50;
pub const TAG_MAX_LEN: usize = 50;
pub const RATING_MAX: f64 = 5.0;

/// URL fragments that mark an image as chrome rather than product imagery.
pub const IMAGE_SKIP_TERMS: &[&str] = &["icon", "logo", "sprite", "button", "arrow"];

fn compile_patterns(sources: &[&str]) -> Vec<Regex> {
    sources
        .iter()
        .map(|src| Regex::new(src).expect("static pattern must compile"))
        .collect()
}
