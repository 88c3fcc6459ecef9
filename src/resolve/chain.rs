//! The per-field strategy chains and the state machine that drives them.
//! Each field owns an ordered list of probes plus one validator and one
//! normalizer; resolution walks the probes until a candidate survives both,
//! or every probe is exhausted and the field stays unknown.

use std::sync::LazyLock;

use tracing::debug;

use crate::resolve::document::Document;
use crate::resolve::normalize;
use crate::resolve::probe::{Candidate, Probe, ProbeCtx, TextScope};
use crate::resolve::tables::{
    ALT_COLOR_PATTERN, ALT_IMAGE_SELECTORS, BRAND_SELECTORS, COLOR_ATTRS, COLOR_SELECTORS,
    DESCRIPTION_META_SELECTORS, DESCRIPTION_SELECTORS, DIMENSION_PATTERNS, IMAGE_ATTRS,
    IMAGE_META_SELECTORS, IMAGE_SELECTORS, JSON_DESCRIPTION_ALIASES, JSON_SKU_ALIASES,
    META_CONTENT_ATTRS, NAME_COLOR_PATTERNS, NAME_SELECTORS, PRICE_PATTERNS, PRICE_SELECTORS,
    RATING_PATTERNS, RATING_SELECTORS, SKU_PATTERNS, SKU_SELECTORS, TAG_SELECTORS,
    TITLE_SELECTOR, WEIGHT_PATTERNS,
};
use crate::resolve::validate;

const ALT_ATTRS: &[&str] = &["alt"];

/// Lifecycle of one field resolution, logged at debug level. Validated is
/// transient: a candidate that passes validation but fails normalization
/// drops the field back to Probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainState {
    NotStarted,
    Probing,
    Validated,
    Resolved,
    Unknown,
}

/// Outcome of running a chain. `Unknown` is an ordinary outcome, never an
/// error; the record layer substitutes the sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(Vec<String>),
    Unknown,
}

impl Resolution {
    pub fn single(self) -> Option<String> {
        match self {
            Resolution::Resolved(mut values) if !values.is_empty() => Some(values.remove(0)),
            _ => None,
        }
    }

    pub fn values(self) -> Option<Vec<String>> {
        match self {
            Resolution::Resolved(values) if !values.is_empty() => Some(values),
            _ => None,
        }
    }
}

pub struct FieldChain {
    pub field: &'static str,
    probes: Vec<Probe>,
    validate: fn(&Candidate) -> bool,
    normalize: fn(&Candidate) -> Option<String>,
    /// Multi-valued chains exhaust every probe and union the survivors;
    /// single-valued chains stop at the first survivor.
    multi: bool,
}

impl FieldChain {
    pub fn resolve(&self, doc: &Document, ctx: &ProbeCtx) -> Resolution {
        let mut state = ChainState::NotStarted;
        let mut values: Vec<String> = Vec::new();

        for (idx, probe) in self.probes.iter().enumerate() {
            state = ChainState::Probing;
            let candidates = probe.candidates(doc, ctx);
            debug!(
                field = self.field,
                probe = idx,
                candidates = candidates.len(),
                "probe ran"
            );
            for candidate in &candidates {
                if !(self.validate)(candidate) {
                    debug!(
                        field = self.field,
                        value = %candidate.value,
                        context = ?candidate.context,
                        "candidate rejected"
                    );
                    continue;
                }
                state = ChainState::Validated;
                let Some(value) = (self.normalize)(candidate) else {
                    state = ChainState::Probing;
                    continue;
                };
                if self.multi {
                    if !values.iter().any(|v| v.eq_ignore_ascii_case(&value)) {
                        values.push(value);
                    }
                } else {
                    values.push(value);
                    state = ChainState::Resolved;
                    break;
                }
            }
            if state == ChainState::Resolved {
                break;
            }
        }

        // Multi chains exhaust the probe list still in Probing or Validated;
        // anything they collected counts as resolved.
        state = match state {
            ChainState::Resolved => ChainState::Resolved,
            _ if !values.is_empty() => ChainState::Resolved,
            _ => ChainState::Unknown,
        };
        debug!(field = self.field, state = ?state, count = values.len(), "chain done");

        match state {
            ChainState::Resolved => Resolution::Resolved(values),
            _ => Resolution::Unknown,
        }
    }
}

/// The full chain roster for a product page. Name is not in the map: it
/// resolves ahead of everything else because the title-derived probes need it
/// in their context.
pub struct ChainSet {
    pub name: FieldChain,
    pub brand: FieldChain,
    pub description: FieldChain,
    pub price: FieldChain,
    pub colors: FieldChain,
    pub dimensions: FieldChain,
    pub weight: FieldChain,
    pub rating: FieldChain,
    pub sku: FieldChain,
    pub image: FieldChain,
    pub tags: FieldChain,
}

pub static CHAINS: LazyLock<ChainSet> = LazyLock::new(ChainSet::standard);

impl ChainSet {
    fn standard() -> Self {
        Self {
            name: FieldChain {
                field: "name",
                probes: vec![
                    Probe::Elements { selectors: Probe::compile(NAME_SELECTORS) },
                    Probe::Elements { selectors: Probe::compile(TITLE_SELECTOR) },
                ],
                validate: validate::name,
                normalize: normalize::name,
                multi: false,
            },
            brand: FieldChain {
                field: "brand",
                probes: vec![
                    Probe::Elements { selectors: Probe::compile(BRAND_SELECTORS) },
                    Probe::BrandInName,
                ],
                validate: validate::brand,
                normalize: normalize::brand,
                multi: false,
            },
            description: FieldChain {
                field: "description",
                probes: vec![
                    Probe::Attributes {
                        selectors: Probe::compile(DESCRIPTION_META_SELECTORS),
                        attrs: META_CONTENT_ATTRS,
                        include_text: false,
                        refine: None,
                    },
                    Probe::Structured { aliases: JSON_DESCRIPTION_ALIASES },
                    Probe::Elements { selectors: Probe::compile(DESCRIPTION_SELECTORS) },
                ],
                validate: validate::description,
                normalize: normalize::identity,
                multi: false,
            },
            price: FieldChain {
                field: "price",
                probes: vec![
                    Probe::Elements { selectors: Probe::compile(PRICE_SELECTORS) },
                    Probe::Patterns { patterns: &PRICE_PATTERNS, scope: TextScope::Full },
                ],
                validate: validate::price,
                normalize: normalize::price,
                multi: false,
            },
            colors: FieldChain {
                field: "colors",
                probes: vec![
                    Probe::Attributes {
                        selectors: Probe::compile(COLOR_SELECTORS),
                        attrs: COLOR_ATTRS,
                        include_text: true,
                        refine: None,
                    },
                    Probe::TitleColors { patterns: &NAME_COLOR_PATTERNS },
                    Probe::Attributes {
                        selectors: Probe::compile(ALT_IMAGE_SELECTORS),
                        attrs: ALT_ATTRS,
                        include_text: false,
                        refine: Some(&ALT_COLOR_PATTERN),
                    },
                ],
                validate: validate::color,
                normalize: normalize::color,
                multi: true,
            },
            dimensions: FieldChain {
                field: "dimensions",
                probes: vec![Probe::Patterns {
                    patterns: &DIMENSION_PATTERNS,
                    scope: TextScope::Details,
                }],
                validate: validate::dimensions,
                normalize: normalize::dimensions,
                multi: false,
            },
            weight: FieldChain {
                field: "weight",
                probes: vec![Probe::Patterns {
                    patterns: &WEIGHT_PATTERNS,
                    scope: TextScope::Details,
                }],
                validate: validate::weight,
                normalize: normalize::weight,
                multi: false,
            },
            rating: FieldChain {
                field: "rating",
                probes: vec![
                    Probe::Elements { selectors: Probe::compile(RATING_SELECTORS) },
                    Probe::Patterns { patterns: &RATING_PATTERNS, scope: TextScope::Full },
                ],
                validate: validate::rating,
                normalize: normalize::rating,
                multi: false,
            },
            // Structured data leads: a JSON-LD sku is authoritative over
            // anything matched out of page text.
            sku: FieldChain {
                field: "sku",
                probes: vec![
                    Probe::Structured { aliases: JSON_SKU_ALIASES },
                    Probe::Elements { selectors: Probe::compile(SKU_SELECTORS) },
                    Probe::Patterns { patterns: &SKU_PATTERNS, scope: TextScope::Full },
                ],
                validate: validate::sku,
                normalize: normalize::sku,
                multi: false,
            },
            image: FieldChain {
                field: "image",
                probes: vec![
                    Probe::Attributes {
                        selectors: Probe::compile(IMAGE_META_SELECTORS),
                        attrs: META_CONTENT_ATTRS,
                        include_text: false,
                        refine: None,
                    },
                    Probe::Attributes {
                        selectors: Probe::compile(IMAGE_SELECTORS),
                        attrs: IMAGE_ATTRS,
                        include_text: false,
                        refine: None,
                    },
                ],
                validate: validate::image,
                normalize: normalize::image,
                multi: false,
            },
            tags: FieldChain {
                field: "tags",
                probes: vec![
                    Probe::FeatureKeywords,
                    Probe::Elements { selectors: Probe::compile(TAG_SELECTORS) },
                ],
                validate: validate::tag,
                normalize: normalize::tag,
                multi: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> Document {
        Document::parse(&format!("<html><body>{}</body></html>", body)).unwrap()
    }

    #[test]
    fn single_chain_takes_first_survivor() {
        let doc = doc(
            r#"<span class="price">Call us</span>
               <span class="price">$449.99</span>"#,
        );
        let res = CHAINS.price.resolve(&doc, &ProbeCtx::default());
        assert_eq!(res.single().as_deref(), Some("$449.99"));
    }

    #[test]
    fn unresolved_chain_reports_unknown() {
        let doc = doc("<p>nothing useful here at all</p>");
        assert_eq!(CHAINS.sku.resolve(&doc, &ProbeCtx::default()), Resolution::Unknown);
    }

    #[test]
    fn structured_sku_beats_text_match() {
        let doc = doc(
            r#"<script type="application/ld+json">{"sku": "LD-0001"}</script>
               <p>SKU: TXT-9999</p>"#,
        );
        let res = CHAINS.sku.resolve(&doc, &ProbeCtx::default());
        assert_eq!(res.single().as_deref(), Some("LD-0001"));
    }

    #[test]
    fn multi_chain_unions_and_dedupes() {
        let doc = doc(
            r#"<button class="color-option" data-color="Midnight Navy"></button>
               <button class="color-option" data-color="midnight navy"></button>"#,
        );
        let ctx = ProbeCtx { name: Some("Vista V3 Stroller - Gray") };
        let values = CHAINS.colors.resolve(&doc, &ctx).values().unwrap();
        assert_eq!(values, vec!["Midnight Navy".to_string(), "Gray".to_string()]);
    }

    #[test]
    fn title_only_color_falls_out_of_the_name() {
        let doc = doc("<p>no swatches on this page</p>");
        let ctx = ProbeCtx { name: Some("Pivot Xpand Travel System in Sage Green") };
        let values = CHAINS.colors.resolve(&doc, &ctx).values().unwrap();
        assert_eq!(values, vec!["Sage Green".to_string()]);
    }

    #[test]
    fn rating_falls_back_to_page_text() {
        let doc = doc("<p>Parents rate it 4.7 out of 5 stars.</p>");
        let res = CHAINS.rating.resolve(&doc, &ProbeCtx::default());
        assert_eq!(res.single().as_deref(), Some("4.7"));

        let bad = Document::parse("<html><body><p>9 out of 5 stars</p></body></html>").unwrap();
        assert_eq!(CHAINS.rating.resolve(&bad, &ProbeCtx::default()), Resolution::Unknown);
    }
}
