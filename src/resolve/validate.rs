//! Per-field acceptance predicates. A validator answers one question: is this
//! candidate plausibly a value of the field, regardless of where it came from.
//! Rejection is silent; the chain just keeps probing.

use crate::resolve::probe::{Candidate, Source};
use crate::resolve::tables::{
    BRANDS, COLOR_MAX_LEN, COLOR_MIN_LEN, COLOR_SHAPE, COLOR_VOCABULARY, DESCRIPTION_MIN_LEN,
    IMAGE_SKIP_TERMS, NAME_COLOR_STOPWORDS, NON_COLOR_PHRASES, RATING_MAX, RATING_PATTERNS,
    SKU_ELEMENT_MAX_LEN, SKU_TEXT_MAX_LEN, SKU_TEXT_MIN_LEN, TAG_MAX_LEN,
};

pub fn non_empty(c: &Candidate) -> bool {
    !c.value.trim().is_empty()
}

pub fn name(c: &Candidate) -> bool {
    c.value.trim().len() > 3
}

/// Brand is exact membership in the known-brand list, case-insensitive.
pub fn brand(c: &Candidate) -> bool {
    let lower = c.value.trim().to_lowercase();
    BRANDS.iter().any(|b| b.to_lowercase() == lower)
}

pub fn description(c: &Candidate) -> bool {
    c.value.trim().len() >= DESCRIPTION_MIN_LEN
}

pub fn price(c: &Candidate) -> bool {
    non_empty(c)
}

/// Color acceptance. The action-phrase blocklist wins over everything, so
/// "Select Black" never passes no matter how black it is. After that a
/// candidate passes if it carries a known color word, or simply looks like a
/// short color name (letters, spaces, slash, ampersand, hyphen). Title
/// fragments are held to the vocabulary and may not contain product nouns
/// like "stroller".
pub fn color(c: &Candidate) -> bool {
    let v = c.value.trim();
    if v.len() < COLOR_MIN_LEN || v.len() > COLOR_MAX_LEN {
        return false;
    }
    // List fields are stored comma-joined, so a comma inside a value would
    // corrupt the round-trip. A real color name never carries one anyway.
    if v.contains(',') {
        return false;
    }
    let lower = v.to_lowercase();
    if NON_COLOR_PHRASES.iter().any(|p| lower.contains(p)) {
        return false;
    }
    if v.chars().all(|ch| ch.is_ascii_digit() || ch.is_whitespace()) {
        return false;
    }
    // Slash combos ("Jet/Black") need both halves to be real words.
    if v.contains('/') && lower.split('/').any(|part| part.trim().len() <= 2) {
        return false;
    }

    let vocab_hit = COLOR_VOCABULARY.iter().any(|w| lower.contains(w));
    if c.source == Source::Name {
        return vocab_hit && !NAME_COLOR_STOPWORDS.iter().any(|w| lower.contains(w));
    }
    vocab_hit || (COLOR_SHAPE.is_match(v) && v.split_whitespace().count() <= 3)
}

pub fn dimensions(c: &Candidate) -> bool {
    c.groups.len() == 3
        && c.groups
            .iter()
            .all(|g| g.parse::<f64>().map(|n| n > 0.0) == Ok(true))
}

pub fn weight(c: &Candidate) -> bool {
    c.value.parse::<f64>().map(|n| n > 0.0) == Ok(true)
}

/// Out-of-scale ratings ("9 out of 5 stars") are rejected, not clamped.
/// Longer texts must match a rating phrasing so review counts and other
/// numbers inside rating widgets don't slip through.
pub fn rating(c: &Candidate) -> bool {
    score(&c.value).map(|n| (0.0..=RATING_MAX).contains(&n)) == Some(true)
}

pub(crate) fn score(text: &str) -> Option<f64> {
    let v = text.trim();
    if let Ok(n) = v.parse::<f64>() {
        return Some(n);
    }
    RATING_PATTERNS
        .iter()
        .find_map(|p| p.captures(v))
        .and_then(|caps| caps[1].parse().ok())
}

/// SKU shape check. Values lifted out of loose page text get a tight length
/// band and must carry a digit; values from dedicated elements or structured
/// data only need the character set and a sane length.
pub fn sku(c: &Candidate) -> bool {
    let v = c.value.trim();
    if v.is_empty() || !v.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return false;
    }
    match c.source {
        Source::TextPattern => {
            (SKU_TEXT_MIN_LEN..=SKU_TEXT_MAX_LEN).contains(&v.len())
                && v.chars().any(|ch| ch.is_ascii_digit())
        }
        _ => v.len() <= SKU_ELEMENT_MAX_LEN,
    }
}

pub fn image(c: &Candidate) -> bool {
    let v = c.value.trim();
    if !(v.starts_with("http") || v.starts_with("//")) {
        return false;
    }
    let lower = v.to_lowercase();
    !IMAGE_SKIP_TERMS.iter().any(|t| lower.contains(t))
}

pub fn tag(c: &Candidate) -> bool {
    let v = c.value.trim();
    !v.is_empty() && v.len() <= TAG_MAX_LEN && !v.contains(',')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(value: &str, source: Source) -> Candidate {
        Candidate { value: value.to_string(), groups: Vec::new(), source, context: None }
    }

    #[test]
    fn action_phrases_beat_color_words() {
        assert!(!color(&cand("Select Black", Source::Attribute)));
        assert!(!color(&cand("Add to Cart", Source::Attribute)));
        assert!(color(&cand("Black", Source::Attribute)));
    }

    #[test]
    fn swatch_colors_may_be_off_vocabulary() {
        assert!(color(&cand("Aurora", Source::Attribute)));
        assert!(color(&cand("Aurora", Source::Element)));
        assert!(!color(&cand("Aurora", Source::Name)));
        assert!(color(&cand("Midnight Navy", Source::Element)));
    }

    #[test]
    fn title_fragments_reject_product_nouns() {
        assert!(!color(&cand("Gray Stroller", Source::Name)));
        assert!(color(&cand("Slate Gray", Source::Name)));
    }

    #[test]
    fn list_values_may_not_contain_commas() {
        assert!(!color(&cand("Gray, Blue", Source::Attribute)));
        assert!(!tag(&cand("reversible, washable", Source::TextPattern)));
        assert!(color(&cand("Gray", Source::Attribute)));
        assert!(tag(&cand("reversible", Source::TextPattern)));
    }

    #[test]
    fn slash_combo_needs_real_halves() {
        assert!(color(&cand("Jet/Black", Source::Attribute)));
        assert!(!color(&cand("S/Black", Source::Attribute)));
    }

    #[test]
    fn rating_scale_is_closed() {
        assert!(rating(&cand("4.7 out of 5 stars", Source::Element)));
        assert!(rating(&cand("5", Source::TextPattern)));
        assert!(!rating(&cand("9 out of 5 stars", Source::Element)));
        assert!(!rating(&cand("no stars here", Source::Element)));
        assert!(!rating(&cand("1,234 reviews", Source::Element)));
    }

    #[test]
    fn text_skus_need_digits_and_length() {
        assert!(sku(&cand("ABC-1234", Source::TextPattern)));
        assert!(!sku(&cand("Number", Source::TextPattern)));
        assert!(!sku(&cand("AB1", Source::TextPattern)));
        assert!(sku(&cand("X1", Source::Structured)));
        assert!(!sku(&cand("has spaces 123", Source::Structured)));
    }

    #[test]
    fn dimensions_need_three_positive_axes() {
        let mut c = cand("12", Source::TextPattern);
        c.groups = vec!["12".into(), "24".into(), "36".into()];
        assert!(dimensions(&c));
        c.groups = vec!["12".into(), "0".into(), "36".into()];
        assert!(!dimensions(&c));
        c.groups = vec!["12".into(), "24".into()];
        assert!(!dimensions(&c));
    }

    #[test]
    fn chrome_images_are_skipped() {
        assert!(image(&cand("https://cdn.example.com/p/123.jpg", Source::Attribute)));
        assert!(image(&cand("//cdn.example.com/p/123.jpg", Source::Attribute)));
        assert!(!image(&cand("https://cdn.example.com/sprite-logo.png", Source::Attribute)));
        assert!(!image(&cand("/relative/path.jpg", Source::Attribute)));
    }
}
