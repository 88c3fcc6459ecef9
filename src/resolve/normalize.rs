//! Per-field canonicalizers. A normalizer maps an accepted candidate to the
//! exact string stored on the record; returning `None` sends the chain back
//! to probing, so a value that survives validation but cannot be put into
//! canonical form never reaches the record half-formed.

use crate::resolve::probe::Candidate;
use crate::resolve::tables::{BRANDS, PRICE_PATTERNS, TITLE_SUFFIX};

pub fn identity(c: &Candidate) -> Option<String> {
    let v = c.value.trim();
    if v.is_empty() { None } else { Some(v.to_string()) }
}

/// Strip the site suffix browsers append to the document title.
pub fn name(c: &Candidate) -> Option<String> {
    let cleaned = TITLE_SUFFIX.replace(c.value.trim(), "").trim().to_string();
    if cleaned.is_empty() { None } else { Some(cleaned) }
}

/// Canonical casing from the brand list, whatever case the page used.
pub fn brand(c: &Candidate) -> Option<String> {
    let lower = c.value.trim().to_lowercase();
    BRANDS
        .iter()
        .find(|b| b.to_lowercase() == lower)
        .map(|b| b.to_string())
}

/// Always "$" + amount, keeping the page's cents and thousands separators.
pub fn price(c: &Candidate) -> Option<String> {
    let raw = c.value.trim();
    let amount = PRICE_PATTERNS
        .iter()
        .find_map(|p| p.captures(raw))
        .map(|caps| caps[1].to_string())
        .or_else(|| {
            let bare = raw.trim_start_matches('$').replace(',', "");
            bare.parse::<f64>().ok().map(|_| raw.trim_start_matches('$').to_string())
        })?;
    Some(format!("${}", amount))
}

/// Three axes joined as `W" x D" x H"` with inch marks restored.
pub fn dimensions(c: &Candidate) -> Option<String> {
    match c.groups.as_slice() {
        [a, b, c] => Some(format!(r#"{a}" x {b}" x {c}""#)),
        _ => None,
    }
}

pub fn weight(c: &Candidate) -> Option<String> {
    let n: f64 = c.value.trim().parse().ok()?;
    Some(format!("{} lbs", n))
}

/// Bare numeric score, e.g. "4.7 out of 5 stars" becomes "4.7".
pub fn rating(c: &Candidate) -> Option<String> {
    let n = crate::resolve::validate::score(&c.value)?;
    Some(n.to_string())
}

pub fn sku(c: &Candidate) -> Option<String> {
    identity(c)
}

/// Protocol-relative URLs get pinned to https.
pub fn image(c: &Candidate) -> Option<String> {
    let v = c.value.trim();
    if let Some(rest) = v.strip_prefix("//") {
        Some(format!("https://{}", rest))
    } else {
        Some(v.to_string())
    }
}

pub fn color(c: &Candidate) -> Option<String> {
    identity(c)
}

pub fn tag(c: &Candidate) -> Option<String> {
    identity(c).map(|v| v.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::probe::Source;

    fn cand(value: &str) -> Candidate {
        Candidate {
            value: value.to_string(),
            groups: Vec::new(),
            source: Source::Element,
            context: None,
        }
    }

    #[test]
    fn name_drops_site_suffix() {
        assert_eq!(
            name(&cand("Vista V3 Stroller | Babylist Shop")).as_deref(),
            Some("Vista V3 Stroller")
        );
        assert_eq!(name(&cand("Vista V3 Stroller")).as_deref(), Some("Vista V3 Stroller"));
    }

    #[test]
    fn price_is_always_dollar_prefixed() {
        assert_eq!(price(&cand("$449.99")).as_deref(), Some("$449.99"));
        assert_eq!(price(&cand("449.99")).as_deref(), Some("$449.99"));
        assert_eq!(price(&cand("Price: $1,299.00")).as_deref(), Some("$1,299.00"));
        assert_eq!(price(&cand("call for price")), None);
    }

    #[test]
    fn dimensions_restore_inch_marks() {
        let mut c = cand("12");
        c.groups = vec!["12".into(), "24".into(), "36".into()];
        assert_eq!(dimensions(&c).as_deref(), Some(r#"12" x 24" x 36""#));
    }

    #[test]
    fn rating_keeps_only_the_score() {
        assert_eq!(rating(&cand("4.7 out of 5 stars")).as_deref(), Some("4.7"));
    }

    #[test]
    fn brand_restores_canonical_casing() {
        assert_eq!(brand(&cand("uppababy")).as_deref(), Some("UPPAbaby"));
        assert_eq!(brand(&cand("nobody")), None);
    }

    #[test]
    fn image_pins_protocol_relative_urls() {
        assert_eq!(
            image(&cand("//cdn.example.com/a.jpg")).as_deref(),
            Some("https://cdn.example.com/a.jpg")
        );
    }
}
