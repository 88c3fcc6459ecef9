use crate::resolve::tables::SENTINEL;

/// Canonical color categories in priority order. Membership is a
/// case-insensitive substring test over the keyword set; the first category
/// with a hit wins, so "Midnight Navy" lands in Black (via "midnight")
/// before Blue (via "navy") ever gets a look.
///
/// Keyword placement follows the majority vote across the source lists:
/// charcoal and slate are Gray, cream is White, midnight and onyx are Black.
pub const CATEGORIES: &[(&str, &[&str])] = &[
    ("Black", &["black", "midnight", "onyx"]),
    ("White", &["white", "ivory", "pearl", "cream"]),
    ("Gray", &["gray", "grey", "silver", "slate", "stone", "charcoal"]),
    ("Blue", &["blue", "navy", "teal", "aqua", "ocean"]),
    ("Red", &["red", "burgundy", "wine", "crimson"]),
    ("Green", &["green", "olive", "forest", "sage"]),
    (
        "Brown",
        &["brown", "tan", "beige", "khaki", "taupe", "bronze", "coffee", "espresso", "chocolate"],
    ),
    ("Pink", &["pink", "rose", "blush", "coral"]),
    ("Purple", &["purple", "lavender", "plum"]),
    ("Yellow", &["yellow", "gold"]),
];

pub const OTHER: &str = "Other";

/// Map a raw color name to its canonical category, or "Other".
pub fn categorize(color: &str) -> &'static str {
    if color.trim().is_empty() || color == SENTINEL {
        return OTHER;
    }
    let lower = color.to_lowercase();
    for (category, keywords) in CATEGORIES {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return category;
        }
    }
    OTHER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_keywords() {
        for (category, keywords) in CATEGORIES {
            assert!(!keywords.is_empty(), "{} has no keywords", category);
        }
    }

    #[test]
    fn canonical_names_are_idempotent() {
        for (category, _) in CATEGORIES {
            assert_eq!(categorize(category), *category);
        }
        assert_eq!(categorize(OTHER), OTHER);
    }

    #[test]
    fn midnight_beats_navy() {
        assert_eq!(categorize("Midnight Navy"), "Black");
    }

    #[test]
    fn synonyms() {
        assert_eq!(categorize("Charcoal Tweed"), "Gray");
        assert_eq!(categorize("Sage"), "Green");
        assert_eq!(categorize("Rose Gold"), "Pink");
        assert_eq!(categorize("espresso"), "Brown");
    }

    #[test]
    fn unknown_and_sentinel_are_other() {
        assert_eq!(categorize("Aurora"), OTHER);
        assert_eq!(categorize("N/A"), OTHER);
        assert_eq!(categorize(""), OTHER);
    }
}
