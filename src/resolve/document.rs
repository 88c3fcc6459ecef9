use scraper::{ElementRef, Html, Node, Selector};
use serde_json::Value;
use tracing::debug;

use crate::resolve::error::ResolveError;
use crate::resolve::tables::{DETAIL_HEADING_SELECTORS, DETAIL_KEYWORDS};

/// Normalized, queryable view of one fetched product page: the parsed markup
/// tree, a whitespace-collapsed plain-text projection (script/style excluded),
/// and any JSON-LD blocks that parsed cleanly. Immutable once constructed.
#[derive(Debug)]
pub struct Document {
    html: Html,
    text: String,
    details_text: Option<String>,
    structured: Vec<Value>,
}

impl Document {
    /// Build a Document from raw markup. html5ever is error-tolerant and will
    /// produce a tree for almost anything, so "cannot be parsed" is defined as
    /// input that carries no recognizable markup at all.
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        if raw.trim().is_empty() {
            return Err(ResolveError::EmptyDocument);
        }
        if !raw.contains("<html") && !raw.contains("<body") && !raw.contains("<div") {
            return Err(ResolveError::UnparseableMarkup);
        }

        let html = Html::parse_document(raw);
        let text = projected_text(html.root_element());
        let details_text = details_region(&html);
        let structured = parse_json_ld(&html);

        Ok(Self { html, text, details_text, structured })
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Whole-document plain text, whitespace collapsed.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text of the details/specs region if one was located, else the full text.
    pub fn details_or_text(&self) -> &str {
        self.details_text.as_deref().unwrap_or(&self.text)
    }

    pub fn structured(&self) -> &[Value] {
        &self.structured
    }

    /// Collapsed text content of one element.
    pub fn element_text(el: ElementRef) -> String {
        collapse(&el.text().collect::<String>())
    }
}

/// Recursively search structured-data trees for the first-listed alias hits.
/// Mapping nodes are checked alias-by-alias before descending into their
/// values; sequence nodes are searched elementwise. The input is finite and
/// acyclic, so unbounded recursion terminates.
pub fn search_structured(values: &[Value], aliases: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    for value in values {
        search_value(value, aliases, &mut out);
    }
    out
}

fn search_value(value: &Value, aliases: &[&str], out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for alias in aliases {
                match map.get(*alias) {
                    Some(Value::String(s)) if !s.trim().is_empty() => {
                        out.push(s.trim().to_string());
                    }
                    Some(Value::Number(n)) => out.push(n.to_string()),
                    _ => {}
                }
            }
            for nested in map.values() {
                search_value(nested, aliases, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                search_value(item, aliases, out);
            }
        }
        _ => {}
    }
}

/// Flatten the element's subtree to text, skipping script/style subtrees so
/// JSON-LD payloads don't leak into pattern matching.
fn projected_text(root: ElementRef) -> String {
    let mut buf = String::new();
    collect_text(*root, &mut buf);
    collapse(&buf)
}

fn collect_text(node: ego_tree::NodeRef<Node>, buf: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => {
                buf.push_str(&text.text);
                buf.push(' ');
            }
            Node::Element(el) if matches!(el.name(), "script" | "style" | "noscript") => {}
            Node::Element(_) => collect_text(child, buf),
            _ => {}
        }
    }
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Locate the "Details"/"Specs" region: a heading-ish element whose own text
/// mentions a detail keyword, scoped to its parent's subtree.
fn details_region(html: &Html) -> Option<String> {
    let selector = Selector::parse(&DETAIL_HEADING_SELECTORS.join(", ")).ok()?;
    let mut regions = Vec::new();

    for heading in html.select(&selector) {
        let label = Document::element_text(heading).to_lowercase();
        if !DETAIL_KEYWORDS.iter().any(|kw| label.contains(kw)) {
            continue;
        }
        let scope = heading
            .parent()
            .and_then(ElementRef::wrap)
            .unwrap_or(heading);
        let text = projected_text(scope);
        if !text.is_empty() {
            regions.push(text);
        }
    }

    if regions.is_empty() { None } else { Some(regions.join(" ")) }
}

fn parse_json_ld(html: &Html) -> Vec<Value> {
    let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return Vec::new();
    };

    let mut blocks = Vec::new();
    for script in html.select(&selector) {
        let body: String = script.text().collect();
        match serde_json::from_str::<Value>(&body) {
            Ok(value) => blocks.push(value),
            Err(e) => debug!("skipping malformed JSON-LD block: {}", e),
        }
    }
    blocks
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_fails_closed() {
        assert!(matches!(Document::parse("   "), Err(ResolveError::EmptyDocument)));
    }

    #[test]
    fn non_markup_fails_closed() {
        let err = Document::parse("just some plain text, no tags").unwrap_err();
        assert!(matches!(err, ResolveError::UnparseableMarkup));
    }

    #[test]
    fn text_projection_skips_scripts() {
        let doc = Document::parse(
            r#"<html><body><p>Visible   text</p><script>var hidden = 1;</script></body></html>"#,
        )
        .unwrap();
        assert_eq!(doc.text(), "Visible text");
    }

    #[test]
    fn json_ld_parsed_and_bad_blocks_skipped() {
        let doc = Document::parse(
            r#"<html><body>
            <script type="application/ld+json">{"sku": "ABC-1234"}</script>
            <script type="application/ld+json">{not json</script>
            </body></html>"#,
        )
        .unwrap();
        assert_eq!(doc.structured().len(), 1);
        assert_eq!(search_structured(doc.structured(), &["sku"]), vec!["ABC-1234"]);
    }

    #[test]
    fn structured_search_recurses_into_lists_and_objects() {
        let value: Value = serde_json::from_str(
            r#"{"@graph": [{"offers": {"sku": "XYZ-99"}}, {"name": "thing"}]}"#,
        )
        .unwrap();
        assert_eq!(search_structured(&[value], &["sku"]), vec!["XYZ-99"]);
    }

    #[test]
    fn details_region_scoped_by_heading() {
        let doc = Document::parse(
            r#"<html><body>
            <div><h3>Product Details</h3><p>Weight: 19.8 lbs</p></div>
            <div><h3>Reviews</h3><p>Great!</p></div>
            </body></html>"#,
        )
        .unwrap();
        assert!(doc.details_or_text().contains("19.8 lbs"));
        assert!(!doc.details_or_text().contains("Great!"));
    }
}
