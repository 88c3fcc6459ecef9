use crate::resolve::chain::CHAINS;
use crate::resolve::document::Document;
use crate::resolve::probe::ProbeCtx;
use crate::resolve::tables::{RETAILER, SENTINEL};
use crate::resolve::taxonomy;

/// One fully resolved product. Every scalar field is either a validated,
/// normalized value or the sentinel; list fields are never empty, holding the
/// sentinel alone when nothing resolved. No field is ever an empty string.
#[derive(Debug, Clone)]
pub struct ProductRecord {
    pub name: String,
    pub brand: String,
    pub description: String,
    pub category: String,
    pub price: String,
    pub retailer: String,
    pub retailer_url: String,
    pub color_options: Vec<String>,
    pub simplified_colors: Vec<String>,
    pub dimensions: String,
    pub weight: String,
    pub rating: String,
    pub sku: String,
    pub tags: Vec<String>,
    pub image_url: String,
}

impl ProductRecord {
    /// All-sentinel record for pages that produced no usable document.
    pub fn unknown(url: &str, category: &str) -> Self {
        Self {
            name: SENTINEL.to_string(),
            brand: SENTINEL.to_string(),
            description: SENTINEL.to_string(),
            category: field_or_sentinel(category),
            price: SENTINEL.to_string(),
            retailer: RETAILER.to_string(),
            retailer_url: field_or_sentinel(url),
            color_options: vec![SENTINEL.to_string()],
            simplified_colors: vec![SENTINEL.to_string()],
            dimensions: SENTINEL.to_string(),
            weight: SENTINEL.to_string(),
            rating: SENTINEL.to_string(),
            sku: SENTINEL.to_string(),
            tags: vec![SENTINEL.to_string()],
            image_url: SENTINEL.to_string(),
        }
    }

    /// Count of fields that resolved to something other than the sentinel,
    /// for the completeness summaries.
    pub fn resolved_fields(&self) -> usize {
        let scalars = [
            &self.name,
            &self.brand,
            &self.description,
            &self.price,
            &self.dimensions,
            &self.weight,
            &self.rating,
            &self.sku,
            &self.image_url,
        ];
        let mut n = scalars.iter().filter(|v| v.as_str() != SENTINEL).count();
        if self.color_options.first().map(String::as_str) != Some(SENTINEL) {
            n += 1;
        }
        if self.tags.first().map(String::as_str) != Some(SENTINEL) {
            n += 1;
        }
        n
    }
}

/// Run every chain against the document and assemble the record. Name goes
/// first so the title-derived brand and color probes have it in context.
pub fn assemble(doc: &Document, url: &str, category: &str) -> ProductRecord {
    let name = CHAINS.name.resolve(doc, &ProbeCtx::default()).single();
    let ctx = ProbeCtx { name: name.as_deref() };

    let color_options = CHAINS
        .colors
        .resolve(doc, &ctx)
        .values()
        .unwrap_or_else(|| vec![SENTINEL.to_string()]);
    let simplified_colors = simplify(&color_options);

    ProductRecord {
        // ctx borrows name for the title-derived chains below.
        name: or_sentinel(name.clone()),
        brand: or_sentinel(CHAINS.brand.resolve(doc, &ctx).single()),
        description: or_sentinel(CHAINS.description.resolve(doc, &ctx).single()),
        category: field_or_sentinel(category),
        price: or_sentinel(CHAINS.price.resolve(doc, &ctx).single()),
        retailer: RETAILER.to_string(),
        retailer_url: field_or_sentinel(url),
        color_options,
        simplified_colors,
        dimensions: or_sentinel(CHAINS.dimensions.resolve(doc, &ctx).single()),
        weight: or_sentinel(CHAINS.weight.resolve(doc, &ctx).single()),
        rating: or_sentinel(CHAINS.rating.resolve(doc, &ctx).single()),
        sku: or_sentinel(CHAINS.sku.resolve(doc, &ctx).single()),
        tags: CHAINS
            .tags
            .resolve(doc, &ctx)
            .values()
            .unwrap_or_else(|| vec![SENTINEL.to_string()]),
        image_url: or_sentinel(CHAINS.image.resolve(doc, &ctx).single()),
    }
}

/// Map each raw color through the taxonomy, deduping while keeping category
/// order of first appearance.
fn simplify(colors: &[String]) -> Vec<String> {
    if colors.first().map(String::as_str) == Some(SENTINEL) {
        return vec![SENTINEL.to_string()];
    }
    let mut out: Vec<String> = Vec::new();
    for color in colors {
        let category = taxonomy::categorize(color);
        if !out.iter().any(|c| c == category) {
            out.push(category.to_string());
        }
    }
    if out.is_empty() {
        vec![SENTINEL.to_string()]
    } else {
        out
    }
}

fn or_sentinel(value: Option<String>) -> String {
    value.unwrap_or_else(|| SENTINEL.to_string())
}

fn field_or_sentinel(value: &str) -> String {
    if value.trim().is_empty() {
        SENTINEL.to_string()
    } else {
        value.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_record_has_no_empty_fields() {
        let rec = ProductRecord::unknown("https://example.com/p", "Strollers");
        assert_eq!(rec.name, SENTINEL);
        assert_eq!(rec.category, "Strollers");
        assert_eq!(rec.retailer, RETAILER);
        assert_eq!(rec.color_options, vec![SENTINEL.to_string()]);
        assert_eq!(rec.resolved_fields(), 0);
    }

    #[test]
    fn simplify_dedupes_categories_in_order() {
        let colors = vec![
            "Midnight Navy".to_string(),
            "Gray".to_string(),
            "Onyx Black".to_string(),
        ];
        assert_eq!(simplify(&colors), vec!["Black".to_string(), "Gray".to_string()]);
    }

    #[test]
    fn sentinel_colors_simplify_to_sentinel() {
        assert_eq!(simplify(&[SENTINEL.to_string()]), vec![SENTINEL.to_string()]);
    }

    #[test]
    fn title_derived_fields_share_the_resolved_name() {
        let doc = Document::parse(
            r#"<html><head><title>Nuna Pipa Lite in Frost Gray | Babylist</title></head>
            <body><div id="app"><p>Lightweight infant seat.</p></div></body></html>"#,
        )
        .unwrap();
        let rec = assemble(&doc, "https://example.com/pipa", "Car Seats");
        assert_eq!(rec.name, "Nuna Pipa Lite in Frost Gray");
        assert_eq!(rec.brand, "Nuna");
        assert_eq!(rec.color_options, vec!["Frost Gray".to_string()]);
        assert_eq!(rec.simplified_colors, vec!["Gray".to_string()]);
    }

    #[test]
    fn assemble_fills_everything() {
        let doc = Document::parse(
            r#"<html><head><title>UPPAbaby Cruz V2 Stroller - Gray | Babylist</title></head>
            <body>
              <h1 class="product-title">UPPAbaby Cruz V2 Stroller - Gray</h1>
              <span class="price">$649.99</span>
              <div><h3>Details</h3><p>Dimensions: 22.8 x 36.5 x 40.5. Weight: 25.9 lbs.</p></div>
            </body></html>"#,
        )
        .unwrap();
        let rec = assemble(&doc, "https://example.com/cruz", "Strollers");
        assert_eq!(rec.name, "UPPAbaby Cruz V2 Stroller - Gray");
        assert_eq!(rec.brand, "UPPAbaby");
        assert_eq!(rec.price, "$649.99");
        assert_eq!(rec.dimensions, r#"22.8" x 36.5" x 40.5""#);
        assert_eq!(rec.weight, "25.9 lbs");
        assert_eq!(rec.color_options, vec!["Gray".to_string()]);
        assert_eq!(rec.simplified_colors, vec!["Gray".to_string()]);
        assert_eq!(rec.description, SENTINEL);
    }
}
