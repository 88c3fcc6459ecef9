pub mod chain;
pub mod document;
pub mod error;
pub mod normalize;
pub mod probe;
pub mod record;
pub mod tables;
pub mod taxonomy;
pub mod validate;

use tracing::warn;

use crate::db::ScrapedPage;
use document::Document;
pub use record::ProductRecord;
pub use tables::SENTINEL;

/// Resolve one fetched page into a product record. A page whose body cannot
/// be turned into a document fails closed: every field comes back as the
/// sentinel rather than a partial record.
pub fn process_page(page: &ScrapedPage) -> ProductRecord {
    match Document::parse(&page.html) {
        Ok(doc) => record::assemble(&doc, &page.url, &page.category),
        Err(e) => {
            warn!(url = %page.url, error = %e, "unusable page, recording unknowns");
            ProductRecord::unknown(&page.url, &page.category)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(html: &str) -> ScrapedPage {
        ScrapedPage {
            page_data_id: 1,
            url: "https://www.babylist.com/gp/test/12345".to_string(),
            category: "Strollers".to_string(),
            html: html.to_string(),
        }
    }

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
    }

    #[test]
    fn rich_page_resolves_most_fields() {
        let rec = process_page(&page(&fixture("stroller.html")));
        assert_eq!(rec.name, "UPPAbaby Vista V3 Stroller - Gray");
        assert_eq!(rec.brand, "UPPAbaby");
        assert_eq!(rec.price, "$999.99");
        assert_eq!(rec.sku, "ABC-1234");
        assert_eq!(rec.rating, "4.7");
        assert_eq!(rec.dimensions, r#"25.7" x 36" x 39.5""#);
        assert_eq!(rec.weight, "26.3 lbs");
        assert!(rec.color_options.contains(&"Midnight Navy".to_string()));
        assert!(rec.color_options.contains(&"Gray".to_string()));
        assert_eq!(rec.simplified_colors, vec!["Black".to_string(), "Gray".to_string()]);
        assert!(rec.tags.contains(&"reversible".to_string()));
        assert_eq!(rec.image_url, "https://images.example.com/products/vista-v3.jpg");
        assert_eq!(rec.retailer, "Babylist");
    }

    #[test]
    fn sparse_page_fills_sentinels_without_failing() {
        let rec = process_page(&page(&fixture("carseat.html")));
        assert_eq!(rec.name, "Chicco KeyFit 35 Infant Car Seat");
        assert_eq!(rec.brand, "Chicco");
        assert_eq!(rec.price, "$229.99");
        assert_eq!(rec.sku, SENTINEL);
        assert_eq!(rec.dimensions, SENTINEL);
        assert_eq!(rec.color_options, vec![SENTINEL.to_string()]);
        assert_eq!(rec.simplified_colors, vec![SENTINEL.to_string()]);
    }

    #[test]
    fn unusable_page_fails_closed_to_all_sentinels() {
        let rec = process_page(&page(&fixture("broken.html")));
        assert_eq!(rec.name, SENTINEL);
        assert_eq!(rec.price, SENTINEL);
        assert_eq!(rec.category, "Strollers");
        assert_eq!(rec.retailer_url, "https://www.babylist.com/gp/test/12345");
        assert_eq!(rec.resolved_fields(), 0);
    }

    #[test]
    fn empty_body_fails_closed_too() {
        let rec = process_page(&page(""));
        assert_eq!(rec.resolved_fields(), 0);
    }
}
