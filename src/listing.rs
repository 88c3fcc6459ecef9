use anyhow::Result;
use scraper::{Html, Selector};
use tracing::info;

use crate::fetcher;

const BASE_URL: &str = "https://www.babylist.com";

/// Product detail pages live under /gp/.
const PRODUCT_PATH: &str = "/gp/";

/// Below this many hits the card selectors are assumed to have missed the
/// markup and the bare anchor fallback kicks in.
const MIN_EXPECTED_LINKS: usize = 10;

const LINK_SELECTORS: &[&str] = &[
    r#"a[data-testid*="product"][href]"#,
    ".product-card a[href]",
    r#"[class*="ProductCard"] a[href]"#,
    r#"[class*="product-grid"] a[href]"#,
];

const FALLBACK_SELECTOR: &str = r#"a[href*="/gp/"]"#;

/// Link fragments that mark a non-product anchor even when it sits under the
/// product path.
const EXCLUDE_TERMS: &[&str] = &["/reviews", "/registry", "?tab=", "/compare", "/share"];

/// Fetch one category listing page and return (url, category) pairs ready for
/// the queue.
pub async fn discover(listing_url: &str, category: &str) -> Result<Vec<(String, String)>> {
    let client = fetcher::build_client()?;
    info!("Fetching listing page: {}", listing_url);
    let html = fetcher::fetch_page(&client, listing_url).await?;

    let urls = extract_product_urls(&html);
    info!("Product pages discovered: {}", urls.len());
    Ok(urls.into_iter().map(|u| (u, category.to_string())).collect())
}

/// Pull product page URLs out of listing markup: card selectors first, bare
/// product-path anchors when the cards come up short. Order of first
/// appearance is kept and duplicates dropped.
pub fn extract_product_urls(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let mut hrefs: Vec<&str> = Vec::new();

    for src in LINK_SELECTORS {
        if let Ok(selector) = Selector::parse(src) {
            hrefs.extend(doc.select(&selector).filter_map(|el| el.value().attr("href")));
        }
    }

    if hrefs.len() < MIN_EXPECTED_LINKS {
        if let Ok(selector) = Selector::parse(FALLBACK_SELECTOR) {
            hrefs.extend(doc.select(&selector).filter_map(|el| el.value().attr("href")));
        }
    }

    let mut out: Vec<String> = Vec::new();
    for href in hrefs {
        let Some(url) = normalize_href(href) else { continue };
        if !out.contains(&url) {
            out.push(url);
        }
    }
    out
}

/// Absolutize against the site root and drop anything that isn't a plain
/// product page link.
fn normalize_href(href: &str) -> Option<String> {
    let href = href.split('#').next().unwrap_or(href).trim();
    if !href.contains(PRODUCT_PATH) {
        return None;
    }
    let lower = href.to_lowercase();
    if EXCLUDE_TERMS.iter().any(|t| lower.contains(t)) {
        return None;
    }

    if href.starts_with("http") {
        href.contains("babylist.com").then(|| href.to_string())
    } else if href.starts_with('/') {
        Some(format!("{}{}", BASE_URL, href))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_links_come_out_absolute_and_deduped() {
        let html = r#"<html><body>
            <div class="product-card"><a href="/gp/vista-v3/123">Vista</a></div>
            <div class="product-card"><a href="/gp/vista-v3/123">Vista again</a></div>
            <div class="product-card"><a href="https://www.babylist.com/gp/cruz-v2/456">Cruz</a></div>
        </body></html>"#;
        let urls = extract_product_urls(html);
        assert_eq!(
            urls,
            vec![
                "https://www.babylist.com/gp/vista-v3/123".to_string(),
                "https://www.babylist.com/gp/cruz-v2/456".to_string(),
            ]
        );
    }

    #[test]
    fn fallback_scans_bare_anchors_when_cards_are_missing() {
        let html = r#"<html><body>
            <a href="/gp/keyfit-35/789">KeyFit 35</a>
            <a href="/about">About us</a>
            <a href="/gp/keyfit-35/789/reviews">Reviews</a>
        </body></html>"#;
        let urls = extract_product_urls(html);
        assert_eq!(urls, vec!["https://www.babylist.com/gp/keyfit-35/789".to_string()]);
    }

    #[test]
    fn offsite_and_fragment_links_are_dropped() {
        assert_eq!(normalize_href("https://evil.example.com/gp/x/1"), None);
        assert_eq!(
            normalize_href("/gp/x/1#details"),
            Some("https://www.babylist.com/gp/x/1".to_string())
        );
        assert_eq!(normalize_href("/gp/x/1?tab=reviews"), None);
    }
}
