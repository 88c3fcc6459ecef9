use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, StatusCode};
use rusqlite::Connection;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::db::{QueuedPage, ScrapeRow};

const CONCURRENCY: usize = 8;
const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 2000;
const POLITENESS_MS: u64 = 2000;
const REQUEST_TIMEOUT_SECS: u64 = 30;

const UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                  (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Scrape stats returned after completion.
pub struct ScrapeStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

pub fn build_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(UA));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .context("failed to build http client")
}

/// Fetch one page and return its body as text.
pub async fn fetch_page(client: &Client, url: &str) -> Result<String> {
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        anyhow::bail!("GET {} returned {}", url, status);
    }
    Ok(resp.text().await?)
}

/// Fetch pages concurrently, saving each result to the DB as it arrives. A
/// single writer owns the connection; workers only touch the channel.
pub async fn scrape_pages_streaming(
    conn: &Connection,
    pages: Vec<QueuedPage>,
) -> Result<ScrapeStats> {
    let client = Arc::new(build_client()?);
    let semaphore = Arc::new(Semaphore::new(CONCURRENCY));
    let total = pages.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    // Channel: workers send results, main loop saves to DB
    let (tx, mut rx) = tokio::sync::mpsc::channel::<ScrapeRow>(CONCURRENCY * 2);

    for page in pages {
        let client = Arc::clone(&client);
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let Ok(_permit) = sem.acquire().await else { return };
            tokio::time::sleep(Duration::from_millis(POLITENESS_MS)).await;
            let row = fetch_with_retry(&client, &page).await;
            let _ = tx.send(row).await;
        });
    }

    // Drop our copy of tx so rx closes when all spawned tasks finish
    drop(tx);

    let mut ok = 0usize;
    let mut errors = 0usize;

    let mut insert_stmt = conn.prepare(
        "INSERT INTO page_data (page_id, url, category, html, status, error, latency_ms)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    let mut update_stmt = conn.prepare(
        "UPDATE pages SET visited = 1, visited_at = datetime('now') WHERE id = ?1",
    )?;

    while let Some(row) = rx.recv().await {
        if row.error.is_some() {
            errors += 1;
        } else {
            ok += 1;
        }
        save_one(&mut insert_stmt, &mut update_stmt, &row)?;
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("Fetched {} pages ({} ok, {} errors)", total, ok, errors);

    Ok(ScrapeStats { total, ok, errors })
}

fn save_one(
    insert: &mut rusqlite::Statement,
    update: &mut rusqlite::Statement,
    row: &ScrapeRow,
) -> Result<()> {
    insert.execute(rusqlite::params![
        row.page_id,
        row.url,
        row.category,
        row.html,
        row.status,
        row.error,
        row.latency_ms,
    ])?;
    update.execute(rusqlite::params![row.page_id])?;
    Ok(())
}

async fn fetch_with_retry(client: &Client, page: &QueuedPage) -> ScrapeRow {
    let mut row = fetch_one(client, page).await;
    for attempt in 0..MAX_RETRIES {
        if !should_retry(&row) {
            return row;
        }
        let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
        warn!(
            "Retryable failure on {} (attempt {}/{}), backing off {:.1}s",
            page.url,
            attempt + 1,
            MAX_RETRIES,
            backoff.as_secs_f64()
        );
        tokio::time::sleep(backoff).await;
        row = fetch_one(client, page).await;
    }
    row
}

fn should_retry(row: &ScrapeRow) -> bool {
    match row.status.map(|s| StatusCode::from_u16(s as u16)) {
        Some(Ok(status)) => {
            status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
        }
        // No status at all means a transport error; worth one more try.
        _ => row.error.is_some(),
    }
}

async fn fetch_one(client: &Client, page: &QueuedPage) -> ScrapeRow {
    let start = Instant::now();
    let response = client.get(&page.url).send().await;
    let elapsed = start.elapsed().as_millis() as i64;

    let base = |html, status, error| ScrapeRow {
        page_id: page.page_id,
        url: page.url.clone(),
        category: page.category.clone(),
        html,
        status,
        error,
        latency_ms: Some(elapsed),
    };

    match response {
        Ok(resp) => {
            let status = resp.status();
            if !status.is_success() {
                return base(None, Some(status.as_u16() as i32), Some(format!("http {}", status)));
            }
            match resp.text().await {
                Ok(body) if looks_like_html(&body) => {
                    base(Some(body), Some(status.as_u16() as i32), None)
                }
                Ok(_) => base(
                    None,
                    Some(status.as_u16() as i32),
                    Some("response body is not an html document".to_string()),
                ),
                Err(e) => base(None, Some(status.as_u16() as i32), Some(e.to_string())),
            }
        }
        Err(e) => base(None, e.status().map(|s| s.as_u16() as i32), Some(e.to_string())),
    }
}

/// Cheap sanity check before a body is worth storing. Only the leading slice
/// is scanned; the cut is walked back to a char boundary so multibyte bodies
/// can't panic the worker task.
fn looks_like_html(body: &str) -> bool {
    let mut cut = body.len().min(2048);
    while cut > 0 && !body.is_char_boundary(cut) {
        cut -= 1;
    }
    let head = &body[..cut];
    head.contains("<html") || head.contains("<!DOCTYPE") || head.contains("<body")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: Option<i32>, error: Option<&str>) -> ScrapeRow {
        ScrapeRow {
            page_id: 1,
            url: "https://www.babylist.com/gp/x/1".to_string(),
            category: "Strollers".to_string(),
            html: None,
            status,
            error: error.map(str::to_string),
            latency_ms: Some(10),
        }
    }

    #[test]
    fn rate_limits_and_server_errors_retry() {
        assert!(should_retry(&row(Some(429), Some("http 429"))));
        assert!(should_retry(&row(Some(503), Some("http 503"))));
        assert!(!should_retry(&row(Some(404), Some("http 404"))));
        assert!(!should_retry(&row(Some(200), None)));
    }

    #[test]
    fn transport_errors_retry() {
        assert!(should_retry(&row(None, Some("connection reset"))));
    }

    #[test]
    fn html_sniffing() {
        assert!(looks_like_html("<!DOCTYPE html><html></html>"));
        assert!(!looks_like_html("{\"error\": \"blocked\"}"));
    }

    #[test]
    fn html_sniffing_survives_multibyte_bodies() {
        // A two-byte char straddling the scan cutoff must not panic.
        let mut body = String::from("<html><body>");
        body.push_str(&"a".repeat(2047 - body.len()));
        body.push('é');
        body.push_str(&"b".repeat(100));
        assert!(looks_like_html(&body));

        // Odd-length prefix keeps every following two-byte char off the
        // cutoff's byte alignment.
        let mut junk = String::from("{\"key\":\"");
        junk.push('x');
        junk.push_str(&"é".repeat(2048));
        assert!(!looks_like_html(&junk));
    }
}
