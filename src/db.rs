use anyhow::Result;
use rusqlite::Connection;

use crate::resolve::ProductRecord;

const DB_PATH: &str = "data/babylist.sqlite";

/// Separator used to store list fields in a single TEXT column.
const LIST_SEP: &str = ", ";

pub fn connect() -> Result<Connection> {
    if let Some(dir) = std::path::Path::new(DB_PATH).parent() {
        std::fs::create_dir_all(dir)?;
    }
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS pages (
            id         INTEGER PRIMARY KEY,
            url        TEXT UNIQUE NOT NULL,
            category   TEXT NOT NULL,
            visited    BOOLEAN NOT NULL DEFAULT 0,
            visited_at TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_pages_visited ON pages(visited);

        CREATE TABLE IF NOT EXISTS page_data (
            id         INTEGER PRIMARY KEY,
            page_id    INTEGER NOT NULL REFERENCES pages(id),
            url        TEXT NOT NULL,
            category   TEXT NOT NULL,
            html       TEXT,
            status     INTEGER,
            error      TEXT,
            latency_ms INTEGER,
            scraped_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_page_data_url ON page_data(url);

        -- Resolved product records, one per page URL
        CREATE TABLE IF NOT EXISTS products (
            url               TEXT PRIMARY KEY,
            name              TEXT NOT NULL,
            brand             TEXT NOT NULL,
            description       TEXT NOT NULL,
            category          TEXT NOT NULL,
            price             TEXT NOT NULL,
            retailer          TEXT NOT NULL,
            color_options     TEXT NOT NULL,
            simplified_colors TEXT NOT NULL,
            dimensions        TEXT NOT NULL,
            weight            TEXT NOT NULL,
            rating            TEXT NOT NULL,
            sku               TEXT NOT NULL,
            tags              TEXT NOT NULL,
            image_url         TEXT NOT NULL,
            resolved_fields   INTEGER NOT NULL DEFAULT 0,
            created_at        TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_products_category ON products(category);
        CREATE INDEX IF NOT EXISTS idx_products_brand ON products(brand);
        ",
    )?;
    Ok(())
}

// ── Scraping ──

pub fn insert_pages(conn: &Connection, pages: &[(String, String)]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt =
            tx.prepare("INSERT OR IGNORE INTO pages (url, category) VALUES (?1, ?2)")?;
        for (url, category) in pages {
            count += stmt.execute(rusqlite::params![url, category])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub struct QueuedPage {
    pub page_id: i64,
    pub url: String,
    pub category: String,
}

pub fn fetch_unvisited(conn: &Connection, limit: Option<usize>) -> Result<Vec<QueuedPage>> {
    let sql = format!(
        "SELECT id, url, category FROM pages WHERE visited = 0 ORDER BY id{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(QueuedPage { page_id: row.get(0)?, url: row.get(1)?, category: row.get(2)? })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub struct ScrapeRow {
    pub page_id: i64,
    pub url: String,
    pub category: String,
    pub html: Option<String>,
    pub status: Option<i32>,
    pub error: Option<String>,
    pub latency_ms: Option<i64>,
}

// ── Processing ──

pub struct ScrapedPage {
    pub page_data_id: i64,
    pub url: String,
    pub category: String,
    pub html: String,
}

pub fn fetch_unprocessed(conn: &Connection, limit: Option<usize>) -> Result<Vec<ScrapedPage>> {
    let sql = format!(
        "SELECT pd.id, pd.url, pd.category, pd.html
         FROM page_data pd
         LEFT JOIN products p ON p.url = pd.url
         WHERE pd.html IS NOT NULL AND p.url IS NULL
         ORDER BY pd.id{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ScrapedPage {
                page_data_id: row.get(0)?,
                url: row.get(1)?,
                category: row.get(2)?,
                html: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn save_products(conn: &Connection, records: &[ProductRecord]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO products
             (url, name, brand, description, category, price, retailer,
              color_options, simplified_colors, dimensions, weight, rating,
              sku, tags, image_url, resolved_fields)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)",
        )?;
        for r in records {
            stmt.execute(rusqlite::params![
                r.retailer_url,
                r.name,
                r.brand,
                r.description,
                r.category,
                r.price,
                r.retailer,
                r.color_options.join(LIST_SEP),
                r.simplified_colors.join(LIST_SEP),
                r.dimensions,
                r.weight,
                r.rating,
                r.sku,
                r.tags.join(LIST_SEP),
                r.image_url,
                r.resolved_fields() as i64,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

// ── Export / overview ──

pub fn fetch_products(conn: &Connection) -> Result<Vec<ProductRecord>> {
    let mut stmt = conn.prepare(
        "SELECT url, name, brand, description, category, price, retailer,
                color_options, simplified_colors, dimensions, weight, rating,
                sku, tags, image_url
         FROM products ORDER BY category, name",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ProductRecord {
                retailer_url: row.get(0)?,
                name: row.get(1)?,
                brand: row.get(2)?,
                description: row.get(3)?,
                category: row.get(4)?,
                price: row.get(5)?,
                retailer: row.get(6)?,
                color_options: split_list(row.get::<_, String>(7)?),
                simplified_colors: split_list(row.get::<_, String>(8)?),
                dimensions: row.get(9)?,
                weight: row.get(10)?,
                rating: row.get(11)?,
                sku: row.get(12)?,
                tags: split_list(row.get::<_, String>(13)?),
                image_url: row.get(14)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn split_list(joined: String) -> Vec<String> {
    joined.split(LIST_SEP).map(str::to_string).collect()
}

pub struct OverviewRow {
    pub name: String,
    pub brand: String,
    pub category: String,
    pub price: String,
    pub rating: String,
    pub simplified_colors: String,
    pub resolved_fields: i64,
}

pub fn fetch_overview(
    conn: &Connection,
    category: Option<&str>,
    limit: usize,
) -> Result<Vec<OverviewRow>> {
    let (where_clause, params): (&str, Vec<&dyn rusqlite::types::ToSql>) = match &category {
        Some(c) => (" WHERE category = ?1", vec![c as &dyn rusqlite::types::ToSql]),
        None => ("", Vec::new()),
    };
    let sql = format!(
        "SELECT name, brand, category, price, rating, simplified_colors, resolved_fields
         FROM products{}
         ORDER BY resolved_fields DESC, name
         LIMIT {}",
        where_clause, limit
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params.as_slice(), |row| {
            Ok(OverviewRow {
                name: row.get(0)?,
                brand: row.get(1)?,
                category: row.get(2)?,
                price: row.get(3)?,
                rating: row.get(4)?,
                simplified_colors: row.get(5)?,
                resolved_fields: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub total: usize,
    pub visited: usize,
    pub unvisited: usize,
    pub scraped: usize,
    pub errors: usize,
    pub processed: usize,
    pub avg_resolved: f64,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let total: usize = conn.query_row("SELECT COUNT(*) FROM pages", [], |r| r.get(0))?;
    let visited: usize =
        conn.query_row("SELECT COUNT(*) FROM pages WHERE visited = 1", [], |r| r.get(0))?;
    let scraped: usize = conn.query_row("SELECT COUNT(*) FROM page_data", [], |r| r.get(0))?;
    let errors: usize = conn.query_row(
        "SELECT COUNT(*) FROM page_data WHERE error IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let processed: usize =
        conn.query_row("SELECT COUNT(*) FROM products", [], |r| r.get(0))?;
    let avg_resolved: f64 = conn.query_row(
        "SELECT COALESCE(AVG(resolved_fields), 0.0) FROM products",
        [],
        |r| r.get(0),
    )?;
    Ok(Stats {
        total,
        visited,
        unvisited: total - visited,
        scraped,
        errors,
        processed,
        avg_resolved,
    })
}
