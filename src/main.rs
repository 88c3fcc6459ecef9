mod db;
mod export;
mod fetcher;
mod listing;
mod resolve;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "babylist_scraper", about = "Babylist product page scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a category listing page and populate the URL queue
    Init {
        /// Listing page URL, e.g. https://www.babylist.com/store/strollers
        #[arg(long)]
        url: String,
        /// Category label recorded on every queued page
        #[arg(long)]
        category: String,
    },
    /// Fetch unvisited product pages
    Scrape {
        /// Max pages to fetch (default: all unvisited)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Resolve fetched pages into product records
    Process {
        /// Max pages to process (default: all unprocessed)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Scrape + process in one pipeline
    Run {
        /// Max pages to scrape+process
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Export resolved products to CSV
    Export {
        /// Output file (default: timestamped name in the working directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show pipeline statistics
    Stats,
    /// Product overview table
    Overview {
        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { url, category } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = listing::discover(&url, &category).await?;
            let inserted = db::insert_pages(&conn, &pages)?;
            println!(
                "Inserted {} new product URLs ({} found on listing page)",
                inserted,
                pages.len()
            );
            Ok(())
        }
        Commands::Scrape { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = db::fetch_unvisited(&conn, limit)?;
            if pages.is_empty() {
                println!("No unvisited pages. Run 'init' first or all pages are fetched.");
                return Ok(());
            }
            println!("Fetching {} pages (streaming to DB)...", pages.len());
            let stats = fetcher::scrape_pages_streaming(&conn, pages).await?;
            println!(
                "Done: {} fetched ({} ok, {} errors).",
                stats.total, stats.ok, stats.errors
            );
            Ok(())
        }
        Commands::Process { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = db::fetch_unprocessed(&conn, limit)?;
            if pages.is_empty() {
                println!("No unprocessed pages. Run 'scrape' first.");
                return Ok(());
            }
            println!("Processing {} pages...", pages.len());
            let summary = process_pages(&conn, &pages)?;
            summary.print();
            Ok(())
        }
        Commands::Run { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = db::fetch_unvisited(&conn, limit)?;
            if pages.is_empty() {
                println!("No unvisited pages. Run 'init' first.");
                return Ok(());
            }

            let t_scrape = Instant::now();
            println!("Pipeline: fetching {} pages (streaming to DB)...", pages.len());
            let stats = fetcher::scrape_pages_streaming(&conn, pages).await?;
            println!(
                "Fetched {} pages ({} ok, {} errors) in {:.1}s",
                stats.total,
                stats.ok,
                stats.errors,
                t_scrape.elapsed().as_secs_f64()
            );

            let t_process = Instant::now();
            let unprocessed = db::fetch_unprocessed(&conn, None)?;
            if unprocessed.is_empty() {
                println!("Nothing to process (all fetched pages had errors).");
                return Ok(());
            }
            println!("Processing {} pages...", unprocessed.len());
            let summary = process_pages(&conn, &unprocessed)?;
            println!("Processed in {:.1}s", t_process.elapsed().as_secs_f64());
            summary.print();
            Ok(())
        }
        Commands::Export { output } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let records = db::fetch_products(&conn)?;
            if records.is_empty() {
                println!("No products to export. Run 'process' first.");
                return Ok(());
            }
            let path = output.unwrap_or_else(export::default_path);
            export::write_csv(&path, &records)?;
            println!("Exported {} products to {}", records.len(), path.display());
            Ok(())
        }
        Commands::Overview { category, limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let rows = db::fetch_overview(&conn, category.as_deref(), limit)?;
            if rows.is_empty() {
                println!("No products found.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<32} | {:<12} | {:<14} | {:>8} | {:>6} | {:<16} | {:>6}",
                "#", "Product", "Brand", "Category", "Price", "Rating", "Colors", "Fields"
            );
            println!("{}", "-".repeat(115));

            for (i, r) in rows.iter().enumerate() {
                println!(
                    "{:>3} | {:<32} | {:<12} | {:<14} | {:>8} | {:>6} | {:<16} | {:>6}",
                    i + 1,
                    truncate(&r.name, 32),
                    truncate(&r.brand, 12),
                    truncate(&r.category, 14),
                    truncate(&r.price, 8),
                    r.rating,
                    truncate(&r.simplified_colors, 16),
                    r.resolved_fields,
                );
            }

            println!("\n{} products", rows.len());
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Total:     {}", s.total);
            println!("Visited:   {}", s.visited);
            println!("Unvisited: {}", s.unvisited);
            println!("Fetched:   {}", s.scraped);
            println!("Errors:    {}", s.errors);
            println!("Products:  {}", s.processed);
            println!("Avg resolved fields: {:.1}", s.avg_resolved);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

struct ProcessSummary {
    products: usize,
    fully_unknown: usize,
    total_resolved_fields: usize,
}

impl ProcessSummary {
    fn print(&self) {
        let avg = if self.products > 0 {
            self.total_resolved_fields as f64 / self.products as f64
        } else {
            0.0
        };
        println!(
            "Saved {} products ({} fully unknown, {:.1} resolved fields avg).",
            self.products, self.fully_unknown, avg
        );
    }
}

fn process_pages(
    conn: &rusqlite::Connection,
    pages: &[db::ScrapedPage],
) -> anyhow::Result<ProcessSummary> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut summary = ProcessSummary {
        products: 0,
        fully_unknown: 0,
        total_resolved_fields: 0,
    };

    for chunk in pages.chunks(500) {
        let records: Vec<_> = chunk.par_iter().map(resolve::process_page).collect();

        for record in &records {
            let resolved = record.resolved_fields();
            summary.total_resolved_fields += resolved;
            if resolved == 0 {
                summary.fully_unknown += 1;
            }
        }
        summary.products += records.len();

        db::save_products(conn, &records)?;
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(summary)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
