//! CSV export of resolved product records.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::resolve::ProductRecord;

const HEADER: &[&str] = &[
    "name",
    "brand",
    "description",
    "category",
    "price",
    "retailer",
    "retailer_url",
    "color_options",
    "simplified_colors",
    "dimensions",
    "weight",
    "rating",
    "sku",
    "tags",
    "image_url",
];

const LIST_SEP: &str = ", ";

/// Timestamped default, e.g. `babylist_products_20260830_141500.csv`.
pub fn default_path() -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    PathBuf::from(format!("babylist_products_{}.csv", stamp))
}

pub fn write_csv(path: &Path, records: &[ProductRecord]) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_records(&mut file, records)?;
    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

fn write_records<W: Write>(mut w: W, records: &[ProductRecord]) -> io::Result<()> {
    write_row(&mut w, HEADER.iter().map(|s| s.to_string()))?;
    for r in records {
        write_row(&mut w, record_cells(r))?;
    }
    Ok(())
}

fn record_cells(r: &ProductRecord) -> impl Iterator<Item = String> {
    vec![
        r.name.clone(),
        r.brand.clone(),
        r.description.clone(),
        r.category.clone(),
        r.price.clone(),
        r.retailer.clone(),
        r.retailer_url.clone(),
        r.color_options.join(LIST_SEP),
        r.simplified_colors.join(LIST_SEP),
        r.dimensions.clone(),
        r.weight.clone(),
        r.rating.clone(),
        r.sku.clone(),
        r.tags.join(LIST_SEP),
        r.image_url.clone(),
    ]
    .into_iter()
}

fn write_row<W: Write>(mut w: W, cells: impl Iterator<Item = String>) -> io::Result<()> {
    let mut first = true;
    for cell in cells {
        if !first {
            write!(w, ",")?;
        } else {
            first = false;
        }
        if needs_quotes(&cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_quoting() {
        let mut rec = ProductRecord::unknown("https://www.babylist.com/gp/x/1", "Strollers");
        rec.name = "Vista V3, \"Gray\"".to_string();
        rec.color_options = vec!["Midnight Navy".to_string(), "Gray".to_string()];

        let mut buf = Vec::new();
        write_records(&mut buf, std::slice::from_ref(&rec)).unwrap();
        let out = String::from_utf8(buf).unwrap();
        let mut lines = out.lines();

        assert_eq!(lines.next().unwrap().split(',').next(), Some("name"));
        let row = lines.next().unwrap();
        assert!(row.starts_with(r#""Vista V3, ""Gray""""#));
        assert!(row.contains(r#""Midnight Navy, Gray""#));
        assert!(row.contains("N/A"));
    }

    #[test]
    fn default_path_is_csv() {
        let p = default_path();
        assert_eq!(p.extension().and_then(|e| e.to_str()), Some("csv"));
    }
}
