//! Readers for query lists and previously stored quote rows.

use crate::models::QuoteRow;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, warn};

/// One query per line; blank lines and `#` comments are skipped.
pub fn parse_queries(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|l| l.to_string())
        .collect()
}

pub fn load_queries(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read query file {:?}", path))?;
    let queries = parse_queries(&text);
    debug!("{} queries from {:?}", queries.len(), path);
    Ok(queries)
}

/// Rows of an existing per-source CSV store. A missing file is empty;
/// malformed rows are skipped. Stores without a `scraped_at` column load
/// with no timestamps.
pub fn load_quote_rows(path: &Path) -> Result<Vec<QuoteRow>> {
    if !path.exists() {
        return Ok(vec![]);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {:?}", path))?;

    let mut rows = Vec::new();
    for (i, result) in reader.deserialize::<QuoteRow>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => warn!("Row {} in {:?}: {}", i + 1, path, e),
        }
    }

    debug!("{} prior rows in {:?}", rows.len(), path);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_queries() {
        let text = "Cetcip 10mg\n\n# brain\n  aricep 5 tablet  \n";
        assert_eq!(parse_queries(text), vec!["Cetcip 10mg", "aricep 5 tablet"]);
    }

    #[test]
    fn test_load_queries_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "Dolo 650").unwrap();
        assert_eq!(load_queries(f.path()).unwrap(), vec!["Dolo 650"]);
    }

    #[test]
    fn test_missing_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_quote_rows(&dir.path().join("none.csv")).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_rows_skipped() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            "pharmacy,name,price,mrp,discount_percent,link,scraped_at\n\
             1mg,Aricep,80,100,20,https://www.1mg.com/drugs/a,2026-10-19T10:00:00\n\
             1mg,Broken,not-a-number,100,20,https://www.1mg.com/drugs/b,2026-10-19T10:00:00\n\
             1mg,,,,0,https://www.1mg.com/drugs/c,2026-10-19T11:00:00\n"
        )
        .unwrap();

        let rows = load_quote_rows(f.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].price, Some(80.0));
        assert_eq!(rows[1].name, None);
        assert_eq!(rows[1].price, None);
    }

    #[test]
    fn test_store_without_timestamp_column() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            "pharmacy,name,price,mrp,discount_percent,link\n\
             PharmEasy,Dolo 650,30.5,33.9,10.03,https://pharmeasy.in/online-medicine-order/dolo\n"
        )
        .unwrap();

        let rows = load_quote_rows(f.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pharmacy, "PharmEasy");
        assert_eq!(rows[0].mrp, Some(33.9));
        assert_eq!(rows[0].scraped_at, None);
    }
}
