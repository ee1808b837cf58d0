//! Output sinks: per-source CSV stores and single JSON records.

use crate::models::{Quote, QuoteOutcome, QuoteRow, SourceId};
use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDateTime, Utc};
use csv::StringRecord;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// ── CSV store ─────────────────────────────────────────────────────────────────

pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir).with_context(|| format!("Could not create dir {:?}", dir))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn path_for(&self, source: SourceId) -> PathBuf {
        self.dir.join(format!("best_{}_product.csv", source.slug()))
    }

    /// Append `quote` to its source's store, keeping every prior row.
    pub fn append(&self, quote: &Quote) -> Result<PathBuf> {
        self.append_at(quote, Utc::now().naive_utc())
    }

    /// Prior rows are carried through verbatim. Columns are the union of the
    /// existing header and ours, in that order; missing cells are left empty.
    /// The store is replaced by rename, so a failed write leaves it intact.
    pub fn append_at(&self, quote: &Quote, scraped_at: NaiveDateTime) -> Result<PathBuf> {
        let path = self.path_for(quote.pharmacy);
        let (mut columns, prior) = read_store(&path)?;
        let (row_columns, row) = encode_row(&QuoteRow::from_quote(quote, scraped_at))?;

        for column in row_columns.iter() {
            if !columns.iter().any(|c| c == column) {
                columns.push_field(column);
            }
        }

        let new_row: StringRecord = columns
            .iter()
            .map(|c| {
                row_columns
                    .iter()
                    .position(|rc| rc == c)
                    .and_then(|i| row.get(i))
                    .unwrap_or("")
            })
            .collect();

        let tmp = path.with_extension("csv.tmp");
        if let Err(e) = write_store(&tmp, &columns, &prior, &new_row) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e);
        }
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace {:?} with {:?}", path, tmp))?;

        info!("{}: {} rows in {:?}", quote.pharmacy, prior.len() + 1, path);
        Ok(path)
    }
}

/// Header and raw records of an existing store. A missing file is empty.
fn read_store(path: &Path) -> Result<(StringRecord, Vec<StringRecord>)> {
    if !path.exists() {
        return Ok((StringRecord::new(), vec![]));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {:?}", path))?;

    let columns = reader.headers()?.clone();
    let records = reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to read prior rows in {:?}", path))?;

    debug!("{} prior rows, {} columns in {:?}", records.len(), columns.len(), path);
    Ok((columns, records))
}

/// Serialize one row and read it back as header + record.
fn encode_row(row: &QuoteRow) -> Result<(StringRecord, StringRecord)> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.serialize(row)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to encode row: {}", e.error()))?;

    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    let columns = reader.headers()?.clone();
    let record = reader.records().next().context("Encoded row is empty")??;
    Ok((columns, record))
}

fn write_store(
    path: &Path,
    columns: &StringRecord,
    prior: &[StringRecord],
    new_row: &StringRecord,
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {:?} for writing", path))?;

    writer.write_record(columns)?;
    for record in prior {
        let pad = columns.len().saturating_sub(record.len());
        writer.write_record(record.iter().chain(std::iter::repeat_n("", pad)))?;
    }
    writer.write_record(new_row)?;
    writer.flush()?;
    Ok(())
}

// ── JSON record ───────────────────────────────────────────────────────────────

/// Single-line JSON for a found quote or a not-found record.
pub fn to_json_record(outcome: &QuoteOutcome) -> Result<String> {
    serde_json::to_string(outcome).context("Failed to serialize record")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_quote_rows;
    use crate::models::{NotFound, NotFoundReason};
    use chrono::NaiveDate;

    fn quote(price: f64) -> Quote {
        Quote {
            pharmacy: SourceId::Netmeds,
            name: Some("Cetcip 10mg Tablet".into()),
            price: Some(price),
            mrp: Some(100.0),
            discount_percent: 0.0,
            link: "https://www.netmeds.com/prescriptions/cetcip-10mg".into(),
        }
    }

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_append_keeps_prior_rows_without_dedup() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::open(dir.path()).unwrap();

        sink.append_at(&quote(80.0), at(9)).unwrap();
        let path = sink.append_at(&quote(80.0), at(10)).unwrap();

        assert_eq!(path, dir.path().join("best_netmeds_product.csv"));
        let rows = load_quote_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].scraped_at, Some(at(9)));
        assert_eq!(rows[1].pharmacy, "Netmeds");

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("pharmacy,name,price").count(), 1);
    }

    #[test]
    fn test_append_to_store_without_timestamp_column() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::open(dir.path()).unwrap();
        let path = sink.path_for(SourceId::Netmeds);
        std::fs::write(
            &path,
            "pharmacy,name,price,mrp,discount_percent,link\n\
             Netmeds,Cetcip 10mg Tablet,23.85,26.5,10.0,https://www.netmeds.com/prescriptions/cetcip\n\
             Netmeds,Dolo 650,30.0,,0.0,https://www.netmeds.com/prescriptions/dolo-650\n",
        )
        .unwrap();

        sink.append_at(&quote(80.0), at(10)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "pharmacy,name,price,mrp,discount_percent,link,scraped_at");
        assert!(lines[1].starts_with("Netmeds,Cetcip 10mg Tablet,23.85,26.5,10.0,"));
        assert!(lines[2].starts_with("Netmeds,Dolo 650,30.0,,0.0,"));
        assert_eq!(lines.len(), 4);

        let rows = load_quote_rows(&path).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].price, Some(23.85));
        assert_eq!(rows[0].scraped_at, None);
        assert_eq!(rows[1].mrp, None);
        assert_eq!(rows[2].price, Some(80.0));
        assert_eq!(rows[2].scraped_at, Some(at(10)));
        assert!(!path.with_extension("csv.tmp").exists());
    }

    #[test]
    fn test_unparseable_prior_rows_are_kept_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::open(dir.path()).unwrap();
        let path = sink.path_for(SourceId::Netmeds);
        std::fs::write(
            &path,
            "pharmacy,name,price,mrp,discount_percent,link,scraped_at\n\
             Netmeds,Broken,n/a,100,0,https://www.netmeds.com/prescriptions/b,yesterday\n",
        )
        .unwrap();

        sink.append_at(&quote(80.0), at(10)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains(
            "Netmeds,Broken,n/a,100,0,https://www.netmeds.com/prescriptions/b,yesterday"
        ));
        assert_eq!(load_quote_rows(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_sources_write_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::open(dir.path()).unwrap();
        let mut other = quote(50.0);
        other.pharmacy = SourceId::OneMg;

        sink.append_at(&quote(80.0), at(9)).unwrap();
        sink.append_at(&other, at(9)).unwrap();

        assert!(dir.path().join("best_netmeds_product.csv").exists());
        assert!(dir.path().join("best_1mg_product.csv").exists());
    }

    #[test]
    fn test_json_record_for_not_found() {
        let outcome = QuoteOutcome::NotFound(NotFound::new(
            SourceId::PharmEasy,
            "Dolo 650",
            NotFoundReason::NoMatch,
        ));
        let json = to_json_record(&outcome).unwrap();
        assert_eq!(
            json,
            r#"{"pharmacy":"PharmEasy","error":"Product not found","query":"Dolo 650","reason":"no_match"}"#
        );
    }
}
