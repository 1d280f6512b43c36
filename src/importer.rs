// src/importer.rs
//! Batch load of the fashion sales CSV into a [`RecordStore`].
//!
//! Rows are read completely before the first write, then upserted one at a
//! time in file order. The first failing row aborts the run; rows written
//! before it stay committed.

use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::fashion::{non_blank, RecordDraft};
use crate::store::{RecordStore, StoreError};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("CSV not found at: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row} (\"{product_name}\") failed: {source}")]
    Row {
        /// 1-based data row, header excluded.
        row: usize,
        product_name: String,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub rows: usize,
}

/// One CSV line, columns as written in the source file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CsvRow {
    #[serde(rename = "Product Category")]
    pub product_category: Option<String>,
    #[serde(rename = "Product Name")]
    pub product_name: Option<String>,
    #[serde(rename = "Units Sold")]
    pub units_sold: Option<String>,
    #[serde(rename = "Returns")]
    pub returns: Option<String>,
    #[serde(rename = "Revenue")]
    pub revenue: Option<String>,
    #[serde(rename = "Customer Rating")]
    pub customer_rating: Option<String>,
    #[serde(rename = "Stock Level")]
    pub stock_level: Option<String>,
    #[serde(rename = "Season")]
    pub season: Option<String>,
    #[serde(rename = "Trend Score")]
    pub trend_score: Option<String>,
}

impl CsvRow {
    pub fn into_draft(self) -> RecordDraft {
        RecordDraft {
            product_category: self.product_category.as_deref().and_then(non_blank),
            product_name: self.product_name.as_deref().and_then(non_blank),
            units_sold: Some(to_number(self.units_sold.as_deref())),
            returns: Some(to_number(self.returns.as_deref())),
            revenue: Some(to_number(self.revenue.as_deref())),
            customer_rating: Some(to_number(self.customer_rating.as_deref())),
            stock_level: Some(to_number(self.stock_level.as_deref())),
            season: self.season.as_deref().and_then(non_blank),
            trend_score: Some(to_number(self.trend_score.as_deref())),
            ..Default::default()
        }
    }
}

/// Strips thousands separators and currency symbols, then parses.
/// Missing or unparsable input is 0.
pub fn to_number(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else { return 0.0 };
    let cleaned: String = raw.chars().filter(|c| !matches!(c, ',' | '£' | '$')).collect();
    match cleaned.trim() {
        "" => 0.0,
        s => s.parse::<f64>().ok().filter(|n| n.is_finite()).unwrap_or(0.0),
    }
}

pub fn read_rows<R: Read>(reader: R) -> Result<Vec<CsvRow>, ImportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let rows = rdr.deserialize().collect::<Result<Vec<CsvRow>, _>>()?;
    Ok(rows)
}

pub fn read_rows_from_path(path: &Path) -> Result<Vec<CsvRow>, ImportError> {
    if !path.is_file() {
        return Err(ImportError::MissingFile(path.to_path_buf()));
    }
    let file = std::fs::File::open(path).map_err(csv::Error::from)?;
    read_rows(file)
}

/// Upserts every row in order, stopping at the first failure.
pub async fn run_import(store: &dyn RecordStore, rows: Vec<CsvRow>) -> Result<ImportReport, ImportError> {
    let total = rows.len();
    for (idx, row) in rows.into_iter().enumerate() {
        let draft = row.into_draft();
        let product_name = draft.product_name.clone().unwrap_or_default();
        debug!(row = idx + 1, %product_name, "Upserting");

        store.upsert(draft).await.map_err(|source| ImportError::Row {
            row: idx + 1,
            product_name,
            source,
        })?;
    }

    info!(rows = total, "Imported/Updated rows into fashion_shop_data");
    Ok(ImportReport { rows: total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRecordStore;

    const HEADER: &str =
        "Product Category,Product Name,Units Sold,Returns,Revenue,Customer Rating,Stock Level,Season,Trend Score\n";

    fn csv(lines: &[&str]) -> String {
        let mut out = HEADER.to_string();
        for line in lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    #[test]
    fn numbers_are_coerced() {
        assert_eq!(to_number(Some("$1,250.50")), 1250.5);
        assert_eq!(to_number(Some("£ 30")), 30.0);
        assert_eq!(to_number(Some(" 7 ")), 7.0);
        assert_eq!(to_number(Some("n/a")), 0.0);
        assert_eq!(to_number(Some("")), 0.0);
        assert_eq!(to_number(Some("NaN")), 0.0);
        assert_eq!(to_number(None), 0.0);
    }

    #[test]
    fn rows_are_mapped_by_header_name() {
        let data = csv(&["Accessories, Red Scarf ,\"1,200\",2,$500,4.2,10,Winter,7"]);
        let rows = read_rows(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);

        let draft = rows[0].clone().into_draft();
        assert_eq!(draft.product_name.as_deref(), Some("Red Scarf"));
        assert_eq!(draft.units_sold, Some(1200.0));
        assert_eq!(draft.revenue, Some(500.0));
        assert_eq!(draft.season.as_deref(), Some("Winter"));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = read_rows_from_path(Path::new("definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, ImportError::MissingFile(_)));
    }

    #[tokio::test]
    async fn repeated_name_keeps_latest_values() {
        let store = MemoryRecordStore::new();
        let rows = read_rows(
            csv(&[
                "Accessories,Red Scarf,50,2,500,4.2,10,Winter,7",
                "Footwear,Sandal,80,1,900,3.9,4,Summer,5",
                "Accessories,Red Scarf,65,2,650,4.2,8,Winter,7",
            ])
            .as_bytes(),
        )
        .unwrap();

        let report = run_import(&store, rows).await.unwrap();
        assert_eq!(report.rows, 3);
        assert_eq!(store.len().await, 2);
        let scarf = store.find_by_name("Red Scarf").await.unwrap().unwrap();
        assert_eq!(scarf.units_sold, 65.0);
        assert_eq!(scarf.stock_level, 8.0);
    }

    #[tokio::test]
    async fn invalid_row_aborts_but_keeps_earlier_rows() {
        let store = MemoryRecordStore::new();
        let rows = read_rows(
            csv(&[
                "Accessories,Red Scarf,50,2,500,4.2,10,Winter,7",
                "Accessories,,10,0,100,4,1,Winter,2",
                "Footwear,Sandal,80,1,900,3.9,4,Summer,5",
            ])
            .as_bytes(),
        )
        .unwrap();

        let err = run_import(&store, rows).await.unwrap_err();
        assert!(matches!(err, ImportError::Row { row: 2, .. }));
        assert_eq!(store.len().await, 1);
        assert!(store.find_by_name("Sandal").await.unwrap().is_none());
    }
}
