//! CSV and JSON writers
//!
//! Every artifact is UTF-8 CSV with every field quoted, no index column,
//! and nulls written as empty fields.

use crate::models::feature::FeatureTable;
use crate::models::keys::{ContractKey, GrainKey, SupplierKey};
use crate::pipeline::engine::RunReport;
use crate::scoring::aggregate::{JoinedTable, ScoredContract};
use crate::scoring::indicator::Indicator;
use csv::{QuoteStyle, Writer, WriterBuilder};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

fn quoted_writer<W: Write>(inner: W) -> Writer<W> {
    WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(inner)
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn finish<W: Write>(writer: Writer<W>) -> Result<W, OutputError> {
    writer.into_inner().map_err(|e| OutputError::Io(e.into_error()))
}

// ============================================================================
// Scored table
// ============================================================================

/// Header of the scored table
pub fn scored_header() -> Vec<String> {
    let mut header: Vec<String> = ContractKey::key_columns()
        .iter()
        .map(|c| c.to_string())
        .collect();
    header.extend(Indicator::ALL.iter().map(|i| i.name().to_string()));
    header.extend(
        [
            "amount",
            "sum_of_features",
            "weighted_sum_of_features",
            "log_monto_times_weighted_sum",
        ]
        .iter()
        .map(|c| c.to_string()),
    );
    header
}

pub fn write_scored<W: Write>(inner: W, scored: &[ScoredContract]) -> Result<W, OutputError> {
    let mut writer = quoted_writer(inner);
    writer.write_record(scored_header())?;
    for row in scored {
        let mut record = row.contract.key_values();
        record.extend(row.indicators.iter().map(|v| v.to_string()));
        record.push(cell(row.amount));
        record.push(row.sum_of_features.to_string());
        record.push(row.weighted_sum_of_features.to_string());
        record.push(cell(row.log_monto_times_weighted_sum));
        writer.write_record(&record)?;
    }
    finish(writer)
}

// ============================================================================
// Wide and per-grain feature tables
// ============================================================================

/// Base-population rows with every feature column, un-aggregated
pub fn write_joined<W: Write>(inner: W, joined: &JoinedTable) -> Result<W, OutputError> {
    let mut writer = quoted_writer(inner);
    let mut header: Vec<&str> = ContractKey::key_columns().to_vec();
    header.extend(SupplierKey::key_columns());
    header.push("amount");
    header.extend(joined.columns.iter().map(String::as_str));
    writer.write_record(&header)?;

    for row in &joined.rows {
        let mut record = row.population.contract.key_values();
        record.push(
            row.population
                .supplier
                .as_ref()
                .map(|s| s.to_string())
                .unwrap_or_default(),
        );
        record.push(cell(row.population.amount));
        record.extend(row.values.iter().map(|v| cell(*v)));
        writer.write_record(&record)?;
    }
    finish(writer)
}

/// One grain's feature table, key columns first
pub fn write_feature_table<W: Write, K: GrainKey>(
    inner: W,
    table: &FeatureTable<K>,
) -> Result<W, OutputError> {
    let mut writer = quoted_writer(inner);
    let mut header: Vec<&str> = K::key_columns().to_vec();
    header.extend(table.columns().iter().map(String::as_str));
    writer.write_record(&header)?;

    for (key, values) in table.rows() {
        let mut record = key.key_values();
        record.extend(values.iter().map(|v| cell(*v)));
        writer.write_record(&record)?;
    }
    finish(writer)
}

// ============================================================================
// Convenience
// ============================================================================

pub fn scored_to_string(scored: &[ScoredContract]) -> Result<String, OutputError> {
    Ok(String::from_utf8(write_scored(Vec::new(), scored)?)?)
}

pub fn joined_to_string(joined: &JoinedTable) -> Result<String, OutputError> {
    Ok(String::from_utf8(write_joined(Vec::new(), joined)?)?)
}

pub fn write_scored_file(path: &Path, scored: &[ScoredContract]) -> Result<(), OutputError> {
    write_scored(File::create(path)?, scored)?.flush()?;
    Ok(())
}

pub fn write_joined_file(path: &Path, joined: &JoinedTable) -> Result<(), OutputError> {
    write_joined(File::create(path)?, joined)?.flush()?;
    Ok(())
}

pub fn write_feature_table_file<K: GrainKey>(
    path: &Path,
    table: &FeatureTable<K>,
) -> Result<(), OutputError> {
    write_feature_table(File::create(path)?, table)?.flush()?;
    Ok(())
}

/// Pretty-printed JSON run report
pub fn write_report_file(path: &Path, report: &RunReport) -> Result<(), OutputError> {
    let mut file = File::create(path)?;
    serde_json::to_writer_pretty(&mut file, report)?;
    file.write_all(b"\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::aggregate::score;
    use crate::scoring::weights::WeightTable;

    #[test]
    fn test_scored_header_layout() {
        let header = scored_header();
        assert_eq!(header.len(), 2 + Indicator::COUNT + 4);
        assert_eq!(header[0], "event_id");
        assert_eq!(header[2], "not_in_supplier_registry");
        assert_eq!(header.last().map(String::as_str), Some("log_monto_times_weighted_sum"));
    }

    #[test]
    fn test_every_field_quoted_and_nulls_empty() {
        let weights = WeightTable::default().resolve().unwrap();
        let scored = vec![score(
            ContractKey::new("EV-1", "C-1"),
            vec![0; Indicator::COUNT],
            None,
            &weights,
        )];
        let csv = scored_to_string(&scored).unwrap();
        let data_line = csv.lines().nth(1).unwrap();
        assert!(data_line.starts_with("\"EV-1\",\"C-1\",\"0\""));
        assert!(data_line.ends_with("\"\",\"0\",\"0\",\"\""));
    }
}
