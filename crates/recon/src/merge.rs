use std::io::Write;

use serde::Serialize;

use crate::aggregate::AggregatedIndex;
use crate::error::JoinError;
use crate::key::CanonicalKey;
use crate::table::TargetTable;

/// A target row that found a price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    pub row: usize,
    pub key: CanonicalKey,
    pub values: Vec<String>,
    pub price: f64,
}

/// Inner join of the target rows with the price index on the full key.
///
/// Rows whose key has no price are dropped. Input order is preserved, and
/// rows sharing a key all receive the same price.
pub fn merge(targets: &TargetTable, index: &AggregatedIndex) -> Vec<EnrichedRecord> {
    targets
        .records
        .iter()
        .filter_map(|record| {
            index.get(&record.canonical_key).map(|price| EnrichedRecord {
                row: record.row,
                key: record.canonical_key.clone(),
                values: record.values.clone(),
                price,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvOptions {
    /// Add a `make_model` column holding the join key.
    pub include_key: bool,
}

/// Write the target headers plus `price`, one line per enriched record.
pub fn write_enriched_csv<W: Write>(
    headers: &[String],
    records: &[EnrichedRecord],
    writer: W,
    options: CsvOptions,
) -> Result<(), JoinError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header_row: Vec<&str> = headers.iter().map(String::as_str).collect();
    if options.include_key {
        header_row.push("make_model");
    }
    header_row.push("price");
    wtr.write_record(&header_row)?;

    for record in records {
        let price = format_price(record.price);
        let mut row: Vec<&str> = record.values.iter().map(String::as_str).collect();
        if options.include_key {
            row.push(record.key.as_str());
        }
        row.push(&price);
        wtr.write_record(&row)?;
    }

    wtr.flush().map_err(|e| JoinError::Io(e.to_string()))?;
    Ok(())
}

/// Whole prices print without a fractional part.
fn format_price(price: f64) -> String {
    if price.fract() == 0.0 && price.abs() < 1e15 {
        format!("{}", price as i64)
    } else {
        price.to_string()
    }
}
