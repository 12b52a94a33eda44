//! CSV tables for the two sides of the join.
//!
//! Both loaders take already-read CSV text. A mapped column that is absent
//! from the header is fatal; a bad individual row is dropped and counted.

use crate::config::{ReferenceConfig, TargetConfig};
use crate::error::JoinError;
use crate::key::{build_full_key, split_make_model, CanonicalKey, VehicleFields};

// ---------------------------------------------------------------------------
// Target
// ---------------------------------------------------------------------------

/// One row of the dataset being enriched.
#[derive(Debug, Clone)]
pub struct TargetRecord {
    /// Zero-based data row index in the source file.
    pub row: usize,
    /// Raw values, aligned with [`TargetTable::headers`].
    pub values: Vec<String>,
    pub fields: VehicleFields,
    pub canonical_key: CanonicalKey,
}

#[derive(Debug, Clone, Default)]
pub struct TargetTable {
    pub headers: Vec<String>,
    pub records: Vec<TargetRecord>,
    /// Rows dropped for a missing or unreadable identifying field.
    pub skipped: usize,
    /// Rows dropped by the age window.
    pub out_of_window: usize,
}

impl TargetTable {
    pub fn from_csv(csv_data: &str, config: &TargetConfig) -> Result<Self, JoinError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(csv_data.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        let cols = &config.columns;
        let (year_idx, make_idx, model_idx) = {
            let idx = column_index(&headers, "target");
            (idx(&cols.year)?, idx(&cols.make)?, idx(&cols.model)?)
        };

        let mut table = TargetTable {
            headers,
            ..Default::default()
        };

        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let mut values: Vec<String> = record.iter().map(|v| v.to_string()).collect();
            values.resize(table.headers.len(), String::new());

            let fields = VehicleFields {
                year: None,
                make: non_blank(&values[make_idx]),
                model: non_blank(&values[model_idx]),
            };
            // Rows without a make never reach the key builder.
            if fields.make.is_none() {
                tracing::debug!(row, "target row without make dropped");
                table.skipped += 1;
                continue;
            }

            let year = match parse_year(&values[year_idx]) {
                Ok(y) => y,
                Err(e) => {
                    tracing::debug!(row, error = %e, "target row dropped");
                    table.skipped += 1;
                    continue;
                }
            };
            if !config.filter.accepts(year) {
                table.out_of_window += 1;
                continue;
            }

            let fields = VehicleFields { year: Some(year), ..fields };
            match build_full_key(&fields) {
                Ok(canonical_key) => table.records.push(TargetRecord {
                    row,
                    values,
                    fields,
                    canonical_key,
                }),
                Err(e) => {
                    tracing::debug!(row, error = %e, "target row dropped");
                    table.skipped += 1;
                }
            }
        }

        if table.skipped > 0 {
            tracing::warn!(skipped = table.skipped, "target rows without usable year/make/model");
        }

        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Reference
// ---------------------------------------------------------------------------

/// One row of the price source.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRecord {
    pub row: usize,
    pub year: i32,
    /// Pre-joined make and model, e.g. `"Toyota Camry LE"`.
    pub make_model: String,
    pub price: f64,
}

impl ReferenceRecord {
    pub fn new(year: i32, make_model: impl Into<String>, price: f64) -> Self {
        Self {
            row: 0,
            year,
            make_model: make_model.into(),
            price,
        }
    }

    pub fn fields(&self) -> VehicleFields {
        split_make_model(Some(self.year), &self.make_model)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    pub records: Vec<ReferenceRecord>,
    /// Rows dropped for an unreadable year or price.
    pub skipped: usize,
}

impl ReferenceTable {
    pub fn from_csv(csv_data: &str, config: &ReferenceConfig) -> Result<Self, JoinError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(csv_data.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        let cols = &config.columns;
        let (year_idx, make_model_idx, price_idx) = {
            let idx = column_index(&headers, "reference");
            (idx(&cols.year)?, idx(&cols.make_model)?, idx(&cols.price)?)
        };

        let mut table = ReferenceTable::default();

        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let get = |i: usize| record.get(i).unwrap_or("");

            let parsed = parse_year(get(year_idx)).and_then(|year| {
                let price = parse_price(get(price_idx))?;
                Ok((year, price))
            });
            match parsed {
                Ok((year, price)) => table.records.push(ReferenceRecord {
                    row,
                    year,
                    make_model: get(make_model_idx).trim().to_string(),
                    price,
                }),
                Err(e) => {
                    tracing::debug!(row, error = %e, "reference row dropped");
                    table.skipped += 1;
                }
            }
        }

        if table.skipped > 0 {
            tracing::warn!(skipped = table.skipped, "reference rows without usable year/price");
        }

        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<ReferenceRecord> for ReferenceTable {
    fn from_iter<I: IntoIterator<Item = ReferenceRecord>>(iter: I) -> Self {
        let records = iter
            .into_iter()
            .enumerate()
            .map(|(row, r)| ReferenceRecord { row, ..r })
            .collect();
        Self { records, skipped: 0 }
    }
}

// ---------------------------------------------------------------------------
// Field parsing
// ---------------------------------------------------------------------------

fn column_index<'h>(
    headers: &'h [String],
    table: &'h str,
) -> impl Fn(&str) -> Result<usize, JoinError> + 'h {
    move |name: &str| {
        headers.iter().position(|h| h == name).ok_or_else(|| JoinError::MissingColumn {
            table: table.into(),
            column: name.into(),
        })
    }
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Accepts `2015` and float-formatted `2015.0`.
pub(crate) fn parse_year(raw: &str) -> Result<i32, JoinError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(JoinError::MissingField { field: "year".into() });
    }
    if let Ok(y) = s.parse::<i32>() {
        return Ok(y);
    }
    match s.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f.abs() < i32::MAX as f64 => Ok(f as i32),
        _ => Err(JoinError::InvalidField { field: "year".into(), value: s.into() }),
    }
}

/// Accepts `25000`, `24999.50` and `$25,000`. Non-finite values are rejected.
pub(crate) fn parse_price(raw: &str) -> Result<f64, JoinError> {
    let s: String = raw.trim().chars().filter(|c| *c != '$' && *c != ',').collect();
    if s.is_empty() {
        return Err(JoinError::MissingField { field: "price".into() });
    }
    match s.parse::<f64>() {
        Ok(p) if p.is_finite() => Ok(p),
        _ => Err(JoinError::InvalidField { field: "price".into(), value: raw.trim().into() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JoinConfig;

    fn config() -> JoinConfig {
        JoinConfig::from_toml(
            r#"
name = "t"
[target]
file = "tx.csv"
[reference]
source = "kbb.csv"
"#,
        )
        .unwrap()
    }

    #[test]
    fn target_rows_get_full_keys() {
        let csv = "\
crash_id,vehicle_year,vehicle_make,vehicle_model
1,2022,TOYOTA,CAMRY
2,2015.0,HONDA,CIVIC
";
        let t = TargetTable::from_csv(csv, &config().target).unwrap();
        assert_eq!(t.headers, ["crash_id", "vehicle_year", "vehicle_make", "vehicle_model"]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.records[0].canonical_key.as_str(), "2022 TOYOTA CAMRY");
        assert_eq!(t.records[1].canonical_key.as_str(), "2015 HONDA CIVIC");
        assert_eq!(t.records[1].row, 1);
    }

    #[test]
    fn target_drops_missing_make_and_bad_year() {
        let csv = "\
crash_id,vehicle_year,vehicle_make,vehicle_model
1,2022,,CAMRY
2,abc,HONDA,CIVIC
3,,FORD,F150
4,2020,FORD,
5,2020,FORD,F150
";
        let t = TargetTable::from_csv(csv, &config().target).unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.skipped, 4);
        assert_eq!(t.records[0].row, 4);
    }

    #[test]
    fn target_age_window() {
        let csv = "\
vehicle_year,vehicle_make,vehicle_model
2023,KIA,EV9
2022,KIA,SOUL
1992,FORD,TAURUS
1991,FORD,TAURUS
";
        let t = TargetTable::from_csv(csv, &config().target).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.out_of_window, 2);
        assert_eq!(t.skipped, 0);
    }

    #[test]
    fn target_extreme_year_is_out_of_window() {
        let csv = "\
vehicle_year,vehicle_make,vehicle_model
-2147483000,FORD,F150
2020,FORD,F150
";
        let t = TargetTable::from_csv(csv, &config().target).unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.out_of_window, 1);
        assert_eq!(t.records[0].canonical_key.as_str(), "2020 FORD F150");
    }

    #[test]
    fn target_missing_column_is_fatal() {
        let csv = "vehicle_year,vehicle_model\n2020,CIVIC\n";
        let err = TargetTable::from_csv(csv, &config().target).unwrap_err();
        assert_eq!(
            err,
            JoinError::MissingColumn { table: "target".into(), column: "vehicle_make".into() }
        );
    }

    #[test]
    fn target_short_rows_are_padded() {
        let csv = "vehicle_year,vehicle_make,vehicle_model,color\n2020,FORD,F150\n";
        let t = TargetTable::from_csv(csv, &config().target).unwrap();
        assert_eq!(t.records[0].values, ["2020", "FORD", "F150", ""]);
    }

    #[test]
    fn reference_rows() {
        let csv = "\
year,make_model,price
2022,Toyota Camry LE,25000
2022,Toyota Camry SE,\"$24,000\"
2021,Ford F150,
oops,Ford F150,100
";
        let r = ReferenceTable::from_csv(csv, &config().reference).unwrap();
        assert_eq!(r.len(), 2);
        assert_eq!(r.skipped, 2);
        assert_eq!(r.records[1].price, 24000.0);
        assert_eq!(r.records[0].fields(), VehicleFields::new(2022, "Toyota", "Camry"));
    }

    #[test]
    fn reference_missing_column_is_fatal() {
        let csv = "year,make_model\n2022,Toyota Camry\n";
        let err = ReferenceTable::from_csv(csv, &config().reference).unwrap_err();
        assert!(err.to_string().contains("'price'"));
    }

    #[test]
    fn price_rejects_non_finite() {
        assert!(parse_price("NaN").is_err());
        assert!(parse_price("inf").is_err());
        assert_eq!(parse_price(" 1,250.5 ").unwrap(), 1250.5);
    }
}
