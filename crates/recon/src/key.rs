//! Canonical join keys.
//!
//! Target rows get a *full* key (`"2022 TOYOTA CAMRY"`), reference rows an
//! *abbreviated* key (`"2022 TOY CAM"`). Both builders are pure: the same
//! fields always produce the same key.

use std::fmt;

use serde::Serialize;

use crate::error::JoinError;

pub const DEFAULT_PREFIX_LEN: usize = 3;

/// A derived join key. Ordered so it can key a `BTreeMap`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The manufacturer component (second token), if any.
    pub fn make(&self) -> Option<&str> {
        self.0.split(' ').nth(1)
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CanonicalKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifying fields of a vehicle record, before key derivation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleFields {
    pub year: Option<i32>,
    pub make: Option<String>,
    pub model: Option<String>,
}

impl VehicleFields {
    pub fn new(year: i32, make: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            year: Some(year),
            make: Some(make.into()),
            model: Some(model.into()),
        }
    }

    fn require(&self) -> Result<(i32, &str, &str), JoinError> {
        let year = self.year.ok_or_else(|| missing("year"))?;
        let make = non_blank(self.make.as_deref()).ok_or_else(|| missing("make"))?;
        let model = non_blank(self.model.as_deref()).ok_or_else(|| missing("model"))?;
        Ok((year, make, model))
    }
}

fn missing(field: &str) -> JoinError {
    JoinError::MissingField { field: field.into() }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// `"{year} {make} {model}"` in the record's native casing.
pub fn build_full_key(fields: &VehicleFields) -> Result<CanonicalKey, JoinError> {
    let (year, make, model) = fields.require()?;
    Ok(CanonicalKey(format!("{year} {make} {model}")))
}

/// `"{year} {MAK} {MOD}"`: make and model cut to their first `prefix_len`
/// characters and upper-cased. Shorter strings are kept whole.
pub fn build_abbrev_key(fields: &VehicleFields, prefix_len: usize) -> Result<CanonicalKey, JoinError> {
    let (year, make, model) = fields.require()?;
    Ok(CanonicalKey(format!(
        "{year} {} {}",
        prefix(make, prefix_len),
        prefix(model, prefix_len)
    )))
}

/// First `n` characters, upper-cased. Counts chars, not bytes.
fn prefix(s: &str, n: usize) -> String {
    s.chars().take(n).collect::<String>().to_uppercase()
}

/// Split a pre-joined `make_model` string into make and model.
///
/// A leading token equal to the year is dropped; tokens after the model
/// (trim level, body style) are ignored.
pub fn split_make_model(year: Option<i32>, make_model: &str) -> VehicleFields {
    let mut tokens = make_model.split_whitespace().peekable();
    if let (Some(y), Some(first)) = (year, tokens.peek()) {
        if first.parse::<i32>().ok() == Some(y) {
            tokens.next();
        }
    }
    VehicleFields {
        year,
        make: tokens.next().map(str::to_string),
        model: tokens.next().map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_key_keeps_native_casing() {
        let key = build_full_key(&VehicleFields::new(2022, "TOYOTA", "CAMRY")).unwrap();
        assert_eq!(key.as_str(), "2022 TOYOTA CAMRY");

        let key = build_full_key(&VehicleFields::new(2019, "Honda", "Civic")).unwrap();
        assert_eq!(key.as_str(), "2019 Honda Civic");
    }

    #[test]
    fn abbrev_key_truncates_to_prefix() {
        let key = build_abbrev_key(&VehicleFields::new(2022, "Toyota", "Camry"), 3).unwrap();
        assert_eq!(key.as_str(), "2022 TOY CAM");
    }

    #[test]
    fn abbrev_key_tolerates_short_fields() {
        let key = build_abbrev_key(&VehicleFields::new(2021, "RAM", "X"), 3).unwrap();
        assert_eq!(key.as_str(), "2021 RAM X");

        let key = build_abbrev_key(&VehicleFields::new(2010, "GM", "Z"), 3).unwrap();
        assert_eq!(key.as_str(), "2010 GM Z");
    }

    #[test]
    fn abbrev_key_counts_characters_not_bytes() {
        let key = build_abbrev_key(&VehicleFields::new(2015, "Škoda", "Octavia"), 3).unwrap();
        assert_eq!(key.as_str(), "2015 ŠKO OCT");
    }

    #[test]
    fn missing_fields_are_reported() {
        let fields = VehicleFields {
            year: Some(2020),
            make: None,
            model: Some("F150".into()),
        };
        assert_eq!(
            build_full_key(&fields).unwrap_err(),
            JoinError::MissingField { field: "make".into() }
        );

        let fields = VehicleFields {
            year: None,
            make: Some("FORD".into()),
            model: Some("F150".into()),
        };
        assert_eq!(
            build_abbrev_key(&fields, 3).unwrap_err(),
            JoinError::MissingField { field: "year".into() }
        );
    }

    #[test]
    fn blank_field_counts_as_missing() {
        let fields = VehicleFields::new(2020, "FORD", "   ");
        assert_eq!(
            build_full_key(&fields).unwrap_err(),
            JoinError::MissingField { field: "model".into() }
        );
    }

    #[test]
    fn split_drops_repeated_year_and_trim() {
        let fields = split_make_model(Some(2022), "2022 Toyota Camry LE");
        assert_eq!(fields, VehicleFields::new(2022, "Toyota", "Camry"));

        let fields = split_make_model(Some(2018), "Ford F150 XLT SuperCrew");
        assert_eq!(fields, VehicleFields::new(2018, "Ford", "F150"));
    }

    #[test]
    fn split_keeps_numeric_make_that_is_not_the_year() {
        let fields = split_make_model(Some(2012), "2011 Foo Bar");
        assert_eq!(fields.make.as_deref(), Some("2011"));
        assert_eq!(fields.model.as_deref(), Some("Foo"));
    }

    #[test]
    fn split_single_token_leaves_model_missing() {
        let fields = split_make_model(Some(2012), "Tesla");
        assert_eq!(fields.model, None);
        assert!(build_abbrev_key(&fields, 3).is_err());
    }

    #[test]
    fn make_component() {
        assert_eq!(CanonicalKey::from("2022 TOYOTA CAMRY").make(), Some("TOYOTA"));
        assert_eq!(CanonicalKey::from("2022").make(), None);
    }
}
