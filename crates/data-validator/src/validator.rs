//! Field Validator for Range and Token Checking

use crate::anomaly::AnomalyKind;
use crate::error::{FieldFault, ValidationError};
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;
use timeline::FieldValue;

/// Closed numeric range `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Inclusive on both ends
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    fn check(&self, field: &'static str) -> Result<(), ValidationError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(ValidationError::NonFiniteBound { field });
        }
        if self.min > self.max {
            return Err(ValidationError::InvertedRange {
                field,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Measured quantity carried by a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Temperature,
    Humidity,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Temperature => f.write_str("Temperature"),
            Field::Humidity => f.write_str("Humidity"),
        }
    }
}

/// Case-insensitive set of tokens that mark a field as invalid
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvalidTokens(HashSet<String>);

impl InvalidTokens {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            tokens
                .into_iter()
                .map(|t| t.as_ref().trim().to_uppercase())
                .collect(),
        )
    }

    pub fn matches(&self, raw: &str) -> bool {
        self.0.contains(&raw.to_uppercase())
    }

}

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Temperature valid range (°C)
    pub temperature: ValueRange,
    /// Relative humidity valid range (%)
    pub humidity: ValueRange,
    /// Tokens classified as invalid data, compared case-insensitively
    ///
    /// Also accepts a single comma-separated string, as supplied by environment overrides.
    #[serde(deserialize_with = "token_list")]
    pub invalid_tokens: Vec<String>,
    /// Field separator of input lines
    pub delimiter: char,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            temperature: ValueRange::new(-30.0, 60.0),
            humidity: ValueRange::new(0.0, 100.0),
            invalid_tokens: vec!["NaN".to_string(), "-99".to_string(), "999.0".to_string()],
            delimiter: ';',
        }
    }
}

impl ValidationConfig {
    /// Reject ranges and delimiters that make classification meaningless
    pub fn check(&self) -> Result<(), ValidationError> {
        self.temperature.check("temperature")?;
        self.humidity.check("humidity")?;
        if self.delimiter.is_whitespace() || self.delimiter == '.' || self.delimiter == '-' {
            return Err(ValidationError::InvalidDelimiter(self.delimiter));
        }
        Ok(())
    }
}

/// Deserialize a token list from a sequence or a comma-separated string
fn token_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct TokenList;

    impl<'de> Visitor<'de> for TokenList {
        type Value = Vec<String>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a list of tokens or a comma-separated string")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(vec![format!("{:?}", v)])
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut tokens = Vec::new();
            while let Some(token) = seq.next_element::<String>()? {
                tokens.push(token);
            }
            Ok(tokens)
        }
    }

    deserializer.deserialize_any(TokenList)
}

/// Classify one raw field, reporting the fault if the reading is unusable
///
/// Rules apply in order: blank, invalid token, unparseable, out of range.
pub fn classify(
    raw: &str,
    range: ValueRange,
    invalid_tokens: &InvalidTokens,
) -> Result<f64, FieldFault> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FieldFault::Missing);
    }
    if invalid_tokens.matches(raw) {
        return Err(FieldFault::InvalidToken(raw.to_string()));
    }
    let value = raw
        .parse::<f64>()
        .map_err(|_| FieldFault::NotNumeric(raw.to_string()))?;
    // NaN and infinities never fall inside a finite range
    if !range.contains(value) {
        return Err(FieldFault::OutOfRange {
            value,
            min: range.min,
            max: range.max,
        });
    }
    Ok(value)
}

/// Classify one raw field into a value and an optional anomaly kind
pub fn validate(
    raw: &str,
    range: ValueRange,
    invalid_tokens: &InvalidTokens,
) -> (FieldValue, Option<AnomalyKind>) {
    match classify(raw, range, invalid_tokens) {
        Ok(v) => (FieldValue::Value(v), None),
        Err(fault) => (FieldValue::NotAvailable, Some(fault.kind())),
    }
}

/// Data validator for temperature/humidity fields
#[derive(Debug, Clone)]
pub struct Validator {
    config: ValidationConfig,
    tokens: InvalidTokens,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Result<Self, ValidationError> {
        config.check()?;
        let tokens = InvalidTokens::new(&config.invalid_tokens);
        Ok(Self { config, tokens })
    }

    pub fn range(&self, field: Field) -> ValueRange {
        match field {
            Field::Temperature => self.config.temperature,
            Field::Humidity => self.config.humidity,
        }
    }

    /// Classify a raw field against the range configured for it
    pub fn validate_field(&self, field: Field, raw: &str) -> Result<f64, FieldFault> {
        classify(raw, self.range(field), &self.tokens)
    }

    pub fn delimiter(&self) -> char {
        self.config.delimiter
    }
}
