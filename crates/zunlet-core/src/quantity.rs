//! Kubernetes resource quantities ("500m", "256Mi", "1.5G", "2e3").
//!
//! Only the subset needed for CPU and memory accounting is supported:
//! a decimal number followed by an optional binary (`Ki`..`Ei`), decimal
//! (`n`, `u`, `m`, `k`, `M`..`E`) or exponent (`e3`) suffix.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum QuantityError {
    #[error("empty quantity")]
    Empty,
    #[error("invalid quantity number: {0}")]
    InvalidNumber(String),
    #[error("unknown quantity suffix {suffix:?} in {quantity:?}")]
    UnknownSuffix { quantity: String, suffix: String },
}

/// A resource quantity in its canonical string form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(pub String);

impl Quantity {
    pub fn new(s: impl Into<String>) -> Self {
        Quantity(s.into())
    }

    /// CPU-style quantity from millicores ("500m", or "2" for whole cores).
    pub fn from_millis(millis: i64) -> Self {
        if millis % 1000 == 0 {
            Quantity((millis / 1000).to_string())
        } else {
            Quantity(format!("{millis}m"))
        }
    }

    /// Memory-style quantity in mebibytes ("512Mi").
    pub fn from_mebibytes(mib: u64) -> Self {
        Quantity(format!("{mib}Mi"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The quantity in base units (cores, bytes, pods).
    pub fn value(&self) -> Result<f64, QuantityError> {
        parse_quantity(&self.0)
    }

    /// The quantity scaled by 1000, rounded to the nearest integer.
    pub fn as_millis(&self) -> Result<i64, QuantityError> {
        Ok((self.value()? * 1000.0).round() as i64)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Quantity {
    fn from(s: &str) -> Self {
        Quantity(s.to_string())
    }
}

fn parse_quantity(raw: &str) -> Result<f64, QuantityError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(QuantityError::Empty);
    }

    let split = s
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '+' || *c == '-'))))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let (number, suffix) = s.split_at(split);

    let value: f64 = number
        .parse()
        .map_err(|_| QuantityError::InvalidNumber(raw.to_string()))?;

    let multiplier = match suffix {
        "" => 1.0,
        "Ki" => 1024f64,
        "Mi" => 1024f64.powi(2),
        "Gi" => 1024f64.powi(3),
        "Ti" => 1024f64.powi(4),
        "Pi" => 1024f64.powi(5),
        "Ei" => 1024f64.powi(6),
        "n" => 1e-9,
        "u" => 1e-6,
        "m" => 1e-3,
        "k" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        "P" => 1e15,
        "E" => 1e18,
        other => {
            let exponent = other
                .strip_prefix('e')
                .or_else(|| other.strip_prefix('E'))
                .and_then(|exp| exp.parse::<i32>().ok())
                .ok_or_else(|| QuantityError::UnknownSuffix {
                    quantity: raw.to_string(),
                    suffix: other.to_string(),
                })?;
            10f64.powi(exponent)
        }
    };

    Ok(value * multiplier)
}
