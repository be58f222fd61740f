//! Kubernetes resource quantity parsing
//!
//! `k8s-openapi` carries quantities as raw strings (`"500m"`, `"256Mi"`,
//! `"1.5"`, `"2e3"`). This module turns them into the integer values the
//! exporter publishes: CPU in millicores and memory in bytes.
//!
//! Results are rounded up to the next integer, matching the API server's
//! `MilliValue()` and `Value()` accessors.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while parsing a quantity string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("empty quantity")]
    Empty,

    #[error("quantity {0:?} has no numeric part")]
    MissingNumber(String),

    #[error("quantity {input:?} has unknown suffix {suffix:?}")]
    UnknownSuffix { input: String, suffix: String },
}

/// A parsed quantity: `mantissa * 10^exponent * 1024^binary_power`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantity {
    negative: bool,
    mantissa: u128,
    exponent: i32,
    binary_power: u32,
    /// Non-zero fraction digits were dropped because the mantissa was full
    truncated: bool,
}

impl Quantity {
    /// The zero quantity, used for requests and limits that are not set
    pub const ZERO: Quantity = Quantity {
        negative: false,
        mantissa: 0,
        exponent: 0,
        binary_power: 0,
        truncated: false,
    };

    /// Parse a quantity string such as `500m`, `256Mi` or `1e3`
    pub fn parse(input: &str) -> Result<Self, QuantityError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(QuantityError::Empty);
        }

        let (negative, rest) = match trimmed.as_bytes()[0] {
            b'-' => (true, &trimmed[1..]),
            b'+' => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, suffix) = rest.split_at(number_len);

        let mut quantity = Self::parse_number(number)
            .ok_or_else(|| QuantityError::MissingNumber(input.to_string()))?;
        quantity.negative = negative;

        let (exponent, binary_power) =
            parse_suffix(suffix).ok_or_else(|| QuantityError::UnknownSuffix {
                input: input.to_string(),
                suffix: suffix.to_string(),
            })?;
        quantity.exponent = quantity.exponent.saturating_add(exponent);
        quantity.binary_power = binary_power;

        Ok(quantity)
    }

    fn parse_number(number: &str) -> Option<Self> {
        let mut parts = number.splitn(2, '.');
        let whole = parts.next().unwrap_or_default();
        let fraction = parts.next().unwrap_or_default();

        if whole.is_empty() && fraction.is_empty() {
            return None;
        }
        if fraction.contains('.') {
            return None;
        }

        let mut mantissa: u128 = 0;
        let mut exponent: i32 = 0;
        let mut truncated = false;

        for digit in whole.bytes().map(|b| u128::from(b - b'0')) {
            match mantissa.checked_mul(10).and_then(|m| m.checked_add(digit)) {
                Some(next) => mantissa = next,
                // Keep magnitude: drop the digit but shift the exponent
                None => {
                    exponent = exponent.saturating_add(1);
                    truncated |= digit != 0;
                }
            }
        }

        for digit in fraction.bytes().map(|b| u128::from(b - b'0')) {
            match mantissa.checked_mul(10).and_then(|m| m.checked_add(digit)) {
                Some(next) => {
                    mantissa = next;
                    exponent -= 1;
                }
                None => truncated |= digit != 0,
            }
        }

        Some(Self {
            negative: false,
            mantissa,
            exponent,
            binary_power: 0,
            truncated,
        })
    }

    /// Value in thousandths of the base unit (millicores for CPU)
    pub fn milli_value(&self) -> i64 {
        self.scaled(3)
    }

    /// Value in the base unit (bytes for memory)
    pub fn value(&self) -> i64 {
        self.scaled(0)
    }

    /// `self * 10^scale`, rounded toward positive infinity
    fn scaled(&self, scale: i32) -> i64 {
        if self.mantissa == 0 && !self.truncated {
            return 0;
        }

        let numerator = 1024u128
            .checked_pow(self.binary_power)
            .and_then(|factor| self.mantissa.checked_mul(factor));
        let Some(numerator) = numerator else {
            return self.saturated();
        };

        let exponent = self.exponent.saturating_add(scale);
        let magnitude = if exponent >= 0 {
            match 10u128
                .checked_pow(exponent.unsigned_abs())
                .and_then(|factor| numerator.checked_mul(factor))
            {
                Some(m) => m,
                None if numerator == 0 => 0,
                None => return self.saturated(),
            }
        } else {
            let (quotient, inexact) = match 10u128.checked_pow(exponent.unsigned_abs()) {
                Some(divisor) => (numerator / divisor, numerator % divisor != 0),
                None => (0, numerator != 0),
            };
            let inexact = inexact || self.truncated;
            if inexact && !self.negative {
                quotient + 1
            } else {
                quotient
            }
        };

        match i64::try_from(magnitude) {
            Ok(m) if self.negative => -m,
            Ok(m) => m,
            Err(_) => self.saturated(),
        }
    }

    fn saturated(&self) -> i64 {
        if self.negative {
            i64::MIN
        } else {
            i64::MAX
        }
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ZERO
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.milli_value())
    }
}

/// Returns `(decimal exponent, binary power)` for a suffix
fn parse_suffix(suffix: &str) -> Option<(i32, u32)> {
    let parsed = match suffix {
        "" => (0, 0),
        "Ki" => (0, 1),
        "Mi" => (0, 2),
        "Gi" => (0, 3),
        "Ti" => (0, 4),
        "Pi" => (0, 5),
        "Ei" => (0, 6),
        "n" => (-9, 0),
        "u" => (-6, 0),
        "m" => (-3, 0),
        "k" => (3, 0),
        "M" => (6, 0),
        "G" => (9, 0),
        "T" => (12, 0),
        "P" => (15, 0),
        "E" => (18, 0),
        _ => {
            let exponent = suffix
                .strip_prefix('e')
                .or_else(|| suffix.strip_prefix('E'))?;
            let digits = exponent.trim_start_matches(['+', '-']);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            (exponent.parse::<i32>().ok()?, 0)
        }
    };
    Some(parsed)
}
