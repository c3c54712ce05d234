//! Token amounts in integer base units.
//!
//! Prices arrive from the service as decimal JSON numbers (`0.25`) and
//! balances arrive from the chain as `U256` base units. Both are normalised to
//! [`TokenAmount`] so that affordability and budget checks never touch `f64`.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::U256;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::TOKEN_DECIMALS;

/// An amount of the payment token, stored as base units (`10^TOKEN_DECIMALS` per whole token).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenAmount(u64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid amount '{input}': {reason}")]
pub struct AmountError {
    pub input: String,
    pub reason: String,
}

impl AmountError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

impl TokenAmount {
    pub const ZERO: TokenAmount = TokenAmount(0);

    pub const fn from_units(units: u64) -> Self {
        Self(units)
    }

    pub const fn units(self) -> u64 {
        self.0
    }

    /// Parse a human-readable amount such as `"0.25"`, `"$1"` or `"100.50"`.
    ///
    /// Digits beyond [`TOKEN_DECIMALS`] are truncated. Integer-only arithmetic.
    pub fn parse(input: &str) -> Result<Self, AmountError> {
        let cleaned: String = input
            .trim()
            .trim_start_matches('$')
            .chars()
            .filter(|c| *c != '_' && *c != ',')
            .collect();

        if cleaned.is_empty() {
            return Err(AmountError::new(input, "no numeric content"));
        }
        if cleaned.starts_with('-') {
            return Err(AmountError::new(input, "negative amounts are not allowed"));
        }
        if cleaned.contains(['e', 'E']) {
            return parse_exponent(input, &cleaned);
        }

        let decimals = TOKEN_DECIMALS as usize;
        let (integer_part, fractional_part) = cleaned.split_once('.').unwrap_or((&cleaned, ""));

        if !integer_part.chars().all(|c| c.is_ascii_digit())
            || !fractional_part.chars().all(|c| c.is_ascii_digit())
            || (integer_part.is_empty() && fractional_part.is_empty())
        {
            return Err(AmountError::new(input, "not a decimal number"));
        }

        let integer: u64 = if integer_part.is_empty() {
            0
        } else {
            integer_part
                .parse()
                .map_err(|e| AmountError::new(input, format!("integer part: {e}")))?
        };

        let frac_str = &fractional_part[..fractional_part.len().min(decimals)];
        let fractional: u64 = if frac_str.is_empty() {
            0
        } else {
            frac_str
                .parse()
                .map_err(|e| AmountError::new(input, format!("fractional part: {e}")))?
        };
        let scale = 10u64.pow((decimals - frac_str.len()) as u32);

        integer
            .checked_mul(10u64.pow(TOKEN_DECIMALS))
            .and_then(|whole| fractional.checked_mul(scale).map(|frac| (whole, frac)))
            .and_then(|(whole, frac)| whole.checked_add(frac))
            .map(TokenAmount)
            .ok_or_else(|| AmountError::new(input, "overflow"))
    }

    pub fn checked_add(self, other: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_add(other.0).map(TokenAmount)
    }

    pub fn checked_mul(self, factor: u64) -> Option<TokenAmount> {
        self.0.checked_mul(factor).map(TokenAmount)
    }

    pub fn saturating_sub(self, other: TokenAmount) -> TokenAmount {
        TokenAmount(self.0.saturating_sub(other.0))
    }

    pub fn to_u256(self) -> U256 {
        U256::from(self.0)
    }

    /// Convert an on-chain balance, saturating at `u64::MAX` base units.
    pub fn from_u256_saturating(value: U256) -> Self {
        TokenAmount(u64::try_from(value).unwrap_or(u64::MAX))
    }
}

/// Float formatting (`1e-7`) is expanded before parsing.
fn parse_exponent(input: &str, cleaned: &str) -> Result<TokenAmount, AmountError> {
    let (mantissa, exponent) = cleaned
        .split_once(['e', 'E'])
        .ok_or_else(|| AmountError::new(input, "not a decimal number"))?;
    let exponent: i32 = exponent
        .parse()
        .map_err(|e| AmountError::new(input, format!("exponent: {e}")))?;
    let (int_digits, frac_digits) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = format!("{int_digits}{frac_digits}");
    let point = int_digits.len() as i32 + exponent;

    let expanded = if point <= 0 {
        format!("0.{}{}", "0".repeat(point.unsigned_abs() as usize), digits)
    } else if point as usize >= digits.len() {
        format!("{digits}{}", "0".repeat(point as usize - digits.len()))
    } else {
        let (left, right) = digits.split_at(point as usize);
        format!("{left}.{right}")
    };
    TokenAmount::parse(&expanded).map_err(|e| AmountError::new(input, e.reason))
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let divisor = 10u64.pow(TOKEN_DECIMALS);
        let whole = self.0 / divisor;
        let frac = self.0 % divisor;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let frac = format!("{:0width$}", frac, width = TOKEN_DECIMALS as usize);
        write!(f, "{whole}.{}", frac.trim_end_matches('0'))
    }
}

impl FromStr for TokenAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TokenAmount::parse(s)
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TokenAmountVisitor)
    }
}

struct TokenAmountVisitor;

impl Visitor<'_> for TokenAmountVisitor {
    type Value = TokenAmount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative decimal amount as a number or string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<TokenAmount, E> {
        TokenAmount::parse(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<TokenAmount, E> {
        TokenAmount::parse(&v.to_string()).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<TokenAmount, E> {
        TokenAmount::parse(&v.to_string()).map_err(E::custom)
    }

    // Rust's float Display is the shortest round-tripping decimal, so `0.25`
    // is re-read as the string "0.25" rather than as binary floating point.
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<TokenAmount, E> {
        if !v.is_finite() {
            return Err(E::custom(format!("non-finite amount {v}")));
        }
        TokenAmount::parse(&v.to_string()).map_err(E::custom)
    }
}
