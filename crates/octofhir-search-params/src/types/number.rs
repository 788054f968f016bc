//! Number search values.
//!
//! Numbers are kept as exact rationals. Equality is range based: a literal
//! denotes every value that rounds to it at the written precision, so `100`
//! matches [99.5, 100.5) and `100.00` matches [99.995, 100.005).
//!
//! Precision comes from the literal, not the value: trailing zeros after the
//! decimal point count.

use std::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, Zero};

use crate::error::ParseError;
use crate::parameters::SearchPrefix;

/// A parsed number search value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberValue {
    pub prefix: SearchPrefix,
    /// The exact value of the literal
    pub value: BigRational,
    /// Digits after the decimal point as written
    pub precision: usize,
    text: String,
}

impl NumberValue {
    /// Parse a number value, including its optional comparison prefix.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let (prefix, literal) = SearchPrefix::extract(raw);
        let (value, precision) = parse_decimal(literal)?;
        Ok(Self {
            prefix,
            value,
            precision,
            text: literal.to_string(),
        })
    }

    /// Half a unit in the last written place: `5 / 10^(precision + 1)`.
    pub fn delta(&self) -> BigRational {
        BigRational::new(BigInt::from(5), pow10(self.precision + 1))
    }

    /// Inclusive lower bound of the equality range.
    pub fn range_low_incl(&self) -> BigRational {
        &self.value - self.delta()
    }

    /// Exclusive upper bound of the equality range.
    pub fn range_high_excl(&self) -> BigRational {
        &self.value + self.delta()
    }

    /// Bounds for the `ap` prefix: the value plus or minus ten percent.
    pub fn approximate_range(&self) -> (BigRational, BigRational) {
        let spread = self.value.abs() / BigRational::from_integer(BigInt::from(10));
        (&self.value - &spread, &self.value + &spread)
    }

    /// The literal as written, without prefix.
    pub fn literal(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for NumberValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix != SearchPrefix::Eq {
            write!(f, "{}", self.prefix)?;
        }
        f.write_str(&self.text)
    }
}

/// Parse `[+-]digits[.digits]` into an exact rational and its precision.
fn parse_decimal(literal: &str) -> Result<(BigRational, usize), ParseError> {
    let invalid = || ParseError::InvalidNumber(literal.to_string());

    let (negative, unsigned) = match literal.as_bytes().first() {
        Some(b'-') => (true, &literal[1..]),
        Some(b'+') => (false, &literal[1..]),
        _ => (false, literal),
    };
    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if integer.len() + fraction.len() == 0 || !all_digits(integer) || !all_digits(fraction) {
        return Err(invalid());
    }

    let digits = format!("{integer}{fraction}");
    let numerator: BigInt = digits.parse().map_err(|_| invalid())?;
    let mut value = BigRational::new(numerator, pow10(fraction.len()));
    if negative {
        value = -value;
    }
    Ok((value, fraction.len()))
}

fn pow10(exponent: usize) -> BigInt {
    num_traits::pow(BigInt::from(10), exponent)
}

/// Render a rational with a terminating decimal expansion exactly.
///
/// Every bound produced by the number parser has a power-of-ten denominator.
/// A non-terminating rational falls back to `numerator/denominator`.
pub fn to_decimal_string(value: &BigRational) -> String {
    const MAX_SCALE: usize = 4096;

    let denominator = value.denom();
    let mut scale = 0usize;
    let mut scaled = value.numer().abs();
    while !(&scaled % denominator).is_zero() {
        if scale == MAX_SCALE {
            return value.to_string();
        }
        scaled *= 10u32;
        scale += 1;
    }

    let digits = (scaled / denominator).to_string();
    let sign = if value.is_negative() { "-" } else { "" };
    if scale == 0 {
        return format!("{sign}{digits}");
    }
    let padded = format!("{digits:0>width$}", width = scale + 1);
    let (integer, fraction) = padded.split_at(padded.len() - scale);
    format!("{sign}{integer}.{fraction}")
}
