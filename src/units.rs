//! Physical lengths with an explicit unit tag.
//!
//! Every distance that crosses the public API of this crate is a [`Length`].
//! A bare floating point number is only accepted through
//! [`Length::assume_meters`], which logs a warning naming the quantity so that
//! a missing unit never goes unnoticed.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::FresnelError;

/// Units of length understood by the propagator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    #[default]
    #[serde(alias = "m")]
    Meter,
    #[serde(alias = "cm")]
    Centimeter,
    #[serde(alias = "mm")]
    Millimeter,
    #[serde(alias = "um", alias = "micron")]
    Micrometer,
    #[serde(alias = "nm")]
    Nanometer,
    #[serde(alias = "A")]
    Angstrom,
}

impl LengthUnit {
    /// Size of one unit in meters.
    pub fn in_meters(self) -> f64 {
        match self {
            LengthUnit::Meter => 1.0,
            LengthUnit::Centimeter => 1e-2,
            LengthUnit::Millimeter => 1e-3,
            LengthUnit::Micrometer => 1e-6,
            LengthUnit::Nanometer => 1e-9,
            LengthUnit::Angstrom => 1e-10,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            LengthUnit::Meter => "m",
            LengthUnit::Centimeter => "cm",
            LengthUnit::Millimeter => "mm",
            LengthUnit::Micrometer => "um",
            LengthUnit::Nanometer => "nm",
            LengthUnit::Angstrom => "Angstrom",
        }
    }
}

impl FromStr for LengthUnit {
    type Err = FresnelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "m" | "meter" | "meters" => Ok(LengthUnit::Meter),
            "cm" | "centimeter" | "centimeters" => Ok(LengthUnit::Centimeter),
            "mm" | "millimeter" | "millimeters" => Ok(LengthUnit::Millimeter),
            "um" | "micron" | "microns" | "micrometer" | "micrometers" => {
                Ok(LengthUnit::Micrometer)
            }
            "nm" | "nanometer" | "nanometers" => Ok(LengthUnit::Nanometer),
            "A" | "angstrom" | "angstroms" | "Angstrom" => Ok(LengthUnit::Angstrom),
            other => Err(FresnelError::InvalidParameter(format!(
                "unknown length unit '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A length together with the unit it was specified in.
///
/// Equality and ordering compare the underlying meter value, so
/// `Length::new(1.0, LengthUnit::Millimeter) == Length::meters(1e-3)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "LengthRepr", into = "String")]
pub struct Length {
    value: f64,
    unit: LengthUnit,
}

impl Length {
    pub fn new(value: f64, unit: LengthUnit) -> Self {
        Self { value, unit }
    }

    pub fn meters(value: f64) -> Self {
        Self::new(value, LengthUnit::Meter)
    }

    pub fn millimeters(value: f64) -> Self {
        Self::new(value, LengthUnit::Millimeter)
    }

    pub fn micrometers(value: f64) -> Self {
        Self::new(value, LengthUnit::Micrometer)
    }

    pub fn nanometers(value: f64) -> Self {
        Self::new(value, LengthUnit::Nanometer)
    }

    pub fn zero() -> Self {
        Self::meters(0.0)
    }

    /// Interprets a number without units as meters, logging the assumption.
    pub fn assume_meters(value: f64, what: &str) -> Self {
        warn!(
            "Assuming meters, {} ({:.3e}) has no units",
            what, value
        );
        Self::meters(value)
    }

    /// Value in meters.
    pub fn as_meters(&self) -> f64 {
        self.value * self.unit.in_meters()
    }

    /// Value expressed in `unit`.
    pub fn value_in(&self, unit: LengthUnit) -> f64 {
        self.as_meters() / unit.in_meters()
    }

    /// Converts to another unit.
    pub fn to(&self, unit: LengthUnit) -> Self {
        Self::new(self.value_in(unit), unit)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> LengthUnit {
        self.unit
    }

    pub fn abs(&self) -> Self {
        Self::new(self.value.abs(), self.unit)
    }

    pub fn is_finite(&self) -> bool {
        self.value.is_finite()
    }
}

impl Default for Length {
    fn default() -> Self {
        Self::zero()
    }
}

impl PartialEq for Length {
    fn eq(&self, other: &Self) -> bool {
        self.as_meters() == other.as_meters()
    }
}

impl PartialOrd for Length {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.as_meters().partial_cmp(&other.as_meters())
    }
}

// arithmetic keeps the unit of the left operand
impl Add for Length {
    type Output = Length;

    fn add(self, rhs: Length) -> Length {
        Length::new(self.value + rhs.value_in(self.unit), self.unit)
    }
}

impl Sub for Length {
    type Output = Length;

    fn sub(self, rhs: Length) -> Length {
        Length::new(self.value - rhs.value_in(self.unit), self.unit)
    }
}

impl Neg for Length {
    type Output = Length;

    fn neg(self) -> Length {
        Length::new(-self.value, self.unit)
    }
}

impl Mul<f64> for Length {
    type Output = Length;

    fn mul(self, rhs: f64) -> Length {
        Length::new(self.value * rhs, self.unit)
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(precision) = f.precision() {
            write!(f, "{:.*e} {}", precision, self.value, self.unit)
        } else {
            write!(f, "{} {}", self.value, self.unit)
        }
    }
}

impl FromStr for Length {
    type Err = FresnelError;

    /// Parses `"<number> <unit>"`, e.g. `"25 mm"` or `"1.5e-6m"`. A plain
    /// number is accepted and assumed to be meters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .char_indices()
            .find(|&(i, c)| {
                c.is_alphabetic() && !(matches!(c, 'e' | 'E') && is_exponent(s, i))
            })
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        let (number, unit) = s.split_at(split);
        let value: f64 = number.trim().parse().map_err(|_| {
            FresnelError::InvalidParameter(format!("cannot parse length '{}'", s))
        })?;

        if unit.trim().is_empty() {
            Ok(Length::assume_meters(value, "length"))
        } else {
            Ok(Length::new(value, unit.parse()?))
        }
    }
}

// an 'e' between a digit and a digit/sign is an exponent, not a unit
fn is_exponent(s: &str, i: usize) -> bool {
    let bytes = s.as_bytes();
    let before = i > 0 && (bytes[i - 1].is_ascii_digit() || bytes[i - 1] == b'.');
    let after = bytes
        .get(i + 1)
        .is_some_and(|b| b.is_ascii_digit() || *b == b'-' || *b == b'+');
    before && after
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LengthRepr {
    Bare(f64),
    Text(String),
}

impl TryFrom<LengthRepr> for Length {
    type Error = FresnelError;

    fn try_from(repr: LengthRepr) -> Result<Self, Self::Error> {
        match repr {
            LengthRepr::Bare(value) => Ok(Length::assume_meters(value, "configured length")),
            LengthRepr::Text(text) => text.parse(),
        }
    }
}

impl From<Length> for String {
    fn from(length: Length) -> String {
        format!("{} {}", length.value, length.unit.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn converts_between_units() {
        let l = Length::millimeters(25.0);
        assert_relative_eq!(l.as_meters(), 0.025);
        assert_relative_eq!(l.value_in(LengthUnit::Micrometer), 25_000.0, max_relative = 1e-12);
        assert_eq!(l.to(LengthUnit::Meter), Length::meters(0.025));
    }

    #[test]
    fn arithmetic_keeps_left_unit() {
        let sum = Length::millimeters(1.0) + Length::meters(1.0);
        assert_eq!(sum.unit(), LengthUnit::Millimeter);
        assert_relative_eq!(sum.value(), 1001.0);
        let diff = Length::meters(1.0) - Length::millimeters(500.0);
        assert_relative_eq!(diff.as_meters(), 0.5);
        assert_relative_eq!((-diff).as_meters(), -0.5);
        assert_relative_eq!((diff * 4.0).as_meters(), 2.0);
    }

    #[test]
    fn parses_lengths() {
        let l: Length = "25 mm".parse().unwrap();
        assert_eq!(l, Length::millimeters(25.0));
        let l: Length = "1.5e-6m".parse().unwrap();
        assert_relative_eq!(l.as_meters(), 1.5e-6);
        let l: Length = "633nm".parse().unwrap();
        assert_relative_eq!(l.as_meters(), 633e-9, max_relative = 1e-12);
        let l: Length = "0.25".parse().unwrap();
        assert_eq!(l.unit(), LengthUnit::Meter);
        assert!("12 furlongs".parse::<Length>().is_err());
        assert!("mm".parse::<Length>().is_err());
    }

    #[test]
    fn deserializes_from_number_or_text() {
        #[derive(Deserialize)]
        struct Holder {
            a: Length,
            b: Length,
        }
        let holder: Holder = toml::from_str("a = 0.5\nb = \"3 cm\"").unwrap();
        assert_eq!(holder.a, Length::meters(0.5));
        assert_eq!(holder.b, Length::meters(0.03));
    }
}
