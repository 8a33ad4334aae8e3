//! Unit strings and dimensional analysis.
//!
//! A [`Unit`] is parsed from strings such as `m/s^2`, `J/kg/K` or `lb/hr/lbf`. Each `/`
//! divides by the factor that follows it only, so `J/kg/K` reads as `J / (kg K)`. Every unit
//! carries its scale to SI and a [`Dimension`] over length, mass, time and temperature.

use std::fmt;
use std::ops::{Div, Mul};

use thiserror::Error;

use crate::units::{FT_TO_M, KNOT_TO_M_S, LB_TO_KG, LBF_TO_N, MILE_TO_M, NMI_TO_M};

const DIMENSION_TOLERANCE: f64 = 1e-9;

/// Exponents of the base dimensions (length, mass, time, temperature).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Dimension {
    pub length: f64,
    pub mass: f64,
    pub time: f64,
    pub temperature: f64,
}

impl Dimension {
    pub const NONE: Dimension = Dimension::new(0.0, 0.0, 0.0, 0.0);
    pub const LENGTH: Dimension = Dimension::new(1.0, 0.0, 0.0, 0.0);
    pub const MASS: Dimension = Dimension::new(0.0, 1.0, 0.0, 0.0);
    pub const TIME: Dimension = Dimension::new(0.0, 0.0, 1.0, 0.0);
    pub const TEMPERATURE: Dimension = Dimension::new(0.0, 0.0, 0.0, 1.0);
    pub const FORCE: Dimension = Dimension::new(1.0, 1.0, -2.0, 0.0);

    pub const fn new(length: f64, mass: f64, time: f64, temperature: f64) -> Self {
        Self {
            length,
            mass,
            time,
            temperature,
        }
    }

    /// Raise the dimension to a real power.
    pub fn powf(self, exponent: f64) -> Self {
        Self::new(
            self.length * exponent,
            self.mass * exponent,
            self.time * exponent,
            self.temperature * exponent,
        )
    }

    /// Equality up to floating-point noise in fractional exponents.
    pub fn matches(&self, other: &Dimension) -> bool {
        (self.length - other.length).abs() < DIMENSION_TOLERANCE
            && (self.mass - other.mass).abs() < DIMENSION_TOLERANCE
            && (self.time - other.time).abs() < DIMENSION_TOLERANCE
            && (self.temperature - other.temperature).abs() < DIMENSION_TOLERANCE
    }

    pub fn is_dimensionless(&self) -> bool {
        self.matches(&Dimension::NONE)
    }
}

impl Mul for Dimension {
    type Output = Dimension;

    fn mul(self, rhs: Dimension) -> Dimension {
        Dimension::new(
            self.length + rhs.length,
            self.mass + rhs.mass,
            self.time + rhs.time,
            self.temperature + rhs.temperature,
        )
    }
}

impl Div for Dimension {
    type Output = Dimension;

    fn div(self, rhs: Dimension) -> Dimension {
        self * rhs.powf(-1.0)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "-");
        }
        let parts = [
            ("m", self.length),
            ("kg", self.mass),
            ("s", self.time),
            ("K", self.temperature),
        ];
        let mut first = true;
        for (symbol, exponent) in parts {
            if exponent.abs() < DIMENSION_TOLERANCE {
                continue;
            }
            if !first {
                write!(f, " ")?;
            }
            first = false;
            if (exponent - 1.0).abs() < DIMENSION_TOLERANCE {
                write!(f, "{symbol}")?;
            } else {
                write!(f, "{symbol}^{exponent}")?;
            }
        }
        Ok(())
    }
}

/// Errors raised while parsing or converting units.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UnitError {
    #[error("unknown unit symbol '{symbol}' in '{unit}'")]
    UnknownSymbol { symbol: String, unit: String },
    #[error("malformed unit string '{0}'")]
    Malformed(String),
    #[error("cannot convert '{from}' to '{to}': dimensions differ")]
    Incompatible { from: String, to: String },
}

/// A parsed unit: display symbol, SI scale factor and dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    symbol: String,
    scale: f64,
    dimension: Dimension,
}

impl Unit {
    /// The dimensionless unit, written `-`.
    pub fn dimensionless() -> Self {
        Self {
            symbol: "-".to_string(),
            scale: 1.0,
            dimension: Dimension::NONE,
        }
    }

    /// Parse a unit string.
    pub fn parse(text: &str) -> Result<Self, UnitError> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == "-" {
            return Ok(Self::dimensionless());
        }

        let mut scale = 1.0;
        let mut dimension = Dimension::NONE;
        let mut op = '*';
        let mut factor = String::new();

        for ch in trimmed.chars() {
            match ch {
                '*' | '/' => {
                    apply_factor(trimmed, op, &factor, &mut scale, &mut dimension)?;
                    factor.clear();
                    op = ch;
                }
                c if c.is_whitespace() => {}
                c => factor.push(c),
            }
        }
        apply_factor(trimmed, op, &factor, &mut scale, &mut dimension)?;

        Ok(Self {
            symbol: trimmed.to_string(),
            scale,
            dimension,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Multiplier taking a value in this unit to SI.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn to_si(&self, value: f64) -> f64 {
        value * self.scale
    }

    pub fn from_si(&self, value: f64) -> f64 {
        value / self.scale
    }

    /// Convert `value` expressed in `self` into `target`.
    pub fn convert(&self, value: f64, target: &Unit) -> Result<f64, UnitError> {
        if !self.dimension.matches(&target.dimension) {
            return Err(UnitError::Incompatible {
                from: self.symbol.clone(),
                to: target.symbol.clone(),
            });
        }
        Ok(target.from_si(self.to_si(value)))
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

fn apply_factor(
    unit: &str,
    op: char,
    factor: &str,
    scale: &mut f64,
    dimension: &mut Dimension,
) -> Result<(), UnitError> {
    if factor.is_empty() {
        return Err(UnitError::Malformed(unit.to_string()));
    }
    let (base, exponent) = match factor.split_once('^') {
        Some((base, exp)) => {
            let exponent: f64 = exp
                .parse()
                .map_err(|_| UnitError::Malformed(unit.to_string()))?;
            (base, exponent)
        }
        None => (factor, 1.0),
    };
    let (base_scale, base_dim) = lookup(base).ok_or_else(|| UnitError::UnknownSymbol {
        symbol: base.to_string(),
        unit: unit.to_string(),
    })?;
    let exponent = if op == '/' { -exponent } else { exponent };
    *scale *= base_scale.powf(exponent);
    *dimension = *dimension * base_dim.powf(exponent);
    Ok(())
}

fn lookup(symbol: &str) -> Option<(f64, Dimension)> {
    let velocity = Dimension::new(1.0, 0.0, -1.0, 0.0);
    let entry = match symbol {
        "-" => (1.0, Dimension::NONE),
        "m" | "meter" | "meters" | "metre" | "metres" => (1.0, Dimension::LENGTH),
        "km" => (1_000.0, Dimension::LENGTH),
        "ft" | "foot" | "feet" => (FT_TO_M, Dimension::LENGTH),
        "mi" | "mile" | "miles" => (MILE_TO_M, Dimension::LENGTH),
        "nmi" => (NMI_TO_M, Dimension::LENGTH),
        "s" | "sec" | "second" | "seconds" => (1.0, Dimension::TIME),
        "min" | "minute" | "minutes" => (60.0, Dimension::TIME),
        "hr" | "hour" | "hours" => (3_600.0, Dimension::TIME),
        "kg" => (1.0, Dimension::MASS),
        "lb" | "lbm" => (LB_TO_KG, Dimension::MASS),
        "N" => (1.0, Dimension::FORCE),
        "lbf" => (LBF_TO_N, Dimension::FORCE),
        "J" => (1.0, Dimension::FORCE * Dimension::LENGTH),
        "Pa" => (1.0, Dimension::FORCE / Dimension::LENGTH.powf(2.0)),
        "K" => (1.0, Dimension::TEMPERATURE),
        "kt" | "kts" | "knot" | "knots" => (KNOT_TO_M_S, velocity),
        _ => return None,
    };
    Some(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn compound_units_divide_factor_by_factor() {
        let r = Unit::parse("J/kg/K").unwrap();
        assert!(r.dimension().matches(&Dimension::new(2.0, 0.0, -2.0, -1.0)));

        let tsfc = Unit::parse("lb/hr/lbf").unwrap();
        assert!(tsfc.dimension().matches(&Dimension::new(-1.0, 0.0, 1.0, 0.0)));
        assert_relative_eq!(tsfc.scale(), LB_TO_KG / 3_600.0 / LBF_TO_N, max_relative = 1e-12);

        let alt = Unit::parse("kg/m^3").unwrap();
        assert!(alt.dimension().matches(&Dimension::new(-3.0, 1.0, 0.0, 0.0)));
    }

    #[test]
    fn dash_and_blank_are_dimensionless() {
        assert!(Unit::parse("-").unwrap().dimension().is_dimensionless());
        assert!(Unit::parse("  ").unwrap().dimension().is_dimensionless());
    }

    #[test]
    fn conversions_respect_dimensions() {
        let feet = Unit::parse("feet").unwrap();
        let metres = Unit::parse("m").unwrap();
        assert_relative_eq!(feet.convert(1_000.0, &metres).unwrap(), 304.8, max_relative = 1e-12);

        let rate = Unit::parse("feet/min").unwrap();
        assert_relative_eq!(rate.to_si(60.0), FT_TO_M, max_relative = 1e-12);

        let knots = Unit::parse("knots").unwrap();
        assert_relative_eq!(knots.to_si(1.0), KNOT_TO_M_S, max_relative = 1e-12);

        assert!(matches!(
            feet.convert(1.0, &knots),
            Err(UnitError::Incompatible { .. })
        ));
    }

    #[test]
    fn bad_unit_strings_are_rejected() {
        assert!(matches!(
            Unit::parse("furlong"),
            Err(UnitError::UnknownSymbol { .. })
        ));
        assert!(matches!(Unit::parse("m//s"), Err(UnitError::Malformed(_))));
        assert!(matches!(Unit::parse("m^x"), Err(UnitError::Malformed(_))));
    }

    #[test]
    fn display_lists_non_zero_exponents() {
        assert_eq!(Dimension::FORCE.to_string(), "m kg s^-2");
        assert_eq!(Dimension::NONE.to_string(), "-");
    }
}
