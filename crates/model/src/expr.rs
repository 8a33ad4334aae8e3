//! Monomial and posynomial expressions over registered quantities.
//!
//! Coefficients are stored in SI so that a constant such as `1500 ft` and a variable declared in
//! feet combine without explicit conversion. Each monomial tracks its [`Dimension`]; dimensional
//! consistency is checked when a constraint is built, not while composing expressions.

use std::collections::BTreeMap;
use std::iter::Sum;
use std::ops::{Add, Div, Mul};

use sizing_core::{Dimension, Unit};

use crate::error::ModelError;

const EXPONENT_EPSILON: f64 = 1e-12;

/// Identifies a scalar quantity (`index == None`) or one element of a vector quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarKey {
    pub id: usize,
    pub index: Option<usize>,
}

impl VarKey {
    pub fn scalar(id: usize) -> Self {
        Self { id, index: None }
    }

    pub fn element(id: usize, index: usize) -> Self {
        Self {
            id,
            index: Some(index),
        }
    }
}

/// `coeff * prod(x_k ^ e_k)` with a positive coefficient expressed in SI.
#[derive(Debug, Clone, PartialEq)]
pub struct Monomial {
    coeff: f64,
    exponents: BTreeMap<VarKey, f64>,
    dimension: Dimension,
}

impl Monomial {
    /// Dimensionless constant.
    pub fn constant(value: f64) -> Self {
        Self {
            coeff: value,
            exponents: BTreeMap::new(),
            dimension: Dimension::NONE,
        }
    }

    /// Constant carrying a unit, e.g. `Monomial::with_unit(1500.0, "ft")`.
    pub fn with_unit(value: f64, unit: &str) -> Result<Self, ModelError> {
        let unit = Unit::parse(unit)?;
        Ok(Self::from_unit(value, &unit))
    }

    pub fn from_unit(value: f64, unit: &Unit) -> Self {
        Self {
            coeff: unit.to_si(value),
            exponents: BTreeMap::new(),
            dimension: unit.dimension(),
        }
    }

    pub(crate) fn variable(key: VarKey, dimension: Dimension) -> Self {
        let mut exponents = BTreeMap::new();
        exponents.insert(key, 1.0);
        Self {
            coeff: 1.0,
            exponents,
            dimension,
        }
    }

    pub fn coeff(&self) -> f64 {
        self.coeff
    }

    pub fn exponents(&self) -> &BTreeMap<VarKey, f64> {
        &self.exponents
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn is_constant(&self) -> bool {
        self.exponents.is_empty()
    }

    /// Raise to a real power.
    pub fn powf(&self, exponent: f64) -> Self {
        let mut exponents = BTreeMap::new();
        for (key, e) in &self.exponents {
            let scaled = e * exponent;
            if scaled.abs() > EXPONENT_EPSILON {
                exponents.insert(*key, scaled);
            }
        }
        Self {
            coeff: self.coeff.powf(exponent),
            exponents,
            dimension: self.dimension.powf(exponent),
        }
    }

    pub fn sqrt(&self) -> Self {
        self.powf(0.5)
    }

    /// Value at `values` (SI); `None` if a referenced element has no value.
    pub fn evaluate(&self, values: &BTreeMap<VarKey, f64>) -> Option<f64> {
        self.exponents.iter().try_fold(self.coeff, |acc, (key, e)| {
            values.get(key).map(|x| acc * x.powf(*e))
        })
    }

    fn scaled(&self, factor: f64) -> Self {
        Self {
            coeff: self.coeff * factor,
            ..self.clone()
        }
    }
}

fn mono_mul(a: &Monomial, b: &Monomial) -> Monomial {
    let mut exponents = a.exponents.clone();
    for (key, e) in &b.exponents {
        let entry = exponents.entry(*key).or_insert(0.0);
        *entry += e;
        if entry.abs() <= EXPONENT_EPSILON {
            exponents.remove(key);
        }
    }
    Monomial {
        coeff: a.coeff * b.coeff,
        exponents,
        dimension: a.dimension * b.dimension,
    }
}

fn mono_div(a: &Monomial, b: &Monomial) -> Monomial {
    mono_mul(a, &b.powf(-1.0))
}

/// Sum of monomials with positive coefficients.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Posynomial {
    terms: Vec<Monomial>,
}

impl Posynomial {
    pub fn terms(&self) -> &[Monomial] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// The single term, if this posynomial is a monomial.
    pub fn as_monomial(&self) -> Option<&Monomial> {
        match self.terms.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    pub fn evaluate(&self, values: &BTreeMap<VarKey, f64>) -> Option<f64> {
        self.terms.iter().map(|t| t.evaluate(values)).sum()
    }

    /// Sum an iterator of monomials or posynomials.
    pub fn sum<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Posynomial>,
    {
        let mut terms = Vec::new();
        for item in items {
            terms.extend(item.into().terms);
        }
        Self { terms }
    }
}

impl From<Monomial> for Posynomial {
    fn from(value: Monomial) -> Self {
        Self { terms: vec![value] }
    }
}

impl From<&Monomial> for Posynomial {
    fn from(value: &Monomial) -> Self {
        Self {
            terms: vec![value.clone()],
        }
    }
}

impl From<f64> for Posynomial {
    fn from(value: f64) -> Self {
        Monomial::constant(value).into()
    }
}

impl From<f64> for Monomial {
    fn from(value: f64) -> Self {
        Monomial::constant(value)
    }
}

impl Sum<Monomial> for Posynomial {
    fn sum<I: Iterator<Item = Monomial>>(iter: I) -> Self {
        Self {
            terms: iter.collect(),
        }
    }
}

fn posy_add(a: &Posynomial, b: &Posynomial) -> Posynomial {
    let mut terms = a.terms.clone();
    terms.extend(b.terms.iter().cloned());
    Posynomial { terms }
}

fn posy_mul_mono(a: &Posynomial, b: &Monomial) -> Posynomial {
    Posynomial {
        terms: a.terms.iter().map(|t| mono_mul(t, b)).collect(),
    }
}

fn posy_div_mono(a: &Posynomial, b: &Monomial) -> Posynomial {
    posy_mul_mono(a, &b.powf(-1.0))
}

fn mono_add(a: &Monomial, b: &Monomial) -> Posynomial {
    Posynomial {
        terms: vec![a.clone(), b.clone()],
    }
}

fn mono_add_posy(a: &Monomial, b: &Posynomial) -> Posynomial {
    posy_add(&Posynomial::from(a), b)
}

fn posy_add_mono(a: &Posynomial, b: &Monomial) -> Posynomial {
    posy_add(a, &Posynomial::from(b))
}

fn mono_mul_posy(a: &Monomial, b: &Posynomial) -> Posynomial {
    posy_mul_mono(b, a)
}

/// Implements a binary operator for every owned/borrowed combination of operands.
macro_rules! forward_binop {
    ($imp:ident, $method:ident, $lhs:ty, $rhs:ty, $out:ty, $func:ident) => {
        impl $imp<$rhs> for $lhs {
            type Output = $out;
            fn $method(self, rhs: $rhs) -> $out {
                $func(&self, &rhs)
            }
        }

        impl $imp<&$rhs> for $lhs {
            type Output = $out;
            fn $method(self, rhs: &$rhs) -> $out {
                $func(&self, rhs)
            }
        }

        impl $imp<$rhs> for &$lhs {
            type Output = $out;
            fn $method(self, rhs: $rhs) -> $out {
                $func(self, &rhs)
            }
        }

        impl $imp<&$rhs> for &$lhs {
            type Output = $out;
            fn $method(self, rhs: &$rhs) -> $out {
                $func(self, rhs)
            }
        }
    };
}

forward_binop!(Mul, mul, Monomial, Monomial, Monomial, mono_mul);
forward_binop!(Div, div, Monomial, Monomial, Monomial, mono_div);
forward_binop!(Add, add, Monomial, Monomial, Posynomial, mono_add);
forward_binop!(Add, add, Monomial, Posynomial, Posynomial, mono_add_posy);
forward_binop!(Add, add, Posynomial, Monomial, Posynomial, posy_add_mono);
forward_binop!(Add, add, Posynomial, Posynomial, Posynomial, posy_add);
forward_binop!(Mul, mul, Posynomial, Monomial, Posynomial, posy_mul_mono);
forward_binop!(Mul, mul, Monomial, Posynomial, Posynomial, mono_mul_posy);
forward_binop!(Div, div, Posynomial, Monomial, Posynomial, posy_div_mono);

impl Mul<f64> for Monomial {
    type Output = Monomial;
    fn mul(self, rhs: f64) -> Monomial {
        self.scaled(rhs)
    }
}

impl Mul<f64> for &Monomial {
    type Output = Monomial;
    fn mul(self, rhs: f64) -> Monomial {
        self.scaled(rhs)
    }
}

impl Mul<Monomial> for f64 {
    type Output = Monomial;
    fn mul(self, rhs: Monomial) -> Monomial {
        rhs.scaled(self)
    }
}

impl Mul<&Monomial> for f64 {
    type Output = Monomial;
    fn mul(self, rhs: &Monomial) -> Monomial {
        rhs.scaled(self)
    }
}

impl Div<f64> for Monomial {
    type Output = Monomial;
    fn div(self, rhs: f64) -> Monomial {
        self.scaled(1.0 / rhs)
    }
}

impl Div<f64> for &Monomial {
    type Output = Monomial;
    fn div(self, rhs: f64) -> Monomial {
        self.scaled(1.0 / rhs)
    }
}

impl Mul<f64> for Posynomial {
    type Output = Posynomial;
    fn mul(self, rhs: f64) -> Posynomial {
        Posynomial {
            terms: self.terms.iter().map(|t| t.scaled(rhs)).collect(),
        }
    }
}

/// `z + z^2/2! + ... + z^n/n!`, the posynomial lower bound of `exp(z) - 1`.
pub fn te_exp_minus1(z: &Monomial, nterm: usize) -> Posynomial {
    let mut factorial = 1.0;
    let mut terms = Vec::with_capacity(nterm);
    for k in 1..=nterm {
        factorial *= k as f64;
        terms.push(z.powf(k as f64) / factorial);
    }
    Posynomial { terms }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn var(id: usize, dim: Dimension) -> Monomial {
        Monomial::variable(VarKey::scalar(id), dim)
    }

    #[test]
    fn multiplication_adds_exponents_and_dimensions() {
        let x = var(0, Dimension::LENGTH);
        let t = var(1, Dimension::TIME);
        let speed = &x / &t;
        assert!(speed.dimension().matches(&Dimension::new(1.0, 0.0, -1.0, 0.0)));
        let back = speed * &t;
        assert_eq!(back.exponents().len(), 1);
        assert_relative_eq!(back.exponents()[&VarKey::scalar(0)], 1.0);
    }

    #[test]
    fn constants_are_stored_in_si() {
        let alt = Monomial::with_unit(1500.0, "ft").unwrap();
        assert_relative_eq!(alt.coeff(), 457.2, epsilon = 1e-9);
        assert!(alt.dimension().matches(&Dimension::LENGTH));
    }

    #[test]
    fn truncated_exponential_has_factorial_coefficients() {
        let z = var(3, Dimension::NONE);
        let series = te_exp_minus1(&z, 3);
        let coeffs: Vec<f64> = series.terms().iter().map(|t| t.coeff()).collect();
        assert_relative_eq!(coeffs[0], 1.0);
        assert_relative_eq!(coeffs[1], 0.5);
        assert_relative_eq!(coeffs[2], 1.0 / 6.0);
    }
}
