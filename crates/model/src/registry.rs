//! Declarations of every named quantity a model refers to.

use std::collections::BTreeMap;

use sizing_core::{Dimension, Unit};

use crate::error::ModelError;
use crate::expr::{Monomial, VarKey};
use crate::substitution::Substitutions;

/// Whether a quantity holds one value or one value per element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Scalar,
    Vector(usize),
}

/// A declared physical quantity.
#[derive(Debug, Clone)]
pub struct Quantity {
    pub name: String,
    pub unit: Unit,
    pub label: String,
    pub shape: Shape,
    /// Default value in SI, applied as a substitution unless overridden.
    pub fixed: Option<f64>,
}

impl Quantity {
    /// Axis-style label, e.g. `Aircraft Flight Speed [knots]`.
    pub fn axis_label(&self) -> String {
        format!("{} [{}]", self.label, self.unit.symbol())
    }
}

/// Handle on a vector quantity; elements are addressed with [`VectorVar::at`].
#[derive(Debug, Clone, Copy)]
pub struct VectorVar {
    id: usize,
    len: usize,
    dimension: Dimension,
}

impl VectorVar {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn key(&self, index: usize) -> VarKey {
        VarKey::element(self.id, index)
    }

    /// Monomial for element `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the declared length, like slice indexing.
    pub fn at(&self, index: usize) -> Monomial {
        assert!(
            index < self.len,
            "index {index} out of range for vector quantity of length {}",
            self.len
        );
        Monomial::variable(self.key(index), self.dimension)
    }
}

/// Registry of named quantities. Names are unique; declarations are read-only once a model is linked.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    quantities: Vec<Quantity>,
    by_name: BTreeMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a free scalar quantity.
    pub fn scalar(&mut self, name: &str, unit: &str, label: &str) -> Result<Monomial, ModelError> {
        let id = self.declare(name, unit, label, Shape::Scalar, None)?;
        Ok(Monomial::variable(
            VarKey::scalar(id),
            self.quantities[id].unit.dimension(),
        ))
    }

    /// Declare a scalar quantity with a default value expressed in `unit`.
    pub fn fixed(
        &mut self,
        name: &str,
        value: f64,
        unit: &str,
        label: &str,
    ) -> Result<Monomial, ModelError> {
        if !(value.is_finite() && value > 0.0) {
            return Err(ModelError::InvalidValue(name.to_string()));
        }
        let parsed = Unit::parse(unit)?;
        let si = parsed.to_si(value);
        let id = self.declare(name, unit, label, Shape::Scalar, Some(si))?;
        Ok(Monomial::variable(VarKey::scalar(id), parsed.dimension()))
    }

    /// Declare a vector quantity of `len` elements.
    pub fn vector(
        &mut self,
        name: &str,
        len: usize,
        unit: &str,
        label: &str,
    ) -> Result<VectorVar, ModelError> {
        let id = self.declare(name, unit, label, Shape::Vector(len), None)?;
        Ok(VectorVar {
            id,
            len,
            dimension: self.quantities[id].unit.dimension(),
        })
    }

    fn declare(
        &mut self,
        name: &str,
        unit: &str,
        label: &str,
        shape: Shape,
        fixed: Option<f64>,
    ) -> Result<usize, ModelError> {
        if self.by_name.contains_key(name) {
            return Err(ModelError::DuplicateQuantity(name.to_string()));
        }
        let unit = Unit::parse(unit)?;
        let id = self.quantities.len();
        self.quantities.push(Quantity {
            name: name.to_string(),
            unit,
            label: label.to_string(),
            shape,
            fixed,
        });
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    pub fn quantity(&self, id: usize) -> &Quantity {
        &self.quantities[id]
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Quantity)> {
        self.quantities.iter().enumerate()
    }

    pub fn lookup(&self, name: &str) -> Option<(usize, &Quantity)> {
        self.by_name.get(name).map(|&id| (id, &self.quantities[id]))
    }

    /// Resolve a name (and element index for vectors) into a key.
    pub fn key(&self, name: &str, index: Option<usize>) -> Result<VarKey, ModelError> {
        let (id, quantity) = self
            .lookup(name)
            .ok_or_else(|| ModelError::UnknownQuantity(name.to_string()))?;
        match (quantity.shape, index) {
            (Shape::Scalar, None) => Ok(VarKey::scalar(id)),
            (Shape::Scalar, Some(_)) => Err(ModelError::UnexpectedIndex(name.to_string())),
            (Shape::Vector(_), None) => Err(ModelError::MissingIndex(name.to_string())),
            (Shape::Vector(len), Some(i)) if i >= len => Err(ModelError::IndexOutOfRange {
                name: name.to_string(),
                index: i,
                len,
            }),
            (Shape::Vector(_), Some(i)) => Ok(VarKey::element(id, i)),
        }
    }

    /// Human-readable name of a key, e.g. `W_start[3]`.
    pub fn describe(&self, key: VarKey) -> String {
        let name = &self.quantities[key.id].name;
        match key.index {
            Some(i) => format!("{name}[{i}]"),
            None => name.clone(),
        }
    }

    /// Convert `value` given in `unit` to SI, checking it matches the quantity's dimension.
    pub fn to_si(&self, key: VarKey, value: f64, unit: &str) -> Result<f64, ModelError> {
        if !(value.is_finite() && value > 0.0) {
            return Err(ModelError::InvalidValue(self.describe(key)));
        }
        let given = Unit::parse(unit)?;
        let declared = &self.quantities[key.id].unit;
        let converted = given.convert(value, declared)?;
        Ok(declared.to_si(converted))
    }

    /// Default values declared with [`Registry::fixed`].
    pub fn fixed_values(&self) -> Substitutions {
        let mut subs = Substitutions::new();
        for (id, quantity) in self.iter() {
            if let Some(value) = quantity.fixed {
                subs.insert(VarKey::scalar(id), value);
            }
        }
        subs
    }
}
