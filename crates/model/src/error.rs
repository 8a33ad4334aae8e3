use sizing_core::UnitError;
use thiserror::Error;

/// Errors raised while declaring quantities or assembling constraints.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("quantity '{0}' is already declared")]
    DuplicateQuantity(String),
    #[error("quantity '{0}' is not declared")]
    UnknownQuantity(String),
    #[error("quantity '{name}' has no element {index} (length {len})")]
    IndexOutOfRange {
        name: String,
        index: usize,
        len: usize,
    },
    #[error("quantity '{0}' is a vector; an element index is required")]
    MissingIndex(String),
    #[error("quantity '{0}' is a scalar and cannot be indexed")]
    UnexpectedIndex(String),
    #[error("unit error: {0}")]
    Unit(#[from] UnitError),
    #[error("constraint '{constraint}' is dimensionally inconsistent: expected {expected}, found {found}")]
    DimensionMismatch {
        constraint: String,
        expected: String,
        found: String,
    },
    #[error("constraint '{0}' has an empty side")]
    EmptyExpression(String),
    #[error("constraint '{0}' has a non-positive or non-finite coefficient")]
    InvalidCoefficient(String),
    #[error("equality '{0}' must relate two monomials")]
    NonMonomialEquality(String),
    #[error("constraint '{0}' has a multi-term right-hand side but is not tagged signomial")]
    UndeclaredSignomial(String),
    #[error("'{key}' is overridden with conflicting values by '{first}' and '{second}'")]
    ConflictingOverride {
        key: String,
        first: String,
        second: String,
    },
    #[error("value for '{0}' must be positive and finite")]
    InvalidValue(String),
    #[error("objective must not be empty")]
    EmptyObjective,
}
