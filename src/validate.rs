//! Submit-time validation of the raw form.
//!
//! Rules run in three passes over the fields in declared order:
//!
//! 1. completeness (every trimmed value non-empty)
//! 2. numeric parse (finite `f64`)
//! 3. range (`[-STANDARDIZED_BOUND, STANDARDIZED_BOUND]`, inclusive)
//!
//! The first pass that finds a problem decides the error.

use std::fmt;

use crate::domain::{FeatureVector, FieldKey, FormState};

/// Standardized inputs are expected to sit within this many units of zero.
pub const STANDARDIZED_BOUND: f64 = 4.0;

/// Closed interval a parsed value must fall in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    pub min: f64,
    pub max: f64,
}

impl Bound {
    pub const STANDARDIZED: Bound = Bound {
        min: -STANDARDIZED_BOUND,
        max: STANDARDIZED_BOUND,
    };

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Fields left blank, in declared order.
    #[error("Please fill in: {}", join_labels(.0))]
    MissingFields(Vec<FieldKey>),
    #[error("{0} must be a number")]
    NotANumber(FieldKey),
    #[error("{field} must be within {bound}")]
    OutOfRange { field: FieldKey, bound: Bound },
}

impl ValidationError {
    /// The field the message is about, when there is exactly one.
    pub fn field(&self) -> Option<FieldKey> {
        match self {
            ValidationError::MissingFields(keys) => keys.first().copied(),
            ValidationError::NotANumber(key) => Some(*key),
            ValidationError::OutOfRange { field, .. } => Some(*field),
        }
    }
}

fn join_labels(keys: &[FieldKey]) -> String {
    keys.iter()
        .map(|k| k.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validate against the standardized bound.
pub fn validate(form: &FormState) -> Result<FeatureVector, ValidationError> {
    validate_with_bound(form, Bound::STANDARDIZED)
}

pub fn validate_with_bound(
    form: &FormState,
    bound: Bound,
) -> Result<FeatureVector, ValidationError> {
    let missing: Vec<FieldKey> = form
        .iter()
        .filter(|(_, raw)| raw.trim().is_empty())
        .map(|(key, _)| key)
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }

    let mut parsed = [0.0_f64; 10];
    for (key, raw) in form.iter() {
        parsed[key.index()] = parse_number(raw).ok_or(ValidationError::NotANumber(key))?;
    }

    if let Some(field) = FieldKey::ALL
        .into_iter()
        .find(|key| !bound.contains(parsed[key.index()]))
    {
        return Err(ValidationError::OutOfRange { field, bound });
    }

    Ok(FeatureVector::from_fn(|key| parsed[key.index()]))
}

/// Parse a trimmed value as a finite float.
///
/// Rust's parser accepts `inf` and `NaN` spellings; those are not numbers a
/// person can enter in this form.
fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
