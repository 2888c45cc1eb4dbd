//! Catalog domain model.
//!
//! # Responsibility
//! - Define the category/product records shared by storage, services and
//!   the HTTP adapter.
//! - Own input validation rules so outer layers can reject bad payloads
//!   before any storage call.
//!
//! # Invariants
//! - Identifiers are assigned by the store and never reused.
//! - `Product::category` is a plain reference; nothing checks that the
//!   category exists.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod category;
pub mod product;

/// Validation failure for caller-supplied entity values.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Field is empty or whitespace only.
    Blank { field: &'static str },
    /// Field is shorter than the allowed minimum (in characters).
    TooShort {
        field: &'static str,
        min: usize,
        actual: usize,
    },
    /// Numeric field must be finite and strictly positive.
    NotPositive { field: &'static str, value: f64 },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank { field } => write!(f, "{field} must not be blank"),
            Self::TooShort { field, min, actual } => write!(
                f,
                "{field} must be at least {min} characters long, got {actual}"
            ),
            Self::NotPositive { field, value } => {
                write!(f, "{field} must be greater than 0, got {value}")
            }
        }
    }
}

impl Error for ValidationError {}
