//! Product record.
//!
//! # Invariants
//! - `name` has at least `PRODUCT_NAME_MIN_CHARS` characters, whitespace
//!   included.
//! - `price` is finite and strictly positive.
//! - `description` is optional in input; absent means empty.

use super::category::CategoryId;
use super::ValidationError;
use serde::{Deserialize, Serialize};

/// Store-assigned product identifier.
pub type ProductId = i64;

pub const PRODUCT_NAME_MIN_CHARS: usize = 3;

/// Sellable item referencing one category by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Ignored on create; selects the row on update.
    #[serde(default)]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Not checked against existing categories.
    #[serde(default)]
    pub category: CategoryId,
    pub price: f64,
}

impl Product {
    /// Builds an unsaved product with an empty description.
    pub fn new(name: impl Into<String>, category: CategoryId, price: f64) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description: String::new(),
            category,
            price,
        }
    }

    /// Sets the description, builder style.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Checks caller-supplied fields.
    ///
    /// # Errors
    /// - `ValidationError::TooShort` when `name` is under the minimum length.
    /// - `ValidationError::NotPositive` when `price` is not a finite value > 0.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let name_chars = self.name.chars().count();
        if name_chars < PRODUCT_NAME_MIN_CHARS {
            return Err(ValidationError::TooShort {
                field: "name",
                min: PRODUCT_NAME_MIN_CHARS,
                actual: name_chars,
            });
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(ValidationError::NotPositive {
                field: "price",
                value: self.price,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Product;
    use crate::model::ValidationError;

    #[test]
    fn short_name_is_rejected() {
        let err = Product::new("ab", 1, 1.0).validate().unwrap_err();
        assert!(matches!(
            err,
            ValidationError::TooShort {
                field: "name",
                min: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn name_length_counts_characters_not_bytes_or_trimmed_text() {
        assert!(Product::new("  ab", 1, 1.0).validate().is_ok());
        assert!(Product::new("äöü", 1, 1.0).validate().is_ok());
        let err = Product::new("äö", 1, 1.0).validate().unwrap_err();
        assert!(matches!(err, ValidationError::TooShort { actual: 2, .. }));
    }

    #[test]
    fn zero_and_nan_prices_are_rejected() {
        for price in [0.0, -3.5, f64::NAN, f64::INFINITY] {
            let err = Product::new("Hammer", 1, price).validate().unwrap_err();
            assert!(matches!(err, ValidationError::NotPositive { field: "price", .. }));
        }
    }

    #[test]
    fn optional_fields_default_when_absent() {
        let product: Product =
            serde_json::from_str(r#"{"name":"Hammer","price":9.99}"#).unwrap();
        assert_eq!(product.id, 0);
        assert_eq!(product.description, "");
        assert_eq!(product.category, 0);
        assert!(product.validate().is_ok());
    }
}
