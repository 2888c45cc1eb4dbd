//! Category record.

use super::ValidationError;
use serde::{Deserialize, Serialize};

/// Store-assigned category identifier.
pub type CategoryId = i64;

/// Product grouping; only carries a display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Ignored on create; selects the row on update.
    #[serde(default)]
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    /// Builds an unsaved category. `id` stays `0` until the store assigns one.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
        }
    }

    /// Checks caller-supplied fields.
    ///
    /// # Errors
    /// - `ValidationError::Blank` when `name` is empty after trimming.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Blank { field: "name" });
        }
        Ok(())
    }
}
