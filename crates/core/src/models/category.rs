//! Product categories.

use serde::{Deserialize, Serialize};

use crate::types::CategoryId;

/// A category as read from the store.
///
/// Products reference categories by name, not by ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    #[serde(default)]
    pub name: String,
}

/// Payload for adding a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
}
