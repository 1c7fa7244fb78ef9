use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core category data. Categories are a flat, administrator-managed set of
/// names; uniqueness is enforced by a unique index on `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCore {
    pub name: String,
}

/// Category data ready for insertion.
pub type NewCategory = CategoryCore;

/// A category from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub category: CategoryCore,
}

impl Deref for Category {
    type Target = CategoryCore;

    fn deref(&self) -> &Self::Target {
        &self.category
    }
}
