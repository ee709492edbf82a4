//! Book resource types

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub parts: String,
    pub category: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Body of the book create route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,

    #[serde(default)]
    pub author: String,

    #[serde(default)]
    pub parts: String,

    #[serde(default)]
    pub category: String,
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookPatch {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub parts: Option<String>,

    #[serde(default)]
    pub category: Option<String>,
}

impl BookPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.parts.is_none()
            && self.category.is_none()
    }
}
