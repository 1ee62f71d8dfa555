//! Database models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Row of the `regions` table. A region with no parent is top-level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Region {
    pub slug: String,
    pub parent_slug: Option<String>,
}

/// Row of the `ports` table; `parent_slug` names the owning region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Port {
    pub code: String,
    pub parent_slug: Option<String>,
}

/// Row of the `codes` table: `key` (port code or region slug) resolves to
/// the elementary port `code`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, FromRow)]
pub struct LocationCode {
    pub key: String,
    pub code: String,
}

impl Region {
    pub fn new(slug: impl Into<String>, parent_slug: Option<&str>) -> Self {
        Self {
            slug: slug.into(),
            parent_slug: parent_slug.map(str::to_string),
        }
    }
}

impl Port {
    pub fn new(code: impl Into<String>, parent_slug: Option<&str>) -> Self {
        Self {
            code: code.into(),
            parent_slug: parent_slug.map(str::to_string),
        }
    }
}
