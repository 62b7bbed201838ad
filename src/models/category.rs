use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::nullable;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i32>,
    #[serde(rename = "order")]
    pub sort_order: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CategoryWithChildren {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<CategoryWithChildren>,
}

#[derive(Debug, Serialize)]
pub struct CategoryTree {
    pub categories: Vec<CategoryWithChildren>,
}

/// A category with its direct children only.
#[derive(Debug, Serialize)]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<Category>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryQuery {
    /// Empty string selects root categories.
    pub parent_id: Option<String>,
    pub q: Option<String>,
}

/// Parent filter resolved from [`CategoryQuery::parent_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentFilter {
    Any,
    Root,
    Parent(i32),
}

impl CategoryQuery {
    pub fn parent_filter(&self) -> Option<ParentFilter> {
        match self.parent_id.as_deref().map(str::trim) {
            None => Some(ParentFilter::Any),
            Some("") | Some("null") => Some(ParentFilter::Root),
            Some(raw) => raw.parse().ok().map(ParentFilter::Parent),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub parent_id: Option<i32>,
    pub order: Option<i32>,
}

/// `None` leaves a field untouched; `Some(None)` clears a nullable column.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub parent_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub order: Option<Option<i32>>,
}

/// Validated category fields ready to be written.
#[derive(Debug)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub parent_id: Option<Option<i32>>,
    pub sort_order: Option<Option<i32>>,
}

/// Compact category reference embedded in product responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryRef {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

pub fn normalize_slug(slug: &str) -> String {
    slug.trim().to_lowercase()
}
