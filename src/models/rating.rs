use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::nullable;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductRating {
    pub id: i32,
    pub product_id: i32,
    pub user_id: i32,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RatingRequest {
    /// A JSON number or a numeric string.
    pub rating: Option<Value>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub comment: Option<Option<String>>,
}

impl RatingRequest {
    /// Ratings are whole numbers from 1 to 5.
    pub fn score(&self) -> Option<i16> {
        let value = match self.rating.as_ref()? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };

        (value.fract() == 0.0 && (1.0..=5.0).contains(&value)).then_some(value as i16)
    }

    /// `None` leaves an existing comment as is; blank or `null` clears it.
    pub fn comment_change(&self) -> Option<Option<String>> {
        self.comment.as_ref().map(|comment| {
            comment
                .as_deref()
                .filter(|c| !c.is_empty())
                .map(str::to_string)
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default, deserialize_with = "nullable::empty_as_none")]
    pub limit: Option<i64>,
    #[serde(default, deserialize_with = "nullable::empty_as_none")]
    pub offset: Option<i64>,
}
