use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy, dec};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{AppError, Result},
    models::{BrandRef, CategoryRef},
    utils::nullable,
};

/// Largest value a NUMERIC(10, 2) column can hold.
const MAX_PRICE: Decimal = dec!(99999999.99);

/// Product joined with its brand, category and rating aggregates.
/// Image bytes are never selected into this row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i32,
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub characteristics: Option<Value>,
    pub specifications: Option<Value>,
    pub image_url: Option<String>,
    pub image_mime_type: Option<String>,
    pub images: Option<Vec<String>>,
    pub brand_id: Option<i32>,
    pub category_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub brand_name: Option<String>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
    pub avg_rating: Option<f64>,
    pub ratings_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: i32,
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub characteristics: Option<Value>,
    pub specifications: Option<Value>,
    pub image_url: Option<String>,
    pub image_mime_type: Option<String>,
    pub images: Option<Vec<String>>,
    pub brand_id: Option<i32>,
    pub category_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub brand: Option<BrandRef>,
    pub category: Option<CategoryRef>,
    pub avg_rating: Option<f64>,
    pub ratings_count: i64,
}

impl From<ProductRow> for ProductView {
    fn from(row: ProductRow) -> Self {
        let brand = match (row.brand_id, row.brand_name) {
            (Some(id), Some(name)) => Some(BrandRef { id, name }),
            _ => None,
        };
        let category = match (row.category_name, row.category_slug) {
            (Some(name), Some(slug)) => Some(CategoryRef {
                id: row.category_id,
                name,
                slug,
            }),
            _ => None,
        };

        Self {
            id: row.id,
            name: row.name,
            sku: row.sku,
            price: row.price,
            description: row.description,
            characteristics: row.characteristics,
            specifications: row.specifications,
            image_url: row.image_url,
            image_mime_type: row.image_mime_type,
            images: row.images,
            brand_id: row.brand_id,
            category_id: row.category_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            brand,
            category,
            avg_rating: row.avg_rating,
            ratings_count: row.ratings_count,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductImageData {
    pub image_data: Option<Vec<u8>>,
    pub image_mime_type: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    PriceAsc,
    PriceDesc,
    NameAsc,
    Newest,
    Relevance,
}

impl SortBy {
    /// Unknown or missing values fall back to newest first.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("price_asc") => SortBy::PriceAsc,
            Some("price_desc") => SortBy::PriceDesc,
            Some("name_asc") => SortBy::NameAsc,
            Some("relevance") => SortBy::Relevance,
            _ => SortBy::Newest,
        }
    }

    pub fn order_clause(self, has_text_search: bool) -> &'static str {
        match self {
            SortBy::PriceAsc => "p.price ASC, p.id ASC",
            SortBy::PriceDesc => "p.price DESC, p.id ASC",
            SortBy::NameAsc => "p.name ASC, p.id ASC",
            SortBy::Relevance if has_text_search => "p.name ASC, p.id ASC",
            SortBy::Relevance | SortBy::Newest => "p.created_at DESC, p.id DESC",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub q: Option<String>,
    #[serde(default, deserialize_with = "nullable::empty_as_none")]
    pub brand_id: Option<i32>,
    #[serde(default, deserialize_with = "nullable::empty_as_none")]
    pub category_id: Option<i32>,
    #[serde(default, deserialize_with = "nullable::empty_as_none")]
    pub min_price: Option<Decimal>,
    #[serde(default, deserialize_with = "nullable::empty_as_none")]
    pub max_price: Option<Decimal>,
    pub sort: Option<String>,
    #[serde(default, deserialize_with = "nullable::empty_as_none")]
    pub limit: Option<i64>,
    #[serde(default, deserialize_with = "nullable::empty_as_none")]
    pub offset: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedQuery {
    #[serde(default, deserialize_with = "nullable::empty_as_none")]
    pub limit: Option<i64>,
    #[serde(default, deserialize_with = "nullable::empty_as_none")]
    pub min_ratings: Option<i64>,
}

/// Create/update body. Nullable fields use `Some(None)` for an explicit `null`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub price: Option<Value>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub characteristics: Option<Option<Value>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub specifications: Option<Option<Value>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub image_url: Option<Option<String>>,
    pub images: Option<Value>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub brand_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub brand_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub category_id: Option<Option<i32>>,
}

#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub data: Vec<u8>,
    pub mime_type: String,
}

#[derive(Debug)]
pub struct NewProduct {
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub characteristics: Option<Value>,
    pub specifications: Option<Value>,
    pub image_url: Option<String>,
    pub image: Option<UploadedImage>,
    pub images: Option<Vec<String>>,
    pub brand_id: Option<i32>,
    pub category_id: i32,
}

/// Partial product update; `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<Option<String>>,
    pub characteristics: Option<Option<Value>>,
    pub specifications: Option<Option<Value>>,
    pub image_url: Option<Option<String>>,
    pub images: Option<Vec<String>>,
    pub brand_id: Option<Option<i32>>,
    pub category_id: Option<i32>,
}

/// Brand reference resolved from `brandId` / `brandName`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrandSelector {
    Keep,
    Clear,
    Id(i32),
    Name(String),
}

impl ProductPayload {
    /// `brandId` wins over `brandName`; blank names and null ids clear the brand.
    pub fn brand_selector(&self) -> BrandSelector {
        match (&self.brand_id, &self.brand_name) {
            (Some(Some(id)), _) if *id > 0 => BrandSelector::Id(*id),
            (Some(_), _) => BrandSelector::Clear,
            (None, Some(Some(name))) if !name.trim().is_empty() => {
                BrandSelector::Name(name.trim().to_string())
            }
            (None, Some(_)) => BrandSelector::Clear,
            (None, None) => BrandSelector::Keep,
        }
    }

    /// Keeps only the string entries of `images`; anything but an array yields an empty list.
    pub fn image_list(&self) -> Option<Vec<String>> {
        self.images.as_ref().map(|value| match value {
            Value::Array(items) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        })
    }
}

/// Parses a price given as a JSON number or numeric string, rounded to cents.
pub fn parse_price(value: &Value) -> Result<Decimal> {
    let invalid = || AppError::BadRequest("Invalid price".to_string());

    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err(invalid()),
    };

    let price = Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|_| invalid())?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    if price.is_sign_negative() && !price.is_zero() {
        return Err(AppError::BadRequest("Price cannot be negative".to_string()));
    }

    if price > MAX_PRICE {
        return Err(AppError::BadRequest("Price is too large".to_string()));
    }

    Ok(price)
}
