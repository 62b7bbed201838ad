use sqlx::PgPool;

use crate::{
    error::Result,
    models::{Page, ProductRating},
};

pub async fn list_for_product(
    pool: &PgPool,
    product_id: i32,
    limit: i64,
    offset: i64,
) -> Result<Page<ProductRating>> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM product_ratings WHERE product_id = $1")
            .bind(product_id)
            .fetch_one(pool)
            .await?;

    let items = sqlx::query_as::<_, ProductRating>(
        "SELECT * FROM product_ratings
         WHERE product_id = $1
         ORDER BY created_at DESC, id DESC
         LIMIT $2 OFFSET $3",
    )
    .bind(product_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(Page { count, items })
}

pub async fn find_for_user(
    pool: &PgPool,
    product_id: i32,
    user_id: i32,
) -> Result<Option<ProductRating>> {
    let rating = sqlx::query_as::<_, ProductRating>(
        "SELECT * FROM product_ratings WHERE product_id = $1 AND user_id = $2",
    )
    .bind(product_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(rating)
}

pub async fn create_rating(
    pool: &PgPool,
    product_id: i32,
    user_id: i32,
    rating: i16,
    comment: Option<String>,
) -> Result<ProductRating> {
    let created = sqlx::query_as::<_, ProductRating>(
        "INSERT INTO product_ratings (product_id, user_id, rating, comment)
         VALUES ($1, $2, $3, $4)
         RETURNING *",
    )
    .bind(product_id)
    .bind(user_id)
    .bind(rating)
    .bind(comment)
    .fetch_one(pool)
    .await?;

    Ok(created)
}

/// `comment: None` keeps the stored comment.
pub async fn update_rating(
    pool: &PgPool,
    id: i32,
    rating: i16,
    comment: Option<Option<String>>,
) -> Result<ProductRating> {
    let keep_comment = comment.is_none();

    let updated = sqlx::query_as::<_, ProductRating>(
        "UPDATE product_ratings
         SET rating = $1,
             comment = CASE WHEN $2 THEN comment ELSE $3 END,
             updated_at = NOW()
         WHERE id = $4
         RETURNING *",
    )
    .bind(rating)
    .bind(keep_comment)
    .bind(comment.flatten())
    .bind(id)
    .fetch_one(pool)
    .await?;

    Ok(updated)
}
