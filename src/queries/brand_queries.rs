use sqlx::PgPool;

use crate::{error::Result, models::Brand};

pub async fn get_all(pool: &PgPool) -> Result<Vec<Brand>> {
    let brands = sqlx::query_as::<_, Brand>("SELECT * FROM brands ORDER BY name ASC")
        .fetch_all(pool)
        .await?;

    Ok(brands)
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Brand>> {
    let brand = sqlx::query_as::<_, Brand>("SELECT * FROM brands WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(brand)
}

pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Brand>> {
    let brand = sqlx::query_as::<_, Brand>("SELECT * FROM brands WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await?;

    Ok(brand)
}

pub async fn create_brand(pool: &PgPool, name: &str) -> Result<Brand> {
    let brand = sqlx::query_as::<_, Brand>(
        "INSERT INTO brands (name) VALUES ($1) RETURNING *",
    )
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(brand)
}

/// Returns the brand with this exact name, creating it when missing.
pub async fn find_or_create(pool: &PgPool, name: &str) -> Result<Brand> {
    let brand = sqlx::query_as::<_, Brand>(
        "INSERT INTO brands (name) VALUES ($1)
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
         RETURNING *",
    )
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(brand)
}

pub async fn update_brand(pool: &PgPool, id: i32, name: &str) -> Result<Option<Brand>> {
    let brand = sqlx::query_as::<_, Brand>(
        "UPDATE brands SET name = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(name)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(brand)
}

pub async fn delete_brand(pool: &PgPool, id: i32) -> Result<bool> {
    let result = sqlx::query("DELETE FROM brands WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
