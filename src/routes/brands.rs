use axum::{
    Json,
    extract::State,
    http::StatusCode,
};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{Brand, BrandRequest},
    queries::brand_queries,
    utils::extractors::{AppJson, AppPath},
};

pub async fn list_brands(State(state): State<AppState>) -> Result<Json<Vec<Brand>>> {
    let brands = brand_queries::get_all(&state.db).await?;

    Ok(Json(brands))
}

pub async fn get_brand(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<Brand>> {
    let brand = brand_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Brand not found".to_string()))?;

    Ok(Json(brand))
}

pub async fn create_brand(
    State(state): State<AppState>,
    AppJson(payload): AppJson<BrandRequest>,
) -> Result<(StatusCode, Json<Brand>)> {
    let name = required_name(payload.name.as_deref())?;

    if brand_queries::find_by_name(&state.db, &name).await?.is_some() {
        return Err(AppError::Conflict("Brand already exists".to_string()));
    }

    let brand = brand_queries::create_brand(&state.db, &name).await?;

    tracing::info!("Brand {} created", brand.id);

    Ok((StatusCode::CREATED, Json(brand)))
}

pub async fn update_brand(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<BrandRequest>,
) -> Result<Json<Brand>> {
    let brand = match payload.name.as_deref() {
        Some(raw) => {
            let name = required_name(Some(raw))?;
            brand_queries::update_brand(&state.db, id, &name).await?
        }
        None => brand_queries::find_by_id(&state.db, id).await?,
    };

    brand
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Brand not found".to_string()))
}

pub async fn delete_brand(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<StatusCode> {
    if !brand_queries::delete_brand(&state.db, id).await? {
        return Err(AppError::NotFound("Brand not found".to_string()));
    }

    tracing::info!("Brand {} deleted", id);

    Ok(StatusCode::NO_CONTENT)
}

fn required_name(raw: Option<&str>) -> Result<String> {
    match raw.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(AppError::BadRequest("Brand name is required".to_string())),
    }
}
