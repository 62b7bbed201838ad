use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{DEFAULT_PAGE_SIZE, Page, PageQuery, ProductRating, RatingRequest, page_window},
    queries::{products_queries, rating_queries},
    utils::{
        extractors::{AppJson, AppPath, AppQuery, extract_user_id},
        jwt::Claims,
    },
};

pub async fn list_ratings(
    State(state): State<AppState>,
    AppPath(product_id): AppPath<i32>,
    AppQuery(params): AppQuery<PageQuery>,
) -> Result<Json<Page<ProductRating>>> {
    let (limit, offset) = page_window(params.limit, params.offset, DEFAULT_PAGE_SIZE);

    let page = rating_queries::list_for_product(&state.db, product_id, limit, offset).await?;

    Ok(Json(page))
}

/// One rating per user and product: a second submission updates the first.
pub async fn upsert_rating(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(product_id): AppPath<i32>,
    AppJson(payload): AppJson<RatingRequest>,
) -> Result<(StatusCode, Json<ProductRating>)> {
    let user_id = extract_user_id(&claims)?;

    let score = payload
        .score()
        .ok_or_else(|| AppError::BadRequest("Rating must be between 1 and 5".to_string()))?;

    if !products_queries::exists(&state.db, product_id).await? {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    let comment = payload.comment_change();

    match rating_queries::find_for_user(&state.db, product_id, user_id).await? {
        Some(existing) => {
            let updated =
                rating_queries::update_rating(&state.db, existing.id, score, comment).await?;

            Ok((StatusCode::OK, Json(updated)))
        }
        None => {
            let created = rating_queries::create_rating(
                &state.db,
                product_id,
                user_id,
                score,
                comment.flatten(),
            )
            .await?;

            tracing::info!("User {} rated product {}", user_id, product_id);

            Ok((StatusCode::CREATED, Json(created)))
        }
    }
}
