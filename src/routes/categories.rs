use axum::{
    Json,
    extract::State,
    http::StatusCode,
};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{
        Category, CategoryChanges, CategoryDetail, CategoryQuery, CategoryTree,
        CreateCategoryRequest, UpdateCategoryRequest, normalize_slug,
    },
    queries::category_queries,
    utils::extractors::{AppJson, AppPath, AppQuery},
};

pub async fn list_categories(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CategoryQuery>,
) -> Result<Json<Vec<Category>>> {
    let parent = query
        .parent_filter()
        .ok_or_else(|| AppError::BadRequest("Invalid parentId".to_string()))?;

    let name_like = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());

    let categories = category_queries::list(&state.db, parent, name_like).await?;

    Ok(Json(categories))
}

pub async fn get_category_tree(State(state): State<AppState>) -> Result<Json<CategoryTree>> {
    let tree = category_queries::get_category_tree(&state.db).await?;

    Ok(Json(tree))
}

pub async fn get_category(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<CategoryDetail>> {
    let category = category_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    let children = category_queries::get_children(&state.db, id).await?;

    Ok(Json(CategoryDetail { category, children }))
}

pub async fn create_category(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>)> {
    let name = payload.name.as_deref().map(str::trim).unwrap_or("");
    let slug = payload.slug.as_deref().map(normalize_slug).unwrap_or_default();

    if name.is_empty() || slug.is_empty() {
        return Err(AppError::BadRequest(
            "Name and slug are required".to_string(),
        ));
    }

    if let Some(parent_id) = payload.parent_id {
        ensure_parent_exists(&state, parent_id).await?;
    }

    if category_queries::find_by_slug(&state.db, &slug).await?.is_some() {
        return Err(AppError::Conflict("Slug already in use".to_string()));
    }

    let category = category_queries::create_category(
        &state.db,
        name,
        &slug,
        payload.parent_id,
        payload.order,
    )
    .await?;

    tracing::info!("Category {} created", category.id);

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateCategoryRequest>,
) -> Result<Json<Category>> {
    let changes = category_changes(payload)?;

    let current = category_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    if let Some(Some(parent_id)) = changes.parent_id {
        ensure_parent_exists(&state, parent_id).await?;

        if category_queries::is_self_or_ancestor(&state.db, id, parent_id).await? {
            return Err(AppError::BadRequest(
                "A category cannot be moved under itself or its descendants".to_string(),
            ));
        }
    }

    if let Some(slug) = changes.slug.as_deref() {
        if slug != current.slug && category_queries::find_by_slug(&state.db, slug).await?.is_some()
        {
            return Err(AppError::Conflict("Slug already in use".to_string()));
        }
    }

    let category = category_queries::update_category(&state.db, id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    Ok(Json(category))
}

pub async fn delete_category(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<StatusCode> {
    if category_queries::find_by_id(&state.db, id).await?.is_none() {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    if category_queries::count_products(&state.db, id).await? > 0 {
        return Err(AppError::Conflict(
            "Category still has products".to_string(),
        ));
    }

    category_queries::delete_category(&state.db, id).await?;

    tracing::info!("Category {} deleted", id);

    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_parent_exists(state: &AppState, parent_id: i32) -> Result<()> {
    match category_queries::find_by_id(&state.db, parent_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::BadRequest("Parent category not found".to_string())),
    }
}

/// Trims and validates the fields present in an update body.
fn category_changes(payload: UpdateCategoryRequest) -> Result<CategoryChanges> {
    let name = match payload.name.as_deref().map(str::trim) {
        Some("") => return Err(AppError::BadRequest("Name cannot be empty".to_string())),
        Some(name) => Some(name.to_string()),
        None => None,
    };

    let slug = match payload.slug.as_deref().map(normalize_slug) {
        Some(slug) if slug.is_empty() => {
            return Err(AppError::BadRequest("Slug cannot be empty".to_string()));
        }
        other => other,
    };

    Ok(CategoryChanges {
        name,
        slug,
        parent_id: payload.parent_id,
        sort_order: payload.order,
    })
}
