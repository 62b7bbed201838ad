use axum::{
    Json,
    extract::{FromRequest, Multipart, Request, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::{Map, Value};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{
        BrandSelector, FeaturedQuery, NewProduct, Page, ProductChanges, ProductPayload,
        ProductQuery, ProductView, UploadedImage, page_window, parse_price,
    },
    queries::{brand_queries, category_queries, products_queries},
    utils::extractors::{AppJson, AppPath, AppQuery},
};

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const FEATURED_DEFAULT_LIMIT: i64 = 12;

/// 1x1 transparent PNG served when a product has no image at all.
const TRANSPARENT_PNG: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mP8/x8AAusB9YVjQn0AAAAASUVORK5CYII=";

pub async fn list_products(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ProductQuery>,
) -> Result<Json<Page<ProductView>>> {
    let page = products_queries::search_products(&state.db, &params).await?;

    Ok(Json(page))
}

pub async fn featured_products(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<FeaturedQuery>,
) -> Result<Json<Vec<ProductView>>> {
    let (limit, _) = page_window(params.limit, None, FEATURED_DEFAULT_LIMIT);
    let min_ratings = params.min_ratings.unwrap_or(1).max(0);

    let products = products_queries::featured_products(&state.db, limit, min_ratings).await?;

    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<ProductView>> {
    let product = products_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(product))
}

pub async fn get_product_image(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Response> {
    let image = products_queries::find_image(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    if let Some(data) = image.image_data {
        let mime_type = image
            .image_mime_type
            .unwrap_or_else(|| "application/octet-stream".to_string());

        return Ok((
            [
                (header::CONTENT_TYPE, mime_type),
                (header::CACHE_CONTROL, "public, max-age=3600".to_string()),
            ],
            data,
        )
            .into_response());
    }

    if let Some(url) = image.image_url.filter(|url| !url.is_empty()) {
        return Ok(Redirect::to(&url).into_response());
    }

    let placeholder = STANDARD
        .decode(TRANSPARENT_PNG)
        .map_err(|e| AppError::InternalError(format!("Invalid placeholder image: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "public, max-age=600"),
        ],
        placeholder,
    )
        .into_response())
}

/// Accepts a JSON body or a multipart form with an optional `image` file.
pub async fn create_product(
    State(state): State<AppState>,
    request: Request,
) -> Result<(StatusCode, Json<ProductView>)> {
    let (payload, image) = if is_multipart(&request) {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        read_product_form(multipart).await?
    } else {
        let AppJson(payload) = AppJson::<ProductPayload>::from_request(request, &state).await?;
        (payload, None)
    };

    let mut product = validate_new_product(&payload, image)?;

    ensure_category_exists(&state, product.category_id).await?;
    product.brand_id = resolve_brand(&state, payload.brand_selector())
        .await?
        .flatten();

    let id = products_queries::create_product(&state.db, product).await?;

    tracing::info!("Product {} created", id);

    let view = products_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::InternalError(format!("Product {} vanished after insert", id)))?;

    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn update_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<ProductPayload>,
) -> Result<Json<ProductView>> {
    if !products_queries::exists(&state.db, id).await? {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    let mut changes = product_changes(&payload)?;

    if let Some(category_id) = changes.category_id {
        ensure_category_exists(&state, category_id).await?;
    }
    changes.brand_id = resolve_brand(&state, payload.brand_selector()).await?;

    if !products_queries::update_product(&state.db, id, changes).await? {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    let view = products_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(view))
}

pub async fn delete_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<StatusCode> {
    if !products_queries::delete_product(&state.db, id).await? {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    tracing::info!("Product {} deleted", id);

    Ok(StatusCode::NO_CONTENT)
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"))
}

fn bad_form(e: MultipartError) -> AppError {
    AppError::BadRequest(e.body_text())
}

async fn read_product_form(
    mut multipart: Multipart,
) -> Result<(ProductPayload, Option<UploadedImage>)> {
    let mut fields = Vec::new();
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "image" {
            let mime_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field.bytes().await.map_err(bad_form)?;

            if data.len() > MAX_IMAGE_BYTES {
                return Err(AppError::BadRequest(
                    "Image must be at most 5 MB".to_string(),
                ));
            }

            if !data.is_empty() {
                image = Some(UploadedImage {
                    data: data.to_vec(),
                    mime_type,
                });
            }
            continue;
        }

        let text = field.text().await.map_err(bad_form)?;
        fields.push((name, text));
    }

    Ok((payload_from_form(fields)?, image))
}

/// Maps multipart text fields onto the JSON payload shape.
fn payload_from_form(fields: Vec<(String, String)>) -> Result<ProductPayload> {
    let mut body = Map::new();

    for (name, text) in fields {
        let value = match name.as_str() {
            "brandId" | "categoryId" => match text.trim() {
                "" => Value::Null,
                raw => raw
                    .parse::<i32>()
                    .map(Value::from)
                    .map_err(|_| AppError::BadRequest(format!("Invalid {}", name)))?,
            },
            "characteristics" | "specifications" | "images" => {
                if text.trim().is_empty() {
                    Value::Null
                } else {
                    serde_json::from_str(&text).unwrap_or(Value::String(text))
                }
            }
            _ => Value::String(text),
        };
        body.insert(name, value);
    }

    serde_json::from_value(Value::Object(body))
        .map_err(|e| AppError::BadRequest(format!("Invalid product data: {}", e)))
}

fn trimmed(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Checks required fields before anything touches the database.
/// The brand is resolved separately.
fn validate_new_product(
    payload: &ProductPayload,
    image: Option<UploadedImage>,
) -> Result<NewProduct> {
    let (Some(name), Some(sku), Some(price)) = (
        trimmed(payload.name.as_deref()),
        trimmed(payload.sku.as_deref()),
        payload.price.as_ref().filter(|p| !p.is_null()),
    ) else {
        return Err(AppError::BadRequest(
            "Incomplete product data".to_string(),
        ));
    };

    let price = parse_price(price)?;

    let category_id = payload
        .category_id
        .flatten()
        .ok_or_else(|| AppError::BadRequest("Category is required".to_string()))?;

    let images = payload.image_list();

    let image_url = if image.is_some() {
        None
    } else {
        payload
            .image_url
            .clone()
            .flatten()
            .or_else(|| images.as_ref().and_then(|list| list.first().cloned()))
    };

    Ok(NewProduct {
        name,
        sku,
        price,
        description: payload.description.clone().flatten(),
        characteristics: payload.characteristics.clone().flatten(),
        specifications: payload.specifications.clone().flatten(),
        image_url,
        image,
        images,
        brand_id: None,
        category_id,
    })
}

fn product_changes(payload: &ProductPayload) -> Result<ProductChanges> {
    let name = match payload.name.as_deref() {
        Some(raw) => Some(
            trimmed(Some(raw))
                .ok_or_else(|| AppError::BadRequest("Name cannot be empty".to_string()))?,
        ),
        None => None,
    };

    let sku = match payload.sku.as_deref() {
        Some(raw) => Some(
            trimmed(Some(raw))
                .ok_or_else(|| AppError::BadRequest("SKU cannot be empty".to_string()))?,
        ),
        None => None,
    };

    let price = payload.price.as_ref().map(parse_price).transpose()?;

    Ok(ProductChanges {
        name,
        sku,
        price,
        description: payload.description.clone(),
        characteristics: payload.characteristics.clone(),
        specifications: payload.specifications.clone(),
        image_url: payload.image_url.clone(),
        images: payload.image_list(),
        brand_id: None,
        category_id: payload.category_id.flatten(),
    })
}

async fn ensure_category_exists(state: &AppState, category_id: i32) -> Result<()> {
    match category_queries::find_by_id(&state.db, category_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::BadRequest("Category not found".to_string())),
    }
}

/// `None` keeps the current brand; `Some(None)` clears it.
async fn resolve_brand(state: &AppState, selector: BrandSelector) -> Result<Option<Option<i32>>> {
    match selector {
        BrandSelector::Keep => Ok(None),
        BrandSelector::Clear => Ok(Some(None)),
        BrandSelector::Id(id) => match brand_queries::find_by_id(&state.db, id).await? {
            Some(brand) => Ok(Some(Some(brand.id))),
            None => Err(AppError::BadRequest("Brand not found".to_string())),
        },
        BrandSelector::Name(name) => {
            let brand = brand_queries::find_or_create(&state.db, &name).await?;
            Ok(Some(Some(brand.id)))
        }
    }
}
