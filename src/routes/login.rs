use axum::{Extension, Json, extract::State};

use crate::{
    AppState,
    error::{AppError, FieldErrors, Result},
    models::{AuthResponse, LoginRequest, UserProfile},
    queries::user_queries,
    routes::register::normalize_email,
    utils::{
        extractors::{AppJson, extract_user_id},
        jwt,
        password::verify_password_blocking,
    },
};

pub async fn login_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let (email, password) = validate_login(&payload)?;

    let user = user_queries::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    let is_valid = verify_password_blocking(password, user.password_hash.clone()).await?;

    if !is_valid {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    if !user.is_verified() {
        return Err(AppError::Forbidden(
            "Confirm your email address to sign in".to_string(),
        ));
    }

    let token = jwt::generate_token(&state.auth, user.id, &user.email, user.role)?;

    Ok(Json(AuthResponse {
        token,
        user: UserProfile::from(user),
    }))
}

pub async fn current_user(
    State(state): State<AppState>,
    Extension(claims): Extension<jwt::Claims>,
) -> Result<Json<UserProfile>> {
    let user_id = extract_user_id(&claims)?;

    let user = user_queries::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserProfile::from(user)))
}

fn validate_login(payload: &LoginRequest) -> Result<(String, String)> {
    let mut errors = FieldErrors::new();

    let email = payload.email.as_deref().map(normalize_email).unwrap_or_default();
    if email.is_empty() {
        errors.insert("email", "Email is required");
    }

    let password = payload.password.clone().unwrap_or_default();
    if password.is_empty() {
        errors.insert("password", "Password is required");
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    Ok((email, password))
}
