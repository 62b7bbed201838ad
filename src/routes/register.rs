use axum::{Json, extract::State, http::StatusCode};
use chrono::{Duration, Utc};

use crate::{
    AppState,
    error::{AppError, FieldErrors, Result},
    models::{NewUser, RegisterRequest, RegisterResponse, TokenKind, UserProfile, UserRole},
    queries::{token_queries, user_queries},
    utils::{
        extractors::AppJson,
        password::{MIN_PASSWORD_LEN, hash_password_blocking},
        tokens,
    },
};

pub const VERIFICATION_TOKEN_TTL_HOURS: i64 = 24;

pub async fn register_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let registration = validate_registration(payload)?;

    if user_queries::find_by_email(&state.db, &registration.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let role = if user_queries::count_users(&state.db).await? == 0
        || state.auth.admin_emails.contains(&registration.email)
    {
        UserRole::Admin
    } else {
        UserRole::User
    };

    let password_hash = hash_password_blocking(registration.password).await?;

    let user = user_queries::create_user(
        &state.db,
        &NewUser {
            first_name: registration.first_name,
            last_name: registration.last_name,
            email: registration.email,
            password_hash,
            role,
            date_of_birth: registration.date_of_birth,
        },
    )
    .await?;

    let token = tokens::issue_token();
    token_queries::create_token(
        &state.db,
        TokenKind::EmailVerification,
        user.id,
        &token.hash,
        Utc::now() + Duration::hours(VERIFICATION_TOKEN_TTL_HOURS),
    )
    .await?;

    tracing::info!("User {} registered with role {:?}", user.id, user.role);

    let dev_verify_token = if state.environment.exposes_dev_tokens() {
        tracing::info!("Email verification token for {}: {}", user.email, token.raw);
        Some(token.raw)
    } else {
        None
    };

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: UserProfile::from(user),
            dev_verify_token,
        }),
    ))
}

#[derive(Debug)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub date_of_birth: Option<chrono::NaiveDate>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// `local@domain.tld` with no whitespace and a dot in the domain part.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return false;
    }

    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

pub fn validate_registration(payload: RegisterRequest) -> Result<Registration> {
    let mut errors = FieldErrors::new();

    let first_name = payload.first_name.as_deref().map(str::trim).unwrap_or("");
    if first_name.is_empty() {
        errors.insert("firstName", "First name is required");
    }

    let last_name = payload.last_name.as_deref().map(str::trim).unwrap_or("");
    if last_name.is_empty() {
        errors.insert("lastName", "Last name is required");
    }

    let email = payload.email.as_deref().map(normalize_email).unwrap_or_default();
    if email.is_empty() {
        errors.insert("email", "Email is required");
    } else if !is_valid_email(&email) {
        errors.insert("email", "Invalid email address");
    }

    let password = payload.password.as_deref().unwrap_or("");
    if password.is_empty() {
        errors.insert("password", "Password is required");
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.insert("password", "Password must be at least 8 characters");
    }

    let confirm_password = payload.confirm_password.as_deref().unwrap_or("");
    if confirm_password.is_empty() {
        errors.insert("confirmPassword", "Password confirmation is required");
    } else if !password.is_empty() && confirm_password != password {
        errors.insert("confirmPassword", "Passwords do not match");
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    Ok(Registration {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email,
        password: password.to_string(),
        date_of_birth: payload.date_of_birth,
    })
}
