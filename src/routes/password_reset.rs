use axum::{Json, extract::State};
use chrono::{Duration, Utc};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{EmailRequest, MessageResponse, ResetPasswordRequest, TokenKind},
    queries::{token_queries, user_queries},
    routes::register::normalize_email,
    utils::{
        extractors::AppJson,
        password::{MIN_PASSWORD_LEN, hash_password_blocking},
        tokens,
    },
};

pub const RESET_TOKEN_TTL_MINUTES: i64 = 30;

const FORGOT_PASSWORD_MESSAGE: &str = "If the account exists, instructions were sent to the email";

/// Answers the same way whether or not the account exists.
pub async fn forgot_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<EmailRequest>,
) -> Result<Json<MessageResponse>> {
    let email = payload.email.as_deref().map(normalize_email).unwrap_or_default();
    if email.is_empty() {
        return Ok(Json(MessageResponse::new(FORGOT_PASSWORD_MESSAGE)));
    }

    let Some(user) = user_queries::find_by_email(&state.db, &email).await? else {
        return Ok(Json(MessageResponse::new(FORGOT_PASSWORD_MESSAGE)));
    };

    let token = tokens::issue_token();
    token_queries::create_token(
        &state.db,
        TokenKind::PasswordReset,
        user.id,
        &token.hash,
        Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES),
    )
    .await?;

    tracing::info!("Password reset requested for user {}", user.id);

    let dev_token = state
        .environment
        .exposes_dev_tokens()
        .then_some(token.raw);

    Ok(Json(
        MessageResponse::new(FORGOT_PASSWORD_MESSAGE).with_dev_token(dev_token),
    ))
}

pub async fn reset_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let (token, new_password) = match (payload.token, payload.new_password) {
        (Some(token), Some(password)) if !token.trim().is_empty() && !password.is_empty() => {
            (token, password)
        }
        _ => return Err(AppError::BadRequest("Incomplete data".to_string())),
    };

    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let password_hash = hash_password_blocking(new_password).await?;
    let token_hash = tokens::hash_token(&token);

    let mut tx = state.db.begin().await?;

    let record =
        token_queries::find_by_hash_for_update(&mut tx, TokenKind::PasswordReset, &token_hash)
            .await?
            .filter(|record| record.is_redeemable(Utc::now()))
            .ok_or_else(|| AppError::BadRequest("Invalid or expired token".to_string()))?;

    if !user_queries::update_password(&mut tx, record.user_id, &password_hash).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    token_queries::mark_used(&mut tx, TokenKind::PasswordReset, record.id).await?;

    tx.commit().await?;

    tracing::info!("Password reset for user {}", record.user_id);

    Ok(Json(MessageResponse::new("Password reset successfully")))
}
