use axum::{Json, extract::State};
use chrono::{Duration, Utc};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{EmailRequest, MessageResponse, TokenKind, VerifyEmailRequest},
    queries::{token_queries, user_queries},
    routes::register::{VERIFICATION_TOKEN_TTL_HOURS, normalize_email},
    utils::{extractors::AppJson, tokens},
};

pub async fn verify_email(
    State(state): State<AppState>,
    AppJson(payload): AppJson<VerifyEmailRequest>,
) -> Result<Json<MessageResponse>> {
    let token = payload
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Token is required".to_string()))?;

    let token_hash = tokens::hash_token(&token);

    let mut tx = state.db.begin().await?;

    let record = token_queries::find_by_hash_for_update(
        &mut tx,
        TokenKind::EmailVerification,
        &token_hash,
    )
    .await?
    .filter(|record| record.is_redeemable(Utc::now()))
    .ok_or_else(|| AppError::BadRequest("Invalid or expired token".to_string()))?;

    if !user_queries::mark_email_verified(&mut tx, record.user_id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    token_queries::mark_used(&mut tx, TokenKind::EmailVerification, record.id).await?;

    tx.commit().await?;

    tracing::info!("Email verified for user {}", record.user_id);

    Ok(Json(MessageResponse::new("Email verified successfully")))
}

pub async fn resend_verification(
    State(state): State<AppState>,
    AppJson(payload): AppJson<EmailRequest>,
) -> Result<Json<MessageResponse>> {
    let email = payload.email.as_deref().map(normalize_email).unwrap_or_default();
    if email.is_empty() {
        return Err(AppError::BadRequest("Email is required".to_string()));
    }

    let Some(user) = user_queries::find_by_email(&state.db, &email).await? else {
        return Ok(Json(MessageResponse::new(
            "If the account exists, a new link was sent",
        )));
    };

    if user.is_verified() {
        return Ok(Json(MessageResponse::new("Email already verified")));
    }

    let token = tokens::issue_token();
    token_queries::create_token(
        &state.db,
        TokenKind::EmailVerification,
        user.id,
        &token.hash,
        Utc::now() + Duration::hours(VERIFICATION_TOKEN_TTL_HOURS),
    )
    .await?;

    if state.environment.exposes_dev_tokens() {
        tracing::info!("Email verification token for {}: {}", user.email, token.raw);
        return Ok(Json(
            MessageResponse::new("Verification link resent").with_dev_token(Some(token.raw)),
        ));
    }

    Ok(Json(MessageResponse::new("Verification link resent")))
}
