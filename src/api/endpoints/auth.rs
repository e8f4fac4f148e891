//! Registration, login and password-reset endpoints. All unauthenticated.
//!
//! Password hashing runs through `ApiContext::run_blocking` so PBKDF2 never
//! stalls the async workers.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::account::{
    self, ForgotPasswordInput, LoginInput, RegisterInput, ResetPasswordInput,
};
use crate::api::error::ApiError;
use crate::api::extract::ApiJson;
use crate::api::types::ApiContext;
use crate::models::AccountSummary;

#[derive(Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: &'static str,
    pub account_id: Uuid,
}

/// `POST /api/auth/register`
pub async fn register(
    State(ctx): State<ApiContext>,
    ApiJson(input): ApiJson<RegisterInput>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let account = ctx
        .run_blocking(move |core| {
            let conn = core.open_db()?;
            Ok(account::register(&conn, input, core.config.password_rounds)?)
        })
        .await?;

    Ok(Json(RegisterResponse {
        success: true,
        message: "Registration successful",
        account_id: account.id,
    }))
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub account: AccountSummary,
}

/// `POST /api/auth/login`
pub async fn login(
    State(ctx): State<ApiContext>,
    ApiJson(input): ApiJson<LoginInput>,
) -> Result<Json<LoginResponse>, ApiError> {
    let outcome = ctx
        .run_blocking(move |core| {
            let conn = core.open_db()?;
            Ok(account::login(&conn, core.tokens(), input, core.config.password_rounds)?)
        })
        .await?;

    Ok(Json(LoginResponse {
        success: true,
        token: outcome.token,
        account: outcome.account,
    }))
}

#[derive(Serialize)]
pub struct ForgotPasswordResponse {
    pub success: bool,
    pub message: &'static str,
    pub token: String,
    pub expires_at: String,
}

/// `POST /api/auth/forgot-password` — the reset token is returned directly;
/// there is no mail delivery.
pub async fn forgot_password(
    State(ctx): State<ApiContext>,
    ApiJson(input): ApiJson<ForgotPasswordInput>,
) -> Result<Json<ForgotPasswordResponse>, ApiError> {
    let conn = ctx.core.open_db()?;
    let ticket = account::forgot_password(&conn, input)?;

    Ok(Json(ForgotPasswordResponse {
        success: true,
        message: "Password reset token issued",
        token: ticket.token,
        expires_at: ticket.expires_at.to_rfc3339(),
    }))
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

/// `POST /api/auth/reset-password`
pub async fn reset_password(
    State(ctx): State<ApiContext>,
    ApiJson(input): ApiJson<ResetPasswordInput>,
) -> Result<Json<MessageResponse>, ApiError> {
    ctx.run_blocking(move |core| {
        let conn = core.open_db()?;
        Ok(account::reset_password(&conn, input, core.config.password_rounds)?)
    })
    .await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Password has been reset",
    }))
}
