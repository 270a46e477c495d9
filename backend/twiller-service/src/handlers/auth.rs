/// Auth-adjacent handlers: verification tokens, login OTPs, password
/// resets, login forensics and the device-access policy.
///
/// Only token issue/verify lives here; credential storage belongs to the
/// external auth provider and is out of scope.
use actix_web::{web, HttpResponse};
use chrono::{Duration, Local, Timelike, Utc};
use serde::Deserialize;

use crate::domain::models::{DeviceInfo, NewLoginRecord, VerifyOutcome};
use crate::error::{AppError, Result};
use crate::services::{device_access, tokens};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendVerificationRequest {
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Issue an email verification token and send the activation link.
pub async fn send_verification(
    state: web::Data<AppState>,
    req: web::Json<SendVerificationRequest>,
) -> Result<HttpResponse> {
    let (Some(email), Some(name)) = (req.email.as_deref(), req.name.as_deref()) else {
        return Err(AppError::Validation("Email and name are required".into()));
    };
    if email.is_empty() || name.is_empty() {
        return Err(AppError::Validation("Email and name are required".into()));
    }

    let token = tokens::generate_token();
    let expires_at = Utc::now() + Duration::hours(tokens::VERIFICATION_TOKEN_EXPIRY_HOURS);

    state
        .store
        .create_verification_token(email, &token, expires_at)
        .await?;

    state
        .email
        .send_verification_email(email, name, &token)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Verification email sent successfully!",
    })))
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub email: Option<String>,
    pub token: Option<String>,
}

/// Consume a verification token and mark the user verified.
pub async fn verify_email(
    state: web::Data<AppState>,
    req: web::Json<VerifyEmailRequest>,
) -> Result<HttpResponse> {
    let (Some(email), Some(token)) = (req.email.as_deref(), req.token.as_deref()) else {
        return Err(AppError::Validation("Email and token are required".into()));
    };

    match state.store.consume_verification_token(email, token).await? {
        VerifyOutcome::Verified => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Email verified successfully",
        }))),
        VerifyOutcome::Expired => Err(AppError::Validation(
            "Verification token has expired".into(),
        )),
        VerifyOutcome::Invalid => Err(AppError::Validation(
            "Invalid or expired verification token".into(),
        )),
    }
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

/// Report the `emailVerified` flag for a user.
pub async fn verification_status(
    state: web::Data<AppState>,
    query: web::Query<EmailQuery>,
) -> Result<HttpResponse> {
    let email = query
        .email
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("Email is required".into()))?;

    let verified = state.store.email_verified(email).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "emailVerified": verified,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    pub email: Option<String>,
    #[serde(default)]
    pub device_info: Option<DeviceInfo>,
}

/// Issue a 6-digit login OTP.
pub async fn send_login_otp(
    state: web::Data<AppState>,
    req: web::Json<SendOtpRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let email = req
        .email
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("Email is required".into()))?;

    let otp = tokens::generate_otp();
    let expires_at = Utc::now() + Duration::minutes(tokens::OTP_EXPIRY_MINUTES);
    let device_info = req
        .device_info
        .as_ref()
        .and_then(|d| serde_json::to_value(d).ok());

    state
        .store
        .create_login_otp(email, &otp, expires_at, device_info)
        .await?;

    state.email.send_otp_email(email, &otp).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "OTP sent successfully to your email",
        "expiresIn": tokens::OTP_EXPIRY_MINUTES * 60,
    })))
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: Option<String>,
    pub otp: Option<String>,
}

/// Consume a login OTP.
pub async fn verify_login_otp(
    state: web::Data<AppState>,
    req: web::Json<VerifyOtpRequest>,
) -> Result<HttpResponse> {
    let (Some(email), Some(otp)) = (req.email.as_deref(), req.otp.as_deref()) else {
        return Err(AppError::Validation("Email and OTP are required".into()));
    };

    match state.store.consume_login_otp(email, otp).await? {
        VerifyOutcome::Verified => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "OTP verified successfully",
        }))),
        VerifyOutcome::Expired => Err(AppError::Validation("OTP has expired".into())),
        VerifyOutcome::Invalid => Err(AppError::Validation("Invalid OTP".into())),
    }
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: Option<String>,
    // Accepted for frontend compatibility; never stored.
    #[allow(dead_code)]
    pub password: Option<String>,
}

/// Issue a password reset token. The response does not reveal whether the
/// email has an account.
pub async fn password_reset_request(
    state: web::Data<AppState>,
    req: web::Json<PasswordResetRequest>,
) -> Result<HttpResponse> {
    let email = req
        .email
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("Email is required".into()))?;

    let neutral_message = "If this email exists, you will receive a password reset link.";

    if state.store.find_user_by_email(email).await?.is_none() {
        return Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": neutral_message,
            "messageSent": true,
        })));
    }

    let token = tokens::generate_token();
    let token_hash = tokens::hash_token(&token);
    let expires_at = Utc::now() + Duration::hours(tokens::RESET_TOKEN_EXPIRY_HOURS);

    state
        .store
        .create_password_reset(email, &token_hash, expires_at)
        .await?;

    let message_sent = match state.email.send_password_reset_email(email, &token).await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(error = %err, "Password reset email failed");
            false
        }
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": neutral_message,
        "messageSent": message_sent,
    })))
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub token: Option<String>,
}

/// Check a reset token without consuming it.
pub async fn validate_reset_token(
    state: web::Data<AppState>,
    req: web::Json<TokenRequest>,
) -> Result<HttpResponse> {
    let token = req
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("Token is required".into()))?;

    let email = state
        .store
        .reset_token_email(&tokens::hash_token(token))
        .await?
        .ok_or_else(|| AppError::Validation("Invalid or expired reset token".into()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Token is valid",
        "email": email,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetConfirm {
    pub token: Option<String>,
    pub new_password: Option<String>,
}

/// Consume a reset token. Credential storage itself is delegated to the
/// auth provider; this endpoint closes the token lifecycle.
pub async fn password_reset_confirm(
    state: web::Data<AppState>,
    req: web::Json<PasswordResetConfirm>,
) -> Result<HttpResponse> {
    let (Some(token), Some(new_password)) = (req.token.as_deref(), req.new_password.as_deref())
    else {
        return Err(AppError::Validation(
            "Token and new password are required".into(),
        ));
    };
    if new_password.len() < 6 {
        return Err(AppError::Validation(
            "Password must be at least 6 characters long".into(),
        ));
    }

    let consumed = state
        .store
        .consume_password_reset(&tokens::hash_token(token))
        .await?;
    if !consumed {
        return Err(AppError::Validation("Invalid or expired reset token".into()));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Password has been reset successfully. You can now log in with your new password.",
    })))
}

#[derive(Debug, Deserialize)]
pub struct ClearResetRequest {
    pub email: Option<String>,
}

/// Invalidate outstanding reset tokens for an email (testing aid).
pub async fn clear_reset_limit(
    state: web::Data<AppState>,
    req: web::Json<ClearResetRequest>,
) -> Result<HttpResponse> {
    let email = req
        .email
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("Email is required".into()))?;

    state.store.clear_password_resets(email).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Rate limit cleared for testing",
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackLoginRequest {
    pub email: Option<String>,
    pub device_info: Option<DeviceInfo>,
    #[serde(default)]
    pub login_success: bool,
    pub auth_method: Option<String>,
    pub failure_reason: Option<String>,
}

/// Record a login attempt with device forensics.
pub async fn track_login(
    state: web::Data<AppState>,
    req: web::Json<TrackLoginRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let (Some(email), Some(device)) = (req.email, req.device_info) else {
        return Err(AppError::Validation(
            "Email and device info are required".into(),
        ));
    };

    let login_id = state
        .store
        .record_login(NewLoginRecord {
            email,
            device,
            login_success: req.login_success,
            auth_method: req.auth_method.unwrap_or_else(|| "password".to_string()),
            failure_reason: req.failure_reason,
        })
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Login tracked successfully",
        "loginId": login_id,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginHistoryQuery {
    pub email: Option<String>,
    pub limit: Option<i64>,
    pub success_only: Option<String>,
}

/// Login history, newest first.
pub async fn login_history(
    state: web::Data<AppState>,
    query: web::Query<LoginHistoryQuery>,
) -> Result<HttpResponse> {
    let email = query
        .email
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("Email is required".into()))?;

    let limit = query.limit.unwrap_or(10);
    let success_only = query.success_only.as_deref() == Some("true");

    let history = state.store.login_history(email, limit, success_only).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "history": history,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAccessRequest {
    pub device_info: Option<DeviceInfo>,
}

/// Evaluate the browser/time-of-day access policy for a device.
pub async fn check_device_access(
    req: web::Json<DeviceAccessRequest>,
) -> Result<HttpResponse> {
    let device = req
        .device_info
        .as_ref()
        .ok_or_else(|| AppError::Validation("Device info is required".into()))?;

    let requirements = device_access::evaluate(device, Local::now().hour());

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "authRequirements": requirements,
    })))
}
