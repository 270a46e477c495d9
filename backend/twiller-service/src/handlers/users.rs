/// User handlers - profiles, registration and account deletion.
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::domain::models::{NewUser, ProfileUpdate, RegisterOutcome};
use crate::error::{AppError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

fn required_email(query: &EmailQuery) -> Result<&str> {
    query
        .email
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("Email is required".into()))
}

/// Partial profile update with upsert semantics.
pub async fn update_profile(
    state: web::Data<AppState>,
    query: web::Query<EmailQuery>,
    req: web::Json<ProfileUpdate>,
) -> Result<HttpResponse> {
    let email = required_email(&query)?;
    let update = req.into_inner();

    if let Some(username) = &update.username {
        if username.len() < 3 {
            return Err(AppError::Validation(
                "Username must be at least 3 characters".into(),
            ));
        }
    }
    if let Some(name) = &update.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Name cannot be empty".into()));
        }
    }
    if update.is_empty() {
        return Err(AppError::Validation("No fields provided for update".into()));
    }

    tracing::info!(email, fields = ?update.updated_fields(), "Updating user profile");

    let updated_fields = state.store.update_profile(email, update).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Profile updated successfully",
        "updatedFields": updated_fields,
    })))
}

/// Create a new user after duplicate checks.
pub async fn register(
    state: web::Data<AppState>,
    req: web::Json<NewUser>,
) -> Result<HttpResponse> {
    let new_user = req.into_inner();
    if new_user.username.is_empty() || new_user.name.is_empty() || new_user.email.is_empty() {
        return Err(AppError::Validation(
            "Username, name, and email are required".into(),
        ));
    }

    let email = new_user.email.clone();
    let username = new_user.username.clone();

    match state.store.register_user(new_user).await? {
        RegisterOutcome::EmailTaken => Err(AppError::Conflict(
            "User with this email already exists".into(),
        )),
        RegisterOutcome::UsernameTaken => {
            Err(AppError::Conflict("Username is already taken".into()))
        }
        RegisterOutcome::Created(id) => {
            tracing::info!(email = %email, username = %username, "New user registered");
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "acknowledged": true,
                "message": "User registered successfully",
                "insertedId": id,
            })))
        }
    }
}

/// User lookup by email, returned as an array for the frontend's benefit.
pub async fn logged_in_user(
    state: web::Data<AppState>,
    query: web::Query<EmailQuery>,
) -> Result<HttpResponse> {
    let users = match query.email.as_deref() {
        Some(email) => state
            .store
            .find_user_by_email(email)
            .await?
            .into_iter()
            .collect(),
        None => Vec::new(),
    };
    Ok(HttpResponse::Ok().json(users))
}

/// Registration pre-check.
pub async fn check_email_exists(
    state: web::Data<AppState>,
    query: web::Query<EmailQuery>,
) -> Result<HttpResponse> {
    let email = required_email(&query)?;
    let exists = state.store.find_user_by_email(email).await?.is_some();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "exists": exists,
    })))
}

/// Profile lookup by username.
pub async fn user_by_username(
    state: web::Data<AppState>,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let user = state
        .store
        .find_user_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(HttpResponse::Ok().json(user))
}

/// Cascade-delete a user: their posts, the user document and verification
/// tokens go in one unit, with a tombstone left behind.
pub async fn delete_user(
    state: web::Data<AppState>,
    email: web::Path<String>,
) -> Result<HttpResponse> {
    tracing::info!(email = %email, "Deleting user account");

    let report = state.store.delete_account(&email).await?;

    tracing::info!(
        email = %email,
        user_deleted = report.user_deleted,
        posts_deleted = report.posts_deleted,
        "Account deletion finished"
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Account permanently deleted",
        "userDeleted": report.user_deleted,
        "postsDeleted": report.posts_deleted,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ForceDeleteRequest {
    pub email: Option<String>,
}

/// Record a force-delete tombstone so a stuck signup can be retried.
pub async fn force_delete_account(
    state: web::Data<AppState>,
    req: web::Json<ForceDeleteRequest>,
) -> Result<HttpResponse> {
    let email = req
        .email
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("Email is required".into()))?;

    state.store.record_force_delete(email).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Account marked for force deletion",
    })))
}

/// Users the requester does not follow yet.
pub async fn suggested_users(
    state: web::Data<AppState>,
    query: web::Query<EmailQuery>,
) -> Result<HttpResponse> {
    let mut exclude = Vec::new();
    if let Some(email) = query.email.as_deref().filter(|e| !e.is_empty()) {
        exclude = state.store.following_emails(email).await?;
        exclude.push(email.to_string());
    }

    let users = state.store.suggested_users(&exclude, 5).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "users": users,
    })))
}
