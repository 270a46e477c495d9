/// Follow handlers - edge mutations and edge-derived reads.
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::domain::models::{FollowOutcome, NewFollow};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Create a follow edge. Idempotent: following twice is a counter no-op.
pub async fn follow(
    state: web::Data<AppState>,
    req: web::Json<NewFollow>,
) -> Result<HttpResponse> {
    if req.follower_email.is_empty() || req.following_email.is_empty() {
        return Err(AppError::Validation(
            "Follower and following emails are required".into(),
        ));
    }

    match state.store.create_follow(req.into_inner()).await? {
        FollowOutcome::AlreadyFollowing => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Already following this user",
            "alreadyFollowing": true,
        }))),
        FollowOutcome::Created => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Successfully followed user",
        }))),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowPair {
    pub follower_email: String,
    pub following_email: String,
}

/// Delete a follow edge and roll both counters back.
pub async fn unfollow(
    state: web::Data<AppState>,
    req: web::Json<FollowPair>,
) -> Result<HttpResponse> {
    if req.follower_email.is_empty() || req.following_email.is_empty() {
        return Err(AppError::Validation(
            "Follower and following emails are required".into(),
        ));
    }

    let deleted = state
        .store
        .delete_follow(&req.follower_email, &req.following_email)
        .await?;

    if !deleted {
        return Err(AppError::NotFound("Follow relationship not found".into()));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Successfully unfollowed user",
    })))
}

/// Edge existence check.
pub async fn check_following(
    state: web::Data<AppState>,
    query: web::Query<FollowPair>,
) -> Result<HttpResponse> {
    let following = state
        .store
        .is_following(&query.follower_email, &query.following_email)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "following": following,
    })))
}

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

/// Follower count derived from the edge table.
pub async fn followers_count(
    state: web::Data<AppState>,
    query: web::Query<EmailQuery>,
) -> Result<HttpResponse> {
    let email = required_email(&query)?;
    let count = state.store.followers_count(email).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": count,
    })))
}

/// Following count derived from the edge table.
pub async fn following_count(
    state: web::Data<AppState>,
    query: web::Query<EmailQuery>,
) -> Result<HttpResponse> {
    let email = required_email(&query)?;
    let count = state.store.following_count(email).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "count": count,
    })))
}

/// Full user documents for everyone the given user follows.
pub async fn following_users(
    state: web::Data<AppState>,
    query: web::Query<EmailQuery>,
) -> Result<HttpResponse> {
    let email = required_email(&query)?;
    let users = state.store.following_users(email).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "users": users,
    })))
}
