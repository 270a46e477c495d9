/// Interaction handlers - like/reshare toggles and comment appends.
///
/// Each mutation is one atomic repository call; the response and the
/// broadcast both carry the freshly re-read post document.
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::models::NewComment;
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::websocket::events::{self, POST_COMMENTED, POST_LIKED, POST_RESHARED};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRequest {
    pub post_id: Uuid,
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// Toggle like membership for the requesting user.
pub async fn like_post(
    state: web::Data<AppState>,
    req: web::Json<ToggleRequest>,
) -> Result<HttpResponse> {
    if req.user_id.is_empty() {
        return Err(AppError::Validation("Missing required fields".into()));
    }

    let outcome = state
        .store
        .toggle_like(
            req.post_id,
            &req.user_id,
            req.username.as_deref().unwrap_or(""),
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".into()))?;

    events::publish_post_event(&state.registry, POST_LIKED, &outcome.post).await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "liked": outcome.engaged,
        "post": outcome.post,
    })))
}

/// Toggle reshare membership for the requesting user.
pub async fn reshare_post(
    state: web::Data<AppState>,
    req: web::Json<ToggleRequest>,
) -> Result<HttpResponse> {
    if req.user_id.is_empty() {
        return Err(AppError::Validation("Missing required fields".into()));
    }

    let outcome = state
        .store
        .toggle_reshare(
            req.post_id,
            &req.user_id,
            req.username.as_deref().unwrap_or(""),
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".into()))?;

    events::publish_post_event(&state.registry, POST_RESHARED, &outcome.post).await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "reshared": outcome.engaged,
        "post": outcome.post,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub post_id: Uuid,
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    pub comment: Option<String>,
    #[serde(default)]
    pub commenter_name: Option<String>,
}

/// Append a comment to a post.
pub async fn comment_post(
    state: web::Data<AppState>,
    req: web::Json<CommentRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();

    let comment = req
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let (Some(comment), false) = (comment, req.user_id.is_empty()) else {
        return Err(AppError::Validation("Missing required fields".into()));
    };

    let outcome = state
        .store
        .add_comment(
            req.post_id,
            NewComment {
                user_id: req.user_id,
                username: req.username.unwrap_or_default(),
                comment: comment.to_string(),
                commenter_name: req.commenter_name.unwrap_or_default(),
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".into()))?;

    events::publish_post_event(&state.registry, POST_COMMENTED, &outcome.post).await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "comment": outcome.comment,
        "post": outcome.post,
    })))
}
