/// Post handlers - creation and feed reads.
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::domain::models::NewPost;
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::websocket::events::{self, NEW_TWEET};

/// Create a new post and announce it on the feed.
pub async fn create_post(
    state: web::Data<AppState>,
    req: web::Json<NewPost>,
) -> Result<HttpResponse> {
    let post = state.store.create_post(req.into_inner()).await?;

    events::publish_post_event(&state.registry, NEW_TWEET, &post).await;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": "Tweet posted successfully",
        "tweetId": post.id,
    })))
}

/// All posts, newest first.
pub async fn get_posts(state: web::Data<AppState>) -> Result<HttpResponse> {
    let posts = state.store.list_posts().await?;
    Ok(HttpResponse::Ok().json(posts))
}

#[derive(Debug, Deserialize)]
pub struct AuthorQuery {
    pub email: Option<String>,
}

/// Posts, optionally filtered to one author.
pub async fn get_posts_filtered(
    state: web::Data<AppState>,
    query: web::Query<AuthorQuery>,
) -> Result<HttpResponse> {
    let posts = match query.email.as_deref() {
        Some(email) => state.store.posts_by_email(email).await?,
        None => state.store.list_posts().await?,
    };
    Ok(HttpResponse::Ok().json(posts))
}

/// Posts by one author; the email is required here.
pub async fn posts_by_email(
    state: web::Data<AppState>,
    query: web::Query<AuthorQuery>,
) -> Result<HttpResponse> {
    let email = query
        .email
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("Email is required".into()))?;

    let posts = state.store.posts_by_email(email).await?;
    Ok(HttpResponse::Ok().json(posts))
}
