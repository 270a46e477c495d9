/// Discovery handlers - search plus the notification/trend placeholders.
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Substring search over posts and users, merged into one result list.
pub async fn search(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse> {
    let Some(q) = query.q.as_deref().filter(|q| !q.is_empty()) else {
        return Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "results": [],
        })));
    };

    let posts = state.store.search_posts(q, 10).await?;
    let users = state.store.search_users(q, 5).await?;

    let mut results: Vec<Value> = Vec::with_capacity(posts.len() + users.len());
    for post in posts {
        let content = post.post.clone();
        let mut value = serde_json::to_value(&post)?;
        if let Some(object) = value.as_object_mut() {
            object.insert("type".into(), json!("post"));
            object.insert("content".into(), json!(content));
            object.insert("resultType".into(), json!("Tweet"));
        }
        results.push(value);
    }
    for user in users {
        let content = format!(
            "{} (@{})",
            user.name.as_deref().unwrap_or(""),
            user.username.as_deref().unwrap_or("")
        );
        let mut value = serde_json::to_value(&user)?;
        if let Some(object) = value.as_object_mut() {
            object.insert("type".into(), json!("user"));
            object.insert("content".into(), json!(content));
            object.insert("resultType".into(), json!("User"));
        }
        results.push(value);
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "results": results,
    })))
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

/// Notifications placeholder; there is no notification pipeline.
pub async fn notifications(query: web::Query<EmailQuery>) -> Result<HttpResponse> {
    if query.email.as_deref().filter(|e| !e.is_empty()).is_none() {
        return Err(AppError::Validation("Email is required".into()));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "notifications": [],
    })))
}

/// Trending topics placeholder; there is no trend analysis.
pub async fn trends() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "trends": [],
    })))
}
