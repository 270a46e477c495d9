/// Direct messages and user lists.
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::domain::models::{NewList, NewMessage};
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::websocket::events;

/// Store a direct message and push it to both participants' inbox topics.
pub async fn send_message(
    state: web::Data<AppState>,
    req: web::Json<NewMessage>,
) -> Result<HttpResponse> {
    if req.from.is_empty() || req.to.is_empty() || req.message.is_empty() {
        return Err(AppError::Validation(
            "From, to, and message are required".into(),
        ));
    }

    let message = state.store.create_message(req.into_inner()).await?;

    events::publish_message_event(&state.registry, &message).await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Message sent successfully",
        "messageId": message.id,
    })))
}

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub owner: Option<String>,
}

/// Lists owned by a user.
pub async fn get_lists(
    state: web::Data<AppState>,
    query: web::Query<OwnerQuery>,
) -> Result<HttpResponse> {
    let owner = query
        .owner
        .as_deref()
        .filter(|o| !o.is_empty())
        .ok_or_else(|| AppError::Validation("Owner is required".into()))?;

    let lists = state.store.lists_by_owner(owner).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "lists": lists,
    })))
}

/// Create a list.
pub async fn create_list(
    state: web::Data<AppState>,
    req: web::Json<NewList>,
) -> Result<HttpResponse> {
    if req.owner.is_empty() || req.name.is_empty() {
        return Err(AppError::Validation("Owner and name are required".into()));
    }

    let list_id = state.store.create_list(req.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "List created successfully",
        "listId": list_id,
    })))
}
