use std::sync::Arc;

use crate::repository::Repository;
use crate::services::EmailService;
use crate::websocket::BroadcastRegistry;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Active storage backend (PostgreSQL, or in-memory after a failed
    /// database connection at startup). Handlers cannot tell which.
    pub store: Arc<dyn Repository>,
    /// Topic-scoped WebSocket fan-out.
    pub registry: BroadcastRegistry,
    /// Outbound mail (no-op without SMTP configuration).
    pub email: EmailService,
}
