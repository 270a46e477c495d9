/// Twiller Service Library
///
/// Backend of the Twiller social application: REST endpoints for posts,
/// likes/reshares/comments, follows, user profiles and auth-adjacent token
/// flows, plus topic-scoped real-time updates over WebSocket.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route registration
/// - `domain`: Data structures for posts, users, follows and token records
/// - `repository`: Storage interface with PostgreSQL and in-memory backends
/// - `services`: Email, token material, device-access policy
/// - `websocket`: Broadcast registry, session actor and event publishing
/// - `error`: Error types and HTTP mapping
/// - `config`: Configuration management
pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod repository;
pub mod services;
pub mod state;
pub mod websocket;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
