/// HTTP route handlers, grouped by surface.
pub mod auth;
pub mod discovery;
pub mod follows;
pub mod interactions;
pub mod messages;
pub mod posts;
pub mod users;

use actix_web::{web, HttpResponse};

use crate::state::AppState;
use crate::websocket::session::ws_handler;

async fn banner() -> HttpResponse {
    HttpResponse::Ok().body("Twiller is working")
}

async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "twiller-service",
        "version": env!("CARGO_PKG_VERSION"),
        "backend": state.store.backend_name(),
    }))
}

/// Register the full route surface.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(banner))
        .route("/health", web::get().to(health))
        .route("/ws", web::get().to(ws_handler))
        // posts
        .route("/post", web::post().to(posts::create_post))
        .route("/post", web::get().to(posts::get_posts_filtered))
        .route("/posts", web::get().to(posts::get_posts))
        .route("/posts-by-email", web::get().to(posts::posts_by_email))
        // interactions
        .route("/post/like", web::post().to(interactions::like_post))
        .route("/post/reshare", web::post().to(interactions::reshare_post))
        .route("/post/comment", web::post().to(interactions::comment_post))
        // follows
        .route("/follow", web::post().to(follows::follow))
        .route("/unfollow", web::post().to(follows::unfollow))
        .route("/check-following", web::get().to(follows::check_following))
        .route("/followers-count", web::get().to(follows::followers_count))
        .route("/following-count", web::get().to(follows::following_count))
        .route("/following-users", web::get().to(follows::following_users))
        // users
        .route("/userupdate", web::patch().to(users::update_profile))
        .route("/register", web::post().to(users::register))
        .route("/loggedinuser", web::get().to(users::logged_in_user))
        .route(
            "/check-email-exists",
            web::get().to(users::check_email_exists),
        )
        .route(
            "/user-by-username/{username}",
            web::get().to(users::user_by_username),
        )
        .route("/deleteuser/{email}", web::delete().to(users::delete_user))
        .route(
            "/force-delete-account",
            web::post().to(users::force_delete_account),
        )
        .route("/suggested-users", web::get().to(users::suggested_users))
        // discovery
        .route("/search", web::get().to(discovery::search))
        .route("/notifications", web::get().to(discovery::notifications))
        .route("/trends", web::get().to(discovery::trends))
        // messages & lists
        .route("/send-message", web::post().to(messages::send_message))
        .route("/lists", web::get().to(messages::get_lists))
        .route("/lists", web::post().to(messages::create_list))
        // auth-adjacent flows
        .route(
            "/send-verification",
            web::post().to(auth::send_verification),
        )
        .route("/verify-email", web::post().to(auth::verify_email))
        .route(
            "/verification-status",
            web::get().to(auth::verification_status),
        )
        .route("/send-login-otp", web::post().to(auth::send_login_otp))
        .route("/verify-login-otp", web::post().to(auth::verify_login_otp))
        .route(
            "/password-reset-request",
            web::post().to(auth::password_reset_request),
        )
        .route(
            "/validate-reset-token",
            web::post().to(auth::validate_reset_token),
        )
        .route(
            "/password-reset-confirm",
            web::post().to(auth::password_reset_confirm),
        )
        .route("/clear-reset-limit", web::post().to(auth::clear_reset_limit))
        .route("/track-login", web::post().to(auth::track_login))
        .route("/login-history", web::get().to(auth::login_history))
        .route(
            "/check-device-access",
            web::post().to(auth::check_device_access),
        );
}
