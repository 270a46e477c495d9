//! End-to-end HTTP tests over the in-memory backend.
//!
//! Both backends satisfy the same repository contract, so these exercise
//! the real handlers, routing, validation and response envelopes without a
//! database.

use std::sync::Arc;

use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};

use twiller_service::config::{EmailConfig, FrontendConfig};
use twiller_service::handlers;
use twiller_service::repository::MemoryRepository;
use twiller_service::services::EmailService;
use twiller_service::state::AppState;
use twiller_service::websocket::BroadcastRegistry;

fn test_state() -> AppState {
    let email = EmailService::new(
        &EmailConfig {
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            smtp_from: "Twiller <no-reply@twiller.local>".to_string(),
            use_starttls: true,
        },
        &FrontendConfig {
            base_url: "http://localhost:3000".to_string(),
        },
    )
    .expect("email service builds in no-op mode");

    AppState {
        store: Arc::new(MemoryRepository::new()),
        registry: BroadcastRegistry::new(),
        email,
    }
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .configure(handlers::configure),
        )
        .await
    };
}

macro_rules! post_json {
    ($app:expr, $path:expr, $body:expr $(,)?) => {{
        let req = test::TestRequest::post()
            .uri($path)
            .set_json($body)
            .to_request();
        let body: Value = test::call_and_read_body_json(&$app, req).await;
        body
    }};
}

macro_rules! get_json {
    ($app:expr, $path:expr $(,)?) => {{
        let req = test::TestRequest::get().uri($path).to_request();
        let body: Value = test::call_and_read_body_json(&$app, req).await;
        body
    }};
}

#[actix_web::test]
async fn create_post_and_list() {
    let state = test_state();
    let app = init_app!(state);

    let body = post_json!(
        &app,
        "/post",
        json!({
            "post": "hello world",
            "email": "a@x.com",
            "username": "alice",
            "name": "Alice",
        }),
    );
    assert_eq!(body["success"], json!(true));
    assert!(body["tweetId"].is_string());

    let posts = get_json!(&app, "/posts");
    let posts = posts.as_array().expect("array of posts");
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["post"], json!("hello world"));
    assert_eq!(posts[0]["likes"], json!(0));
    assert_eq!(posts[0]["likedBy"], json!([]));
    assert_eq!(posts[0]["commentList"], json!([]));
}

#[actix_web::test]
async fn like_toggle_roundtrip_over_http() {
    let state = test_state();
    let app = init_app!(state);

    let created = post_json!(
        &app,
        "/post",
        json!({"post": "like me", "email": "a@x.com"}),
    );
    let post_id = created["tweetId"].as_str().expect("tweet id").to_string();

    let body = post_json!(
        &app,
        "/post/like",
        json!({"postId": post_id, "userId": "u@x.com", "username": "u"}),
    );
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["liked"], json!(true));
    assert_eq!(body["post"]["likes"], json!(1));
    assert_eq!(body["post"]["likedBy"], json!(["u@x.com"]));

    let body = post_json!(
        &app,
        "/post/like",
        json!({"postId": post_id, "userId": "u@x.com", "username": "u"}),
    );
    assert_eq!(body["liked"], json!(false));
    assert_eq!(body["post"]["likes"], json!(0));
    assert_eq!(body["post"]["likedBy"], json!([]));
}

#[actix_web::test]
async fn like_on_missing_post_is_404() {
    let state = test_state();
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/post/like")
        .set_json(json!({
            "postId": uuid::Uuid::new_v4(),
            "userId": "u@x.com",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(false));
}

#[actix_web::test]
async fn comment_validates_and_appends() {
    let state = test_state();
    let app = init_app!(state);

    let created = post_json!(
        &app,
        "/post",
        json!({"post": "discuss", "email": "a@x.com"}),
    );
    let post_id = created["tweetId"].as_str().expect("tweet id").to_string();

    // Whitespace-only comment is rejected.
    let req = test::TestRequest::post()
        .uri("/post/comment")
        .set_json(json!({
            "postId": post_id,
            "userId": "u@x.com",
            "comment": "   ",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body = post_json!(
        &app,
        "/post/comment",
        json!({
            "postId": post_id,
            "userId": "u@x.com",
            "username": "u",
            "comment": "  nice post  ",
            "commenterName": "U",
        }),
    );
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["comment"]["comment"], json!("nice post"));
    assert_eq!(body["post"]["comments"], json!(1));
    assert_eq!(
        body["post"]["commentList"].as_array().map(Vec::len),
        Some(1)
    );
}

#[actix_web::test]
async fn follow_unfollow_roundtrip() {
    let state = test_state();
    let app = init_app!(state);

    for (email, username) in [("a@x.com", "alice"), ("b@x.com", "bob")] {
        post_json!(
            &app,
            "/register",
            json!({"email": email, "username": username, "name": username}),
        );
    }

    let body = post_json!(
        &app,
        "/follow",
        json!({"followerEmail": "a@x.com", "followingEmail": "b@x.com"}),
    );
    assert_eq!(body["success"], json!(true));

    let body = post_json!(
        &app,
        "/follow",
        json!({"followerEmail": "a@x.com", "followingEmail": "b@x.com"}),
    );
    assert_eq!(body["alreadyFollowing"], json!(true));

    let body = get_json!(
        &app,
        "/check-following?followerEmail=a@x.com&followingEmail=b@x.com",
    );
    assert_eq!(body["following"], json!(true));

    let body = get_json!(&app, "/followers-count?email=b@x.com");
    assert_eq!(body["count"], json!(1));

    // The duplicate follow did not inflate the denormalized counter.
    let users = get_json!(&app, "/loggedinuser?email=b@x.com");
    assert_eq!(users[0]["followers"], json!(1));

    let body = post_json!(
        &app,
        "/unfollow",
        json!({"followerEmail": "a@x.com", "followingEmail": "b@x.com"}),
    );
    assert_eq!(body["success"], json!(true));

    let body = get_json!(&app, "/followers-count?email=b@x.com");
    assert_eq!(body["count"], json!(0));
    let users = get_json!(&app, "/loggedinuser?email=b@x.com");
    assert_eq!(users[0]["followers"], json!(0));

    let req = test::TestRequest::post()
        .uri("/unfollow")
        .set_json(json!({"followerEmail": "a@x.com", "followingEmail": "b@x.com"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn deleting_a_user_removes_their_posts_and_document() {
    let state = test_state();
    let app = init_app!(state);

    post_json!(
        &app,
        "/register",
        json!({"email": "a@x.com", "username": "alice", "name": "Alice"}),
    );
    for i in 0..3 {
        post_json!(
            &app,
            "/post",
            json!({"post": format!("post {i}"), "email": "a@x.com"}),
        );
    }

    let req = test::TestRequest::delete()
        .uri("/deleteuser/a@x.com")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["userDeleted"], json!(true));
    assert_eq!(body["postsDeleted"], json!(3));

    let posts = get_json!(&app, "/posts-by-email?email=a@x.com");
    assert_eq!(posts, json!([]));

    let users = get_json!(&app, "/loggedinuser?email=a@x.com");
    assert_eq!(users, json!([]));
}

#[actix_web::test]
async fn register_rejects_duplicates() {
    let state = test_state();
    let app = init_app!(state);

    let body = post_json!(
        &app,
        "/register",
        json!({"email": "a@x.com", "username": "alice", "name": "Alice"}),
    );
    assert_eq!(body["success"], json!(true));
    assert!(body["insertedId"].is_string());

    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({"email": "a@x.com", "username": "other", "name": "Other"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({"email": "b@x.com", "username": "alice", "name": "Alice Two"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn profile_update_upserts_and_validates() {
    let state = test_state();
    let app = init_app!(state);

    // Upsert path: no prior /register call.
    let req = test::TestRequest::patch()
        .uri("/userupdate?email=new@x.com")
        .set_json(json!({"bio": "hello", "location": "earth"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["updatedFields"], json!(["bio", "location"]));

    let users = get_json!(&app, "/loggedinuser?email=new@x.com");
    assert_eq!(users[0]["bio"], json!("hello"));
    assert_eq!(users[0]["location"], json!("earth"));

    // Short username is rejected.
    let req = test::TestRequest::patch()
        .uri("/userupdate?email=new@x.com")
        .set_json(json!({"username": "ab"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Empty update is rejected.
    let req = test::TestRequest::patch()
        .uri("/userupdate?email=new@x.com")
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Missing email query is rejected.
    let req = test::TestRequest::patch()
        .uri("/userupdate")
        .set_json(json!({"bio": "x"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn device_access_policy_over_http() {
    let state = test_state();
    let app = init_app!(state);

    let body = post_json!(
        &app,
        "/check-device-access",
        json!({"deviceInfo": {"browser": "Chrome", "deviceType": "Desktop"}}),
    );
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["authRequirements"]["requiresOtp"], json!(true));
    assert_eq!(body["authRequirements"]["allowAccess"], json!(true));

    let body = post_json!(
        &app,
        "/check-device-access",
        json!({"deviceInfo": {"browser": "Edge", "deviceType": "Desktop"}}),
    );
    assert_eq!(body["authRequirements"]["requiresOtp"], json!(false));

    let req = test::TestRequest::post()
        .uri("/check-device-access")
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn verification_flow_over_http() {
    let state = test_state();
    let app = init_app!(state);

    post_json!(
        &app,
        "/register",
        json!({"email": "a@x.com", "username": "alice", "name": "Alice"}),
    );

    let body = get_json!(&app, "/verification-status?email=a@x.com");
    assert_eq!(body["emailVerified"], json!(false));

    // SMTP is unconfigured, so issuing still succeeds in no-op mode.
    let body = post_json!(
        &app,
        "/send-verification",
        json!({"email": "a@x.com", "name": "Alice"}),
    );
    assert_eq!(body["success"], json!(true));

    // A token the server never issued is rejected.
    let req = test::TestRequest::post()
        .uri("/verify-email")
        .set_json(json!({"email": "a@x.com", "token": "bogus"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn login_tracking_and_history() {
    let state = test_state();
    let app = init_app!(state);

    let body = post_json!(
        &app,
        "/track-login",
        json!({
            "email": "a@x.com",
            "deviceInfo": {"browser": "Firefox", "os": "Linux", "deviceType": "Desktop"},
            "loginSuccess": true,
            "authMethod": "password",
        }),
    );
    assert_eq!(body["success"], json!(true));
    assert!(body["loginId"].is_string());

    post_json!(
        &app,
        "/track-login",
        json!({
            "email": "a@x.com",
            "deviceInfo": {"browser": "Chrome"},
            "loginSuccess": false,
            "failureReason": "bad otp",
        }),
    );

    let body = get_json!(&app, "/login-history?email=a@x.com");
    assert_eq!(body["history"].as_array().map(Vec::len), Some(2));

    let body = get_json!(&app, "/login-history?email=a@x.com&successOnly=true");
    let history = body["history"].as_array().expect("history array");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["loginSuccess"], json!(true));
}

#[actix_web::test]
async fn search_mixes_posts_and_users() {
    let state = test_state();
    let app = init_app!(state);

    post_json!(
        &app,
        "/register",
        json!({"email": "rustacean@x.com", "username": "rustacean", "name": "Rust Acean"}),
    );
    post_json!(
        &app,
        "/post",
        json!({"post": "rust is great", "email": "a@x.com"}),
    );

    let body = get_json!(&app, "/search?q=rust");
    let results = body["results"].as_array().expect("results array");
    assert!(results.iter().any(|r| r["resultType"] == json!("Tweet")));
    assert!(results.iter().any(|r| r["resultType"] == json!("User")));

    let body = get_json!(&app, "/search");
    assert_eq!(body["results"], json!([]));
}

#[actix_web::test]
async fn messages_and_lists() {
    let state = test_state();
    let app = init_app!(state);

    let body = post_json!(
        &app,
        "/send-message",
        json!({"from": "a@x.com", "to": "b@x.com", "message": "hi"}),
    );
    assert_eq!(body["success"], json!(true));
    assert!(body["messageId"].is_string());

    let body = post_json!(
        &app,
        "/lists",
        json!({"owner": "a@x.com", "name": "rustaceans"}),
    );
    assert_eq!(body["success"], json!(true));

    let body = get_json!(&app, "/lists?owner=a@x.com");
    let lists = body["lists"].as_array().expect("lists array");
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0]["name"], json!("rustaceans"));
}

#[actix_web::test]
async fn password_reset_flow_over_http() {
    let state = test_state();
    let app = init_app!(state);

    // Unknown email: neutral success, no account enumeration.
    let body = post_json!(
        &app,
        "/password-reset-request",
        json!({"email": "ghost@x.com"}),
    );
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["messageSent"], json!(true));

    post_json!(
        &app,
        "/register",
        json!({"email": "a@x.com", "username": "alice", "name": "Alice"}),
    );
    let body = post_json!(&app, "/password-reset-request", json!({"email": "a@x.com"}));
    assert_eq!(body["success"], json!(true));

    // A token the server never issued does not validate.
    let req = test::TestRequest::post()
        .uri("/validate-reset-token")
        .set_json(json!({"token": "bogus"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Short replacement passwords are rejected up front.
    let req = test::TestRequest::post()
        .uri("/password-reset-confirm")
        .set_json(json!({"token": "bogus", "newPassword": "123"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body = post_json!(&app, "/clear-reset-limit", json!({"email": "a@x.com"}));
    assert_eq!(body["success"], json!(true));
}

#[actix_web::test]
async fn health_reports_backend() {
    let state = test_state();
    let app = init_app!(state);

    let body = get_json!(&app, "/health");
    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["backend"], json!("memory"));

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
