//! Fan-out tests: every post mutation publishes exactly one event per topic
//! with the full, freshly-read post document as payload.

use std::sync::Arc;

use actix_web::{test, web, App};
use serde_json::{json, Value};

use twiller_service::config::{EmailConfig, FrontendConfig};
use twiller_service::handlers;
use twiller_service::repository::MemoryRepository;
use twiller_service::services::EmailService;
use twiller_service::state::AppState;
use twiller_service::websocket::events;
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

#[actix_web::test]
async fn post_creation_announces_on_feed() {
    let state = test_state();
    let app = init_app!(state);

    let (_id, mut feed_rx) = state.registry.add_subscriber(events::FEED_TOPIC).await;

    let req = test::TestRequest::post()
        .uri("/post")
        .set_json(json!({"post": "hello", "email": "a@x.com"}))
        .to_request();
    let _: Value = test::call_and_read_body_json(&app, req).await;

    let event: Value = serde_json::from_str(&feed_rx.try_recv().expect("one event")).unwrap();
    assert_eq!(event["event"], json!("new-tweet"));
    assert_eq!(event["data"]["post"], json!("hello"));
    assert!(feed_rx.try_recv().is_err(), "exactly one event expected");
}

#[actix_web::test]
async fn like_toggle_emits_one_full_post_event_per_topic() {
    let state = test_state();
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/post")
        .set_json(json!({"post": "like me", "email": "a@x.com"}))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let post_id = created["tweetId"].as_str().expect("tweet id").to_string();

    // Subscribe after creation so only the like event arrives.
    let (_feed_id, mut feed_rx) = state.registry.add_subscriber(events::FEED_TOPIC).await;
    let post_topic = format!("post:{}", post_id);
    let (_post_id_sub, mut post_rx) = state.registry.add_subscriber(&post_topic).await;

    let req = test::TestRequest::post()
        .uri("/post/like")
        .set_json(json!({"postId": post_id, "userId": "u@x.com"}))
        .to_request();
    let _: Value = test::call_and_read_body_json(&app, req).await;

    // Exactly one event on the feed topic, carrying the full re-read post.
    let event: Value = serde_json::from_str(&feed_rx.try_recv().expect("feed event")).unwrap();
    assert_eq!(event["event"], json!("post-liked"));
    assert_eq!(event["data"]["id"], json!(post_id));
    assert_eq!(event["data"]["likes"], json!(1));
    assert_eq!(event["data"]["likedBy"], json!(["u@x.com"]));
    assert_eq!(event["data"]["post"], json!("like me"));
    assert!(feed_rx.try_recv().is_err(), "exactly one feed event expected");

    // The per-post topic sees the same event once.
    let event: Value = serde_json::from_str(&post_rx.try_recv().expect("post event")).unwrap();
    assert_eq!(event["event"], json!("post-liked"));
    assert!(post_rx.try_recv().is_err());
}

#[actix_web::test]
async fn comment_and_reshare_emit_their_events() {
    let state = test_state();
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/post")
        .set_json(json!({"post": "chatter", "email": "a@x.com"}))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let post_id = created["tweetId"].as_str().expect("tweet id").to_string();

    let (_id, mut feed_rx) = state.registry.add_subscriber(events::FEED_TOPIC).await;

    let req = test::TestRequest::post()
        .uri("/post/reshare")
        .set_json(json!({"postId": post_id, "userId": "u@x.com"}))
        .to_request();
    let _: Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/post/comment")
        .set_json(json!({"postId": post_id, "userId": "u@x.com", "comment": "hi"}))
        .to_request();
    let _: Value = test::call_and_read_body_json(&app, req).await;

    let event: Value = serde_json::from_str(&feed_rx.try_recv().expect("reshare event")).unwrap();
    assert_eq!(event["event"], json!("post-reshared"));
    assert_eq!(event["data"]["reshares"], json!(1));

    let event: Value = serde_json::from_str(&feed_rx.try_recv().expect("comment event")).unwrap();
    assert_eq!(event["event"], json!("post-commented"));
    assert_eq!(event["data"]["comments"], json!(1));

    assert!(feed_rx.try_recv().is_err());
}

#[actix_web::test]
async fn direct_messages_reach_both_inboxes_only() {
    let state = test_state();
    let app = init_app!(state);

    let (_a, mut sender_rx) = state
        .registry
        .add_subscriber(&events::inbox_topic("a@x.com"))
        .await;
    let (_b, mut recipient_rx) = state
        .registry
        .add_subscriber(&events::inbox_topic("b@x.com"))
        .await;
    let (_c, mut bystander_rx) = state
        .registry
        .add_subscriber(&events::inbox_topic("c@x.com"))
        .await;

    let req = test::TestRequest::post()
        .uri("/send-message")
        .set_json(json!({"from": "a@x.com", "to": "b@x.com", "message": "hi"}))
        .to_request();
    let _: Value = test::call_and_read_body_json(&app, req).await;

    let event: Value =
        serde_json::from_str(&recipient_rx.try_recv().expect("recipient event")).unwrap();
    assert_eq!(event["event"], json!("new-message"));
    assert_eq!(event["data"]["message"], json!("hi"));
    assert_eq!(event["data"]["from"], json!("a@x.com"));

    assert!(sender_rx.try_recv().is_ok(), "sender inbox also notified");
    assert!(
        bystander_rx.try_recv().is_err(),
        "unrelated inboxes see nothing"
    );
}
