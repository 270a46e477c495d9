//! Repository contract tests, run against the in-memory backend.
//!
//! The interesting properties are the consistency rules both backends must
//! uphold: toggles keep counter and membership set in sync (including under
//! concurrent interleaving), comment appends are atomic, follow counters
//! round-trip, and account deletion cascades.

use std::sync::Arc;

use chrono::{Duration, Utc};
use twiller_service::domain::models::{
    FollowOutcome, NewComment, NewFollow, NewPost, NewUser, RegisterOutcome, VerifyOutcome,
};
use twiller_service::repository::{MemoryRepository, Repository};

fn new_post(email: &str, body: &str) -> NewPost {
    NewPost {
        post: body.to_string(),
        email: email.to_string(),
        username: Some("author".to_string()),
        name: Some("Author".to_string()),
        profile_photo: None,
        photo: None,
    }
}

fn new_user(email: &str, username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        name: username.to_uppercase(),
        email: email.to_string(),
        profile_image: None,
    }
}

fn edge(follower: &str, following: &str) -> NewFollow {
    NewFollow {
        follower_email: follower.to_string(),
        following_email: following.to_string(),
        follower_name: None,
        follower_username: None,
        following_name: None,
        following_username: None,
    }
}

#[tokio::test]
async fn like_toggle_roundtrip() {
    let repo = MemoryRepository::new();
    let post = repo.create_post(new_post("a@x.com", "hello")).await.unwrap();

    let outcome = repo
        .toggle_like(post.id, "u@x.com", "u")
        .await
        .unwrap()
        .unwrap();
    assert!(outcome.engaged);
    assert_eq!(outcome.post.likes, 1);
    assert_eq!(outcome.post.liked_by, vec!["u@x.com".to_string()]);

    let outcome = repo
        .toggle_like(post.id, "u@x.com", "u")
        .await
        .unwrap()
        .unwrap();
    assert!(!outcome.engaged);
    assert_eq!(outcome.post.likes, 0);
    assert!(outcome.post.liked_by.is_empty());
}

#[tokio::test]
async fn toggle_on_missing_post_is_clean_not_found() {
    let repo = MemoryRepository::new();
    let missing = uuid::Uuid::new_v4();

    assert!(repo.toggle_like(missing, "u@x.com", "u").await.unwrap().is_none());
    assert!(repo
        .toggle_reshare(missing, "u@x.com", "u")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_same_user_toggles_never_drift() {
    let repo = Arc::new(MemoryRepository::new());
    let post = repo.create_post(new_post("a@x.com", "race me")).await.unwrap();

    // An even number of toggles from one user, all racing. Every toggle is
    // atomic, so the counter can never diverge from the membership set.
    let mut handles = Vec::new();
    for _ in 0..16 {
        let repo = repo.clone();
        let post_id = post.id;
        handles.push(tokio::spawn(async move {
            repo.toggle_like(post_id, "u@x.com", "u").await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let post = repo.get_post(post.id).await.unwrap().unwrap();
    assert_eq!(post.likes as usize, post.liked_by.len());
    assert_eq!(post.likes, 0, "16 toggles must land back on not-liked");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_distinct_user_likes_all_count() {
    let repo = Arc::new(MemoryRepository::new());
    let post = repo.create_post(new_post("a@x.com", "popular")).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..10 {
        let repo = repo.clone();
        let post_id = post.id;
        handles.push(tokio::spawn(async move {
            let user = format!("user{}@x.com", i);
            repo.toggle_like(post_id, &user, "u").await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let post = repo.get_post(post.id).await.unwrap().unwrap();
    assert_eq!(post.likes, 10);
    assert_eq!(post.liked_by.len(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_comments_lose_nothing() {
    let repo = Arc::new(MemoryRepository::new());
    let post = repo.create_post(new_post("a@x.com", "discuss")).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..12 {
        let repo = repo.clone();
        let post_id = post.id;
        handles.push(tokio::spawn(async move {
            repo.add_comment(
                post_id,
                NewComment {
                    user_id: format!("user{}@x.com", i),
                    username: format!("user{}", i),
                    comment: format!("comment {}", i),
                    commenter_name: String::new(),
                },
            )
            .await
            .unwrap()
            .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let post = repo.get_post(post.id).await.unwrap().unwrap();
    assert_eq!(post.comments, 12);
    assert_eq!(post.comment_list.len(), 12);
}

#[tokio::test]
async fn follow_is_idempotent_and_counters_roundtrip() {
    let repo = MemoryRepository::new();
    repo.register_user(new_user("a@x.com", "alice")).await.unwrap();
    repo.register_user(new_user("b@x.com", "bob")).await.unwrap();

    assert!(matches!(
        repo.create_follow(edge("a@x.com", "b@x.com")).await.unwrap(),
        FollowOutcome::Created
    ));
    assert!(matches!(
        repo.create_follow(edge("a@x.com", "b@x.com")).await.unwrap(),
        FollowOutcome::AlreadyFollowing
    ));

    // Idempotent: the duplicate follow changed no counters.
    let bob = repo.find_user_by_email("b@x.com").await.unwrap().unwrap();
    let alice = repo.find_user_by_email("a@x.com").await.unwrap().unwrap();
    assert_eq!(bob.followers, 1);
    assert_eq!(alice.following, 1);

    // The edge-derived counts agree with the denormalized counters.
    assert_eq!(repo.followers_count("b@x.com").await.unwrap(), 1);
    assert_eq!(repo.following_count("a@x.com").await.unwrap(), 1);
    assert!(repo.is_following("a@x.com", "b@x.com").await.unwrap());

    assert!(repo.delete_follow("a@x.com", "b@x.com").await.unwrap());

    let bob = repo.find_user_by_email("b@x.com").await.unwrap().unwrap();
    let alice = repo.find_user_by_email("a@x.com").await.unwrap().unwrap();
    assert_eq!(bob.followers, 0);
    assert_eq!(alice.following, 0);

    assert!(!repo.delete_follow("a@x.com", "b@x.com").await.unwrap());
}

#[tokio::test]
async fn account_deletion_cascades() {
    let repo = MemoryRepository::new();
    repo.register_user(new_user("a@x.com", "alice")).await.unwrap();
    for i in 0..3 {
        repo.create_post(new_post("a@x.com", &format!("post {}", i)))
            .await
            .unwrap();
    }
    repo.create_verification_token("a@x.com", "tok", Utc::now() + Duration::hours(24))
        .await
        .unwrap();

    let report = repo.delete_account("a@x.com").await.unwrap();
    assert!(report.user_deleted);
    assert_eq!(report.posts_deleted, 3);

    assert!(repo.posts_by_email("a@x.com").await.unwrap().is_empty());
    assert!(repo.find_user_by_email("a@x.com").await.unwrap().is_none());
    assert_eq!(
        repo.consume_verification_token("a@x.com", "tok").await.unwrap(),
        VerifyOutcome::Invalid
    );
}

#[tokio::test]
async fn registration_rejects_duplicates() {
    let repo = MemoryRepository::new();

    assert!(matches!(
        repo.register_user(new_user("a@x.com", "alice")).await.unwrap(),
        RegisterOutcome::Created(_)
    ));
    assert!(matches!(
        repo.register_user(new_user("a@x.com", "other")).await.unwrap(),
        RegisterOutcome::EmailTaken
    ));
    assert!(matches!(
        repo.register_user(new_user("b@x.com", "alice")).await.unwrap(),
        RegisterOutcome::UsernameTaken
    ));
}

#[tokio::test]
async fn verification_token_lifecycle() {
    let repo = MemoryRepository::new();
    repo.register_user(new_user("a@x.com", "alice")).await.unwrap();

    repo.create_verification_token("a@x.com", "fresh", Utc::now() + Duration::hours(24))
        .await
        .unwrap();
    repo.create_verification_token("a@x.com", "stale", Utc::now() - Duration::hours(1))
        .await
        .unwrap();

    assert_eq!(
        repo.consume_verification_token("a@x.com", "stale").await.unwrap(),
        VerifyOutcome::Expired
    );
    assert_eq!(
        repo.consume_verification_token("a@x.com", "wrong").await.unwrap(),
        VerifyOutcome::Invalid
    );
    assert!(!repo.email_verified("a@x.com").await.unwrap());

    assert_eq!(
        repo.consume_verification_token("a@x.com", "fresh").await.unwrap(),
        VerifyOutcome::Verified
    );
    assert!(repo.email_verified("a@x.com").await.unwrap());

    // Single use.
    assert_eq!(
        repo.consume_verification_token("a@x.com", "fresh").await.unwrap(),
        VerifyOutcome::Invalid
    );
}

#[tokio::test]
async fn login_otp_lifecycle() {
    let repo = MemoryRepository::new();

    repo.create_login_otp("a@x.com", "123456", Utc::now() + Duration::minutes(10), None)
        .await
        .unwrap();
    repo.create_login_otp("a@x.com", "654321", Utc::now() - Duration::minutes(1), None)
        .await
        .unwrap();

    assert_eq!(
        repo.consume_login_otp("a@x.com", "000000").await.unwrap(),
        VerifyOutcome::Invalid
    );
    assert_eq!(
        repo.consume_login_otp("a@x.com", "654321").await.unwrap(),
        VerifyOutcome::Expired
    );
    assert_eq!(
        repo.consume_login_otp("a@x.com", "123456").await.unwrap(),
        VerifyOutcome::Verified
    );
    assert_eq!(
        repo.consume_login_otp("a@x.com", "123456").await.unwrap(),
        VerifyOutcome::Invalid
    );
}

#[tokio::test]
async fn password_reset_lifecycle() {
    let repo = MemoryRepository::new();

    repo.create_password_reset("a@x.com", "hash-1", Utc::now() + Duration::hours(1))
        .await
        .unwrap();

    assert_eq!(
        repo.reset_token_email("hash-1").await.unwrap().as_deref(),
        Some("a@x.com")
    );

    // A second request invalidates the first token.
    repo.create_password_reset("a@x.com", "hash-2", Utc::now() + Duration::hours(1))
        .await
        .unwrap();
    assert!(repo.reset_token_email("hash-1").await.unwrap().is_none());

    assert!(repo.consume_password_reset("hash-2").await.unwrap());
    assert!(!repo.consume_password_reset("hash-2").await.unwrap());
    assert!(repo.reset_token_email("hash-2").await.unwrap().is_none());
}

#[tokio::test]
async fn posts_list_newest_first() {
    let repo = MemoryRepository::new();
    for i in 0..3 {
        repo.create_post(new_post("a@x.com", &format!("post {}", i)))
            .await
            .unwrap();
    }

    let posts = repo.list_posts().await.unwrap();
    assert_eq!(posts.len(), 3);
    assert!(posts.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
}
