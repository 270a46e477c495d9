use anyhow::Result;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::models::{
    CommentOutcome, DeletionReport, FollowOutcome, List, LoginRecord, Message, NewComment,
    NewFollow, NewList, NewLoginRecord, NewMessage, NewPost, NewUser, Post, ProfileUpdate,
    RegisterOutcome, ToggleOutcome, User, VerifyOutcome,
};

/// Storage interface for the whole service.
///
/// Both `PostgresRepository` (primary) and `MemoryRepository` (startup
/// fallback) implement this trait with identical contracts, so handlers
/// cannot observe which backend is active.
///
/// Consistency rules every implementation must uphold:
/// - like/reshare toggles move the membership set and the counter in one
///   atomic unit (`likes == liked_by.len()` at all times),
/// - follow/unfollow writes the edge and both user counters atomically,
/// - account deletion cascades (posts, user, verification tokens,
///   tombstone) as a single unit.
#[async_trait::async_trait]
pub trait Repository: Send + Sync {
    /// Human-readable backend name, surfaced by the health endpoint.
    fn backend_name(&self) -> &'static str;

    // ===== Posts =====

    /// Create a post; counters start at zero, the id is store-assigned.
    async fn create_post(&self, new_post: NewPost) -> Result<Post>;

    /// All posts, newest first.
    async fn list_posts(&self) -> Result<Vec<Post>>;

    /// Posts by author email, newest first.
    async fn posts_by_email(&self, email: &str) -> Result<Vec<Post>>;

    /// Single post lookup.
    async fn get_post(&self, post_id: Uuid) -> Result<Option<Post>>;

    /// Toggle like membership for `user_id`; returns `None` if the post
    /// does not exist.
    async fn toggle_like(
        &self,
        post_id: Uuid,
        user_id: &str,
        username: &str,
    ) -> Result<Option<ToggleOutcome>>;

    /// Toggle reshare membership for `user_id`; returns `None` if the post
    /// does not exist.
    async fn toggle_reshare(
        &self,
        post_id: Uuid,
        user_id: &str,
        username: &str,
    ) -> Result<Option<ToggleOutcome>>;

    /// Append a comment; returns `None` if the post does not exist.
    async fn add_comment(
        &self,
        post_id: Uuid,
        new_comment: NewComment,
    ) -> Result<Option<CommentOutcome>>;

    /// Case-insensitive substring search over body / author name / username.
    async fn search_posts(&self, query: &str, limit: i64) -> Result<Vec<Post>>;

    // ===== Users =====

    /// Create a user after explicit duplicate checks on email and username.
    async fn register_user(&self, new_user: NewUser) -> Result<RegisterOutcome>;

    /// Partial profile update with upsert semantics; returns the names of
    /// the fields written.
    async fn update_profile(&self, email: &str, update: ProfileUpdate) -> Result<Vec<String>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Case-insensitive substring search over name / username / email.
    async fn search_users(&self, query: &str, limit: i64) -> Result<Vec<User>>;

    /// Users not in `exclude`, for the who-to-follow widget.
    async fn suggested_users(&self, exclude: &[String], limit: i64) -> Result<Vec<User>>;

    /// Cascade delete: the user's posts, the user document and their
    /// verification tokens go together with a tombstone record.
    async fn delete_account(&self, email: &str) -> Result<DeletionReport>;

    /// Write a force-delete tombstone without touching other records.
    async fn record_force_delete(&self, email: &str) -> Result<()>;

    // ===== Follows =====

    /// Create a follow edge and bump both counters; idempotent on the pair.
    async fn create_follow(&self, edge: NewFollow) -> Result<FollowOutcome>;

    /// Delete the edge and decrement both counters; `false` if no edge.
    async fn delete_follow(&self, follower_email: &str, following_email: &str) -> Result<bool>;

    async fn is_following(&self, follower_email: &str, following_email: &str) -> Result<bool>;

    /// Edge-derived follower count (cross-checks the denormalized counter).
    async fn followers_count(&self, email: &str) -> Result<i64>;

    /// Edge-derived following count.
    async fn following_count(&self, email: &str) -> Result<i64>;

    /// Full user documents for everyone `email` follows.
    async fn following_users(&self, email: &str) -> Result<Vec<User>>;

    /// Just the followed emails, for exclusion lists.
    async fn following_emails(&self, email: &str) -> Result<Vec<String>>;

    // ===== Email verification =====

    async fn create_verification_token(
        &self,
        email: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Consume a token and, when valid, mark the user's email verified.
    async fn consume_verification_token(&self, email: &str, token: &str) -> Result<VerifyOutcome>;

    async fn email_verified(&self, email: &str) -> Result<bool>;

    // ===== Login OTPs =====

    async fn create_login_otp(
        &self,
        email: &str,
        otp: &str,
        expires_at: DateTime<Utc>,
        device_info: Option<serde_json::Value>,
    ) -> Result<()>;

    async fn consume_login_otp(&self, email: &str, otp: &str) -> Result<VerifyOutcome>;

    // ===== Password resets =====

    /// Store a new reset token (hashed); outstanding tokens are invalidated.
    async fn create_password_reset(
        &self,
        email: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Email behind a still-valid token hash, if any.
    async fn reset_token_email(&self, token_hash: &str) -> Result<Option<String>>;

    /// Mark a valid token used; `false` if unknown, expired or already used.
    async fn consume_password_reset(&self, token_hash: &str) -> Result<bool>;

    /// Invalidate all outstanding reset tokens for an email (testing aid).
    async fn clear_password_resets(&self, email: &str) -> Result<u64>;

    // ===== Login history =====

    async fn record_login(&self, attempt: NewLoginRecord) -> Result<Uuid>;

    async fn login_history(
        &self,
        email: &str,
        limit: i64,
        success_only: bool,
    ) -> Result<Vec<LoginRecord>>;

    // ===== Messages & lists =====

    async fn create_message(&self, new_message: NewMessage) -> Result<Message>;

    async fn create_list(&self, new_list: NewList) -> Result<Uuid>;

    async fn lists_by_owner(&self, owner: &str) -> Result<Vec<List>>;
}
