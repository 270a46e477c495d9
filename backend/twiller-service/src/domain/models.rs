use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post entity - a tweet with its denormalized author snapshot, interaction
/// counters and the full membership sets behind them.
///
/// Field names on the wire keep the contract the frontend already speaks
/// (`likedBy`, `commentList`, `profilephoto`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub post: String,
    pub email: String,
    pub username: String,
    pub name: String,
    #[serde(rename = "profilephoto")]
    pub profile_photo: Option<String>,
    pub photo: Option<String>,
    pub likes: i64,
    pub liked_by: Vec<String>,
    pub reshares: i64,
    pub reshared_by: Vec<String>,
    pub comments: i64,
    pub comment_list: Vec<Comment>,
    pub timestamp: DateTime<Utc>,
}

/// Comment entity - immutable once appended; there is no edit/delete path.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub comment_id: Uuid,
    pub user_id: String,
    pub username: String,
    pub comment: String,
    pub commenter_name: String,
    pub timestamp: DateTime<Utc>,
}

/// User profile, keyed by email. The `followers`/`following` counters are
/// denormalized and maintained in the same atomic unit as the follow edge.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub bio: String,
    pub location: String,
    pub website: String,
    pub dob: String,
    pub profile_image: Option<String>,
    #[serde(rename = "coverimage")]
    pub cover_image: Option<String>,
    pub followers: i64,
    pub following: i64,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Directed follow edge with display-name snapshots taken at follow time.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub follower_email: String,
    pub following_email: String,
    pub follower_name: String,
    pub follower_username: String,
    pub following_name: String,
    pub following_username: String,
    pub timestamp: DateTime<Utc>,
}

/// Direct message between two users.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    #[sqlx(rename = "sender")]
    pub from: String,
    #[sqlx(rename = "recipient")]
    pub to: String,
    #[sqlx(rename = "body")]
    pub message: String,
    pub read: bool,
    pub timestamp: DateTime<Utc>,
}

/// User-curated list.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub id: Uuid,
    pub owner: String,
    pub name: String,
    pub description: String,
    pub member_count: i64,
    pub following_count: i64,
    pub created_at: DateTime<Utc>,
}

/// One recorded login attempt with device forensics.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LoginRecord {
    pub id: Uuid,
    pub email: String,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub device_type: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub timezone: Option<String>,
    pub language: Option<String>,
    pub screen: Option<String>,
    pub login_success: bool,
    pub auth_method: String,
    pub failure_reason: Option<String>,
    pub session_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Device description sent by the client on login tracking and access checks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub browser: Option<String>,
    pub os: Option<String>,
    pub device_type: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub timezone: Option<String>,
    pub language: Option<String>,
    pub screen: Option<String>,
    pub session_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Input for post creation: body plus the author snapshot captured at post
/// time (not a live reference).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub post: String,
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "profilephoto")]
    pub profile_photo: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

/// Input for a comment append.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub user_id: String,
    pub username: String,
    pub comment: String,
    pub commenter_name: String,
}

/// Input for user registration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub profile_image: Option<String>,
}

/// Partial profile update; only `Some` fields are written.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub dob: Option<String>,
    pub profile_image: Option<String>,
    #[serde(rename = "coverimage")]
    pub cover_image: Option<String>,
}

impl ProfileUpdate {
    /// Names of the fields carried by this update, for the response envelope.
    pub fn updated_fields(&self) -> Vec<String> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push("name".into());
        }
        if self.username.is_some() {
            fields.push("username".into());
        }
        if self.bio.is_some() {
            fields.push("bio".into());
        }
        if self.location.is_some() {
            fields.push("location".into());
        }
        if self.website.is_some() {
            fields.push("website".into());
        }
        if self.dob.is_some() {
            fields.push("dob".into());
        }
        if self.profile_image.is_some() {
            fields.push("profileImage".into());
        }
        if self.cover_image.is_some() {
            fields.push("coverimage".into());
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.updated_fields().is_empty()
    }
}

/// Input for a follow edge.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFollow {
    pub follower_email: String,
    pub following_email: String,
    #[serde(default)]
    pub follower_name: Option<String>,
    #[serde(default)]
    pub follower_username: Option<String>,
    #[serde(default)]
    pub following_name: Option<String>,
    #[serde(default)]
    pub following_username: Option<String>,
}

/// Input for a direct message.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub from: String,
    pub to: String,
    pub message: String,
}

/// Input for list creation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewList {
    pub owner: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Input for login tracking.
#[derive(Debug, Clone)]
pub struct NewLoginRecord {
    pub email: String,
    pub device: DeviceInfo,
    pub login_success: bool,
    pub auth_method: String,
    pub failure_reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Operation outcomes
// ---------------------------------------------------------------------------

/// Result of a like/reshare toggle: whether the user is now engaged, plus the
/// freshly re-read authoritative post.
#[derive(Debug, Clone)]
pub struct ToggleOutcome {
    pub engaged: bool,
    pub post: Post,
}

/// Result of a comment append.
#[derive(Debug, Clone)]
pub struct CommentOutcome {
    pub comment: Comment,
    pub post: Post,
}

/// Result of user registration.
#[derive(Debug, Clone)]
pub enum RegisterOutcome {
    Created(Uuid),
    EmailTaken,
    UsernameTaken,
}

/// Result of a follow request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
}

/// Result of consuming a verification token or login OTP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified,
    Invalid,
    Expired,
}

/// Result of a cascade account deletion.
#[derive(Debug, Clone, Copy)]
pub struct DeletionReport {
    pub user_deleted: bool,
    pub posts_deleted: u64,
}
