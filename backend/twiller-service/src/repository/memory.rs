use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::models::{
    Comment, CommentOutcome, DeletionReport, Follow, FollowOutcome, List, LoginRecord, Message,
    NewComment, NewFollow, NewList, NewLoginRecord, NewMessage, NewPost, NewUser, Post,
    ProfileUpdate, RegisterOutcome, ToggleOutcome, User, VerifyOutcome,
};

use super::Repository;

#[derive(Debug, Clone)]
struct VerificationTokenRecord {
    email: String,
    token: String,
    expires_at: DateTime<Utc>,
    verified: bool,
}

#[derive(Debug, Clone)]
struct LoginOtpRecord {
    email: String,
    otp: String,
    expires_at: DateTime<Utc>,
    verified: bool,
}

#[derive(Debug, Clone)]
struct PasswordResetRecord {
    email: String,
    token_hash: String,
    expires_at: DateTime<Utc>,
    used: bool,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
struct Tombstone {
    email: String,
    force_deleted: bool,
}

#[derive(Default)]
struct MemoryState {
    posts: Vec<Post>,
    users: Vec<User>,
    follows: Vec<Follow>,
    verification_tokens: Vec<VerificationTokenRecord>,
    login_otps: Vec<LoginOtpRecord>,
    password_resets: Vec<PasswordResetRecord>,
    login_history: Vec<LoginRecord>,
    messages: Vec<Message>,
    lists: Vec<List>,
    deleted_accounts: Vec<Tombstone>,
}

impl MemoryState {
    fn blank_user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            username: None,
            name: None,
            bio: String::new(),
            location: String::new(),
            website: String::new(),
            dob: String::new(),
            profile_image: None,
            cover_image: None,
            followers: 0,
            following: 0,
            email_verified: false,
            created_at: Utc::now(),
        }
    }

    fn user_mut(&mut self, email: &str) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.email == email)
    }
}

/// In-process fallback backend.
///
/// Holds the same entities as the PostgreSQL backend behind one lock, so
/// every multi-step operation is trivially atomic. Activated only when the
/// database connection fails at startup; nothing persists across restarts.
#[derive(Clone, Default)]
pub struct MemoryRepository {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Repository for MemoryRepository {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create_post(&self, new_post: NewPost) -> Result<Post> {
        let mut state = self.state.write().await;
        let post = Post {
            id: Uuid::new_v4(),
            post: new_post.post,
            email: new_post.email,
            username: new_post.username.unwrap_or_default(),
            name: new_post.name.unwrap_or_default(),
            profile_photo: new_post.profile_photo,
            photo: new_post.photo,
            likes: 0,
            liked_by: Vec::new(),
            reshares: 0,
            reshared_by: Vec::new(),
            comments: 0,
            comment_list: Vec::new(),
            timestamp: Utc::now(),
        };
        state.posts.push(post.clone());
        Ok(post)
    }

    async fn list_posts(&self) -> Result<Vec<Post>> {
        let state = self.state.read().await;
        let mut posts = state.posts.clone();
        posts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(posts)
    }

    async fn posts_by_email(&self, email: &str) -> Result<Vec<Post>> {
        let state = self.state.read().await;
        let mut posts: Vec<Post> = state
            .posts
            .iter()
            .filter(|p| p.email == email)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(posts)
    }

    async fn get_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        let state = self.state.read().await;
        Ok(state.posts.iter().find(|p| p.id == post_id).cloned())
    }

    async fn toggle_like(
        &self,
        post_id: Uuid,
        user_id: &str,
        _username: &str,
    ) -> Result<Option<ToggleOutcome>> {
        let mut state = self.state.write().await;
        let post = match state.posts.iter_mut().find(|p| p.id == post_id) {
            Some(post) => post,
            None => return Ok(None),
        };

        // Membership and counter move inside one lock scope.
        let engaged = if let Some(pos) = post.liked_by.iter().position(|u| u == user_id) {
            post.liked_by.remove(pos);
            post.likes -= 1;
            false
        } else {
            post.liked_by.push(user_id.to_string());
            post.likes += 1;
            true
        };

        Ok(Some(ToggleOutcome {
            engaged,
            post: post.clone(),
        }))
    }

    async fn toggle_reshare(
        &self,
        post_id: Uuid,
        user_id: &str,
        _username: &str,
    ) -> Result<Option<ToggleOutcome>> {
        let mut state = self.state.write().await;
        let post = match state.posts.iter_mut().find(|p| p.id == post_id) {
            Some(post) => post,
            None => return Ok(None),
        };

        let engaged = if let Some(pos) = post.reshared_by.iter().position(|u| u == user_id) {
            post.reshared_by.remove(pos);
            post.reshares -= 1;
            false
        } else {
            post.reshared_by.push(user_id.to_string());
            post.reshares += 1;
            true
        };

        Ok(Some(ToggleOutcome {
            engaged,
            post: post.clone(),
        }))
    }

    async fn add_comment(
        &self,
        post_id: Uuid,
        new_comment: NewComment,
    ) -> Result<Option<CommentOutcome>> {
        let mut state = self.state.write().await;
        let post = match state.posts.iter_mut().find(|p| p.id == post_id) {
            Some(post) => post,
            None => return Ok(None),
        };

        let comment = Comment {
            comment_id: Uuid::new_v4(),
            user_id: new_comment.user_id,
            username: new_comment.username,
            comment: new_comment.comment,
            commenter_name: new_comment.commenter_name,
            timestamp: Utc::now(),
        };

        post.comment_list.push(comment.clone());
        post.comments += 1;

        Ok(Some(CommentOutcome {
            comment,
            post: post.clone(),
        }))
    }

    async fn search_posts(&self, query: &str, limit: i64) -> Result<Vec<Post>> {
        let needle = query.to_lowercase();
        let state = self.state.read().await;
        Ok(state
            .posts
            .iter()
            .filter(|p| {
                p.post.to_lowercase().contains(&needle)
                    || p.name.to_lowercase().contains(&needle)
                    || p.username.to_lowercase().contains(&needle)
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn register_user(&self, new_user: NewUser) -> Result<RegisterOutcome> {
        let mut state = self.state.write().await;

        if state.users.iter().any(|u| u.email == new_user.email) {
            return Ok(RegisterOutcome::EmailTaken);
        }
        if state
            .users
            .iter()
            .any(|u| u.username.as_deref() == Some(new_user.username.as_str()))
        {
            return Ok(RegisterOutcome::UsernameTaken);
        }

        let mut user = MemoryState::blank_user(&new_user.email);
        user.username = Some(new_user.username);
        user.name = Some(new_user.name);
        user.profile_image = new_user.profile_image;
        let id = user.id;
        state.users.push(user);

        Ok(RegisterOutcome::Created(id))
    }

    async fn update_profile(&self, email: &str, update: ProfileUpdate) -> Result<Vec<String>> {
        let fields = update.updated_fields();
        let mut state = self.state.write().await;

        if state.user_mut(email).is_none() {
            let user = MemoryState::blank_user(email);
            state.users.push(user);
        }
        if let Some(user) = state.user_mut(email) {
            if let Some(name) = update.name {
                user.name = Some(name);
            }
            if let Some(username) = update.username {
                user.username = Some(username);
            }
            if let Some(bio) = update.bio {
                user.bio = bio;
            }
            if let Some(location) = update.location {
                user.location = location;
            }
            if let Some(website) = update.website {
                user.website = website;
            }
            if let Some(dob) = update.dob {
                user.dob = dob;
            }
            if let Some(profile_image) = update.profile_image {
                user.profile_image = Some(profile_image);
            }
            if let Some(cover_image) = update.cover_image {
                user.cover_image = Some(cover_image);
            }
        }

        Ok(fields)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.username.as_deref() == Some(username))
            .cloned())
    }

    async fn search_users(&self, query: &str, limit: i64) -> Result<Vec<User>> {
        let needle = query.to_lowercase();
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .filter(|u| {
                u.email.to_lowercase().contains(&needle)
                    || u.name
                        .as_deref()
                        .is_some_and(|n| n.to_lowercase().contains(&needle))
                    || u.username
                        .as_deref()
                        .is_some_and(|n| n.to_lowercase().contains(&needle))
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn suggested_users(&self, exclude: &[String], limit: i64) -> Result<Vec<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .filter(|u| !exclude.contains(&u.email))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn delete_account(&self, email: &str) -> Result<DeletionReport> {
        let mut state = self.state.write().await;

        let before = state.posts.len();
        state.posts.retain(|p| p.email != email);
        let posts_deleted = (before - state.posts.len()) as u64;

        let before = state.users.len();
        state.users.retain(|u| u.email != email);
        let user_deleted = state.users.len() < before;

        state.verification_tokens.retain(|t| t.email != email);

        state.deleted_accounts.push(Tombstone {
            email: email.to_string(),
            force_deleted: false,
        });

        Ok(DeletionReport {
            user_deleted,
            posts_deleted,
        })
    }

    async fn record_force_delete(&self, email: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state.deleted_accounts.push(Tombstone {
            email: email.to_string(),
            force_deleted: true,
        });
        Ok(())
    }

    async fn create_follow(&self, edge: NewFollow) -> Result<FollowOutcome> {
        let mut state = self.state.write().await;

        if state.follows.iter().any(|f| {
            f.follower_email == edge.follower_email && f.following_email == edge.following_email
        }) {
            return Ok(FollowOutcome::AlreadyFollowing);
        }

        let follower_email = edge.follower_email.clone();
        let following_email = edge.following_email.clone();
        state.follows.push(Follow {
            follower_email: edge.follower_email,
            following_email: edge.following_email,
            follower_name: edge.follower_name.unwrap_or_default(),
            follower_username: edge.follower_username.unwrap_or_default(),
            following_name: edge.following_name.unwrap_or_default(),
            following_username: edge.following_username.unwrap_or_default(),
            timestamp: Utc::now(),
        });

        if let Some(user) = state.user_mut(&following_email) {
            user.followers += 1;
        }
        if let Some(user) = state.user_mut(&follower_email) {
            user.following += 1;
        }

        Ok(FollowOutcome::Created)
    }

    async fn delete_follow(&self, follower_email: &str, following_email: &str) -> Result<bool> {
        let mut state = self.state.write().await;

        let before = state.follows.len();
        state
            .follows
            .retain(|f| !(f.follower_email == follower_email && f.following_email == following_email));
        if state.follows.len() == before {
            return Ok(false);
        }

        if let Some(user) = state.user_mut(following_email) {
            user.followers -= 1;
        }
        if let Some(user) = state.user_mut(follower_email) {
            user.following -= 1;
        }

        Ok(true)
    }

    async fn is_following(&self, follower_email: &str, following_email: &str) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state
            .follows
            .iter()
            .any(|f| f.follower_email == follower_email && f.following_email == following_email))
    }

    async fn followers_count(&self, email: &str) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state
            .follows
            .iter()
            .filter(|f| f.following_email == email)
            .count() as i64)
    }

    async fn following_count(&self, email: &str) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state
            .follows
            .iter()
            .filter(|f| f.follower_email == email)
            .count() as i64)
    }

    async fn following_users(&self, email: &str) -> Result<Vec<User>> {
        let state = self.state.read().await;
        let followed: Vec<&String> = state
            .follows
            .iter()
            .filter(|f| f.follower_email == email)
            .map(|f| &f.following_email)
            .collect();
        Ok(state
            .users
            .iter()
            .filter(|u| followed.contains(&&u.email))
            .cloned()
            .collect())
    }

    async fn following_emails(&self, email: &str) -> Result<Vec<String>> {
        let state = self.state.read().await;
        Ok(state
            .follows
            .iter()
            .filter(|f| f.follower_email == email)
            .map(|f| f.following_email.clone())
            .collect())
    }

    async fn create_verification_token(
        &self,
        email: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state.verification_tokens.push(VerificationTokenRecord {
            email: email.to_string(),
            token: token.to_string(),
            expires_at,
            verified: false,
        });
        Ok(())
    }

    async fn consume_verification_token(&self, email: &str, token: &str) -> Result<VerifyOutcome> {
        let mut state = self.state.write().await;

        let record = state
            .verification_tokens
            .iter_mut()
            .find(|t| t.email == email && t.token == token && !t.verified);
        let expired = match record {
            Some(record) => {
                if Utc::now() > record.expires_at {
                    true
                } else {
                    record.verified = true;
                    false
                }
            }
            None => return Ok(VerifyOutcome::Invalid),
        };
        if expired {
            return Ok(VerifyOutcome::Expired);
        }

        if let Some(user) = state.user_mut(email) {
            user.email_verified = true;
        }

        Ok(VerifyOutcome::Verified)
    }

    async fn email_verified(&self, email: &str) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.email_verified)
            .unwrap_or(false))
    }

    async fn create_login_otp(
        &self,
        email: &str,
        otp: &str,
        expires_at: DateTime<Utc>,
        _device_info: Option<serde_json::Value>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state.login_otps.push(LoginOtpRecord {
            email: email.to_string(),
            otp: otp.to_string(),
            expires_at,
            verified: false,
        });
        Ok(())
    }

    async fn consume_login_otp(&self, email: &str, otp: &str) -> Result<VerifyOutcome> {
        let mut state = self.state.write().await;

        let record = match state
            .login_otps
            .iter_mut()
            .find(|r| r.email == email && r.otp == otp && !r.verified)
        {
            Some(record) => record,
            None => return Ok(VerifyOutcome::Invalid),
        };

        if Utc::now() > record.expires_at {
            return Ok(VerifyOutcome::Expired);
        }

        record.verified = true;
        Ok(VerifyOutcome::Verified)
    }

    async fn create_password_reset(
        &self,
        email: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        for record in state
            .password_resets
            .iter_mut()
            .filter(|r| r.email == email && !r.used)
        {
            record.used = true;
        }
        state.password_resets.push(PasswordResetRecord {
            email: email.to_string(),
            token_hash: token_hash.to_string(),
            expires_at,
            used: false,
        });
        Ok(())
    }

    async fn reset_token_email(&self, token_hash: &str) -> Result<Option<String>> {
        let state = self.state.read().await;
        Ok(state
            .password_resets
            .iter()
            .find(|r| r.token_hash == token_hash && !r.used && r.expires_at > Utc::now())
            .map(|r| r.email.clone()))
    }

    async fn consume_password_reset(&self, token_hash: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        match state
            .password_resets
            .iter_mut()
            .find(|r| r.token_hash == token_hash && !r.used && r.expires_at > Utc::now())
        {
            Some(record) => {
                record.used = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn clear_password_resets(&self, email: &str) -> Result<u64> {
        let mut state = self.state.write().await;
        let mut cleared = 0;
        for record in state
            .password_resets
            .iter_mut()
            .filter(|r| r.email == email && !r.used)
        {
            record.used = true;
            cleared += 1;
        }
        Ok(cleared)
    }

    async fn record_login(&self, attempt: NewLoginRecord) -> Result<Uuid> {
        let mut state = self.state.write().await;
        let record = LoginRecord {
            id: Uuid::new_v4(),
            email: attempt.email,
            browser: attempt.device.browser,
            os: attempt.device.os,
            device_type: attempt.device.device_type,
            ip_address: attempt.device.ip_address,
            user_agent: attempt.device.user_agent,
            timezone: attempt.device.timezone,
            language: attempt.device.language,
            screen: attempt.device.screen,
            login_success: attempt.login_success,
            auth_method: attempt.auth_method,
            failure_reason: attempt.failure_reason,
            session_id: attempt.device.session_id,
            timestamp: Utc::now(),
        };
        let id = record.id;
        state.login_history.push(record);
        Ok(id)
    }

    async fn login_history(
        &self,
        email: &str,
        limit: i64,
        success_only: bool,
    ) -> Result<Vec<LoginRecord>> {
        let state = self.state.read().await;
        let mut history: Vec<LoginRecord> = state
            .login_history
            .iter()
            .filter(|r| r.email == email && (!success_only || r.login_success))
            .cloned()
            .collect();
        history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        history.truncate(limit as usize);
        Ok(history)
    }

    async fn create_message(&self, new_message: NewMessage) -> Result<Message> {
        let mut state = self.state.write().await;
        let message = Message {
            id: Uuid::new_v4(),
            from: new_message.from,
            to: new_message.to,
            message: new_message.message,
            read: false,
            timestamp: Utc::now(),
        };
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn create_list(&self, new_list: NewList) -> Result<Uuid> {
        let mut state = self.state.write().await;
        let list = List {
            id: Uuid::new_v4(),
            owner: new_list.owner,
            name: new_list.name,
            description: new_list.description.unwrap_or_default(),
            member_count: 0,
            following_count: 0,
            created_at: Utc::now(),
        };
        let id = list.id;
        state.lists.push(list);
        Ok(id)
    }

    async fn lists_by_owner(&self, owner: &str) -> Result<Vec<List>> {
        let state = self.state.read().await;
        Ok(state
            .lists
            .iter()
            .filter(|l| l.owner == owner)
            .cloned()
            .collect())
    }
}
