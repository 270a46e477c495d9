use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::domain::models::{
    Comment, CommentOutcome, DeletionReport, FollowOutcome, List, LoginRecord, Message,
    NewComment, NewFollow, NewList, NewLoginRecord, NewMessage, NewPost, NewUser, Post,
    ProfileUpdate, RegisterOutcome, ToggleOutcome, User, VerifyOutcome,
};

use super::Repository;

const USER_COLUMNS: &str = "id, email, username, name, bio, location, website, dob, \
     profile_image, cover_image, followers, following, email_verified, created_at";

/// Connect to PostgreSQL, verify the connection and run migrations.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.url)
        .await
        .context("Failed to connect to database")?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .context("Failed to verify database connection")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok(pool)
}

/// Row shape of the `posts` table; membership sets are hydrated separately.
#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    post: String,
    email: String,
    username: String,
    name: String,
    profile_photo: Option<String>,
    photo: Option<String>,
    likes: i64,
    reshares: i64,
    comments: i64,
    created_at: DateTime<Utc>,
}

/// PostgreSQL repository (primary backend)
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Hydrate post rows into full post documents by batch-loading the
    /// like/reshare sets and comment lists.
    async fn hydrate(&self, rows: Vec<PostRow>) -> Result<Vec<Post>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

        let likes: Vec<(Uuid, String)> = sqlx::query_as(
            r#"
            SELECT post_id, user_id
            FROM post_likes
            WHERE post_id = ANY($1)
            ORDER BY created_at
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let reshares: Vec<(Uuid, String)> = sqlx::query_as(
            r#"
            SELECT post_id, user_id
            FROM post_reshares
            WHERE post_id = ANY($1)
            ORDER BY created_at
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let comments: Vec<(Uuid, Uuid, String, String, String, String, DateTime<Utc>)> =
            sqlx::query_as(
                r#"
                SELECT post_id, id, user_id, username, commenter_name, body, created_at
                FROM post_comments
                WHERE post_id = ANY($1)
                ORDER BY created_at
                "#,
            )
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;

        let mut liked_by: HashMap<Uuid, Vec<String>> = HashMap::new();
        for (post_id, user_id) in likes {
            liked_by.entry(post_id).or_default().push(user_id);
        }

        let mut reshared_by: HashMap<Uuid, Vec<String>> = HashMap::new();
        for (post_id, user_id) in reshares {
            reshared_by.entry(post_id).or_default().push(user_id);
        }

        let mut comment_lists: HashMap<Uuid, Vec<Comment>> = HashMap::new();
        for (post_id, id, user_id, username, commenter_name, body, created_at) in comments {
            comment_lists.entry(post_id).or_default().push(Comment {
                comment_id: id,
                user_id,
                username,
                comment: body,
                commenter_name,
                timestamp: created_at,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| Post {
                liked_by: liked_by.remove(&row.id).unwrap_or_default(),
                reshared_by: reshared_by.remove(&row.id).unwrap_or_default(),
                comment_list: comment_lists.remove(&row.id).unwrap_or_default(),
                id: row.id,
                post: row.post,
                email: row.email,
                username: row.username,
                name: row.name,
                profile_photo: row.profile_photo,
                photo: row.photo,
                likes: row.likes,
                reshares: row.reshares,
                comments: row.comments,
                timestamp: row.created_at,
            })
            .collect())
    }

    async fn load_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        let row: Option<PostRow> = sqlx::query_as(
            r#"
            SELECT id, post, email, username, name, profile_photo, photo,
                   likes, reshares, comments, created_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.into_iter().next()),
            None => Ok(None),
        }
    }
}

#[async_trait::async_trait]
impl Repository for PostgresRepository {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn create_post(&self, new_post: NewPost) -> Result<Post> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO posts (post, email, username, name, profile_photo, photo)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&new_post.post)
        .bind(&new_post.email)
        .bind(new_post.username.as_deref().unwrap_or(""))
        .bind(new_post.name.as_deref().unwrap_or(""))
        .bind(&new_post.profile_photo)
        .bind(&new_post.photo)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert post")?;

        self.load_post(id)
            .await?
            .context("Post missing immediately after insert")
    }

    async fn list_posts(&self) -> Result<Vec<Post>> {
        let rows: Vec<PostRow> = sqlx::query_as(
            r#"
            SELECT id, post, email, username, name, profile_photo, photo,
                   likes, reshares, comments, created_at
            FROM posts
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn posts_by_email(&self, email: &str) -> Result<Vec<Post>> {
        let rows: Vec<PostRow> = sqlx::query_as(
            r#"
            SELECT id, post, email, username, name, profile_photo, photo,
                   likes, reshares, comments, created_at
            FROM posts
            WHERE email = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn get_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        self.load_post(post_id).await
    }

    async fn toggle_like(
        &self,
        post_id: Uuid,
        user_id: &str,
        username: &str,
    ) -> Result<Option<ToggleOutcome>> {
        let mut tx = self.pool.begin().await?;

        // Lock the post row so membership and counter move together.
        let exists: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
                .bind(post_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let inserted: Option<Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO post_likes (post_id, user_id, username)
            VALUES ($1, $2, $3)
            ON CONFLICT (post_id, user_id) DO NOTHING
            RETURNING post_id
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .bind(username)
        .fetch_optional(&mut *tx)
        .await?;

        let liked = inserted.is_some();
        if liked {
            sqlx::query("UPDATE posts SET likes = likes + 1 WHERE id = $1")
                .bind(post_id)
                .execute(&mut *tx)
                .await?;
        } else {
            sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
                .bind(post_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("UPDATE posts SET likes = likes - 1 WHERE id = $1")
                .bind(post_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        let post = self
            .load_post(post_id)
            .await?
            .context("Post missing after like toggle")?;

        Ok(Some(ToggleOutcome {
            engaged: liked,
            post,
        }))
    }

    async fn toggle_reshare(
        &self,
        post_id: Uuid,
        user_id: &str,
        username: &str,
    ) -> Result<Option<ToggleOutcome>> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
                .bind(post_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let inserted: Option<Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO post_reshares (post_id, user_id, username)
            VALUES ($1, $2, $3)
            ON CONFLICT (post_id, user_id) DO NOTHING
            RETURNING post_id
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .bind(username)
        .fetch_optional(&mut *tx)
        .await?;

        let reshared = inserted.is_some();
        if reshared {
            sqlx::query("UPDATE posts SET reshares = reshares + 1 WHERE id = $1")
                .bind(post_id)
                .execute(&mut *tx)
                .await?;
        } else {
            sqlx::query("DELETE FROM post_reshares WHERE post_id = $1 AND user_id = $2")
                .bind(post_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("UPDATE posts SET reshares = reshares - 1 WHERE id = $1")
                .bind(post_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        let post = self
            .load_post(post_id)
            .await?
            .context("Post missing after reshare toggle")?;

        Ok(Some(ToggleOutcome {
            engaged: reshared,
            post,
        }))
    }

    async fn add_comment(
        &self,
        post_id: Uuid,
        new_comment: NewComment,
    ) -> Result<Option<CommentOutcome>> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
                .bind(post_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let comment: Comment = sqlx::query_as(
            r#"
            INSERT INTO post_comments (post_id, user_id, username, commenter_name, body)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id AS comment_id, user_id, username, body AS comment,
                      commenter_name, created_at AS timestamp
            "#,
        )
        .bind(post_id)
        .bind(&new_comment.user_id)
        .bind(&new_comment.username)
        .bind(&new_comment.commenter_name)
        .bind(&new_comment.comment)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE posts SET comments = comments + 1 WHERE id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let post = self
            .load_post(post_id)
            .await?
            .context("Post missing after comment append")?;

        Ok(Some(CommentOutcome { comment, post }))
    }

    async fn search_posts(&self, query: &str, limit: i64) -> Result<Vec<Post>> {
        let pattern = format!("%{}%", query);
        let rows: Vec<PostRow> = sqlx::query_as(
            r#"
            SELECT id, post, email, username, name, profile_photo, photo,
                   likes, reshares, comments, created_at
            FROM posts
            WHERE post ILIKE $1 OR name ILIKE $1 OR username ILIKE $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn register_user(&self, new_user: NewUser) -> Result<RegisterOutcome> {
        let email_taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(&new_user.email)
                .fetch_one(&self.pool)
                .await?;
        if email_taken {
            return Ok(RegisterOutcome::EmailTaken);
        }

        let username_taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(&new_user.username)
                .fetch_one(&self.pool)
                .await?;
        if username_taken {
            return Ok(RegisterOutcome::UsernameTaken);
        }

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO users (email, username, name, profile_image)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&new_user.email)
        .bind(&new_user.username)
        .bind(&new_user.name)
        .bind(&new_user.profile_image)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert user")?;

        Ok(RegisterOutcome::Created(id))
    }

    async fn update_profile(&self, email: &str, update: ProfileUpdate) -> Result<Vec<String>> {
        let fields = update.updated_fields();

        sqlx::query(
            r#"
            INSERT INTO users (email, username, name, bio, location, website, dob,
                               profile_image, cover_image)
            VALUES ($1, $2, $3, COALESCE($4, ''), COALESCE($5, ''), COALESCE($6, ''),
                    COALESCE($7, ''), $8, $9)
            ON CONFLICT (email) DO UPDATE SET
                username      = COALESCE($2, users.username),
                name          = COALESCE($3, users.name),
                bio           = COALESCE($4, users.bio),
                location      = COALESCE($5, users.location),
                website       = COALESCE($6, users.website),
                dob           = COALESCE($7, users.dob),
                profile_image = COALESCE($8, users.profile_image),
                cover_image   = COALESCE($9, users.cover_image)
            "#,
        )
        .bind(email)
        .bind(&update.username)
        .bind(&update.name)
        .bind(&update.bio)
        .bind(&update.location)
        .bind(&update.website)
        .bind(&update.dob)
        .bind(&update.profile_image)
        .bind(&update.cover_image)
        .execute(&self.pool)
        .await
        .context("Failed to update profile")?;

        Ok(fields)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user: Option<User> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user: Option<User> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn search_users(&self, query: &str, limit: i64) -> Result<Vec<User>> {
        let pattern = format!("%{}%", query);
        let users: Vec<User> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE name ILIKE $1 OR username ILIKE $1 OR email ILIKE $1 \
             LIMIT $2"
        ))
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn suggested_users(&self, exclude: &[String], limit: i64) -> Result<Vec<User>> {
        let users: Vec<User> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE NOT (email = ANY($1)) \
             ORDER BY created_at DESC \
             LIMIT $2"
        ))
        .bind(exclude)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn delete_account(&self, email: &str) -> Result<DeletionReport> {
        let mut tx = self.pool.begin().await?;

        let posts_deleted = sqlx::query("DELETE FROM posts WHERE email = $1")
            .bind(email)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let user_deleted = sqlx::query("DELETE FROM users WHERE email = $1")
            .bind(email)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        sqlx::query("DELETE FROM verification_tokens WHERE email = $1")
            .bind(email)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO deleted_accounts (email, user_deleted, posts_deleted)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(email)
        .bind(user_deleted)
        .bind(posts_deleted as i64)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(DeletionReport {
            user_deleted,
            posts_deleted,
        })
    }

    async fn record_force_delete(&self, email: &str) -> Result<()> {
        sqlx::query("INSERT INTO deleted_accounts (email, force_deleted) VALUES ($1, TRUE)")
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_follow(&self, edge: NewFollow) -> Result<FollowOutcome> {
        let mut tx = self.pool.begin().await?;

        let inserted: Option<String> = sqlx::query_scalar(
            r#"
            INSERT INTO follows (follower_email, following_email, follower_name,
                                 follower_username, following_name, following_username)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (follower_email, following_email) DO NOTHING
            RETURNING follower_email
            "#,
        )
        .bind(&edge.follower_email)
        .bind(&edge.following_email)
        .bind(edge.follower_name.as_deref().unwrap_or(""))
        .bind(edge.follower_username.as_deref().unwrap_or(""))
        .bind(edge.following_name.as_deref().unwrap_or(""))
        .bind(edge.following_username.as_deref().unwrap_or(""))
        .fetch_optional(&mut *tx)
        .await?;

        if inserted.is_none() {
            return Ok(FollowOutcome::AlreadyFollowing);
        }

        // Edge and both counters commit together.
        sqlx::query("UPDATE users SET followers = followers + 1 WHERE email = $1")
            .bind(&edge.following_email)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE users SET following = following + 1 WHERE email = $1")
            .bind(&edge.follower_email)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(FollowOutcome::Created)
    }

    async fn delete_follow(&self, follower_email: &str, following_email: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(
            "DELETE FROM follows WHERE follower_email = $1 AND following_email = $2",
        )
        .bind(follower_email)
        .bind(following_email)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if deleted == 0 {
            return Ok(false);
        }

        sqlx::query("UPDATE users SET followers = followers - 1 WHERE email = $1")
            .bind(following_email)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE users SET following = following - 1 WHERE email = $1")
            .bind(follower_email)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(true)
    }

    async fn is_following(&self, follower_email: &str, following_email: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM follows
                WHERE follower_email = $1 AND following_email = $2
            )
            "#,
        )
        .bind(follower_email)
        .bind(following_email)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn followers_count(&self, email: &str) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE following_email = $1")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn following_count(&self, email: &str) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE follower_email = $1")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn following_users(&self, email: &str) -> Result<Vec<User>> {
        let users: Vec<User> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE email IN (SELECT following_email FROM follows WHERE follower_email = $1)"
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn following_emails(&self, email: &str) -> Result<Vec<String>> {
        let emails: Vec<String> =
            sqlx::query_scalar("SELECT following_email FROM follows WHERE follower_email = $1")
                .bind(email)
                .fetch_all(&self.pool)
                .await?;
        Ok(emails)
    }

    async fn create_verification_token(
        &self,
        email: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO verification_tokens (email, token, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(email)
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn consume_verification_token(&self, email: &str, token: &str) -> Result<VerifyOutcome> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(Uuid, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT id, expires_at FROM verification_tokens
            WHERE email = $1 AND token = $2 AND verified = FALSE
            "#,
        )
        .bind(email)
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?;

        let (id, expires_at) = match row {
            Some(row) => row,
            None => return Ok(VerifyOutcome::Invalid),
        };

        if Utc::now() > expires_at {
            return Ok(VerifyOutcome::Expired);
        }

        sqlx::query(
            "UPDATE verification_tokens SET verified = TRUE, verified_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE users SET email_verified = TRUE, email_verified_at = NOW() WHERE email = $1",
        )
        .bind(email)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(VerifyOutcome::Verified)
    }

    async fn email_verified(&self, email: &str) -> Result<bool> {
        let verified: Option<bool> =
            sqlx::query_scalar("SELECT email_verified FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(verified.unwrap_or(false))
    }

    async fn create_login_otp(
        &self,
        email: &str,
        otp: &str,
        expires_at: DateTime<Utc>,
        device_info: Option<serde_json::Value>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO login_otps (email, otp, expires_at, device_info)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(email)
        .bind(otp)
        .bind(expires_at)
        .bind(device_info)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn consume_login_otp(&self, email: &str, otp: &str) -> Result<VerifyOutcome> {
        let row: Option<(Uuid, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT id, expires_at FROM login_otps
            WHERE email = $1 AND otp = $2 AND verified = FALSE
            "#,
        )
        .bind(email)
        .bind(otp)
        .fetch_optional(&self.pool)
        .await?;

        let (id, expires_at) = match row {
            Some(row) => row,
            None => return Ok(VerifyOutcome::Invalid),
        };

        if Utc::now() > expires_at {
            return Ok(VerifyOutcome::Expired);
        }

        sqlx::query("UPDATE login_otps SET verified = TRUE, verified_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(VerifyOutcome::Verified)
    }

    async fn create_password_reset(
        &self,
        email: &str,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // A new request invalidates anything outstanding.
        sqlx::query(
            "UPDATE password_resets SET used = TRUE, used_at = NOW() \
             WHERE email = $1 AND used = FALSE",
        )
        .bind(email)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO password_resets (email, token_hash, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(email)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn reset_token_email(&self, token_hash: &str) -> Result<Option<String>> {
        let email: Option<String> = sqlx::query_scalar(
            r#"
            SELECT email FROM password_resets
            WHERE token_hash = $1 AND used = FALSE AND expires_at > NOW()
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(email)
    }

    async fn consume_password_reset(&self, token_hash: &str) -> Result<bool> {
        let affected = sqlx::query(
            r#"
            UPDATE password_resets
            SET used = TRUE, used_at = NOW()
            WHERE token_hash = $1 AND used = FALSE AND expires_at > NOW()
            "#,
        )
        .bind(token_hash)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(affected > 0)
    }

    async fn clear_password_resets(&self, email: &str) -> Result<u64> {
        let affected = sqlx::query(
            "UPDATE password_resets SET used = TRUE, used_at = NOW() \
             WHERE email = $1 AND used = FALSE",
        )
        .bind(email)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(affected)
    }

    async fn record_login(&self, attempt: NewLoginRecord) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO login_history (email, browser, os, device_type, ip_address,
                                       user_agent, timezone, language, screen,
                                       login_success, auth_method, failure_reason, session_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id
            "#,
        )
        .bind(&attempt.email)
        .bind(&attempt.device.browser)
        .bind(&attempt.device.os)
        .bind(&attempt.device.device_type)
        .bind(&attempt.device.ip_address)
        .bind(&attempt.device.user_agent)
        .bind(&attempt.device.timezone)
        .bind(&attempt.device.language)
        .bind(&attempt.device.screen)
        .bind(attempt.login_success)
        .bind(&attempt.auth_method)
        .bind(&attempt.failure_reason)
        .bind(&attempt.device.session_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn login_history(
        &self,
        email: &str,
        limit: i64,
        success_only: bool,
    ) -> Result<Vec<LoginRecord>> {
        let filter = if success_only {
            "AND login_success = TRUE"
        } else {
            ""
        };

        let history: Vec<LoginRecord> = sqlx::query_as(&format!(
            "SELECT id, email, browser, os, device_type, ip_address, user_agent, \
                    timezone, language, screen, login_success, auth_method, \
                    failure_reason, session_id, created_at AS timestamp \
             FROM login_history \
             WHERE email = $1 {filter} \
             ORDER BY created_at DESC \
             LIMIT $2"
        ))
        .bind(email)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(history)
    }

    async fn create_message(&self, new_message: NewMessage) -> Result<Message> {
        let message: Message = sqlx::query_as(
            r#"
            INSERT INTO messages (sender, recipient, body)
            VALUES ($1, $2, $3)
            RETURNING id, sender, recipient, body, read, created_at AS timestamp
            "#,
        )
        .bind(&new_message.from)
        .bind(&new_message.to)
        .bind(&new_message.message)
        .fetch_one(&self.pool)
        .await?;
        Ok(message)
    }

    async fn create_list(&self, new_list: NewList) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO lists (owner, name, description)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&new_list.owner)
        .bind(&new_list.name)
        .bind(new_list.description.as_deref().unwrap_or(""))
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn lists_by_owner(&self, owner: &str) -> Result<Vec<List>> {
        let lists: Vec<List> = sqlx::query_as(
            r#"
            SELECT id, owner, name, description, member_count, following_count, created_at
            FROM lists
            WHERE owner = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(lists)
    }
}
