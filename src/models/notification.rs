use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use utoipa::ToSchema;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    pub id: i32,
    pub user_id: i32,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub type_: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub related_group_id: Option<i32>,
    pub related_student_id: Option<i32>,
    pub related_request_id: Option<i32>,
}

/// Everything needed to fan a notification out to one user. Built by the
/// route handlers after a state transition commits.
#[derive(Debug, Clone)]
pub struct NotificationCreate {
    pub user_id: i32,
    pub type_: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub related_group_id: Option<i32>,
    pub related_student_id: Option<i32>,
    pub related_request_id: Option<i32>,
}

impl Notification {
    pub async fn create(pool: &PgPool, data: &NotificationCreate) -> Result<Self> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications
                (user_id, type, title, message, link,
                 related_group_id, related_student_id, related_request_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(data.user_id)
        .bind(&data.type_)
        .bind(&data.title)
        .bind(&data.message)
        .bind(&data.link)
        .bind(data.related_group_id)
        .bind(data.related_student_id)
        .bind(data.related_request_id)
        .fetch_one(pool)
        .await?;

        debug!(
            "Notification {} ({}) created for user {}",
            notification.id, notification.type_, notification.user_id
        );
        Ok(notification)
    }

    pub async fn get_for_user(pool: &PgPool, id: i32, user_id: i32) -> Result<Option<Self>> {
        let notification = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
        Ok(notification)
    }

    pub async fn list_for_user(
        pool: &PgPool,
        user_id: i32,
        unread_only: bool,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Self>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = $1 AND (NOT $2 OR read = FALSE)
            ORDER BY created_at DESC
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(skip)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(notifications)
    }

    pub async fn unread_count(pool: &PgPool, user_id: i32) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    pub async fn mark_read(pool: &PgPool, id: i32, user_id: i32) -> Result<bool> {
        let result =
            sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_read_many(pool: &PgPool, ids: &[i32], user_id: i32) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE id = ANY($1) AND user_id = $2",
        )
        .bind(ids)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(pool: &PgPool, id: i32, user_id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
