use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use utoipa::ToSchema;

/// Chat senders are identified by profile id plus kind rather than a single
/// foreign key, because both students and professor mentors post into the
/// same log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "sender_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    Student,
    Professor,
}

pub const DELETED_MESSAGE_TEXT: &str = "[Message deleted]";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct GroupChatMessage {
    pub id: i32,
    pub group_id: i32,
    pub sender_id: i32,
    pub sender_type: SenderType,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

/// Message as rendered to a particular reader: sender display name resolved
/// through the owning user, is_read relative to the requesting user.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct ChatMessageView {
    pub id: i32,
    pub group_id: i32,
    pub sender_id: i32,
    pub sender_type: SenderType,
    pub sender_name: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub is_read: bool,
}

impl GroupChatMessage {
    /// Resolve the caller's chat identity in a group: student members and
    /// professor mentors may participate, nobody else.
    pub async fn group_access(
        pool: &PgPool,
        user_id: i32,
        group_id: i32,
    ) -> Result<Option<(SenderType, i32)>> {
        let student_id = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT s.id FROM students s
            JOIN group_members gm ON gm.student_id = s.id
            WHERE s.user_id = $1 AND gm.group_id = $2
            "#,
        )
        .bind(user_id)
        .bind(group_id)
        .fetch_optional(pool)
        .await?;
        if let Some(student_id) = student_id {
            return Ok(Some((SenderType::Student, student_id)));
        }

        let professor_id = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT p.id FROM professors p
            JOIN group_mentors gm ON gm.professor_id = p.id
            WHERE p.user_id = $1 AND gm.group_id = $2
            "#,
        )
        .bind(user_id)
        .bind(group_id)
        .fetch_optional(pool)
        .await?;
        if let Some(professor_id) = professor_id {
            return Ok(Some((SenderType::Professor, professor_id)));
        }

        Ok(None)
    }

    pub async fn get(pool: &PgPool, id: i32) -> Result<Option<Self>> {
        let message = sqlx::query_as::<_, GroupChatMessage>(
            "SELECT * FROM group_chat_messages WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(message)
    }

    pub async fn create(
        pool: &PgPool,
        group_id: i32,
        sender_id: i32,
        sender_type: SenderType,
        message: &str,
    ) -> Result<Self> {
        let message = sqlx::query_as::<_, GroupChatMessage>(
            r#"
            INSERT INTO group_chat_messages (group_id, sender_id, sender_type, message)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(group_id)
        .bind(sender_id)
        .bind(sender_type)
        .bind(message)
        .fetch_one(pool)
        .await?;
        Ok(message)
    }

    /// Non-deleted messages in chronological order, with sender names and
    /// the requesting user's read flags resolved in one query.
    pub async fn list_views(
        pool: &PgPool,
        group_id: i32,
        user_id: i32,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<ChatMessageView>> {
        let messages = sqlx::query_as::<_, ChatMessageView>(
            r#"
            SELECT m.id, m.group_id, m.sender_id, m.sender_type,
                   COALESCE(u.name, 'Unknown') AS sender_name,
                   m.message, m.created_at, m.edited_at, m.is_deleted,
                   (r.id IS NOT NULL) AS is_read
            FROM group_chat_messages m
            LEFT JOIN students s ON m.sender_type = 'student' AND s.id = m.sender_id
            LEFT JOIN professors p ON m.sender_type = 'professor' AND p.id = m.sender_id
            LEFT JOIN users u ON u.id = COALESCE(s.user_id, p.user_id)
            LEFT JOIN message_read_status r ON r.message_id = m.id AND r.user_id = $2
            WHERE m.group_id = $1 AND m.is_deleted = FALSE
            ORDER BY m.created_at ASC
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(skip)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(messages)
    }

    pub async fn edit(pool: &PgPool, id: i32, text: &str) -> Result<Option<Self>> {
        let message = sqlx::query_as::<_, GroupChatMessage>(
            r#"
            UPDATE group_chat_messages SET message = $2, edited_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(text)
        .fetch_optional(pool)
        .await?;
        Ok(message)
    }

    /// Soft delete: the row survives as a tombstone so read markers and
    /// ordering stay intact.
    pub async fn soft_delete(pool: &PgPool, id: i32) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE group_chat_messages SET is_deleted = TRUE, message = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(DELETED_MESSAGE_TEXT)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Idempotent: a repeated read mark is a no-op.
    pub async fn mark_read(pool: &PgPool, message_id: i32, user_id: i32) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO message_read_status (message_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (message_id, user_id) DO NOTHING
            "#,
        )
        .bind(message_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn mark_all_read(pool: &PgPool, group_id: i32, user_id: i32) -> Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO message_read_status (message_id, user_id)
            SELECT m.id, $2 FROM group_chat_messages m
            WHERE m.group_id = $1 AND m.is_deleted = FALSE
            ON CONFLICT (message_id, user_id) DO NOTHING
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Unread = non-deleted messages in the group minus the rows this user
    /// has read.
    pub async fn unread_count(pool: &PgPool, group_id: i32, user_id: i32) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM group_chat_messages m
            WHERE m.group_id = $1 AND m.is_deleted = FALSE
              AND NOT EXISTS (
                  SELECT 1 FROM message_read_status r
                  WHERE r.message_id = m.id AND r.user_id = $2
              )
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }
}
