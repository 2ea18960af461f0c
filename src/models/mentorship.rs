use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use utoipa::ToSchema;

use crate::models::group::ProposalStatus;

/// Canned reason applied to the pending requests that lose the race when a
/// group fills its second mentor slot.
pub const OTHER_MENTOR_SELECTED: &str =
    "Another professor was selected as mentor for this group.";

/// Upper bound on both accepted mentors and concurrently pending requests
/// per group.
pub const MAX_MENTORS_PER_GROUP: i32 = 2;

pub fn reached_mentor_cap(mentor_count: i32) -> bool {
    mentor_count >= MAX_MENTORS_PER_GROUP
}

/// Gates on creating a new request: mentor room left in the group, an open
/// slot on the professor, and the group under its pending-request limit.
pub fn request_preconditions(
    mentor_count: i32,
    available_slots: i32,
    pending_count: i64,
) -> Result<(), &'static str> {
    if reached_mentor_cap(mentor_count) {
        return Err("Group already has the maximum number of mentors");
    }
    if available_slots <= 0 {
        return Err("Professor has no available slots");
    }
    if pending_count >= MAX_MENTORS_PER_GROUP as i64 {
        return Err("Group already has the maximum number of pending mentorship requests");
    }
    Ok(())
}

/// Gates re-checked at accept time; the professor's slots or the group's
/// mentor roster may have changed since the request was created.
pub fn accept_preconditions(mentor_count: i32, available_slots: i32) -> Result<(), &'static str> {
    if available_slots <= 0 {
        return Err("No available mentorship slots");
    }
    if reached_mentor_cap(mentor_count) {
        return Err("Group already has the maximum number of mentors");
    }
    Ok(())
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct MentorshipRequest {
    pub id: i32,
    pub group_id: i32,
    pub professor_id: i32,
    pub requested_by: i32,
    pub message: String,
    pub status: ProposalStatus,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

/// Request row enriched with group and requester context, as shown on the
/// professor's inbox.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct MentorshipRequestWithDetails {
    pub id: i32,
    pub group_id: i32,
    pub professor_id: i32,
    pub requested_by: i32,
    pub message: String,
    pub status: ProposalStatus,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub group_name: String,
    pub group_description: Option<String>,
    pub group_needed_skills: Vec<String>,
    pub requester_name: String,
    pub requester_email: String,
}

impl MentorshipRequest {
    pub async fn get(pool: &PgPool, id: i32) -> Result<Option<Self>> {
        let request =
            sqlx::query_as::<_, MentorshipRequest>("SELECT * FROM mentorship_requests WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(request)
    }

    pub async fn create(
        pool: &PgPool,
        group_id: i32,
        professor_id: i32,
        requested_by: i32,
        message: &str,
    ) -> Result<Self> {
        let request = sqlx::query_as::<_, MentorshipRequest>(
            r#"
            INSERT INTO mentorship_requests (group_id, professor_id, requested_by, message)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(group_id)
        .bind(professor_id)
        .bind(requested_by)
        .bind(message)
        .fetch_one(pool)
        .await?;
        Ok(request)
    }

    pub async fn list_for_professor(
        pool: &PgPool,
        professor_id: i32,
        status: Option<ProposalStatus>,
    ) -> Result<Vec<MentorshipRequestWithDetails>> {
        let requests = sqlx::query_as::<_, MentorshipRequestWithDetails>(
            r#"
            SELECT r.*,
                   g.name AS group_name,
                   g.description AS group_description,
                   g.needed_skills AS group_needed_skills,
                   u.name AS requester_name,
                   u.email AS requester_email
            FROM mentorship_requests r
            JOIN groups g ON g.id = r.group_id
            JOIN students s ON s.id = r.requested_by
            JOIN users u ON u.id = s.user_id
            WHERE r.professor_id = $1
              AND ($2::proposal_status IS NULL OR r.status = $2)
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(professor_id)
        .bind(status)
        .fetch_all(pool)
        .await?;
        Ok(requests)
    }

    pub async fn list_for_group(pool: &PgPool, group_id: i32) -> Result<Vec<Self>> {
        let requests = sqlx::query_as::<_, MentorshipRequest>(
            "SELECT * FROM mentorship_requests WHERE group_id = $1 ORDER BY created_at DESC",
        )
        .bind(group_id)
        .fetch_all(pool)
        .await?;
        Ok(requests)
    }

    pub async fn pending_count_for_group(pool: &PgPool, group_id: i32) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM mentorship_requests WHERE group_id = $1 AND status = 'pending'",
        )
        .bind(group_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    pub async fn pending_to_professor(
        pool: &PgPool,
        group_id: i32,
        professor_id: i32,
    ) -> Result<Option<Self>> {
        let request = sqlx::query_as::<_, MentorshipRequest>(
            r#"
            SELECT * FROM mentorship_requests
            WHERE group_id = $1 AND professor_id = $2 AND status = 'pending'
            "#,
        )
        .bind(group_id)
        .bind(professor_id)
        .fetch_optional(pool)
        .await?;
        Ok(request)
    }

    /// Accept transition, one transaction: terminal-state the request, link
    /// the professor as a mentor, bump the group's mentor_count, consume one
    /// of the professor's slots, and when the group reaches its mentor cap
    /// bulk-reject every other pending request for it.
    pub async fn accept(pool: &PgPool, id: i32) -> Result<Self> {
        let mut tx = pool.begin().await?;

        let request = sqlx::query_as::<_, MentorshipRequest>(
            r#"
            UPDATE mentorship_requests SET status = 'accepted', responded_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(request) = request else {
            bail!("Mentorship request is no longer pending");
        };

        sqlx::query("INSERT INTO group_mentors (group_id, professor_id) VALUES ($1, $2)")
            .bind(request.group_id)
            .bind(request.professor_id)
            .execute(&mut *tx)
            .await?;

        let mentor_count = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE groups SET has_mentor = TRUE, mentor_count = mentor_count + 1
            WHERE id = $1
            RETURNING mentor_count
            "#,
        )
        .bind(request.group_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE professors SET available_slots = available_slots - 1 WHERE id = $1")
            .bind(request.professor_id)
            .execute(&mut *tx)
            .await?;

        if reached_mentor_cap(mentor_count) {
            sqlx::query(
                r#"
                UPDATE mentorship_requests
                SET status = 'rejected', rejection_reason = $3, responded_at = NOW()
                WHERE group_id = $1 AND status = 'pending' AND id != $2
                "#,
            )
            .bind(request.group_id)
            .bind(request.id)
            .bind(OTHER_MENTOR_SELECTED)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(request)
    }

    pub async fn reject(pool: &PgPool, id: i32, rejection_reason: &str) -> Result<Self> {
        let request = sqlx::query_as::<_, MentorshipRequest>(
            r#"
            UPDATE mentorship_requests
            SET status = 'rejected', rejection_reason = $2, responded_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(rejection_reason)
        .fetch_optional(pool)
        .await?;
        match request {
            Some(request) => Ok(request),
            None => bail!("Mentorship request is no longer pending"),
        }
    }

    /// Withdrawal deletes the row outright and is only legal while pending.
    pub async fn withdraw(pool: &PgPool, id: i32) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM mentorship_requests WHERE id = $1 AND status = 'pending'")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_reached_at_exactly_two_mentors() {
        assert!(!reached_mentor_cap(0));
        assert!(!reached_mentor_cap(1));
        assert!(reached_mentor_cap(2));
        assert!(reached_mentor_cap(3));
    }

    #[test]
    fn new_requests_blocked_once_cap_or_slots_exhausted() {
        assert!(request_preconditions(1, 3, 1).is_ok());
        assert_eq!(
            request_preconditions(2, 3, 0),
            Err("Group already has the maximum number of mentors")
        );
        assert_eq!(
            request_preconditions(0, 0, 0),
            Err("Professor has no available slots")
        );
        assert_eq!(
            request_preconditions(1, 3, 2),
            Err("Group already has the maximum number of pending mentorship requests")
        );
    }

    #[test]
    fn accept_blocked_without_slot_or_mentor_room() {
        assert!(accept_preconditions(1, 1).is_ok());
        assert_eq!(accept_preconditions(1, 0), Err("No available mentorship slots"));
        assert_eq!(
            accept_preconditions(2, 5),
            Err("Group already has the maximum number of mentors")
        );
    }
}
