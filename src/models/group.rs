use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use utoipa::ToSchema;

use crate::types::{GroupCreate, GroupUpdate};

/// Shared terminal-state vocabulary for invitations, join requests and
/// mentorship requests. Pending rows are the only ones that may transition;
/// accepted and rejected are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "proposal_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ProposalStatus {
    /// Accepted and rejected rows never transition again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProposalStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Leader,
    Member,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Group {
    pub id: i32,
    pub name: String,
    pub leader_id: i32,
    pub description: Option<String>,
    pub needed_skills: Vec<String>,
    pub current_members: i32,
    pub max_members: i32,
    pub has_mentor: bool,
    pub mentor_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct MentorSummary {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub research_areas: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GroupWithMentors {
    #[serde(flatten)]
    pub group: Group,
    pub mentors: Vec<MentorSummary>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct GroupMember {
    pub id: i32,
    pub group_id: i32,
    pub student_id: i32,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct GroupInvitation {
    pub id: i32,
    pub group_id: i32,
    pub student_id: i32,
    pub message: Option<String>,
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct GroupJoinRequest {
    pub id: i32,
    pub group_id: i32,
    pub student_id: i32,
    pub message: Option<String>,
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
}

impl Group {
    /// Every membership-adding path checks this before inserting, so
    /// current_members never exceeds max_members.
    pub fn has_capacity(&self) -> bool {
        self.current_members < self.max_members
    }

    pub async fn get(pool: &PgPool, id: i32) -> Result<Option<Self>> {
        let group = sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(group)
    }

    pub async fn get_by_leader(pool: &PgPool, leader_id: i32) -> Result<Option<Self>> {
        let group = sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE leader_id = $1")
            .bind(leader_id)
            .fetch_optional(pool)
            .await?;
        Ok(group)
    }

    pub async fn list(pool: &PgPool, skip: i64, limit: i64) -> Result<Vec<Self>> {
        let groups = sqlx::query_as::<_, Group>("SELECT * FROM groups ORDER BY id OFFSET $1 LIMIT $2")
            .bind(skip)
            .bind(limit)
            .fetch_all(pool)
            .await?;
        Ok(groups)
    }

    pub async fn list_for_student(pool: &PgPool, student_id: i32) -> Result<Vec<Self>> {
        let groups = sqlx::query_as::<_, Group>(
            r#"
            SELECT g.* FROM groups g
            JOIN group_members gm ON gm.group_id = g.id
            WHERE gm.student_id = $1
            ORDER BY g.id
            "#,
        )
        .bind(student_id)
        .fetch_all(pool)
        .await?;
        Ok(groups)
    }

    /// Create a group and seed its roster with the leader. current_members
    /// starts at 1 because the leader is always a member.
    pub async fn create(pool: &PgPool, leader_id: i32, data: &GroupCreate) -> Result<Self> {
        let mut tx = pool.begin().await?;

        let group = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO groups (name, leader_id, description, needed_skills, current_members, max_members)
            VALUES ($1, $2, $3, $4, 1, $5)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(leader_id)
        .bind(&data.description)
        .bind(data.needed_skills.clone().unwrap_or_default())
        .bind(data.max_members)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO group_members (group_id, student_id, role) VALUES ($1, $2, 'leader')",
        )
        .bind(group.id)
        .bind(leader_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(group)
    }

    pub async fn update(pool: &PgPool, id: i32, data: &GroupUpdate) -> Result<Option<Self>> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            UPDATE groups SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                needed_skills = COALESCE($4, needed_skills),
                max_members = COALESCE($5, max_members)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.needed_skills)
        .bind(data.max_members)
        .fetch_optional(pool)
        .await?;
        Ok(group)
    }

    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn members(pool: &PgPool, group_id: i32) -> Result<Vec<GroupMember>> {
        let members = sqlx::query_as::<_, GroupMember>(
            "SELECT * FROM group_members WHERE group_id = $1 ORDER BY joined_at",
        )
        .bind(group_id)
        .fetch_all(pool)
        .await?;
        Ok(members)
    }

    pub async fn is_member(pool: &PgPool, group_id: i32, student_id: i32) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM group_members WHERE group_id = $1 AND student_id = $2)",
        )
        .bind(group_id)
        .bind(student_id)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    pub async fn mentors(pool: &PgPool, group_id: i32) -> Result<Vec<MentorSummary>> {
        let mentors = sqlx::query_as::<_, MentorSummary>(
            r#"
            SELECT p.id, u.name, u.email, p.department, p.research_areas
            FROM group_mentors gm
            JOIN professors p ON p.id = gm.professor_id
            JOIN users u ON u.id = p.user_id
            WHERE gm.group_id = $1
            ORDER BY p.id
            "#,
        )
        .bind(group_id)
        .fetch_all(pool)
        .await?;
        Ok(mentors)
    }

    pub async fn with_mentors(self, pool: &PgPool) -> Result<GroupWithMentors> {
        let mentors = if self.has_mentor {
            Group::mentors(pool, self.id).await?
        } else {
            Vec::new()
        };
        Ok(GroupWithMentors {
            group: self,
            mentors,
        })
    }

    /// Add a student to the roster, capacity-gated. Returns None when the
    /// group is missing or already full.
    pub async fn add_member(
        pool: &PgPool,
        group_id: i32,
        student_id: i32,
    ) -> Result<Option<GroupMember>> {
        let mut tx = pool.begin().await?;

        let group = sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE id = $1")
            .bind(group_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(group) = group else {
            return Ok(None);
        };
        if !group.has_capacity() {
            return Ok(None);
        }

        let member = sqlx::query_as::<_, GroupMember>(
            r#"
            INSERT INTO group_members (group_id, student_id, role)
            VALUES ($1, $2, 'member')
            RETURNING *
            "#,
        )
        .bind(group_id)
        .bind(student_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE groups SET current_members = current_members + 1 WHERE id = $1")
            .bind(group_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(member))
    }

    pub async fn remove_member(pool: &PgPool, group_id: i32, student_id: i32) -> Result<bool> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query("DELETE FROM group_members WHERE group_id = $1 AND student_id = $2")
            .bind(group_id)
            .bind(student_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("UPDATE groups SET current_members = current_members - 1 WHERE id = $1")
            .bind(group_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}

impl GroupInvitation {
    pub async fn get(pool: &PgPool, id: i32) -> Result<Option<Self>> {
        let invitation =
            sqlx::query_as::<_, GroupInvitation>("SELECT * FROM group_invitations WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(invitation)
    }

    pub async fn create(
        pool: &PgPool,
        group_id: i32,
        student_id: i32,
        message: Option<&str>,
    ) -> Result<Self> {
        let invitation = sqlx::query_as::<_, GroupInvitation>(
            r#"
            INSERT INTO group_invitations (group_id, student_id, message)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(group_id)
        .bind(student_id)
        .bind(message)
        .fetch_one(pool)
        .await?;
        Ok(invitation)
    }

    pub async fn pending_for(
        pool: &PgPool,
        group_id: i32,
        student_id: i32,
    ) -> Result<Option<Self>> {
        let invitation = sqlx::query_as::<_, GroupInvitation>(
            r#"
            SELECT * FROM group_invitations
            WHERE group_id = $1 AND student_id = $2 AND status = 'pending'
            "#,
        )
        .bind(group_id)
        .bind(student_id)
        .fetch_optional(pool)
        .await?;
        Ok(invitation)
    }

    pub async fn list_for_student(pool: &PgPool, student_id: i32) -> Result<Vec<Self>> {
        let invitations = sqlx::query_as::<_, GroupInvitation>(
            "SELECT * FROM group_invitations WHERE student_id = $1 ORDER BY created_at DESC",
        )
        .bind(student_id)
        .fetch_all(pool)
        .await?;
        Ok(invitations)
    }

    /// Accept transition: terminal-state the invitation, add the student to
    /// the roster, bump the member count, and mark the driving notification
    /// read, all in one transaction.
    pub async fn accept(pool: &PgPool, id: i32, notification_id: Option<i32>) -> Result<Self> {
        let mut tx = pool.begin().await?;

        let invitation = sqlx::query_as::<_, GroupInvitation>(
            r#"
            UPDATE group_invitations SET status = 'accepted'
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(invitation) = invitation else {
            bail!("Invitation is no longer pending");
        };

        sqlx::query(
            "INSERT INTO group_members (group_id, student_id, role) VALUES ($1, $2, 'member')",
        )
        .bind(invitation.group_id)
        .bind(invitation.student_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE groups SET current_members = current_members + 1 WHERE id = $1")
            .bind(invitation.group_id)
            .execute(&mut *tx)
            .await?;

        if let Some(notification_id) = notification_id {
            sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1")
                .bind(notification_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(invitation)
    }

    pub async fn reject(pool: &PgPool, id: i32, notification_id: Option<i32>) -> Result<Self> {
        let mut tx = pool.begin().await?;

        let invitation = sqlx::query_as::<_, GroupInvitation>(
            r#"
            UPDATE group_invitations SET status = 'rejected'
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(invitation) = invitation else {
            bail!("Invitation is no longer pending");
        };

        if let Some(notification_id) = notification_id {
            sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1")
                .bind(notification_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(invitation)
    }
}

impl GroupJoinRequest {
    pub async fn get(pool: &PgPool, id: i32) -> Result<Option<Self>> {
        let request = sqlx::query_as::<_, GroupJoinRequest>(
            "SELECT * FROM group_join_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(request)
    }

    pub async fn create(
        pool: &PgPool,
        group_id: i32,
        student_id: i32,
        message: Option<&str>,
    ) -> Result<Self> {
        let request = sqlx::query_as::<_, GroupJoinRequest>(
            r#"
            INSERT INTO group_join_requests (group_id, student_id, message)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(group_id)
        .bind(student_id)
        .bind(message)
        .fetch_one(pool)
        .await?;
        Ok(request)
    }

    pub async fn pending_for(
        pool: &PgPool,
        group_id: i32,
        student_id: i32,
    ) -> Result<Option<Self>> {
        let request = sqlx::query_as::<_, GroupJoinRequest>(
            r#"
            SELECT * FROM group_join_requests
            WHERE group_id = $1 AND student_id = $2 AND status = 'pending'
            "#,
        )
        .bind(group_id)
        .bind(student_id)
        .fetch_optional(pool)
        .await?;
        Ok(request)
    }

    pub async fn list_pending_for_group(pool: &PgPool, group_id: i32) -> Result<Vec<Self>> {
        let requests = sqlx::query_as::<_, GroupJoinRequest>(
            r#"
            SELECT * FROM group_join_requests
            WHERE group_id = $1 AND status = 'pending'
            ORDER BY created_at DESC
            "#,
        )
        .bind(group_id)
        .fetch_all(pool)
        .await?;
        Ok(requests)
    }

    pub async fn accept(pool: &PgPool, id: i32, notification_id: Option<i32>) -> Result<Self> {
        let mut tx = pool.begin().await?;

        let request = sqlx::query_as::<_, GroupJoinRequest>(
            r#"
            UPDATE group_join_requests SET status = 'accepted'
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(request) = request else {
            bail!("Join request is no longer pending");
        };

        sqlx::query(
            "INSERT INTO group_members (group_id, student_id, role) VALUES ($1, $2, 'member')",
        )
        .bind(request.group_id)
        .bind(request.student_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE groups SET current_members = current_members + 1 WHERE id = $1")
            .bind(request.group_id)
            .execute(&mut *tx)
            .await?;

        if let Some(notification_id) = notification_id {
            sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1")
                .bind(notification_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(request)
    }

    pub async fn reject(pool: &PgPool, id: i32, notification_id: Option<i32>) -> Result<Self> {
        let mut tx = pool.begin().await?;

        let request = sqlx::query_as::<_, GroupJoinRequest>(
            r#"
            UPDATE group_join_requests SET status = 'rejected'
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(request) = request else {
            bail!("Join request is no longer pending");
        };

        if let Some(notification_id) = notification_id {
            sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1")
                .bind(notification_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_group(current_members: i32, max_members: i32) -> Group {
        Group {
            id: 1,
            name: "Quantum ML".to_string(),
            leader_id: 1,
            description: None,
            needed_skills: vec![],
            current_members,
            max_members,
            has_mentor: false,
            mentor_count: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn capacity_gate_at_boundary() {
        assert!(test_group(2, 3).has_capacity());
        assert!(!test_group(3, 3).has_capacity());
        assert!(!test_group(1, 1).has_capacity());
    }

    #[test]
    fn accepted_joins_never_exceed_max_members() {
        // Every accept path checks has_capacity before incrementing, so a
        // stream of acceptances stops exactly at max_members.
        let mut group = test_group(1, 3);
        let mut accepted = 0;
        for _ in 0..10 {
            if group.has_capacity() {
                group.current_members += 1;
                accepted += 1;
            }
        }
        assert_eq!(accepted, 2);
        assert_eq!(group.current_members, group.max_members);
        assert!(!group.has_capacity());
    }

    #[test]
    fn only_pending_can_transition() {
        assert!(!ProposalStatus::Pending.is_terminal());
        assert!(ProposalStatus::Accepted.is_terminal());
        assert!(ProposalStatus::Rejected.is_terminal());
    }

    #[test]
    fn proposal_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ProposalStatus::Accepted).unwrap(),
            "\"accepted\""
        );
        assert_eq!(
            serde_json::from_str::<ProposalStatus>("\"pending\"").unwrap(),
            ProposalStatus::Pending
        );
    }

    #[test]
    fn proposal_status_as_str_matches_wire_form() {
        for status in [
            ProposalStatus::Pending,
            ProposalStatus::Accepted,
            ProposalStatus::Rejected,
        ] {
            let wire = serde_json::to_string(&status).unwrap();
            assert_eq!(wire, format!("\"{}\"", status.as_str()));
        }
    }
}
