use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use utoipa::ToSchema;

use crate::types::{ProfessorCreate, ProfessorProfileUpdate, ProfessorUpdate};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Professor {
    pub id: i32,
    pub user_id: i32,
    pub professor_id: String,
    pub faculty: Option<String>,
    pub field: Option<String>,
    pub department: Option<String>,
    pub research_areas: Vec<String>,
    pub research_interests: Vec<String>,
    pub achievements: Option<String>,
    pub publications: i32,
    pub bio: Option<String>,
    pub available_slots: i32,
    pub total_slots: i32,
}

#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct ProfessorWithUser {
    pub id: i32,
    pub user_id: i32,
    pub professor_id: String,
    pub faculty: Option<String>,
    pub field: Option<String>,
    pub department: Option<String>,
    pub research_areas: Vec<String>,
    pub research_interests: Vec<String>,
    pub achievements: Option<String>,
    pub publications: i32,
    pub bio: Option<String>,
    pub available_slots: i32,
    pub total_slots: i32,
    pub name: String,
    pub email: String,
}

impl Professor {
    pub async fn get(pool: &PgPool, id: i32) -> Result<Option<Self>> {
        let professor = sqlx::query_as::<_, Professor>("SELECT * FROM professors WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(professor)
    }

    pub async fn get_by_user_id(pool: &PgPool, user_id: i32) -> Result<Option<Self>> {
        let professor =
            sqlx::query_as::<_, Professor>("SELECT * FROM professors WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(pool)
                .await?;
        Ok(professor)
    }

    pub async fn get_by_professor_id(pool: &PgPool, professor_id: &str) -> Result<Option<Self>> {
        let professor =
            sqlx::query_as::<_, Professor>("SELECT * FROM professors WHERE professor_id = $1")
                .bind(professor_id)
                .fetch_optional(pool)
                .await?;
        Ok(professor)
    }

    pub async fn get_with_user(pool: &PgPool, id: i32) -> Result<Option<ProfessorWithUser>> {
        let professor = sqlx::query_as::<_, ProfessorWithUser>(
            r#"
            SELECT p.*, u.name, u.email
            FROM professors p
            JOIN users u ON u.id = p.user_id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(professor)
    }

    pub async fn search(
        pool: &PgPool,
        faculty: Option<&str>,
        research_area: Option<&str>,
        available_only: bool,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<ProfessorWithUser>> {
        let professors = sqlx::query_as::<_, ProfessorWithUser>(
            r#"
            SELECT p.*, u.name, u.email
            FROM professors p
            JOIN users u ON u.id = p.user_id
            WHERE ($1::text IS NULL OR p.faculty = $1)
              AND ($2::text IS NULL OR $2 = ANY(p.research_areas))
              AND (NOT $3 OR p.available_slots > 0)
            ORDER BY p.id
            OFFSET $4 LIMIT $5
            "#,
        )
        .bind(faculty)
        .bind(research_area)
        .bind(available_only)
        .bind(skip)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(professors)
    }

    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        data: &ProfessorCreate,
    ) -> Result<Self> {
        let professor = sqlx::query_as::<_, Professor>(
            r#"
            INSERT INTO professors
                (user_id, professor_id, faculty, field, department, research_areas,
                 research_interests, achievements, publications, bio, available_slots, total_slots)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(data.user_id)
        .bind(&data.professor_id)
        .bind(&data.faculty)
        .bind(&data.field)
        .bind(&data.department)
        .bind(data.research_areas.clone().unwrap_or_default())
        .bind(data.research_interests.clone().unwrap_or_default())
        .bind(&data.achievements)
        .bind(data.publications.unwrap_or(0))
        .bind(&data.bio)
        .bind(data.available_slots.unwrap_or(5))
        .bind(data.total_slots.unwrap_or(5))
        .fetch_one(executor)
        .await?;
        Ok(professor)
    }

    pub async fn update(pool: &PgPool, id: i32, data: &ProfessorUpdate) -> Result<Option<Self>> {
        let professor = sqlx::query_as::<_, Professor>(
            r#"
            UPDATE professors SET
                faculty = COALESCE($2, faculty),
                field = COALESCE($3, field),
                department = COALESCE($4, department),
                research_areas = COALESCE($5, research_areas),
                research_interests = COALESCE($6, research_interests),
                achievements = COALESCE($7, achievements),
                publications = COALESCE($8, publications),
                bio = COALESCE($9, bio),
                available_slots = COALESCE($10, available_slots),
                total_slots = COALESCE($11, total_slots)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.faculty)
        .bind(&data.field)
        .bind(&data.department)
        .bind(&data.research_areas)
        .bind(&data.research_interests)
        .bind(&data.achievements)
        .bind(data.publications)
        .bind(&data.bio)
        .bind(data.available_slots)
        .bind(data.total_slots)
        .fetch_optional(pool)
        .await?;
        Ok(professor)
    }

    /// Self-service profile update. Shrinking total_slots clamps
    /// available_slots so it never exceeds the new total.
    pub async fn update_profile(
        pool: &PgPool,
        id: i32,
        data: &ProfessorProfileUpdate,
    ) -> Result<Option<Self>> {
        let professor = sqlx::query_as::<_, Professor>(
            r#"
            UPDATE professors SET
                bio = COALESCE($2, bio),
                research_interests = COALESCE($3, research_interests),
                total_slots = COALESCE($4, total_slots),
                available_slots = LEAST(available_slots, COALESCE($4, total_slots))
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.bio)
        .bind(&data.research_interests)
        .bind(data.total_slots)
        .fetch_optional(pool)
        .await?;
        Ok(professor)
    }

    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM professors WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
