use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use utoipa::ToSchema;

use crate::types::{StudentCreate, StudentProfileUpdate, StudentUpdate};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Student {
    pub id: i32,
    pub user_id: i32,
    pub student_id: String,
    pub gpa: Option<f64>,
    pub major: Option<String>,
    pub faculty: Option<String>,
    pub year: Option<String>,
    pub skills: Vec<String>,
    pub bio: Option<String>,
    pub looking_for_group: bool,
}

/// Student row joined with the owning user's name and email.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct StudentWithUser {
    pub id: i32,
    pub user_id: i32,
    pub student_id: String,
    pub gpa: Option<f64>,
    pub major: Option<String>,
    pub faculty: Option<String>,
    pub year: Option<String>,
    pub skills: Vec<String>,
    pub bio: Option<String>,
    pub looking_for_group: bool,
    pub name: String,
    pub email: String,
}

impl Student {
    pub async fn get(pool: &PgPool, id: i32) -> Result<Option<Self>> {
        let student = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(student)
    }

    pub async fn get_by_user_id(pool: &PgPool, user_id: i32) -> Result<Option<Self>> {
        let student = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
        Ok(student)
    }

    pub async fn get_by_student_id(pool: &PgPool, student_id: &str) -> Result<Option<Self>> {
        let student = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE student_id = $1")
            .bind(student_id)
            .fetch_optional(pool)
            .await?;
        Ok(student)
    }

    pub async fn get_with_user(pool: &PgPool, id: i32) -> Result<Option<StudentWithUser>> {
        let student = sqlx::query_as::<_, StudentWithUser>(
            r#"
            SELECT s.*, u.name, u.email
            FROM students s
            JOIN users u ON u.id = s.user_id
            WHERE s.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(student)
    }

    /// List students joined with user data. All filters are optional; a skill
    /// filter matches array containment.
    pub async fn search(
        pool: &PgPool,
        faculty: Option<&str>,
        year: Option<&str>,
        skill: Option<&str>,
        looking_for_group: Option<bool>,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<StudentWithUser>> {
        let students = sqlx::query_as::<_, StudentWithUser>(
            r#"
            SELECT s.*, u.name, u.email
            FROM students s
            JOIN users u ON u.id = s.user_id
            WHERE ($1::text IS NULL OR s.faculty = $1)
              AND ($2::text IS NULL OR s.year = $2)
              AND ($3::text IS NULL OR $3 = ANY(s.skills))
              AND ($4::boolean IS NULL OR s.looking_for_group = $4)
            ORDER BY s.id
            OFFSET $5 LIMIT $6
            "#,
        )
        .bind(faculty)
        .bind(year)
        .bind(skill)
        .bind(looking_for_group)
        .bind(skip)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(students)
    }

    pub async fn create<'e, E: PgExecutor<'e>>(executor: E, data: &StudentCreate) -> Result<Self> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students
                (user_id, student_id, gpa, major, faculty, year, skills, bio, looking_for_group)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(data.user_id)
        .bind(&data.student_id)
        .bind(data.gpa)
        .bind(&data.major)
        .bind(&data.faculty)
        .bind(&data.year)
        .bind(data.skills.clone().unwrap_or_default())
        .bind(&data.bio)
        .bind(data.looking_for_group.unwrap_or(true))
        .fetch_one(executor)
        .await?;
        Ok(student)
    }

    pub async fn update(pool: &PgPool, id: i32, data: &StudentUpdate) -> Result<Option<Self>> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            UPDATE students SET
                gpa = COALESCE($2, gpa),
                major = COALESCE($3, major),
                faculty = COALESCE($4, faculty),
                year = COALESCE($5, year),
                skills = COALESCE($6, skills),
                bio = COALESCE($7, bio),
                looking_for_group = COALESCE($8, looking_for_group)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.gpa)
        .bind(&data.major)
        .bind(&data.faculty)
        .bind(&data.year)
        .bind(&data.skills)
        .bind(&data.bio)
        .bind(data.looking_for_group)
        .fetch_optional(pool)
        .await?;
        Ok(student)
    }

    /// Self-service profile update, restricted to the fields a student may
    /// change about themselves.
    pub async fn update_profile(
        pool: &PgPool,
        id: i32,
        data: &StudentProfileUpdate,
    ) -> Result<Option<Self>> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            UPDATE students SET
                bio = COALESCE($2, bio),
                skills = COALESCE($3, skills),
                looking_for_group = COALESCE($4, looking_for_group)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.bio)
        .bind(&data.skills)
        .bind(data.looking_for_group)
        .fetch_optional(pool)
        .await?;
        Ok(student)
    }

    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
