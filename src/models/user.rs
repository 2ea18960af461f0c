use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Student,
    Professor,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: i32,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub name: String,
    pub role: UserRole,
}

impl User {
    pub async fn get_by_id(pool: &PgPool, id: i32) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    pub async fn get_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        email: &str,
        hashed_password: &str,
        name: &str,
        role: UserRole,
    ) -> Result<Self> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, hashed_password, name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(hashed_password)
        .bind(name)
        .bind(role)
        .fetch_one(executor)
        .await?;
        Ok(user)
    }
}
