use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use utoipa::ToSchema;

use crate::types::{ResearchPaperCreate, ResearchPaperUpdate};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct ResearchPaper {
    pub id: i32,
    pub paper_id: String,
    pub group_name: Option<String>,
    pub topic: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_: Option<String>,
    pub faculty: Option<String>,
    pub year: Option<i32>,
    pub rank: Option<i32>,
    pub members: Option<i32>,
    pub leader: Option<String>,
    pub paper_path: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResearchPaperWithProfessors {
    #[serde(flatten)]
    pub paper: ResearchPaper,
    pub professor_ids: Vec<i32>,
}

// The abstract column cannot be named directly in Rust, so every query
// aliases it to abstract_.
const PAPER_COLUMNS: &str = "id, paper_id, group_name, topic, description, abstract AS abstract_, \
                             faculty, year, rank, members, leader, paper_path";

impl ResearchPaper {
    pub async fn get(pool: &PgPool, id: i32) -> Result<Option<Self>> {
        let paper = sqlx::query_as::<_, ResearchPaper>(&format!(
            "SELECT {PAPER_COLUMNS} FROM research_papers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(paper)
    }

    pub async fn get_by_paper_id(pool: &PgPool, paper_id: &str) -> Result<Option<Self>> {
        let paper = sqlx::query_as::<_, ResearchPaper>(&format!(
            "SELECT {PAPER_COLUMNS} FROM research_papers WHERE paper_id = $1"
        ))
        .bind(paper_id)
        .fetch_optional(pool)
        .await?;
        Ok(paper)
    }

    pub async fn search(
        pool: &PgPool,
        faculty: Option<&str>,
        year: Option<i32>,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Self>> {
        let papers = sqlx::query_as::<_, ResearchPaper>(&format!(
            r#"
            SELECT {PAPER_COLUMNS} FROM research_papers
            WHERE ($1::text IS NULL OR faculty = $1)
              AND ($2::integer IS NULL OR year = $2)
            ORDER BY id
            OFFSET $3 LIMIT $4
            "#
        ))
        .bind(faculty)
        .bind(year)
        .bind(skip)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(papers)
    }

    pub async fn professor_ids(pool: &PgPool, id: i32) -> Result<Vec<i32>> {
        let ids = sqlx::query_scalar::<_, i32>(
            "SELECT professor_id FROM research_professors WHERE research_id = $1 ORDER BY professor_id",
        )
        .bind(id)
        .fetch_all(pool)
        .await?;
        Ok(ids)
    }

    pub async fn create(pool: &PgPool, data: &ResearchPaperCreate) -> Result<Self> {
        let mut tx = pool.begin().await?;

        let paper = sqlx::query_as::<_, ResearchPaper>(&format!(
            r#"
            INSERT INTO research_papers
                (paper_id, group_name, topic, description, abstract, faculty,
                 year, rank, members, leader, paper_path)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {PAPER_COLUMNS}
            "#
        ))
        .bind(&data.paper_id)
        .bind(&data.group_name)
        .bind(&data.topic)
        .bind(&data.description)
        .bind(&data.abstract_)
        .bind(&data.faculty)
        .bind(data.year)
        .bind(data.rank)
        .bind(data.members)
        .bind(&data.leader)
        .bind(&data.paper_path)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(professor_ids) = &data.professor_ids {
            for professor_id in professor_ids {
                sqlx::query(
                    "INSERT INTO research_professors (research_id, professor_id) VALUES ($1, $2)",
                )
                .bind(paper.id)
                .bind(professor_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(paper)
    }

    pub async fn update(
        pool: &PgPool,
        id: i32,
        data: &ResearchPaperUpdate,
    ) -> Result<Option<Self>> {
        let mut tx = pool.begin().await?;

        let paper = sqlx::query_as::<_, ResearchPaper>(&format!(
            r#"
            UPDATE research_papers SET
                group_name = COALESCE($2, group_name),
                topic = COALESCE($3, topic),
                description = COALESCE($4, description),
                abstract = COALESCE($5, abstract),
                faculty = COALESCE($6, faculty),
                year = COALESCE($7, year),
                rank = COALESCE($8, rank),
                members = COALESCE($9, members),
                leader = COALESCE($10, leader),
                paper_path = COALESCE($11, paper_path)
            WHERE id = $1
            RETURNING {PAPER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&data.group_name)
        .bind(&data.topic)
        .bind(&data.description)
        .bind(&data.abstract_)
        .bind(&data.faculty)
        .bind(data.year)
        .bind(data.rank)
        .bind(data.members)
        .bind(&data.leader)
        .bind(&data.paper_path)
        .fetch_optional(&mut *tx)
        .await?;

        // Replace the professor links when a new set is provided.
        if paper.is_some() {
            if let Some(professor_ids) = &data.professor_ids {
                sqlx::query("DELETE FROM research_professors WHERE research_id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                for professor_id in professor_ids {
                    sqlx::query(
                        "INSERT INTO research_professors (research_id, professor_id) VALUES ($1, $2)",
                    )
                    .bind(id)
                    .bind(professor_id)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        tx.commit().await?;
        Ok(paper)
    }

    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM research_papers WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
