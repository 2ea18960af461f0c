use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResearchPaperCreate {
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
    pub professor_ids: Option<Vec<i32>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResearchPaperUpdate {
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
    pub professor_ids: Option<Vec<i32>>,
}

#[derive(Debug, Deserialize)]
pub struct ResearchListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub faculty: Option<String>,
    pub year: Option<i32>,
}
