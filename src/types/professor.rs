use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProfessorCreate {
    pub user_id: i32,
    pub professor_id: String,
    pub faculty: Option<String>,
    pub field: Option<String>,
    pub department: Option<String>,
    pub research_areas: Option<Vec<String>>,
    pub research_interests: Option<Vec<String>>,
    pub achievements: Option<String>,
    pub publications: Option<i32>,
    pub bio: Option<String>,
    pub available_slots: Option<i32>,
    pub total_slots: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProfessorUpdate {
    pub faculty: Option<String>,
    pub field: Option<String>,
    pub department: Option<String>,
    pub research_areas: Option<Vec<String>>,
    pub research_interests: Option<Vec<String>>,
    pub achievements: Option<String>,
    pub publications: Option<i32>,
    pub bio: Option<String>,
    pub available_slots: Option<i32>,
    pub total_slots: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ProfessorListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub faculty: Option<String>,
    pub research_area: Option<String>,
    #[serde(default)]
    pub available_only: bool,
}
