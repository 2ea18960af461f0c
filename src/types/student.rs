use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct StudentCreate {
    pub user_id: i32,
    pub student_id: String,
    pub gpa: Option<f64>,
    pub major: Option<String>,
    pub faculty: Option<String>,
    pub year: Option<String>,
    pub skills: Option<Vec<String>>,
    pub bio: Option<String>,
    pub looking_for_group: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StudentUpdate {
    pub gpa: Option<f64>,
    pub major: Option<String>,
    pub faculty: Option<String>,
    pub year: Option<String>,
    pub skills: Option<Vec<String>>,
    pub bio: Option<String>,
    pub looking_for_group: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct StudentListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub faculty: Option<String>,
    pub year: Option<String>,
    pub skill: Option<String>,
    pub looking_for_group: Option<bool>,
}
