use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkStudentRecord {
    pub name: String,
    pub student_id: String,
    pub faculty: String,
    pub major: Option<String>,
    pub year: Option<String>,
    pub gpa: Option<f64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkProfessorRecord {
    pub name: String,
    pub professor_id: String,
    pub faculty: String,
    pub field: Option<String>,
    pub department: Option<String>,
    pub research_areas: Option<Vec<String>>,
}

/// Credentials handed back for one successfully created account.
#[derive(Debug, Serialize, ToSchema)]
pub struct BulkAccountCreated {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professor_id: Option<String>,
    pub username: String,
    pub password: String,
    pub faculty: String,
}

/// Per-row outcome report; a failing row never aborts the batch.
#[derive(Debug, Serialize, ToSchema)]
pub struct BulkUploadResponse {
    pub success: usize,
    pub failed: usize,
    pub accounts: Vec<BulkAccountCreated>,
    pub errors: Vec<String>,
}
