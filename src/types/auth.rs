use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::UserRole;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: UserRole,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StudentProfileUpdate {
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub looking_for_group: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProfessorProfileUpdate {
    pub bio: Option<String>,
    pub research_interests: Option<Vec<String>>,
    pub total_slots: Option<i32>,
}
