use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::ProposalStatus;

#[derive(Debug, Deserialize, ToSchema)]
pub struct GroupCreate {
    pub name: String,
    pub leader_id: i32,
    pub description: Option<String>,
    pub needed_skills: Option<Vec<String>>,
    pub max_members: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GroupUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub needed_skills: Option<Vec<String>>,
    pub max_members: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GroupInvitationCreate {
    pub group_id: i32,
    pub student_id: i32,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GroupJoinRequestCreate {
    pub group_id: i32,
    pub student_id: i32,
    pub message: Option<String>,
}

/// Body of the accept/reject endpoints shared by invitations, join requests
/// and mentorship requests.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusUpdate {
    pub status: ProposalStatus,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
