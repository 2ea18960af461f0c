use serde::Deserialize;
use utoipa::ToSchema;

use crate::models::ProposalStatus;

#[derive(Debug, Deserialize, ToSchema)]
pub struct MentorshipRequestCreate {
    pub group_id: i32,
    pub professor_id: i32,
    pub requested_by: i32,
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MentorshipRequestUpdate {
    pub status: ProposalStatus,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MentorshipListQuery {
    pub status: Option<ProposalStatus>,
}
