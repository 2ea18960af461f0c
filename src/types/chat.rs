use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatMessageCreate {
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatMessageUpdate {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnreadCountResponse {
    pub group_id: i32,
    pub unread_count: i64,
}
