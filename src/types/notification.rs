use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize)]
pub struct NotificationListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NotificationMarkRead {
    pub notification_ids: Vec<i32>,
}

/// Accept or reject a proposal directly from its notification.
#[derive(Debug, Deserialize, ToSchema)]
pub struct NotificationAction {
    pub notification_id: i32,
    pub action: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub message: String,
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CountResponse {
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unread_only_defaults_to_false() {
        let query: NotificationListQuery = serde_json::from_str("{}").unwrap();
        assert!(!query.unread_only);
        assert!(query.skip.is_none());
        assert!(query.limit.is_none());
    }
}
