use tracing::error;

use crate::models::{Notification, NotificationCreate};
use crate::AppState;

pub mod auth;
pub mod chat;
pub mod groups;
pub mod mentorship;
pub mod notifications;
pub mod professors;
pub mod research;
pub mod students;

/// Fan a notification out after the primary transition has committed. A
/// failure here surfaces as a 500 while the transition stays committed.
pub(crate) async fn notify(
    app_state: &AppState,
    data: NotificationCreate,
) -> Result<(), actix_web::Error> {
    Notification::create(&app_state.pool, &data)
        .await
        .map_err(|e| {
            error!("Error creating notification: {:?}", e);
            actix_web::error::ErrorInternalServerError(e.to_string())
        })?;
    Ok(())
}
