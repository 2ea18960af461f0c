use std::sync::Arc;

use actix_web::{
    delete, get, post, put,
    web::{self, Json},
    HttpResponse, Responder,
};
use tracing::error;

use crate::middleware::auth::AuthenticatedUser;
use crate::models::{GroupChatMessage, SenderType};
use crate::types::{ChatMessageCreate, ChatMessageUpdate, MessageResponse, PageQuery, UnreadCountResponse};
use crate::AppState;

/// Chat is restricted to student members and professor mentors of the group.
async fn require_access(
    app_state: &AppState,
    user: &AuthenticatedUser,
    group_id: i32,
) -> Result<(SenderType, i32), actix_web::Error> {
    GroupChatMessage::group_access(&app_state.pool, user.user_id, group_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorForbidden("Not a member of this group"))
}

async fn get_message_in_group(
    app_state: &AppState,
    group_id: i32,
    message_id: i32,
) -> Result<GroupChatMessage, actix_web::Error> {
    let message = GroupChatMessage::get(&app_state.pool, message_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Message not found"))?;
    if message.group_id != group_id {
        return Err(actix_web::error::ErrorBadRequest(
            "Message does not belong to this group",
        ));
    }
    Ok(message)
}

#[post("/groups/{group_id}/messages")]
pub async fn send_message(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
    body: Json<ChatMessageCreate>,
) -> Result<impl Responder, actix_web::Error> {
    let group_id = path.into_inner();
    let (sender_type, sender_id) = require_access(&app_state, &user, group_id).await?;

    if body.message.trim().is_empty() {
        return Err(actix_web::error::ErrorBadRequest("Message cannot be empty"));
    }

    let message =
        GroupChatMessage::create(&app_state.pool, group_id, sender_id, sender_type, &body.message)
            .await
            .map_err(|e| {
                error!("Error sending chat message: {:?}", e);
                actix_web::error::ErrorInternalServerError(e.to_string())
            })?;

    // The sender has trivially read their own message.
    GroupChatMessage::mark_read(&app_state.pool, message.id, user.user_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    Ok(HttpResponse::Created().json(message))
}

#[get("/groups/{group_id}/messages")]
pub async fn list_messages(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
    query: web::Query<PageQuery>,
) -> Result<impl Responder, actix_web::Error> {
    let group_id = path.into_inner();
    require_access(&app_state, &user, group_id).await?;

    let messages = GroupChatMessage::list_views(
        &app_state.pool,
        group_id,
        user.user_id,
        query.skip.unwrap_or(0),
        query.limit.unwrap_or(50),
    )
    .await
    .map_err(|e| {
        error!("Error listing chat messages: {:?}", e);
        actix_web::error::ErrorInternalServerError(e.to_string())
    })?;
    Ok(Json(messages))
}

#[put("/groups/{group_id}/messages/{message_id}")]
pub async fn edit_message(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    path: web::Path<(i32, i32)>,
    body: Json<ChatMessageUpdate>,
) -> Result<impl Responder, actix_web::Error> {
    let (group_id, message_id) = path.into_inner();
    let (sender_type, sender_id) = require_access(&app_state, &user, group_id).await?;
    let message = get_message_in_group(&app_state, group_id, message_id).await?;

    if message.sender_type != sender_type || message.sender_id != sender_id {
        return Err(actix_web::error::ErrorForbidden(
            "Only the sender can edit a message",
        ));
    }
    if message.is_deleted {
        return Err(actix_web::error::ErrorBadRequest(
            "Deleted messages cannot be edited",
        ));
    }
    if body.message.trim().is_empty() {
        return Err(actix_web::error::ErrorBadRequest("Message cannot be empty"));
    }

    let updated = GroupChatMessage::edit(&app_state.pool, message.id, &body.message)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Message not found"))?;
    Ok(Json(updated))
}

#[delete("/groups/{group_id}/messages/{message_id}")]
pub async fn delete_message(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    path: web::Path<(i32, i32)>,
) -> Result<impl Responder, actix_web::Error> {
    let (group_id, message_id) = path.into_inner();
    let (sender_type, sender_id) = require_access(&app_state, &user, group_id).await?;
    let message = get_message_in_group(&app_state, group_id, message_id).await?;

    if message.sender_type != sender_type || message.sender_id != sender_id {
        return Err(actix_web::error::ErrorForbidden(
            "Only the sender can delete a message",
        ));
    }
    if message.is_deleted {
        return Err(actix_web::error::ErrorBadRequest("Message already deleted"));
    }

    GroupChatMessage::soft_delete(&app_state.pool, message.id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    Ok(Json(MessageResponse {
        message: "Message deleted".to_string(),
    }))
}

#[post("/groups/{group_id}/messages/{message_id}/read")]
pub async fn mark_message_read(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    path: web::Path<(i32, i32)>,
) -> Result<impl Responder, actix_web::Error> {
    let (group_id, message_id) = path.into_inner();
    require_access(&app_state, &user, group_id).await?;
    let message = get_message_in_group(&app_state, group_id, message_id).await?;

    GroupChatMessage::mark_read(&app_state.pool, message.id, user.user_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    Ok(Json(MessageResponse {
        message: "Message marked as read".to_string(),
    }))
}

#[post("/groups/{group_id}/messages/read-all")]
pub async fn mark_all_read(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<impl Responder, actix_web::Error> {
    let group_id = path.into_inner();
    require_access(&app_state, &user, group_id).await?;

    let marked = GroupChatMessage::mark_all_read(&app_state.pool, group_id, user.user_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    Ok(Json(MessageResponse {
        message: format!("{marked} messages marked as read"),
    }))
}

#[get("/groups/{group_id}/unread-count")]
pub async fn unread_count(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<impl Responder, actix_web::Error> {
    let group_id = path.into_inner();
    require_access(&app_state, &user, group_id).await?;

    let count = GroupChatMessage::unread_count(&app_state.pool, group_id, user.user_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    Ok(Json(UnreadCountResponse {
        group_id,
        unread_count: count,
    }))
}
