use std::sync::Arc;

use actix_web::{
    delete, get, post, put,
    web::{self, Json},
    Responder,
};
use tracing::error;

use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    Group, GroupInvitation, GroupJoinRequest, Notification, NotificationCreate, ProposalStatus,
    Student, User,
};
use crate::routes::groups::require_student;
use crate::routes::notify;
use crate::types::{
    ActionResponse, CountResponse, MessageResponse, NotificationAction, NotificationListQuery,
    NotificationMarkRead,
};
use crate::AppState;

#[get("")]
pub async fn list_notifications(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    query: web::Query<NotificationListQuery>,
) -> Result<impl Responder, actix_web::Error> {
    let notifications = Notification::list_for_user(
        &app_state.pool,
        user.user_id,
        query.unread_only,
        query.skip.unwrap_or(0),
        query.limit.unwrap_or(50),
    )
    .await
    .map_err(|e| {
        error!("Error listing notifications: {:?}", e);
        actix_web::error::ErrorInternalServerError(e.to_string())
    })?;
    Ok(Json(notifications))
}

#[get("/unread-count")]
pub async fn unread_count(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<impl Responder, actix_web::Error> {
    let count = Notification::unread_count(&app_state.pool, user.user_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    Ok(Json(CountResponse { count }))
}

#[put("/mark-read")]
pub async fn mark_many_read(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    body: Json<NotificationMarkRead>,
) -> Result<impl Responder, actix_web::Error> {
    let updated = Notification::mark_read_many(&app_state.pool, &body.notification_ids, user.user_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    Ok(Json(MessageResponse {
        message: format!("{updated} notifications marked as read"),
    }))
}

#[put("/{id}/mark-read")]
pub async fn mark_one_read(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<impl Responder, actix_web::Error> {
    let updated = Notification::mark_read(&app_state.pool, path.into_inner(), user.user_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    if !updated {
        return Err(actix_web::error::ErrorNotFound("Notification not found"));
    }
    Ok(Json(MessageResponse {
        message: "Notification marked as read".to_string(),
    }))
}

#[delete("/{id}")]
pub async fn delete_notification(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<impl Responder, actix_web::Error> {
    let deleted = Notification::delete(&app_state.pool, path.into_inner(), user.user_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    if !deleted {
        return Err(actix_web::error::ErrorNotFound("Notification not found"));
    }
    Ok(Json(MessageResponse {
        message: "Notification deleted".to_string(),
    }))
}

fn parse_action(action: &str) -> Result<ProposalStatus, actix_web::Error> {
    if action.eq_ignore_ascii_case("accept") {
        Ok(ProposalStatus::Accepted)
    } else if action.eq_ignore_ascii_case("reject") {
        Ok(ProposalStatus::Rejected)
    } else {
        Err(actix_web::error::ErrorBadRequest(
            "Action must be accept or reject",
        ))
    }
}

/// Accept or reject a join request straight from its notification. The same
/// transition as the direct endpoint, plus the driving notification is marked
/// read in the same transaction.
#[post("/group-join-request/action")]
pub async fn join_request_action(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    body: Json<NotificationAction>,
) -> Result<impl Responder, actix_web::Error> {
    let status = parse_action(&body.action)?;

    let notification = Notification::get_for_user(&app_state.pool, body.notification_id, user.user_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Notification not found"))?;
    if notification.type_ != "group_join_request" {
        return Err(actix_web::error::ErrorBadRequest(
            "Notification is not a join request",
        ));
    }
    let request_id = notification
        .related_request_id
        .ok_or_else(|| actix_web::error::ErrorBadRequest("Notification has no linked request"))?;

    let request = GroupJoinRequest::get(&app_state.pool, request_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Join request not found"))?;
    let group = Group::get(&app_state.pool, request.group_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Group not found"))?;

    if !user.is_admin() {
        let student = require_student(&app_state, &user).await?;
        if student.id != group.leader_id {
            return Err(actix_web::error::ErrorForbidden(
                "Only the group leader can respond to join requests",
            ));
        }
    }

    let request = match status {
        ProposalStatus::Accepted => {
            if !group.has_capacity() {
                return Err(actix_web::error::ErrorBadRequest("Group is full"));
            }
            let already_member = Group::is_member(&app_state.pool, group.id, request.student_id)
                .await
                .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
            if already_member {
                return Err(actix_web::error::ErrorBadRequest(
                    "Student is already a member of this group",
                ));
            }
            GroupJoinRequest::accept(&app_state.pool, request.id, Some(notification.id))
                .await
                .map_err(|e| actix_web::error::ErrorBadRequest(e.to_string()))?
        }
        _ => GroupJoinRequest::reject(&app_state.pool, request.id, Some(notification.id))
            .await
            .map_err(|e| actix_web::error::ErrorBadRequest(e.to_string()))?,
    };

    let requester = Student::get(&app_state.pool, request.student_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Student not found"))?;
    let verb = match request.status {
        ProposalStatus::Accepted => "accepted",
        _ => "rejected",
    };
    notify(
        &app_state,
        NotificationCreate {
            user_id: requester.user_id,
            type_: "join_request_response".to_string(),
            title: format!("Join request {verb}"),
            message: format!("Your request to join '{}' was {}", group.name, verb),
            link: Some(format!("/groups/{}", group.id)),
            related_group_id: Some(group.id),
            related_student_id: Some(request.student_id),
            related_request_id: Some(request.id),
        },
    )
    .await?;

    Ok(Json(ActionResponse {
        message: format!("Join request {verb}"),
        status: verb.to_string(),
    }))
}

#[post("/group-invitation/action")]
pub async fn invitation_action(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    body: Json<NotificationAction>,
) -> Result<impl Responder, actix_web::Error> {
    let status = parse_action(&body.action)?;

    let notification = Notification::get_for_user(&app_state.pool, body.notification_id, user.user_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Notification not found"))?;
    if notification.type_ != "group_invitation" {
        return Err(actix_web::error::ErrorBadRequest(
            "Notification is not an invitation",
        ));
    }
    let invitation_id = notification
        .related_request_id
        .ok_or_else(|| actix_web::error::ErrorBadRequest("Notification has no linked invitation"))?;

    let invitation = GroupInvitation::get(&app_state.pool, invitation_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Invitation not found"))?;

    let student = require_student(&app_state, &user).await?;
    if invitation.student_id != student.id {
        return Err(actix_web::error::ErrorForbidden(
            "Not authorized to respond to this invitation",
        ));
    }

    let group = Group::get(&app_state.pool, invitation.group_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Group not found"))?;

    let invitation = match status {
        ProposalStatus::Accepted => {
            if !group.has_capacity() {
                return Err(actix_web::error::ErrorBadRequest("Group is full"));
            }
            let already_member = Group::is_member(&app_state.pool, group.id, student.id)
                .await
                .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
            if already_member {
                return Err(actix_web::error::ErrorBadRequest(
                    "Student is already a member of this group",
                ));
            }
            GroupInvitation::accept(&app_state.pool, invitation.id, Some(notification.id))
                .await
                .map_err(|e| actix_web::error::ErrorBadRequest(e.to_string()))?
        }
        _ => GroupInvitation::reject(&app_state.pool, invitation.id, Some(notification.id))
            .await
            .map_err(|e| actix_web::error::ErrorBadRequest(e.to_string()))?,
    };

    let responder = User::get_by_id(&app_state.pool, user.user_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("User not found"))?;
    let leader = Student::get(&app_state.pool, group.leader_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Group leader missing"))?;
    let verb = match invitation.status {
        ProposalStatus::Accepted => "accepted",
        _ => "declined",
    };
    notify(
        &app_state,
        NotificationCreate {
            user_id: leader.user_id,
            type_: "invitation_response".to_string(),
            title: format!("Invitation {verb}"),
            message: format!(
                "{} {} the invitation to join '{}'",
                responder.name, verb, group.name
            ),
            link: Some(format!("/groups/{}", group.id)),
            related_group_id: Some(group.id),
            related_student_id: Some(student.id),
            related_request_id: Some(invitation.id),
        },
    )
    .await?;

    Ok(Json(ActionResponse {
        message: format!("Invitation {verb}"),
        status: verb.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_strings_map_to_terminal_statuses() {
        assert_eq!(parse_action("accept").unwrap(), ProposalStatus::Accepted);
        assert_eq!(parse_action("reject").unwrap(), ProposalStatus::Rejected);
        assert!(parse_action("maybe").is_err());
    }

    #[test]
    fn action_strings_are_case_insensitive() {
        assert_eq!(parse_action("Accept").unwrap(), ProposalStatus::Accepted);
        assert_eq!(parse_action("REJECT").unwrap(), ProposalStatus::Rejected);
        assert_eq!(parse_action("aCCePt").unwrap(), ProposalStatus::Accepted);
    }
}
