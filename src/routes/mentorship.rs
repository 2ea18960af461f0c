use std::sync::Arc;

use actix_web::{
    delete, get, post, put,
    web::{self, Json},
    HttpResponse, Responder,
};
use tracing::{error, info};

use crate::middleware::auth::AuthenticatedUser;
use crate::models::mentorship::{accept_preconditions, request_preconditions};
use crate::models::{
    Group, MentorshipRequest, NotificationCreate, Professor, ProposalStatus, Student, UserRole,
};
use crate::routes::groups::require_student;
use crate::routes::notify;
use crate::types::{
    MentorshipListQuery, MentorshipRequestCreate, MentorshipRequestUpdate, MessageResponse,
};
use crate::AppState;

async fn require_professor(
    app_state: &AppState,
    user: &AuthenticatedUser,
) -> Result<Professor, actix_web::Error> {
    if user.role != UserRole::Professor {
        return Err(actix_web::error::ErrorForbidden(
            "Professor access required",
        ));
    }
    Professor::get_by_user_id(&app_state.pool, user.user_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorForbidden("Professor profile not found"))
}

#[post("")]
pub async fn create_request(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    body: Json<MentorshipRequestCreate>,
) -> Result<impl Responder, actix_web::Error> {
    let student = require_student(&app_state, &user).await?;
    if body.requested_by != student.id {
        return Err(actix_web::error::ErrorForbidden(
            "Mentorship requests can only be sent on your own behalf",
        ));
    }

    let group = Group::get(&app_state.pool, body.group_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Group not found"))?;
    if group.leader_id != student.id {
        return Err(actix_web::error::ErrorForbidden(
            "Only the group leader can request a mentor",
        ));
    }
    let professor = Professor::get(&app_state.pool, body.professor_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Professor not found"))?;
    let pending = MentorshipRequest::pending_count_for_group(&app_state.pool, group.id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    request_preconditions(group.mentor_count, professor.available_slots, pending)
        .map_err(actix_web::error::ErrorBadRequest)?;

    let duplicate =
        MentorshipRequest::pending_to_professor(&app_state.pool, group.id, professor.id)
            .await
            .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    if duplicate.is_some() {
        return Err(actix_web::error::ErrorBadRequest(
            "A pending request to this professor already exists",
        ));
    }

    let request = MentorshipRequest::create(
        &app_state.pool,
        group.id,
        professor.id,
        student.id,
        &body.message,
    )
    .await
    .map_err(|e| {
        error!("Error creating mentorship request: {:?}", e);
        actix_web::error::ErrorInternalServerError(e.to_string())
    })?;
    info!(
        "Mentorship request {} from group {} to professor {}",
        request.id, group.id, professor.id
    );

    notify(
        &app_state,
        NotificationCreate {
            user_id: professor.user_id,
            type_: "mentorship_request".to_string(),
            title: "Mentorship request".to_string(),
            message: format!("Group '{}' has requested you as a mentor", group.name),
            link: Some(format!("/mentorship-requests/{}", request.id)),
            related_group_id: Some(group.id),
            related_student_id: Some(student.id),
            related_request_id: Some(request.id),
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(request))
}

#[get("/professor/{id}")]
pub async fn list_for_professor(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
    query: web::Query<MentorshipListQuery>,
) -> Result<impl Responder, actix_web::Error> {
    let professor_id = path.into_inner();
    if !user.is_admin() {
        let professor = require_professor(&app_state, &user).await?;
        if professor.id != professor_id {
            return Err(actix_web::error::ErrorForbidden(
                "Not authorized to view these requests",
            ));
        }
    }

    let requests = MentorshipRequest::list_for_professor(&app_state.pool, professor_id, query.status)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    Ok(Json(requests))
}

#[get("/group/{id}")]
pub async fn list_for_group(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<impl Responder, actix_web::Error> {
    let group = Group::get(&app_state.pool, path.into_inner())
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Group not found"))?;
    if !user.is_admin() {
        let student = require_student(&app_state, &user).await?;
        if student.id != group.leader_id {
            return Err(actix_web::error::ErrorForbidden(
                "Only the group leader can view these requests",
            ));
        }
    }

    let requests = MentorshipRequest::list_for_group(&app_state.pool, group.id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    Ok(Json(requests))
}

#[put("/{id}/status")]
pub async fn respond_to_request(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
    body: Json<MentorshipRequestUpdate>,
) -> Result<impl Responder, actix_web::Error> {
    let professor = require_professor(&app_state, &user).await?;
    let request = MentorshipRequest::get(&app_state.pool, path.into_inner())
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Mentorship request not found"))?;
    if request.professor_id != professor.id {
        return Err(actix_web::error::ErrorForbidden(
            "Not authorized to respond to this request",
        ));
    }
    if request.status.is_terminal() {
        return Err(actix_web::error::ErrorBadRequest(
            "Request has already been responded to",
        ));
    }

    let group = Group::get(&app_state.pool, request.group_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Group not found"))?;

    let request = match body.status {
        ProposalStatus::Accepted => {
            accept_preconditions(group.mentor_count, professor.available_slots)
                .map_err(actix_web::error::ErrorBadRequest)?;
            MentorshipRequest::accept(&app_state.pool, request.id)
                .await
                .map_err(|e| actix_web::error::ErrorBadRequest(e.to_string()))?
        }
        ProposalStatus::Rejected => {
            let reason = body
                .rejection_reason
                .as_deref()
                .filter(|r| !r.trim().is_empty())
                .ok_or_else(|| {
                    actix_web::error::ErrorBadRequest("A rejection reason is required")
                })?;
            MentorshipRequest::reject(&app_state.pool, request.id, reason)
                .await
                .map_err(|e| actix_web::error::ErrorBadRequest(e.to_string()))?
        }
        ProposalStatus::Pending => {
            return Err(actix_web::error::ErrorBadRequest(
                "Status must be accepted or rejected",
            ));
        }
    };

    let requester = Student::get(&app_state.pool, request.requested_by)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Student not found"))?;
    let (title, message) = match request.status {
        ProposalStatus::Accepted => (
            "Mentorship request accepted",
            format!("Your mentorship request for '{}' was accepted", group.name),
        ),
        _ => (
            "Mentorship request rejected",
            format!("Your mentorship request for '{}' was rejected", group.name),
        ),
    };
    notify(
        &app_state,
        NotificationCreate {
            user_id: requester.user_id,
            type_: "mentorship_response".to_string(),
            title: title.to_string(),
            message,
            link: Some(format!("/groups/{}", group.id)),
            related_group_id: Some(group.id),
            related_student_id: Some(request.requested_by),
            related_request_id: Some(request.id),
        },
    )
    .await?;

    Ok(Json(request))
}

#[delete("/{id}")]
pub async fn withdraw_request(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<impl Responder, actix_web::Error> {
    let student = require_student(&app_state, &user).await?;
    let request = MentorshipRequest::get(&app_state.pool, path.into_inner())
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Mentorship request not found"))?;
    if request.requested_by != student.id {
        return Err(actix_web::error::ErrorForbidden(
            "Not authorized to withdraw this request",
        ));
    }

    let withdrawn = MentorshipRequest::withdraw(&app_state.pool, request.id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    if !withdrawn {
        return Err(actix_web::error::ErrorBadRequest(
            "Only pending requests can be withdrawn",
        ));
    }
    Ok(Json(MessageResponse {
        message: "Mentorship request withdrawn".to_string(),
    }))
}
