use std::sync::Arc;

use actix_web::{
    delete, get, post, put,
    web::{self, Json},
    HttpResponse, Responder,
};
use tracing::{error, info};

use crate::middleware::auth::AuthenticatedUser;
use crate::models::{
    Group, GroupInvitation, GroupJoinRequest, NotificationCreate, ProposalStatus, Student, User,
    UserRole,
};
use crate::routes::notify;
use crate::types::{
    GroupCreate, GroupInvitationCreate, GroupJoinRequestCreate, GroupUpdate, MessageResponse,
    PageQuery, StatusUpdate,
};
use crate::AppState;

/// Resolve the caller's student profile. Admins have no student profile, so
/// student-only endpoints reject them too.
pub(crate) async fn require_student(
    app_state: &AppState,
    user: &AuthenticatedUser,
) -> Result<Student, actix_web::Error> {
    if user.role != UserRole::Student {
        return Err(actix_web::error::ErrorForbidden("Student access required"));
    }
    Student::get_by_user_id(&app_state.pool, user.user_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorForbidden("Student profile not found"))
}

async fn get_group_or_404(app_state: &AppState, id: i32) -> Result<Group, actix_web::Error> {
    Group::get(&app_state.pool, id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Group not found"))
}

/// Leader-or-admin gate used by group mutation endpoints.
async fn require_leader_or_admin(
    app_state: &AppState,
    user: &AuthenticatedUser,
    group: &Group,
) -> Result<(), actix_web::Error> {
    if user.is_admin() {
        return Ok(());
    }
    let student = Student::get_by_user_id(&app_state.pool, user.user_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    match student {
        Some(student) if student.id == group.leader_id => Ok(()),
        _ => Err(actix_web::error::ErrorForbidden(
            "Only the group leader can do this",
        )),
    }
}

async fn leader_user_id(app_state: &AppState, group: &Group) -> Result<i32, actix_web::Error> {
    let leader = Student::get(&app_state.pool, group.leader_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Group leader missing"))?;
    Ok(leader.user_id)
}

#[get("")]
pub async fn list_groups(
    app_state: web::Data<Arc<AppState>>,
    _user: AuthenticatedUser,
    query: web::Query<PageQuery>,
) -> Result<impl Responder, actix_web::Error> {
    let groups = Group::list(
        &app_state.pool,
        query.skip.unwrap_or(0),
        query.limit.unwrap_or(100),
    )
    .await
    .map_err(|e| {
        error!("Error listing groups: {:?}", e);
        actix_web::error::ErrorInternalServerError(e.to_string())
    })?;

    let mut result = Vec::with_capacity(groups.len());
    for group in groups {
        result.push(
            group
                .with_mentors(&app_state.pool)
                .await
                .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?,
        );
    }
    Ok(Json(result))
}

#[get("/my-groups")]
pub async fn my_groups(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<impl Responder, actix_web::Error> {
    let student = require_student(&app_state, &user).await?;
    let groups = Group::list_for_student(&app_state.pool, student.id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    let mut result = Vec::with_capacity(groups.len());
    for group in groups {
        result.push(
            group
                .with_mentors(&app_state.pool)
                .await
                .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?,
        );
    }
    Ok(Json(result))
}

#[get("/{id}")]
pub async fn get_group(
    app_state: web::Data<Arc<AppState>>,
    _user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<impl Responder, actix_web::Error> {
    let group = get_group_or_404(&app_state, path.into_inner()).await?;
    let group = group
        .with_mentors(&app_state.pool)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    Ok(Json(group))
}

#[get("/{id}/members")]
pub async fn get_group_members(
    app_state: web::Data<Arc<AppState>>,
    _user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<impl Responder, actix_web::Error> {
    let group = get_group_or_404(&app_state, path.into_inner()).await?;
    let members = Group::members(&app_state.pool, group.id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    Ok(Json(members))
}

#[post("")]
pub async fn create_group(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    body: Json<GroupCreate>,
) -> Result<impl Responder, actix_web::Error> {
    let student = require_student(&app_state, &user).await?;
    if body.leader_id != student.id {
        return Err(actix_web::error::ErrorForbidden(
            "Groups can only be created on your own behalf",
        ));
    }
    if body.max_members < 1 {
        return Err(actix_web::error::ErrorBadRequest(
            "max_members must be at least 1",
        ));
    }

    let existing = Group::get_by_leader(&app_state.pool, student.id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    if existing.is_some() {
        return Err(actix_web::error::ErrorBadRequest(
            "You already lead a group",
        ));
    }

    let group = Group::create(&app_state.pool, student.id, &body)
        .await
        .map_err(|e| {
            error!("Error creating group: {:?}", e);
            actix_web::error::ErrorInternalServerError(e.to_string())
        })?;
    info!("Group {} created by student {}", group.id, student.id);
    Ok(HttpResponse::Created().json(group))
}

#[put("/{id}")]
pub async fn update_group(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
    body: Json<GroupUpdate>,
) -> Result<impl Responder, actix_web::Error> {
    let group = get_group_or_404(&app_state, path.into_inner()).await?;
    require_leader_or_admin(&app_state, &user, &group).await?;

    if let Some(max_members) = body.max_members {
        if max_members < group.current_members {
            return Err(actix_web::error::ErrorBadRequest(
                "max_members cannot be below the current member count",
            ));
        }
    }

    let updated = Group::update(&app_state.pool, group.id, &body)
        .await
        .map_err(|e| {
            error!("Error updating group: {:?}", e);
            actix_web::error::ErrorInternalServerError(e.to_string())
        })?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Group not found"))?;
    Ok(Json(updated))
}

#[delete("/{id}")]
pub async fn delete_group(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<impl Responder, actix_web::Error> {
    let group = get_group_or_404(&app_state, path.into_inner()).await?;
    require_leader_or_admin(&app_state, &user, &group).await?;

    Group::delete(&app_state.pool, group.id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    Ok(Json(MessageResponse {
        message: "Group deleted".to_string(),
    }))
}

#[post("/{id}/members/{student_id}")]
pub async fn add_group_member(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    path: web::Path<(i32, i32)>,
) -> Result<impl Responder, actix_web::Error> {
    let (group_id, student_id) = path.into_inner();
    let group = get_group_or_404(&app_state, group_id).await?;
    require_leader_or_admin(&app_state, &user, &group).await?;

    Student::get(&app_state.pool, student_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Student not found"))?;

    let already = Group::is_member(&app_state.pool, group.id, student_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    if already {
        return Err(actix_web::error::ErrorBadRequest(
            "Student is already a member of this group",
        ));
    }

    let member = Group::add_member(&app_state.pool, group.id, student_id)
        .await
        .map_err(|e| {
            error!("Error adding group member: {:?}", e);
            actix_web::error::ErrorInternalServerError(e.to_string())
        })?
        .ok_or_else(|| actix_web::error::ErrorBadRequest("Group is full"))?;
    Ok(HttpResponse::Created().json(member))
}

#[delete("/{id}/members/{student_id}")]
pub async fn remove_group_member(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    path: web::Path<(i32, i32)>,
) -> Result<impl Responder, actix_web::Error> {
    let (group_id, student_id) = path.into_inner();
    let group = get_group_or_404(&app_state, group_id).await?;

    if student_id == group.leader_id {
        return Err(actix_web::error::ErrorBadRequest(
            "The group leader cannot be removed",
        ));
    }

    // A student may leave on their own; otherwise leader or admin.
    let is_self = match Student::get_by_user_id(&app_state.pool, user.user_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
    {
        Some(student) => student.id == student_id,
        None => false,
    };
    if !is_self {
        require_leader_or_admin(&app_state, &user, &group).await?;
    }

    let removed = Group::remove_member(&app_state.pool, group.id, student_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    if !removed {
        return Err(actix_web::error::ErrorNotFound(
            "Student is not a member of this group",
        ));
    }
    Ok(Json(MessageResponse {
        message: "Member removed".to_string(),
    }))
}

#[post("/invitations")]
pub async fn create_invitation(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    body: Json<GroupInvitationCreate>,
) -> Result<impl Responder, actix_web::Error> {
    let student = require_student(&app_state, &user).await?;
    let group = get_group_or_404(&app_state, body.group_id).await?;
    if group.leader_id != student.id {
        return Err(actix_web::error::ErrorForbidden(
            "Only the group leader can send invitations",
        ));
    }

    let target = Student::get(&app_state.pool, body.student_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Student not found"))?;

    let already = Group::is_member(&app_state.pool, group.id, target.id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    if already {
        return Err(actix_web::error::ErrorBadRequest(
            "Student is already a member of this group",
        ));
    }
    if !group.has_capacity() {
        return Err(actix_web::error::ErrorBadRequest("Group is full"));
    }

    let pending = GroupInvitation::pending_for(&app_state.pool, group.id, target.id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    if pending.is_some() {
        return Err(actix_web::error::ErrorBadRequest(
            "Student already has a pending invitation to this group",
        ));
    }

    let invitation =
        GroupInvitation::create(&app_state.pool, group.id, target.id, body.message.as_deref())
            .await
            .map_err(|e| {
                error!("Error creating invitation: {:?}", e);
                actix_web::error::ErrorInternalServerError(e.to_string())
            })?;

    notify(
        &app_state,
        NotificationCreate {
            user_id: target.user_id,
            type_: "group_invitation".to_string(),
            title: "Group invitation".to_string(),
            message: format!("You have been invited to join '{}'", group.name),
            link: Some(format!("/groups/{}", group.id)),
            related_group_id: Some(group.id),
            related_student_id: Some(target.id),
            related_request_id: Some(invitation.id),
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(invitation))
}

#[get("/invitations/student/{student_id}")]
pub async fn list_student_invitations(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<impl Responder, actix_web::Error> {
    let student_id = path.into_inner();
    if !user.is_admin() {
        let student = require_student(&app_state, &user).await?;
        if student.id != student_id {
            return Err(actix_web::error::ErrorForbidden(
                "Not authorized to view these invitations",
            ));
        }
    }

    let invitations = GroupInvitation::list_for_student(&app_state.pool, student_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    Ok(Json(invitations))
}

#[put("/invitations/{id}/status")]
pub async fn respond_to_invitation(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
    body: Json<StatusUpdate>,
) -> Result<impl Responder, actix_web::Error> {
    let student = require_student(&app_state, &user).await?;
    let invitation = GroupInvitation::get(&app_state.pool, path.into_inner())
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Invitation not found"))?;
    if invitation.student_id != student.id {
        return Err(actix_web::error::ErrorForbidden(
            "Not authorized to respond to this invitation",
        ));
    }

    let group = get_group_or_404(&app_state, invitation.group_id).await?;

    let invitation = match body.status {
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
            GroupInvitation::accept(&app_state.pool, invitation.id, None)
                .await
                .map_err(|e| actix_web::error::ErrorBadRequest(e.to_string()))?
        }
        ProposalStatus::Rejected => GroupInvitation::reject(&app_state.pool, invitation.id, None)
            .await
            .map_err(|e| actix_web::error::ErrorBadRequest(e.to_string()))?,
        ProposalStatus::Pending => {
            return Err(actix_web::error::ErrorBadRequest(
                "Status must be accepted or rejected",
            ));
        }
    };

    let responder = User::get_by_id(&app_state.pool, user.user_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("User not found"))?;
    let (title, verb) = match invitation.status {
        ProposalStatus::Accepted => ("Invitation accepted", "accepted"),
        _ => ("Invitation declined", "declined"),
    };
    let leader_user_id = leader_user_id(&app_state, &group).await?;
    notify(
        &app_state,
        NotificationCreate {
            user_id: leader_user_id,
            type_: "invitation_response".to_string(),
            title: title.to_string(),
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

    Ok(Json(invitation))
}

#[post("/join-requests")]
pub async fn create_join_request(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    body: Json<GroupJoinRequestCreate>,
) -> Result<impl Responder, actix_web::Error> {
    let student = require_student(&app_state, &user).await?;
    if body.student_id != student.id {
        return Err(actix_web::error::ErrorForbidden(
            "Join requests can only be sent on your own behalf",
        ));
    }

    let group = get_group_or_404(&app_state, body.group_id).await?;
    if group.leader_id == student.id {
        return Err(actix_web::error::ErrorBadRequest(
            "You are the leader of this group",
        ));
    }

    let already = Group::is_member(&app_state.pool, group.id, student.id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    if already {
        return Err(actix_web::error::ErrorBadRequest(
            "You are already a member of this group",
        ));
    }
    if !group.has_capacity() {
        return Err(actix_web::error::ErrorBadRequest("Group is full"));
    }

    let pending = GroupJoinRequest::pending_for(&app_state.pool, group.id, student.id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    if pending.is_some() {
        return Err(actix_web::error::ErrorBadRequest(
            "You already have a pending request to this group",
        ));
    }

    let request =
        GroupJoinRequest::create(&app_state.pool, group.id, student.id, body.message.as_deref())
            .await
            .map_err(|e| {
                error!("Error creating join request: {:?}", e);
                actix_web::error::ErrorInternalServerError(e.to_string())
            })?;

    let requester = User::get_by_id(&app_state.pool, user.user_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("User not found"))?;
    let leader_user_id = leader_user_id(&app_state, &group).await?;
    notify(
        &app_state,
        NotificationCreate {
            user_id: leader_user_id,
            type_: "group_join_request".to_string(),
            title: "Join request".to_string(),
            message: format!("{} requested to join '{}'", requester.name, group.name),
            link: Some(format!("/groups/{}", group.id)),
            related_group_id: Some(group.id),
            related_student_id: Some(student.id),
            related_request_id: Some(request.id),
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(request))
}

#[get("/join-requests/group/{group_id}")]
pub async fn list_group_join_requests(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<impl Responder, actix_web::Error> {
    let group = get_group_or_404(&app_state, path.into_inner()).await?;
    require_leader_or_admin(&app_state, &user, &group).await?;

    let requests = GroupJoinRequest::list_pending_for_group(&app_state.pool, group.id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    Ok(Json(requests))
}

#[put("/join-requests/{id}/status")]
pub async fn respond_to_join_request(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
    body: Json<StatusUpdate>,
) -> Result<impl Responder, actix_web::Error> {
    let request = GroupJoinRequest::get(&app_state.pool, path.into_inner())
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Join request not found"))?;
    let group = get_group_or_404(&app_state, request.group_id).await?;
    require_leader_or_admin(&app_state, &user, &group).await?;

    let request = match body.status {
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
            GroupJoinRequest::accept(&app_state.pool, request.id, None)
                .await
                .map_err(|e| actix_web::error::ErrorBadRequest(e.to_string()))?
        }
        ProposalStatus::Rejected => GroupJoinRequest::reject(&app_state.pool, request.id, None)
            .await
            .map_err(|e| actix_web::error::ErrorBadRequest(e.to_string()))?,
        ProposalStatus::Pending => {
            return Err(actix_web::error::ErrorBadRequest(
                "Status must be accepted or rejected",
            ));
        }
    };

    let requester = Student::get(&app_state.pool, request.student_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Student not found"))?;
    let (title, verb) = match request.status {
        ProposalStatus::Accepted => ("Join request accepted", "accepted"),
        _ => ("Join request rejected", "rejected"),
    };
    notify(
        &app_state,
        NotificationCreate {
            user_id: requester.user_id,
            type_: "join_request_response".to_string(),
            title: title.to_string(),
            message: format!("Your request to join '{}' was {}", group.name, verb),
            link: Some(format!("/groups/{}", group.id)),
            related_group_id: Some(group.id),
            related_student_id: Some(request.student_id),
            related_request_id: Some(request.id),
        },
    )
    .await?;

    Ok(Json(request))
}
