use std::sync::Arc;

use actix_web::{
    delete, get, post, put,
    web::{self, Json},
    HttpResponse, Responder,
};
use tracing::{error, info};

use crate::auth::{derive_credentials, hash_password};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{Professor, User, UserRole};
use crate::types::{
    BulkAccountCreated, BulkProfessorRecord, BulkUploadResponse, MessageResponse, ProfessorCreate,
    ProfessorListQuery, ProfessorUpdate,
};
use crate::AppState;

#[get("")]
pub async fn list_professors(
    app_state: web::Data<Arc<AppState>>,
    _user: AuthenticatedUser,
    query: web::Query<ProfessorListQuery>,
) -> Result<impl Responder, actix_web::Error> {
    let professors = Professor::search(
        &app_state.pool,
        query.faculty.as_deref(),
        query.research_area.as_deref(),
        query.available_only,
        query.skip.unwrap_or(0),
        query.limit.unwrap_or(100),
    )
    .await
    .map_err(|e| {
        error!("Error listing professors: {:?}", e);
        actix_web::error::ErrorInternalServerError(e.to_string())
    })?;
    Ok(Json(professors))
}

#[get("/{id}")]
pub async fn get_professor(
    app_state: web::Data<Arc<AppState>>,
    _user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<impl Responder, actix_web::Error> {
    let professor = Professor::get_with_user(&app_state.pool, path.into_inner())
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Professor not found"))?;
    Ok(Json(professor))
}

#[post("")]
pub async fn create_professor(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    body: Json<ProfessorCreate>,
) -> Result<impl Responder, actix_web::Error> {
    if !user.is_admin() {
        return Err(actix_web::error::ErrorForbidden("Admin access required"));
    }

    let existing = Professor::get_by_professor_id(&app_state.pool, &body.professor_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    if existing.is_some() {
        return Err(actix_web::error::ErrorBadRequest(
            "Professor ID already registered",
        ));
    }

    let professor = Professor::create(&app_state.pool, &body)
        .await
        .map_err(|e| {
            error!("Error creating professor: {:?}", e);
            actix_web::error::ErrorInternalServerError(e.to_string())
        })?;
    Ok(HttpResponse::Created().json(professor))
}

#[post("/bulk")]
pub async fn bulk_create_professors(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    body: Json<Vec<BulkProfessorRecord>>,
) -> Result<impl Responder, actix_web::Error> {
    if !user.is_admin() {
        return Err(actix_web::error::ErrorForbidden("Admin access required"));
    }

    let mut accounts = Vec::new();
    let mut errors = Vec::new();

    for record in body.iter() {
        match bulk_create_one(&app_state, record).await {
            Ok(account) => accounts.push(account),
            Err(e) => errors.push(format!("{}: {}", record.professor_id, e)),
        }
    }

    info!(
        "Bulk professor upload: {} created, {} failed",
        accounts.len(),
        errors.len()
    );
    Ok(Json(BulkUploadResponse {
        success: accounts.len(),
        failed: errors.len(),
        accounts,
        errors,
    }))
}

async fn bulk_create_one(
    app_state: &AppState,
    record: &BulkProfessorRecord,
) -> anyhow::Result<BulkAccountCreated> {
    let (username, password) = derive_credentials(&record.professor_id);
    if username.is_empty() {
        anyhow::bail!("professor ID is empty");
    }
    let email = format!("{username}@university.edu");

    if User::get_by_email(&app_state.pool, &email).await?.is_some() {
        anyhow::bail!("email {email} already registered");
    }
    if Professor::get_by_professor_id(&app_state.pool, &record.professor_id)
        .await?
        .is_some()
    {
        anyhow::bail!("professor ID already registered");
    }

    let hashed = hash_password(&password)?;

    let mut tx = app_state.pool.begin().await?;
    let user = User::create(&mut *tx, &email, &hashed, &record.name, UserRole::Professor).await?;
    Professor::create(
        &mut *tx,
        &ProfessorCreate {
            user_id: user.id,
            professor_id: record.professor_id.clone(),
            faculty: Some(record.faculty.clone()),
            field: record.field.clone(),
            department: record.department.clone(),
            research_areas: record.research_areas.clone(),
            research_interests: None,
            achievements: None,
            publications: None,
            bio: None,
            available_slots: None,
            total_slots: None,
        },
    )
    .await?;
    tx.commit().await?;

    Ok(BulkAccountCreated {
        name: record.name.clone(),
        student_id: None,
        professor_id: Some(record.professor_id.clone()),
        username,
        password,
        faculty: record.faculty.clone(),
    })
}

#[put("/{id}")]
pub async fn update_professor(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
    body: Json<ProfessorUpdate>,
) -> Result<impl Responder, actix_web::Error> {
    let id = path.into_inner();
    let professor = Professor::get(&app_state.pool, id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Professor not found"))?;
    if !user.is_admin() && professor.user_id != user.user_id {
        return Err(actix_web::error::ErrorForbidden(
            "Not authorized to update this professor",
        ));
    }

    let updated = Professor::update(&app_state.pool, id, &body)
        .await
        .map_err(|e| {
            error!("Error updating professor: {:?}", e);
            actix_web::error::ErrorInternalServerError(e.to_string())
        })?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Professor not found"))?;
    Ok(Json(updated))
}

#[delete("/{id}")]
pub async fn delete_professor(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<impl Responder, actix_web::Error> {
    if !user.is_admin() {
        return Err(actix_web::error::ErrorForbidden("Admin access required"));
    }

    let deleted = Professor::delete(&app_state.pool, path.into_inner())
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    if !deleted {
        return Err(actix_web::error::ErrorNotFound("Professor not found"));
    }
    Ok(Json(MessageResponse {
        message: "Professor deleted".to_string(),
    }))
}
