use std::sync::Arc;

use actix_web::{
    delete, get, post, put,
    web::{self, Json},
    HttpResponse, Responder,
};
use tracing::{error, info};

use crate::auth::{derive_credentials, hash_password};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{Student, User, UserRole};
use crate::types::{
    BulkAccountCreated, BulkStudentRecord, BulkUploadResponse, MessageResponse, StudentCreate,
    StudentListQuery, StudentUpdate,
};
use crate::AppState;

#[get("")]
pub async fn list_students(
    app_state: web::Data<Arc<AppState>>,
    _user: AuthenticatedUser,
    query: web::Query<StudentListQuery>,
) -> Result<impl Responder, actix_web::Error> {
    let students = Student::search(
        &app_state.pool,
        query.faculty.as_deref(),
        query.year.as_deref(),
        query.skill.as_deref(),
        query.looking_for_group,
        query.skip.unwrap_or(0),
        query.limit.unwrap_or(100),
    )
    .await
    .map_err(|e| {
        error!("Error listing students: {:?}", e);
        actix_web::error::ErrorInternalServerError(e.to_string())
    })?;
    Ok(Json(students))
}

#[get("/{id}")]
pub async fn get_student(
    app_state: web::Data<Arc<AppState>>,
    _user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<impl Responder, actix_web::Error> {
    let student = Student::get_with_user(&app_state.pool, path.into_inner())
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Student not found"))?;
    Ok(Json(student))
}

#[post("")]
pub async fn create_student(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    body: Json<StudentCreate>,
) -> Result<impl Responder, actix_web::Error> {
    if !user.is_admin() {
        return Err(actix_web::error::ErrorForbidden("Admin access required"));
    }

    let existing = Student::get_by_student_id(&app_state.pool, &body.student_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    if existing.is_some() {
        return Err(actix_web::error::ErrorBadRequest(
            "Student ID already registered",
        ));
    }

    let student = Student::create(&app_state.pool, &body)
        .await
        .map_err(|e| {
            error!("Error creating student: {:?}", e);
            actix_web::error::ErrorInternalServerError(e.to_string())
        })?;
    Ok(HttpResponse::Created().json(student))
}

/// Create a user plus student profile per row. Credentials are derived from
/// the student identifier, so re-running an upload yields the same logins.
#[post("/bulk")]
pub async fn bulk_create_students(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    body: Json<Vec<BulkStudentRecord>>,
) -> Result<impl Responder, actix_web::Error> {
    if !user.is_admin() {
        return Err(actix_web::error::ErrorForbidden("Admin access required"));
    }

    let mut accounts = Vec::new();
    let mut errors = Vec::new();

    for record in body.iter() {
        match bulk_create_one(&app_state, record).await {
            Ok(account) => accounts.push(account),
            Err(e) => errors.push(format!("{}: {}", record.student_id, e)),
        }
    }

    info!(
        "Bulk student upload: {} created, {} failed",
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
    record: &BulkStudentRecord,
) -> anyhow::Result<BulkAccountCreated> {
    let (username, password) = derive_credentials(&record.student_id);
    if username.is_empty() {
        anyhow::bail!("student ID is empty");
    }
    let email = format!("{username}@university.edu");

    if User::get_by_email(&app_state.pool, &email).await?.is_some() {
        anyhow::bail!("email {email} already registered");
    }
    if Student::get_by_student_id(&app_state.pool, &record.student_id)
        .await?
        .is_some()
    {
        anyhow::bail!("student ID already registered");
    }

    let hashed = hash_password(&password)?;

    let mut tx = app_state.pool.begin().await?;
    let user = User::create(&mut *tx, &email, &hashed, &record.name, UserRole::Student).await?;
    Student::create(
        &mut *tx,
        &StudentCreate {
            user_id: user.id,
            student_id: record.student_id.clone(),
            gpa: record.gpa,
            major: record.major.clone(),
            faculty: Some(record.faculty.clone()),
            year: record.year.clone(),
            skills: None,
            bio: None,
            looking_for_group: None,
        },
    )
    .await?;
    tx.commit().await?;

    Ok(BulkAccountCreated {
        name: record.name.clone(),
        student_id: Some(record.student_id.clone()),
        professor_id: None,
        username,
        password,
        faculty: record.faculty.clone(),
    })
}

#[put("/{id}")]
pub async fn update_student(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
    body: Json<StudentUpdate>,
) -> Result<impl Responder, actix_web::Error> {
    let id = path.into_inner();
    let student = Student::get(&app_state.pool, id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Student not found"))?;
    if !user.is_admin() && student.user_id != user.user_id {
        return Err(actix_web::error::ErrorForbidden(
            "Not authorized to update this student",
        ));
    }

    let updated = Student::update(&app_state.pool, id, &body)
        .await
        .map_err(|e| {
            error!("Error updating student: {:?}", e);
            actix_web::error::ErrorInternalServerError(e.to_string())
        })?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Student not found"))?;
    Ok(Json(updated))
}

#[delete("/{id}")]
pub async fn delete_student(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<impl Responder, actix_web::Error> {
    if !user.is_admin() {
        return Err(actix_web::error::ErrorForbidden("Admin access required"));
    }

    let deleted = Student::delete(&app_state.pool, path.into_inner())
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    if !deleted {
        return Err(actix_web::error::ErrorNotFound("Student not found"));
    }
    Ok(Json(MessageResponse {
        message: "Student deleted".to_string(),
    }))
}
