use std::sync::Arc;

use actix_web::{
    get, post, put,
    web::{self, Json},
    HttpResponse, Responder,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info};

use crate::auth::{create_access_token, hash_password, verify_password};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{Professor, ProfessorWithUser, Student, StudentWithUser, User, UserRole};
use crate::types::{
    LoginRequest, ProfessorProfileUpdate, RegisterRequest, StudentProfileUpdate, TokenResponse,
};
use crate::{AppConfig, AppState};

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

#[post("/register")]
pub async fn register(
    app_state: web::Data<Arc<AppState>>,
    body: Json<RegisterRequest>,
) -> Result<impl Responder, actix_web::Error> {
    if !EMAIL_RE.is_match(&body.email) {
        return Err(actix_web::error::ErrorBadRequest("Invalid email address"));
    }

    let existing = User::get_by_email(&app_state.pool, &body.email)
        .await
        .map_err(|e| {
            error!("Error looking up user: {:?}", e);
            actix_web::error::ErrorInternalServerError(e.to_string())
        })?;
    if existing.is_some() {
        return Err(actix_web::error::ErrorBadRequest("Email already registered"));
    }

    let hashed = hash_password(&body.password)
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    let user = User::create(&app_state.pool, &body.email, &hashed, &body.name, body.role)
        .await
        .map_err(|e| {
            error!("Error creating user: {:?}", e);
            actix_web::error::ErrorInternalServerError(e.to_string())
        })?;

    info!("Registered user {} ({:?})", user.email, user.role);
    Ok(HttpResponse::Created().json(user))
}

#[post("/login")]
pub async fn login(
    app_state: web::Data<Arc<AppState>>,
    app_config: web::Data<Arc<AppConfig>>,
    body: Json<LoginRequest>,
) -> Result<impl Responder, actix_web::Error> {
    let user = User::get_by_email(&app_state.pool, &body.email)
        .await
        .map_err(|e| {
            error!("Error looking up user: {:?}", e);
            actix_web::error::ErrorInternalServerError(e.to_string())
        })?;

    let Some(user) = user else {
        return Err(actix_web::error::ErrorUnauthorized(
            "Incorrect email or password",
        ));
    };

    let valid = verify_password(&body.password, &user.hashed_password)
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    if !valid {
        return Err(actix_web::error::ErrorUnauthorized(
            "Incorrect email or password",
        ));
    }

    let token = create_access_token(
        &user,
        &app_config.jwt_secret,
        app_config.access_token_expire_minutes,
    )
    .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
    }))
}

#[get("/me")]
pub async fn me(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<impl Responder, actix_web::Error> {
    let current = User::get_by_id(&app_state.pool, user.user_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("User not found"))?;
    Ok(Json(current))
}

async fn current_student_profile(
    app_state: &AppState,
    user: &AuthenticatedUser,
) -> Result<(User, Student), actix_web::Error> {
    if user.role != UserRole::Student {
        return Err(actix_web::error::ErrorForbidden(
            "Only students can access student profiles",
        ));
    }
    let current = User::get_by_id(&app_state.pool, user.user_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("User not found"))?;
    let student = Student::get_by_user_id(&app_state.pool, user.user_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Student profile not found"))?;
    Ok((current, student))
}

async fn current_professor_profile(
    app_state: &AppState,
    user: &AuthenticatedUser,
) -> Result<(User, Professor), actix_web::Error> {
    if user.role != UserRole::Professor {
        return Err(actix_web::error::ErrorForbidden(
            "Only professors can access professor profiles",
        ));
    }
    let current = User::get_by_id(&app_state.pool, user.user_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("User not found"))?;
    let professor = Professor::get_by_user_id(&app_state.pool, user.user_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Professor profile not found"))?;
    Ok((current, professor))
}

#[get("/profile/student")]
pub async fn get_student_profile(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<impl Responder, actix_web::Error> {
    let (current, student) = current_student_profile(&app_state, &user).await?;
    Ok(Json(student_with_user(student, &current)))
}

#[put("/profile/student")]
pub async fn update_student_profile(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    body: Json<StudentProfileUpdate>,
) -> Result<impl Responder, actix_web::Error> {
    let (current, student) = current_student_profile(&app_state, &user).await?;

    let updated = Student::update_profile(&app_state.pool, student.id, &body)
        .await
        .map_err(|e| {
            error!("Error updating student profile: {:?}", e);
            actix_web::error::ErrorInternalServerError(e.to_string())
        })?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Student profile not found"))?;

    Ok(Json(student_with_user(updated, &current)))
}

#[get("/profile/professor")]
pub async fn get_professor_profile(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<impl Responder, actix_web::Error> {
    let (current, professor) = current_professor_profile(&app_state, &user).await?;
    Ok(Json(professor_with_user(professor, &current)))
}

#[put("/profile/professor")]
pub async fn update_professor_profile(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    body: Json<ProfessorProfileUpdate>,
) -> Result<impl Responder, actix_web::Error> {
    let (current, professor) = current_professor_profile(&app_state, &user).await?;

    if let Some(total_slots) = body.total_slots {
        if total_slots < 1 {
            return Err(actix_web::error::ErrorBadRequest(
                "Total slots must be at least 1",
            ));
        }
    }

    let updated = Professor::update_profile(&app_state.pool, professor.id, &body)
        .await
        .map_err(|e| {
            error!("Error updating professor profile: {:?}", e);
            actix_web::error::ErrorInternalServerError(e.to_string())
        })?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Professor profile not found"))?;

    Ok(Json(professor_with_user(updated, &current)))
}

fn student_with_user(student: Student, user: &User) -> StudentWithUser {
    StudentWithUser {
        id: student.id,
        user_id: student.user_id,
        student_id: student.student_id,
        gpa: student.gpa,
        major: student.major,
        faculty: student.faculty,
        year: student.year,
        skills: student.skills,
        bio: student.bio,
        looking_for_group: student.looking_for_group,
        name: user.name.clone(),
        email: user.email.clone(),
    }
}

fn professor_with_user(professor: Professor, user: &User) -> ProfessorWithUser {
    ProfessorWithUser {
        id: professor.id,
        user_id: professor.user_id,
        professor_id: professor.professor_id,
        faculty: professor.faculty,
        field: professor.field,
        department: professor.department,
        research_areas: professor.research_areas,
        research_interests: professor.research_interests,
        achievements: professor.achievements,
        publications: professor.publications,
        bio: professor.bio,
        available_slots: professor.available_slots,
        total_slots: professor.total_slots,
        name: user.name.clone(),
        email: user.email.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_regex_accepts_plausible_addresses() {
        assert!(EMAIL_RE.is_match("student@example.com"));
        assert!(EMAIL_RE.is_match("a.b-c@uni.ac.th"));
    }

    #[test]
    fn email_regex_rejects_garbage() {
        assert!(!EMAIL_RE.is_match("not-an-email"));
        assert!(!EMAIL_RE.is_match("two@@at.com"));
        assert!(!EMAIL_RE.is_match("spaces in@addr.com"));
    }
}
