use std::sync::Arc;

use actix_web::{
    delete, get, post, put,
    web::{self, Json},
    HttpResponse, Responder,
};
use tracing::error;

use crate::middleware::auth::AuthenticatedUser;
use crate::models::{ResearchPaper, ResearchPaperWithProfessors};
use crate::types::{MessageResponse, ResearchListQuery, ResearchPaperCreate, ResearchPaperUpdate};
use crate::AppState;

async fn with_professors(
    app_state: &AppState,
    paper: ResearchPaper,
) -> Result<ResearchPaperWithProfessors, actix_web::Error> {
    let professor_ids = ResearchPaper::professor_ids(&app_state.pool, paper.id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    Ok(ResearchPaperWithProfessors {
        paper,
        professor_ids,
    })
}

#[get("")]
pub async fn list_papers(
    app_state: web::Data<Arc<AppState>>,
    _user: AuthenticatedUser,
    query: web::Query<ResearchListQuery>,
) -> Result<impl Responder, actix_web::Error> {
    let papers = ResearchPaper::search(
        &app_state.pool,
        query.faculty.as_deref(),
        query.year,
        query.skip.unwrap_or(0),
        query.limit.unwrap_or(100),
    )
    .await
    .map_err(|e| {
        error!("Error listing research papers: {:?}", e);
        actix_web::error::ErrorInternalServerError(e.to_string())
    })?;

    let mut result = Vec::with_capacity(papers.len());
    for paper in papers {
        result.push(with_professors(&app_state, paper).await?);
    }
    Ok(Json(result))
}

#[get("/{id}")]
pub async fn get_paper(
    app_state: web::Data<Arc<AppState>>,
    _user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<impl Responder, actix_web::Error> {
    let paper = ResearchPaper::get(&app_state.pool, path.into_inner())
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Research paper not found"))?;
    Ok(Json(with_professors(&app_state, paper).await?))
}

#[post("")]
pub async fn create_paper(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    body: Json<ResearchPaperCreate>,
) -> Result<impl Responder, actix_web::Error> {
    if !user.is_admin() {
        return Err(actix_web::error::ErrorForbidden("Admin access required"));
    }

    let existing = ResearchPaper::get_by_paper_id(&app_state.pool, &body.paper_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    if existing.is_some() {
        return Err(actix_web::error::ErrorBadRequest(
            "Paper ID already registered",
        ));
    }

    let paper = ResearchPaper::create(&app_state.pool, &body)
        .await
        .map_err(|e| {
            error!("Error creating research paper: {:?}", e);
            actix_web::error::ErrorInternalServerError(e.to_string())
        })?;
    let paper = with_professors(&app_state, paper).await?;
    Ok(HttpResponse::Created().json(paper))
}

#[put("/{id}")]
pub async fn update_paper(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
    body: Json<ResearchPaperUpdate>,
) -> Result<impl Responder, actix_web::Error> {
    if !user.is_admin() {
        return Err(actix_web::error::ErrorForbidden("Admin access required"));
    }

    let paper = ResearchPaper::update(&app_state.pool, path.into_inner(), &body)
        .await
        .map_err(|e| {
            error!("Error updating research paper: {:?}", e);
            actix_web::error::ErrorInternalServerError(e.to_string())
        })?
        .ok_or_else(|| actix_web::error::ErrorNotFound("Research paper not found"))?;
    Ok(Json(with_professors(&app_state, paper).await?))
}

#[delete("/{id}")]
pub async fn delete_paper(
    app_state: web::Data<Arc<AppState>>,
    user: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<impl Responder, actix_web::Error> {
    if !user.is_admin() {
        return Err(actix_web::error::ErrorForbidden("Admin access required"));
    }

    let deleted = ResearchPaper::delete(&app_state.pool, path.into_inner())
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    if !deleted {
        return Err(actix_web::error::ErrorNotFound("Research paper not found"));
    }
    Ok(Json(MessageResponse {
        message: "Research paper deleted".to_string(),
    }))
}
