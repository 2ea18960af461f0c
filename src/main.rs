use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{get, web, App, HttpServer, Responder};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

mod auth;
mod config;
mod middleware;
mod models;
mod routes;
mod types;

pub use config::AppConfig;

pub struct AppState {
    pub pool: PgPool,
}

#[get("/")]
async fn index() -> impl Responder {
    web::Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[get("/health")]
async fn health() -> impl Responder {
    web::Json(serde_json::json!({ "status": "healthy" }))
}

#[derive(OpenApi)]
#[openapi(components(schemas(
    models::User,
    models::user::UserRole,
    models::Student,
    models::StudentWithUser,
    models::Professor,
    models::ProfessorWithUser,
    models::ResearchPaper,
    models::ResearchPaperWithProfessors,
    models::Group,
    models::GroupWithMentors,
    models::MentorSummary,
    models::GroupMember,
    models::group::MemberRole,
    models::GroupInvitation,
    models::GroupJoinRequest,
    models::ProposalStatus,
    models::MentorshipRequest,
    models::MentorshipRequestWithDetails,
    models::Notification,
    models::GroupChatMessage,
    models::ChatMessageView,
    models::chat::SenderType,
    types::RegisterRequest,
    types::LoginRequest,
    types::TokenResponse,
    types::StudentProfileUpdate,
    types::ProfessorProfileUpdate,
    types::StudentCreate,
    types::StudentUpdate,
    types::ProfessorCreate,
    types::ProfessorUpdate,
    types::ResearchPaperCreate,
    types::ResearchPaperUpdate,
    types::GroupCreate,
    types::GroupUpdate,
    types::GroupInvitationCreate,
    types::GroupJoinRequestCreate,
    types::StatusUpdate,
    types::MentorshipRequestCreate,
    types::MentorshipRequestUpdate,
    types::NotificationMarkRead,
    types::NotificationAction,
    types::ActionResponse,
    types::CountResponse,
    types::ChatMessageCreate,
    types::ChatMessageUpdate,
    types::UnreadCountResponse,
    types::BulkStudentRecord,
    types::BulkProfessorRecord,
    types::BulkAccountCreated,
    types::BulkUploadResponse,
    types::MessageResponse,
)))]
struct ApiDoc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let app_config = Arc::new(AppConfig::from_env()?);

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&app_config.database_url)
        .await?;
    sqlx::migrate!().run(&pool).await?;

    let app_state = Arc::new(AppState { pool });

    info!("Listening on {}:{}", app_config.host, app_config.port);
    let bind_addr = (app_config.host.clone(), app_config.port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::Data::new(app_config.clone()))
            .wrap(Cors::permissive())
            .service(index)
            .service(health)
            .service(Scalar::with_url("/scalar", ApiDoc::openapi()))
            .service(
                web::scope("/api/v1")
                    .wrap(middleware::auth::Authentication {
                        app_config: app_config.clone(),
                    })
                    .service(
                        web::scope("/auth")
                            .service(routes::auth::register)
                            .service(routes::auth::login)
                            .service(routes::auth::me)
                            .service(routes::auth::get_student_profile)
                            .service(routes::auth::update_student_profile)
                            .service(routes::auth::get_professor_profile)
                            .service(routes::auth::update_professor_profile),
                    )
                    .service(
                        web::scope("/students")
                            .service(routes::students::list_students)
                            .service(routes::students::create_student)
                            .service(routes::students::bulk_create_students)
                            .service(routes::students::get_student)
                            .service(routes::students::update_student)
                            .service(routes::students::delete_student),
                    )
                    .service(
                        web::scope("/professors")
                            .service(routes::professors::list_professors)
                            .service(routes::professors::create_professor)
                            .service(routes::professors::bulk_create_professors)
                            .service(routes::professors::get_professor)
                            .service(routes::professors::update_professor)
                            .service(routes::professors::delete_professor),
                    )
                    .service(
                        web::scope("/research")
                            .service(routes::research::list_papers)
                            .service(routes::research::create_paper)
                            .service(routes::research::get_paper)
                            .service(routes::research::update_paper)
                            .service(routes::research::delete_paper),
                    )
                    .service(
                        // Literal segments must be registered ahead of /{id}.
                        web::scope("/groups")
                            .service(routes::groups::list_groups)
                            .service(routes::groups::my_groups)
                            .service(routes::groups::create_invitation)
                            .service(routes::groups::list_student_invitations)
                            .service(routes::groups::respond_to_invitation)
                            .service(routes::groups::create_join_request)
                            .service(routes::groups::list_group_join_requests)
                            .service(routes::groups::respond_to_join_request)
                            .service(routes::groups::create_group)
                            .service(routes::groups::get_group)
                            .service(routes::groups::update_group)
                            .service(routes::groups::delete_group)
                            .service(routes::groups::get_group_members)
                            .service(routes::groups::add_group_member)
                            .service(routes::groups::remove_group_member),
                    )
                    .service(
                        web::scope("/mentorship-requests")
                            .service(routes::mentorship::create_request)
                            .service(routes::mentorship::list_for_professor)
                            .service(routes::mentorship::list_for_group)
                            .service(routes::mentorship::respond_to_request)
                            .service(routes::mentorship::withdraw_request),
                    )
                    .service(
                        web::scope("/notifications")
                            .service(routes::notifications::list_notifications)
                            .service(routes::notifications::unread_count)
                            .service(routes::notifications::mark_many_read)
                            .service(routes::notifications::join_request_action)
                            .service(routes::notifications::invitation_action)
                            .service(routes::notifications::mark_one_read)
                            .service(routes::notifications::delete_notification),
                    )
                    .service(
                        web::scope("/chat")
                            .service(routes::chat::send_message)
                            .service(routes::chat::list_messages)
                            .service(routes::chat::mark_all_read)
                            .service(routes::chat::mark_message_read)
                            .service(routes::chat::edit_message)
                            .service(routes::chat::delete_message)
                            .service(routes::chat::unread_count),
                    ),
            )
    })
    .bind(bind_addr)?
    .run()
    .await?;

    Ok(())
}
