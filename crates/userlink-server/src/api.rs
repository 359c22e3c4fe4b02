use std::sync::Arc;

use axum::{
    extract::{
        multipart::MultipartError, rejection::JsonRejection, DefaultBodyLimit, Multipart, Path,
        Query, State,
    },
    http::{Method, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use userlink_store::{Database, FileRecord, Message, User};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::orchestrator::{ChatService, DeletionReport, Upload};
use crate::preview::FilePreview;

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub chat: Arc<ChatService>,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let body_limit = state.config.max_upload_size.saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/", get(banner))
        .route("/health", get(health_check))
        .route("/chat/users", post(create_chat_user))
        .route("/chat/users/{id}", delete(delete_chat_user))
        .route("/chat/users/{id}/questions", post(ask_question))
        .route("/chat/users/{id}/messages", get(user_messages))
        .route("/chat/users/{id}/files", get(user_files).post(upload_file))
        .route("/chat/files/{id}", delete(delete_file))
        .route("/chat/files/{id}/content", get(file_content))
        .route("/{resource}", get(list_records).post(create_record))
        .route(
            "/{resource}/{id}",
            get(get_record)
                .put(replace_record)
                .patch(merge_record)
                .delete(delete_record),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct BannerResponse {
    name: &'static str,
    version: &'static str,
    resources: Vec<String>,
}

#[derive(Deserialize)]
struct CreateUserRequest {
    name: String,
}

#[derive(Deserialize)]
struct QuestionRequest {
    question: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn banner(State(state): State<AppState>) -> Json<BannerResponse> {
    Json(BannerResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        resources: state.db.resources().await,
    })
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ServerError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ServerError::BadRequest(e.body_text()))
}

// ─── Flat store REST surface ───

async fn list_records(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Value>>, ServerError> {
    let query = userlink_store::Query::from_pairs(params);
    Ok(Json(state.db.list(&resource, &query).await?))
}

async fn get_record(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<Json<Value>, ServerError> {
    Ok(Json(state.db.get(&resource, &id).await?))
}

async fn create_record(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ServerError> {
    let record = state.db.create(&resource, json_body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn replace_record(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ServerError> {
    let body = json_body(payload)?;
    Ok(Json(state.db.replace(&resource, &id, body).await?))
}

async fn merge_record(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ServerError> {
    let body = json_body(payload)?;
    Ok(Json(state.db.merge(&resource, &id, body).await?))
}

async fn delete_record(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
) -> Result<Json<Value>, ServerError> {
    Ok(Json(state.db.delete(&resource, &id).await?))
}

// ─── Chat endpoints ───

async fn create_chat_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ServerError> {
    let req = json_body(payload)?;
    let user = state.chat.create_user_with_assistant(&req.name).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn delete_chat_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeletionReport>, ServerError> {
    Ok(Json(state.chat.delete_user(&id).await?))
}

async fn ask_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<QuestionRequest>, JsonRejection>,
) -> Result<Json<Message>, ServerError> {
    let req = json_body(payload)?;
    Ok(Json(state.chat.ask_question(&id, &req.question).await?))
}

async fn user_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Message>>, ServerError> {
    Ok(Json(state.chat.user_messages(&id).await?))
}

async fn user_files(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<FileRecord>>, ServerError> {
    Ok(Json(state.chat.user_files(&id).await?))
}

fn multipart_error(err: MultipartError, max: usize) -> ServerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge { size: max + 1, max }
    } else {
        ServerError::BadRequest(format!("Multipart error: {err}"))
    }
}

async fn upload_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<FileRecord>), ServerError> {
    let max = state.config.max_upload_size;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let name = field.file_name().unwrap_or("upload").to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await.map_err(|e| multipart_error(e, max))?;

        if data.len() > max {
            return Err(ServerError::PayloadTooLarge {
                size: data.len(),
                max,
            });
        }

        info!(user = %id, name = %name, size = data.len(), "File received via API");
        let file = state
            .chat
            .upload_file(
                &id,
                Upload {
                    name,
                    mime_type,
                    data: data.to_vec(),
                },
            )
            .await?;
        return Ok((StatusCode::CREATED, Json(file)));
    }

    Err(ServerError::BadRequest(
        "Missing 'file' field in multipart form".to_string(),
    ))
}

async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FileRecord>, ServerError> {
    Ok(Json(state.chat.delete_file(&id).await?))
}

async fn file_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FilePreview>, ServerError> {
    Ok(Json(state.chat.file_preview(&id).await?))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
