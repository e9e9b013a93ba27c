//! Tasks HTTP server.
//!
//! Exposes the task service over JSON. This is the only place where
//! service outcomes become status codes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domain::errors::DomainError;
use crate::domain::models::{NewTask, ServerConfig, Task, TaskPatch};
use crate::domain::ports::TaskStore;
use crate::services::TaskService;

/// Body of `POST /task_all_status`.
#[derive(Debug, Deserialize)]
pub struct StatusFilterRequest {
    pub status: bool,
}

/// Body of `POST /task_all_available`.
#[derive(Debug, Deserialize)]
pub struct AvailableFilterRequest {
    pub date: DateTime<Utc>,
    pub status: bool,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid listen address: {0}")]
    InvalidAddress(#[from] std::net::AddrParseError),

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

struct AppState<S: TaskStore + 'static> {
    service: TaskService<S>,
}

pub struct TasksHttpServer<S: TaskStore + 'static> {
    config: ServerConfig,
    service: TaskService<S>,
}

impl<S: TaskStore + 'static> TasksHttpServer<S> {
    pub fn new(service: TaskService<S>, config: ServerConfig) -> Self {
        Self { config, service }
    }

    /// Build the router.
    pub fn router(&self) -> Router {
        let state = Arc::new(AppState { service: self.service.clone() });

        let app = Router::new()
            .route("/task", post(create_task::<S>))
            .route(
                "/task/{id}",
                get(get_task::<S>)
                    .put(update_task::<S>)
                    .patch(patch_task::<S>)
                    .delete(delete_task::<S>),
            )
            .route("/task_all", get(list_tasks::<S>))
            .route("/task_all_status", post(list_by_status::<S>))
            .route("/task_all_available", post(list_available::<S>))
            .route("/health", get(health_check))
            .with_state(state);

        if self.config.enable_cors {
            app.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
                .layer(TraceLayer::new_for_http())
        } else {
            app.layer(TraceLayer::new_for_http())
        }
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let router = self.router();

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "tasks HTTP server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

fn error_response(err: &DomainError) -> ApiError {
    let (status, code) = match err {
        DomainError::TaskNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        DomainError::ValidationFailed(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        DomainError::StoreTimeout(_) => (StatusCode::SERVICE_UNAVAILABLE, "STORE_TIMEOUT"),
        DomainError::DatabaseError(_) | DomainError::SerializationError(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR")
        }
        DomainError::ExecutionFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: code.to_string(),
        }),
    )
}

/// List endpoints answer 404 rather than an empty array.
fn non_empty(tasks: Vec<Task>) -> Result<Json<Vec<Task>>, ApiError> {
    if tasks.is_empty() {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "No tasks found".to_string(),
                code: "NOT_FOUND".to_string(),
            }),
        ));
    }
    Ok(Json(tasks))
}

// Handler functions

async fn health_check() -> &'static str {
    "OK"
}

async fn create_task<S: TaskStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<NewTask>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let task = state.service.create(req).await.map_err(|e| error_response(&e))?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn get_task<S: TaskStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<Task>, ApiError> {
    state.service.find_by_id(id).await.map(Json).map_err(|e| error_response(&e))
}

async fn list_tasks<S: TaskStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = state.service.find_all().await.map_err(|e| error_response(&e))?;
    non_empty(tasks)
}

async fn list_by_status<S: TaskStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<StatusFilterRequest>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = state
        .service
        .find_by_status(req.status)
        .await
        .map_err(|e| error_response(&e))?;
    non_empty(tasks)
}

async fn list_available<S: TaskStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<AvailableFilterRequest>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = state
        .service
        .find_by_date_and_status(req.date, req.status)
        .await
        .map_err(|e| error_response(&e))?;
    non_empty(tasks)
}

async fn update_task<S: TaskStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    Json(req): Json<NewTask>,
) -> Result<Json<Task>, ApiError> {
    state
        .service
        .update(req.into_task(id))
        .await
        .map(Json)
        .map_err(|e| error_response(&e))
}

async fn patch_task<S: TaskStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<Task>, ApiError> {
    state
        .service
        .update_partial(id, patch)
        .await
        .map(Json)
        .map_err(|e| error_response(&e))
}

async fn delete_task<S: TaskStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<&'static str, ApiError> {
    state.service.delete(id).await.map_err(|e| error_response(&e))?;
    Ok("TASK DELETED")
}
