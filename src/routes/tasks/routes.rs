use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::dto::{CreateTask, UpdateTask};
use super::service::TaskError;
use crate::state::AppState;

impl IntoResponse for TaskError {
    fn into_response(self) -> Response {
        match self {
            TaskError::Validation(errors) => {
                let fields: serde_json::Map<String, serde_json::Value> = errors
                    .errors()
                    .iter()
                    .map(|e| (e.field.to_string(), json!(e.message)))
                    .collect();
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "Invalid task data", "fields": fields})),
                )
                    .into_response()
            }
            TaskError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Task not found"})),
            )
                .into_response(),
            TaskError::Service(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": message})),
            )
                .into_response(),
        }
    }
}

fn bad_body(rejection: JsonRejection) -> Response {
    tracing::warn!(error = %rejection, "unreadable task body");
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": rejection.body_text()})),
    )
        .into_response()
}

pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<CreateTask>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };

    match state.tasks.create_task(body).await {
        Ok(t) => (StatusCode::CREATED, Json(t)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn list(State(state): State<AppState>) -> Response {
    match state.tasks.list_tasks().await {
        Ok(tasks) => (StatusCode::OK, Json(tasks)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.tasks.get_task(&id).await {
        Ok(t) => (StatusCode::OK, Json(t)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Serves both PUT and PATCH; either way only the supplied fields change.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateTask>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };

    match state.tasks.update_task(&id, body).await {
        Ok(t) => (StatusCode::OK, Json(t)).into_response(),
        Err(e) => e.into_response(),
    }
}

// 204 responses carry no body, so the confirmation only goes to the log
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.tasks.delete_task(&id).await {
        Ok(()) => {
            tracing::debug!(%id, "Task deleted successfully");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => e.into_response(),
    }
}
