//! HTTP API handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::QueueError;
use crate::player::PlayerStatus;
use crate::tracks::Destination;
use crate::ui::server::AppState;

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    pub room: String,
    pub channel: String,
    pub media: String,
}

#[derive(Debug, Serialize)]
pub struct Enqueued {
    pub id: Uuid,
    pub queued: usize,
}

#[derive(Debug, Serialize)]
pub struct Cleared {
    pub dropped: usize,
}

/// Whether a control command changed anything
#[derive(Debug, Serialize)]
pub struct Changed {
    pub changed: bool,
}

/// Queue a media item
pub async fn enqueue(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EnqueueRequest>,
) -> (StatusCode, Json<ApiResponse<Enqueued>>) {
    if req.media.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, Json(ApiResponse::error("media must not be empty")));
    }

    let destination = Destination::new(req.room, req.channel);
    match state.handle.enqueue(destination, req.media) {
        Ok(task) => {
            let queued = state.handle.status().queued;
            (StatusCode::CREATED, Json(ApiResponse::ok(Enqueued { id: task.id, queued })))
        }
        Err(e @ QueueError::Full(_)) => (StatusCode::CONFLICT, Json(ApiResponse::error(e.to_string()))),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, Json(ApiResponse::error(e.to_string()))),
    }
}

/// Drop pending tasks and skip the current one
pub async fn clear_queue(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Cleared>> {
    let dropped = state.handle.clear_queue();
    Json(ApiResponse::ok(Cleared { dropped }))
}

pub async fn pause(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Changed>> {
    Json(ApiResponse::ok(Changed {
        changed: state.handle.pause(),
    }))
}

pub async fn resume(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Changed>> {
    Json(ApiResponse::ok(Changed {
        changed: state.handle.resume(),
    }))
}

pub async fn skip(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Changed>> {
    Json(ApiResponse::ok(Changed {
        changed: state.handle.skip(),
    }))
}

/// Get player status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<ApiResponse<PlayerStatus>> {
    Json(ApiResponse::ok(state.handle.status()))
}
