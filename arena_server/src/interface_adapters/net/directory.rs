use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::protocol::RoomSummaryDto;
use crate::interface_adapters::state::AppState;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

#[derive(Debug, serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    // Rooms currently ticking, private ones included.
    rooms: usize,
}

pub async fn list_rooms_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rooms: Vec<RoomSummaryDto> = state
        .room_registry
        .list_rooms()
        .await
        .into_iter()
        .map(RoomSummaryDto::from)
        .collect();
    Json(rooms)
}

pub async fn get_room_handler(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> impl IntoResponse {
    match state.room_registry.get_room(&room_id).await {
        Some(room) => {
            (StatusCode::OK, Json(RoomSummaryDto::from(room.summary()))).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "room not found".to_string(),
            }),
        )
            .into_response(),
    }
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        rooms: state.room_registry.room_count().await,
    })
}
