use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireScheduler;
use crate::server::AppState;
use crate::server::dto::CreateShiftTypeRequest;
use crate::server::response::{ApiError, ApiResponse, ServiceResultExt};
use crate::server::validation::{parse_color, parse_time};
use crate::service::NewShiftType;

pub async fn list_shift_types(
    RequireScheduler(scheduler): RequireScheduler,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let shift_types = state.catalog.list_shift_types(&scheduler.id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(shift_types)))
}

pub async fn create_shift_type(
    RequireScheduler(scheduler): RequireScheduler,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateShiftTypeRequest>,
) -> impl IntoResponse {
    let new = NewShiftType {
        name: req.name,
        start_time: parse_time(&req.start_time, "start_time")?,
        end_time: parse_time(&req.end_time, "end_time")?,
        color: parse_color(&req.color)?,
    };

    let shift_type = state.catalog.add_shift_type(&scheduler.id, new)?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(shift_type))))
}

pub async fn delete_shift_type(
    RequireScheduler(scheduler): RequireScheduler,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state
        .catalog
        .remove_shift_type(&scheduler.id, &id)
        .or_not_found("Shift type not found")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
