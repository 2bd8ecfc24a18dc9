use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::auth::RequireScheduler;
use crate::server::AppState;
use crate::server::dto::GridParams;
use crate::server::response::{ApiError, ApiResponse};
use crate::server::validation::parse_date;

pub async fn get_grid(
    RequireScheduler(scheduler): RequireScheduler,
    State(state): State<Arc<AppState>>,
    Query(params): Query<GridParams>,
) -> impl IntoResponse {
    let start = parse_date(&params.start, "start")?;
    let end = parse_date(&params.end, "end")?;

    let grid = state.grid.grid_for_scheduler(&scheduler.id, start, end)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(grid)))
}
