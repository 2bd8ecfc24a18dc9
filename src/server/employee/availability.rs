use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::server::AppState;
use crate::server::dto::{BatchItemResponse, RequestPageResponse, SubmitAvailabilityRequest};
use crate::server::response::{ApiError, ApiResponse, ServiceResultExt};
use crate::server::validation::{parse_date, parse_time};
use crate::types::TimeRange;

pub async fn get_request_page(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> impl IntoResponse {
    let resolved = state
        .issuer
        .resolve(&token)
        .or_not_found("Availability request not found")?;
    let shift_types = state
        .catalog
        .list_shift_types(&resolved.request.scheduler_id)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(RequestPageResponse {
        request: resolved.request,
        employee: resolved.employee,
        shift_types,
    })))
}

pub async fn list_shift_types(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> impl IntoResponse {
    let shift_types = state
        .catalog
        .list_shift_types_for_token(&token)
        .or_not_found("Availability request not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(shift_types)))
}

pub async fn list_availability(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> impl IntoResponse {
    let view = state
        .grid
        .grid_for_token(&token)
        .or_not_found("Availability request not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(view)))
}

pub async fn submit_availability(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Json(req): Json<SubmitAvailabilityRequest>,
) -> Result<Response, ApiError> {
    let day = parse_date(&req.day, "day")?;

    match (req.start_time, req.end_time, req.shift_type_id, req.shift_type_ids) {
        (Some(start), Some(end), None, None) => {
            let range = TimeRange::new(
                parse_time(&start, "start_time")?,
                parse_time(&end, "end_time")?,
            )?;
            let entry = state.ledger.submit(&token, day, range)?;
            Ok((StatusCode::CREATED, Json(ApiResponse::success(entry))).into_response())
        }
        (None, None, Some(shift_type_id), None) => {
            let entry = state
                .ledger
                .submit_shift_type(&token, day, &shift_type_id)
                .or_not_found("Shift type not found")?;
            Ok((StatusCode::CREATED, Json(ApiResponse::success(entry))).into_response())
        }
        (None, None, None, Some(ids)) => {
            let results = state.ledger.submit_shift_types(&token, day, &ids)?;
            let items: Vec<BatchItemResponse> = ids
                .into_iter()
                .zip(results)
                .map(|(shift_type_id, result)| match result {
                    Ok(entry) => BatchItemResponse {
                        shift_type_id,
                        entry: Some(entry),
                        error: None,
                    },
                    Err(e) => BatchItemResponse {
                        shift_type_id,
                        entry: None,
                        error: Some(ApiError::from(e).message),
                    },
                })
                .collect();
            Ok(Json(ApiResponse::success(items)).into_response())
        }
        _ => Err(ApiError::bad_request(
            "Provide start_time and end_time, shift_type_id, or shift_type_ids",
        )),
    }
}

pub async fn delete_availability(
    State(state): State<Arc<AppState>>,
    Path((token, entry_id)): Path<(String, String)>,
) -> impl IntoResponse {
    state
        .ledger
        .remove(&entry_id, &token)
        .or_not_found("Availability entry not found")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
