use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireScheduler;
use crate::server::AppState;
use crate::server::dto::{BindRequestRequest, IssueRequestsRequest, IssuedRequestResponse};
use crate::server::response::{ApiError, ApiResponse, ServiceResultExt};

pub async fn list_requests(
    RequireScheduler(scheduler): RequireScheduler,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let requests = state.issuer.list_requests(&scheduler.id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(requests)))
}

pub async fn issue_requests(
    RequireScheduler(scheduler): RequireScheduler,
    State(state): State<Arc<AppState>>,
    Json(req): Json<IssueRequestsRequest>,
) -> impl IntoResponse {
    let requests = match (req.employee_ids.is_empty(), req.emails.is_empty()) {
        (false, true) => state
            .issuer
            .issue_requests(&scheduler.id, &req.employee_ids)
            .or_not_found("Employee not found")?,
        (true, false) => state
            .issuer
            .issue_requests_by_email(&scheduler.id, &req.emails)?,
        _ => {
            return Err(ApiError::bad_request(
                "Provide either employee_ids or emails",
            ));
        }
    };

    let issued: Vec<IssuedRequestResponse> = requests
        .into_iter()
        .map(|request| IssuedRequestResponse {
            link: state.issuer.link_for(&request.id),
            request,
        })
        .collect();

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(issued))))
}

pub async fn get_request(
    RequireScheduler(scheduler): RequireScheduler,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let request = state
        .issuer
        .get_request(&scheduler.id, &id)
        .or_not_found("Availability request not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(request)))
}

pub async fn revoke_request(
    RequireScheduler(scheduler): RequireScheduler,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state
        .issuer
        .revoke_request(&scheduler.id, &id)
        .or_not_found("Availability request not found")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn bind_request(
    RequireScheduler(scheduler): RequireScheduler,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<BindRequestRequest>,
) -> impl IntoResponse {
    let request = state
        .issuer
        .bind_request(&scheduler.id, &id, &req.employee_id)
        .or_not_found("Availability request or employee not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(request)))
}
