use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireScheduler;
use crate::server::AppState;
use crate::server::dto::{CreateEmployeeRequest, EmployeeDetailResponse, UpdateEmployeeRequest};
use crate::server::response::{ApiError, ApiResponse, ServiceResultExt};
use crate::service::{EmployeePatch, NewEmployee};

pub async fn list_employees(
    RequireScheduler(scheduler): RequireScheduler,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let employees = state.registry.list_employees(&scheduler.id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(employees)))
}

pub async fn create_employee(
    RequireScheduler(scheduler): RequireScheduler,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateEmployeeRequest>,
) -> impl IntoResponse {
    let employee = state.registry.add_employee(
        &scheduler.id,
        NewEmployee {
            email: req.email,
            first_name: req.first_name,
            last_name: req.last_name,
            employee_number: req.employee_number,
        },
    )?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(employee))))
}

pub async fn get_employee(
    RequireScheduler(scheduler): RequireScheduler,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let employee = state
        .registry
        .get_employee(&scheduler.id, &id)
        .or_not_found("Employee not found")?;
    let requests = state.issuer.list_employee_requests(&employee)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(EmployeeDetailResponse {
        employee,
        requests,
    })))
}

pub async fn update_employee(
    RequireScheduler(scheduler): RequireScheduler,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateEmployeeRequest>,
) -> impl IntoResponse {
    let patch = EmployeePatch {
        email: req.email,
        first_name: req.first_name,
        last_name: req.last_name,
        employee_number: req.employee_number.map(Some),
    };

    let employee = state
        .registry
        .update_employee(&scheduler.id, &id, patch)
        .or_not_found("Employee not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(employee)))
}

pub async fn delete_employee(
    RequireScheduler(scheduler): RequireScheduler,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state
        .registry
        .remove_employee(&scheduler.id, &id)
        .or_not_found("Employee not found")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn list_employee_availability(
    RequireScheduler(scheduler): RequireScheduler,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let entries = state
        .ledger
        .list_for_employee(&scheduler.id, &id)
        .or_not_found("Employee not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(entries)))
}
