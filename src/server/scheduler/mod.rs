mod employees;
mod grid;
mod requests;
mod shift_types;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::server::AppState;

pub fn scheduler_router() -> Router<Arc<AppState>> {
    Router::new()
        // Employees
        .route("/employees", get(employees::list_employees))
        .route("/employees", post(employees::create_employee))
        .route("/employees/{id}", get(employees::get_employee))
        .route("/employees/{id}", put(employees::update_employee))
        .route("/employees/{id}", delete(employees::delete_employee))
        .route(
            "/employees/{id}/availability",
            get(employees::list_employee_availability),
        )
        // Shift types
        .route("/shift-types", get(shift_types::list_shift_types))
        .route("/shift-types", post(shift_types::create_shift_type))
        .route("/shift-types/{id}", delete(shift_types::delete_shift_type))
        // Availability requests
        .route("/availability-requests", get(requests::list_requests))
        .route("/availability-requests", post(requests::issue_requests))
        .route("/availability-requests/{id}", get(requests::get_request))
        .route("/availability-requests/{id}", delete(requests::revoke_request))
        .route(
            "/availability-requests/{id}/employee",
            put(requests::bind_request),
        )
        // Grid
        .route("/grid", get(grid::get_grid))
}
