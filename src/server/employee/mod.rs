//! Routes reached through an availability link. The token in the path is
//! the only credential.

mod availability;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::server::AppState;

pub fn employee_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/{token}", get(availability::get_request_page))
        .route("/{token}/shift-types", get(availability::list_shift_types))
        .route("/{token}/availability", get(availability::list_availability))
        .route("/{token}/availability", post(availability::submit_availability))
        .route(
            "/{token}/availability/{entry_id}",
            delete(availability::delete_availability),
        )
}
