use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};

use super::employee::employee_router;
use super::scheduler::scheduler_router;
use crate::notify::Notifier;
use crate::service::{Catalog, GridView, Issuer, Ledger, Registry};
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub registry: Registry,
    pub catalog: Catalog,
    pub issuer: Issuer,
    pub ledger: Ledger,
    pub grid: GridView,
}

impl AppState {
    /// Wires every service to the same store. `link_base` prefixes the
    /// availability links sent to employees.
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>, link_base: &str) -> Self {
        let issuer = Issuer::new(store.clone(), notifier, link_base);
        Self {
            registry: Registry::new(store.clone(), issuer.clone()),
            catalog: Catalog::new(store.clone()),
            ledger: Ledger::new(store.clone()),
            grid: GridView::new(store.clone(), issuer.clone()),
            issuer,
            store,
        }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    // Token routes carry the bearer token in the path.
    let path = if uri.path().starts_with("/requests/") {
        "/requests/{token}"
    } else {
        uri.path()
    };

    tracing::info!(
        "{} {} {} {}ms",
        method,
        path,
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", scheduler_router())
        .nest("/requests", employee_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
