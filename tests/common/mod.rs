use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use shiftpoll::auth::issue_scheduler_token;
use shiftpoll::notify::MemoryNotifier;
use shiftpoll::server::{AppState, create_router};
use shiftpoll::store::{SqliteStore, Store};

pub const LINK_BASE: &str = "https://shifts.example.com";

/// A router backed by a fresh on-disk database.
pub struct TestApp {
    _temp_dir: TempDir,
    pub state: Arc<AppState>,
    pub notifier: Arc<MemoryNotifier>,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = SqliteStore::new(temp_dir.path().join("shiftpoll.db")).expect("open store");
        store.initialize().expect("initialize store");

        let notifier = Arc::new(MemoryNotifier::new());
        let state = Arc::new(AppState::new(Arc::new(store), notifier.clone(), LINK_BASE));
        let router = create_router(state.clone());

        Self {
            _temp_dir: temp_dir,
            state,
            notifier,
            router,
        }
    }

    /// Creates a scheduler and returns its bearer token.
    pub fn scheduler(&self, name: &str) -> String {
        let scheduler = self
            .state
            .registry
            .create_scheduler(name)
            .expect("create scheduler");
        issue_scheduler_token(self.state.store.as_ref(), &scheduler.id).expect("issue token")
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, bearer: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, bearer, None).await
    }

    pub async fn post(&self, uri: &str, bearer: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, bearer, Some(body)).await
    }

    pub async fn put(&self, uri: &str, bearer: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, bearer, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, bearer: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, bearer, None).await
    }

    /// Adds an employee through the API and returns its id.
    pub async fn employee(&self, bearer: &str, email: &str, first_name: &str) -> String {
        let (status, body) = self
            .post(
                "/api/v1/employees",
                Some(bearer),
                serde_json::json!({
                    "email": email,
                    "first_name": first_name,
                    "last_name": "Tester",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_str().expect("employee id").to_string()
    }

    /// Issues one request per employee and returns the tokens in order.
    pub async fn issue(&self, bearer: &str, employee_ids: &[&str]) -> Vec<String> {
        let (status, body) = self
            .post(
                "/api/v1/availability-requests",
                Some(bearer),
                serde_json::json!({ "employee_ids": employee_ids }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]
            .as_array()
            .expect("issued requests")
            .iter()
            .map(|r| r["id"].as_str().expect("request id").to_string())
            .collect()
    }
}
