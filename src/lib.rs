//! # Shiftpoll
//!
//! Collects shift availability from employees through per-employee links
//! and reconciles it into a schedulable grid. Usable both as a standalone
//! binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! shiftpoll = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::path::PathBuf;
//! use shiftpoll::notify::LogNotifier;
//! use shiftpoll::server::{AppState, create_router};
//! use shiftpoll::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new(&PathBuf::from("./data/shiftpoll.db")).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(
//!     Arc::new(store),
//!     Arc::new(LogNotifier),
//!     "https://shifts.example.com",
//! ));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `shiftpoll` binary. Disable with `default-features = false`.

pub mod auth;
pub mod config;
pub mod error;
pub mod notify;
pub mod server;
pub mod service;
pub mod store;
pub mod types;
