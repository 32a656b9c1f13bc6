//! JSON REST API for Depot.
//!
//! Exposes an axum [`Router`] backed by a [`SqliteStore`]. Authentication,
//! TLS, and transport concerns are the caller's responsibility; the acting
//! user arrives in request headers (see [`actor`]).
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", depot_api::api_router(store.clone()))
//! ```

pub mod actor;
pub mod documents;
pub mod error;
pub mod items;
pub mod reports;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use depot_store_sqlite::SqliteStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router(store: Arc<SqliteStore>) -> Router<()> {
  Router::new()
    // Items
    .route("/items", post(items::create))
    .route("/items/{id}", get(items::get_one))
    // Documents
    .route("/documents", get(documents::list).post(documents::create))
    .route(
      "/documents/{id}",
      get(documents::get_one)
        .put(documents::update)
        .delete(documents::remove),
    )
    .route("/documents/{id}/lines", post(documents::add_line))
    .route("/documents/{id}/lines/{line_id}", delete(documents::remove_line))
    .route("/documents/{id}/post", post(documents::post_one))
    // Ledger reads
    .route("/balances", get(reports::balances))
    .route("/moves", get(reports::moves))
    .route("/reports/turnover", get(reports::turnover))
    .route("/reports/reconcile", get(reports::reconcile))
    .route("/audit", get(reports::audit))
    .with_state(store)
}
