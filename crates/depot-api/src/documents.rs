//! Handlers for `/documents` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/documents` | Optional `?kind=<kind>&status=draft\|posted` |
//! | `POST`   | `/documents` | Body: `{"kind":"receipt","number":..,"warehouse_id":..}` |
//! | `GET`    | `/documents/:id` | Document with its lines; 404 if not found |
//! | `PUT`    | `/documents/:id` | Replace the header of a draft |
//! | `DELETE` | `/documents/:id` | Delete a draft |
//! | `POST`   | `/documents/:id/lines` | Append a line to a draft |
//! | `DELETE` | `/documents/:id/lines/:line_id` | Remove a line from a draft |
//! | `POST`   | `/documents/:id/post` | Post a draft |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use depot_core::{
  document::{
    Document, DocumentHeader, DocumentKind, DocumentQuery, DocumentView,
    NewLine,
  },
  posting::PostingOutcome,
};
use depot_store_sqlite::SqliteStore;
use serde::Deserialize;
use uuid::Uuid;

use crate::{actor::RequestActor, error::ApiError};

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /documents[?kind=<kind>][&status=<status>]`
pub async fn list(
  State(store): State<Arc<SqliteStore>>,
  Query(query): Query<DocumentQuery>,
) -> Result<Json<Vec<Document>>, ApiError> {
  Ok(Json(store.documents(query).await?))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub kind:   DocumentKind,
  #[serde(flatten)]
  pub header: DocumentHeader,
}

/// `POST /documents`
pub async fn create(
  State(store): State<Arc<SqliteStore>>,
  RequestActor(actor): RequestActor,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let document = store.create_document(actor, body.kind, body.header).await?;
  Ok((StatusCode::CREATED, Json(document)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /documents/:id`
pub async fn get_one(
  State(store): State<Arc<SqliteStore>>,
  Path(id): Path<Uuid>,
) -> Result<Json<DocumentView>, ApiError> {
  let view = store
    .document(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("document {id} not found")))?;
  Ok(Json(view))
}

// ─── Draft editing ───────────────────────────────────────────────────────────

/// `PUT /documents/:id`
pub async fn update(
  State(store): State<Arc<SqliteStore>>,
  RequestActor(actor): RequestActor,
  Path(id): Path<Uuid>,
  Json(header): Json<DocumentHeader>,
) -> Result<Json<Document>, ApiError> {
  Ok(Json(store.update_document(actor, id, header).await?))
}

/// `DELETE /documents/:id`
pub async fn remove(
  State(store): State<Arc<SqliteStore>>,
  RequestActor(actor): RequestActor,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  store.delete_document(actor, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /documents/:id/lines`
pub async fn add_line(
  State(store): State<Arc<SqliteStore>>,
  RequestActor(actor): RequestActor,
  Path(id): Path<Uuid>,
  Json(line): Json<NewLine>,
) -> Result<impl IntoResponse, ApiError> {
  let line = store.add_line(actor, id, line).await?;
  Ok((StatusCode::CREATED, Json(line)))
}

/// `DELETE /documents/:id/lines/:line_id`
pub async fn remove_line(
  State(store): State<Arc<SqliteStore>>,
  RequestActor(actor): RequestActor,
  Path((id, line_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
  store.remove_line(actor, id, line_id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Post ────────────────────────────────────────────────────────────────────

/// `POST /documents/:id/post`
pub async fn post_one(
  State(store): State<Arc<SqliteStore>>,
  RequestActor(actor): RequestActor,
  Path(id): Path<Uuid>,
) -> Result<Json<PostingOutcome>, ApiError> {
  Ok(Json(store.post_document(actor, id).await?))
}
