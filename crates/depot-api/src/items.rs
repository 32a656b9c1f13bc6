//! Handlers for `/items` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/items` | Body: `{"client_id":..,"sku":"A-1","name":"Widget"}` |
//! | `GET`  | `/items/:id` | 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use depot_core::item::{Item, NewItem};
use depot_store_sqlite::SqliteStore;
use uuid::Uuid;

use crate::{actor::RequestActor, error::ApiError};

/// `POST /items`
pub async fn create(
  State(store): State<Arc<SqliteStore>>,
  RequestActor(actor): RequestActor,
  Json(body): Json<NewItem>,
) -> Result<impl IntoResponse, ApiError> {
  let item = store.register_item(actor, body).await?;
  Ok((StatusCode::CREATED, Json(item)))
}

/// `GET /items/:id`
pub async fn get_one(
  State(store): State<Arc<SqliteStore>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Item>, ApiError> {
  let item = store
    .item(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("item {id} not found")))?;
  Ok(Json(item))
}
