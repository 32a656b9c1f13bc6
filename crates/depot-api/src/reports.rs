//! Read-only ledger endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/balances` | `?client_id&warehouse_id&item_id&include_zero` |
//! | `GET`  | `/moves` | `?item_id&document_id&client_id&warehouse_id&from&until&limit` |
//! | `GET`  | `/reports/turnover` | `?from&until` required, id filters optional |
//! | `GET`  | `/reports/reconcile` | Empty list when balances match the ledger |
//! | `GET`  | `/audit` | Optional `?entity_id` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::{DateTime, Utc};
use depot_core::{
  audit::AuditEntry,
  balance::{Balance, BalanceQuery},
  movement::{Move, MoveQuery},
  report::{Discrepancy, TurnoverRow},
};
use depot_store_sqlite::SqliteStore;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /balances`
pub async fn balances(
  State(store): State<Arc<SqliteStore>>,
  Query(query): Query<BalanceQuery>,
) -> Result<Json<Vec<Balance>>, ApiError> {
  Ok(Json(store.balances(query).await?))
}

/// `GET /moves`
pub async fn moves(
  State(store): State<Arc<SqliteStore>>,
  Query(query): Query<MoveQuery>,
) -> Result<Json<Vec<Move>>, ApiError> {
  if let (Some(from), Some(until)) = (query.from, query.until)
    && from > until
  {
    return Err(ApiError::BadRequest("`from` is after `until`".into()));
  }
  Ok(Json(store.moves(query).await?))
}

#[derive(Debug, Deserialize)]
pub struct TurnoverParams {
  pub from:         DateTime<Utc>,
  pub until:        DateTime<Utc>,
  pub item_id:      Option<Uuid>,
  pub client_id:    Option<Uuid>,
  pub warehouse_id: Option<Uuid>,
}

/// `GET /reports/turnover`
pub async fn turnover(
  State(store): State<Arc<SqliteStore>>,
  Query(params): Query<TurnoverParams>,
) -> Result<Json<Vec<TurnoverRow>>, ApiError> {
  if params.from > params.until {
    return Err(ApiError::BadRequest("`from` is after `until`".into()));
  }
  let scope = MoveQuery {
    item_id: params.item_id,
    client_id: params.client_id,
    warehouse_id: params.warehouse_id,
    ..MoveQuery::default()
  };
  Ok(Json(store.turnover(scope, params.from, params.until).await?))
}

/// `GET /reports/reconcile`
pub async fn reconcile(
  State(store): State<Arc<SqliteStore>>,
) -> Result<Json<Vec<Discrepancy>>, ApiError> {
  Ok(Json(store.reconcile().await?))
}

#[derive(Debug, Deserialize)]
pub struct AuditParams {
  pub entity_id: Option<Uuid>,
}

/// `GET /audit[?entity_id=<uuid>]`
pub async fn audit(
  State(store): State<Arc<SqliteStore>>,
  Query(params): Query<AuditParams>,
) -> Result<Json<Vec<AuditEntry>>, ApiError> {
  Ok(Json(store.audit_trail(params.entity_id).await?))
}
