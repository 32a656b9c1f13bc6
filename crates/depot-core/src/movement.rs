//! Moves: the append-only ledger of signed quantity changes.
//!
//! A move is written once, inside the transaction that posts its document,
//! and never updated or deleted afterwards.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{
  document::DocumentKind,
  key::{Dim, StockKey},
};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MoveType {
  InReceipt,
  Ship,
  Adjustment,
  Return,
  WriteOff,
}

impl MoveType {
  pub fn as_str(self) -> &'static str { self.into() }
}

/// A move before the ledger has assigned it an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMove {
  pub move_type:     MoveType,
  pub document_kind: DocumentKind,
  pub document_id:   Uuid,
  pub client_id:     Uuid,
  pub warehouse_id:  Uuid,
  pub location_from: Dim<Uuid>,
  pub location_to:   Dim<Uuid>,
  pub item_id:       Uuid,
  pub batch:         Dim<String>,
  pub serial:        Dim<String>,
  pub expiry:        Dim<NaiveDate>,
  /// Signed: positive adds stock, negative removes it.
  pub qty:           Decimal,
  pub created_by:    String,
  pub created_at:    DateTime<Utc>,
  pub note:          Option<String>,
}

impl NewMove {
  /// Build a move against `key`. The key's location becomes the destination
  /// of an incoming move or the source of an outgoing one.
  #[allow(clippy::too_many_arguments)]
  pub fn against(
    key: &StockKey,
    move_type: MoveType,
    document_kind: DocumentKind,
    document_id: Uuid,
    qty: Decimal,
    created_by: &str,
    created_at: DateTime<Utc>,
    note: Option<String>,
  ) -> Self {
    let (location_from, location_to) = if qty < Decimal::ZERO {
      (key.location_id.clone(), Dim::Unspecified)
    } else {
      (Dim::Unspecified, key.location_id.clone())
    };
    Self {
      move_type,
      document_kind,
      document_id,
      client_id: key.client_id,
      warehouse_id: key.warehouse_id,
      location_from,
      location_to,
      item_id: key.item_id,
      batch: key.batch.clone(),
      serial: key.serial.clone(),
      expiry: key.expiry.clone(),
      qty,
      created_by: created_by.to_owned(),
      created_at,
      note,
    }
  }

  pub fn into_move(self, move_id: Uuid) -> Move {
    Move {
      move_id,
      move_type: self.move_type,
      document_kind: self.document_kind,
      document_id: self.document_id,
      client_id: self.client_id,
      warehouse_id: self.warehouse_id,
      location_from: self.location_from,
      location_to: self.location_to,
      item_id: self.item_id,
      batch: self.batch,
      serial: self.serial,
      expiry: self.expiry,
      qty: self.qty,
      created_by: self.created_by,
      created_at: self.created_at,
      note: self.note,
    }
  }
}

/// A recorded move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
  pub move_id:       Uuid,
  pub move_type:     MoveType,
  pub document_kind: DocumentKind,
  pub document_id:   Uuid,
  pub client_id:     Uuid,
  pub warehouse_id:  Uuid,
  pub location_from: Dim<Uuid>,
  pub location_to:   Dim<Uuid>,
  pub item_id:       Uuid,
  pub batch:         Dim<String>,
  pub serial:        Dim<String>,
  pub expiry:        Dim<NaiveDate>,
  pub qty:           Decimal,
  pub created_by:    String,
  pub created_at:    DateTime<Utc>,
  pub note:          Option<String>,
}

impl Move {
  /// The balance row this move changed.
  pub fn key(&self) -> StockKey {
    let location_id = if self.qty < Decimal::ZERO {
      self.location_from.clone()
    } else {
      self.location_to.clone()
    };
    StockKey {
      client_id: self.client_id,
      warehouse_id: self.warehouse_id,
      location_id,
      item_id: self.item_id,
      batch: self.batch.clone(),
      serial: self.serial.clone(),
      expiry: self.expiry.clone(),
    }
  }
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// Parameters for [`crate::store::StockStore::list_moves`]: movement history
/// by item, by document or by date range.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoveQuery {
  pub item_id:      Option<Uuid>,
  pub document_id:  Option<Uuid>,
  pub client_id:    Option<Uuid>,
  pub warehouse_id: Option<Uuid>,
  /// Inclusive lower bound on `created_at`.
  pub from:         Option<DateTime<Utc>>,
  /// Exclusive upper bound on `created_at`.
  pub until:        Option<DateTime<Utc>>,
  pub limit:        Option<usize>,
}

impl MoveQuery {
  pub fn for_document(document_id: Uuid) -> Self {
    Self { document_id: Some(document_id), ..Self::default() }
  }

  pub fn for_item(item_id: Uuid) -> Self {
    Self { item_id: Some(item_id), ..Self::default() }
  }

  pub fn matches(&self, m: &Move) -> bool {
    self.item_id.is_none_or(|i| i == m.item_id)
      && self.document_id.is_none_or(|d| d == m.document_id)
      && self.client_id.is_none_or(|c| c == m.client_id)
      && self.warehouse_id.is_none_or(|w| w == m.warehouse_id)
      && self.from.is_none_or(|from| m.created_at >= from)
      && self.until.is_none_or(|until| m.created_at < until)
  }
}
