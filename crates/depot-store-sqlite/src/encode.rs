//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! UUIDs are stored as hyphenated lowercase strings, quantities as decimal
//! text, and enums by their snake-case (or ledger) names. An unspecified
//! stock dimension is the empty string.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use depot_core::{
  audit::AuditEntry,
  balance::Balance,
  document::{Document, DocumentHeader, DocumentLine, LineQuantities},
  item::Item,
  key::{Dim, StockKey},
  movement::Move,
};
use rusqlite::Row;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

/// Always nanosecond precision with a `Z` suffix, so stored timestamps have
/// one width and sort correctly as text.
pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_decimal(d: Decimal) -> String { d.to_string() }

pub fn decode_decimal(s: &str) -> Result<Decimal> {
  Decimal::from_str(s).map_err(|e| Error::Decode(format!("quantity {s:?}: {e}")))
}

/// Decode an enum stored by its strum name.
pub fn decode_enum<T: FromStr>(what: &str, s: &str) -> Result<T> {
  T::from_str(s).map_err(|_| Error::Decode(format!("unknown {what}: {s:?}")))
}

// ─── Dimensions ──────────────────────────────────────────────────────────────

pub fn encode_dim_uuid(d: &Dim<Uuid>) -> String {
  d.as_option().map(|id| encode_uuid(*id)).unwrap_or_default()
}

pub fn decode_dim_uuid(s: &str) -> Result<Dim<Uuid>> {
  if s.is_empty() {
    return Ok(Dim::Unspecified);
  }
  decode_uuid(s).map(Dim::Set)
}

pub fn encode_dim_text(d: &Dim<String>) -> String {
  d.as_option().cloned().unwrap_or_default()
}

pub fn decode_dim_text(s: String) -> Dim<String> {
  if s.is_empty() { Dim::Unspecified } else { Dim::Set(s) }
}

pub fn encode_dim_date(d: &Dim<NaiveDate>) -> String {
  d.as_option()
    .map(|date| date.format("%Y-%m-%d").to_string())
    .unwrap_or_default()
}

pub fn decode_dim_date(s: &str) -> Result<Dim<NaiveDate>> {
  if s.is_empty() {
    return Ok(Dim::Unspecified);
  }
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map(Dim::Set)
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// The seven key columns, in schema order.
pub fn encode_key(key: &StockKey) -> [String; 7] {
  [
    encode_uuid(key.client_id),
    encode_uuid(key.warehouse_id),
    encode_dim_uuid(&key.location_id),
    encode_uuid(key.item_id),
    encode_dim_text(&key.batch),
    encode_dim_text(&key.serial),
    encode_dim_date(&key.expiry),
  ]
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const ITEM_COLUMNS: &str = "item_id, client_id, sku, name, unit, created_at";

/// Raw strings read directly from an `items` row.
pub struct RawItem {
  pub item_id:    String,
  pub client_id:  String,
  pub sku:        String,
  pub name:       String,
  pub unit:       String,
  pub created_at: String,
}

impl RawItem {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      item_id:    row.get(0)?,
      client_id:  row.get(1)?,
      sku:        row.get(2)?,
      name:       row.get(3)?,
      unit:       row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_item(self) -> Result<Item> {
    Ok(Item {
      item_id:    decode_uuid(&self.item_id)?,
      client_id:  decode_uuid(&self.client_id)?,
      sku:        self.sku,
      name:       self.name,
      unit:       self.unit,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const DOCUMENT_COLUMNS: &str = "document_id, kind, status, number, \
                                    client_id, warehouse_id, counterparty, \
                                    comment, created_by, created_at, \
                                    posted_by, posted_at";

/// Raw strings read directly from a `documents` row.
pub struct RawDocument {
  pub document_id:  String,
  pub kind:         String,
  pub status:       String,
  pub number:       String,
  pub client_id:    Option<String>,
  pub warehouse_id: String,
  pub counterparty: Option<String>,
  pub comment:      Option<String>,
  pub created_by:   String,
  pub created_at:   String,
  pub posted_by:    Option<String>,
  pub posted_at:    Option<String>,
}

impl RawDocument {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      document_id:  row.get(0)?,
      kind:         row.get(1)?,
      status:       row.get(2)?,
      number:       row.get(3)?,
      client_id:    row.get(4)?,
      warehouse_id: row.get(5)?,
      counterparty: row.get(6)?,
      comment:      row.get(7)?,
      created_by:   row.get(8)?,
      created_at:   row.get(9)?,
      posted_by:    row.get(10)?,
      posted_at:    row.get(11)?,
    })
  }

  pub fn into_document(self) -> Result<Document> {
    Ok(Document {
      document_id: decode_uuid(&self.document_id)?,
      kind:        decode_enum("document kind", &self.kind)?,
      status:      decode_enum("document status", &self.status)?,
      header:      DocumentHeader {
        number:       self.number,
        client_id:    self.client_id.as_deref().map(decode_uuid).transpose()?,
        warehouse_id: decode_uuid(&self.warehouse_id)?,
        counterparty: self.counterparty,
        comment:      self.comment,
      },
      created_by:  self.created_by,
      created_at:  decode_dt(&self.created_at)?,
      posted_by:   self.posted_by,
      posted_at:   self.posted_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

pub const LINE_COLUMNS: &str = "line_id, document_id, line_no, item_id, \
                                batch, serial, expiry, qty, qty_plan, \
                                qty_fact, qty_count, qty_system, \
                                qty_reserved, qty_picked";

/// Raw values read directly from a `document_lines` row.
pub struct RawLine {
  pub line_id:     String,
  pub document_id: String,
  pub line_no:     u32,
  pub item_id:     String,
  pub batch:       String,
  pub serial:      String,
  pub expiry:      String,
  /// `qty` through `qty_picked`, in column order.
  pub quantities:  [String; 7],
}

impl RawLine {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      line_id:     row.get(0)?,
      document_id: row.get(1)?,
      line_no:     row.get(2)?,
      item_id:     row.get(3)?,
      batch:       row.get(4)?,
      serial:      row.get(5)?,
      expiry:      row.get(6)?,
      quantities:  [
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
        row.get(12)?,
        row.get(13)?,
      ],
    })
  }

  pub fn into_line(self) -> Result<DocumentLine> {
    let [qty, plan, fact, count, system, reserved, picked] = self.quantities;
    Ok(DocumentLine {
      line_id:     decode_uuid(&self.line_id)?,
      document_id: decode_uuid(&self.document_id)?,
      line_no:     self.line_no,
      item_id:     decode_uuid(&self.item_id)?,
      batch:       decode_dim_text(self.batch),
      serial:      decode_dim_text(self.serial),
      expiry:      decode_dim_date(&self.expiry)?,
      quantities:  LineQuantities {
        qty:          decode_decimal(&qty)?,
        qty_plan:     decode_decimal(&plan)?,
        qty_fact:     decode_decimal(&fact)?,
        qty_count:    decode_decimal(&count)?,
        qty_system:   decode_decimal(&system)?,
        qty_reserved: decode_decimal(&reserved)?,
        qty_picked:   decode_decimal(&picked)?,
      },
    })
  }
}

pub const BALANCE_COLUMNS: &str = "client_id, warehouse_id, location_id, \
                                   item_id, batch, serial, expiry, qty, \
                                   reserved_qty, updated_at";

/// Raw strings read directly from a `balances` row.
pub struct RawBalance {
  /// The seven key columns, in schema order.
  pub key:          [String; 7],
  pub qty:          String,
  pub reserved_qty: String,
  pub updated_at:   String,
}

impl RawBalance {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      key:          [
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
      ],
      qty:          row.get(7)?,
      reserved_qty: row.get(8)?,
      updated_at:   row.get(9)?,
    })
  }

  pub fn into_balance(self) -> Result<Balance> {
    let [client, warehouse, location, item, batch, serial, expiry] = self.key;
    Ok(Balance {
      key:          StockKey {
        client_id:    decode_uuid(&client)?,
        warehouse_id: decode_uuid(&warehouse)?,
        location_id:  decode_dim_uuid(&location)?,
        item_id:      decode_uuid(&item)?,
        batch:        decode_dim_text(batch),
        serial:       decode_dim_text(serial),
        expiry:       decode_dim_date(&expiry)?,
      },
      qty:          decode_decimal(&self.qty)?,
      reserved_qty: decode_decimal(&self.reserved_qty)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}

pub const MOVE_COLUMNS: &str = "move_id, move_type, document_kind, \
                                document_id, client_id, warehouse_id, \
                                location_from, location_to, item_id, batch, \
                                serial, expiry, qty, created_by, created_at, \
                                note";

/// Raw strings read directly from a `moves` row.
pub struct RawMove {
  pub move_id:       String,
  pub move_type:     String,
  pub document_kind: String,
  pub document_id:   String,
  pub client_id:     String,
  pub warehouse_id:  String,
  pub location_from: String,
  pub location_to:   String,
  pub item_id:       String,
  pub batch:         String,
  pub serial:        String,
  pub expiry:        String,
  pub qty:           String,
  pub created_by:    String,
  pub created_at:    String,
  pub note:          Option<String>,
}

impl RawMove {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      move_id:       row.get(0)?,
      move_type:     row.get(1)?,
      document_kind: row.get(2)?,
      document_id:   row.get(3)?,
      client_id:     row.get(4)?,
      warehouse_id:  row.get(5)?,
      location_from: row.get(6)?,
      location_to:   row.get(7)?,
      item_id:       row.get(8)?,
      batch:         row.get(9)?,
      serial:        row.get(10)?,
      expiry:        row.get(11)?,
      qty:           row.get(12)?,
      created_by:    row.get(13)?,
      created_at:    row.get(14)?,
      note:          row.get(15)?,
    })
  }

  pub fn into_move(self) -> Result<Move> {
    Ok(Move {
      move_id:       decode_uuid(&self.move_id)?,
      move_type:     decode_enum("move type", &self.move_type)?,
      document_kind: decode_enum("document kind", &self.document_kind)?,
      document_id:   decode_uuid(&self.document_id)?,
      client_id:     decode_uuid(&self.client_id)?,
      warehouse_id:  decode_uuid(&self.warehouse_id)?,
      location_from: decode_dim_uuid(&self.location_from)?,
      location_to:   decode_dim_uuid(&self.location_to)?,
      item_id:       decode_uuid(&self.item_id)?,
      batch:         decode_dim_text(self.batch),
      serial:        decode_dim_text(self.serial),
      expiry:        decode_dim_date(&self.expiry)?,
      qty:           decode_decimal(&self.qty)?,
      created_by:    self.created_by,
      created_at:    decode_dt(&self.created_at)?,
      note:          self.note,
    })
  }
}

pub const AUDIT_COLUMNS: &str = "audit_id, actor_id, action, entity, \
                                 entity_id, description, recorded_at";

/// Raw strings read directly from an `audit_log` row.
pub struct RawAudit {
  pub audit_id:    String,
  pub actor_id:    String,
  pub action:      String,
  pub entity:      String,
  pub entity_id:   String,
  pub description: String,
  pub recorded_at: String,
}

impl RawAudit {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      audit_id:    row.get(0)?,
      actor_id:    row.get(1)?,
      action:      row.get(2)?,
      entity:      row.get(3)?,
      entity_id:   row.get(4)?,
      description: row.get(5)?,
      recorded_at: row.get(6)?,
    })
  }

  pub fn into_entry(self) -> Result<AuditEntry> {
    Ok(AuditEntry {
      audit_id:    decode_uuid(&self.audit_id)?,
      actor_id:    self.actor_id,
      action:      decode_enum("audit action", &self.action)?,
      entity:      decode_enum("audit entity", &self.entity)?,
      entity_id:   decode_uuid(&self.entity_id)?,
      description: self.description,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}
