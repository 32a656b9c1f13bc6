//! Business documents: the six kinds that move stock, their header and
//! their line items.
//!
//! Every kind shares one shape and one lifecycle: a document is created as
//! [`DocumentStatus::Draft`], its lines are edited freely, and posting flips
//! it to [`DocumentStatus::Posted`] for good.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::key::Dim;

// ─── Kind and status ─────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DocumentKind {
  InboundOrder,
  Receipt,
  OutboundOrder,
  InventoryCount,
  Return,
  WriteOff,
}

impl DocumentKind {
  pub fn as_str(self) -> &'static str { self.into() }
}

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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DocumentStatus {
  Draft,
  Posted,
}

impl DocumentStatus {
  pub fn as_str(self) -> &'static str { self.into() }
}

// ─── Header and document ─────────────────────────────────────────────────────

/// The editable header fields of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHeader {
  /// Unique per document kind.
  pub number:       String,
  /// Owning client. Count and write-off documents may leave this empty;
  /// their client is resolved per line through the item.
  #[serde(default)]
  pub client_id:    Option<Uuid>,
  pub warehouse_id: Uuid,
  /// Supplier, customer or carrier reference.
  #[serde(default)]
  pub counterparty: Option<String>,
  #[serde(default)]
  pub comment:      Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
  pub document_id: Uuid,
  pub kind:        DocumentKind,
  pub status:      DocumentStatus,
  pub header:      DocumentHeader,
  pub created_by:  String,
  pub created_at:  DateTime<Utc>,
  pub posted_by:   Option<String>,
  pub posted_at:   Option<DateTime<Utc>>,
}

impl Document {
  pub fn is_draft(&self) -> bool { self.status == DocumentStatus::Draft }
}

// ─── Lines ───────────────────────────────────────────────────────────────────

/// Quantities carried by a line. Which ones matter depends on the document
/// kind; the rest stay zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineQuantities {
  /// Receipt, return and write-off quantity.
  pub qty:          Decimal,
  /// Planned quantity on inbound and outbound orders.
  pub qty_plan:     Decimal,
  /// Quantity actually handled on the floor.
  pub qty_fact:     Decimal,
  /// Counted quantity on an inventory count.
  pub qty_count:    Decimal,
  /// Book quantity captured when the count line was created.
  pub qty_system:   Decimal,
  pub qty_reserved: Decimal,
  pub qty_picked:   Decimal,
}

impl LineQuantities {
  pub(crate) fn all(&self) -> [(&'static str, Decimal); 7] {
    [
      ("qty", self.qty),
      ("qty_plan", self.qty_plan),
      ("qty_fact", self.qty_fact),
      ("qty_count", self.qty_count),
      ("qty_system", self.qty_system),
      ("qty_reserved", self.qty_reserved),
      ("qty_picked", self.qty_picked),
    ]
  }
}

/// Input for adding a line to a draft document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLine {
  pub item_id:    Uuid,
  #[serde(default)]
  pub batch:      Dim<String>,
  #[serde(default)]
  pub serial:     Dim<String>,
  #[serde(default)]
  pub expiry:     Dim<NaiveDate>,
  #[serde(flatten)]
  pub quantities: LineQuantities,
}

impl NewLine {
  pub fn new(item_id: Uuid, quantities: LineQuantities) -> Self {
    Self {
      item_id,
      batch: Dim::Unspecified,
      serial: Dim::Unspecified,
      expiry: Dim::Unspecified,
      quantities,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLine {
  pub line_id:     Uuid,
  pub document_id: Uuid,
  /// Position within the document; posting walks lines in this order.
  pub line_no:     u32,
  pub item_id:     Uuid,
  pub batch:       Dim<String>,
  pub serial:      Dim<String>,
  pub expiry:      Dim<NaiveDate>,
  #[serde(flatten)]
  pub quantities:  LineQuantities,
}

/// A document together with its lines, as returned by read accessors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentView {
  #[serde(flatten)]
  pub document: Document,
  pub lines:    Vec<DocumentLine>,
}

/// Filter for [`crate::store::StockStore::list_documents`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentQuery {
  pub kind:   Option<DocumentKind>,
  pub status: Option<DocumentStatus>,
}

impl DocumentQuery {
  pub fn matches(&self, document: &Document) -> bool {
    self.kind.is_none_or(|k| k == document.kind)
      && self.status.is_none_or(|s| s == document.status)
  }
}
