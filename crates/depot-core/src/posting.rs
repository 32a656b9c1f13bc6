//! The posting engine: the only path by which document lines become moves
//! and balance changes.
//!
//! What each document kind does to stock is data, held in [`RULES`]. Adding
//! a kind means adding a row, not another branch.
//!
//! All kinds post against the unassigned (warehouse-level) location; putaway
//! into concrete locations is outside the ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error,
  access::{Action, Actor, Permission, PermissionGate},
  audit::{AuditAction, AuditEntity, AuditEntry},
  document::{Document, DocumentKind, DocumentLine, DocumentStatus, LineQuantities},
  key::{Dim, StockKey},
  movement::{Move, MoveType, NewMove},
  service::StockService,
  store::StockStore,
};

// ─── Rule table ──────────────────────────────────────────────────────────────

/// Which line field a rule posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantitySource {
  Qty,
  QtyPlan,
  /// `qty_count - qty_system`; lines whose variance is zero are skipped.
  CountVariance,
}

impl QuantitySource {
  /// Name of the line field the quantity is read from.
  pub fn field(self) -> &'static str {
    match self {
      Self::Qty => "qty",
      Self::QtyPlan => "qty_plan",
      Self::CountVariance => "qty_count",
    }
  }
}

/// Where the client dimension of the stock key comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientSource {
  Header,
  /// The client owning the line's item.
  Item,
}

#[derive(Debug, Clone, Copy)]
pub struct PostingRule {
  pub kind:      DocumentKind,
  pub move_type: MoveType,
  /// `1` adds stock, `-1` removes it.
  pub sign:      i8,
  pub quantity:  QuantitySource,
  pub client:    ClientSource,
}

pub static RULES: [PostingRule; 6] = [
  PostingRule {
    kind:      DocumentKind::InboundOrder,
    move_type: MoveType::InReceipt,
    sign:      1,
    quantity:  QuantitySource::QtyPlan,
    client:    ClientSource::Header,
  },
  PostingRule {
    kind:      DocumentKind::Receipt,
    move_type: MoveType::InReceipt,
    sign:      1,
    quantity:  QuantitySource::Qty,
    client:    ClientSource::Header,
  },
  PostingRule {
    kind:      DocumentKind::OutboundOrder,
    move_type: MoveType::Ship,
    sign:      -1,
    quantity:  QuantitySource::QtyPlan,
    client:    ClientSource::Header,
  },
  PostingRule {
    kind:      DocumentKind::InventoryCount,
    move_type: MoveType::Adjustment,
    sign:      1,
    quantity:  QuantitySource::CountVariance,
    client:    ClientSource::Item,
  },
  PostingRule {
    kind:      DocumentKind::Return,
    move_type: MoveType::Return,
    sign:      1,
    quantity:  QuantitySource::Qty,
    client:    ClientSource::Header,
  },
  PostingRule {
    kind:      DocumentKind::WriteOff,
    move_type: MoveType::WriteOff,
    sign:      -1,
    quantity:  QuantitySource::Qty,
    client:    ClientSource::Item,
  },
];

/// Rows are laid out in declaration order of [`DocumentKind`].
pub fn rule_for(kind: DocumentKind) -> &'static PostingRule {
  &RULES[kind as usize]
}

impl PostingRule {
  /// The unsigned quantity this rule reads from a line.
  pub fn base_quantity(&self, q: &LineQuantities) -> Decimal {
    match self.quantity {
      QuantitySource::Qty => q.qty,
      QuantitySource::QtyPlan => q.qty_plan,
      QuantitySource::CountVariance => q.qty_count - q.qty_system,
    }
  }

  pub fn signed_quantity(&self, q: &LineQuantities) -> Decimal {
    Decimal::from(self.sign) * self.base_quantity(q)
  }

  /// Whether a line must carry a strictly positive quantity for this rule.
  /// Count lines may legitimately show no variance.
  pub fn requires_positive(&self) -> bool {
    self.quantity != QuantitySource::CountVariance
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Result of a successful posting.
#[derive(Debug, Clone, Serialize)]
pub struct PostingOutcome {
  pub document: Document,
  /// One per line with a non-zero delta, in line order.
  pub moves:    Vec<Move>,
}

impl<S, G> StockService<S, G>
where
  S: StockStore,
  G: PermissionGate,
{
  /// Post a draft document: apply every line to the balances and the move
  /// ledger as one unit of work, then mark the document posted.
  ///
  /// Permission, status and the presence of lines are checked before
  /// anything is written. If any line fails, everything this call applied is
  /// rolled back, the document stays draft, and the line's error is
  /// returned.
  pub fn post_document(
    &mut self,
    actor: &Actor,
    document_id: Uuid,
  ) -> Result<PostingOutcome, S::Error> {
    let document = self.load_document(document_id)?;
    self.authorize(actor, Permission::Document(document.kind, Action::Post))?;

    if document.status != DocumentStatus::Draft {
      return Err(
        Error::PostingRejected { id: document_id, status: document.status }.into(),
      );
    }

    let lines = self.store.list_lines(document_id)?;
    if lines.is_empty() {
      return Err(Error::EmptyDocument(document_id).into());
    }

    let rule = rule_for(document.kind);
    let posted_at = Utc::now();

    let result = self.in_transaction(|store| {
      let moves = apply_lines(store, rule, &document, &lines, actor, posted_at)?;

      let posted = Document {
        status: DocumentStatus::Posted,
        posted_by: Some(actor.user_id.clone()),
        posted_at: Some(posted_at),
        ..document.clone()
      };
      store.update_document(&posted)?;
      store.insert_audit(&AuditEntry::new(
        &actor.user_id,
        AuditAction::Post,
        AuditEntity::Document,
        document_id,
        format!(
          "{} {} posted: {} line(s), {} move(s)",
          document.kind,
          document.header.number,
          lines.len(),
          moves.len()
        ),
      ))?;

      Ok(PostingOutcome { document: posted, moves })
    });

    match &result {
      Ok(outcome) => info!(
        document = %document_id,
        kind = %document.kind,
        moves = outcome.moves.len(),
        "document posted"
      ),
      Err(err) => warn!(
        document = %document_id,
        kind = %document.kind,
        error = %err,
        "posting rolled back"
      ),
    }
    result
  }
}

fn apply_lines<S: StockStore>(
  store: &mut S,
  rule: &PostingRule,
  document: &Document,
  lines: &[DocumentLine],
  actor: &Actor,
  posted_at: DateTime<Utc>,
) -> Result<Vec<Move>, S::Error> {
  let mut moves = Vec::with_capacity(lines.len());

  for line in lines {
    let delta = rule.signed_quantity(&line.quantities);
    if delta.is_zero() {
      debug!(line = line.line_no, "zero delta, line skipped");
      continue;
    }

    let client_id = match rule.client {
      ClientSource::Header => document.header.client_id.ok_or_else(|| {
        Error::Validation(format!(
          "{} {} has no client",
          document.kind, document.header.number
        ))
      })?,
      ClientSource::Item => {
        store
          .get_item(line.item_id)?
          .ok_or(Error::ItemNotFound(line.item_id))?
          .client_id
      }
    };

    let key = StockKey {
      client_id,
      warehouse_id: document.header.warehouse_id,
      location_id: Dim::Unspecified,
      item_id: line.item_id,
      batch: line.batch.clone(),
      serial: line.serial.clone(),
      expiry: line.expiry.clone(),
    };

    let balance = store.apply_delta(&key, delta)?;
    debug!(line = line.line_no, %delta, on_hand = %balance.qty, "line applied");

    let recorded = store.record_move(NewMove::against(
      &key,
      rule.move_type,
      document.kind,
      document.document_id,
      delta,
      &actor.user_id,
      posted_at,
      Some(format!(
        "{} {} line {}",
        document.kind, document.header.number, line.line_no
      )),
    ))?;
    moves.push(recorded);
  }

  Ok(moves)
}
