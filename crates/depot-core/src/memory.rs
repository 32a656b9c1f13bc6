//! [`MemoryStore`], an in-process [`StockStore`] for tests and tooling.
//!
//! Uniqueness rules match the relational schema. Transactions are
//! implemented by snapshotting the whole state on `begin` and restoring it
//! on `rollback`.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
  Error,
  audit::AuditEntry,
  balance::{Balance, BalanceQuery, next_quantity},
  document::{Document, DocumentKind, DocumentLine, DocumentQuery},
  item::Item,
  key::StockKey,
  movement::{Move, MoveQuery, NewMove},
  store::StockStore,
};

#[derive(Debug, Clone, Default)]
struct State {
  items:     HashMap<Uuid, Item>,
  documents: BTreeMap<Uuid, Document>,
  lines:     HashMap<Uuid, Vec<DocumentLine>>,
  balances:  BTreeMap<StockKey, Balance>,
  moves:     Vec<Move>,
  audit:     Vec<AuditEntry>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
  state:    State,
  snapshot: Option<State>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  fn number_taken(&self, kind: DocumentKind, number: &str, except: Uuid) -> bool {
    self.state.documents.values().any(|d| {
      d.kind == kind && d.header.number == number && d.document_id != except
    })
  }
}

impl StockStore for MemoryStore {
  type Error = Error;

  // ── Transactions ──────────────────────────────────────────────────────────

  fn begin(&mut self) -> Result<(), Error> {
    if self.snapshot.is_some() {
      return Err(Error::Validation("transaction already in progress".into()));
    }
    self.snapshot = Some(self.state.clone());
    Ok(())
  }

  fn commit(&mut self) -> Result<(), Error> {
    self.snapshot = None;
    Ok(())
  }

  fn rollback(&mut self) -> Result<(), Error> {
    if let Some(snapshot) = self.snapshot.take() {
      self.state = snapshot;
    }
    Ok(())
  }

  // ── Items ─────────────────────────────────────────────────────────────────

  fn insert_item(&mut self, item: &Item) -> Result<(), Error> {
    let duplicate = self
      .state
      .items
      .values()
      .any(|i| i.client_id == item.client_id && i.sku == item.sku);
    if duplicate || self.state.items.contains_key(&item.item_id) {
      return Err(Error::IntegrityViolation(format!(
        "item sku {} already registered for client {}",
        item.sku, item.client_id
      )));
    }
    self.state.items.insert(item.item_id, item.clone());
    Ok(())
  }

  fn get_item(&self, item_id: Uuid) -> Result<Option<Item>, Error> {
    Ok(self.state.items.get(&item_id).cloned())
  }

  // ── Documents ─────────────────────────────────────────────────────────────

  fn insert_document(&mut self, document: &Document) -> Result<(), Error> {
    if self.state.documents.contains_key(&document.document_id)
      || self.number_taken(
        document.kind,
        &document.header.number,
        document.document_id,
      )
    {
      return Err(Error::IntegrityViolation(format!(
        "{} number {} already exists",
        document.kind, document.header.number
      )));
    }
    self
      .state
      .documents
      .insert(document.document_id, document.clone());
    Ok(())
  }

  fn get_document(&self, document_id: Uuid) -> Result<Option<Document>, Error> {
    Ok(self.state.documents.get(&document_id).cloned())
  }

  fn list_documents(&self, query: &DocumentQuery) -> Result<Vec<Document>, Error> {
    let mut docs: Vec<Document> = self
      .state
      .documents
      .values()
      .filter(|d| query.matches(d))
      .cloned()
      .collect();
    docs.sort_by_key(|d| d.created_at);
    Ok(docs)
  }

  fn update_document(&mut self, document: &Document) -> Result<(), Error> {
    if self.number_taken(
      document.kind,
      &document.header.number,
      document.document_id,
    ) {
      return Err(Error::IntegrityViolation(format!(
        "{} number {} already exists",
        document.kind, document.header.number
      )));
    }
    let slot = self
      .state
      .documents
      .get_mut(&document.document_id)
      .ok_or(Error::DocumentNotFound(document.document_id))?;
    *slot = document.clone();
    Ok(())
  }

  fn delete_document(&mut self, document_id: Uuid) -> Result<(), Error> {
    self.state.documents.remove(&document_id);
    self.state.lines.remove(&document_id);
    Ok(())
  }

  fn insert_line(&mut self, line: &DocumentLine) -> Result<(), Error> {
    if !self.state.documents.contains_key(&line.document_id) {
      return Err(Error::IntegrityViolation(format!(
        "line references missing document {}",
        line.document_id
      )));
    }
    if !self.state.items.contains_key(&line.item_id) {
      return Err(Error::IntegrityViolation(format!(
        "line references missing item {}",
        line.item_id
      )));
    }
    let lines = self.state.lines.entry(line.document_id).or_default();
    lines.push(line.clone());
    lines.sort_by_key(|l| l.line_no);
    Ok(())
  }

  fn delete_line(&mut self, document_id: Uuid, line_id: Uuid) -> Result<bool, Error> {
    let Some(lines) = self.state.lines.get_mut(&document_id) else {
      return Ok(false);
    };
    let before = lines.len();
    lines.retain(|l| l.line_id != line_id);
    Ok(lines.len() != before)
  }

  fn list_lines(&self, document_id: Uuid) -> Result<Vec<DocumentLine>, Error> {
    Ok(self.state.lines.get(&document_id).cloned().unwrap_or_default())
  }

  // ── Balances ──────────────────────────────────────────────────────────────

  fn get_balance(&self, key: &StockKey) -> Result<Option<Balance>, Error> {
    Ok(self.state.balances.get(key).cloned())
  }

  fn apply_delta(&mut self, key: &StockKey, delta: Decimal) -> Result<Balance, Error> {
    let current = self.state.balances.get(key).map(|b| b.qty);
    let qty = next_quantity(key, current, delta)?;

    let balance = self
      .state
      .balances
      .entry(key.clone())
      .or_insert_with(|| Balance {
        key:          key.clone(),
        qty:          Decimal::ZERO,
        reserved_qty: Decimal::ZERO,
        updated_at:   Utc::now(),
      });
    balance.qty = qty;
    balance.updated_at = Utc::now();
    Ok(balance.clone())
  }

  fn list_balances(&self, query: &BalanceQuery) -> Result<Vec<Balance>, Error> {
    Ok(
      self
        .state
        .balances
        .values()
        .filter(|b| query.matches(b))
        .cloned()
        .collect(),
    )
  }

  // ── Moves ─────────────────────────────────────────────────────────────────

  fn record_move(&mut self, input: NewMove) -> Result<Move, Error> {
    let recorded = input.into_move(Uuid::new_v4());
    self.state.moves.push(recorded.clone());
    Ok(recorded)
  }

  fn list_moves(&self, query: &MoveQuery) -> Result<Vec<Move>, Error> {
    let mut moves: Vec<Move> = self
      .state
      .moves
      .iter()
      .filter(|m| query.matches(m))
      .cloned()
      .collect();
    // Stable, so moves sharing a timestamp keep insertion order.
    moves.sort_by_key(|m| m.created_at);
    if let Some(limit) = query.limit {
      moves.truncate(limit);
    }
    Ok(moves)
  }

  // ── Audit ─────────────────────────────────────────────────────────────────

  fn insert_audit(&mut self, entry: &AuditEntry) -> Result<(), Error> {
    self.state.audit.push(entry.clone());
    Ok(())
  }

  fn list_audit(&self, entity_id: Option<Uuid>) -> Result<Vec<AuditEntry>, Error> {
    Ok(
      self
        .state
        .audit
        .iter()
        .filter(|e| entity_id.is_none_or(|id| id == e.entity_id))
        .cloned()
        .collect(),
    )
  }
}
