//! The `StockStore` trait, the persistence seam of the core.
//!
//! The trait is implemented by storage backends (`depot-store-sqlite`, and
//! [`MemoryStore`](crate::memory::MemoryStore) for tests). The service layer
//! only ever talks to a store through this trait, and the store handle is
//! passed in explicitly; there is no process-wide connection.
//!
//! # Concurrency
//!
//! A store handle is a single logical writer. The core implements no locking
//! of its own: it assumes the backend serialises concurrent writers touching
//! the same [`StockKey`] (the SQLite backend takes the database write lock in
//! [`begin`](StockStore::begin)). Under that assumption the read-check-write
//! in [`apply_delta`](StockStore::apply_delta) cannot be raced into a
//! negative balance.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
  audit::AuditEntry,
  balance::{Balance, BalanceQuery},
  document::{Document, DocumentLine, DocumentQuery},
  item::Item,
  key::StockKey,
  movement::{Move, MoveQuery, NewMove},
};

/// Abstraction over a stock ledger backend.
///
/// Moves are append-only: no method updates or deletes one. Balances change
/// only through [`apply_delta`](Self::apply_delta).
pub trait StockStore {
  type Error: std::error::Error + From<crate::Error>;

  // ── Transactions ──────────────────────────────────────────────────────

  /// Open a unit of work. Writes made until [`commit`](Self::commit) or
  /// [`rollback`](Self::rollback) are applied together or not at all.
  fn begin(&mut self) -> Result<(), Self::Error>;

  fn commit(&mut self) -> Result<(), Self::Error>;

  /// Discard every write made since [`begin`](Self::begin).
  fn rollback(&mut self) -> Result<(), Self::Error>;

  // ── Items ─────────────────────────────────────────────────────────────

  /// Fails with `IntegrityViolation` if the SKU is taken for that client.
  fn insert_item(&mut self, item: &Item) -> Result<(), Self::Error>;

  fn get_item(&self, item_id: Uuid) -> Result<Option<Item>, Self::Error>;

  // ── Documents ─────────────────────────────────────────────────────────

  /// Fails with `IntegrityViolation` if `(kind, number)` is taken.
  fn insert_document(&mut self, document: &Document) -> Result<(), Self::Error>;

  fn get_document(
    &self,
    document_id: Uuid,
  ) -> Result<Option<Document>, Self::Error>;

  fn list_documents(
    &self,
    query: &DocumentQuery,
  ) -> Result<Vec<Document>, Self::Error>;

  /// Overwrite header, status and posting stamp of an existing document.
  fn update_document(&mut self, document: &Document) -> Result<(), Self::Error>;

  /// Remove a document and all of its lines.
  fn delete_document(&mut self, document_id: Uuid) -> Result<(), Self::Error>;

  fn insert_line(&mut self, line: &DocumentLine) -> Result<(), Self::Error>;

  /// Returns `false` if no such line exists on the document.
  fn delete_line(
    &mut self,
    document_id: Uuid,
    line_id: Uuid,
  ) -> Result<bool, Self::Error>;

  /// Lines of a document ordered by `line_no`.
  fn list_lines(
    &self,
    document_id: Uuid,
  ) -> Result<Vec<DocumentLine>, Self::Error>;

  // ── Balances ──────────────────────────────────────────────────────────

  /// Current balance; `None` means an implicit zero.
  fn get_balance(&self, key: &StockKey) -> Result<Option<Balance>, Self::Error>;

  /// Upsert exactly one balance row by `delta`, following
  /// [`next_quantity`](crate::balance::next_quantity). On failure the row is
  /// untouched and no row is created.
  fn apply_delta(
    &mut self,
    key: &StockKey,
    delta: Decimal,
  ) -> Result<Balance, Self::Error>;

  fn list_balances(
    &self,
    query: &BalanceQuery,
  ) -> Result<Vec<Balance>, Self::Error>;

  // ── Moves ─────────────────────────────────────────────────────────────

  /// Append a move, assigning it a fresh id.
  fn record_move(&mut self, input: NewMove) -> Result<Move, Self::Error>;

  /// Moves matching `query`, oldest first.
  fn list_moves(&self, query: &MoveQuery) -> Result<Vec<Move>, Self::Error>;

  // ── Audit ─────────────────────────────────────────────────────────────

  fn insert_audit(&mut self, entry: &AuditEntry) -> Result<(), Self::Error>;

  /// Audit trail, oldest first, optionally restricted to one entity.
  fn list_audit(
    &self,
    entity_id: Option<Uuid>,
  ) -> Result<Vec<AuditEntry>, Self::Error>;
}
