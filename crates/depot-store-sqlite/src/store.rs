//! [`SqliteStore`], the async handle the HTTP layer talks to.
//!
//! Every method builds a [`StockService`] over a fresh [`SqliteSession`] on
//! the connection thread and runs exactly one service operation there. The
//! single `tokio_rusqlite` connection serialises operations, and each
//! mutation is additionally wrapped in a `BEGIN IMMEDIATE` transaction.

use std::{path::Path, sync::Arc};

use chrono::{DateTime, Utc};
use depot_core::{
  StockService,
  access::{Actor, PermissionGate},
  audit::AuditEntry,
  balance::{Balance, BalanceQuery},
  document::{
    Document, DocumentHeader, DocumentKind, DocumentLine, DocumentQuery,
    DocumentView, NewLine,
  },
  item::{Item, NewItem},
  key::StockKey,
  movement::{Move, MoveQuery},
  posting::PostingOutcome,
  report::{self, Discrepancy, TurnoverRow},
};
use tracing::debug;
use uuid::Uuid;

use crate::{Result, schema::SCHEMA, session::SqliteSession};

/// The permission gate shared by every operation on a store.
pub type Gate = Arc<dyn PermissionGate + Send + Sync>;

type Service<'c> = StockService<SqliteSession<'c>, Gate>;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Depot stock ledger backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection and the gate are reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
  gate: Gate,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>, gate: Gate) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, gate };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory(gate: Gate) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, gate };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    debug!("schema initialised");
    Ok(())
  }

  /// Run one service operation on the connection thread.
  async fn run<T, F>(&self, op: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut Service<'_>) -> Result<T> + Send + 'static,
  {
    let gate = self.gate.clone();
    self
      .conn
      .call(move |conn| {
        let mut service = StockService::new(SqliteSession::new(conn), gate);
        Ok(op(&mut service))
      })
      .await?
  }

  // ── Items ─────────────────────────────────────────────────────────────────

  pub async fn register_item(&self, actor: Actor, input: NewItem) -> Result<Item> {
    self.run(move |svc| svc.register_item(&actor, input)).await
  }

  pub async fn item(&self, item_id: Uuid) -> Result<Option<Item>> {
    self.run(move |svc| svc.item(item_id)).await
  }

  // ── Documents ─────────────────────────────────────────────────────────────

  pub async fn create_document(
    &self,
    actor: Actor,
    kind: DocumentKind,
    header: DocumentHeader,
  ) -> Result<Document> {
    self
      .run(move |svc| svc.create_document(&actor, kind, header))
      .await
  }

  pub async fn update_document(
    &self,
    actor: Actor,
    document_id: Uuid,
    header: DocumentHeader,
  ) -> Result<Document> {
    self
      .run(move |svc| svc.update_document(&actor, document_id, header))
      .await
  }

  pub async fn delete_document(&self, actor: Actor, document_id: Uuid) -> Result<()> {
    self
      .run(move |svc| svc.delete_document(&actor, document_id))
      .await
  }

  pub async fn add_line(
    &self,
    actor: Actor,
    document_id: Uuid,
    line: NewLine,
  ) -> Result<DocumentLine> {
    self
      .run(move |svc| svc.add_line(&actor, document_id, line))
      .await
  }

  pub async fn remove_line(
    &self,
    actor: Actor,
    document_id: Uuid,
    line_id: Uuid,
  ) -> Result<()> {
    self
      .run(move |svc| svc.remove_line(&actor, document_id, line_id))
      .await
  }

  pub async fn post_document(
    &self,
    actor: Actor,
    document_id: Uuid,
  ) -> Result<PostingOutcome> {
    self
      .run(move |svc| svc.post_document(&actor, document_id))
      .await
  }

  pub async fn document(&self, document_id: Uuid) -> Result<Option<DocumentView>> {
    self.run(move |svc| svc.document(document_id)).await
  }

  pub async fn documents(&self, query: DocumentQuery) -> Result<Vec<Document>> {
    self.run(move |svc| svc.documents(&query)).await
  }

  // ── Ledger reads ──────────────────────────────────────────────────────────

  pub async fn balance(&self, key: StockKey) -> Result<Option<Balance>> {
    self.run(move |svc| svc.balance(&key)).await
  }

  pub async fn balances(&self, query: BalanceQuery) -> Result<Vec<Balance>> {
    self.run(move |svc| svc.balances(&query)).await
  }

  pub async fn moves(&self, query: MoveQuery) -> Result<Vec<Move>> {
    self.run(move |svc| svc.moves(&query)).await
  }

  pub async fn audit_trail(&self, entity_id: Option<Uuid>) -> Result<Vec<AuditEntry>> {
    self.run(move |svc| svc.audit_trail(entity_id)).await
  }

  // ── Reports ───────────────────────────────────────────────────────────────

  /// Every balance whose quantity disagrees with the sum of its moves.
  pub async fn reconcile(&self) -> Result<Vec<Discrepancy>> {
    self
      .run(|svc| {
        let balances = svc.balances(&BalanceQuery {
          include_zero: true,
          ..BalanceQuery::default()
        })?;
        let moves = svc.moves(&MoveQuery::default())?;
        Ok(report::reconcile(&balances, &moves)?)
      })
      .await
  }

  /// Turnover for `[from, until)`, restricted by the id filters in `scope`.
  /// The date bounds and limit of `scope` are ignored; history before
  /// `from` is always read to compute opening quantities.
  pub async fn turnover(
    &self,
    scope: MoveQuery,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
  ) -> Result<Vec<TurnoverRow>> {
    let history = MoveQuery { from: None, until: Some(until), limit: None, ..scope };
    self
      .run(move |svc| {
        let moves = svc.moves(&history)?;
        Ok(report::turnover(&moves, from, until)?)
      })
      .await
  }
}
