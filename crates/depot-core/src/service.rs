//! [`StockService`], the entry point callers use to change or read stock.
//!
//! The service owns an explicitly injected [`StockStore`] and
//! [`PermissionGate`]. Document lifecycle operations live in
//! [`crate::lifecycle`], posting in [`crate::posting`]; this module holds the
//! shared plumbing (permission checks, transactions) plus items and read
//! accessors.

use tracing::warn;
use uuid::Uuid;

use crate::{
  Error,
  access::{Actor, Permission, PermissionGate},
  audit::{AuditAction, AuditEntity, AuditEntry},
  balance::{Balance, BalanceQuery},
  document::{Document, DocumentQuery, DocumentView},
  item::{Item, NewItem},
  key::StockKey,
  movement::{Move, MoveQuery},
  store::StockStore,
};

pub struct StockService<S, G> {
  pub(crate) store: S,
  gate:             G,
}

impl<S, G> StockService<S, G>
where
  S: StockStore,
  G: PermissionGate,
{
  pub fn new(store: S, gate: G) -> Self { Self { store, gate } }

  pub fn store(&self) -> &S { &self.store }

  pub fn into_store(self) -> S { self.store }

  // ── Plumbing ──────────────────────────────────────────────────────────

  pub(crate) fn authorize(
    &self,
    actor: &Actor,
    permission: Permission,
  ) -> Result<(), S::Error> {
    let name = permission.name();
    if self.gate.has_permission(&actor.role_id, &name) {
      return Ok(());
    }
    warn!(user = %actor.user_id, role = %actor.role_id, permission = %name, "permission denied");
    Err(
      Error::PermissionDenied {
        role:       actor.role_id.clone(),
        permission: name,
      }
      .into(),
    )
  }

  /// Run `f` as one unit of work: commit if it succeeds, roll back every
  /// write it made if it fails, then hand back the original error.
  pub(crate) fn in_transaction<T>(
    &mut self,
    f: impl FnOnce(&mut S) -> Result<T, S::Error>,
  ) -> Result<T, S::Error> {
    self.store.begin()?;
    let outcome = f(&mut self.store).and_then(|value| {
      self.store.commit()?;
      Ok(value)
    });
    if outcome.is_err()
      && let Err(rollback_err) = self.store.rollback()
    {
      warn!(error = %rollback_err, "rollback failed");
    }
    outcome
  }

  // ── Items ─────────────────────────────────────────────────────────────

  pub fn register_item(
    &mut self,
    actor: &Actor,
    input: NewItem,
  ) -> Result<Item, S::Error> {
    self.authorize(actor, Permission::ManageItems)?;

    let sku = input.sku.trim();
    if sku.is_empty() {
      return Err(Error::Validation("item sku must not be blank".into()).into());
    }
    if input.name.trim().is_empty() {
      return Err(Error::Validation("item name must not be blank".into()).into());
    }

    let item = Item {
      item_id:    Uuid::new_v4(),
      client_id:  input.client_id,
      sku:        sku.to_owned(),
      name:       input.name.trim().to_owned(),
      unit:       input.unit,
      created_at: chrono::Utc::now(),
    };

    self.in_transaction(|store| {
      store.insert_item(&item)?;
      store.insert_audit(&AuditEntry::new(
        &actor.user_id,
        AuditAction::Create,
        AuditEntity::Item,
        item.item_id,
        format!("item {} registered for client {}", item.sku, item.client_id),
      ))
    })?;
    Ok(item)
  }

  pub fn item(&self, item_id: Uuid) -> Result<Option<Item>, S::Error> {
    self.store.get_item(item_id)
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  pub fn document(
    &self,
    document_id: Uuid,
  ) -> Result<Option<DocumentView>, S::Error> {
    let Some(document) = self.store.get_document(document_id)? else {
      return Ok(None);
    };
    let lines = self.store.list_lines(document_id)?;
    Ok(Some(DocumentView { document, lines }))
  }

  pub fn documents(
    &self,
    query: &DocumentQuery,
  ) -> Result<Vec<Document>, S::Error> {
    self.store.list_documents(query)
  }

  pub fn balance(&self, key: &StockKey) -> Result<Option<Balance>, S::Error> {
    self.store.get_balance(key)
  }

  pub fn balances(
    &self,
    query: &BalanceQuery,
  ) -> Result<Vec<Balance>, S::Error> {
    self.store.list_balances(query)
  }

  pub fn moves(&self, query: &MoveQuery) -> Result<Vec<Move>, S::Error> {
    self.store.list_moves(query)
  }

  pub fn audit_trail(
    &self,
    entity_id: Option<Uuid>,
  ) -> Result<Vec<AuditEntry>, S::Error> {
    self.store.list_audit(entity_id)
  }
}
