//! Document lifecycle: Draft → Posted.
//!
//! Drafts are freely edited: header updates, lines added and removed, the
//! whole document deleted. None of that touches the ledger. Once posted a
//! document is frozen; every edit and the delete fail with
//! [`Error::DocumentLocked`]. Each operation checks permission and status
//! before writing anything.

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
  Error,
  access::{Action, Actor, Permission, PermissionGate},
  audit::{AuditAction, AuditEntity, AuditEntry},
  document::{
    Document, DocumentHeader, DocumentKind, DocumentLine, DocumentStatus,
    NewLine,
  },
  key::Dim,
  posting::{ClientSource, rule_for},
  service::StockService,
  store::StockStore,
};

impl<S, G> StockService<S, G>
where
  S: StockStore,
  G: PermissionGate,
{
  pub(crate) fn load_document(
    &self,
    document_id: Uuid,
  ) -> Result<Document, S::Error> {
    self
      .store
      .get_document(document_id)?
      .ok_or_else(|| Error::DocumentNotFound(document_id).into())
  }

  /// Create an empty draft.
  pub fn create_document(
    &mut self,
    actor: &Actor,
    kind: DocumentKind,
    header: DocumentHeader,
  ) -> Result<Document, S::Error> {
    self.authorize(actor, Permission::Document(kind, Action::Create))?;
    let header = validate_header(kind, header)?;

    let document = Document {
      document_id: Uuid::new_v4(),
      kind,
      status: DocumentStatus::Draft,
      header,
      created_by: actor.user_id.clone(),
      created_at: Utc::now(),
      posted_by: None,
      posted_at: None,
    };

    self.in_transaction(|store| {
      store.insert_document(&document)?;
      store.insert_audit(&AuditEntry::new(
        &actor.user_id,
        AuditAction::Create,
        AuditEntity::Document,
        document.document_id,
        format!("{kind} {} created", document.header.number),
      ))
    })?;
    Ok(document)
  }

  /// Replace the header of a draft. Moving a draft to another client is
  /// refused while it still holds lines for items of the old client.
  pub fn update_document(
    &mut self,
    actor: &Actor,
    document_id: Uuid,
    header: DocumentHeader,
  ) -> Result<Document, S::Error> {
    let current = self.load_document(document_id)?;
    self.authorize(actor, Permission::Document(current.kind, Action::Update))?;
    ensure_draft(&current)?;
    let header = validate_header(current.kind, header)?;

    if rule_for(current.kind).client == ClientSource::Header
      && header.client_id != current.header.client_id
    {
      for line in self.store.list_lines(document_id)? {
        let item = self
          .store
          .get_item(line.item_id)?
          .ok_or(Error::ItemNotFound(line.item_id))?;
        if header.client_id != Some(item.client_id) {
          return Err(
            Error::Validation(format!(
              "line {} holds item {} of client {}; remove it before changing \
               the document's client",
              line.line_no, item.sku, item.client_id
            ))
            .into(),
          );
        }
      }
    }

    let updated = Document { header, ..current };
    self.in_transaction(|store| {
      store.update_document(&updated)?;
      store.insert_audit(&AuditEntry::new(
        &actor.user_id,
        AuditAction::Update,
        AuditEntity::Document,
        document_id,
        format!("{} {} header updated", updated.kind, updated.header.number),
      ))
    })?;
    Ok(updated)
  }

  /// Delete a draft and its lines. Drafts have no moves, so nothing in the
  /// ledger changes.
  pub fn delete_document(
    &mut self,
    actor: &Actor,
    document_id: Uuid,
  ) -> Result<(), S::Error> {
    let current = self.load_document(document_id)?;
    self.authorize(actor, Permission::Document(current.kind, Action::Delete))?;
    ensure_draft(&current)?;

    self.in_transaction(|store| {
      store.delete_document(document_id)?;
      store.insert_audit(&AuditEntry::new(
        &actor.user_id,
        AuditAction::Delete,
        AuditEntity::Document,
        document_id,
        format!("{} {} deleted", current.kind, current.header.number),
      ))
    })
  }

  /// Append a line to a draft.
  pub fn add_line(
    &mut self,
    actor: &Actor,
    document_id: Uuid,
    input: NewLine,
  ) -> Result<DocumentLine, S::Error> {
    let document = self.load_document(document_id)?;
    self.authorize(actor, Permission::Document(document.kind, Action::Update))?;
    ensure_draft(&document)?;
    validate_quantities(document.kind, &input)?;

    let item = self
      .store
      .get_item(input.item_id)?
      .ok_or(Error::ItemNotFound(input.item_id))?;
    if rule_for(document.kind).client == ClientSource::Header
      && document.header.client_id != Some(item.client_id)
    {
      return Err(
        Error::Validation(format!(
          "item {} belongs to client {}, not to the document's client",
          item.sku, item.client_id
        ))
        .into(),
      );
    }

    self.in_transaction(|store| {
      let line_no = store
        .list_lines(document_id)?
        .last()
        .map_or(1, |last| last.line_no + 1);

      let line = DocumentLine {
        line_id: Uuid::new_v4(),
        document_id,
        line_no,
        item_id: input.item_id,
        batch: Dim::text(input.batch.as_option().map(String::as_str)),
        serial: Dim::text(input.serial.as_option().map(String::as_str)),
        expiry: input.expiry,
        quantities: input.quantities,
      };
      store.insert_line(&line)?;
      store.insert_audit(&AuditEntry::new(
        &actor.user_id,
        AuditAction::Update,
        AuditEntity::Document,
        document_id,
        format!(
          "{} {}: line {line_no} added ({})",
          document.kind, document.header.number, item.sku
        ),
      ))?;
      Ok(line)
    })
  }

  /// Remove one line from a draft.
  pub fn remove_line(
    &mut self,
    actor: &Actor,
    document_id: Uuid,
    line_id: Uuid,
  ) -> Result<(), S::Error> {
    let document = self.load_document(document_id)?;
    self.authorize(actor, Permission::Document(document.kind, Action::Update))?;
    ensure_draft(&document)?;

    self.in_transaction(|store| {
      if !store.delete_line(document_id, line_id)? {
        return Err(
          Error::LineNotFound { document: document_id, line: line_id }.into(),
        );
      }
      store.insert_audit(&AuditEntry::new(
        &actor.user_id,
        AuditAction::Update,
        AuditEntity::Document,
        document_id,
        format!(
          "{} {}: line {line_id} removed",
          document.kind, document.header.number
        ),
      ))
    })
  }
}

fn ensure_draft(document: &Document) -> Result<(), Error> {
  match document.status {
    DocumentStatus::Draft => Ok(()),
    DocumentStatus::Posted => Err(Error::DocumentLocked(document.document_id)),
  }
}

fn validate_header(
  kind: DocumentKind,
  mut header: DocumentHeader,
) -> Result<DocumentHeader, Error> {
  header.number = header.number.trim().to_owned();
  if header.number.is_empty() {
    return Err(Error::Validation("document number must not be blank".into()));
  }
  if rule_for(kind).client == ClientSource::Header && header.client_id.is_none()
  {
    return Err(Error::Validation(format!("{kind} documents need a client")));
  }
  Ok(header)
}

fn validate_quantities(kind: DocumentKind, line: &NewLine) -> Result<(), Error> {
  if let Some((field, _)) = line
    .quantities
    .all()
    .into_iter()
    .find(|(_, value)| *value < Decimal::ZERO)
  {
    return Err(Error::Validation(format!("{field} must not be negative")));
  }

  let rule = rule_for(kind);
  if rule.requires_positive() && rule.base_quantity(&line.quantities).is_zero()
  {
    return Err(Error::Validation(format!(
      "{kind} lines need a positive {}",
      rule.quantity.field()
    )));
  }
  Ok(())
}
