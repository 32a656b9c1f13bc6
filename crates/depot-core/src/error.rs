//! Error types for `depot-core`.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::{document::DocumentStatus, key::StockKey};

#[derive(Debug, Error)]
pub enum Error {
  /// Applying a delta would drive a balance below zero.
  #[error(
    "insufficient stock for {key}: on hand {on_hand}, requested change {delta}"
  )]
  InsufficientStock {
    key:     StockKey,
    on_hand: Decimal,
    delta:   Decimal,
  },

  #[error("document {0} has no lines to post")]
  EmptyDocument(Uuid),

  #[error("document {0} is posted and can no longer be changed")]
  DocumentLocked(Uuid),

  #[error("document {id} cannot be posted from status {status}")]
  PostingRejected { id: Uuid, status: DocumentStatus },

  #[error("role {role:?} lacks permission {permission:?}")]
  PermissionDenied { role: String, permission: String },

  /// Duplicate document number, duplicate balance key, dangling reference.
  #[error("integrity violation: {0}")]
  IntegrityViolation(String),

  #[error("document not found: {0}")]
  DocumentNotFound(Uuid),

  #[error("line {line} not found on document {document}")]
  LineNotFound { document: Uuid, line: Uuid },

  #[error("item not found: {0}")]
  ItemNotFound(Uuid),

  #[error("invalid input: {0}")]
  Validation(String),
}

impl Error {
  /// Stable identifier for this kind of failure, suitable for clients to
  /// match on.
  pub fn code(&self) -> &'static str {
    match self {
      Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
      Self::EmptyDocument(_) => "EMPTY_DOCUMENT",
      Self::DocumentLocked(_) => "DOCUMENT_LOCKED",
      Self::PostingRejected { .. } => "POSTING_REJECTED",
      Self::PermissionDenied { .. } => "PERMISSION_DENIED",
      Self::IntegrityViolation(_) => "INTEGRITY_VIOLATION",
      Self::DocumentNotFound(_) => "DOCUMENT_NOT_FOUND",
      Self::LineNotFound { .. } => "LINE_NOT_FOUND",
      Self::ItemNotFound(_) => "ITEM_NOT_FOUND",
      Self::Validation(_) => "VALIDATION",
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
