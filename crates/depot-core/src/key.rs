//! Stock keys, the identity of one balance row.
//!
//! Optional dimensions (location, batch, serial, expiry) are never modelled
//! as a bare `Option`. They use [`Dim`], whose `Unspecified` variant is a
//! value in its own right, so two keys compare equal exactly when every
//! dimension matches, in memory and in every store.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Dimension ───────────────────────────────────────────────────────────────

/// One optional stock dimension with an explicit "unspecified" sentinel.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Dim<T> {
  Unspecified,
  Set(T),
}

impl<T> Default for Dim<T> {
  fn default() -> Self { Self::Unspecified }
}

impl<T> Dim<T> {
  pub fn is_set(&self) -> bool { matches!(self, Self::Set(_)) }

  pub fn as_option(&self) -> Option<&T> {
    match self {
      Self::Unspecified => None,
      Self::Set(v) => Some(v),
    }
  }

  pub fn into_option(self) -> Option<T> {
    match self {
      Self::Unspecified => None,
      Self::Set(v) => Some(v),
    }
  }
}

impl<T> From<Option<T>> for Dim<T> {
  fn from(value: Option<T>) -> Self {
    value.map_or(Self::Unspecified, Self::Set)
  }
}

impl Dim<String> {
  /// Build a text dimension, folding blank input into `Unspecified` so the
  /// empty string never competes with the sentinel.
  pub fn text(value: Option<&str>) -> Self {
    match value.map(str::trim) {
      Some(v) if !v.is_empty() => Self::Set(v.to_owned()),
      _ => Self::Unspecified,
    }
  }
}

impl<T: fmt::Display> fmt::Display for Dim<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Unspecified => f.write_str("*"),
      Self::Set(v) => v.fmt(f),
    }
  }
}

// ─── StockKey ────────────────────────────────────────────────────────────────

/// The seven-dimension tuple identifying one balance row.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct StockKey {
  pub client_id:    Uuid,
  pub warehouse_id: Uuid,
  #[serde(default)]
  pub location_id:  Dim<Uuid>,
  pub item_id:      Uuid,
  #[serde(default)]
  pub batch:        Dim<String>,
  #[serde(default)]
  pub serial:       Dim<String>,
  #[serde(default)]
  pub expiry:       Dim<NaiveDate>,
}

impl StockKey {
  /// A key with every optional dimension unspecified.
  pub fn new(client_id: Uuid, warehouse_id: Uuid, item_id: Uuid) -> Self {
    Self {
      client_id,
      warehouse_id,
      location_id: Dim::Unspecified,
      item_id,
      batch: Dim::Unspecified,
      serial: Dim::Unspecified,
      expiry: Dim::Unspecified,
    }
  }

  pub fn with_location(mut self, location_id: Uuid) -> Self {
    self.location_id = Dim::Set(location_id);
    self
  }

  pub fn with_batch(mut self, batch: &str) -> Self {
    self.batch = Dim::text(Some(batch));
    self
  }

  pub fn with_serial(mut self, serial: &str) -> Self {
    self.serial = Dim::text(Some(serial));
    self
  }

  pub fn with_expiry(mut self, expiry: NaiveDate) -> Self {
    self.expiry = Dim::Set(expiry);
    self
  }
}

impl fmt::Display for StockKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "client={} warehouse={} location={} item={} batch={} serial={} expiry={}",
      self.client_id,
      self.warehouse_id,
      self.location_id,
      self.item_id,
      self.batch,
      self.serial,
      self.expiry,
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_text_is_unspecified() {
    assert_eq!(Dim::text(Some("  ")), Dim::Unspecified);
    assert_eq!(Dim::text(None), Dim::Unspecified);
    assert_eq!(Dim::text(Some(" B-7 ")), Dim::Set("B-7".to_owned()));
  }

  #[test]
  fn keys_differing_only_in_one_dimension_are_distinct() {
    let base = StockKey::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let batched = base.clone().with_batch("L1");

    assert_ne!(base, batched);
    assert_eq!(base.clone().with_batch(""), base);
  }

  #[test]
  fn unspecified_dimension_deserialises_when_missing() {
    let key = StockKey::new(Uuid::nil(), Uuid::nil(), Uuid::nil());
    let json = format!(
      r#"{{"client_id":"{0}","warehouse_id":"{0}","item_id":"{0}"}}"#,
      Uuid::nil()
    );
    let back: StockKey = serde_json::from_str(&json).unwrap();
    assert_eq!(back, key);
  }
}
