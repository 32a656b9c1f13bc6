//! Balances: the materialised on-hand quantity per [`StockKey`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, key::StockKey};

/// Current quantity for one stock key. `qty` is never negative.
///
/// `reserved_qty` is carried in the schema for a future reservation workflow;
/// nothing in posting writes to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
  pub key:          StockKey,
  pub qty:          Decimal,
  pub reserved_qty: Decimal,
  pub updated_at:   DateTime<Utc>,
}

/// Add two quantities, failing instead of overflowing the decimal range.
pub fn add_quantity(a: Decimal, b: Decimal) -> Result<Decimal> {
  a.checked_add(b).ok_or_else(|| {
    Error::Validation(format!("quantity out of range: {a} + {b}"))
  })
}

/// Compute the quantity a balance row will hold after `delta` is applied.
///
/// `current` is `None` when no row exists for the key. A missing row may
/// only be created by a non-negative delta; an existing row may not be
/// driven below zero. Both stores call this so the rule lives in one place.
pub fn next_quantity(
  key: &StockKey,
  current: Option<Decimal>,
  delta: Decimal,
) -> Result<Decimal> {
  let on_hand = current.unwrap_or(Decimal::ZERO);
  let next = add_quantity(on_hand, delta)?;
  if next < Decimal::ZERO {
    return Err(Error::InsufficientStock {
      key: key.clone(),
      on_hand,
      delta,
    });
  }
  Ok(next)
}

/// Filter for balance snapshots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceQuery {
  pub client_id:    Option<Uuid>,
  pub warehouse_id: Option<Uuid>,
  pub item_id:      Option<Uuid>,
  /// Keep rows whose quantity has dropped to zero.
  #[serde(default)]
  pub include_zero: bool,
}

impl BalanceQuery {
  pub fn matches(&self, balance: &Balance) -> bool {
    let key = &balance.key;
    self.client_id.is_none_or(|c| c == key.client_id)
      && self.warehouse_id.is_none_or(|w| w == key.warehouse_id)
      && self.item_id.is_none_or(|i| i == key.item_id)
      && (self.include_zero || !balance.qty.is_zero())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key() -> StockKey {
    StockKey::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())
  }

  #[test]
  fn missing_row_accepts_positive_delta() {
    assert_eq!(
      next_quantity(&key(), None, Decimal::new(50, 0)).unwrap(),
      Decimal::new(50, 0)
    );
  }

  #[test]
  fn missing_row_rejects_negative_delta() {
    let err = next_quantity(&key(), None, Decimal::NEGATIVE_ONE).unwrap_err();
    assert!(matches!(err, Error::InsufficientStock { on_hand, .. } if on_hand.is_zero()));
  }

  #[test]
  fn draining_to_zero_is_allowed() {
    let next = next_quantity(&key(), Some(Decimal::new(5, 0)), Decimal::new(-5, 0)).unwrap();
    assert!(next.is_zero());
  }

  #[test]
  fn overdraw_is_rejected() {
    let err = next_quantity(&key(), Some(Decimal::new(10, 0)), Decimal::new(-15, 0))
      .unwrap_err();
    assert_eq!(err.code(), "INSUFFICIENT_STOCK");
  }

  #[test]
  fn fractional_quantities_are_exact() {
    let next =
      next_quantity(&key(), Some(Decimal::new(3, 1)), Decimal::new(-3, 1)).unwrap();
    assert!(next.is_zero());
  }

  #[test]
  fn overflowing_the_decimal_range_is_an_error() {
    let err = next_quantity(&key(), Some(Decimal::MAX), Decimal::ONE).unwrap_err();
    assert_eq!(err.code(), "VALIDATION");
  }
}
