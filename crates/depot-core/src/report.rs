//! Read-only reports derived from balances and the move ledger.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
  Result,
  balance::{Balance, add_quantity},
  key::StockKey,
  movement::Move,
};

// ─── Reconciliation ──────────────────────────────────────────────────────────

/// A stock key whose balance disagrees with the sum of its moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrepancy {
  pub key:       StockKey,
  pub balance:   Decimal,
  pub moves_sum: Decimal,
}

/// Compare every balance with the moves recorded against its key. An empty
/// result means the ledger and the balances agree.
///
/// Keys present on only one side count as zero on the other. Sums that
/// leave the decimal range are reported as [`crate::Error::Validation`].
pub fn reconcile(
  balances: &[Balance],
  moves: &[Move],
) -> Result<Vec<Discrepancy>> {
  let mut sums: BTreeMap<StockKey, (Decimal, Decimal)> = BTreeMap::new();
  for balance in balances {
    let entry = sums.entry(balance.key.clone()).or_default();
    entry.0 = add_quantity(entry.0, balance.qty)?;
  }
  for m in moves {
    let entry = sums.entry(m.key()).or_default();
    entry.1 = add_quantity(entry.1, m.qty)?;
  }

  Ok(
    sums
      .into_iter()
      .filter(|(_, (balance, moves_sum))| balance != moves_sum)
      .map(|(key, (balance, moves_sum))| Discrepancy { key, balance, moves_sum })
      .collect(),
  )
}

// ─── Turnover ────────────────────────────────────────────────────────────────

/// Opening, incoming, outgoing and closing quantity for one key over a
/// period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnoverRow {
  pub key:      StockKey,
  pub opening:  Decimal,
  pub incoming: Decimal,
  /// Reported as a positive quantity.
  pub outgoing: Decimal,
  pub closing:  Decimal,
}

/// Build a turnover statement for `[from, until)` from the full history of
/// the keys of interest. Moves before `from` feed the opening quantity;
/// moves at or after `until` are ignored.
pub fn turnover(
  moves: &[Move],
  from: DateTime<Utc>,
  until: DateTime<Utc>,
) -> Result<Vec<TurnoverRow>> {
  let mut rows: BTreeMap<StockKey, TurnoverRow> = BTreeMap::new();

  for m in moves.iter().filter(|m| m.created_at < until) {
    let key = m.key();
    let row = rows.entry(key.clone()).or_insert_with(|| TurnoverRow {
      key,
      opening: Decimal::ZERO,
      incoming: Decimal::ZERO,
      outgoing: Decimal::ZERO,
      closing: Decimal::ZERO,
    });

    if m.created_at < from {
      row.opening = add_quantity(row.opening, m.qty)?;
    } else if m.qty > Decimal::ZERO {
      row.incoming = add_quantity(row.incoming, m.qty)?;
    } else {
      row.outgoing = add_quantity(row.outgoing, -m.qty)?;
    }
    row.closing =
      add_quantity(add_quantity(row.opening, row.incoming)?, -row.outgoing)?;
  }

  Ok(rows.into_values().collect())
}
