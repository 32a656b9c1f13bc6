//! Items: the catalogue entries lines refer to. Every item belongs to
//! exactly one client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
  pub item_id:    Uuid,
  pub client_id:  Uuid,
  /// Unique per client.
  pub sku:        String,
  pub name:       String,
  pub unit:       String,
  pub created_at: DateTime<Utc>,
}

/// Input for registering an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
  pub client_id: Uuid,
  pub sku:       String,
  pub name:      String,
  #[serde(default = "default_unit")]
  pub unit:      String,
}

fn default_unit() -> String { "pcs".to_owned() }
