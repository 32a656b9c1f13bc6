//! Audit entries appended after every successful mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuditAction {
  Create,
  Update,
  Delete,
  Post,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuditEntity {
  Document,
  Item,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
  pub audit_id:    Uuid,
  /// The acting user, verbatim.
  pub actor_id:    String,
  pub action:      AuditAction,
  pub entity:      AuditEntity,
  pub entity_id:   Uuid,
  pub description: String,
  pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
  pub fn new(
    actor_id: &str,
    action: AuditAction,
    entity: AuditEntity,
    entity_id: Uuid,
    description: impl Into<String>,
  ) -> Self {
    Self {
      audit_id: Uuid::new_v4(),
      actor_id: actor_id.to_owned(),
      action,
      entity,
      entity_id,
      description: description.into(),
      recorded_at: Utc::now(),
    }
  }
}
