//! Actors and the permission gate.
//!
//! The core never decides who may do what; it asks a [`PermissionGate`]
//! before every mutation and refuses with
//! [`Error::PermissionDenied`](crate::Error::PermissionDenied) on a "no".

use std::{
  collections::{HashMap, HashSet},
  sync::Arc,
};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::document::DocumentKind;

/// The user performing an operation and the role their permissions come
/// from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
  pub user_id: String,
  pub role_id: String,
}

impl Actor {
  pub fn new(user_id: impl Into<String>, role_id: impl Into<String>) -> Self {
    Self { user_id: user_id.into(), role_id: role_id.into() }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
  Create,
  Update,
  Delete,
  Post,
}

/// Something an actor may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
  Document(DocumentKind, Action),
  ManageItems,
}

impl Permission {
  /// The permission name handed to the gate, e.g. `receipt.post`.
  pub fn name(&self) -> String {
    match self {
      Self::Document(kind, action) => format!("{kind}.{action}"),
      Self::ManageItems => "items.manage".to_owned(),
    }
  }
}

// ─── Gate ────────────────────────────────────────────────────────────────────

/// Yes/no permission check supplied by the host application.
pub trait PermissionGate {
  fn has_permission(&self, role_id: &str, permission: &str) -> bool;
}

impl<G: PermissionGate + ?Sized> PermissionGate for &G {
  fn has_permission(&self, role_id: &str, permission: &str) -> bool {
    (**self).has_permission(role_id, permission)
  }
}

impl<G: PermissionGate + ?Sized> PermissionGate for Arc<G> {
  fn has_permission(&self, role_id: &str, permission: &str) -> bool {
    (**self).has_permission(role_id, permission)
  }
}

/// Grants everything to everyone. Intended for tests and tooling.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PermissionGate for AllowAll {
  fn has_permission(&self, _role_id: &str, _permission: &str) -> bool { true }
}

/// An in-process role table.
///
/// A grant is either an exact permission name, `*` (everything), or
/// `<prefix>.*` (every permission starting with `<prefix>.`).
#[derive(Debug, Clone, Default)]
pub struct StaticPermissions {
  roles: HashMap<String, HashSet<String>>,
}

impl StaticPermissions {
  pub fn new() -> Self { Self::default() }

  pub fn grant(
    mut self,
    role_id: impl Into<String>,
    permission: impl Into<String>,
  ) -> Self {
    self
      .roles
      .entry(role_id.into())
      .or_default()
      .insert(permission.into());
    self
  }

  pub fn from_roles<I, P>(roles: I) -> Self
  where
    I: IntoIterator<Item = (String, P)>,
    P: IntoIterator<Item = String>,
  {
    let roles = roles
      .into_iter()
      .map(|(role, grants)| (role, grants.into_iter().collect()))
      .collect();
    Self { roles }
  }
}

impl PermissionGate for StaticPermissions {
  fn has_permission(&self, role_id: &str, permission: &str) -> bool {
    let Some(grants) = self.roles.get(role_id) else {
      return false;
    };
    grants.iter().any(|grant| {
      grant == "*"
        || grant == permission
        || grant.strip_suffix(".*").is_some_and(|prefix| {
          permission
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.'))
        })
    })
  }
}
