//! Server configuration: an optional TOML file layered with `DEPOT_`
//! environment variables.

use std::{
  collections::HashMap,
  path::{Path, PathBuf},
};

use anyhow::Context as _;
use depot_core::access::StaticPermissions;
use serde::Deserialize;

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Role id to granted permission names. `"*"` grants everything,
  /// `"<kind>.*"` every action on one document kind.
  #[serde(default)]
  pub roles:      HashMap<String, Vec<String>>,
}

impl ServerConfig {
  /// Read `path` (if it exists) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .set_default("host", "127.0.0.1")?
      .set_default("port", 8080)?
      .set_default("store_path", "~/.local/share/depot/depot.db")?
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("DEPOT"))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn permissions(&self) -> StaticPermissions {
    StaticPermissions::from_roles(self.roles.clone())
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use depot_core::access::PermissionGate as _;

  use super::*;

  #[test]
  fn roles_become_a_permission_table() {
    let path =
      std::env::temp_dir().join(format!("depot-{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(
      &path,
      r#"
port = 9000
store_path = "/var/lib/depot/depot.db"

[roles]
admin = ["*"]
clerk = ["receipt.*", "items.manage"]
"#,
    )
    .unwrap();

    let cfg = ServerConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 9000);
    let gate = cfg.permissions();
    assert!(gate.has_permission("admin", "write_off.post"));
    assert!(gate.has_permission("clerk", "receipt.post"));
    assert!(!gate.has_permission("clerk", "write_off.post"));
    assert!(!gate.has_permission("nobody", "receipt.create"));
  }

  #[test]
  fn tilde_expands_against_home() {
    let Ok(home) = std::env::var("HOME") else {
      return;
    };
    assert_eq!(
      expand_tilde(Path::new("~/depot.db")),
      PathBuf::from(home).join("depot.db")
    );
    assert_eq!(
      expand_tilde(Path::new("/srv/depot.db")),
      PathBuf::from("/srv/depot.db")
    );
  }
}
