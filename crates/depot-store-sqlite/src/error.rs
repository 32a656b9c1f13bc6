//! Error type for `depot-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] depot_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored value that no longer maps onto a domain type.
  #[error("undecodable column value: {0}")]
  Decode(String),
}

/// Constraint failures (unique keys, foreign keys, the append-only triggers)
/// surface as [`depot_core::Error::IntegrityViolation`].
impl From<rusqlite::Error> for Error {
  fn from(err: rusqlite::Error) -> Self {
    if err.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation)
    {
      return Self::Core(depot_core::Error::IntegrityViolation(err.to_string()));
    }
    Self::Sqlite(err)
  }
}

impl Error {
  /// The domain error, if this is one.
  pub fn as_core(&self) -> Option<&depot_core::Error> {
    match self {
      Self::Core(err) => Some(err),
      _ => None,
    }
  }

  /// Stable error code; storage failures all report `STORAGE`.
  pub fn code(&self) -> &'static str {
    self.as_core().map_or("STORAGE", depot_core::Error::code)
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
