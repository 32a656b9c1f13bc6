//! SQLite backend for the Depot stock ledger.
//!
//! [`SqliteSession`] implements the synchronous
//! [`StockStore`](depot_core::store::StockStore) over a borrowed connection.
//! [`SqliteStore`] wraps [`tokio_rusqlite`] so each service operation runs as
//! one call on the dedicated database thread without blocking the async
//! runtime.

mod encode;
mod schema;
mod session;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use session::SqliteSession;
pub use store::{Gate, SqliteStore};
