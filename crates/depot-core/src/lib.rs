//! Core types and the posting engine for the Depot stock ledger.
//!
//! This crate is deliberately free of HTTP and database dependencies and of
//! async code. Storage is reached through the [`store::StockStore`] trait,
//! permissions through [`access::PermissionGate`]; both are injected into
//! [`StockService`].

pub mod access;
pub mod audit;
pub mod balance;
pub mod document;
pub mod error;
pub mod item;
pub mod key;
pub mod lifecycle;
pub mod memory;
pub mod movement;
pub mod posting;
pub mod report;
pub mod service;
pub mod store;

pub use error::{Error, Result};
pub use service::StockService;

#[cfg(test)]
mod tests;
