//! Core types and traits for savepenses ledgers.
//!
//! This crate provides the entity model, the balance arithmetic and the
//! `LedgerStore` trait, so the file backend lives in a separate crate.

pub mod aggregate;
pub mod models;
pub mod storage;

// Re-export key types at crate root for convenience
pub use models::{date_to_str, parse_amount, parse_date, Group, Repeat, Transaction, TransactionType};
pub use storage::{Entity, LedgerError, LedgerStore, LEDGER_EXTENSION};
