use std::{fmt::Display, path::PathBuf};

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    aggregate,
    models::{Group, Transaction},
};

/// Extension (without the dot) that marks a file as a ledger.
pub const LEDGER_EXTENSION: &str = "nmoney";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Group,
    Transaction,
}

impl Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Group => f.write_str("group"),
            Entity::Transaction => f.write_str("transaction"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("file does not exist or is not a .{} file: {}", LEDGER_EXTENSION, .0.display())]
    FileNotFound(PathBuf),
    #[error("{entity} {id} already exists")]
    DuplicateId { entity: Entity, id: i64 },
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: i64 },
    #[error("invalid value: {0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
}

/// Persistence contract for a ledger.
///
/// Every mutation is durable when it returns. The aggregate methods are
/// provided on top of `list_transactions` and rescan the full transaction set
/// on every call (O(n)); nothing is cached.
pub trait LedgerStore {
    fn list_groups(&self) -> Result<Vec<Group>, LedgerError>;
    fn list_transactions(&self) -> Result<Vec<Transaction>, LedgerError>;

    fn add_group(&self, group: &Group) -> Result<(), LedgerError>;
    fn update_group(&self, group: &Group) -> Result<(), LedgerError>;
    fn delete_group(&self, id: i64) -> Result<(), LedgerError>;

    fn add_transaction(&self, transaction: &Transaction) -> Result<(), LedgerError>;
    fn update_transaction(&self, transaction: &Transaction) -> Result<(), LedgerError>;
    fn delete_transaction(&self, id: i64) -> Result<(), LedgerError>;

    fn income(&self) -> Result<Decimal, LedgerError> {
        Ok(aggregate::income(&self.list_transactions()?))
    }

    fn expense(&self) -> Result<Decimal, LedgerError> {
        Ok(aggregate::expense(&self.list_transactions()?))
    }

    fn total(&self) -> Result<Decimal, LedgerError> {
        Ok(aggregate::total(&self.list_transactions()?))
    }

    fn group_total(&self, group: &Group) -> Result<Decimal, LedgerError> {
        Ok(aggregate::group_total(&self.list_transactions()?, group.id))
    }

    fn next_available_transaction_id(&self) -> Result<i64, LedgerError> {
        aggregate::next_id(self.list_transactions()?.iter().map(|t| t.id))
    }

    fn next_available_group_id(&self) -> Result<i64, LedgerError> {
        aggregate::next_id(self.list_groups()?.iter().map(|g| g.id))
    }

    fn find_transaction(&self, id: i64) -> Result<Transaction, LedgerError> {
        self.list_transactions()?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or(LedgerError::NotFound { entity: Entity::Transaction, id })
    }

    fn find_group(&self, id: i64) -> Result<Group, LedgerError> {
        self.list_groups()?
            .into_iter()
            .find(|g| g.id == id)
            .ok_or(LedgerError::NotFound { entity: Entity::Group, id })
    }
}
