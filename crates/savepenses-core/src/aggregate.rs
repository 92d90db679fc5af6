//! Balance arithmetic over a retrieved set of transactions.

use rust_decimal::Decimal;

use crate::{
    models::{Transaction, TransactionType},
    storage::LedgerError,
};

/// Amount with the polarity of its type applied: income adds, expense subtracts.
pub fn signed_amount(transaction: &Transaction) -> Decimal {
    match transaction.kind {
        TransactionType::Income => transaction.amount,
        TransactionType::Expense => -transaction.amount,
    }
}

fn sum_of(transactions: &[Transaction], kind: TransactionType) -> Decimal {
    transactions
        .iter()
        .filter(|t| t.kind == kind)
        .map(|t| t.amount)
        .sum()
}

pub fn income(transactions: &[Transaction]) -> Decimal {
    sum_of(transactions, TransactionType::Income)
}

pub fn expense(transactions: &[Transaction]) -> Decimal {
    sum_of(transactions, TransactionType::Expense)
}

pub fn total(transactions: &[Transaction]) -> Decimal {
    income(transactions) - expense(transactions)
}

pub fn group_total(transactions: &[Transaction], group_id: i64) -> Decimal {
    transactions
        .iter()
        .filter(|t| t.group_id == Some(group_id))
        .map(signed_amount)
        .sum()
}

/// Smallest id strictly greater than every id given, or 1 for none.
pub fn next_id(ids: impl IntoIterator<Item = i64>) -> Result<i64, LedgerError> {
    match ids.into_iter().max() {
        None => Ok(1),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| LedgerError::Validation("id space exhausted".to_string())),
    }
}
