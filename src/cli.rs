use std::io::Write;

use rust_decimal::Decimal;
use savepenses_core::{
    parse_amount, parse_date, Group, LedgerError, LedgerStore, Repeat, Transaction, TransactionType,
};
use savepenses_sqlite::Account;
use thiserror::Error;
use time::Date;

use crate::{
    config::{CliArgs, Config},
    output,
};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    New,
    Update(i64),
    Delete(i64),
    List,
    Balance,
}

impl Action {
    fn from_args(args: &CliArgs) -> Result<Self, CliError> {
        if args.new {
            Ok(Action::New)
        } else if args.update {
            args.id.map(Action::Update).ok_or(CliError::MissingArgument("--id"))
        } else if let Some(id) = args.delete {
            Ok(Action::Delete(id))
        } else if args.list {
            Ok(Action::List)
        } else if args.balance {
            Ok(Action::Balance)
        } else {
            Err(CliError::MissingArgument("--new, --update, --delete, --list or --balance"))
        }
    }
}

/// Runs one command against the ledger named by `args` or `config`.
///
/// `today` is the default date for new transactions. Everything meant for the
/// user is written to `out`.
pub fn execute(args: &CliArgs, config: &Config, today: Date, out: &mut impl Write) -> Result<(), CliError> {
    let path = args
        .file
        .as_ref()
        .or(config.ledger.file.as_ref())
        .ok_or(CliError::MissingArgument("--file"))?;
    let action = Action::from_args(args)?;

    let account = Account::open(path)?;
    tracing::debug!(path = %account.path().display(), ?action, group_mode = args.group, "running command");
    if args.group {
        run_group(&account, action, args, out)?;
    } else {
        run_transaction(&account, action, args, today, out)?;
    }
    account.close()?;
    Ok(())
}

fn transaction_kind(args: &CliArgs) -> Option<TransactionType> {
    if args.income {
        Some(TransactionType::Income)
    } else if args.expense {
        Some(TransactionType::Expense)
    } else {
        None
    }
}

/// Group references are advisory in storage, but the shell only writes ones that resolve.
fn check_group(account: &Account, group_id: Option<i64>) -> Result<(), CliError> {
    if let Some(id) = group_id {
        account.find_group(id)?;
    }
    Ok(())
}

fn run_transaction(
    account: &Account,
    action: Action,
    args: &CliArgs,
    today: Date,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match action {
        Action::New => {
            let kind = transaction_kind(args).ok_or(CliError::MissingArgument("--income or --expense"))?;
            let amount = parse_amount(args.amount.as_deref().ok_or(CliError::MissingArgument("--amount"))?)?;
            let date = match &args.date {
                Some(d) => parse_date(d)?,
                None => today,
            };

            let mut transaction = Transaction::new(account.next_available_transaction_id()?, kind, amount, date)?;
            transaction.description = args.comment.clone();
            if let Some(repeat) = &args.repeat {
                transaction.repeat = repeat.parse::<Repeat>()?;
            }
            transaction.group_id = args.group_id;
            check_group(account, transaction.group_id)?;

            account.add_transaction(&transaction)?;
            writeln!(out, "Added transaction {}", transaction)?;
        }
        Action::Update(id) => {
            let mut transaction = account.find_transaction(id)?;
            if let Some(kind) = transaction_kind(args) {
                transaction.kind = kind;
            }
            if let Some(amount) = &args.amount {
                transaction.amount = parse_amount(amount)?;
            }
            if let Some(date) = &args.date {
                transaction.date = parse_date(date)?;
            }
            if let Some(repeat) = &args.repeat {
                transaction.repeat = repeat.parse::<Repeat>()?;
            }
            if args.comment.is_some() {
                transaction.description = args.comment.clone();
            }
            if args.group_id.is_some() {
                check_group(account, args.group_id)?;
                transaction.group_id = args.group_id;
            }

            account.update_transaction(&transaction)?;
            writeln!(out, "Updated transaction {}", transaction)?;
        }
        Action::Delete(id) => {
            account.delete_transaction(id)?;
            writeln!(out, "Deleted transaction #{}", id)?;
        }
        Action::List => {
            let mut transactions = account.list_transactions()?;
            transactions.sort_by_key(|t| (t.date, t.id));
            if args.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&transactions)?)?;
            } else {
                write!(out, "{}", output::transactions_table(&transactions))?;
            }
        }
        Action::Balance => {
            let lines = output::balance_lines(account.income()?, account.expense()?, account.total()?);
            write!(out, "{}", lines)?;
        }
    }
    Ok(())
}

fn run_group(account: &Account, action: Action, args: &CliArgs, out: &mut impl Write) -> Result<(), CliError> {
    match action {
        Action::New => {
            let name = args.name.as_deref().ok_or(CliError::MissingArgument("--name"))?;
            let mut group = Group::new(account.next_available_group_id()?, name);
            group.description = args.comment.clone();

            account.add_group(&group)?;
            writeln!(out, "Added group {}", group)?;
        }
        Action::Update(id) => {
            let mut group = account.find_group(id)?;
            if let Some(name) = &args.name {
                group.name = name.clone();
            }
            if args.comment.is_some() {
                group.description = args.comment.clone();
            }

            account.update_group(&group)?;
            writeln!(out, "Updated group {}", group)?;
        }
        Action::Delete(id) => {
            account.delete_group(id)?;
            writeln!(out, "Deleted group #{}", id)?;
        }
        Action::List => {
            let mut groups = account.list_groups()?;
            groups.sort_by_key(|g| g.id);
            if args.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&groups)?)?;
            } else {
                let rows = with_totals(account, groups)?;
                write!(out, "{}", output::groups_table(&rows))?;
            }
        }
        Action::Balance => {
            let groups = match args.id {
                Some(id) => vec![account.find_group(id)?],
                None => {
                    let mut groups = account.list_groups()?;
                    groups.sort_by_key(|g| g.id);
                    groups
                }
            };
            for (group, total) in with_totals(account, groups)? {
                writeln!(out, "{} (#{}): {}", group.name, group.id, total)?;
            }
        }
    }
    Ok(())
}

fn with_totals(account: &Account, groups: Vec<Group>) -> Result<Vec<(Group, Decimal)>, CliError> {
    groups
        .into_iter()
        .map(|g| -> Result<_, CliError> {
            let total = account.group_total(&g)?;
            Ok((g, total))
        })
        .collect()
}
