//! SQLite-backed ledger files (`*.nmoney`).

use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
    str::FromStr,
};

use rusqlite::{params, types::Type, types::ValueRef, Connection, OpenFlags, Row};
use rust_decimal::Decimal;

use savepenses_core::{
    date_to_str, parse_date, Entity, Group, LedgerError, LedgerStore, Repeat, Transaction,
    TransactionType, LEDGER_EXTENSION,
};

const TRANSACTION_COLUMNS: &str = "id, date, description, type, repeat, amount, group_id";

/// A ledger file opened for reading and writing.
///
/// Owns its connection exclusively. The connection is released by [`Account::close`]
/// or when the value is dropped.
pub struct Account {
    path: PathBuf,
    conn: Connection,
}

fn sql_err(e: rusqlite::Error) -> LedgerError {
    LedgerError::Storage(e.to_string())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool, LedgerError> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2)",
        params![table, column],
        |row| row.get(0),
    )
    .map_err(sql_err)
}

fn is_ledger_file(path: &Path) -> bool {
    path.is_file() && path.extension().map_or(false, |ext| ext == LEDGER_EXTENSION)
}

fn is_duplicate_column(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("duplicate column name"))
}

impl Account {
    /// Opens an existing ledger file and makes sure its schema is current.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        if !is_ledger_file(path) {
            return Err(LedgerError::FileNotFound(path.to_path_buf()));
        }

        // No CREATE flag: a file that vanished after the check is not recreated.
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(sql_err)?;

        let account = Self {
            path: path.to_path_buf(),
            conn,
        };
        account.init_schema()?;
        tracing::info!(path = %account.path.display(), "ledger opened");
        Ok(account)
    }

    /// Creates a new, empty ledger file and opens it.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        if path.extension().map_or(true, |ext| ext != LEDGER_EXTENSION) {
            return Err(LedgerError::FileNotFound(path.to_path_buf()));
        }
        OpenOptions::new().write(true).create_new(true).open(path)?;
        tracing::debug!(path = %path.display(), "ledger file created");
        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Closes the underlying connection, reporting any failure.
    pub fn close(self) -> Result<(), LedgerError> {
        let path = self.path;
        self.conn.close().map_err(|(_, e)| sql_err(e))?;
        tracing::info!(path = %path.display(), "ledger closed");
        Ok(())
    }

    fn init_schema(&self) -> Result<(), LedgerError> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS groups (
                    id INTEGER PRIMARY KEY,
                    name TEXT,
                    description TEXT
                );

                CREATE TABLE IF NOT EXISTS transactions (
                    id INTEGER PRIMARY KEY,
                    date TEXT,
                    description TEXT,
                    type INTEGER,
                    repeat INTEGER,
                    amount TEXT,
                    group_id INTEGER
                );
                ",
            )
            .map_err(sql_err)?;

        // Ledgers written before groups existed lack the column. Ledgers written
        // by NickvisionMoney keep their group links in `gid` instead.
        let tx = self.conn.unchecked_transaction().map_err(sql_err)?;
        match tx.execute("ALTER TABLE transactions ADD COLUMN group_id INTEGER", []) {
            Ok(_) => {
                tracing::debug!("added group_id column to transactions");
                if has_column(&tx, "transactions", "gid")? {
                    let carried = tx
                        .execute(
                            "UPDATE transactions SET group_id = gid WHERE group_id IS NULL",
                            [],
                        )
                        .map_err(sql_err)?;
                    tracing::info!(carried, "copied gid group links into group_id");
                }
            }
            Err(e) if is_duplicate_column(&e) => {
                tracing::debug!("group_id column already present")
            }
            Err(e) => return Err(sql_err(e)),
        }
        tx.commit().map_err(sql_err)
    }

    fn exists(&self, entity: Entity, id: i64) -> Result<bool, LedgerError> {
        let query = match entity {
            Entity::Group => "SELECT EXISTS(SELECT 1 FROM groups WHERE id = ?1)",
            Entity::Transaction => "SELECT EXISTS(SELECT 1 FROM transactions WHERE id = ?1)",
        };
        self.conn
            .query_row(query, params![id], |row| row.get(0))
            .map_err(sql_err)
    }
}

fn decode<T>(idx: usize, ty: Type, value: Result<T, LedgerError>) -> rusqlite::Result<T> {
    value.map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(e)))
}

/// Amounts are stored as text, but older files may hold bare numbers.
fn amount_from_sql(value: ValueRef<'_>) -> Result<Decimal, LedgerError> {
    let amount = match value {
        ValueRef::Text(bytes) => {
            let s = std::str::from_utf8(bytes)
                .map_err(|e| LedgerError::Validation(format!("amount is not UTF-8: {}", e)))?;
            Decimal::from_str(s.trim())
                .map_err(|e| LedgerError::Validation(format!("invalid stored amount '{}': {}", s, e)))?
        }
        ValueRef::Integer(i) => Decimal::from(i),
        ValueRef::Real(f) => Decimal::try_from(f)
            .map_err(|e| LedgerError::Validation(format!("invalid stored amount {}: {}", f, e)))?,
        other => {
            return Err(LedgerError::Validation(format!(
                "unsupported amount value of type {}",
                other.data_type()
            )))
        }
    };
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(LedgerError::Validation(format!("negative stored amount {}", amount)));
    }
    Ok(amount)
}

fn transaction_from_row(row: &Row) -> rusqlite::Result<Transaction> {
    let date: String = row.get(1)?;
    let kind: i64 = row.get(3)?;
    let repeat: i64 = row.get(4)?;

    Ok(Transaction {
        id: row.get(0)?,
        date: decode(1, Type::Text, parse_date(&date))?,
        description: row.get(2)?,
        kind: decode(3, Type::Integer, TransactionType::try_from(kind))?,
        repeat: decode(4, Type::Integer, Repeat::try_from(repeat))?,
        amount: decode(5, Type::Text, amount_from_sql(row.get_ref(5)?))?,
        group_id: row.get(6)?,
    })
}

impl LedgerStore for Account {
    fn list_groups(&self) -> Result<Vec<Group>, LedgerError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description FROM groups")
            .map_err(sql_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Group {
                    id: row.get(0)?,
                    // NULL names from older files read as empty.
                    name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    description: row.get(2)?,
                })
            })
            .map_err(sql_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(sql_err)
    }

    fn list_transactions(&self) -> Result<Vec<Transaction>, LedgerError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM transactions", TRANSACTION_COLUMNS))
            .map_err(sql_err)?;
        let rows = stmt.query_map([], transaction_from_row).map_err(sql_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(sql_err)
    }

    fn add_group(&self, group: &Group) -> Result<(), LedgerError> {
        if self.exists(Entity::Group, group.id)? {
            return Err(LedgerError::DuplicateId { entity: Entity::Group, id: group.id });
        }
        self.conn
            .execute(
                "INSERT INTO groups (id, name, description) VALUES (?1, ?2, ?3)",
                params![group.id, group.name, group.description],
            )
            .map_err(sql_err)?;
        tracing::debug!(id = group.id, "group added");
        Ok(())
    }

    fn update_group(&self, group: &Group) -> Result<(), LedgerError> {
        let changed = self
            .conn
            .execute(
                "UPDATE groups SET name = ?2, description = ?3 WHERE id = ?1",
                params![group.id, group.name, group.description],
            )
            .map_err(sql_err)?;
        if changed == 0 {
            return Err(LedgerError::NotFound { entity: Entity::Group, id: group.id });
        }
        tracing::debug!(id = group.id, "group updated");
        Ok(())
    }

    fn delete_group(&self, id: i64) -> Result<(), LedgerError> {
        let changed = self
            .conn
            .execute("DELETE FROM groups WHERE id = ?1", params![id])
            .map_err(sql_err)?;
        if changed == 0 {
            return Err(LedgerError::NotFound { entity: Entity::Group, id });
        }

        let members: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM transactions WHERE group_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .map_err(sql_err)?;
        if members > 0 {
            tracing::warn!(id, members, "deleted group is still referenced by transactions");
        }
        tracing::debug!(id, "group deleted");
        Ok(())
    }

    fn add_transaction(&self, transaction: &Transaction) -> Result<(), LedgerError> {
        transaction.validate()?;
        if self.exists(Entity::Transaction, transaction.id)? {
            return Err(LedgerError::DuplicateId {
                entity: Entity::Transaction,
                id: transaction.id,
            });
        }
        self.conn
            .execute(
                &format!(
                    "INSERT INTO transactions ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    TRANSACTION_COLUMNS
                ),
                params![
                    transaction.id,
                    date_to_str(transaction.date),
                    transaction.description,
                    transaction.kind.code(),
                    transaction.repeat.code(),
                    transaction.amount.to_string(),
                    transaction.group_id
                ],
            )
            .map_err(sql_err)?;
        tracing::debug!(id = transaction.id, kind = %transaction.kind, "transaction added");
        Ok(())
    }

    fn update_transaction(&self, transaction: &Transaction) -> Result<(), LedgerError> {
        transaction.validate()?;
        let changed = self
            .conn
            .execute(
                "UPDATE transactions
                 SET date = ?2, description = ?3, type = ?4, repeat = ?5, amount = ?6, group_id = ?7
                 WHERE id = ?1",
                params![
                    transaction.id,
                    date_to_str(transaction.date),
                    transaction.description,
                    transaction.kind.code(),
                    transaction.repeat.code(),
                    transaction.amount.to_string(),
                    transaction.group_id
                ],
            )
            .map_err(sql_err)?;
        if changed == 0 {
            return Err(LedgerError::NotFound {
                entity: Entity::Transaction,
                id: transaction.id,
            });
        }
        tracing::debug!(id = transaction.id, "transaction updated");
        Ok(())
    }

    fn delete_transaction(&self, id: i64) -> Result<(), LedgerError> {
        let changed = self
            .conn
            .execute("DELETE FROM transactions WHERE id = ?1", params![id])
            .map_err(sql_err)?;
        if changed == 0 {
            return Err(LedgerError::NotFound { entity: Entity::Transaction, id });
        }
        tracing::debug!(id, "transaction deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;
    use time::{Date, Month};

    fn scratch() -> (TempDir, Account) {
        let dir = tempfile::tempdir().unwrap();
        let account = Account::create(dir.path().join("test.nmoney")).unwrap();
        (dir, account)
    }

    fn day(d: u8) -> Date {
        Date::from_calendar_date(2024, Month::January, d).unwrap()
    }

    fn income(id: i64, amount: Decimal) -> Transaction {
        Transaction::new(id, TransactionType::Income, amount, day(1)).unwrap()
    }

    fn expense(id: i64, amount: Decimal) -> Transaction {
        Transaction::new(id, TransactionType::Expense, amount, day(2)).unwrap()
    }

    #[test]
    fn test_open_rejects_bad_paths() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.nmoney");
        assert!(matches!(Account::open(&missing), Err(LedgerError::FileNotFound(_))));
        assert!(!missing.exists());

        let wrong_ext = dir.path().join("ledger.txt");
        std::fs::write(&wrong_ext, b"").unwrap();
        assert!(matches!(Account::open(&wrong_ext), Err(LedgerError::FileNotFound(_))));
        assert_eq!(std::fs::metadata(&wrong_ext).unwrap().len(), 0);

        let directory = dir.path().join("dir.nmoney");
        std::fs::create_dir(&directory).unwrap();
        assert!(matches!(Account::open(&directory), Err(LedgerError::FileNotFound(_))));
    }

    #[test]
    fn test_open_rejects_non_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.nmoney");
        std::fs::write(&path, "not an sqlite database\n".repeat(200)).unwrap();
        assert!(matches!(Account::open(&path), Err(LedgerError::Storage(_))));
    }

    #[test]
    fn test_create_refuses_existing_file() {
        let (dir, account) = scratch();
        account.close().unwrap();
        assert!(matches!(
            Account::create(dir.path().join("test.nmoney")),
            Err(LedgerError::IOError(_))
        ));
        assert!(matches!(
            Account::create(dir.path().join("other.db")),
            Err(LedgerError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_empty_store() {
        let (_dir, account) = scratch();
        assert!(account.list_groups().unwrap().is_empty());
        assert!(account.list_transactions().unwrap().is_empty());
        assert_eq!(account.next_available_transaction_id().unwrap(), 1);
        assert_eq!(account.next_available_group_id().unwrap(), 1);
        assert_eq!(account.total().unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_income_expense_total() {
        let (_dir, account) = scratch();
        account.add_transaction(&income(1, dec!(500))).unwrap();
        account.add_transaction(&expense(2, dec!(120))).unwrap();

        assert_eq!(account.income().unwrap(), dec!(500));
        assert_eq!(account.expense().unwrap(), dec!(120));
        assert_eq!(account.total().unwrap(), dec!(380));
        assert_eq!(
            account.income().unwrap() - account.expense().unwrap(),
            account.total().unwrap()
        );
    }

    #[test]
    fn test_group_total_is_scoped() {
        let (_dir, account) = scratch();
        let food = Group::new(1, "Food");
        let rent = Group::new(2, "Rent");
        account.add_group(&food).unwrap();
        account.add_group(&rent).unwrap();

        account.add_transaction(&expense(1, dec!(50)).with_group(1)).unwrap();
        account.add_transaction(&income(2, dec!(200)).with_group(1)).unwrap();
        account.add_transaction(&expense(3, dec!(900)).with_group(2)).unwrap();
        account.add_transaction(&income(4, dec!(10))).unwrap();

        assert_eq!(account.group_total(&food).unwrap(), dec!(150));
        assert_eq!(account.group_total(&rent).unwrap(), dec!(-900));
        assert_eq!(account.group_total(&Group::new(3, "Empty")).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_round_trip_text_and_nulls() {
        let (_dir, account) = scratch();
        let tricky = "it's a \"quoted\"\nmulti-line '); DROP TABLE transactions; --";

        let plain = income(1, dec!(10.05));
        let empty = expense(2, dec!(0)).with_description("");
        let weird = expense(3, dec!(99.99))
            .with_description(tricky)
            .with_repeat(Repeat::Biyearly)
            .with_group(42);
        for t in [&plain, &empty, &weird] {
            account.add_transaction(t).unwrap();
        }

        let mut stored = account.list_transactions().unwrap();
        stored.sort_by_key(|t| t.id);
        assert_eq!(stored, vec![plain, empty, weird]);
        assert_eq!(stored[0].group_id, None);
        assert_eq!(stored[0].description, None);
        assert_eq!(stored[1].description.as_deref(), Some(""));
        assert_eq!(stored[2].amount.to_string(), "99.99");

        let group = Group::new(1, tricky).with_description("");
        account.add_group(&group).unwrap();
        assert_eq!(account.list_groups().unwrap(), vec![group]);
    }

    #[test]
    fn test_unstorable_dates_leave_ledger_readable() {
        let (_dir, account) = scratch();
        account.add_transaction(&income(1, dec!(10))).unwrap();

        let mut ancient = expense(2, dec!(5));
        ancient.date = Date::from_calendar_date(-1, Month::January, 1).unwrap();
        assert!(matches!(account.add_transaction(&ancient), Err(LedgerError::Validation(_))));

        let mut moved = income(1, dec!(10));
        moved.date = ancient.date;
        assert!(matches!(account.update_transaction(&moved), Err(LedgerError::Validation(_))));

        assert_eq!(account.list_transactions().unwrap(), vec![income(1, dec!(10))]);
        assert_eq!(account.total().unwrap(), dec!(10));
        assert_eq!(account.next_available_transaction_id().unwrap(), 2);
    }

    #[test]
    fn test_null_group_name_reads_as_empty() {
        let (_dir, account) = scratch();
        account
            .conn
            .execute("INSERT INTO groups (id, name, description) VALUES (1, NULL, NULL)", [])
            .unwrap();

        let group = account.find_group(1).unwrap();
        assert_eq!(group, Group::new(1, ""));
        account.update_group(&group).unwrap();
        assert_eq!(account.list_groups().unwrap(), vec![group]);
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let (_dir, account) = scratch();
        account.add_group(&Group::new(1, "Food")).unwrap();
        account.add_transaction(&income(1, dec!(5))).unwrap();

        assert!(matches!(
            account.add_group(&Group::new(1, "Other")),
            Err(LedgerError::DuplicateId { entity: Entity::Group, id: 1 })
        ));
        assert!(matches!(
            account.add_transaction(&expense(1, dec!(7))),
            Err(LedgerError::DuplicateId { entity: Entity::Transaction, id: 1 })
        ));
        assert_eq!(account.list_groups().unwrap(), vec![Group::new(1, "Food")]);
        assert_eq!(account.list_transactions().unwrap(), vec![income(1, dec!(5))]);
    }

    #[test]
    fn test_missing_ids_are_not_found() {
        let (_dir, account) = scratch();
        account.add_group(&Group::new(1, "Food")).unwrap();
        account.add_transaction(&income(1, dec!(5))).unwrap();

        assert!(matches!(
            account.update_group(&Group::new(9, "Nope")),
            Err(LedgerError::NotFound { entity: Entity::Group, id: 9 })
        ));
        assert!(matches!(
            account.delete_group(9),
            Err(LedgerError::NotFound { entity: Entity::Group, id: 9 })
        ));
        assert!(matches!(
            account.update_transaction(&income(9, dec!(1))),
            Err(LedgerError::NotFound { entity: Entity::Transaction, id: 9 })
        ));
        assert!(matches!(
            account.delete_transaction(9),
            Err(LedgerError::NotFound { entity: Entity::Transaction, id: 9 })
        ));

        assert_eq!(account.list_groups().unwrap(), vec![Group::new(1, "Food")]);
        assert_eq!(account.list_transactions().unwrap(), vec![income(1, dec!(5))]);
    }

    #[test]
    fn test_update_overwrites_fields() {
        let (_dir, account) = scratch();
        account.add_group(&Group::new(1, "Food")).unwrap();
        account.add_transaction(&expense(1, dec!(5)).with_group(1).with_description("x")).unwrap();

        let mut changed = income(1, dec!(6.5));
        changed.repeat = Repeat::Monthly;
        account.update_transaction(&changed).unwrap();
        assert_eq!(account.find_transaction(1).unwrap(), changed);
        assert_eq!(account.find_transaction(1).unwrap().group_id, None);

        let renamed = Group::new(1, "Groceries").with_description("weekly shop");
        account.update_group(&renamed).unwrap();
        assert_eq!(account.find_group(1).unwrap(), renamed);
    }

    #[test]
    fn test_delete_group_keeps_transactions() {
        let (_dir, account) = scratch();
        account.add_group(&Group::new(1, "Food")).unwrap();
        let member = expense(1, dec!(50)).with_group(1);
        account.add_transaction(&member).unwrap();

        account.delete_group(1).unwrap();
        assert!(account.list_groups().unwrap().is_empty());
        assert_eq!(account.list_transactions().unwrap(), vec![member]);
        assert_eq!(account.group_total(&Group::new(1, "Food")).unwrap(), dec!(-50));
    }

    #[test]
    fn test_next_ids_never_collide() {
        let (_dir, account) = scratch();
        for _ in 0..3 {
            let id = account.next_available_transaction_id().unwrap();
            account.add_transaction(&income(id, dec!(1))).unwrap();
        }
        assert_eq!(account.next_available_transaction_id().unwrap(), 4);

        account.delete_transaction(2).unwrap();
        assert_eq!(account.next_available_transaction_id().unwrap(), 4);
        account.delete_transaction(3).unwrap();
        let next = account.next_available_transaction_id().unwrap();
        assert!(account.list_transactions().unwrap().iter().all(|t| t.id != next));

        account.add_group(&Group::new(5, "Gap")).unwrap();
        assert_eq!(account.next_available_group_id().unwrap(), 6);
    }

    #[test]
    fn test_negative_amount_is_rejected() {
        let (_dir, account) = scratch();
        let mut bad = income(1, dec!(1));
        bad.amount = dec!(-1);
        assert!(matches!(account.add_transaction(&bad), Err(LedgerError::Validation(_))));
        assert!(account.list_transactions().unwrap().is_empty());
    }

    #[test]
    fn test_persists_across_reopen() {
        let (dir, account) = scratch();
        account.add_group(&Group::new(1, "Food")).unwrap();
        account.add_transaction(&income(1, dec!(500)).with_group(1)).unwrap();
        account.close().unwrap();

        let account = Account::open(dir.path().join("test.nmoney")).unwrap();
        assert_eq!(account.total().unwrap(), dec!(500));
        assert_eq!(account.list_groups().unwrap().len(), 1);
    }

    #[test]
    fn test_legacy_schema_is_upgraded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.nmoney");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "
                CREATE TABLE transactions (id INTEGER PRIMARY KEY, date TEXT, description TEXT, type INTEGER, repeat INTEGER, amount TEXT);
                INSERT INTO transactions VALUES (1, '2023-05-01', 'salary', 0, 3, 1500);
                INSERT INTO transactions VALUES (2, '2023-05-02', NULL, 1, 0, 12.5);
                ",
            )
            .unwrap();
        }

        let account = Account::open(&path).unwrap();
        let mut stored = account.list_transactions().unwrap();
        stored.sort_by_key(|t| t.id);
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].amount, dec!(1500));
        assert_eq!(stored[0].repeat, Repeat::Monthly);
        assert_eq!(stored[0].group_id, None);
        assert_eq!(stored[1].amount, dec!(12.5));
        assert_eq!(account.total().unwrap(), dec!(1487.5));

        account.add_transaction(&expense(3, dec!(1)).with_group(1)).unwrap();
        account.close().unwrap();

        // Second open hits the duplicate column path.
        let account = Account::open(&path).unwrap();
        assert_eq!(account.find_transaction(3).unwrap().group_id, Some(1));
    }

    #[test]
    fn test_gid_links_are_carried_over() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nickvision.nmoney");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "
                CREATE TABLE groups (id INTEGER PRIMARY KEY, name TEXT, description TEXT);
                CREATE TABLE transactions (id INTEGER PRIMARY KEY, date TEXT, description TEXT, type INTEGER, repeat INTEGER, amount TEXT, gid INTEGER);
                INSERT INTO groups VALUES (1, 'Food', NULL);
                INSERT INTO transactions VALUES (1, '2023-05-02', 'market', 1, 0, '50', 1);
                INSERT INTO transactions VALUES (2, '2023-05-03', NULL, 0, 0, '20', NULL);
                ",
            )
            .unwrap();
        }

        let account = Account::open(&path).unwrap();
        let food = account.find_group(1).unwrap();
        assert_eq!(account.group_total(&food).unwrap(), dec!(-50));
        assert_eq!(account.find_transaction(1).unwrap().group_id, Some(1));
        assert_eq!(account.find_transaction(2).unwrap().group_id, None);

        // A link cleared after the upgrade stays cleared.
        let mut unlinked = account.find_transaction(1).unwrap();
        unlinked.group_id = None;
        account.update_transaction(&unlinked).unwrap();
        account.close().unwrap();

        let account = Account::open(&path).unwrap();
        assert_eq!(account.find_transaction(1).unwrap().group_id, None);
        assert_eq!(account.group_total(&food).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_corrupt_rows_surface_as_storage_errors() {
        let (_dir, account) = scratch();
        account
            .conn
            .execute(
                "INSERT INTO transactions (id, date, description, type, repeat, amount, group_id)
                 VALUES (1, '2024-01-01', NULL, 9, 0, '5', NULL)",
                [],
            )
            .unwrap();
        assert!(matches!(account.list_transactions(), Err(LedgerError::Storage(_))));
        assert!(matches!(account.total(), Err(LedgerError::Storage(_))));
    }
}
