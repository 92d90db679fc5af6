use std::{fmt::Display, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, Month};

use crate::storage::LedgerError;

/// Polarity of a transaction. Amounts are stored as magnitudes, the sign comes from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    /// Integer code used by the `type` column.
    pub fn code(self) -> i64 {
        match self {
            TransactionType::Income => 0,
            TransactionType::Expense => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl TryFrom<i64> for TransactionType {
    type Error = LedgerError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TransactionType::Income),
            1 => Ok(TransactionType::Expense),
            _ => Err(LedgerError::Validation(format!("unknown transaction type code {}", value))),
        }
    }
}

impl FromStr for TransactionType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" | "i" => Ok(TransactionType::Income),
            "expense" | "e" => Ok(TransactionType::Expense),
            other => Err(LedgerError::Validation(format!("unknown transaction type '{}'", other))),
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recurrence tag. Stored and round-tripped, never expanded into new transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Repeat {
    #[default]
    Never,
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
    Biyearly,
}

impl Repeat {
    pub const ALL: [Repeat; 7] = [
        Repeat::Never,
        Repeat::Daily,
        Repeat::Weekly,
        Repeat::Monthly,
        Repeat::Quarterly,
        Repeat::Yearly,
        Repeat::Biyearly,
    ];

    /// Integer code used by the `repeat` column.
    pub fn code(self) -> i64 {
        match self {
            Repeat::Never => 0,
            Repeat::Daily => 1,
            Repeat::Weekly => 2,
            Repeat::Monthly => 3,
            Repeat::Quarterly => 4,
            Repeat::Yearly => 5,
            Repeat::Biyearly => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Repeat::Never => "never",
            Repeat::Daily => "daily",
            Repeat::Weekly => "weekly",
            Repeat::Monthly => "monthly",
            Repeat::Quarterly => "quarterly",
            Repeat::Yearly => "yearly",
            Repeat::Biyearly => "biyearly",
        }
    }
}

impl TryFrom<i64> for Repeat {
    type Error = LedgerError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Repeat::ALL
            .into_iter()
            .find(|r| r.code() == value)
            .ok_or_else(|| LedgerError::Validation(format!("unknown repeat code {}", value)))
    }
}

impl FromStr for Repeat {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Repeat::ALL
            .into_iter()
            .find(|r| r.as_str() == wanted)
            .ok_or_else(|| LedgerError::Validation(format!("unknown repeat '{}'", s)))
    }
}

impl Display for Repeat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub repeat: Repeat,
    pub amount: Decimal,
    pub group_id: Option<i64>,
}

impl Transaction {
    /// Builds an ungrouped, non-repeating transaction without a description.
    ///
    /// The date is always supplied by the caller; there is no implicit "today".
    pub fn new(id: i64, kind: TransactionType, amount: Decimal, date: Date) -> Result<Self, LedgerError> {
        let transaction = Self {
            id,
            date,
            description: None,
            kind,
            repeat: Repeat::Never,
            amount,
            group_id: None,
        };
        transaction.validate()?;
        Ok(transaction)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn with_group(mut self, group_id: i64) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(LedgerError::Validation(format!(
                "transaction {} has negative amount {}",
                self.id, self.amount
            )));
        }
        if !STORABLE_YEARS.contains(&self.date.year()) {
            return Err(LedgerError::Validation(format!(
                "transaction {} has date {} outside years {}..={}",
                self.id,
                self.date,
                STORABLE_YEARS.start(),
                STORABLE_YEARS.end()
            )));
        }
        Ok(())
    }
}

impl Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {} {} {}", self.id, date_to_str(self.date), self.kind, self.amount)?;
        if self.repeat != Repeat::Never {
            write!(f, " ({})", self.repeat)?;
        }
        if let Some(gid) = self.group_id {
            write!(f, " [group {}]", gid)?;
        }
        if let Some(desc) = &self.description {
            write!(f, " {:?}", desc)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl Group {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {}", self.id, self.name)?;
        if let Some(desc) = &self.description {
            write!(f, " {:?}", desc)?;
        }
        Ok(())
    }
}

/// Years that fit the four-digit `YYYY` field of a stored date.
pub const STORABLE_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

pub fn date_to_str(d: Date) -> String {
    format!("{:04}-{:02}-{:02}", d.year(), d.month() as u8, d.day())
}

/// Parses an ISO-8601 calendar date (`YYYY-MM-DD`).
pub fn parse_date(s: &str) -> Result<Date, LedgerError> {
    let invalid = || LedgerError::Validation(format!("invalid date '{}', expected YYYY-MM-DD", s));

    let parts: Vec<&str> = s.trim().split('-').collect();
    let widths_ok = parts.len() == 3
        && parts
            .iter()
            .zip([4, 2, 2])
            .all(|(p, w)| p.len() == w && p.bytes().all(|b| b.is_ascii_digit()));
    if !widths_ok {
        return Err(invalid());
    }
    let year = parts[0].parse::<i32>().map_err(|_| invalid())?;
    let month = parts[1].parse::<u8>().map_err(|_| invalid())?;
    let day = parts[2].parse::<u8>().map_err(|_| invalid())?;
    let month = Month::try_from(month).map_err(|_| invalid())?;
    Date::from_calendar_date(year, month, day).map_err(|_| invalid())
}

/// Parses a non-negative monetary amount.
pub fn parse_amount(s: &str) -> Result<Decimal, LedgerError> {
    let amount = Decimal::from_str(s.trim())
        .map_err(|e| LedgerError::Validation(format!("invalid amount '{}': {}", s, e)))?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(LedgerError::Validation(format!("amount must not be negative: {}", s)));
    }
    Ok(amount)
}

mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::date_to_str(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_date(&s).map_err(serde::de::Error::custom)
    }
}
