// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub created_at: NaiveDateTime,
}

/// Direction of a ledger entry or recurring definition. Amounts are always
/// stored positive; the kind decides whether they add to or subtract from the
/// balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Expense,
    Income,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Expense => "expense",
            EntryKind::Income => "income",
        }
    }

    /// Sign applied to an amount of this kind when computing a balance.
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            EntryKind::Expense => -amount,
            EntryKind::Income => amount,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "expense" => Ok(EntryKind::Expense),
            "income" => Ok(EntryKind::Income),
            other => Err(Error::Validation(format!(
                "Invalid transaction type '{}', expected expense|income",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub user_id: i64,
    pub category: String,
    pub amount: Decimal,
    pub expense_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    /// Insertion order shared by both ledgers.
    #[serde(skip)]
    pub seq: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    pub id: i64,
    pub user_id: i64,
    pub source: String,
    pub amount: Decimal,
    pub income_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    /// Insertion order shared by both ledgers.
    #[serde(skip)]
    pub seq: i64,
}

/// A concrete row in one of the two ledgers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LedgerEntry {
    Expense(Expense),
    Income(Income),
}

impl LedgerEntry {
    pub fn kind(&self) -> EntryKind {
        match self {
            LedgerEntry::Expense(_) => EntryKind::Expense,
            LedgerEntry::Income(_) => EntryKind::Income,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            LedgerEntry::Expense(e) => e.id,
            LedgerEntry::Income(i) => i.id,
        }
    }

    /// Category for expenses, source for income.
    pub fn label(&self) -> &str {
        match self {
            LedgerEntry::Expense(e) => &e.category,
            LedgerEntry::Income(i) => &i.source,
        }
    }

    pub fn amount(&self) -> Decimal {
        match self {
            LedgerEntry::Expense(e) => e.amount,
            LedgerEntry::Income(i) => i.amount,
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            LedgerEntry::Expense(e) => e.expense_date,
            LedgerEntry::Income(i) => i.income_date,
        }
    }

    pub fn notes(&self) -> Option<&str> {
        match self {
            LedgerEntry::Expense(e) => e.notes.as_deref(),
            LedgerEntry::Income(i) => i.notes.as_deref(),
        }
    }

    pub fn created_at(&self) -> NaiveDateTime {
        match self {
            LedgerEntry::Expense(e) => e.created_at,
            LedgerEntry::Income(i) => i.created_at,
        }
    }

    pub fn seq(&self) -> i64 {
        match self {
            LedgerEntry::Expense(e) => e.seq,
            LedgerEntry::Income(i) => i.seq,
        }
    }
}

/// Fields needed to insert a ledger row of either kind.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub user_id: i64,
    pub kind: EntryKind,
    pub label: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

/// A user configured template that the recurring engine turns into a ledger
/// entry once per calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringDefinition {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub category: String,
    pub amount: Decimal,
    pub day_of_month: u32,
    pub notes: Option<String>,
    pub is_active: bool,
    pub last_executed_at: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRecurring {
    pub user_id: i64,
    pub kind: EntryKind,
    pub category: String,
    pub amount: Decimal,
    pub day_of_month: u32,
    pub notes: Option<String>,
}
