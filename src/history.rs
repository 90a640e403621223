// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Merged expense + income history with a running balance.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::Result;
use crate::models::{EntryKind, Expense, Income, LedgerEntry};
use crate::store::LedgerStore;

/// One ledger entry in the normalized shape shared by both ledgers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projected {
    pub date: NaiveDate,
    pub kind: EntryKind,
    /// Category for expenses, source for income.
    pub label: String,
    pub amount: Decimal,
    pub created_at: NaiveDateTime,
    pub seq: i64,
}

impl From<&LedgerEntry> for Projected {
    fn from(e: &LedgerEntry) -> Self {
        Projected {
            date: e.date(),
            kind: e.kind(),
            label: e.label().to_string(),
            amount: e.amount(),
            created_at: e.created_at(),
            seq: e.seq(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub date: NaiveDate,
    pub kind: EntryKind,
    pub label: String,
    pub amount: Decimal,
    pub created_at: NaiveDateTime,
    /// Balance right after this entry, in chronological order.
    pub running_balance: Decimal,
}

/// Merge both ledgers and annotate each entry with its running balance.
///
/// Entries are ordered by date, then by creation time, then by the insertion
/// sequence shared by both ledgers, so rows created within the same
/// millisecond keep the order they were recorded in.
/// Balances are accumulated oldest to newest and the result is returned
/// newest first, so `rows[0].running_balance` is the current total.
pub fn aggregate(expenses: Vec<Expense>, incomes: Vec<Income>) -> Vec<HistoryRow> {
    let mut merged: Vec<Projected> = expenses
        .into_iter()
        .map(LedgerEntry::Expense)
        .chain(incomes.into_iter().map(LedgerEntry::Income))
        .map(|e| Projected::from(&e))
        .collect();

    merged.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.seq.cmp(&b.seq))
    });

    let ascending: Vec<HistoryRow> = merged
        .into_iter()
        .scan(Decimal::ZERO, |balance, p| {
            *balance += p.kind.signed(p.amount);
            Some(HistoryRow {
                date: p.date,
                kind: p.kind,
                label: p.label,
                amount: p.amount,
                created_at: p.created_at,
                running_balance: *balance,
            })
        })
        .collect();

    ascending.into_iter().rev().collect()
}

/// Full history for one owner. A failed read fails the whole request.
pub fn for_owner<S: LedgerStore>(store: &S, user_id: i64) -> Result<Vec<HistoryRow>> {
    let expenses = store.list_all_expenses(user_id)?;
    let incomes = store.list_all_income(user_id)?;
    Ok(aggregate(expenses, incomes))
}
