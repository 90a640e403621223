// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;

use crate::models::{EntryKind, LedgerEntry};
use crate::store::{LedgerQuery, SqliteStore};
use crate::utils::{
    fmt_money, get_currency_symbol, maybe_print_json, parse_month, pretty_table, today,
};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

const RECENT_EXPENSES: usize = 5;

#[derive(Debug, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct MonthlySummary {
    pub month: String,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub net_balance: Decimal,
    /// Latest expenses across all months.
    pub recent_expenses: Vec<LedgerEntry>,
    /// Spend per category within the month, largest first.
    pub expense_by_category: Vec<CategoryTotal>,
}

pub fn monthly_summary(
    conn: &Connection,
    owner: i64,
    first: NaiveDate,
    last: NaiveDate,
) -> Result<MonthlySummary> {
    let store = SqliteStore::new(conn);
    let in_month = LedgerQuery {
        from: Some(first),
        to: Some(last),
        ..Default::default()
    };
    let expenses = store.query_entries(EntryKind::Expense, owner, &in_month)?;
    let incomes = store.query_entries(EntryKind::Income, owner, &in_month)?;

    let total_expenses: Decimal = expenses.iter().map(|e| e.amount()).sum();
    let total_income: Decimal = incomes.iter().map(|e| e.amount()).sum();

    let mut by_category: BTreeMap<String, Decimal> = BTreeMap::new();
    for e in &expenses {
        *by_category.entry(e.label().to_string()).or_insert(Decimal::ZERO) += e.amount();
    }
    let mut expense_by_category: Vec<CategoryTotal> = by_category
        .into_iter()
        .map(|(category, total)| CategoryTotal { category, total })
        .collect();
    expense_by_category.sort_by(|a, b| b.total.cmp(&a.total));

    let recent_expenses = store.query_entries(
        EntryKind::Expense,
        owner,
        &LedgerQuery {
            limit: Some(RECENT_EXPENSES),
            ..Default::default()
        },
    )?;

    Ok(MonthlySummary {
        month: first.format("%Y-%m").to_string(),
        total_income,
        total_expenses,
        net_balance: total_income - total_expenses,
        recent_expenses,
        expense_by_category,
    })
}

pub fn handle(conn: &Connection, owner: i64, sub: &clap::ArgMatches) -> Result<()> {
    let month = match sub.get_one::<String>("month") {
        Some(m) => m.clone(),
        None => today().format("%Y-%m").to_string(),
    };
    let (first, last) = parse_month(&month)?;
    let summary = monthly_summary(conn, owner, first, last)?;

    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &summary)? {
        return Ok(());
    }

    let symbol = get_currency_symbol(conn)?;
    println!(
        "{}",
        pretty_table(
            &["Month", "Income", "Expenses", "Net"],
            vec![vec![
                summary.month.clone(),
                fmt_money(&symbol, &summary.total_income),
                fmt_money(&symbol, &summary.total_expenses),
                fmt_money(&symbol, &summary.net_balance),
            ]],
        )
    );

    let recent = summary
        .recent_expenses
        .iter()
        .map(|e| {
            vec![
                e.date().to_string(),
                e.label().to_string(),
                fmt_money(&symbol, &e.amount()),
            ]
        })
        .collect();
    println!("Recent expenses");
    println!("{}", pretty_table(&["Date", "Category", "Amount"], recent));

    let cats = summary
        .expense_by_category
        .iter()
        .map(|c| vec![c.category.clone(), fmt_money(&symbol, &c.total)])
        .collect();
    println!("Spend by category");
    println!("{}", pretty_table(&["Category", "Spent"], cats));
    Ok(())
}
