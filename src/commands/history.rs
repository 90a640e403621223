// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::history;
use crate::store::SqliteStore;
use crate::utils::{fmt_money, get_currency_symbol, maybe_print_json, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, owner: i64, sub: &clap::ArgMatches) -> Result<()> {
    let mut rows = history::for_owner(&SqliteStore::new(conn), owner)
        .context("Could not load transaction history")?;
    if let Some(limit) = sub.get_one::<usize>("limit") {
        rows.truncate(*limit);
    }

    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        let symbol = get_currency_symbol(conn)?;
        let data = rows
            .iter()
            .map(|r| {
                vec![
                    r.date.to_string(),
                    r.kind.to_string(),
                    r.label.clone(),
                    fmt_money(&symbol, &r.kind.signed(r.amount)),
                    fmt_money(&symbol, &r.running_balance),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Type", "Category", "Amount", "Balance"], data)
        );
    }
    Ok(())
}
