// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::history;
use crate::models::EntryKind;
use crate::store::{LedgerQuery, SqliteStore};
use crate::utils::required;
use anyhow::Result;
use rusqlite::Connection;
use serde_json::json;

pub fn handle(conn: &Connection, owner: i64, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("history", sub)) => export_history(conn, owner, sub),
        Some(("expenses", sub)) => export_ledger(conn, owner, EntryKind::Expense, sub),
        Some(("income", sub)) => export_ledger(conn, owner, EntryKind::Income, sub),
        _ => Ok(()),
    }
}

fn export_history(conn: &Connection, owner: i64, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = required(sub, "format")?.to_lowercase();
    let out = required(sub, "out")?;
    let rows = history::for_owner(&SqliteStore::new(conn), owner)?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record(["date", "type", "category", "amount", "running_balance"])?;
            for r in &rows {
                wtr.write_record([
                    r.date.to_string(),
                    r.kind.to_string(),
                    r.label.clone(),
                    r.amount.to_string(),
                    r.running_balance.to_string(),
                ])?;
            }
            wtr.flush()?;
        }
        _ => {
            std::fs::write(out, serde_json::to_string_pretty(&rows)?)?;
        }
    }
    println!("Exported {} history rows to {}", rows.len(), out);
    Ok(())
}

fn export_ledger(
    conn: &Connection,
    owner: i64,
    kind: EntryKind,
    sub: &clap::ArgMatches,
) -> Result<()> {
    let fmt = required(sub, "format")?.to_lowercase();
    let out = required(sub, "out")?;
    let entries =
        SqliteStore::new(conn).query_entries(kind, owner, &LedgerQuery::default())?;
    let label = crate::commands::ledger::label_arg(kind);

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record(["id", "date", label, "amount", "notes", "created_at"])?;
            for e in &entries {
                wtr.write_record([
                    e.id().to_string(),
                    e.date().to_string(),
                    e.label().to_string(),
                    e.amount().to_string(),
                    e.notes().unwrap_or_default().to_string(),
                    e.created_at().to_string(),
                ])?;
            }
            wtr.flush()?;
        }
        _ => {
            let items: Vec<_> = entries
                .iter()
                .map(|e| {
                    json!({
                        "id": e.id(), "date": e.date(), label: e.label(),
                        "amount": e.amount(), "notes": e.notes(), "created_at": e.created_at()
                    })
                })
                .collect();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
    }
    println!("Exported {} {} rows to {}", entries.len(), kind, out);
    Ok(())
}
