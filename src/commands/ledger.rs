// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! `expense` and `income` subcommands. Both ledgers share one handler and
//! differ only in table and label column.

use crate::models::{EntryKind, LedgerEntry, NewEntry};
use crate::store::{EntryPatch, LedgerQuery, SqliteStore};
use crate::utils::{
    fmt_money, get_currency_symbol, maybe_print_json, parse_date, parse_decimal, parse_id,
    pretty_table, required, today, validate_amount, validate_entry_date, validate_label,
    validate_notes,
};
use anyhow::{Result, bail};
use rusqlite::Connection;

/// CLI argument naming the label column of a ledger.
pub fn label_arg(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Expense => "category",
        EntryKind::Income => "source",
    }
}

fn label_title(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Expense => "Category",
        EntryKind::Income => "Source",
    }
}

pub fn handle(conn: &Connection, owner: i64, kind: EntryKind, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, owner, kind, sub)?,
        Some(("list", sub)) => list(conn, owner, kind, sub)?,
        Some(("show", sub)) => {
            let id = parse_id(required(sub, "id")?)?;
            let entry = SqliteStore::new(conn).get_entry(kind, owner, id)?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
        Some(("edit", sub)) => edit(conn, owner, kind, sub)?,
        Some(("rm", sub)) => {
            let id = parse_id(required(sub, "id")?)?;
            SqliteStore::new(conn).delete_entry(kind, owner, id)?;
            println!("Deleted {} {}", kind, id);
        }
        Some(("categories", sub)) | Some(("sources", sub)) => {
            let labels = SqliteStore::new(conn).distinct_labels(kind, owner)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &labels)? {
                let rows = labels.into_iter().map(|l| vec![l]).collect();
                println!("{}", pretty_table(&[label_title(kind)], rows));
            }
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, owner: i64, kind: EntryKind, sub: &clap::ArgMatches) -> Result<()> {
    let date = validate_entry_date(parse_date(required(sub, "date")?)?, today())?;
    let label = validate_label(label_title(kind), required(sub, label_arg(kind))?)?;
    let amount = validate_amount(parse_decimal(required(sub, "amount")?)?)?;
    let notes = validate_notes(sub.get_one::<String>("notes").map(String::as_str))?;

    let entry = SqliteStore::new(conn).insert_entry(&NewEntry {
        user_id: owner,
        kind,
        label,
        amount,
        date,
        notes,
    })?;
    println!(
        "Recorded {} {}: {} {} on {}",
        kind,
        entry.id(),
        entry.label(),
        fmt_money(&get_currency_symbol(conn)?, &entry.amount()),
        entry.date()
    );
    Ok(())
}

fn edit(conn: &Connection, owner: i64, kind: EntryKind, sub: &clap::ArgMatches) -> Result<()> {
    let id = parse_id(required(sub, "id")?)?;
    let date = match sub.get_one::<String>("date") {
        Some(d) => Some(validate_entry_date(parse_date(d)?, today())?),
        None => None,
    };
    let label = match sub.get_one::<String>(label_arg(kind)) {
        Some(l) => Some(validate_label(label_title(kind), l)?),
        None => None,
    };
    let amount = match sub.get_one::<String>("amount") {
        Some(a) => Some(validate_amount(parse_decimal(a)?)?),
        None => None,
    };
    let notes = if sub.get_flag("clear_notes") {
        Some(None)
    } else {
        match sub.get_one::<String>("notes") {
            Some(n) => Some(validate_notes(Some(n.as_str()))?),
            None => None,
        }
    };

    let entry = SqliteStore::new(conn).update_entry(
        kind,
        owner,
        id,
        &EntryPatch {
            label,
            amount,
            date,
            notes,
        },
    )?;
    println!("Updated {} {}", kind, entry.id());
    Ok(())
}

fn list(conn: &Connection, owner: i64, kind: EntryKind, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn, owner, kind, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let symbol = get_currency_symbol(conn)?;
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|e| {
                vec![
                    e.id().to_string(),
                    e.date().to_string(),
                    e.label().to_string(),
                    fmt_money(&symbol, &e.amount()),
                    e.notes().unwrap_or_default().to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Date", label_title(kind), "Amount", "Notes"], rows)
        );
    }
    Ok(())
}

/// Build the filtered, paged query from `list` arguments and run it.
pub fn query_rows(
    conn: &Connection,
    owner: i64,
    kind: EntryKind,
    sub: &clap::ArgMatches,
) -> Result<Vec<LedgerEntry>> {
    let page = sub.get_one::<usize>("page").copied().unwrap_or(1);
    let per_page = sub.get_one::<usize>("per_page").copied().unwrap_or(20);
    if page == 0 || per_page == 0 {
        bail!("--page and --per-page start at 1");
    }
    let Some(offset) = (page - 1)
        .checked_mul(per_page)
        .filter(|o| i64::try_from(*o).is_ok())
    else {
        bail!("--page {} is out of range", page);
    };

    let from = sub.get_one::<String>("from").map(|s| parse_date(s)).transpose()?;
    let to = sub.get_one::<String>("to").map(|s| parse_date(s)).transpose()?;
    let label = sub
        .get_one::<String>(label_arg(kind))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != "all");
    let amount_search = sub
        .get_one::<String>("amount_search")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let q = LedgerQuery {
        from,
        to,
        label,
        amount_search,
        limit: Some(per_page),
        offset: Some(offset),
    };
    Ok(SqliteStore::new(conn).query_entries(kind, owner, &q)?)
}
