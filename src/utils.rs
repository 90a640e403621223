// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, NaiveDate};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

use crate::error::Error;
use crate::store::SqliteStore;

pub const MAX_AMOUNT: i64 = 9_999_999;
pub const MAX_LABEL_LEN: usize = 255;
pub const MAX_NOTES_LEN: usize = 1000;

pub const DEFAULT_CURRENCY_SYMBOL: &str = "¥";
pub const SETTING_KEYS: &[&str] = &["currency_symbol"];

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Parse `YYYY-MM` into its first and last day.
pub fn parse_month(s: &str) -> Result<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
    let last = NaiveDate::from_ymd_opt(
        first.year(),
        first.month(),
        days_in_month(first.year(), first.month()),
    )
    .ok_or_else(|| anyhow!("Invalid month '{}'", s))?;
    Ok((first, last))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn parse_id(s: &str) -> Result<i64> {
    s.trim()
        .parse::<i64>()
        .with_context(|| format!("Invalid id '{}'", s))
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// Today's local calendar date. Command handlers call this; the library
/// modules take the date as a parameter.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn validate_amount(amount: Decimal) -> Result<Decimal, Error> {
    if amount < Decimal::ONE || amount > Decimal::from(MAX_AMOUNT) {
        return Err(Error::Validation(format!(
            "Amount must be between 1 and {}, got {}",
            MAX_AMOUNT, amount
        )));
    }
    Ok(amount)
}

pub fn validate_label(what: &str, label: &str) -> Result<String, Error> {
    let label = label.trim();
    if label.is_empty() {
        return Err(Error::Validation(format!("{} is required", what)));
    }
    if label.chars().count() > MAX_LABEL_LEN {
        return Err(Error::Validation(format!(
            "{} must be at most {} characters",
            what, MAX_LABEL_LEN
        )));
    }
    Ok(label.to_string())
}

pub fn validate_notes(notes: Option<&str>) -> Result<Option<String>, Error> {
    let notes = notes.map(str::trim).filter(|n| !n.is_empty());
    if let Some(n) = notes {
        if n.chars().count() > MAX_NOTES_LEN {
            return Err(Error::Validation(format!(
                "Notes must be at most {} characters",
                MAX_NOTES_LEN
            )));
        }
    }
    Ok(notes.map(str::to_string))
}

/// Manually entered transactions record things that already happened.
pub fn validate_entry_date(date: NaiveDate, today: NaiveDate) -> Result<NaiveDate, Error> {
    if date > today {
        return Err(Error::Validation(format!(
            "{} is in the future, which is not allowed",
            date
        )));
    }
    Ok(date)
}

pub fn validate_day_of_month(day: u32) -> Result<u32, Error> {
    if !(1..=31).contains(&day) {
        return Err(Error::Validation(format!(
            "Day must be between 1 and 31, got {}",
            day
        )));
    }
    Ok(day)
}

pub fn fmt_money(symbol: &str, d: &Decimal) -> String {
    format!("{}{}", symbol, d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

/// Resolve the acting owner from `--user` / `POCKETBOOK_USER`.
pub fn owner_id(conn: &Connection, user: Option<&str>) -> Result<i64> {
    let name = user
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .context("No user given; pass --user <name> or set POCKETBOOK_USER")?;
    let user = SqliteStore::new(conn)
        .find_user(name)
        .with_context(|| format!("Unknown user '{}' (create it with `user add`)", name))?;
    Ok(user.id)
}

pub fn required<'a>(m: &'a clap::ArgMatches, name: &str) -> Result<&'a String> {
    m.get_one::<String>(name)
        .with_context(|| format!("Missing required argument --{}", name))
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    if !SETTING_KEYS.contains(&key) {
        return Err(anyhow!(
            "Unknown setting '{}' (known: {})",
            key,
            SETTING_KEYS.join(", ")
        ));
    }
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn get_currency_symbol(conn: &Connection) -> Result<String> {
    Ok(get_setting(conn, "currency_symbol")?
        .unwrap_or_else(|| DEFAULT_CURRENCY_SYMBOL.to_string()))
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
