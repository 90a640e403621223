// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Persistence for users, the two ledgers and recurring definitions.
//!
//! The recurring engine and the history aggregator only see the
//! [DefinitionStore], [LedgerStore] and [Atomic] traits so they can run
//! against an in-memory fake in tests. [SqliteStore] implements them on top
//! of a borrowed [rusqlite::Connection] and additionally carries the owner
//! scoped CRUD used by the command layer.

use std::ops::RangeInclusive;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::models::{
    EntryKind, Expense, Income, LedgerEntry, NewEntry, NewRecurring, RecurringDefinition, User,
};

/// A definition due for processing, before its row is decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: i64,
    pub category: String,
}

/// Read and update access to recurring definitions.
pub trait DefinitionStore {
    /// Active definitions, across all owners, whose day of month lies in
    /// `days`. Rows are not decoded here, so one malformed definition cannot
    /// hide the others.
    fn list_active_for_days(&self, days: RangeInclusive<u32>) -> Result<Vec<Candidate>>;

    fn get_definition(&self, id: i64) -> Result<RecurringDefinition>;

    fn update_last_executed(&mut self, id: i64, date: NaiveDate) -> Result<()>;
}

/// Insert and full-history reads for the expense and income ledgers.
pub trait LedgerStore {
    fn create_expense(
        &mut self,
        user_id: i64,
        category: &str,
        amount: Decimal,
        date: NaiveDate,
        notes: Option<&str>,
    ) -> Result<Expense>;

    fn create_income(
        &mut self,
        user_id: i64,
        source: &str,
        amount: Decimal,
        date: NaiveDate,
        notes: Option<&str>,
    ) -> Result<Income>;

    fn list_all_expenses(&self, user_id: i64) -> Result<Vec<Expense>>;

    fn list_all_income(&self, user_id: i64) -> Result<Vec<Income>>;
}

/// Runs a unit of work so that either all of its writes land or none do.
///
/// Implementations must also serialize concurrent units that touch the same
/// rows, so a check performed inside `f` still holds when `f` writes.
pub trait Atomic {
    fn atomically<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>;
}

/// Filters for listing one ledger.
#[derive(Debug, Clone, Default)]
pub struct LedgerQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Exact category (expenses) or source (income).
    pub label: Option<String>,
    /// Substring match on the stored amount text.
    pub amount_search: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Field updates for a ledger row. `None` leaves the column as it is.
#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
    pub label: Option<String>,
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub notes: Option<Option<String>>,
}

/// Field updates for a recurring definition. `None` leaves the column as it
/// is.
#[derive(Debug, Clone, Default)]
pub struct RecurringPatch {
    pub kind: Option<EntryKind>,
    pub category: Option<String>,
    pub amount: Option<Decimal>,
    pub day_of_month: Option<u32>,
    pub notes: Option<Option<String>>,
    pub is_active: Option<bool>,
}

struct LedgerTable {
    table: &'static str,
    label: &'static str,
    date: &'static str,
}

fn ledger_table(kind: EntryKind) -> LedgerTable {
    match kind {
        EntryKind::Expense => LedgerTable {
            table: "expenses",
            label: "category",
            date: "expense_date",
        },
        EntryKind::Income => LedgerTable {
            table: "incomes",
            label: "source",
            date: "income_date",
        },
    }
}

fn parse_amount(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .map_err(|e| Error::CorruptData(format!("invalid amount '{}': {}", s, e)))
}

struct RawEntry {
    id: i64,
    user_id: i64,
    label: String,
    amount: String,
    date: NaiveDate,
    notes: Option<String>,
    created_at: NaiveDateTime,
    seq: i64,
}

impl RawEntry {
    fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(RawEntry {
            id: r.get(0)?,
            user_id: r.get(1)?,
            label: r.get(2)?,
            amount: r.get(3)?,
            date: r.get(4)?,
            notes: r.get(5)?,
            created_at: r.get(6)?,
            seq: r.get::<_, Option<i64>>(7)?.unwrap_or_default(),
        })
    }

    fn into_entry(self, kind: EntryKind) -> Result<LedgerEntry> {
        let amount = parse_amount(&self.amount)?;
        Ok(match kind {
            EntryKind::Expense => LedgerEntry::Expense(Expense {
                id: self.id,
                user_id: self.user_id,
                category: self.label,
                amount,
                expense_date: self.date,
                notes: self.notes,
                created_at: self.created_at,
                seq: self.seq,
            }),
            EntryKind::Income => LedgerEntry::Income(Income {
                id: self.id,
                user_id: self.user_id,
                source: self.label,
                amount,
                income_date: self.date,
                notes: self.notes,
                created_at: self.created_at,
                seq: self.seq,
            }),
        })
    }
}

struct RawDefinition {
    id: i64,
    user_id: i64,
    kind: String,
    category: String,
    amount: String,
    day_of_month: i64,
    notes: Option<String>,
    is_active: bool,
    last_executed_at: Option<NaiveDate>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

const DEFINITION_COLUMNS: &str = "id, user_id, type, category, amount, day_of_month, notes, \
     is_active, last_executed_at, created_at, updated_at";

impl RawDefinition {
    fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(RawDefinition {
            id: r.get(0)?,
            user_id: r.get(1)?,
            kind: r.get(2)?,
            category: r.get(3)?,
            amount: r.get(4)?,
            day_of_month: r.get(5)?,
            notes: r.get(6)?,
            is_active: r.get(7)?,
            last_executed_at: r.get(8)?,
            created_at: r.get(9)?,
            updated_at: r.get(10)?,
        })
    }

    fn into_definition(self) -> Result<RecurringDefinition> {
        let kind = self
            .kind
            .parse::<EntryKind>()
            .map_err(|_| Error::CorruptData(format!("invalid type '{}'", self.kind)))?;
        let day_of_month = u32::try_from(self.day_of_month)
            .ok()
            .filter(|d| (1..=31).contains(d))
            .ok_or_else(|| {
                Error::CorruptData(format!("invalid day of month {}", self.day_of_month))
            })?;
        Ok(RecurringDefinition {
            id: self.id,
            user_id: self.user_id,
            kind,
            category: self.category,
            amount: parse_amount(&self.amount)?,
            day_of_month,
            notes: self.notes,
            is_active: self.is_active,
            last_executed_at: self.last_executed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SQLite backed store borrowing an open connection.
pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        SqliteStore { conn }
    }

    // Users

    pub fn create_user(&self, name: &str) -> Result<User> {
        self.conn
            .execute("INSERT INTO users(name) VALUES (?1)", params![name])?;
        self.find_user(name)
    }

    pub fn find_user(&self, name: &str) -> Result<User> {
        self.conn
            .query_row(
                "SELECT id, name, created_at FROM users WHERE name=?1",
                params![name],
                |r| {
                    Ok(User {
                        id: r.get(0)?,
                        name: r.get(1)?,
                        created_at: r.get(2)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("User '{}'", name)))
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at FROM users ORDER BY name")?;
        let rows = stmt.query_map([], |r| {
            Ok(User {
                id: r.get(0)?,
                name: r.get(1)?,
                created_at: r.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn delete_user(&self, name: &str) -> Result<()> {
        let n = self
            .conn
            .execute("DELETE FROM users WHERE name=?1", params![name])?;
        if n == 0 {
            return Err(Error::NotFound(format!("User '{}'", name)));
        }
        Ok(())
    }

    // Ledgers

    pub fn insert_entry(&self, new: &NewEntry) -> Result<LedgerEntry> {
        let t = ledger_table(new.kind);
        let sql = format!(
            "INSERT INTO {}(user_id, {}, amount, {}, notes) VALUES (?1, ?2, ?3, ?4, ?5)",
            t.table, t.label, t.date
        );
        self.conn.execute(
            &sql,
            params![
                new.user_id,
                new.label,
                new.amount.to_string(),
                new.date,
                new.notes
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_entry(new.kind, new.user_id, id)
    }

    /// Fetch a row of the given ledger that must belong to `user_id`.
    pub fn get_entry(&self, kind: EntryKind, user_id: i64, id: i64) -> Result<LedgerEntry> {
        let t = ledger_table(kind);
        let sql = format!(
            "SELECT id, user_id, {}, amount, {}, notes, created_at, seq FROM {} WHERE id=?1",
            t.label, t.date, t.table
        );
        let raw = self
            .conn
            .query_row(&sql, params![id], RawEntry::from_row)
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("{} {}", kind, id)))?;
        if raw.user_id != user_id {
            return Err(Error::Forbidden(format!("{} {}", kind, id)));
        }
        raw.into_entry(kind)
    }

    pub fn update_entry(
        &self,
        kind: EntryKind,
        user_id: i64,
        id: i64,
        patch: &EntryPatch,
    ) -> Result<LedgerEntry> {
        self.get_entry(kind, user_id, id)?;
        let t = ledger_table(kind);
        let sql = format!(
            "UPDATE {} SET {label}=COALESCE(?1, {label}), amount=COALESCE(?2, amount),
             {date}=COALESCE(?3, {date}), notes=CASE WHEN ?4 THEN ?5 ELSE notes END
             WHERE id=?6 AND user_id=?7",
            t.table,
            label = t.label,
            date = t.date
        );
        self.conn.execute(
            &sql,
            params![
                patch.label,
                patch.amount.map(|a| a.to_string()),
                patch.date,
                patch.notes.is_some(),
                patch.notes.clone().flatten(),
                id,
                user_id
            ],
        )?;
        self.get_entry(kind, user_id, id)
    }

    pub fn delete_entry(&self, kind: EntryKind, user_id: i64, id: i64) -> Result<()> {
        self.get_entry(kind, user_id, id)?;
        let t = ledger_table(kind);
        self.conn.execute(
            &format!("DELETE FROM {} WHERE id=?1 AND user_id=?2", t.table),
            params![id, user_id],
        )?;
        Ok(())
    }

    /// List one ledger for an owner, newest first.
    pub fn query_entries(
        &self,
        kind: EntryKind,
        user_id: i64,
        q: &LedgerQuery,
    ) -> Result<Vec<LedgerEntry>> {
        let t = ledger_table(kind);
        let mut sql = format!(
            "SELECT id, user_id, {}, amount, {}, notes, created_at, seq FROM {} WHERE user_id=?",
            t.label, t.date, t.table
        );
        let mut args: Vec<String> = vec![user_id.to_string()];

        if let Some(from) = q.from {
            sql.push_str(&format!(" AND {}>=?", t.date));
            args.push(from.to_string());
        }
        if let Some(to) = q.to {
            sql.push_str(&format!(" AND {}<=?", t.date));
            args.push(to.to_string());
        }
        if let Some(label) = &q.label {
            sql.push_str(&format!(" AND {}=?", t.label));
            args.push(label.clone());
        }
        if let Some(needle) = &q.amount_search {
            sql.push_str(" AND amount LIKE ?");
            args.push(format!("%{}%", needle));
        }
        sql.push_str(&format!(" ORDER BY {} DESC, created_at DESC, seq DESC", t.date));
        if let Some(limit) = q.limit {
            sql.push_str(" LIMIT ?");
            args.push(limit.to_string());
            if let Some(offset) = q.offset {
                sql.push_str(" OFFSET ?");
                args.push(offset.to_string());
            }
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), RawEntry::from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?.into_entry(kind)?);
        }
        Ok(out)
    }

    /// Distinct categories (expenses) or sources (income) for an owner.
    pub fn distinct_labels(&self, kind: EntryKind, user_id: i64) -> Result<Vec<String>> {
        let t = ledger_table(kind);
        let sql = format!(
            "SELECT DISTINCT {label} FROM {} WHERE user_id=?1 ORDER BY {label}",
            t.table,
            label = t.label
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], |r| r.get::<_, String>(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // Recurring definitions

    pub fn insert_recurring(&self, new: &NewRecurring) -> Result<RecurringDefinition> {
        self.conn.execute(
            "INSERT INTO recurring_transactions(user_id, type, category, amount, day_of_month, notes, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)",
            params![
                new.user_id,
                new.kind.as_str(),
                new.category,
                new.amount.to_string(),
                new.day_of_month,
                new.notes
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_definition(id)
    }

    /// Definitions of one owner ordered by type, then day of month.
    pub fn list_recurring(&self, user_id: i64) -> Result<Vec<RecurringDefinition>> {
        let sql = format!(
            "SELECT {} FROM recurring_transactions WHERE user_id=?1 ORDER BY type, day_of_month, id",
            DEFINITION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], RawDefinition::from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?.into_definition()?);
        }
        Ok(out)
    }

    pub fn get_owned_recurring(&self, user_id: i64, id: i64) -> Result<RecurringDefinition> {
        let def = self.get_definition(id)?;
        if def.user_id != user_id {
            return Err(Error::Forbidden(format!("Recurring transaction {}", id)));
        }
        Ok(def)
    }

    pub fn update_recurring(
        &self,
        user_id: i64,
        id: i64,
        patch: &RecurringPatch,
    ) -> Result<RecurringDefinition> {
        self.get_owned_recurring(user_id, id)?;
        self.conn.execute(
            "UPDATE recurring_transactions SET
                type=COALESCE(?1, type),
                category=COALESCE(?2, category),
                amount=COALESCE(?3, amount),
                day_of_month=COALESCE(?4, day_of_month),
                notes=CASE WHEN ?5 THEN ?6 ELSE notes END,
                is_active=COALESCE(?7, is_active),
                updated_at=strftime('%Y-%m-%d %H:%M:%f', 'now')
             WHERE id=?8 AND user_id=?9",
            params![
                patch.kind.map(|k| k.as_str()),
                patch.category,
                patch.amount.map(|a| a.to_string()),
                patch.day_of_month,
                patch.notes.is_some(),
                patch.notes.clone().flatten(),
                patch.is_active,
                id,
                user_id
            ],
        )?;
        self.get_definition(id)
    }

    pub fn toggle_recurring(&self, user_id: i64, id: i64) -> Result<RecurringDefinition> {
        let def = self.get_owned_recurring(user_id, id)?;
        self.update_recurring(
            user_id,
            id,
            &RecurringPatch {
                is_active: Some(!def.is_active),
                ..Default::default()
            },
        )
    }

    /// Remove a definition. Ledger rows it produced stay untouched.
    pub fn delete_recurring(&self, user_id: i64, id: i64) -> Result<()> {
        self.get_owned_recurring(user_id, id)?;
        self.conn.execute(
            "DELETE FROM recurring_transactions WHERE id=?1 AND user_id=?2",
            params![id, user_id],
        )?;
        Ok(())
    }

    fn entries_of(&self, kind: EntryKind, user_id: i64) -> Result<Vec<LedgerEntry>> {
        let t = ledger_table(kind);
        let sql = format!(
            "SELECT id, user_id, {}, amount, {}, notes, created_at, seq FROM {} WHERE user_id=?1 ORDER BY seq",
            t.label, t.date, t.table
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], RawEntry::from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?.into_entry(kind)?);
        }
        Ok(out)
    }
}

impl DefinitionStore for SqliteStore<'_> {
    fn list_active_for_days(&self, days: RangeInclusive<u32>) -> Result<Vec<Candidate>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, category FROM recurring_transactions
             WHERE is_active=1 AND day_of_month BETWEEN ?1 AND ?2 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![*days.start(), *days.end()], |r| {
            Ok(Candidate {
                id: r.get(0)?,
                category: r.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn get_definition(&self, id: i64) -> Result<RecurringDefinition> {
        let sql = format!(
            "SELECT {} FROM recurring_transactions WHERE id=?1",
            DEFINITION_COLUMNS
        );
        self.conn
            .query_row(&sql, params![id], RawDefinition::from_row)
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("Recurring transaction {}", id)))?
            .into_definition()
    }

    fn update_last_executed(&mut self, id: i64, date: NaiveDate) -> Result<()> {
        let n = self.conn.execute(
            "UPDATE recurring_transactions SET last_executed_at=?1 WHERE id=?2",
            params![date, id],
        )?;
        if n == 0 {
            return Err(Error::NotFound(format!("Recurring transaction {}", id)));
        }
        Ok(())
    }
}

impl LedgerStore for SqliteStore<'_> {
    fn create_expense(
        &mut self,
        user_id: i64,
        category: &str,
        amount: Decimal,
        date: NaiveDate,
        notes: Option<&str>,
    ) -> Result<Expense> {
        let entry = self.insert_entry(&NewEntry {
            user_id,
            kind: EntryKind::Expense,
            label: category.to_string(),
            amount,
            date,
            notes: notes.map(str::to_string),
        })?;
        match entry {
            LedgerEntry::Expense(e) => Ok(e),
            LedgerEntry::Income(i) => Err(Error::CorruptData(format!(
                "expected expense, found income {}",
                i.id
            ))),
        }
    }

    fn create_income(
        &mut self,
        user_id: i64,
        source: &str,
        amount: Decimal,
        date: NaiveDate,
        notes: Option<&str>,
    ) -> Result<Income> {
        let entry = self.insert_entry(&NewEntry {
            user_id,
            kind: EntryKind::Income,
            label: source.to_string(),
            amount,
            date,
            notes: notes.map(str::to_string),
        })?;
        match entry {
            LedgerEntry::Income(i) => Ok(i),
            LedgerEntry::Expense(e) => Err(Error::CorruptData(format!(
                "expected income, found expense {}",
                e.id
            ))),
        }
    }

    fn list_all_expenses(&self, user_id: i64) -> Result<Vec<Expense>> {
        Ok(self
            .entries_of(EntryKind::Expense, user_id)?
            .into_iter()
            .filter_map(|e| match e {
                LedgerEntry::Expense(e) => Some(e),
                LedgerEntry::Income(_) => None,
            })
            .collect())
    }

    fn list_all_income(&self, user_id: i64) -> Result<Vec<Income>> {
        Ok(self
            .entries_of(EntryKind::Income, user_id)?
            .into_iter()
            .filter_map(|e| match e {
                LedgerEntry::Income(i) => Some(i),
                LedgerEntry::Expense(_) => None,
            })
            .collect())
    }
}

impl Atomic for SqliteStore<'_> {
    fn atomically<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        // BEGIN IMMEDIATE takes the write lock up front so a second process
        // running the same batch blocks before it can read stale state.
        let outermost = self.conn.is_autocommit();
        if outermost {
            self.conn.execute_batch("BEGIN IMMEDIATE")?;
        } else {
            self.conn.execute_batch("SAVEPOINT pocketbook_unit")?;
        }

        let result = f(&mut *self).and_then(|v| {
            if outermost {
                self.conn.execute_batch("COMMIT")?;
            } else {
                self.conn.execute_batch("RELEASE pocketbook_unit")?;
            }
            Ok(v)
        });

        if result.is_err() {
            let rollback = if outermost {
                "ROLLBACK"
            } else {
                "ROLLBACK TO pocketbook_unit; RELEASE pocketbook_unit"
            };
            if let Err(e) = self.conn.execute_batch(rollback) {
                tracing::error!("rollback failed: {e}");
            }
        }
        result
    }
}
