// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The recurring engine: turns due recurring definitions into ledger entries,
//! at most once per definition per calendar month.
//!
//! The engine never reads the clock. The caller passes `today`, which keeps a
//! run a pure function of the date, the definitions and the ledger state.

use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::Result;
use crate::models::{EntryKind, RecurringDefinition};
use crate::store::{Atomic, DefinitionStore, LedgerStore};
use crate::utils::days_in_month;

/// Appended to the definition's notes on every materialized entry.
pub const AUTO_GENERATED_MARKER: &str = "(Auto-generated)";

/// Days of month that are due on `today`.
///
/// Normally just `today.day()`. On the last day of a month shorter than 31
/// days the range extends to 31, so a definition set for the 31st (or the
/// 29th/30th in February) fires on the month's final day instead of being
/// skipped.
pub fn due_days(today: NaiveDate) -> RangeInclusive<u32> {
    let day = today.day();
    if day == days_in_month(today.year(), today.month()) {
        day..=31
    } else {
        day..=day
    }
}

/// True when `last_executed_at` falls in the same calendar month as `today`.
pub fn executed_this_month(last_executed_at: Option<NaiveDate>, today: NaiveDate) -> bool {
    last_executed_at.is_some_and(|d| d.year() == today.year() && d.month() == today.month())
}

/// Notes carried by an entry materialized from a definition.
pub fn materialized_notes(notes: Option<&str>) -> String {
    match notes.map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) => format!("{} {}", n, AUTO_GENERATED_MARKER),
        None => AUTO_GENERATED_MARKER.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "date", rename_all = "snake_case")]
pub enum SkipReason {
    /// Already materialized on the given date this month.
    AlreadyExecuted(NaiveDate),
    /// Deactivated after the candidate list was read.
    Inactive,
    /// Day of month changed after the candidate list was read.
    NotDue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Materialize,
    Skip(SkipReason),
}

/// Whether `def` should produce an entry on `today`.
pub fn decide(def: &RecurringDefinition, today: NaiveDate) -> Decision {
    if !def.is_active {
        return Decision::Skip(SkipReason::Inactive);
    }
    if !due_days(today).contains(&def.day_of_month) {
        return Decision::Skip(SkipReason::NotDue);
    }
    match def.last_executed_at {
        Some(last) if executed_this_month(Some(last), today) => {
            Decision::Skip(SkipReason::AlreadyExecuted(last))
        }
        _ => Decision::Materialize,
    }
}

/// What happened to a single candidate definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Created {
        definition_id: i64,
        user_id: i64,
        kind: EntryKind,
        category: String,
        amount: Decimal,
        entry_id: i64,
    },
    Skipped {
        definition_id: i64,
        category: String,
        reason: SkipReason,
    },
    Failed {
        definition_id: i64,
        category: String,
        error: String,
    },
}

impl Outcome {
    pub fn definition_id(&self) -> i64 {
        match self {
            Outcome::Created { definition_id, .. }
            | Outcome::Skipped { definition_id, .. }
            | Outcome::Failed { definition_id, .. } => *definition_id,
        }
    }
}

/// Result of one engine run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub date: NaiveDate,
    pub outcomes: Vec<Outcome>,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Created { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// Materialize every definition due on `today`.
///
/// Only the initial candidate read can fail the run. Each definition is then
/// processed in its own atomic unit: the definition is re-read and decoded,
/// checked, the entry created and `last_executed_at` stamped, or nothing is
/// written at all. A failing definition, including one whose row no longer
/// decodes, is reported as [Outcome::Failed] and the run moves on.
pub fn run<S>(store: &mut S, today: NaiveDate) -> Result<RunSummary>
where
    S: DefinitionStore + LedgerStore + Atomic,
{
    tracing::info!("Processing recurring transactions for {today} (day {})", today.day());

    let candidates = store.list_active_for_days(due_days(today))?;
    let mut outcomes = Vec::with_capacity(candidates.len());

    for candidate in &candidates {
        let outcome = match process_one(store, candidate.id, today) {
            Ok(o) => o,
            Err(e) => {
                tracing::error!(
                    "Failed: {} (definition {}): {e}",
                    candidate.category,
                    candidate.id
                );
                Outcome::Failed {
                    definition_id: candidate.id,
                    category: candidate.category.clone(),
                    error: e.to_string(),
                }
            }
        };
        outcomes.push(outcome);
    }

    let summary = RunSummary {
        date: today,
        outcomes,
    };
    tracing::info!(
        processed = summary.processed(),
        skipped = summary.skipped(),
        failed = summary.failed(),
        "Recurring run finished"
    );
    Ok(summary)
}

fn process_one<S>(store: &mut S, definition_id: i64, today: NaiveDate) -> Result<Outcome>
where
    S: DefinitionStore + LedgerStore + Atomic,
{
    store.atomically(|s| {
        // Re-read under the unit's lock; a concurrent run may have stamped it.
        let def = s.get_definition(definition_id)?;

        if let Decision::Skip(reason) = decide(&def, today) {
            tracing::warn!("Skipped: {} ({:?})", def.category, reason);
            return Ok(Outcome::Skipped {
                definition_id: def.id,
                category: def.category,
                reason,
            });
        }

        let note_text = materialized_notes(def.notes.as_deref());
        let notes = Some(note_text.as_str());
        let entry_id = match def.kind {
            EntryKind::Expense => {
                s.create_expense(def.user_id, &def.category, def.amount, today, notes)?
                    .id
            }
            EntryKind::Income => {
                s.create_income(def.user_id, &def.category, def.amount, today, notes)?
                    .id
            }
        };
        s.update_last_executed(def.id, today)?;

        tracing::info!("Created {}: {} - {}", def.kind, def.category, def.amount);
        Ok(Outcome::Created {
            definition_id: def.id,
            user_id: def.user_id,
            kind: def.kind,
            category: def.category,
            amount: def.amount,
            entry_id,
        })
    })
}
