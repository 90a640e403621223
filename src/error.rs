// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Library level error type shared by the stores, the recurring engine and
//! the history aggregator.

/// The errors that may occur below the command layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A read or write against the SQLite database failed.
    #[error("database error: {0}")]
    Persistence(#[from] rusqlite::Error),

    /// User supplied data was rejected before reaching the database.
    #[error("{0}")]
    Validation(String),

    /// The requested row does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The row exists but belongs to a different owner.
    #[error("{0} belongs to another user")]
    Forbidden(String),

    /// A stored value could not be decoded, e.g. an amount that is not a
    /// decimal or a transaction type outside `expense`/`income`.
    #[error("corrupt data: {0}")]
    CorruptData(String),
}

pub type Result<T> = std::result::Result<T, Error>;
