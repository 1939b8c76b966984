// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State error taxonomy.

use thiserror::Error;

use crate::model::StateId;
use crate::normalize::TemplateError;

/// Errors raised by the state model, store, normalizer, and manager.
#[derive(Debug, Error)]
pub enum StateError {
    /// Fatal at construction: missing bus client, empty data dir.
    #[error("invalid state manager config: {0}")]
    ConfigInvalid(String),

    #[error("state not found: {0}")]
    NotFound(StateId),

    /// The stored status is terminal; the write was refused without
    /// mutation.
    #[error("terminal state locked: {0}")]
    TerminalStateLocked(StateId),

    #[error("store error: {0}")]
    Store(#[from] sled::Error),

    #[error("state serialization failed: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("malformed state key: {0}")]
    BadKey(String),

    #[error("template engine not initialized")]
    EngineUninitialized,

    #[error("template parse failed in {field}: {source}")]
    TemplateParse {
        field: &'static str,
        #[source]
        source: TemplateError,
    },

    #[error(transparent)]
    Bus(#[from] compozy_bus::BusError),
}

impl From<sled::transaction::TransactionError<StateError>> for StateError {
    fn from(e: sled::transaction::TransactionError<StateError>) -> Self {
        match e {
            sled::transaction::TransactionError::Abort(inner) => inner,
            sled::transaction::TransactionError::Storage(e) => StateError::Store(e),
        }
    }
}
