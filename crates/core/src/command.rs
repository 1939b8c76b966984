// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command kinds published to the per-component command streams.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error for a command verb outside the known set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown command kind: {0}")]
pub struct UnknownCommandKind(pub String);

/// Verb of a command subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Trigger,
    Dispatch,
    Execute,
    Cancel,
    Pause,
    Resume,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Trigger => "trigger",
            CommandKind::Dispatch => "dispatch",
            CommandKind::Execute => "execute",
            CommandKind::Cancel => "cancel",
            CommandKind::Pause => "pause",
            CommandKind::Resume => "resume",
        }
    }

    /// Parse a subject verb token into a command kind.
    pub fn parse(token: &str) -> Result<Self, UnknownCommandKind> {
        match token {
            "trigger" => Ok(CommandKind::Trigger),
            "dispatch" => Ok(CommandKind::Dispatch),
            "execute" => Ok(CommandKind::Execute),
            "cancel" => Ok(CommandKind::Cancel),
            "pause" => Ok(CommandKind::Pause),
            "resume" => Ok(CommandKind::Resume),
            other => Err(UnknownCommandKind(other.to_string())),
        }
    }
}

crate::simple_display! {
    CommandKind {
        Trigger => "trigger",
        Dispatch => "dispatch",
        Execute => "execute",
        Cancel => "cancel",
        Pause => "pause",
        Resume => "resume",
    }
}
