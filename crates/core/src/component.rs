// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Component kinds addressed on the bus.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error for a component token outside the known set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported component: {0}")]
pub struct UnsupportedComponent(pub String);

/// Class of component a subject, command, event, or state refers to.
///
/// `Log` is valid only on the log stream and never has state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Workflow,
    Task,
    Agent,
    Tool,
    Log,
}

impl ComponentKind {
    /// The four stateful component kinds, in parent-first order.
    pub const STATEFUL: [ComponentKind; 4] =
        [ComponentKind::Workflow, ComponentKind::Task, ComponentKind::Agent, ComponentKind::Tool];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Workflow => "workflow",
            ComponentKind::Task => "task",
            ComponentKind::Agent => "agent",
            ComponentKind::Tool => "tool",
            ComponentKind::Log => "log",
        }
    }

    /// Parse a subject token into a component kind.
    pub fn parse(token: &str) -> Result<Self, UnsupportedComponent> {
        match token {
            "workflow" => Ok(ComponentKind::Workflow),
            "task" => Ok(ComponentKind::Task),
            "agent" => Ok(ComponentKind::Agent),
            "tool" => Ok(ComponentKind::Tool),
            "log" => Ok(ComponentKind::Log),
            other => Err(UnsupportedComponent(other.to_string())),
        }
    }

    /// Key prefix used by the state store for this kind.
    ///
    /// `tl:` keeps tool keys disjoint from task keys under prefix scans.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            ComponentKind::Workflow => "w:",
            ComponentKind::Task => "t:",
            ComponentKind::Agent => "a:",
            ComponentKind::Tool => "tl:",
            ComponentKind::Log => "l:",
        }
    }
}

crate::simple_display! {
    ComponentKind {
        Workflow => "workflow",
        Task => "task",
        Agent => "agent",
        Tool => "tool",
        Log => "log",
    }
}

#[cfg(test)]
#[path = "component_tests.rs"]
mod tests;
