// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative catalog of durable streams.
//!
//! Names, subject filters, and retention are a contract with existing
//! publishers; creation is idempotent.

use std::time::Duration;

use async_nats::jetstream::{self, stream};
use compozy_core::ComponentKind;
use compozy_wire::subject;

use crate::error::BusError;

pub const WORKFLOW_COMMANDS_STREAM: &str = "WORKFLOW_COMMANDS";
pub const TASK_COMMANDS_STREAM: &str = "TASK_COMMANDS";
pub const AGENT_COMMANDS_STREAM: &str = "AGENT_COMMANDS";
pub const TOOL_COMMANDS_STREAM: &str = "TOOL_COMMANDS";
pub const EVENTS_STREAM: &str = "EVENTS";
pub const LOGS_STREAM: &str = "LOGS";

const HOUR: Duration = Duration::from_secs(60 * 60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// One durable stream definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDef {
    pub name: &'static str,
    pub subjects: Vec<String>,
    pub max_age: Duration,
}

impl StreamDef {
    fn command(name: &'static str, component: ComponentKind, max_age: Duration) -> Self {
        Self { name, subjects: vec![subject::command_wildcard(component)], max_age }
    }

    fn to_config(&self) -> stream::Config {
        stream::Config {
            name: self.name.to_string(),
            subjects: self.subjects.clone(),
            max_age: self.max_age,
            storage: stream::StorageType::File,
            retention: stream::RetentionPolicy::Limits,
            discard: stream::DiscardPolicy::Old,
            ..Default::default()
        }
    }
}

/// Every stream the core depends on.
pub fn catalog() -> Vec<StreamDef> {
    vec![
        StreamDef::command(WORKFLOW_COMMANDS_STREAM, ComponentKind::Workflow, 24 * HOUR),
        StreamDef::command(TASK_COMMANDS_STREAM, ComponentKind::Task, 12 * HOUR),
        StreamDef::command(AGENT_COMMANDS_STREAM, ComponentKind::Agent, 12 * HOUR),
        StreamDef::command(TOOL_COMMANDS_STREAM, ComponentKind::Tool, 12 * HOUR),
        StreamDef {
            name: EVENTS_STREAM,
            subjects: ComponentKind::STATEFUL.iter().map(|c| subject::event_wildcard(*c)).collect(),
            max_age: 7 * DAY,
        },
        StreamDef {
            name: LOGS_STREAM,
            subjects: vec![format!("{}.logs.*.*.*", subject::PREFIX)],
            max_age: 3 * DAY,
        },
    ]
}

/// Name of the command stream for one component class.
pub fn command_stream(component: ComponentKind) -> Result<&'static str, BusError> {
    match component {
        ComponentKind::Workflow => Ok(WORKFLOW_COMMANDS_STREAM),
        ComponentKind::Task => Ok(TASK_COMMANDS_STREAM),
        ComponentKind::Agent => Ok(AGENT_COMMANDS_STREAM),
        ComponentKind::Tool => Ok(TOOL_COMMANDS_STREAM),
        ComponentKind::Log => Err(BusError::Unsupported(component)),
    }
}

/// Create a stream if absent; a pre-existing stream with identical config
/// is success.
pub async fn ensure_stream(
    js: &jetstream::Context,
    def: &StreamDef,
) -> Result<(), BusError> {
    js.get_or_create_stream(def.to_config())
        .await
        .map_err(|e| BusError::StreamSetup(format!("{}: {e}", def.name)))?;
    Ok(())
}

#[cfg(test)]
#[path = "streams_tests.rs"]
mod tests;
