// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hierarchical subject codec.
//!
//! Stream subjects have the shape
//! `<prefix>.<correlation-id>.<component>.<segment>.<exec-id>.<verb>`.
//! Wildcards follow the bus convention: `*` matches one token, `>` the
//! remaining tail.

use compozy_core::{
    CommandKind, ComponentKind, CorrelationId, EventKind, ExecutionId, LogLevel,
    UnsupportedComponent,
};
use thiserror::Error;

/// Fixed first token of every subject. Binary contract with existing
/// publishers; never change it.
pub const PREFIX: &str = "compozy";

/// Errors raised while parsing a subject.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubjectError {
    #[error("invalid subject format: {0}")]
    TooFewTokens(String),

    #[error("invalid subject prefix: {0}, expected '{PREFIX}'")]
    InvalidPrefix(String),

    #[error("invalid segment type: {0}, expected '{1}'")]
    InvalidSegment(String, &'static str),

    #[error(transparent)]
    Component(#[from] UnsupportedComponent),
}

/// Subject segment separating commands, events, and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Cmds,
    Evts,
    Logs,
}

impl Segment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Cmds => "cmds",
            Segment::Evts => "evts",
            Segment::Logs => "logs",
        }
    }
}

compozy_core::simple_display! {
    Segment {
        Cmds => "cmds",
        Evts => "evts",
        Logs => "logs",
    }
}

/// Fields recovered from a stream subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSubject {
    pub component: ComponentKind,
    pub correlation_id: CorrelationId,
    pub exec_id: ExecutionId,
    pub verb: String,
}

impl ParsedSubject {
    /// Interpret the verb as an event kind.
    pub fn event_kind(&self) -> Result<EventKind, compozy_core::UnknownEventKind> {
        EventKind::parse(&self.verb)
    }

    /// Interpret the verb as a command kind.
    pub fn command_kind(&self) -> Result<CommandKind, compozy_core::UnknownCommandKind> {
        CommandKind::parse(&self.verb)
    }

    /// Interpret the verb as a log level (case-insensitive, unknown → info).
    pub fn log_level(&self) -> LogLevel {
        LogLevel::parse(&self.verb)
    }
}

/// Build a command subject:
/// `compozy.<corr>.<component>.cmds.<exec>.<kind>`.
pub fn command(
    component: ComponentKind,
    corr: &CorrelationId,
    exec: &ExecutionId,
    kind: CommandKind,
) -> String {
    format!("{PREFIX}.{corr}.{component}.cmds.{exec}.{kind}")
}

/// Build an event subject:
/// `compozy.<corr>.<component>.evts.<exec>.<kind>`.
pub fn event(
    component: ComponentKind,
    corr: &CorrelationId,
    exec: &ExecutionId,
    kind: EventKind,
) -> String {
    format!("{PREFIX}.{corr}.{component}.evts.{exec}.{kind}")
}

/// Build a per-correlation log subject:
/// `compozy.<corr>.<component>.logs.<exec>.<level>`.
pub fn log(
    component: ComponentKind,
    corr: &CorrelationId,
    exec: &ExecutionId,
    level: LogLevel,
) -> String {
    format!("{PREFIX}.{corr}.{component}.logs.{exec}.{level}")
}

/// Parse a stream subject, checking the prefix and the expected segment.
pub fn parse(subject: &str, expected: Segment) -> Result<ParsedSubject, SubjectError> {
    let tokens: Vec<&str> = subject.split('.').collect();
    if tokens.len() < 6 {
        return Err(SubjectError::TooFewTokens(subject.to_string()));
    }
    if tokens[0] != PREFIX {
        return Err(SubjectError::InvalidPrefix(tokens[0].to_string()));
    }
    if tokens[3] != expected.as_str() {
        return Err(SubjectError::InvalidSegment(tokens[3].to_string(), expected.as_str()));
    }
    let component = ComponentKind::parse(tokens[2])?;
    Ok(ParsedSubject {
        component,
        correlation_id: CorrelationId::from_string(tokens[1]),
        exec_id: ExecutionId::from_string(tokens[4]),
        verb: tokens[5].to_string(),
    })
}

/// Filter matching every command subject of a component:
/// `compozy.*.<component>.cmds.*.*`.
pub fn command_wildcard(component: ComponentKind) -> String {
    format!("{PREFIX}.*.{component}.cmds.*.*")
}

/// Filter matching one command kind of a component:
/// `compozy.*.<component>.cmds.*.<kind>`.
pub fn command_filter(component: ComponentKind, kind: CommandKind) -> String {
    format!("{PREFIX}.*.{component}.cmds.*.{kind}")
}

/// Filter matching every event subject of a component:
/// `compozy.*.<component>.evts.*.*`.
pub fn event_wildcard(component: ComponentKind) -> String {
    format!("{PREFIX}.*.{component}.evts.*.*")
}

/// Filter matching one event kind of a component:
/// `compozy.*.<component>.evts.*.<kind>`.
pub fn event_filter(component: ComponentKind, kind: EventKind) -> String {
    format!("{PREFIX}.*.{component}.evts.*.{kind}")
}

/// Tail filter over a component's events, used by the state manager:
/// `compozy.*.<component>.evts.>`.
pub fn event_tail(component: ComponentKind) -> String {
    format!("{PREFIX}.*.{component}.evts.>")
}

/// Durable log stream family: `compozy.logs.<component>.<exec>.<level>`.
///
/// Distinct from [`log`]: these subjects live under the `LOGS` stream
/// filter `compozy.logs.*.*.*`.
pub fn log_record(component: ComponentKind, exec: &ExecutionId, level: LogLevel) -> String {
    format!("{PREFIX}.logs.{component}.{exec}.{level}")
}

/// Filter matching one level of a component's durable logs:
/// `compozy.logs.<component>.*.<level>`.
pub fn log_filter(component: ComponentKind, level: LogLevel) -> String {
    format!("{PREFIX}.logs.{component}.*.{level}")
}

/// Request subject of the synchronous agent/tool protocol:
/// `compozy.<exec>.<component>.<id>.request`.
///
/// Request-reply subjects carry the execution ID in the second token; they
/// belong to a different family than stream subjects and never cross.
pub fn request(component: ComponentKind, exec: &ExecutionId, id: &str) -> String {
    format!("{PREFIX}.{exec}.{component}.{id}.request")
}

/// Response subject of the synchronous agent/tool protocol.
pub fn response(component: ComponentKind, exec: &ExecutionId, id: &str) -> String {
    format!("{PREFIX}.{exec}.{component}.{id}.response")
}

/// Per-execution log subject: `compozy.<exec>.log.<level>`.
pub fn exec_log(exec: &ExecutionId, level: LogLevel) -> String {
    format!("{PREFIX}.{exec}.log.{level}")
}

/// Wildcard over all levels of an execution's logs: `compozy.<exec>.log.*`.
pub fn exec_log_wildcard(exec: &ExecutionId) -> String {
    format!("{PREFIX}.{exec}.log.*")
}

#[cfg(test)]
#[path = "subject_tests.rs"]
mod tests;
