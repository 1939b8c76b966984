// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Binary command and event envelopes.
//!
//! Hand-written `prost` messages — the wire format is standard protobuf
//! (varint-tagged, length-delimited fields) without a protoc build step.
//! Free-form payload maps are carried as canonical JSON bytes, so every
//! `serde_json::Value` round-trips exactly (integers stay integers).

use std::time::{SystemTime, UNIX_EPOCH};

use compozy_core::{
    CommandKind, ComponentId, ComponentKind, CorrelationId, EventKind, ExecutionId,
};
use prost::Message;
use serde_json::{Map, Value};

use crate::subject;
use crate::WireError;

/// Milliseconds since the unix epoch, saturating at 0 for a clock set
/// before 1970.
fn now_unix_ms() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_millis() as i64)
}

/// Encode a payload map as canonical JSON bytes.
fn encode_json_map(map: &Map<String, Value>) -> Vec<u8> {
    // Serializing a JSON object map cannot fail.
    serde_json::to_vec(map).unwrap_or_default()
}

/// Decode canonical JSON bytes back into a payload map. Undecodable or
/// non-object payloads read as absent.
fn decode_json_map(bytes: &[u8]) -> Option<Map<String, Value>> {
    serde_json::from_slice(bytes).ok()
}

/// Wire enumeration of component classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Component {
    Unspecified = 0,
    Workflow = 1,
    Task = 2,
    Agent = 3,
    Tool = 4,
    Log = 5,
}

impl Component {
    pub fn from_kind(kind: ComponentKind) -> Self {
        match kind {
            ComponentKind::Workflow => Component::Workflow,
            ComponentKind::Task => Component::Task,
            ComponentKind::Agent => Component::Agent,
            ComponentKind::Tool => Component::Tool,
            ComponentKind::Log => Component::Log,
        }
    }

    pub fn to_kind(self) -> Option<ComponentKind> {
        match self {
            Component::Unspecified => None,
            Component::Workflow => Some(ComponentKind::Workflow),
            Component::Task => Some(ComponentKind::Task),
            Component::Agent => Some(ComponentKind::Agent),
            Component::Tool => Some(ComponentKind::Tool),
            Component::Log => Some(ComponentKind::Log),
        }
    }
}

/// Wire enumeration of command verbs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum CommandVerb {
    Unspecified = 0,
    Trigger = 1,
    Dispatch = 2,
    Execute = 3,
    Cancel = 4,
    Pause = 5,
    Resume = 6,
}

impl CommandVerb {
    pub fn from_kind(kind: CommandKind) -> Self {
        match kind {
            CommandKind::Trigger => CommandVerb::Trigger,
            CommandKind::Dispatch => CommandVerb::Dispatch,
            CommandKind::Execute => CommandVerb::Execute,
            CommandKind::Cancel => CommandVerb::Cancel,
            CommandKind::Pause => CommandVerb::Pause,
            CommandKind::Resume => CommandVerb::Resume,
        }
    }

    pub fn to_kind(self) -> Option<CommandKind> {
        match self {
            CommandVerb::Unspecified => None,
            CommandVerb::Trigger => Some(CommandKind::Trigger),
            CommandVerb::Dispatch => Some(CommandKind::Dispatch),
            CommandVerb::Execute => Some(CommandKind::Execute),
            CommandVerb::Cancel => Some(CommandKind::Cancel),
            CommandVerb::Pause => Some(CommandKind::Pause),
            CommandVerb::Resume => Some(CommandKind::Resume),
        }
    }
}

/// Wire enumeration of event verbs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum EventVerb {
    Unspecified = 0,
    Dispatched = 1,
    Started = 2,
    Paused = 3,
    Resumed = 4,
    WaitingStarted = 5,
    WaitingEnded = 6,
    WaitingTimedOut = 7,
    Success = 8,
    Failed = 9,
    Cancelled = 10,
    TimedOut = 11,
}

impl EventVerb {
    pub fn from_kind(kind: EventKind) -> Self {
        match kind {
            EventKind::Dispatched => EventVerb::Dispatched,
            EventKind::Started => EventVerb::Started,
            EventKind::Paused => EventVerb::Paused,
            EventKind::Resumed => EventVerb::Resumed,
            EventKind::WaitingStarted => EventVerb::WaitingStarted,
            EventKind::WaitingEnded => EventVerb::WaitingEnded,
            EventKind::WaitingTimedOut => EventVerb::WaitingTimedOut,
            EventKind::Success => EventVerb::Success,
            EventKind::Failed => EventVerb::Failed,
            EventKind::Cancelled => EventVerb::Cancelled,
            EventKind::TimedOut => EventVerb::TimedOut,
        }
    }

    pub fn to_kind(self) -> Option<EventKind> {
        match self {
            EventVerb::Unspecified => None,
            EventVerb::Dispatched => Some(EventKind::Dispatched),
            EventVerb::Started => Some(EventKind::Started),
            EventVerb::Paused => Some(EventKind::Paused),
            EventVerb::Resumed => Some(EventKind::Resumed),
            EventVerb::WaitingStarted => Some(EventKind::WaitingStarted),
            EventVerb::WaitingEnded => Some(EventKind::WaitingEnded),
            EventVerb::WaitingTimedOut => Some(EventKind::WaitingTimedOut),
            EventVerb::Success => Some(EventKind::Success),
            EventVerb::Failed => Some(EventKind::Failed),
            EventVerb::Cancelled => Some(EventKind::Cancelled),
            EventVerb::TimedOut => Some(EventKind::TimedOut),
        }
    }
}

/// Envelope metadata shared by commands and events.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Metadata {
    #[prost(string, tag = "1")]
    pub source: String,
    #[prost(string, tag = "2")]
    pub correlation_id: String,
    #[prost(int64, tag = "3")]
    pub time_unix_ms: i64,
    #[prost(string, tag = "4")]
    pub subject: String,
}

/// Component identity inside an envelope: stable config id plus the
/// execution instance id.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ComponentRef {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub exec_id: String,
}

/// Structured failure carried by terminal-failure events. `details`
/// holds an optional JSON-encoded object map.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ErrorDetail {
    #[prost(string, tag = "1")]
    pub message: String,
    #[prost(string, tag = "2")]
    pub code: String,
    #[prost(bytes = "vec", optional, tag = "3")]
    pub details: Option<Vec<u8>>,
}

/// Event payload: terminal-success output, terminal-failure error, and
/// free-form context. Status-only events carry none of these. `output`
/// and `context` hold JSON-encoded object maps.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EventPayload {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub output: Option<Vec<u8>>,
    #[prost(message, optional, tag = "2")]
    pub error: Option<ErrorDetail>,
    #[prost(bytes = "vec", optional, tag = "3")]
    pub context: Option<Vec<u8>>,
}

/// A command published to a per-component command stream. `payload`
/// holds a JSON-encoded object map.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CommandEnvelope {
    #[prost(message, optional, tag = "1")]
    pub metadata: Option<Metadata>,
    #[prost(enumeration = "Component", tag = "2")]
    pub component: i32,
    #[prost(message, optional, tag = "3")]
    pub target: Option<ComponentRef>,
    #[prost(enumeration = "CommandVerb", tag = "4")]
    pub kind: i32,
    #[prost(bytes = "vec", optional, tag = "5")]
    pub payload: Option<Vec<u8>>,
}

impl CommandEnvelope {
    /// Build a command addressed to one component execution. The subject
    /// is derived and recorded in the metadata.
    pub fn new(
        component: ComponentKind,
        kind: CommandKind,
        component_id: &ComponentId,
        exec_id: &ExecutionId,
        correlation_id: &CorrelationId,
        source: impl Into<String>,
    ) -> Self {
        let subject = subject::command(component, correlation_id, exec_id, kind);
        Self {
            metadata: Some(Metadata {
                source: source.into(),
                correlation_id: correlation_id.to_string(),
                time_unix_ms: now_unix_ms(),
                subject,
            }),
            component: Component::from_kind(component) as i32,
            target: Some(ComponentRef {
                id: component_id.to_string(),
                exec_id: exec_id.to_string(),
            }),
            kind: CommandVerb::from_kind(kind) as i32,
            payload: None,
        }
    }

    /// Attach a free-form payload map.
    #[must_use]
    pub fn with_payload(mut self, payload: &Map<String, Value>) -> Self {
        self.payload = Some(encode_json_map(payload));
        self
    }

    /// Decoded payload map, if the command carries one.
    pub fn payload_map(&self) -> Option<Map<String, Value>> {
        self.payload.as_deref().and_then(decode_json_map)
    }

    pub fn component_kind(&self) -> Option<ComponentKind> {
        Component::try_from(self.component).ok().and_then(Component::to_kind)
    }

    pub fn command_kind(&self) -> Option<CommandKind> {
        CommandVerb::try_from(self.kind).ok().and_then(CommandVerb::to_kind)
    }

    /// Subject this command routes to, from the metadata.
    pub fn subject(&self) -> Result<&str, WireError> {
        match &self.metadata {
            Some(m) if !m.subject.is_empty() => Ok(&m.subject),
            _ => Err(WireError::MissingField("command subject")),
        }
    }

    pub fn encode_vec(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    pub fn decode_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        Ok(Self::decode(bytes)?)
    }
}

/// An event published to the unified events stream.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EventEnvelope {
    #[prost(message, optional, tag = "1")]
    pub metadata: Option<Metadata>,
    #[prost(enumeration = "Component", tag = "2")]
    pub component: i32,
    #[prost(message, optional, tag = "3")]
    pub source: Option<ComponentRef>,
    #[prost(enumeration = "EventVerb", tag = "4")]
    pub kind: i32,
    /// Domain status token, e.g. `TASK_STATUS_RUNNING`.
    #[prost(string, tag = "5")]
    pub status: String,
    #[prost(message, optional, tag = "6")]
    pub payload: Option<EventPayload>,
}

impl EventEnvelope {
    /// Build an event for one component execution. The domain status token
    /// implied by the event kind is recorded, and the subject is derived
    /// into the metadata. Rejects kinds the component class does not emit.
    pub fn new(
        component: ComponentKind,
        kind: EventKind,
        component_id: &ComponentId,
        exec_id: &ExecutionId,
        correlation_id: &CorrelationId,
        source: impl Into<String>,
    ) -> Result<Self, compozy_core::UnsupportedEventKind> {
        kind.ensure_supported(component)?;
        let subject = subject::event(component, correlation_id, exec_id, kind);
        let status = kind
            .implied_status()
            .map(|s| s.domain_token(component))
            .unwrap_or_default();
        Ok(Self {
            metadata: Some(Metadata {
                source: source.into(),
                correlation_id: correlation_id.to_string(),
                time_unix_ms: now_unix_ms(),
                subject,
            }),
            component: Component::from_kind(component) as i32,
            source: Some(ComponentRef {
                id: component_id.to_string(),
                exec_id: exec_id.to_string(),
            }),
            kind: EventVerb::from_kind(kind) as i32,
            status,
            payload: None,
        })
    }

    /// Attach a terminal-success output map.
    #[must_use]
    pub fn with_output(mut self, output: &Map<String, Value>) -> Self {
        self.payload.get_or_insert_with(EventPayload::default).output =
            Some(encode_json_map(output));
        self
    }

    /// Attach a terminal-failure error.
    #[must_use]
    pub fn with_error(mut self, message: impl Into<String>, code: impl Into<String>) -> Self {
        self.payload.get_or_insert_with(EventPayload::default).error = Some(ErrorDetail {
            message: message.into(),
            code: code.into(),
            details: None,
        });
        self
    }

    /// Attach a free-form context map.
    #[must_use]
    pub fn with_context(mut self, context: &Map<String, Value>) -> Self {
        self.payload.get_or_insert_with(EventPayload::default).context =
            Some(encode_json_map(context));
        self
    }

    pub fn component_kind(&self) -> Option<ComponentKind> {
        Component::try_from(self.component).ok().and_then(Component::to_kind)
    }

    pub fn event_kind(&self) -> Option<EventKind> {
        EventVerb::try_from(self.kind).ok().and_then(EventVerb::to_kind)
    }

    /// Subject this event routes to, from the metadata.
    pub fn subject(&self) -> Result<&str, WireError> {
        match &self.metadata {
            Some(m) if !m.subject.is_empty() => Ok(&m.subject),
            _ => Err(WireError::MissingField("event subject")),
        }
    }

    pub fn encode_vec(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    pub fn decode_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        Ok(Self::decode(bytes)?)
    }
}

/// Result carried by a terminal event: output on success, error on failure.
#[derive(Debug, Clone, PartialEq)]
pub enum EventResult<'a> {
    Output(Map<String, Value>),
    Error(&'a ErrorDetail),
}

/// Capability view the reducer queries on each event payload.
///
/// Payloads expose only what they carry; an event without a capability
/// simply skips that reducer step.
pub trait EventCapabilities {
    /// Domain status token, if the event carries one.
    fn status_token(&self) -> Option<&str>;

    /// Terminal result, if the event carries one. Error wins when a
    /// malformed payload carries both.
    fn result(&self) -> Option<EventResult<'_>>;

    /// Free-form context map, if the event carries one.
    fn context(&self) -> Option<Map<String, Value>>;
}

impl EventCapabilities for EventEnvelope {
    fn status_token(&self) -> Option<&str> {
        if self.status.is_empty() {
            None
        } else {
            Some(&self.status)
        }
    }

    fn result(&self) -> Option<EventResult<'_>> {
        let payload = self.payload.as_ref()?;
        if let Some(error) = &payload.error {
            return Some(EventResult::Error(error));
        }
        payload.output.as_deref().and_then(decode_json_map).map(EventResult::Output)
    }

    fn context(&self) -> Option<Map<String, Value>> {
        self.payload.as_ref()?.context.as_deref().and_then(decode_json_map)
    }
}

#[cfg(test)]
#[path = "proto_tests.rs"]
mod tests;
