// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event kinds published to the unified events stream.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::component::ComponentKind;
use crate::status::Status;

/// Error for an event kind that the component class does not emit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("event kind {kind} not supported for component {component}")]
pub struct UnsupportedEventKind {
    pub component: ComponentKind,
    pub kind: EventKind,
}

/// Error for an event verb outside the known set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event kind: {0}")]
pub struct UnknownEventKind(pub String);

/// Verb of an event subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Dispatched,
    Started,
    Paused,
    Resumed,
    WaitingStarted,
    WaitingEnded,
    WaitingTimedOut,
    Success,
    Failed,
    Cancelled,
    TimedOut,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Dispatched => "dispatched",
            EventKind::Started => "started",
            EventKind::Paused => "paused",
            EventKind::Resumed => "resumed",
            EventKind::WaitingStarted => "waiting_started",
            EventKind::WaitingEnded => "waiting_ended",
            EventKind::WaitingTimedOut => "waiting_timed_out",
            EventKind::Success => "success",
            EventKind::Failed => "failed",
            EventKind::Cancelled => "cancelled",
            EventKind::TimedOut => "timed_out",
        }
    }

    /// Parse a subject verb token into an event kind.
    pub fn parse(token: &str) -> Result<Self, UnknownEventKind> {
        match token {
            "dispatched" => Ok(EventKind::Dispatched),
            "started" => Ok(EventKind::Started),
            "paused" => Ok(EventKind::Paused),
            "resumed" => Ok(EventKind::Resumed),
            "waiting_started" => Ok(EventKind::WaitingStarted),
            "waiting_ended" => Ok(EventKind::WaitingEnded),
            "waiting_timed_out" => Ok(EventKind::WaitingTimedOut),
            "success" => Ok(EventKind::Success),
            "failed" => Ok(EventKind::Failed),
            "cancelled" => Ok(EventKind::Cancelled),
            "timed_out" => Ok(EventKind::TimedOut),
            other => Err(UnknownEventKind(other.to_string())),
        }
    }

    /// Whether this component class emits this event kind.
    pub fn supported_by(&self, component: ComponentKind) -> bool {
        use EventKind::*;
        match component {
            ComponentKind::Workflow => {
                matches!(self, Started | Paused | Resumed | Success | Failed | Cancelled | TimedOut)
            }
            ComponentKind::Task => matches!(
                self,
                Dispatched
                    | Started
                    | WaitingStarted
                    | WaitingEnded
                    | WaitingTimedOut
                    | Success
                    | Failed
            ),
            ComponentKind::Agent | ComponentKind::Tool => {
                matches!(self, Started | Success | Failed)
            }
            ComponentKind::Log => false,
        }
    }

    /// Validate this kind against a component class.
    pub fn ensure_supported(&self, component: ComponentKind) -> Result<(), UnsupportedEventKind> {
        if self.supported_by(component) {
            Ok(())
        } else {
            Err(UnsupportedEventKind { component, kind: *self })
        }
    }

    /// Canonical status implied by the event kind alone, for status-only
    /// events whose payload carries no domain status token.
    pub fn implied_status(&self) -> Option<Status> {
        match self {
            EventKind::Dispatched => Some(Status::Scheduled),
            EventKind::Started => Some(Status::Running),
            EventKind::Paused => Some(Status::Paused),
            EventKind::Resumed => Some(Status::Running),
            EventKind::WaitingStarted => Some(Status::Waiting),
            EventKind::WaitingEnded => Some(Status::Running),
            EventKind::WaitingTimedOut => Some(Status::TimedOut),
            EventKind::Success => Some(Status::Success),
            EventKind::Failed => Some(Status::Failed),
            EventKind::Cancelled => Some(Status::Cancelled),
            EventKind::TimedOut => Some(Status::TimedOut),
        }
    }
}

crate::simple_display! {
    EventKind {
        Dispatched => "dispatched",
        Started => "started",
        Paused => "paused",
        Resumed => "resumed",
        WaitingStarted => "waiting_started",
        WaitingEnded => "waiting_ended",
        WaitingTimedOut => "waiting_timed_out",
        Success => "success",
        Failed => "failed",
        Cancelled => "cancelled",
        TimedOut => "timed_out",
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
