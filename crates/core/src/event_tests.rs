// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event kind vocabulary tests.

use super::*;
use yare::parameterized;

const ALL: [EventKind; 11] = [
    EventKind::Dispatched,
    EventKind::Started,
    EventKind::Paused,
    EventKind::Resumed,
    EventKind::WaitingStarted,
    EventKind::WaitingEnded,
    EventKind::WaitingTimedOut,
    EventKind::Success,
    EventKind::Failed,
    EventKind::Cancelled,
    EventKind::TimedOut,
];

#[test]
fn parse_roundtrips_display_for_all_kinds() {
    for kind in ALL {
        assert_eq!(EventKind::parse(kind.as_str()).expect("known token"), kind);
    }
}

#[test]
fn parse_rejects_unknown_tokens() {
    let err = EventKind::parse("invalid").expect_err("unknown token");
    assert_eq!(err, UnknownEventKind("invalid".to_string()));
}

#[parameterized(
    workflow_started = { ComponentKind::Workflow, EventKind::Started, true },
    workflow_paused = { ComponentKind::Workflow, EventKind::Paused, true },
    workflow_timed_out = { ComponentKind::Workflow, EventKind::TimedOut, true },
    workflow_dispatched = { ComponentKind::Workflow, EventKind::Dispatched, false },
    workflow_waiting = { ComponentKind::Workflow, EventKind::WaitingStarted, false },
    task_dispatched = { ComponentKind::Task, EventKind::Dispatched, true },
    task_waiting_timed_out = { ComponentKind::Task, EventKind::WaitingTimedOut, true },
    task_paused = { ComponentKind::Task, EventKind::Paused, false },
    task_cancelled = { ComponentKind::Task, EventKind::Cancelled, false },
    agent_started = { ComponentKind::Agent, EventKind::Started, true },
    agent_failed = { ComponentKind::Agent, EventKind::Failed, true },
    agent_dispatched = { ComponentKind::Agent, EventKind::Dispatched, false },
    tool_success = { ComponentKind::Tool, EventKind::Success, true },
    tool_resumed = { ComponentKind::Tool, EventKind::Resumed, false },
    log_anything = { ComponentKind::Log, EventKind::Started, false },
)]
fn permitted_kinds_table(component: ComponentKind, kind: EventKind, supported: bool) {
    assert_eq!(kind.supported_by(component), supported);
    assert_eq!(kind.ensure_supported(component).is_ok(), supported);
}

#[test]
fn every_kind_implies_a_status() {
    for kind in ALL {
        assert!(kind.implied_status().is_some(), "{kind} implies no status");
    }
    assert_eq!(EventKind::Started.implied_status(), Some(Status::Running));
    assert_eq!(EventKind::WaitingStarted.implied_status(), Some(Status::Waiting));
}
