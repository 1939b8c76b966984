// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status normalization table tests.

use super::*;
use yare::parameterized;

#[parameterized(
    workflow_unspecified = { "WORKFLOW_STATUS_UNSPECIFIED", Status::Pending },
    workflow_pending = { "WORKFLOW_STATUS_PENDING", Status::Pending },
    workflow_running = { "WORKFLOW_STATUS_RUNNING", Status::Running },
    workflow_success = { "WORKFLOW_STATUS_SUCCESS", Status::Success },
    workflow_failed = { "WORKFLOW_STATUS_FAILED", Status::Failed },
    workflow_waiting = { "WORKFLOW_STATUS_WAITING", Status::Waiting },
    workflow_paused = { "WORKFLOW_STATUS_PAUSED", Status::Paused },
    workflow_cancelled = { "WORKFLOW_STATUS_CANCELLED", Status::Cancelled },
    workflow_timed_out = { "WORKFLOW_STATUS_TIMED_OUT", Status::TimedOut },
    task_scheduled = { "TASK_STATUS_SCHEDULED", Status::Scheduled },
    task_retry_scheduled = { "TASK_STATUS_RETRY_SCHEDULED", Status::RetryScheduled },
    task_waiting = { "TASK_STATUS_WAITING", Status::Waiting },
    task_cancelled = { "TASK_STATUS_CANCELLED", Status::Cancelled },
    task_canceled_alias = { "TASK_STATUS_CANCELED", Status::Cancelled },
    agent_running = { "AGENT_STATUS_RUNNING", Status::Running },
    agent_success = { "AGENT_STATUS_SUCCESS", Status::Success },
    tool_failed = { "TOOL_STATUS_FAILED", Status::Failed },
    tool_timed_out = { "TOOL_STATUS_TIMED_OUT", Status::TimedOut },
)]
fn domain_tokens_normalize(token: &str, expected: Status) {
    assert_eq!(Status::from_domain(token), expected);
}

#[parameterized(
    empty = { "" },
    garbage = { "definitely-not-a-status" },
    bare_canonical = { "RUNNING" },
    unknown_suffix = { "TASK_STATUS_EXPLODED" },
)]
fn unknown_tokens_default_to_pending(token: &str) {
    assert_eq!(Status::from_domain(token), Status::Pending);
}

#[test]
fn terminal_set_is_exactly_four() {
    let terminal: Vec<Status> = [
        Status::Pending,
        Status::Scheduled,
        Status::Running,
        Status::Waiting,
        Status::RetryScheduled,
        Status::Success,
        Status::Failed,
        Status::TimedOut,
        Status::Cancelled,
        Status::Paused,
    ]
    .into_iter()
    .filter(Status::is_terminal)
    .collect();
    assert_eq!(
        terminal,
        vec![Status::Success, Status::Failed, Status::TimedOut, Status::Cancelled]
    );
}

#[test]
fn domain_token_roundtrips_through_from_domain() {
    use crate::component::ComponentKind;

    for status in [
        Status::Pending,
        Status::Running,
        Status::Success,
        Status::Failed,
        Status::Cancelled,
        Status::TimedOut,
    ] {
        for component in ComponentKind::STATEFUL {
            let token = status.domain_token(component);
            assert_eq!(Status::from_domain(&token), status, "token {token}");
        }
    }
    // Waiting is only part of the task and workflow vocabularies
    for component in [ComponentKind::Task, ComponentKind::Workflow] {
        let token = Status::Waiting.domain_token(component);
        assert_eq!(Status::from_domain(&token), Status::Waiting, "token {token}");
    }
    assert_eq!(Status::Scheduled.domain_token(ComponentKind::Task), "TASK_STATUS_SCHEDULED");
}

#[test]
fn display_matches_canonical_tokens() {
    assert_eq!(Status::RetryScheduled.to_string(), "RETRY_SCHEDULED");
    assert_eq!(Status::TimedOut.to_string(), "TIMED_OUT");
    assert_eq!(Status::default(), Status::Pending);
}

#[test]
fn serde_uses_screaming_snake_case() {
    let json = serde_json::to_string(&Status::RetryScheduled).expect("serialize");
    assert_eq!(json, "\"RETRY_SCHEDULED\"");
    let back: Status = serde_json::from_str("\"TIMED_OUT\"").expect("deserialize");
    assert_eq!(back, Status::TimedOut);
}
