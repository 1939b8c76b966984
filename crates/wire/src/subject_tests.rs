// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subject codec tests: builders, parse errors, and round-trips.

use super::*;
use compozy_core::{CommandKind, ComponentKind, CorrelationId, EventKind, ExecutionId, LogLevel};
use proptest::prelude::*;

fn corr(s: &str) -> CorrelationId {
    CorrelationId::from_string(s)
}

fn exec(s: &str) -> ExecutionId {
    ExecutionId::from_string(s)
}

#[test]
fn builds_command_subject() {
    let subject =
        command(ComponentKind::Workflow, &corr("corr123"), &exec("wf456"), CommandKind::Execute);
    assert_eq!(subject, "compozy.corr123.workflow.cmds.wf456.execute");
}

#[test]
fn builds_event_subject() {
    let subject =
        event(ComponentKind::Task, &corr("corr123"), &exec("task456"), EventKind::Started);
    assert_eq!(subject, "compozy.corr123.task.evts.task456.started");
}

#[test]
fn builds_log_subject() {
    let subject = log(ComponentKind::Agent, &corr("c1"), &exec("e1"), LogLevel::Warn);
    assert_eq!(subject, "compozy.c1.agent.logs.e1.warn");
}

#[test]
fn parses_valid_command_subject() {
    let parsed =
        parse("compozy.corr123.workflow.cmds.wf456.execute", Segment::Cmds).expect("valid subject");
    assert_eq!(parsed.component, ComponentKind::Workflow);
    assert_eq!(parsed.correlation_id, "corr123");
    assert_eq!(parsed.exec_id, "wf456");
    assert_eq!(parsed.verb, "execute");
    assert_eq!(parsed.command_kind().expect("verb"), CommandKind::Execute);
}

#[test]
fn rejects_wrong_segment() {
    let err = parse("compozy.corr123.task.invalid.task456.started", Segment::Evts)
        .expect_err("segment mismatch");
    assert_eq!(err.to_string(), "invalid segment type: invalid, expected 'evts'");
}

#[test]
fn rejects_segment_from_other_family() {
    let err = parse("compozy.corr123.task.cmds.task456.execute", Segment::Evts)
        .expect_err("cmds is not evts");
    assert_eq!(err, SubjectError::InvalidSegment("cmds".to_string(), "evts"));
}

#[test]
fn rejects_wrong_prefix() {
    let err =
        parse("acme.corr123.task.evts.task456.started", Segment::Evts).expect_err("bad prefix");
    assert_eq!(err, SubjectError::InvalidPrefix("acme".to_string()));
}

#[test]
fn rejects_short_subjects() {
    let err = parse("compozy.corr123.task.evts.task456", Segment::Evts).expect_err("five tokens");
    assert!(matches!(err, SubjectError::TooFewTokens(_)));
}

#[test]
fn rejects_unknown_component() {
    let err = parse("compozy.corr123.queue.evts.q1.started", Segment::Evts)
        .expect_err("unknown component");
    assert!(matches!(err, SubjectError::Component(_)));
}

#[test]
fn log_levels_parse_case_insensitively() {
    let parsed = parse("compozy.c1.agent.logs.e1.ERROR", Segment::Logs).expect("valid subject");
    assert_eq!(parsed.log_level(), LogLevel::Error);

    let parsed = parse("compozy.c1.agent.logs.e1.whatever", Segment::Logs).expect("valid subject");
    assert_eq!(parsed.log_level(), LogLevel::Info);
}

#[test]
fn wildcard_filters_match_catalog_shapes() {
    assert_eq!(command_wildcard(ComponentKind::Workflow), "compozy.*.workflow.cmds.*.*");
    assert_eq!(event_wildcard(ComponentKind::Tool), "compozy.*.tool.evts.*.*");
    assert_eq!(event_tail(ComponentKind::Task), "compozy.*.task.evts.>");
    assert_eq!(
        command_filter(ComponentKind::Agent, CommandKind::Dispatch),
        "compozy.*.agent.cmds.*.dispatch"
    );
    assert_eq!(
        event_filter(ComponentKind::Task, EventKind::WaitingStarted),
        "compozy.*.task.evts.*.waiting_started"
    );
    assert_eq!(log_filter(ComponentKind::Tool, LogLevel::Debug), "compozy.logs.tool.*.debug");
    assert_eq!(log_record(ComponentKind::Task, &exec("e9"), LogLevel::Info), "compozy.logs.task.e9.info");
}

#[test]
fn request_reply_family_uses_exec_in_second_token() {
    let e = exec("exec-1");
    assert_eq!(request(ComponentKind::Agent, &e, "agent123"), "compozy.exec-1.agent.agent123.request");
    assert_eq!(response(ComponentKind::Tool, &e, "tool9"), "compozy.exec-1.tool.tool9.response");
    assert_eq!(exec_log(&e, LogLevel::Error), "compozy.exec-1.log.error");
    assert_eq!(exec_log_wildcard(&e), "compozy.exec-1.log.*");
}

proptest! {
    // Subject round-trip: parse(build(...)) recovers every field.
    #[test]
    fn command_subjects_roundtrip(
        corr_raw in "[a-z0-9-]{1,36}",
        exec_raw in "[a-z0-9-]{1,36}",
        component_ix in 0usize..4,
        kind_ix in 0usize..6,
    ) {
        let component = ComponentKind::STATEFUL[component_ix];
        let kinds = [
            CommandKind::Trigger,
            CommandKind::Dispatch,
            CommandKind::Execute,
            CommandKind::Cancel,
            CommandKind::Pause,
            CommandKind::Resume,
        ];
        let kind = kinds[kind_ix];
        let subject = command(component, &corr(&corr_raw), &exec(&exec_raw), kind);
        let parsed = parse(&subject, Segment::Cmds).expect("roundtrip");
        prop_assert_eq!(parsed.component, component);
        prop_assert_eq!(parsed.correlation_id.as_str(), corr_raw.as_str());
        prop_assert_eq!(parsed.exec_id.as_str(), exec_raw.as_str());
        prop_assert_eq!(parsed.command_kind().expect("verb"), kind);
    }

    #[test]
    fn event_subjects_roundtrip(
        corr_raw in "[a-z0-9-]{1,36}",
        exec_raw in "[a-z0-9-]{1,36}",
        component_ix in 0usize..4,
        kind_ix in 0usize..11,
    ) {
        let component = ComponentKind::STATEFUL[component_ix];
        let kinds = [
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
        let kind = kinds[kind_ix];
        let subject = event(component, &corr(&corr_raw), &exec(&exec_raw), kind);
        let parsed = parse(&subject, Segment::Evts).expect("roundtrip");
        prop_assert_eq!(parsed.component, component);
        prop_assert_eq!(parsed.correlation_id.as_str(), corr_raw.as_str());
        prop_assert_eq!(parsed.exec_id.as_str(), exec_raw.as_str());
        prop_assert_eq!(parsed.event_kind().expect("verb"), kind);
    }
}
