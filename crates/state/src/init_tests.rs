// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Initializer tests: env merge bias, normalization, determinism.

use std::sync::Arc;

use super::*;
use crate::normalize::DotPathEngine;
use serde_json::json;

fn initializer() -> StateInitializer {
    StateInitializer::new(Normalizer::new(Arc::new(DotPathEngine)))
}

fn env(pairs: &[(&str, &str)]) -> Env {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn trigger() -> serde_json::Map<String, serde_json::Value> {
    json!({"city": "lisbon"}).as_object().expect("object").clone()
}

fn task_init() -> TaskInit {
    TaskInit {
        component_id: ComponentId::from_string("task-1"),
        exec_id: ExecutionId::from_string("task-exec-1"),
        correlation_id: CorrelationId::from_string("corr-1"),
        workflow_exec_id: ExecutionId::from_string("wf-exec-1"),
        trigger: trigger(),
        parent_env: env(&[("REGION", "us-east-1"), ("LOG_LEVEL", "info")]),
        env: env(&[("LOG_LEVEL", "debug")]),
    }
}

#[test]
fn workflow_initializer_builds_pending_state() {
    let state = initializer()
        .workflow(WorkflowInit {
            component_id: ComponentId::from_string("workflow-1"),
            exec_id: ExecutionId::from_string("wf-exec-1"),
            correlation_id: CorrelationId::from_string("corr-1"),
            trigger: trigger(),
            parent_env: env(&[("REGION", "us-east-1")]),
            env: Env::new(),
        })
        .expect("init");

    assert_eq!(state.base.id.to_string(), "workflow:workflow-1:corr-1");
    assert_eq!(state.base.exec_id, "wf-exec-1");
    assert_eq!(state.base.status, compozy_core::Status::Pending);
    assert!(state.base.input.is_empty());
    assert!(state.base.output.is_empty());
    assert_eq!(state.base.trigger, trigger());
}

#[test]
fn child_env_overrides_parent() {
    let state = initializer().task(task_init()).expect("init");
    assert_eq!(state.base.env.get("LOG_LEVEL"), Some("debug"));
    assert_eq!(state.base.env.get("REGION"), Some("us-east-1"));
    assert_eq!(state.workflow_exec_id, "wf-exec-1");
}

#[test]
fn env_templates_resolve_against_trigger() {
    let mut init = task_init();
    init.env.set("CITY", "{{ trigger.input.city }}");

    let state = initializer().task(init).expect("init");
    assert_eq!(state.base.env.get("CITY"), Some("lisbon"));
}

#[test]
fn agent_and_tool_record_both_parents() {
    let init = AgentInit {
        component_id: ComponentId::from_string("agent-1"),
        exec_id: ExecutionId::from_string("agent-exec-1"),
        correlation_id: CorrelationId::from_string("corr-1"),
        task_exec_id: ExecutionId::from_string("task-exec-1"),
        workflow_exec_id: ExecutionId::from_string("wf-exec-1"),
        trigger: trigger(),
        parent_env: env(&[("A", "1")]),
        env: env(&[("B", "2")]),
    };

    let agent = initializer().agent(init.clone()).expect("init");
    assert_eq!(agent.task_exec_id, "task-exec-1");
    assert_eq!(agent.workflow_exec_id, "wf-exec-1");
    assert_eq!(agent.base.id.component, compozy_core::ComponentKind::Agent);

    let tool = initializer().tool(init).expect("init");
    assert_eq!(tool.base.id.component, compozy_core::ComponentKind::Tool);
    assert_eq!(tool.task_exec_id, "task-exec-1");
}

#[test]
fn initializers_are_deterministic() {
    let a = initializer().task(task_init()).expect("init");
    let b = initializer().task(task_init()).expect("init");

    assert_eq!(a.base.id, b.base.id);
    assert_eq!(a.base.env, b.base.env);
    assert_eq!(a.base.input, b.base.input);
    assert_eq!(a.base.trigger, b.base.trigger);
    assert_eq!(a.workflow_exec_id, b.workflow_exec_id);
}

#[test]
fn normalizer_failure_aborts_initialization() {
    let mut init = task_init();
    init.env.set("BROKEN", "{{ unterminated");

    let err = initializer().task(init).expect_err("abort");
    assert!(matches!(err, StateError::TemplateParse { field: "env", .. }));
}

#[test]
fn missing_engine_aborts_initialization() {
    let bare = StateInitializer::new(Normalizer::without_engine());
    let err = bare.task(task_init()).expect_err("abort");
    assert!(matches!(err, StateError::EngineUninitialized));
}
