// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State store tests over a temp directory.

use super::*;
use crate::model::{BaseState, WorkflowState};
use compozy_core::Status;
use tempfile::TempDir;

fn open_store() -> (TempDir, StateStore) {
    let dir = TempDir::new().expect("tempdir");
    let store = StateStore::open(dir.path()).expect("open store");
    (dir, store)
}

fn workflow(id: &str, corr: &str, exec: &str) -> ComponentState {
    let mut base = BaseState::new(StateId::workflow(id, corr));
    base.exec_id = ExecutionId::from_string(exec);
    ComponentState::Workflow(WorkflowState { base })
}

fn task(id: &str, corr: &str, exec: &str, workflow_exec: &str) -> ComponentState {
    let mut base = BaseState::new(StateId::task(id, corr));
    base.exec_id = ExecutionId::from_string(exec);
    ComponentState::Task(TaskState {
        base,
        workflow_exec_id: ExecutionId::from_string(workflow_exec),
    })
}

fn agent(id: &str, corr: &str, task_exec: &str) -> ComponentState {
    let mut base = BaseState::new(StateId::agent(id, corr));
    base.exec_id = ExecutionId::from_string(format!("{id}-exec"));
    ComponentState::Agent(AgentState {
        base,
        task_exec_id: ExecutionId::from_string(task_exec),
        workflow_exec_id: ExecutionId::from_string("wf-exec"),
    })
}

fn tool(id: &str, corr: &str, task_exec: &str) -> ComponentState {
    let mut base = BaseState::new(StateId::tool(id, corr));
    base.exec_id = ExecutionId::from_string(format!("{id}-exec"));
    ComponentState::Tool(ToolState {
        base,
        task_exec_id: ExecutionId::from_string(task_exec),
        workflow_exec_id: ExecutionId::from_string("wf-exec"),
    })
}

#[test]
fn state_keys_carry_kind_prefixes() {
    assert_eq!(StateStore::state_key(&StateId::workflow("w1", "c1")), "w:workflow:w1:c1");
    assert_eq!(StateStore::state_key(&StateId::task("t1", "c1")), "t:task:t1:c1");
    assert_eq!(StateStore::state_key(&StateId::agent("a1", "c1")), "a:agent:a1:c1");
    assert_eq!(StateStore::state_key(&StateId::tool("x1", "c1")), "tl:tool:x1:c1");
}

#[test]
fn upsert_then_get_roundtrips() {
    let (_dir, store) = open_store();
    let state = workflow("workflow-1", "corr-1", "wf-exec-1");

    store.upsert(&state).expect("upsert");
    let got = store.get(&state.id()).expect("get");
    assert_eq!(got, state);
}

#[test]
fn get_missing_is_not_found() {
    let (_dir, store) = open_store();
    let err = store.get(&StateId::workflow("nope", "c")).expect_err("missing");
    assert!(matches!(err, StateError::NotFound(_)));
}

#[test]
fn returned_states_are_snapshots() {
    let (_dir, store) = open_store();
    let state = workflow("workflow-1", "corr-1", "wf-exec-1");
    store.upsert(&state).expect("upsert");

    let mut first = store.get(&state.id()).expect("get");
    first.base_mut().status = Status::Failed;

    // Mutating a returned snapshot never touches the stored value.
    let second = store.get(&state.id()).expect("get");
    assert_eq!(second.base().status, Status::Pending);
}

#[test]
fn upsert_replaces_previous_value() {
    let (_dir, store) = open_store();
    let mut state = workflow("workflow-1", "corr-1", "wf-exec-1");
    store.upsert(&state).expect("upsert");

    state.base_mut().status = Status::Running;
    store.upsert(&state).expect("upsert update");
    assert_eq!(store.get(&state.id()).expect("get").base().status, Status::Running);
    assert_eq!(store.len(), 1);
}

#[test]
fn terminal_status_is_locked_in_the_upsert_path() {
    let (_dir, store) = open_store();
    let mut state = workflow("workflow-1", "corr-1", "wf-exec-1");
    state.base_mut().status = Status::Success;
    store.upsert(&state).expect("upsert terminal");

    // An out-of-order caller reapplying an older reduction is refused.
    let mut stale = workflow("workflow-1", "corr-1", "wf-exec-1");
    stale.base_mut().status = Status::Running;
    let err = store.upsert(&stale).expect_err("terminal locked");
    assert!(matches!(err, StateError::TerminalStateLocked(_)));
    assert_eq!(store.get(&state.id()).expect("get").base().status, Status::Success);

    // Re-writing the same terminal status stays idempotent.
    store.upsert(&state).expect("idempotent terminal rewrite");
}

#[test]
fn by_component_lists_only_that_kind() {
    let (_dir, store) = open_store();
    store.upsert(&workflow("w1", "c", "e1")).expect("upsert");
    store.upsert(&workflow("w2", "c", "e2")).expect("upsert");
    store.upsert(&task("t1", "c", "te1", "e1")).expect("upsert");
    store.upsert(&tool("x1", "c", "te1")).expect("upsert");

    assert_eq!(store.by_component(ComponentKind::Workflow).expect("list").len(), 2);
    assert_eq!(store.by_component(ComponentKind::Task).expect("list").len(), 1);
    // tool keys (tl:) must not leak into task scans (t:)
    assert_eq!(store.by_component(ComponentKind::Tool).expect("list").len(), 1);
    assert_eq!(store.by_component(ComponentKind::Agent).expect("list").len(), 0);
}

#[test]
fn hierarchical_indexes_resolve_children() {
    let (_dir, store) = open_store();
    store.upsert(&workflow("workflow-1", "corr-1", "wf-exec")).expect("upsert");
    store.upsert(&task("task-1", "corr-1", "task-exec-1", "wf-exec")).expect("upsert");
    store.upsert(&task("task-2", "corr-1", "task-exec-2", "wf-exec")).expect("upsert");
    store.upsert(&agent("agent-1", "corr-1", "task-exec-1")).expect("upsert");
    store.upsert(&tool("tool-1", "corr-1", "task-exec-1")).expect("upsert");

    let tasks = store.tasks_for_workflow(&ExecutionId::from_string("wf-exec")).expect("tasks");
    assert_eq!(tasks.len(), 2);

    let agents = store.agents_for_task(&ExecutionId::from_string("task-exec-1")).expect("agents");
    assert_eq!(agents.len(), 1);
    assert_eq!(agents[0].base.id.component_id, "agent-1");

    let tools = store.tools_for_task(&ExecutionId::from_string("task-exec-1")).expect("tools");
    assert_eq!(tools.len(), 1);

    assert!(store
        .agents_for_task(&ExecutionId::from_string("task-exec-2"))
        .expect("agents")
        .is_empty());
}

#[test]
fn delete_removes_state_and_index() {
    let (_dir, store) = open_store();
    let t = task("task-1", "corr-1", "task-exec-1", "wf-exec");
    store.upsert(&t).expect("upsert");

    store.delete(&t.id()).expect("delete");
    assert!(matches!(store.get(&t.id()), Err(StateError::NotFound(_))));
    assert!(store
        .tasks_for_workflow(&ExecutionId::from_string("wf-exec"))
        .expect("tasks")
        .is_empty());

    // Deleting an absent key is a no-op.
    store.delete(&t.id()).expect("idempotent delete");
}

#[test]
fn reindexes_when_parent_linkage_changes() {
    let (_dir, store) = open_store();
    store.upsert(&task("task-1", "corr-1", "task-exec-1", "wf-old")).expect("upsert");
    store.upsert(&task("task-1", "corr-1", "task-exec-1", "wf-new")).expect("upsert");

    assert!(store
        .tasks_for_workflow(&ExecutionId::from_string("wf-old"))
        .expect("tasks")
        .is_empty());
    assert_eq!(
        store.tasks_for_workflow(&ExecutionId::from_string("wf-new")).expect("tasks").len(),
        1
    );
}

#[test]
fn store_survives_reopen() {
    let dir = TempDir::new().expect("tempdir");
    let id = {
        let store = StateStore::open(dir.path()).expect("open");
        let state = workflow("workflow-1", "corr-1", "wf-exec");
        store.upsert(&state).expect("upsert");
        store.flush().expect("flush");
        state.id()
    };

    let store = StateStore::open(dir.path()).expect("reopen");
    assert!(store.get(&id).is_ok());
}
