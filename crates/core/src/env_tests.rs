// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Env merge semantics tests.

use super::*;

fn env(pairs: &[(&str, &str)]) -> Env {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn with_is_right_biased() {
    let project = env(&[("REGION", "us-east-1"), ("LOG_LEVEL", "info")]);
    let workflow = env(&[("LOG_LEVEL", "debug"), ("RETRIES", "3")]);

    let merged = project.with(&workflow);
    assert_eq!(merged.get("REGION"), Some("us-east-1"));
    assert_eq!(merged.get("LOG_LEVEL"), Some("debug"));
    assert_eq!(merged.get("RETRIES"), Some("3"));
}

#[test]
fn with_does_not_mutate_inputs() {
    let parent = env(&[("A", "parent")]);
    let child = env(&[("A", "child")]);

    let merged = parent.with(&child);
    assert_eq!(merged.get("A"), Some("child"));
    assert_eq!(parent.get("A"), Some("parent"));
    assert_eq!(child.len(), 1);
}

#[test]
fn chained_layers_apply_in_order() {
    let project = env(&[("A", "1"), ("B", "1"), ("C", "1")]);
    let workflow = env(&[("B", "2"), ("C", "2")]);
    let task = env(&[("C", "3")]);

    let merged = project.with(&workflow).with(&task);
    assert_eq!(merged.get("A"), Some("1"));
    assert_eq!(merged.get("B"), Some("2"));
    assert_eq!(merged.get("C"), Some("3"));
}

#[test]
fn empty_layers_are_identity() {
    let base = env(&[("K", "v")]);
    assert_eq!(base.with(&Env::new()), base);
    assert_eq!(Env::new().with(&base), base);
}

#[test]
fn serde_is_a_plain_string_map() {
    let e = env(&[("B", "2"), ("A", "1")]);
    let json = serde_json::to_string(&e).expect("serialize");
    // BTreeMap ordering makes serialization deterministic
    assert_eq!(json, r#"{"A":"1","B":"2"}"#);
}
