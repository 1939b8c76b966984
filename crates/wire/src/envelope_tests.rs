// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON envelope shape and round-trip tests.

use super::*;
use compozy_core::Status;
use serde_json::json;

#[test]
fn envelope_serializes_with_type_and_payload_tags() {
    let envelope = Envelope::new(
        ExecutionId::from_string("exec-1"),
        Body::AgentRequest(AgentRequest {
            agent_id: ComponentId::from_string("agent123"),
            action: "summarize".to_string(),
            input: json!({"text": "hello"}),
        }),
    );

    let encoded = envelope.encode_vec().expect("encode");
    let raw: serde_json::Value = serde_json::from_slice(&encoded).expect("valid json");
    assert_eq!(raw["exec_id"], "exec-1");
    assert_eq!(raw["type"], "AgentRequest");
    assert_eq!(raw["payload"]["agent_id"], "agent123");

    let back = Envelope::decode_bytes(&encoded).expect("decode");
    assert_eq!(back, envelope);
}

#[test]
fn agent_response_roundtrips_with_status() {
    let envelope = Envelope::new(
        ExecutionId::from_string("exec-1"),
        Body::AgentResponse(AgentResponse {
            agent_id: ComponentId::from_string("agent123"),
            status: Status::Success,
            output: json!({"result": "success"}),
        }),
    );

    let encoded = envelope.encode_vec().expect("encode");
    let raw: serde_json::Value = serde_json::from_slice(&encoded).expect("valid json");
    assert_eq!(raw["payload"]["status"], "SUCCESS");

    match Envelope::decode_bytes(&encoded).expect("decode").body {
        Body::AgentResponse(resp) => {
            assert_eq!(resp.agent_id, "agent123");
            assert_eq!(resp.status, Status::Success);
            assert_eq!(resp.output, json!({"result": "success"}));
        }
        other => panic!("expected AgentResponse, got {other:?}"),
    }
}

#[test]
fn error_body_roundtrips() {
    let envelope = Envelope::new(
        ExecutionId::from_string("exec-1"),
        Body::Error(WorkerError { message: "agent crashed".to_string(), code: None }),
    );
    let back = Envelope::decode_bytes(&envelope.encode_vec().expect("encode")).expect("decode");
    assert_eq!(back, envelope);
}

#[test]
fn log_message_defaults_to_info() {
    let raw = json!({
        "exec_id": "exec-1",
        "type": "Log",
        "payload": { "message": "hello" },
    });
    let envelope: Envelope =
        serde_json::from_slice(&serde_json::to_vec(&raw).expect("encode")).expect("decode");
    match envelope.body {
        Body::Log(log) => {
            assert_eq!(log.level, LogLevel::Info);
            assert_eq!(log.message, "hello");
            assert!(log.fields.is_empty());
        }
        other => panic!("expected Log, got {other:?}"),
    }
}

#[test]
fn invalid_envelopes_fail_to_decode() {
    assert!(Envelope::decode_bytes(b"not json").is_err());
    assert!(Envelope::decode_bytes(br#"{"exec_id": "e", "type": "Bogus"}"#).is_err());
}
