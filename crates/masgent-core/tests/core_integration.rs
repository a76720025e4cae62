#![allow(clippy::unwrap_used, clippy::expect_used)]

use masgent_core::*;
use std::path::PathBuf;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// 1. Message serialization roundtrip
// ---------------------------------------------------------------------------

#[test]
fn message_serialization_roundtrip() {
    let session_id = Uuid::new_v4();
    let msg = Message::tool("{\"type\":\"tool_call\"}", session_id)
        .with_metadata("tool", serde_json::json!("generate_vasp_poscar"));

    let json = serde_json::to_string(&msg).unwrap();
    let deserialized: Message = serde_json::from_str(&json).unwrap();

    assert_eq!(deserialized.id, msg.id);
    assert_eq!(deserialized.role, Role::Tool);
    assert_eq!(deserialized.session_id, session_id);
    assert_eq!(deserialized.timestamp, msg.timestamp);
    assert_eq!(
        deserialized.metadata.get("tool"),
        Some(&serde_json::json!("generate_vasp_poscar"))
    );
}

// ---------------------------------------------------------------------------
// 2. ToolResult shape
// ---------------------------------------------------------------------------

#[test]
fn tool_result_serializes_status_message_and_artifacts() {
    let result = ToolResult::success(
        "Updated POSCAR in /work/masgent_outputs.",
        vec![PathBuf::from("/work/masgent_outputs/POSCAR")],
    );
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["message"], "Updated POSCAR in /work/masgent_outputs.");
    assert_eq!(json["artifacts"][0], "/work/masgent_outputs/POSCAR");
}

#[test]
fn tool_call_roundtrip() {
    let call = ToolCall {
        id: "call_1".to_string(),
        name: "generate_vasp_poscar".to_string(),
        arguments: serde_json::json!({"formula": "NaCl"}),
    };
    let json = serde_json::to_string(&call).unwrap();
    let back: ToolCall = serde_json::from_str(&json).unwrap();
    assert_eq!(back, call);
}

// ---------------------------------------------------------------------------
// 3. Error Display and From impls
// ---------------------------------------------------------------------------

#[test]
fn error_display_and_from_impls() {
    let err = MasgentError::Database("No Materials Project entry for Xx".to_string());
    assert_eq!(err.to_string(), "Database error: No Materials Project entry for Xx");

    let err = MasgentError::Structure("bad POSCAR".to_string());
    assert_eq!(err.to_string(), "Structure error: bad POSCAR");

    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: MasgentError = io.into();
    assert!(matches!(err, MasgentError::Io(_)));

    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: MasgentError = json_err.into();
    assert!(err.to_string().starts_with("JSON error:"));
}

// ---------------------------------------------------------------------------
// 4. Credential resolution
// ---------------------------------------------------------------------------

#[test]
fn credential_kinds_map_to_env_vars() {
    assert_eq!(CredentialKind::ModelProvider.env_var(), "OPENAI_API_KEY");
    assert_eq!(CredentialKind::MaterialsDatabase.env_var(), "MP_API_KEY");
}

#[tokio::test]
async fn resolver_reports_missing_materials_key() {
    let resolver = CredentialResolver::new().with_source(Box::new(
        StaticCredentialSource::new().with(CredentialKind::ModelProvider, "sk-test"),
    ));
    let err = resolver.resolve().await.unwrap_err();
    assert!(matches!(err, MasgentError::Credential(_)));
    assert!(err.to_string().contains("Materials Project API key"));
}
