#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Integration tests for masgent-session.

use masgent_core::Role;
use masgent_session::Session;

#[test]
fn test_new_session_is_empty() {
    let session = Session::new();
    assert!(session.is_empty());
    assert!(session.last_assistant().is_none());
    assert_eq!(session.created_at(), session.updated_at());
}

#[test]
fn test_turns_append_in_order_with_session_id() {
    let mut session = Session::new();
    session.add_user("make me a POSCAR");
    session.add_assistant("Do you want to provide formula (Chemical formula), or should I decide for you?");
    session.add_user("NaCl");
    session.add_tool(
        "generate_vasp_poscar({\"formula\":\"NaCl\"})",
        &[("call_id", serde_json::json!("call_1"))],
    );
    session.add_tool("Updated POSCAR in /tmp/out.", &[("call_id", serde_json::json!("call_1"))]);
    session.add_assistant("Updated POSCAR in /tmp/out.");

    let roles: Vec<Role> = session.messages().iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        [Role::User, Role::Assistant, Role::User, Role::Tool, Role::Tool, Role::Assistant]
    );
    assert!(session.messages().iter().all(|m| m.session_id == session.id()));
    assert_eq!(session.messages()[3].metadata["call_id"], "call_1");
    assert_eq!(session.count_role(Role::Tool), 2);
    assert_eq!(session.last_assistant().unwrap().content, "Updated POSCAR in /tmp/out.");
    assert!(session.updated_at() >= session.created_at());
}

#[test]
fn test_sessions_have_distinct_ids() {
    assert_ne!(Session::new().id(), Session::new().id());
}
