use crate::api::{
    normalize_conversations, normalize_history, normalize_profile, normalize_send_echo,
    normalize_unread_counts,
};

#[test]
fn test_normalize_conversations_envelope() {
    let raw = r#"{
        "data": [
            {
                "id": 42,
                "user": { "id": 7, "name": "Alice", "username": "alice" },
                "car": { "make": "Toyota", "model": "Yaris" },
                "start_time": "2024-06-01T09:00:00Z",
                "unread_count": 2
            },
            {
                "id": 43,
                "user": { "id": 8, "name": "Bob" },
                "car": { "make": "Fiat", "model": "500" },
                "start_time": "2024-06-02T10:00:00Z"
            }
        ]
    }"#;

    let conversations = normalize_conversations(raw).expect("Failed to normalize conversations");

    assert_eq!(conversations.len(), 2);
    assert_eq!(conversations[0].booking_id, 42);
    assert_eq!(conversations[0].unread_count, 2);
    assert_eq!(conversations[1].counterpart.name, "Bob");
    assert_eq!(conversations[1].unread_count, 0);
}

#[test]
fn test_normalize_history_paginated_shape() {
    let raw = r#"{
        "data": {
            "data": [
                { "id": 1, "booking_id": 42, "sender_id": 7, "message": "hi",
                  "created_at": "2024-06-01T09:00:00Z", "read_at": null },
                { "id": 2, "booking_id": 42, "sender_id": 9, "message": "hello",
                  "created_at": "2024-06-01T09:01:00Z", "read_at": "2024-06-01T09:02:00Z" }
            ]
        }
    }"#;

    let history = normalize_history(raw).expect("Failed to normalize paginated history");

    assert_eq!(history.len(), 2);
    assert_eq!(history[0].body, "hi");
    assert!(history[0].read_at.is_none());
    assert!(history[1].read_at.is_some());
}

#[test]
fn test_normalize_history_legacy_shape() {
    let raw = r#"{
        "data": {
            "messages": [
                { "id": 5, "booking_id": 42, "sender_id": 7, "message": "legacy",
                  "created_at": "2024-06-01T09:00:00Z" }
            ]
        }
    }"#;

    let history = normalize_history(raw).expect("Failed to normalize legacy history");

    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, 5);
    assert_eq!(history[0].body, "legacy");
}

#[test]
fn test_normalize_history_rejects_unknown_shape() {
    let raw = r#"{ "data": { "something_else": [] } }"#;
    assert!(normalize_history(raw).is_err());
}

#[test]
fn test_normalize_profile_envelope() {
    let raw = r#"{ "user": { "id": 7, "name": "Alice", "email": "a@example.com" } }"#;

    let identity = normalize_profile(raw).expect("Failed to normalize profile");

    assert_eq!(identity.id, 7);
    assert_eq!(identity.name.as_deref(), Some("Alice"));
}

#[test]
fn test_normalize_unread_counts_parses_string_keys() {
    let raw = r#"{ "data": { "42": 3, "43": 0 } }"#;

    let counts = normalize_unread_counts(raw).expect("Failed to normalize unread counts");

    assert_eq!(counts.get(&42), Some(&3));
    assert_eq!(counts.get(&43), Some(&0));
}

#[test]
fn test_normalize_unread_counts_skips_bad_keys() {
    let raw = r#"{ "data": { "42": 1, "not-a-booking": 5 } }"#;

    let counts = normalize_unread_counts(raw).expect("Failed to normalize unread counts");

    assert_eq!(counts.len(), 1);
    assert_eq!(counts.get(&42), Some(&1));
}

#[test]
fn test_normalize_send_echo_present() {
    let raw = r#"{
        "data": { "id": 9, "booking_id": 42, "sender_id": 7, "message": "sent",
                  "created_at": "2024-06-01T09:00:00Z" }
    }"#;

    let echo = normalize_send_echo(raw).expect("Send echo should be present");
    assert_eq!(echo.id, 9);
    assert_eq!(echo.body, "sent");
}

#[test]
fn test_normalize_send_echo_absent() {
    assert!(normalize_send_echo("{}").is_none());
    assert!(normalize_send_echo("").is_none());
}
