use crate::protocol::{
    booking_channel, events, subscribe_frame, unsubscribe_frame, whisper_frame, ChannelEvent,
    Frame,
};

#[test]
fn test_subscribe_frame_carries_channel_and_auth() {
    let frame = subscribe_frame("private-booking.42", "key:signature");

    assert_eq!(frame.event, events::SUBSCRIBE);
    let data = frame.data.expect("Subscribe frame must carry data");
    assert_eq!(data["channel"], "private-booking.42");
    assert_eq!(data["auth"], "key:signature");
}

#[test]
fn test_unsubscribe_frame_names_channel() {
    let frame = unsubscribe_frame("private-booking.42");

    assert_eq!(frame.event, events::UNSUBSCRIBE);
    let data = frame.data.expect("Unsubscribe frame must carry data");
    assert_eq!(data["channel"], "private-booking.42");
}

#[test]
fn test_whisper_frame_is_client_event_on_channel() {
    let frame = whisper_frame(&booking_channel(42), 7);

    assert_eq!(frame.event, events::TYPING_WHISPER);
    assert_eq!(frame.channel.as_deref(), Some("private-booking.42"));
    assert_eq!(frame.data.expect("Whisper must carry data")["user_id"], 7);
}

#[test]
fn test_decode_message_sent_event() {
    let raw = r#"{
        "event": "MessageSent",
        "channel": "private-booking.42",
        "data": {
            "message": {
                "id": 7, "booking_id": 42, "sender_id": 9, "message": "on my way",
                "created_at": "2024-06-01T09:00:00Z", "read_at": null
            }
        }
    }"#;

    let frame = Frame::from_json(raw).expect("Failed to decode frame");
    let event = ChannelEvent::from_frame(&frame).expect("Failed to decode event");

    match event {
        ChannelEvent::MessageSent { channel, message } => {
            assert_eq!(channel, "private-booking.42");
            assert_eq!(message.id, 7);
            assert_eq!(message.body, "on my way");
        }
        other => panic!("Expected MessageSent, got {:?}", other),
    }
}

#[test]
fn test_decode_message_sent_with_double_encoded_data() {
    // Channel event payloads may arrive double-encoded, like control frames
    let raw = r#"{
        "event": "MessageSent",
        "channel": "private-booking.42",
        "data": "{\"message\":{\"id\":8,\"booking_id\":42,\"sender_id\":9,\"message\":\"ok\",\"created_at\":\"2024-06-01T09:00:00Z\"}}"
    }"#;

    let frame = Frame::from_json(raw).expect("Failed to decode frame");
    let event = ChannelEvent::from_frame(&frame).expect("Failed to decode event");

    match event {
        ChannelEvent::MessageSent { message, .. } => assert_eq!(message.id, 8),
        other => panic!("Expected MessageSent, got {:?}", other),
    }
}

#[test]
fn test_decode_message_read_event() {
    let raw = r#"{
        "event": "MessageRead",
        "channel": "private-booking.42",
        "data": { "message_id": 7, "read_at": "2024-06-01T09:05:00Z" }
    }"#;

    let frame = Frame::from_json(raw).expect("Failed to decode frame");
    let event = ChannelEvent::from_frame(&frame).expect("Failed to decode event");

    match event {
        ChannelEvent::MessageRead {
            message_id,
            read_at,
            ..
        } => {
            assert_eq!(message_id, 7);
            assert_eq!(read_at.to_rfc3339(), "2024-06-01T09:05:00+00:00");
        }
        other => panic!("Expected MessageRead, got {:?}", other),
    }
}

#[test]
fn test_decode_typing_whisper_event() {
    let raw = r#"{
        "event": "client-typing",
        "channel": "private-booking.42",
        "data": { "user_id": 9 }
    }"#;

    let frame = Frame::from_json(raw).expect("Failed to decode frame");
    let event = ChannelEvent::from_frame(&frame).expect("Failed to decode event");

    match event {
        ChannelEvent::TypingWhisper { user_id, .. } => assert_eq!(user_id, 9),
        other => panic!("Expected TypingWhisper, got {:?}", other),
    }
}

#[test]
fn test_decode_ping_event() {
    let frame = Frame::from_json(r#"{"event":"pusher:ping"}"#).expect("Failed to decode frame");
    let event = ChannelEvent::from_frame(&frame).expect("Failed to decode event");

    assert!(matches!(event, ChannelEvent::Ping));
}

#[test]
fn test_decode_protocol_error_without_data() {
    let frame = Frame::from_json(r#"{"event":"pusher:error"}"#).expect("Failed to decode frame");
    let event = ChannelEvent::from_frame(&frame).expect("Failed to decode event");

    match event {
        ChannelEvent::ProtocolError { message } => assert!(message.is_empty()),
        other => panic!("Expected ProtocolError, got {:?}", other),
    }
}

#[test]
fn test_subscription_succeeded_carries_channel() {
    let raw = r#"{
        "event": "pusher_internal:subscription_succeeded",
        "channel": "private-booking.42",
        "data": "{}"
    }"#;

    let frame = Frame::from_json(raw).expect("Failed to decode frame");
    let event = ChannelEvent::from_frame(&frame).expect("Failed to decode event");

    match event {
        ChannelEvent::SubscriptionSucceeded { channel } => {
            assert_eq!(channel, "private-booking.42");
        }
        other => panic!("Expected SubscriptionSucceeded, got {:?}", other),
    }
}
