use crate::store::{Conversation, ConversationDirectory, Counterpart, Vehicle};
use chrono::Utc;
use std::collections::HashMap;

fn conversation(booking_id: u64, unread: u32) -> Conversation {
    Conversation {
        booking_id,
        counterpart: Counterpart {
            id: booking_id + 100,
            name: format!("User {}", booking_id),
            avatar: None,
            username: None,
            phone: None,
            email: None,
        },
        vehicle: Vehicle {
            make: "Toyota".to_string(),
            model: "Yaris".to_string(),
        },
        starts_at: Utc::now(),
        unread_count: unread,
    }
}

#[test]
fn test_merge_updates_only_unread_counts() {
    let mut directory = ConversationDirectory::new();
    directory.replace(vec![conversation(42, 0), conversation(43, 5)]);

    let mut counts = HashMap::new();
    counts.insert(42, 3);

    directory.merge_unread_counts(&counts);

    // Present key updated, absent key untouched, other fields intact
    assert_eq!(directory.get(42).expect("conversation 42").unread_count, 3);
    assert_eq!(directory.get(43).expect("conversation 43").unread_count, 5);
    assert_eq!(directory.get(42).expect("conversation 42").counterpart.name, "User 42");
}

#[test]
fn test_merge_ignores_unknown_bookings() {
    let mut directory = ConversationDirectory::new();
    directory.replace(vec![conversation(42, 1)]);

    let mut counts = HashMap::new();
    counts.insert(999, 7);

    directory.merge_unread_counts(&counts);

    assert_eq!(directory.len(), 1);
    assert_eq!(directory.get(42).expect("conversation 42").unread_count, 1);
}

#[test]
fn test_decrement_saturates_at_zero() {
    let mut directory = ConversationDirectory::new();
    directory.replace(vec![conversation(42, 2)]);

    directory.decrement_unread(42, 1);
    assert_eq!(directory.get(42).expect("conversation 42").unread_count, 1);

    directory.decrement_unread(42, 5);
    assert_eq!(directory.get(42).expect("conversation 42").unread_count, 0);

    directory.decrement_unread(42, 1);
    assert_eq!(directory.get(42).expect("conversation 42").unread_count, 0);
}

#[test]
fn test_decrement_unknown_booking_is_noop() {
    let mut directory = ConversationDirectory::new();
    directory.replace(vec![conversation(42, 2)]);

    directory.decrement_unread(999, 1);

    assert_eq!(directory.get(42).expect("conversation 42").unread_count, 2);
}

#[test]
fn test_total_unread() {
    let mut directory = ConversationDirectory::new();
    directory.replace(vec![conversation(1, 2), conversation(2, 0), conversation(3, 4)]);

    assert_eq!(directory.total_unread(), 6);
}

#[test]
fn test_replace_discards_previous_entries() {
    let mut directory = ConversationDirectory::new();
    directory.replace(vec![conversation(1, 2)]);
    directory.replace(vec![conversation(2, 0)]);

    assert_eq!(directory.len(), 1);
    assert!(directory.get(1).is_none());
    assert!(directory.get(2).is_some());
}
