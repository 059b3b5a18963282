use crate::{MacAllocator, new_mac, new_uuid};
use std::collections::HashSet;

fn is_mac(value: &str) -> bool {
    let octets: Vec<&str> = value.split(':').collect();
    octets.len() == 6
        && octets
            .iter()
            .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()))
}

#[test]
fn test_new_mac_uses_prefix() {
    let mac = new_mac("52:54:00");
    assert!(mac.starts_with("52:54:00:"), "{mac}");
    assert!(is_mac(&mac), "{mac}");

    let mac = new_mac("AA:BB:CC");
    assert!(mac.starts_with("aa:bb:cc:"), "{mac}");
}

#[test]
fn test_new_uuid_is_v4() {
    let value = new_uuid();
    let parsed = uuid::Uuid::parse_str(&value).expect("valid uuid");
    assert_eq!(parsed.get_version_num(), 4);
    assert_ne!(new_uuid(), value);
}

#[test]
fn test_allocator_never_repeats() {
    let mut allocator = MacAllocator::new("52:54:00");
    let mut seen = HashSet::new();
    for _ in 0..256 {
        assert!(seen.insert(allocator.generate()));
    }
}

#[test]
fn test_allocator_avoids_reserved() {
    let mut allocator = MacAllocator::new("52:54:00");
    let existing = ["52:54:00:aa:aa:01", "52:54:00:AA:AA:02"];
    for mac in existing {
        allocator.reserve(mac);
    }

    for _ in 0..64 {
        let mac = allocator.generate();
        assert_ne!(mac, "52:54:00:aa:aa:01");
        assert_ne!(mac, "52:54:00:aa:aa:02");
    }
}

#[test]
fn test_claim_lowercases() {
    let mut allocator = MacAllocator::new("52:54:00");
    assert_eq!(allocator.claim("52:54:00:AB:00:01"), "52:54:00:ab:00:01");
}
