//! Tests for the key codec
//!
//! These tests verify:
//! - Primary and wide key layout
//! - Field recovery from scanned keys
//! - Byte order of field keys follows field names

use gunkv::graph::keys;
use gunkv::Representation;
use proptest::prelude::*;

// =============================================================================
// Layout Tests
// =============================================================================

#[test]
fn test_primary_key_is_soul() {
    assert_eq!(keys::primary_key("~alice"), &b"~alice"[..]);
}

#[test]
fn test_wide_field_key_layout() {
    assert_eq!(keys::wide_field_key("s", "f"), b"wide:s/f".to_vec());
    assert_eq!(keys::wide_prefix("s"), b"wide:s/".to_vec());
    assert_eq!(keys::wide_field_key("s", ""), keys::wide_prefix("s"));
}

#[test]
fn test_wide_field_name() {
    let prefix = keys::wide_prefix("s");

    assert_eq!(
        keys::wide_field_name(&prefix, &keys::wide_field_key("s", "name")),
        Some(&b"name"[..])
    );
    assert_eq!(
        keys::wide_field_name(&prefix, &keys::wide_field_key("t", "name")),
        None
    );
}

#[test]
fn test_reserved_souls() {
    assert!(keys::is_reserved_soul("wide:x"));
    assert!(keys::is_reserved_soul("wide:"));
    assert!(!keys::is_reserved_soul("wideawake"));
    assert!(!keys::is_reserved_soul("~alice"));
}

#[test]
fn test_representation_from_primary_record() {
    assert_eq!(Representation::of(None), Representation::Absent);
    assert_eq!(Representation::of(Some(keys::WIDE_NODE_MARKER)), Representation::Wide);
    assert_eq!(Representation::of(Some(&b"{\"_\":{}}"[..])), Representation::Compact);
}

// =============================================================================
// Ordering Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_field_order_is_key_order(
        soul in "[a-z~/]{0,8}",
        a in "\\PC{0,8}",
        b in "\\PC{0,8}",
    ) {
        let ka = keys::wide_field_key(&soul, &a);
        let kb = keys::wide_field_key(&soul, &b);

        prop_assert_eq!(a.as_bytes().cmp(b.as_bytes()), ka.cmp(&kb));
    }

    #[test]
    fn prop_field_keys_share_prefix(soul in "[a-z~/]{0,8}", field in "\\PC{0,8}") {
        let prefix = keys::wide_prefix(&soul);
        let key = keys::wide_field_key(&soul, &field);

        prop_assert!(key.starts_with(&prefix));
        prop_assert!(key >= prefix);
        prop_assert_eq!(keys::wide_field_name(&prefix, &key), Some(field.as_bytes()));
    }
}
