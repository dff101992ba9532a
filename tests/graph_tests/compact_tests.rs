//! Tests for compact nodes
//!
//! These tests verify:
//! - Round trip and the `~alice` update scenario
//! - Idempotent writes
//! - Sorted, inclusive field filters
//! - Stored record format and decode failures

use gunkv::graph::keys;
use gunkv::{GetOptions, GunKvError, GunNode, GunValue};

use super::common::{graph_of, setup_temp_adapter, subset};

// =============================================================================
// Helper Functions
// =============================================================================

fn abcd() -> GunNode {
    GunNode::new("s")
        .with("d", 4, 1.0)
        .with("b", 2, 1.0)
        .with("a", 1, 1.0)
        .with("c", 3, 1.0)
}

// =============================================================================
// Round Trip Tests
// =============================================================================

#[test]
fn test_round_trip() {
    let (_temp, adapter) = setup_temp_adapter();

    adapter
        .put_sync(&graph_of([GunNode::new("S").with("f", "v", 1.0)]))
        .unwrap();

    let node = adapter.get_sync("S", &GetOptions::all()).unwrap().unwrap();
    assert_eq!(node.soul(), "S");
    assert_eq!(node.get("f"), Some(&GunValue::from("v")));
    assert_eq!(node.state_of("f"), Some(1.0));
}

#[test]
fn test_alice_scenario() {
    let (_temp, adapter) = setup_temp_adapter();
    let t1 = 1_700_000_000_000.0;
    let t2 = t1 + 1.0;

    adapter
        .put_sync(&graph_of([GunNode::new("~alice")
            .with("name", "Alice", t1)
            .with("age", 30, t1)]))
        .unwrap();

    let alice = adapter.get_sync("~alice", &GetOptions::all()).unwrap().unwrap();
    assert_eq!(alice.get("name"), Some(&GunValue::from("Alice")));
    assert_eq!(alice.get("age"), Some(&GunValue::from(30)));
    assert_eq!(alice.state_of("name"), Some(t1));
    assert_eq!(alice.state_of("age"), Some(t1));

    let diff = adapter
        .put_sync(&graph_of([GunNode::new("~alice").with("age", 31, t2)]))
        .unwrap();
    assert_eq!(diff, Some(graph_of([GunNode::new("~alice").with("age", 31, t2)])));

    let alice = adapter.get_sync("~alice", &GetOptions::all()).unwrap().unwrap();
    assert_eq!(alice.get("name"), Some(&GunValue::from("Alice")));
    assert_eq!(alice.get("age"), Some(&GunValue::from(31)));
    assert_eq!(alice.state_of("name"), Some(t1));
    assert!(alice.state_of("age").unwrap() > t1);
}

#[test]
fn test_value_kinds_round_trip() {
    let (_temp, adapter) = setup_temp_adapter();
    let node = GunNode::new("kinds")
        .with("null", GunValue::Null, 1.0)
        .with("bool", true, 1.0)
        .with("int", -7i64, 1.0)
        .with("float", 2.5, 1.0)
        .with("text", "hello", 1.0)
        .with("link", GunValue::link("~bob"), 1.0)
        .with("", "empty field name", 1.0);

    adapter.put_sync(&graph_of([node.clone()])).unwrap();

    assert_eq!(adapter.get_sync("kinds", &GetOptions::all()).unwrap(), Some(node));
}

#[test]
fn test_absent_node() {
    let (_temp, adapter) = setup_temp_adapter();

    assert_eq!(adapter.get_sync("nobody", &GetOptions::all()).unwrap(), None);
    assert_eq!(adapter.get_sync("", &GetOptions::all()).unwrap(), None);
    assert_eq!(adapter.get_sync("wide:x", &GetOptions::all()).unwrap(), None);
}

// =============================================================================
// Idempotence Tests
// =============================================================================

#[test]
fn test_repeated_put_is_noop() {
    let (_temp, adapter) = setup_temp_adapter();
    let graph = graph_of([GunNode::new("S").with("f", "v", 5.0)]);

    assert!(adapter.put_sync(&graph).unwrap().is_some());
    let stored = adapter.engine().get(b"S");
    let wal_size = adapter.engine().wal_size();

    assert_eq!(adapter.put_sync(&graph).unwrap(), None);
    assert_eq!(adapter.engine().get(b"S"), stored);
    assert_eq!(adapter.engine().wal_size(), wal_size);
}

#[test]
fn test_older_put_is_noop() {
    let (_temp, adapter) = setup_temp_adapter();
    adapter
        .put_sync(&graph_of([GunNode::new("S").with("f", "new", 5.0)]))
        .unwrap();

    let diff = adapter
        .put_sync(&graph_of([GunNode::new("S").with("f", "old", 4.0)]))
        .unwrap();

    assert_eq!(diff, None);
    let node = adapter.get_sync("S", &GetOptions::all()).unwrap().unwrap();
    assert_eq!(node.get("f"), Some(&GunValue::from("new")));
}

// =============================================================================
// Filter Tests
// =============================================================================

#[test]
fn test_range_filter() {
    let (_temp, adapter) = setup_temp_adapter();
    let node = abcd();
    adapter.put_sync(&graph_of([node.clone()])).unwrap();

    let get = |opts: GetOptions| adapter.get_sync("s", &opts).unwrap();

    assert_eq!(get(GetOptions::range("b", "c")), Some(subset(&node, &["b", "c"])));
    assert_eq!(get(GetOptions::exact("b")), Some(subset(&node, &["b"])));
    assert_eq!(get(GetOptions::starting_at("c")), Some(subset(&node, &["c", "d"])));
    assert_eq!(get(GetOptions::ending_at("b")), Some(subset(&node, &["a", "b"])));
    assert_eq!(get(GetOptions::range("bb", "bz")), None);
    assert_eq!(get(GetOptions::exact("zz")), None);
}

#[test]
fn test_exact_wins_over_range() {
    let (_temp, adapter) = setup_temp_adapter();
    let node = abcd();
    adapter.put_sync(&graph_of([node.clone()])).unwrap();

    let opts = GetOptions {
        exact: Some("d".to_string()),
        from: Some("a".to_string()),
        to: Some("b".to_string()),
    };

    assert_eq!(adapter.get_sync("s", &opts).unwrap(), Some(subset(&node, &["d"])));
}

#[test]
fn test_empty_bounds_are_unset() {
    let (_temp, adapter) = setup_temp_adapter();
    let node = abcd();
    adapter.put_sync(&graph_of([node.clone()])).unwrap();

    let opts = GetOptions {
        exact: Some(String::new()),
        from: Some(String::new()),
        to: None,
    };

    assert!(opts.is_unbounded());
    assert_eq!(adapter.get_sync("s", &opts).unwrap(), Some(node));
}

#[test]
fn test_get_options_wire_names() {
    let opts: GetOptions = serde_json::from_str(r#"{">": "b", "<": "c"}"#).unwrap();
    assert_eq!(opts, GetOptions::range("b", "c"));

    let opts: GetOptions = serde_json::from_str(r#"{".": "b"}"#).unwrap();
    assert_eq!(opts, GetOptions::exact("b"));
}

// =============================================================================
// Stored Format Tests
// =============================================================================

#[test]
fn test_stored_record_is_gun_json() {
    let (_temp, adapter) = setup_temp_adapter();
    adapter
        .put_sync(&graph_of([GunNode::new("S").with("f", "v", 1.5)]))
        .unwrap();

    let bytes = adapter.engine().get(keys::primary_key("S")).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(
        json,
        serde_json::json!({"_": {"#": "S", ">": {"f": 1.5}}, "f": "v"})
    );
}

#[test]
fn test_corrupt_record_fails_read_and_write() {
    let (_temp, adapter) = setup_temp_adapter();
    adapter.engine().put(b"S", b"{not json").unwrap();

    assert!(matches!(
        adapter.get_sync("S", &GetOptions::all()),
        Err(GunKvError::Decode { .. })
    ));
    assert!(matches!(
        adapter.put_sync(&graph_of([GunNode::new("S").with("f", "v", 1.0)])),
        Err(GunKvError::Decode { .. })
    ));
    assert_eq!(adapter.engine().get(b"S"), Some(b"{not json".to_vec()));
}
