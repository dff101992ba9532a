//! Tests for the graph adapter facade
//!
//! These tests verify:
//! - Multi-soul batches commit or abort as a whole
//! - Soul validation
//! - JSON string reads
//! - Async wrappers
//! - Persistence across reopen

use gunkv::graph::keys;
use gunkv::{
    CrdtResolver, FnResolver, GetOptions, GraphAdapter, GunGraph, GunKvError, GunNode, GunValue,
    HamResolver, Result,
};
use tempfile::TempDir;

use super::common::{
    graph_of, numbered_node, setup_small_adapter, setup_temp_adapter, small_config, test_config,
};

// =============================================================================
// Batch Tests
// =============================================================================

#[test]
fn test_batch_returns_diff_per_soul() {
    let (_temp, adapter) = setup_temp_adapter();
    adapter
        .put_sync(&graph_of([GunNode::new("S1").with("a", 1, 1.0)]))
        .unwrap();

    let diff = adapter
        .put_sync(&graph_of([
            GunNode::new("S1").with("a", 1, 1.0),
            GunNode::new("S2").with("b", 2, 1.0),
        ]))
        .unwrap();

    assert_eq!(diff, Some(graph_of([GunNode::new("S2").with("b", 2, 1.0)])));
}

#[test]
fn test_failing_soul_aborts_batch() {
    let temp_dir = TempDir::new().unwrap();
    let ham = HamResolver::new();
    let resolver = FnResolver {
        diff: move |updates: &GunGraph, existing: &GunGraph| -> Result<Option<GunGraph>> {
            if updates.contains_key("S2") {
                return Err(GunKvError::Resolver("S2 rejected".to_string()));
            }
            ham.diff(updates, existing)
        },
        merge: |existing: &GunGraph, diff: &GunGraph| -> Result<GunGraph> {
            HamResolver::new().merge(existing, diff)
        },
    };
    let adapter = GraphAdapter::open_with_resolver(test_config(&temp_dir), resolver).unwrap();

    let original = GunNode::new("S1").with("a", "before", 1.0);
    adapter.put_sync(&graph_of([original.clone()])).unwrap();

    let result = adapter.put_sync(&graph_of([
        GunNode::new("S1").with("a", "after", 2.0),
        GunNode::new("S2").with("b", "x", 2.0),
    ]));

    assert!(matches!(result, Err(GunKvError::Resolver(_))));
    assert_eq!(adapter.get_sync("S1", &GetOptions::all()).unwrap(), Some(original));
    assert_eq!(adapter.get_sync("S2", &GetOptions::all()).unwrap(), None);
}

#[test]
fn test_reserved_soul_aborts_batch() {
    let (_temp, adapter) = setup_temp_adapter();

    let result = adapter.put_sync(&graph_of([
        GunNode::new("a").with("f", 1, 1.0),
        GunNode::new("wide:a/f").with("f", 1, 1.0),
    ]));

    assert!(matches!(result, Err(GunKvError::InvalidSoul(soul)) if soul == "wide:a/f"));
    assert_eq!(adapter.get_sync("a", &GetOptions::all()).unwrap(), None);
    assert_eq!(adapter.engine().entry_count(), 0);
}

#[test]
fn test_empty_soul_skipped() {
    let (_temp, adapter) = setup_temp_adapter();

    let mut graph = graph_of([GunNode::new("S").with("f", 1, 1.0)]);
    graph.insert(String::new(), GunNode::new("").with("f", 1, 1.0));

    let diff = adapter.put_sync(&graph).unwrap().unwrap();

    assert_eq!(diff.keys().collect::<Vec<_>>(), vec!["S"]);
    assert_eq!(adapter.engine().entry_count(), 1);
}

#[test]
fn test_graph_key_names_the_soul() {
    let (_temp, adapter) = setup_temp_adapter();

    // the node's own soul disagrees with the graph key
    let mut graph = GunGraph::new();
    graph.insert("real".to_string(), GunNode::new("other").with("f", 1, 1.0));
    adapter.put_sync(&graph).unwrap();

    let node = adapter.get_sync("real", &GetOptions::all()).unwrap().unwrap();
    assert_eq!(node.soul(), "real");
    assert_eq!(adapter.get_sync("other", &GetOptions::all()).unwrap(), None);
}

#[test]
fn test_empty_graph_is_noop() {
    let (_temp, adapter) = setup_temp_adapter();

    assert_eq!(adapter.put_sync(&GunGraph::new()).unwrap(), None);
    assert_eq!(adapter.engine().wal_size(), 0);
}

#[test]
fn test_meta_field_name_ignored_by_set() {
    let (_temp, adapter) = setup_temp_adapter();
    let node = GunNode::new("s").with("a", "x", 1.0).with("_", "oops", 1.0);
    assert_eq!(node.field_count(), 1);

    let diff = adapter.put_sync(&graph_of([node])).unwrap();
    let expected = GunNode::new("s").with("a", "x", 1.0);
    assert_eq!(diff, Some(graph_of([expected.clone()])));
    assert_eq!(adapter.get_sync("s", &GetOptions::all()).unwrap(), Some(expected));
}

#[test]
fn test_meta_field_inserted_directly_is_not_stored() {
    for threshold in [usize::MAX, 2] {
        let (_temp, adapter) = setup_small_adapter(threshold, 100);
        let mut node = GunNode::new("s").with("a", 1, 1.0).with("b", 2, 1.0);
        node.fields.insert("_".to_string(), GunValue::from("oops"));
        node.meta.state.insert("_".to_string(), 1.0);

        adapter.put_sync(&graph_of([node.clone()])).unwrap();
        // a second put walks the stored record again
        assert_eq!(adapter.put_sync(&graph_of([node])).unwrap(), None);

        let expected = GunNode::new("s").with("a", 1, 1.0).with("b", 2, 1.0);
        assert_eq!(adapter.get_sync("s", &GetOptions::all()).unwrap(), Some(expected));
        assert_eq!(adapter.get_sync("s", &GetOptions::exact("_")).unwrap(), None);
    }
}

// =============================================================================
// JSON String Tests
// =============================================================================

#[test]
fn test_json_string_matches_serialized_get() {
    let (_temp, adapter) = setup_temp_adapter();
    let node = GunNode::new("S")
        .with("n", 30, 1.5)
        .with("x", 0.1, 2.0)
        .with("t", "text", 3.0)
        .with("l", GunValue::link("~bob"), 4.0)
        .with("z", GunValue::Null, 5.0);
    adapter.put_sync(&graph_of([node])).unwrap();

    for opts in [
        GetOptions::all(),
        GetOptions::exact("t"),
        GetOptions::range("l", "t"),
        GetOptions::exact("missing"),
    ] {
        let expected = serde_json::to_string(&adapter.get_sync("S", &opts).unwrap()).unwrap();
        assert_eq!(adapter.get_json_string_sync("S", &opts).unwrap(), expected);
    }
}

#[test]
fn test_json_string_of_compact_node_is_stored_bytes() {
    let (_temp, adapter) = setup_temp_adapter();
    adapter
        .put_sync(&graph_of([GunNode::new("S").with("f", "v", 1.0)]))
        .unwrap();

    let stored = adapter.engine().get(keys::primary_key("S")).unwrap();
    let json = adapter.get_json_string_sync("S", &GetOptions::all()).unwrap();

    assert_eq!(json.as_bytes(), stored.as_slice());
}

#[test]
fn test_json_string_of_wide_node() {
    let temp_dir = TempDir::new().unwrap();
    let adapter = GraphAdapter::open(small_config(&temp_dir, 2, 10_000)).unwrap();
    adapter
        .put_sync(&graph_of([numbered_node("W", 3, 1.0)]))
        .unwrap();

    let expected = serde_json::to_string(&adapter.get_sync("W", &GetOptions::all()).unwrap()).unwrap();
    assert_eq!(adapter.get_json_string_sync("W", &GetOptions::all()).unwrap(), expected);
}

#[test]
fn test_json_string_of_absent_node() {
    let (_temp, adapter) = setup_temp_adapter();

    assert_eq!(adapter.get_json_string_sync("nobody", &GetOptions::all()).unwrap(), "null");
    assert_eq!(adapter.get_json_string_sync("", &GetOptions::all()).unwrap(), "null");
}

// =============================================================================
// Async Tests
// =============================================================================

#[tokio::test]
async fn test_async_wrappers() {
    let (_temp, adapter) = setup_temp_adapter();
    let node = GunNode::new("~alice").with("name", "Alice", 1.0);

    let diff = adapter.put(&graph_of([node.clone()])).await.unwrap();
    assert_eq!(diff, Some(graph_of([node.clone()])));

    let fetched = adapter.get("~alice", &GetOptions::all()).await.unwrap();
    assert_eq!(fetched, Some(node));

    let json = adapter.get_json_string("~alice", &GetOptions::exact("name")).await.unwrap();
    assert_eq!(json, r##"{"_":{"#":"~alice",">":{"name":1.0}},"name":"Alice"}"##);
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_persistence_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let compact = GunNode::new("c").with("f", "v", 1.0);
    let wide = numbered_node("w", 5, 1.0);

    {
        let adapter = GraphAdapter::open(small_config(&temp_dir, 4, 10_000)).unwrap();
        adapter
            .put_sync(&graph_of([compact.clone(), wide.clone()]))
            .unwrap();
        adapter.close().unwrap();
    }

    let adapter = GraphAdapter::open(small_config(&temp_dir, 4, 10_000)).unwrap();
    assert_eq!(adapter.get_sync("c", &GetOptions::all()).unwrap(), Some(compact));
    assert_eq!(adapter.get_sync("w", &GetOptions::all()).unwrap(), Some(wide));
}

#[test]
fn test_recovery_without_close() {
    let temp_dir = TempDir::new().unwrap();
    let node = GunNode::new("S").with("f", "v", 1.0);

    {
        let adapter = GraphAdapter::open(test_config(&temp_dir)).unwrap();
        adapter.put_sync(&graph_of([node.clone()])).unwrap();
    }

    let adapter = GraphAdapter::open(test_config(&temp_dir)).unwrap();
    assert_eq!(adapter.get_sync("S", &GetOptions::all()).unwrap(), Some(node));
}

#[test]
fn test_map_full_aborts_put() {
    let temp_dir = TempDir::new().unwrap();
    let config = gunkv::Config::builder()
        .data_dir(temp_dir.path())
        .map_size(64)
        .build();
    let adapter = GraphAdapter::open(config).unwrap();

    let result = adapter.put_sync(&graph_of([numbered_node("S", 10, 1.0)]));

    assert!(matches!(result, Err(GunKvError::MapFull { .. })));
    assert_eq!(adapter.get_sync("S", &GetOptions::all()).unwrap(), None);
}
