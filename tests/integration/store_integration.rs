//! Integration tests for the hierarchical value store

use super::test_utils::{journal, root_context, Journal};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use trellis::store::{CloseableResource, Namespace, NamespacedHierarchicalStore};
use trellis::{new_context, StoreError, TreeNode};

struct Connection {
    name: &'static str,
    fail: bool,
    journal: Journal,
}

impl CloseableResource for Connection {
    fn close(&self) -> anyhow::Result<()> {
        self.journal.lock().push(format!("close {}", self.name));
        if self.fail {
            anyhow::bail!("{} refused to close", self.name);
        }
        Ok(())
    }
}

/// Concurrent callers for one key run the factory exactly once
#[test]
fn test_concurrent_compute_runs_factory_once() {
    let store = Arc::new(NamespacedHierarchicalStore::new_root("root", true));
    let ns = Namespace::new(["concurrency"]);
    let calls = Arc::new(AtomicUsize::new(0));
    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let store = Arc::clone(&store);
            let ns = ns.clone();
            let calls = Arc::clone(&calls);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store
                    .get_or_compute_if_absent_typed(&ns, "expensive", |_| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(std::time::Duration::from_millis(5));
                        42u64
                    })
                    .unwrap()
            })
        })
        .collect();

    let results: Vec<Arc<u64>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(results.iter().all(|value| **value == 42));
    assert!(results.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
}

/// Computing one key does not block other keys
#[test]
fn test_different_keys_compute_independently() {
    let store = Arc::new(NamespacedHierarchicalStore::new_root("root", true));
    let ns = Namespace::global();
    let inner_store = Arc::clone(&store);
    let inner_ns = ns.clone();

    let value = store
        .get_or_compute_if_absent_typed(&ns, "outer", move |_| {
            // A different key is usable while "outer" is being computed
            *inner_store
                .get_or_compute_if_absent_typed(&inner_ns, "inner", |_| 1u32)
                .unwrap()
                + 1
        })
        .unwrap();
    assert_eq!(*value, 2);
    assert_eq!(*store.get_typed::<u32>(&ns, "inner").unwrap().unwrap(), 1);
}

/// Child scopes read through to parents but never write into them
#[test]
fn test_context_tree_store_isolation() {
    let root = root_context();
    let suite = TreeNode::container(root.unique_id(), "Suite");
    let child = new_context(&root, Arc::new(suite)).unwrap();
    let ns = Namespace::new(["isolation"]);

    root.store(ns.clone()).put("shared", "from root").unwrap();
    child.store(ns.clone()).put("shared", "from child").unwrap();
    child.store(ns.clone()).put("local", 1u8).unwrap();

    assert_eq!(
        *child.store(ns.clone()).get_typed::<&str>("shared").unwrap().unwrap(),
        "from child"
    );
    assert_eq!(
        *root.store(ns.clone()).get_typed::<&str>("shared").unwrap().unwrap(),
        "from root"
    );
    assert!(root.store(ns.clone()).get("local").unwrap().is_none());

    // Removing the child's value exposes the parent's again
    child.store(ns.clone()).remove("shared").unwrap();
    assert_eq!(
        *child.store(ns).get_typed::<&str>("shared").unwrap().unwrap(),
        "from root"
    );
}

/// A value computed by the parent is reused by the child
#[test]
fn test_compute_uses_parent_value() {
    let root = root_context();
    let child = new_context(&root, Arc::new(TreeNode::test(root.unique_id(), "case"))).unwrap();
    let ns = Namespace::global();

    root.store(ns.clone())
        .get_or_compute_if_absent("config", |_| String::from("root"))
        .unwrap();
    let seen = child
        .store(ns)
        .get_or_compute_if_absent("config", |_| String::from("child"))
        .unwrap();
    assert_eq!(*seen, "root");
}

/// Teardown attempts every resource and aggregates all failures
#[test]
fn test_teardown_aggregates_close_failures() {
    let events = journal();
    let store = NamespacedHierarchicalStore::new_root("root", true);
    let ns = Namespace::new(["resources"]);
    for (name, fail) in [("a", false), ("b", true), ("c", false), ("d", true)] {
        store
            .put_resource(
                &ns,
                name,
                Connection {
                    name,
                    fail,
                    journal: Arc::clone(&events),
                },
            )
            .unwrap();
    }
    store.put(&ns, "plain", 5u8).unwrap();

    let failure = store.close_all_owned_values().unwrap_err();
    assert_eq!(
        *events.lock(),
        vec!["close d", "close c", "close b", "close a"]
    );
    assert_eq!(failure.len(), 2);
    assert!(failure.primary().to_string().contains("d refused"));
    assert!(failure.suppressed()[0].to_string().contains("b refused"));

    assert!(matches!(store.get(&ns, "plain"), Err(StoreError::Closed(_))));
    assert!(store.close_all_owned_values().is_ok());
}

/// With resource closing disabled, values are dropped without close
#[test]
fn test_close_resources_disabled() {
    let events = journal();
    let store = NamespacedHierarchicalStore::new_root("root", false);
    store
        .put_resource(
            &Namespace::global(),
            "conn",
            Connection {
                name: "conn",
                fail: true,
                journal: Arc::clone(&events),
            },
        )
        .unwrap();
    assert!(store.close_all_owned_values().is_ok());
    assert!(events.lock().is_empty());
}

/// Reads of the wrong type are reported, not coerced
#[test]
fn test_type_mismatch() {
    let store = NamespacedHierarchicalStore::new_root("root", true);
    let ns = Namespace::global();
    store.put(&ns, "count", 3u32).unwrap();
    match store.get_typed::<String>(&ns, "count") {
        Err(StoreError::TypeMismatch {
            expected, actual, ..
        }) => {
            assert_eq!(expected, std::any::type_name::<String>());
            assert_eq!(actual, "u32");
        }
        other => panic!("unexpected result {other:?}"),
    }
}
