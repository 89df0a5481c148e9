//! Hierarchical store lookups against a per-level map model

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use trellis::store::{Namespace, NamespacedHierarchicalStore};

#[derive(Debug, Clone)]
enum Op {
    Put { level: usize, key: u8, value: u32 },
    Remove { level: usize, key: u8 },
}

fn op(depth: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..depth, 0u8..4, any::<u32>()).prop_map(|(level, key, value)| Op::Put {
            level,
            key,
            value
        }),
        (0..depth, 0u8..4).prop_map(|(level, key)| Op::Remove { level, key }),
    ]
}

fn scenario() -> impl Strategy<Value = (usize, Vec<Op>)> {
    (1usize..5).prop_flat_map(|depth| (Just(depth), prop::collection::vec(op(depth), 0..40)))
}

fn chain(depth: usize) -> Vec<Arc<NamespacedHierarchicalStore>> {
    let mut stores = vec![Arc::new(NamespacedHierarchicalStore::new_root("level0", true))];
    for level in 1..depth {
        let child = NamespacedHierarchicalStore::child_of(&stores[level - 1], format!("level{level}"));
        stores.push(Arc::new(child));
    }
    stores
}

#[test]
fn test_lookup_finds_nearest_scope() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&scenario(), |(depth, ops)| {
            let stores = chain(depth);
            let ns = Namespace::new(["model"]);
            let mut model: Vec<HashMap<u8, u32>> = vec![HashMap::new(); depth];

            for op in &ops {
                match *op {
                    Op::Put { level, key, value } => {
                        stores[level].put(&ns, &key.to_string(), value).unwrap();
                        model[level].insert(key, value);
                    }
                    Op::Remove { level, key } => {
                        stores[level].remove(&ns, &key.to_string()).unwrap();
                        model[level].remove(&key);
                    }
                }
            }

            for level in 0..depth {
                for key in 0u8..4 {
                    let expected = model[..=level]
                        .iter()
                        .rev()
                        .find_map(|scope| scope.get(&key).copied());
                    let actual = stores[level]
                        .get_typed::<u32>(&ns, &key.to_string())
                        .unwrap()
                        .map(|value| *value);
                    prop_assert_eq!(actual, expected, "level {} key {}", level, key);
                }
            }
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_namespaces_never_collide() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                prop::collection::vec("[a-z]{1,4}", 1..3),
                prop::collection::vec("[a-z]{1,4}", 1..3),
                "[a-z]{1,6}",
            ),
            |(first, second, key)| {
                prop_assume!(first != second);
                let store = NamespacedHierarchicalStore::new_root("root", true);
                let first = Namespace::new(first);
                let second = Namespace::new(second);

                store.put(&first, &key, 1u8).unwrap();
                prop_assert!(store.get(&second, &key).unwrap().is_none());
                prop_assert_eq!(*store.get_typed::<u8>(&first, &key).unwrap().unwrap(), 1);
                Ok(())
            },
        )
        .unwrap();
}
