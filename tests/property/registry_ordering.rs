//! Registry streams: local first, then ancestors, each extension once

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use trellis::{Capability, Extension, ExtensionRegistry, LifecycleCallback};

struct Named(String);

impl Extension for Named {
    fn name(&self) -> &str {
        &self.0
    }

    fn as_lifecycle_callback(&self) -> Option<&dyn LifecycleCallback> {
        Some(self)
    }
}

impl LifecycleCallback for Named {}

/// Registrations per level, root first, as indices into a shared pool
fn levels() -> impl Strategy<Value = Vec<Vec<usize>>> {
    prop::collection::vec(prop::collection::vec(0usize..8, 0..6), 1..5)
}

#[test]
fn test_stream_matches_child_first_model() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&levels(), |levels| {
            let pool: Vec<Arc<dyn Extension>> = (0..8)
                .map(|i| Arc::new(Named(format!("ext{i}"))) as Arc<dyn Extension>)
                .collect();

            let mut registry = Arc::new(ExtensionRegistry::new_root("level0"));
            for (depth, registrations) in levels.iter().enumerate() {
                if depth > 0 {
                    registry = Arc::new(ExtensionRegistry::child_of(
                        &registry,
                        format!("level{depth}"),
                    ));
                }
                for &index in registrations {
                    registry.register(Arc::clone(&pool[index])).unwrap();
                }
            }

            let mut seen = HashSet::new();
            let expected: Vec<String> = levels
                .iter()
                .rev()
                .flatten()
                .filter(|index| seen.insert(**index))
                .map(|index| format!("ext{index}"))
                .collect();

            prop_assert_eq!(registry.names(Capability::LifecycleCallback), expected);
            prop_assert!(registry.stream(Capability::Condition).is_empty());
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_child_registration_never_leaks_into_parent() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(prop::collection::vec(0usize..8, 0..6), prop::collection::vec(0usize..8, 0..6)),
            |(parent_indices, child_indices)| {
                let pool: Vec<Arc<dyn Extension>> = (0..8)
                    .map(|i| Arc::new(Named(format!("ext{i}"))) as Arc<dyn Extension>)
                    .collect();
                let parent = Arc::new(ExtensionRegistry::new_root("parent"));
                for &index in &parent_indices {
                    parent.register(Arc::clone(&pool[index])).unwrap();
                }
                let before = parent.names(Capability::LifecycleCallback);

                let child = ExtensionRegistry::child_of(&parent, "child");
                for &index in &child_indices {
                    child.register(Arc::clone(&pool[index])).unwrap();
                }

                prop_assert_eq!(parent.names(Capability::LifecycleCallback), before);
                prop_assert_eq!(parent.local_extensions().len(), parent_indices.len());
                Ok(())
            },
        )
        .unwrap();
}
