//! Shared test utilities for integration tests
//!
//! Environment isolation for configuration tests and small builders for
//! context trees.

use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use trellis::{ConfigurationParameters, ExtensionContext, ExtensionRegistry, TreeNode};

/// Serializes every test that touches process environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const ISOLATED_VARS: [&str; 5] = [
    "HOME",
    "XDG_CONFIG_HOME",
    "TRELLIS_ENV",
    "TRELLIS__STORE__CLOSE_RESOURCES",
    "TRELLIS__CONDITIONS__DEACTIVATE",
];

/// Environment variable state to restore after test
struct EnvState(Vec<(&'static str, Option<String>)>);

impl EnvState {
    fn capture() -> Self {
        Self(
            ISOLATED_VARS
                .iter()
                .map(|name| (*name, std::env::var(name).ok()))
                .collect(),
        )
    }

    fn restore(self) {
        for (name, value) in self.0 {
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }
    }
}

/// Run `f` with HOME and XDG_CONFIG_HOME pointing into `test_dir` and the
/// TRELLIS_* variables cleared. The environment is restored afterwards.
///
/// XDG_CONFIG_HOME is `test_dir/config`; HOME is `test_dir/home`.
pub fn with_isolated_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let env_state = EnvState::capture();

    let config_home = test_dir.path().join("config");
    let home = test_dir.path().join("home");
    std::fs::create_dir_all(&config_home).unwrap();
    std::fs::create_dir_all(&home).unwrap();

    for name in ISOLATED_VARS {
        std::env::remove_var(name);
    }
    std::env::set_var("HOME", &home);
    std::env::set_var("XDG_CONFIG_HOME", &config_home);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));
    env_state.restore();
    match result {
        Ok(value) => value,
        Err(payload) => std::panic::resume_unwind(payload),
    }
}

/// Root context over a bare engine node with an empty registry
pub fn root_context() -> Arc<ExtensionContext> {
    root_context_for(TreeNode::engine("trellis", "Engine"))
}

pub fn root_context_for(node: TreeNode) -> Arc<ExtensionContext> {
    ExtensionContext::new_root(
        Arc::new(node),
        Arc::new(ExtensionRegistry::new_root("root")),
        Arc::new(ConfigurationParameters::default()),
    )
    .unwrap()
}

/// Thread-safe event journal
pub type Journal = Arc<parking_lot::Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(parking_lot::Mutex::new(Vec::new()))
}
