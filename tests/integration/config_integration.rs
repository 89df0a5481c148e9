//! Integration tests for the layered configuration loader

use super::test_utils::with_isolated_env;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use trellis::{ConfigLoader, EngineConfig, NodeExecutor, TreeNode};

fn write(path: &std::path::Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[test]
fn test_load_without_any_files_uses_defaults() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    let (config, defaults) = with_isolated_env(&test_dir, || {
        (
            ConfigLoader::load(workspace.path()).unwrap(),
            ConfigLoader::defaults().unwrap(),
        )
    });
    assert_eq!(config, defaults);
    assert!(config.store.close_resources);
}

#[test]
fn test_global_config_path_prefers_xdg() {
    let test_dir = TempDir::new().unwrap();
    let path = with_isolated_env(&test_dir, ConfigLoader::global_config_path).unwrap();
    assert_eq!(
        path,
        test_dir.path().join("config").join("trellis").join("config.toml")
    );
}

#[test]
fn test_workspace_overrides_global() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    write(
        &test_dir.path().join("config/trellis/config.toml"),
        r#"
[parameters]
mode = "global"
owner = "global"

[store]
close_resources = false
"#,
    );
    write(
        &workspace.path().join("config/config.toml"),
        r#"
[parameters]
mode = "workspace"
"#,
    );

    let config = with_isolated_env(&test_dir, || ConfigLoader::load(workspace.path()).unwrap());
    assert_eq!(config.parameters["mode"], "workspace");
    assert_eq!(config.parameters["owner"], "global");
    assert!(!config.store.close_resources);
}

#[test]
fn test_environment_file_and_variables() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    write(
        &workspace.path().join("config/config.toml"),
        "[conditions]\ndeactivate = [\"base::*\"]\n",
    );
    write(
        &workspace.path().join("config/ci.toml"),
        "[logging]\nlevel = \"warn\"\n",
    );

    let config = with_isolated_env(&test_dir, || {
        std::env::set_var("TRELLIS_ENV", "ci");
        std::env::set_var("TRELLIS__STORE__CLOSE_RESOURCES", "false");
        std::env::set_var("TRELLIS__CONDITIONS__DEACTIVATE", "a::*,b::Only");
        ConfigLoader::load(workspace.path()).unwrap()
    });

    assert_eq!(config.logging.level, "warn");
    assert!(!config.store.close_resources);
    assert_eq!(config.conditions.deactivate, vec!["a::*", "b::Only"]);
}

#[test]
fn test_invalid_configuration_is_rejected_by_executor() {
    let mut config = EngineConfig::default();
    config.logging.output = "printer".to_string();
    config.conditions.deactivate.push("  ".to_string());

    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 2);
    assert!(NodeExecutor::new(&config).is_err());
}

#[test]
fn test_parameters_reach_extensions() {
    use trellis::resolution::Executable;

    let test_dir = TempDir::new().unwrap();
    let config_file = test_dir.path().join("engine.toml");
    write(&config_file, "[parameters]\nretries = \"3\"\nverbose = \"true\"\n");
    let config = ConfigLoader::load_from_file(&config_file).unwrap();

    let root = TreeNode::engine("trellis", "Engine").with_test(Executable::method(
        "read_parameters",
        |_, _| Ok(None),
    ));
    let executor = NodeExecutor::new(&config).unwrap().with_extension(ParameterProbe);
    let outcome = executor.execute(Arc::new(root));
    assert!(outcome.status.is_successful(), "{:?}", outcome.status);
}

struct ParameterProbe;

impl trellis::Extension for ParameterProbe {
    fn as_lifecycle_callback(&self) -> Option<&dyn trellis::LifecycleCallback> {
        Some(self)
    }
}

impl trellis::LifecycleCallback for ParameterProbe {
    fn before(&self, context: &trellis::ExtensionContext) -> anyhow::Result<()> {
        let parameters = context.configuration();
        anyhow::ensure!(parameters.get_parsed::<u32>("retries").transpose()? == Some(3));
        anyhow::ensure!(parameters.get_bool("verbose") == Some(true));
        anyhow::ensure!(context.configuration_parameter("missing").is_none());
        Ok(())
    }
}
