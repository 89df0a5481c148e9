//! Integration test for file logging.
//!
//! Installs the global subscriber, so this is the only test in the binary
//! that calls `init_logging`.

use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use trellis::logging::{init_logging, LoggingConfig};
use trellis::{EngineConfig, NodeExecutor, TreeNode};

#[test]
fn test_json_logging_to_file() {
    let temp_dir = TempDir::new().unwrap();
    let log_file = temp_dir.path().join("logs").join("trellis.log");
    let config = LoggingConfig {
        level: "info".to_string(),
        format: "json".to_string(),
        output: "file".to_string(),
        file: log_file.clone(),
        ..LoggingConfig::default()
    };
    init_logging(Some(&config)).unwrap();

    let outcome = NodeExecutor::new(&EngineConfig::default())
        .unwrap()
        .execute(Arc::new(TreeNode::engine("trellis", "Engine")));
    assert!(outcome.status.is_successful());

    let contents = fs::read_to_string(&log_file).unwrap();
    let events: Vec<serde_json::Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    // Other tests in this binary may log concurrently
    let finished = events
        .iter()
        .find(|event| {
            event["fields"]["message"] == "Execution finished"
                && event["fields"]["successful"] == 1
                && event["fields"]["failed"] == 0
        })
        .expect("execution summary should be logged");
    assert_eq!(finished["level"], "INFO");
    assert!(finished["timestamp"].is_string());

    // A second subscriber cannot be installed
    assert!(init_logging(Some(&config)).is_err());
}
