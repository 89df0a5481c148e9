//! Integration tests for the execution core

mod config_integration;
mod logging_default;
mod parameter_resolution;
mod store_integration;
mod test_utils;
