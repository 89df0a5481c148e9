use crate::context::ExtensionContext;
use crate::extension::Extension;
use crate::resolution::{ParameterContext, ParameterResolver};
use crate::types::{UniqueId, Value};
use serde::Serialize;
use std::collections::BTreeSet;

/// Description of the node currently executing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestInfo {
    pub unique_id: UniqueId,
    pub display_name: String,
    pub tags: BTreeSet<String>,
}

impl TestInfo {
    pub fn from_context(context: &ExtensionContext) -> Self {
        Self {
            unique_id: context.unique_id().clone(),
            display_name: context.display_name().to_string(),
            tags: context.tags().clone(),
        }
    }
}

/// Built-in resolver for parameters declared as [`TestInfo`]
#[derive(Debug, Clone, Copy, Default)]
pub struct TestInfoParameterResolver;

impl Extension for TestInfoParameterResolver {
    fn name(&self) -> &str {
        "trellis::TestInfoParameterResolver"
    }

    fn as_parameter_resolver(&self) -> Option<&dyn ParameterResolver> {
        Some(self)
    }
}

impl ParameterResolver for TestInfoParameterResolver {
    fn supports(
        &self,
        parameter: &ParameterContext<'_>,
        _context: &ExtensionContext,
    ) -> anyhow::Result<bool> {
        Ok(parameter.declared_type().is::<TestInfo>())
    }

    fn resolve(
        &self,
        _parameter: &ParameterContext<'_>,
        context: &ExtensionContext,
    ) -> anyhow::Result<Option<Value>> {
        Ok(Some(Value::new(TestInfo::from_context(context))))
    }
}
