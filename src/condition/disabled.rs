use crate::condition::{ConditionEvaluationResult, ExecutionCondition};
use crate::context::ExtensionContext;
use crate::extension::Extension;

/// Built-in condition honouring [`Node::disabled_reason`](crate::node::Node::disabled_reason)
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCondition;

impl Extension for DisabledCondition {
    fn name(&self) -> &str {
        "trellis::DisabledCondition"
    }

    fn as_condition(&self) -> Option<&dyn ExecutionCondition> {
        Some(self)
    }
}

impl ExecutionCondition for DisabledCondition {
    fn evaluate(&self, context: &ExtensionContext) -> anyhow::Result<ConditionEvaluationResult> {
        Ok(match context.node().disabled_reason() {
            Some(reason) => ConditionEvaluationResult::disabled(format!(
                "{} is disabled: {}",
                context.display_name(),
                reason
            )),
            None => ConditionEvaluationResult::enabled("not disabled"),
        })
    }
}
