use crate::condition::ConditionEvaluationResult;
use crate::context::ExtensionContext;
use crate::error::{ConditionEvaluationError, ConfigurationError};
use crate::extension::{Capability, ExtensionRegistry};
use regex::Regex;
use tracing::{debug, trace};

const ENABLED_BY_DEFAULT: &str = "No 'disabled' conditions encountered";

/// Evaluates every registered [`ExecutionCondition`](super::ExecutionCondition)
/// for a context, skipping conditions whose names match a deactivation pattern.
#[derive(Debug, Clone, Default)]
pub struct ConditionEvaluator {
    deactivated: Vec<Regex>,
}

impl ConditionEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an evaluator that ignores conditions matching any of `patterns`.
    ///
    /// Patterns match the whole extension name; `*` matches any sequence of
    /// characters.
    pub fn with_deactivation_patterns<I, S>(patterns: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let deactivated = patterns
            .into_iter()
            .map(|pattern| compile_pattern(pattern.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { deactivated })
    }

    pub fn is_deactivated(&self, name: &str) -> bool {
        self.deactivated.iter().any(|pattern| pattern.is_match(name))
    }

    /// Visit conditions in stream order until one reports disabled
    pub fn evaluate(
        &self,
        registry: &ExtensionRegistry,
        context: &ExtensionContext,
    ) -> Result<ConditionEvaluationResult, ConditionEvaluationError> {
        for extension in registry.stream(Capability::Condition) {
            let name = extension.name();
            if self.is_deactivated(name) {
                debug!(condition = name, node = %context.unique_id(), "Skipping deactivated condition");
                continue;
            }
            let Some(condition) = extension.as_condition() else {
                continue;
            };
            let result = condition
                .evaluate(context)
                .map_err(|source| ConditionEvaluationError {
                    condition: name.to_string(),
                    source,
                })?;
            trace!(condition = name, node = %context.unique_id(), result = %result, "Evaluated condition");
            if result.is_disabled() {
                debug!(condition = name, node = %context.unique_id(), result = %result, "Node disabled");
                return Ok(result);
            }
        }
        Ok(ConditionEvaluationResult::enabled(ENABLED_BY_DEFAULT))
    }
}

/// Translate a `*` wildcard pattern into an anchored regex
pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex, ConfigurationError> {
    let trimmed = pattern.trim();
    if trimmed.is_empty() {
        return Err(ConfigurationError::Invalid(
            "condition deactivation pattern must not be empty".to_string(),
        ));
    }
    let body = trimmed
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{}$", body)).map_err(|e| {
        ConfigurationError::Invalid(format!(
            "invalid condition deactivation pattern [{}]: {}",
            pattern, e
        ))
    })
}
