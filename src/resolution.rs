//! Parameter Resolution
//!
//! Fills the declared parameters of an [`Executable`] from the parameter
//! resolvers visible in a registry. Exactly one resolver must claim each
//! parameter, and whatever it produces is checked against the declared type.

mod executable;
mod test_info;

pub use executable::{
    Executable, ExecutableBody, ExecutableKind, ParameterDescriptor, TypeDescriptor,
};
pub use test_info::{TestInfo, TestInfoParameterResolver};

use crate::context::ExtensionContext;
use crate::error::ResolutionError;
use crate::extension::{Capability, Extension, ExtensionRegistry};
use crate::types::Value;
use std::sync::Arc;
use tracing::{debug, trace};

/// Capability: supply values for executable parameters
pub trait ParameterResolver: Send + Sync {
    fn supports(
        &self,
        parameter: &ParameterContext<'_>,
        context: &ExtensionContext,
    ) -> anyhow::Result<bool>;

    fn resolve(
        &self,
        parameter: &ParameterContext<'_>,
        context: &ExtensionContext,
    ) -> anyhow::Result<Option<Value>>;
}

/// The request handed to a resolver for one parameter
#[derive(Debug, Clone, Copy)]
pub struct ParameterContext<'a> {
    parameter: &'a ParameterDescriptor,
    executable: &'a Executable,
    target: Option<&'a Value>,
}

impl<'a> ParameterContext<'a> {
    pub fn new(
        parameter: &'a ParameterDescriptor,
        executable: &'a Executable,
        target: Option<&'a Value>,
    ) -> Self {
        Self {
            parameter,
            executable,
            target,
        }
    }

    pub fn parameter(&self) -> &'a ParameterDescriptor {
        self.parameter
    }

    pub fn index(&self) -> usize {
        self.parameter.index()
    }

    pub fn declared_type(&self) -> TypeDescriptor {
        self.parameter.declared_type()
    }

    pub fn metadata(&self, key: &str) -> Option<&'a str> {
        self.parameter.metadata().get(key).map(String::as_str)
    }

    pub fn executable(&self) -> &'a Executable {
        self.executable
    }

    /// Instance the executable is bound to, if any
    pub fn target(&self) -> Option<&'a Value> {
        self.target
    }
}

/// Entry point for resolving all parameters of an executable
pub struct ParameterResolution;

impl ParameterResolution {
    /// Resolve every parameter of `executable`, left to right
    pub fn resolve(
        executable: &Executable,
        bound_instance: Option<&Value>,
        context: &ExtensionContext,
        registry: &ExtensionRegistry,
    ) -> Result<Vec<Option<Value>>, ResolutionError> {
        Self::resolve_with_outer(executable, bound_instance, None, context, registry)
    }

    /// Resolve parameters of a nested constructor: position 0 receives
    /// `outer_instance` and dynamic resolution starts at position 1
    pub fn resolve_with_outer(
        executable: &Executable,
        bound_instance: Option<&Value>,
        outer_instance: Option<&Value>,
        context: &ExtensionContext,
        registry: &ExtensionRegistry,
    ) -> Result<Vec<Option<Value>>, ResolutionError> {
        let parameters = executable.parameters();
        let mut values = Vec::with_capacity(parameters.len());
        let mut start = 0;
        if executable.requires_outer_instance() {
            if let Some(outer) = outer_instance {
                values.push(Some(outer.clone()));
                start = 1;
            }
        }

        let resolvers = registry.stream(Capability::ParameterResolver);
        for parameter in &parameters[start..] {
            let request = ParameterContext::new(parameter, executable, bound_instance);
            values.push(resolve_parameter(&request, &resolvers, context)?);
        }
        Ok(values)
    }
}

fn resolve_parameter(
    request: &ParameterContext<'_>,
    resolvers: &[Arc<dyn Extension>],
    context: &ExtensionContext,
) -> Result<Option<Value>, ResolutionError> {
    let target = request.executable().description();
    let parameter = request.parameter().to_string();

    let mut matching = Vec::new();
    for extension in resolvers {
        let Some(resolver) = extension.as_parameter_resolver() else {
            continue;
        };
        let supported = resolver
            .supports(request, context)
            .map_err(|source| ResolutionError::ResolverFailed {
                resolver: extension.name().to_string(),
                parameter: parameter.clone(),
                target: target.clone(),
                source,
            })?;
        if supported {
            matching.push((extension, resolver));
        }
    }

    let (extension, resolver) = match matching.len() {
        0 => return Err(ResolutionError::NoResolverFound { parameter, target }),
        1 => matching.remove(0),
        _ => {
            let mut names: Vec<String> = matching
                .iter()
                .map(|(extension, _)| extension.name().to_string())
                .collect();
            names.sort();
            return Err(ResolutionError::AmbiguousResolvers {
                parameter,
                target,
                resolvers: names,
            });
        }
    };

    let name = extension.name();
    trace!(resolver = name, parameter = %parameter, target = %target, "Resolving parameter");
    let resolved = resolver
        .resolve(request, context)
        .map_err(|source| ResolutionError::ResolverFailed {
            resolver: name.to_string(),
            parameter: parameter.clone(),
            target: target.clone(),
            source,
        })?;

    let declared = request.declared_type();
    match &resolved {
        None if !declared.is_optional() => {
            return Err(ResolutionError::NullForPrimitive {
                resolver: name.to_string(),
                parameter,
                target,
                expected: declared.type_name(),
            });
        }
        Some(value) if !declared.accepts(value) => {
            return Err(ResolutionError::InvalidResolvedType {
                resolver: name.to_string(),
                parameter,
                target,
                expected: declared.type_name(),
                actual: value.type_name(),
            });
        }
        _ => {}
    }

    debug!(resolver = name, parameter = %parameter, target = %target, "Resolved parameter");
    Ok(resolved)
}
