//! Integration tests for parameter resolution through a context tree

use super::test_utils::root_context;
use std::sync::Arc;
use trellis::resolution::ParameterDescriptor;
use trellis::{
    new_context, Executable, Extension, ExtensionContext, ExtensionRegistry, ParameterContext,
    ParameterResolution, ParameterResolver, ResolutionError, TestInfo, TreeNode, TypeDescriptor,
    Value,
};

/// Claims the parameter called `parameter` and resolves it to a fixed value
struct Fixed {
    label: &'static str,
    parameter: &'static str,
    value: Option<fn() -> Value>,
}

impl Extension for Fixed {
    fn name(&self) -> &str {
        self.label
    }

    fn as_parameter_resolver(&self) -> Option<&dyn ParameterResolver> {
        Some(self)
    }
}

impl ParameterResolver for Fixed {
    fn supports(
        &self,
        parameter: &ParameterContext<'_>,
        _context: &ExtensionContext,
    ) -> anyhow::Result<bool> {
        Ok(parameter.parameter().name() == self.parameter)
    }

    fn resolve(
        &self,
        _parameter: &ParameterContext<'_>,
        _context: &ExtensionContext,
    ) -> anyhow::Result<Option<Value>> {
        Ok(self.value.map(|make| make()))
    }
}

fn fixed(label: &'static str, parameter: &'static str, value: Option<fn() -> Value>) -> Fixed {
    Fixed {
        label,
        parameter,
        value,
    }
}

/// Resolver whose `supports` blows up
struct Broken;

impl Extension for Broken {
    fn name(&self) -> &str {
        "Broken"
    }

    fn as_parameter_resolver(&self) -> Option<&dyn ParameterResolver> {
        Some(self)
    }
}

impl ParameterResolver for Broken {
    fn supports(
        &self,
        _parameter: &ParameterContext<'_>,
        _context: &ExtensionContext,
    ) -> anyhow::Result<bool> {
        anyhow::bail!("cannot inspect parameter")
    }

    fn resolve(
        &self,
        _parameter: &ParameterContext<'_>,
        _context: &ExtensionContext,
    ) -> anyhow::Result<Option<Value>> {
        Ok(None)
    }
}

fn case_with(extensions: Vec<Arc<dyn Extension>>) -> Arc<ExtensionContext> {
    let root = root_context();
    let mut node = TreeNode::test(root.unique_id(), "case").with_tag("slow");
    for extension in extensions {
        node = node.with_shared_extension(extension);
    }
    new_context(&root, Arc::new(node)).unwrap()
}

fn resolve(
    context: &ExtensionContext,
    executable: &Executable,
) -> Result<Vec<Option<Value>>, ResolutionError> {
    ParameterResolution::resolve(executable, None, context, context.registry())
}

#[test]
fn test_resolves_left_to_right_across_levels() {
    let root = root_context();
    root.registry()
        .register(Arc::new(fixed("RootCount", "count", Some(|| Value::new(7u32)))))
        .unwrap();
    let node = TreeNode::test(root.unique_id(), "case").with_extension(fixed(
        "CaseLabel",
        "label",
        Some(|| Value::new(String::from("hello"))),
    ));
    let case = new_context(&root, Arc::new(node)).unwrap();

    let executable = Executable::method("sum", |_, _| Ok(None))
        .with_parameter("label", TypeDescriptor::of::<String>())
        .with_parameter("count", TypeDescriptor::of::<u32>());
    let values = resolve(&case, &executable).unwrap();

    assert_eq!(values.len(), 2);
    assert_eq!(
        values[0].as_ref().unwrap().downcast_ref::<String>().unwrap(),
        "hello"
    );
    assert_eq!(*values[1].as_ref().unwrap().downcast_ref::<u32>().unwrap(), 7);
}

#[test]
fn test_test_info_comes_from_default_extensions() {
    let root = ExtensionContext::new_root(
        Arc::new(TreeNode::engine("trellis", "Engine").with_tag("nightly")),
        Arc::new(ExtensionRegistry::with_default_extensions("root")),
        Arc::default(),
    )
    .unwrap();
    let case = new_context(
        &root,
        Arc::new(TreeNode::test(root.unique_id(), "case").with_tag("slow")),
    )
    .unwrap();

    let executable = Executable::method("describe", |_, _| Ok(None))
        .with_parameter("info", TypeDescriptor::of::<TestInfo>());
    let values = resolve(&case, &executable).unwrap();
    let info = values[0].as_ref().unwrap().downcast::<TestInfo>().unwrap();

    assert_eq!(info.display_name, "case");
    assert_eq!(info.unique_id.to_string(), "[engine:trellis]/[test:case]");
    assert!(info.tags.contains("slow"));
    assert!(info.tags.contains("nightly"));
}

#[test]
fn test_no_resolver_names_parameter_and_target() {
    let case = case_with(Vec::new());
    let executable = Executable::method("sum", |_, _| Ok(None))
        .with_parameter("count", TypeDescriptor::of::<u32>());
    match resolve(&case, &executable) {
        Err(ResolutionError::NoResolverFound { parameter, target }) => {
            assert_eq!(parameter, "u32 count");
            assert_eq!(target, "method [sum]");
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[test]
fn test_competing_resolvers_are_reported_sorted() {
    let case = case_with(vec![
        Arc::new(fixed("Zeta", "count", Some(|| Value::new(1u32)))),
        Arc::new(fixed("Alpha", "count", Some(|| Value::new(2u32)))),
    ]);
    let executable = Executable::method("sum", |_, _| Ok(None))
        .with_parameter("count", TypeDescriptor::of::<u32>());
    match resolve(&case, &executable) {
        Err(ResolutionError::AmbiguousResolvers { resolvers, .. }) => {
            assert_eq!(resolvers, vec!["Alpha", "Zeta"]);
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[test]
fn test_absent_value_only_allowed_for_optional_parameters() {
    let case = case_with(vec![
        Arc::new(fixed("NothingForCount", "count", None)),
        Arc::new(fixed("NothingForHint", "hint", None)),
    ]);

    let optional = Executable::method("maybe", |_, _| Ok(None))
        .with_parameter("hint", TypeDescriptor::optional::<String>());
    assert!(resolve(&case, &optional).unwrap()[0].is_none());

    let required = Executable::method("sum", |_, _| Ok(None))
        .with_parameter("count", TypeDescriptor::of::<u32>());
    match resolve(&case, &required) {
        Err(ResolutionError::NullForPrimitive {
            resolver, expected, ..
        }) => {
            assert_eq!(resolver, "NothingForCount");
            assert_eq!(expected, "u32");
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[test]
fn test_wrong_type_is_rejected() {
    let case = case_with(vec![Arc::new(fixed(
        "Stringly",
        "count",
        Some(|| Value::new(String::from("seven"))),
    ))]);
    let executable = Executable::method("sum", |_, _| Ok(None))
        .with_parameter("count", TypeDescriptor::of::<u32>());
    match resolve(&case, &executable) {
        Err(ResolutionError::InvalidResolvedType {
            resolver,
            expected,
            actual,
            ..
        }) => {
            assert_eq!(resolver, "Stringly");
            assert_eq!(expected, "u32");
            assert_eq!(actual, std::any::type_name::<String>());
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[test]
fn test_failing_supports_is_wrapped() {
    let case = case_with(vec![Arc::new(Broken)]);
    let executable = Executable::method("sum", |_, _| Ok(None))
        .with_parameter("count", TypeDescriptor::of::<u32>());
    let error = resolve(&case, &executable).unwrap_err();
    match &error {
        ResolutionError::ResolverFailed { resolver, .. } => assert_eq!(resolver, "Broken"),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(format!("{error}").contains("cannot inspect parameter"));
}

#[test]
fn test_outer_instance_fills_position_zero() {
    let case = case_with(vec![Arc::new(fixed(
        "Count",
        "count",
        Some(|| Value::new(3u32)),
    ))]);
    let outer = Value::new(String::from("enclosing"));
    let constructor = Executable::constructor("Inner", |_, _| Ok(None))
        .with_parameter_descriptor(ParameterDescriptor::new("count", TypeDescriptor::of::<u32>()))
        .nested_in_outer(TypeDescriptor::of::<String>());

    let values = ParameterResolution::resolve_with_outer(
        &constructor,
        None,
        Some(&outer),
        &case,
        case.registry(),
    )
    .unwrap();
    assert!(values[0].as_ref().unwrap().ptr_eq(&outer));
    assert_eq!(*values[1].as_ref().unwrap().downcast_ref::<u32>().unwrap(), 3);
}
