//! Wildcard deactivation patterns match whole names, literally except for `*`

use proptest::prelude::*;
use trellis::ConditionEvaluator;

const NAME: &str = "[a-zA-Z0-9:._+?()\\[\\]$^|]{1,16}";

#[test]
fn test_literal_pattern_matches_only_itself() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(NAME, NAME), |(name, other)| {
            let evaluator = ConditionEvaluator::with_deactivation_patterns([&name]).unwrap();
            prop_assert!(evaluator.is_deactivated(&name));
            prop_assert_eq!(evaluator.is_deactivated(&other), name == other);
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_prefix_wildcard_matches_extensions_of_prefix() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(NAME, "[a-z:]{0,8}"), |(prefix, suffix)| {
            let pattern = format!("{prefix}*");
            let evaluator = ConditionEvaluator::with_deactivation_patterns([&pattern]).unwrap();
            let extended = format!("{prefix}{suffix}");
            prop_assert!(evaluator.is_deactivated(&extended));
            let prefixed = format!("x{extended}");
            prop_assert!(!evaluator.is_deactivated(&prefixed) || prefix.starts_with('x'));
            Ok(())
        })
        .unwrap();
}
