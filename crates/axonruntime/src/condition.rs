//! Minimal condition evaluation for neuron gating.
//!
//! The only supported form is an exact match against `"<key> == '<value>'"`
//! for some (key, value) pair in the executor's environment map. This is a
//! deliberate placeholder, not an expression language; extending it should
//! introduce a small tagged-expression AST rather than richer string
//! formatting.

use std::collections::HashMap;

/// Evaluate a condition string against the environment map.
/// An empty condition always passes.
pub fn evaluate(condition: &str, environment: &HashMap<String, String>) -> bool {
    if condition.is_empty() {
        return true;
    }

    environment
        .iter()
        .any(|(key, value)| condition == format!("{key} == '{value}'"))
}
