//! Depth-first traversal of arbitrary JSON payloads

use serde_json::{Map, Value};

/// Visit every object in `root`, parents before their children.
///
/// Array elements are visited in order, object members in key order. The walk
/// keeps its own stack so deeply nested payloads cannot exhaust the call stack.
pub fn walk<'a, F>(root: &'a Value, mut visit: F)
where
    F: FnMut(&'a Map<String, Value>),
{
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        match node {
            Value::Object(map) => {
                visit(map);
                stack.extend(map.values().rev().filter(|v| is_container(v)));
            }
            Value::Array(items) => {
                stack.extend(items.iter().rev().filter(|v| is_container(v)));
            }
            _ => {}
        }
    }
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}
