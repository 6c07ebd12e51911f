use serde_json::Value;

use crate::{
    tree::{AttributeRole, NodeId, NodeTree, is_truthy_flag},
    types::Params,
};

/// Cuts `path` right after the first node whose `boundary_key` flag is set.
///
/// The boundary node itself is kept. Without a boundary the path is returned
/// unchanged.
pub fn truncate_at_boundary(tree: &NodeTree, path: &[NodeId], boundary_key: &str) -> Vec<NodeId> {
    let boundary = path
        .iter()
        .position(|node| flag_is_set(tree, *node, boundary_key));
    match boundary {
        Some(index) => path[..=index].to_vec(),
        None => path.to_vec(),
    }
}

/// True when any node on `path` carries a set `clickable_key` flag.
pub fn is_interactive(tree: &NodeTree, path: &[NodeId], clickable_key: &str) -> bool {
    path.iter().any(|node| flag_is_set(tree, *node, clickable_key))
}

/// Merges every parameter declared along `path`, in path order.
///
/// Bulk `params` objects are merged key by key and single `params-<name>`
/// entries set one key; later nodes overwrite earlier ones. A bulk value that
/// is not a JSON object is skipped with a warning, so arrays and strings do
/// not contribute index keys (`"0"`, `"1"`, ..) the way a plain key walk over
/// the parsed value would.
pub fn aggregate_params(tree: &NodeTree, path: &[NodeId], prefix: &str) -> Params {
    let mut params = Params::new();
    for node in path {
        let Ok(declared) = tree.with_dataset(*node, |dataset| {
            dataset
                .roles(prefix)
                .filter(|(role, _)| {
                    matches!(role, AttributeRole::Params | AttributeRole::Param(_))
                })
                .map(|(role, value)| (role, value.to_string()))
                .collect::<Vec<_>>()
        }) else {
            continue;
        };

        for (role, value) in declared {
            match role {
                AttributeRole::Params => merge_bulk(&mut params, *node, prefix, &value),
                AttributeRole::Param(name) => {
                    params.insert(name, Value::String(value));
                }
                _ => {}
            }
        }
    }
    params
}

fn merge_bulk(params: &mut Params, node: NodeId, prefix: &str, raw: &str) {
    if raw.is_empty() {
        return;
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(entries)) => params.extend(entries),
        Ok(other) => tracing::warn!(
            target: "aggregator",
            node = %node,
            key = %AttributeRole::Params.key(prefix),
            value = %raw,
            json_type = json_type(&other),
            "bulk_params_not_an_object"
        ),
        Err(err) => tracing::warn!(
            target: "aggregator",
            node = %node,
            key = %AttributeRole::Params.key(prefix),
            value = %raw,
            error = %err,
            "bulk_params_malformed_json"
        ),
    }
}

fn flag_is_set(tree: &NodeTree, node: NodeId, key: &str) -> bool {
    tree.with_dataset(node, |dataset| dataset.get(key).is_some_and(is_truthy_flag))
        .unwrap_or(false)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
