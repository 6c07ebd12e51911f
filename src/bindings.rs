//! Writes declarations onto nodes and drives the change-detection and display
//! conventions built on top of the tracker.

use serde_json::Value;

use crate::{
    tracker::{
        ParamsResolverPort, Tracker,
        error::{TrackerError, invalid_request, serialization},
    },
    tree::{AttributeRole, NodeId, NodeTree},
    types::{EventRecord, Params},
};

/// Declaration helpers bound to one tracker's tree and prefix.
#[derive(Clone)]
pub struct Bindings {
    tracker: Tracker,
}

impl Bindings {
    pub fn new(tracker: Tracker) -> Self {
        Self { tracker }
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Stores `params` as the node's bulk declaration. Only JSON objects are
    /// accepted.
    pub fn params(&self, node: NodeId, params: &Value) -> Result<(), TrackerError> {
        bind_params(self.tracker.tree(), node, self.tracker.prefix(), params)
    }

    pub fn param(
        &self,
        node: NodeId,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), TrackerError> {
        bind_param(self.tracker.tree(), node, self.tracker.prefix(), name, value)
    }

    pub fn clickable(&self, node: NodeId, enabled: Option<bool>) -> Result<(), TrackerError> {
        bind_clickable(self.tracker.tree(), node, self.tracker.prefix(), enabled)
    }

    pub async fn watch_params<F>(&self, node: NodeId, on_change: F) -> Result<bool, TrackerError>
    where
        F: FnOnce(Params) + Send,
    {
        watch_params(
            &self.tracker,
            self.tracker.tree(),
            node,
            self.tracker.prefix(),
            on_change,
        )
        .await
    }

    pub async fn report_display(
        &self,
        node: NodeId,
        enabled: Option<bool>,
    ) -> Result<bool, TrackerError> {
        report_display(&self.tracker, node, enabled).await
    }
}

pub fn bind_params(
    tree: &NodeTree,
    node: NodeId,
    prefix: &str,
    params: &Value,
) -> Result<(), TrackerError> {
    if !params.is_object() {
        return Err(invalid_request("bulk params must be a JSON object"));
    }
    let encoded = serde_json::to_string(params)
        .map_err(|err| serialization(format!("failed to encode bulk params: {err}")))?;
    tree.set_attribute(node, AttributeRole::Params.key(prefix), encoded)?;
    Ok(())
}

/// Stores a single named parameter. `name` must be one lowercase ascii word so
/// that it decodes back unchanged during aggregation.
pub fn bind_param(
    tree: &NodeTree,
    node: NodeId,
    prefix: &str,
    name: &str,
    value: impl Into<String>,
) -> Result<(), TrackerError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit());
    if !valid {
        return Err(invalid_request(format!(
            "param name '{name}' must contain only lowercase ascii letters and digits"
        )));
    }
    tree.set_attribute(
        node,
        AttributeRole::Param(name.to_string()).key(prefix),
        value,
    )?;
    Ok(())
}

/// `None` and `Some(true)` mark the node clickable; `Some(false)` opts it out.
pub fn bind_clickable(
    tree: &NodeTree,
    node: NodeId,
    prefix: &str,
    enabled: Option<bool>,
) -> Result<(), TrackerError> {
    let value = if enabled.unwrap_or(true) { "true" } else { "false" };
    tree.set_attribute(node, AttributeRole::Clickable.key(prefix), value)?;
    Ok(())
}

/// Resolves the node's parameters and calls `on_change` only when their
/// serialization differs from the node's identify cache, which is then
/// updated. Returns whether `on_change` ran.
pub async fn watch_params<R, F>(
    resolver: &R,
    tree: &NodeTree,
    node: NodeId,
    prefix: &str,
    on_change: F,
) -> Result<bool, TrackerError>
where
    R: ParamsResolverPort + ?Sized,
    F: FnOnce(Params) + Send,
{
    let params = resolver.resolve_parameters(node).await?;
    let encoded = match serde_json::to_string(&params) {
        Ok(encoded) => encoded,
        Err(err) => {
            tracing::error!(
                target: "bindings",
                node = %node,
                error = %err,
                "identify_serialization_failed"
            );
            return Ok(false);
        }
    };

    let identify_key = AttributeRole::Identify.key(prefix);
    if tree.attribute(node, &identify_key)?.as_deref() == Some(encoded.as_str()) {
        return Ok(false);
    }
    tree.set_attribute(node, identify_key, encoded)?;
    on_change(params);
    Ok(true)
}

/// Publishes a `display` record for `node` unless `enabled` is `Some(false)`.
pub async fn report_display(
    tracker: &Tracker,
    node: NodeId,
    enabled: Option<bool>,
) -> Result<bool, TrackerError> {
    if !enabled.unwrap_or(true) {
        return Ok(false);
    }
    let params = tracker.resolve_parameters(node).await?;
    tracker.publish(&EventRecord::display(params));
    Ok(true)
}
