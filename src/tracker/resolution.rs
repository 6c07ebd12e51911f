use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::{
    tracker::{
        error::{TrackerError, internal_error, timeout},
        ports::ParamsResolverPort,
        runtime::Tracker,
        types::{RESOLVE_EVENT, RESOLVE_GUARD},
    },
    tree::{DispatchedEvent, EventHandler, ListenerOptions, NodeId},
    types::Params,
};

impl Tracker {
    /// Resolves the parameters `node` would report, using the tree's own
    /// dispatch to materialize its propagation path.
    ///
    /// A one-time capture listener on the root receives the internal event
    /// dispatched from `node`. When `node` is not beneath the root the listener
    /// never fires; the guard then removes it and the call fails with
    /// [`TrackerErrorKind::Timeout`](crate::tracker::TrackerErrorKind::Timeout).
    pub async fn resolve_parameters(&self, node: NodeId) -> Result<Params, TrackerError> {
        let _gate = self.inner.resolve_gate.lock().await;
        let tree = &self.inner.tree;

        let (params_tx, params_rx) = oneshot::channel::<Params>();
        let pending = Mutex::new(Some(params_tx));
        let weak = Arc::downgrade(&self.inner);
        let handler: EventHandler = Arc::new(move |event: &DispatchedEvent| {
            let Some(params_tx) = pending.lock().expect("lock poisoned").take() else {
                return;
            };
            if let Some(inner) = weak.upgrade() {
                let _ = params_tx.send(inner.params_along(&event.composed_path()));
            }
        });

        let listener = tree.add_listener(
            self.inner.root,
            RESOLVE_EVENT,
            ListenerOptions {
                capture: true,
                once: true,
            },
            handler,
        )?;
        if let Err(err) = tree.dispatch(node, RESOLVE_EVENT) {
            tree.remove_listener(listener);
            return Err(err.into());
        }

        match tokio::time::timeout(RESOLVE_GUARD, params_rx).await {
            Ok(Ok(params)) => Ok(params),
            Ok(Err(_)) => {
                tree.remove_listener(listener);
                Err(internal_error(format!(
                    "{} resolution listener dropped without a result",
                    self.inner.prefix
                )))
            }
            Err(_) => {
                let removed = tree.remove_listener(listener);
                tracing::warn!(
                    target: "tracker",
                    node = %node,
                    root = %self.inner.root,
                    stale_listener_removed = removed,
                    "resolve_parameters_timeout"
                );
                Err(timeout(format!("{} timeout", self.inner.prefix)))
            }
        }
    }
}

#[async_trait]
impl ParamsResolverPort for Tracker {
    async fn resolve_parameters(&self, node: NodeId) -> Result<Params, TrackerError> {
        Tracker::resolve_parameters(self, node).await
    }
}
