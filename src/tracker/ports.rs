use async_trait::async_trait;

use crate::{
    tracker::error::TrackerError,
    tree::NodeId,
    types::{EventRecord, Params},
};

pub trait SubscriberPort: Send + Sync {
    fn on_event(&self, record: &EventRecord) -> anyhow::Result<()>;
}

#[async_trait]
pub trait ParamsResolverPort: Send + Sync {
    async fn resolve_parameters(&self, node: NodeId) -> Result<Params, TrackerError>;
}

/// Adapts a plain callback into a subscriber.
pub struct FnSubscriber<F> {
    callback: F,
}

impl<F> FnSubscriber<F>
where
    F: Fn(&EventRecord) -> anyhow::Result<()> + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> SubscriberPort for FnSubscriber<F>
where
    F: Fn(&EventRecord) -> anyhow::Result<()> + Send + Sync,
{
    fn on_event(&self, record: &EventRecord) -> anyhow::Result<()> {
        (self.callback)(record)
    }
}
