pub mod error;
pub mod ports;
pub mod resolution;
pub mod runtime;
pub mod types;

pub use error::{TrackerError, TrackerErrorKind};
pub use ports::{FnSubscriber, ParamsResolverPort, SubscriberPort};
pub use runtime::Tracker;
pub use types::{
    CLICK_EVENT, Container, DEFAULT_PREFIX, PublishReport, RESOLVE_EVENT, RESOLVE_GUARD,
    TrackerOptions, TrackerState,
};
