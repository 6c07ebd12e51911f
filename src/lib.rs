pub mod aggregator;
pub mod bindings;
pub mod codec;
pub mod config;
pub mod logging;
pub mod tracker;
pub mod tree;
pub mod types;

pub use bindings::Bindings;
pub use tracker::{Tracker, TrackerError, TrackerErrorKind, TrackerOptions};
pub use tree::{NodeId, NodeTree};
pub use types::{EventKind, EventRecord, Params};
