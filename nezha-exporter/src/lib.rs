//! Nezha dashboard poller that republishes server state as Prometheus metrics

pub mod client;
pub mod mapping;
pub mod poller;
pub mod record;
pub mod updater;

pub use client::{NezhaClient, ServerSource, SERVER_DETAILS_PATH};
pub use mapping::{FieldKind, FieldMapping, FieldSpec, Instrument};
pub use poller::{PollCycle, Scheduler, POLL_INTERVAL};
pub use record::{Lookup, ServerRecord};
pub use updater::MetricUpdater;
