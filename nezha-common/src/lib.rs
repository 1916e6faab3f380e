pub mod error;
pub mod config;
pub mod metrics;
pub mod metrics_server;
pub mod shutdown;

pub use error::{ExporterError, Result};
pub use config::{ExporterConfig, DEFAULT_NAMESPACE};
pub use metrics::{MetricsRegistry, SettableCounterVec};
pub use metrics_server::MetricsServer;
pub use shutdown::ShutdownCoordinator;
