use tokio::sync::broadcast;
use tracing::{info, warn};

/// Fans a single shutdown signal out to every long-running task
#[derive(Clone)]
pub struct ShutdownCoordinator {
    shutdown_tx: broadcast::Sender<()>,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self { shutdown_tx }
    }

    /// Get shutdown signal receiver
    pub fn shutdown_signal(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Notify every subscriber
    pub fn trigger(&self) {
        info!("Initiating shutdown");
        let _ = self.shutdown_tx.send(());
    }

    /// Wait for Ctrl-C, then notify every subscriber
    pub async fn trigger_on_ctrl_c(&self) {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            return;
        }
        self.trigger();
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_reaches_all_subscribers() {
        let coordinator = ShutdownCoordinator::new();
        let mut first = coordinator.shutdown_signal();
        let mut second = coordinator.clone().shutdown_signal();

        coordinator.trigger();

        assert!(first.recv().await.is_ok());
        assert!(second.recv().await.is_ok());
    }

    #[test]
    fn test_trigger_without_subscribers() {
        let coordinator = ShutdownCoordinator::default();
        coordinator.trigger();
    }
}
