//! Cooperative shutdown signal observed by both pipeline loops

use std::sync::Arc;
use tokio::sync::watch;

/// Fires the shutdown signal
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Observes the shutdown signal
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown was triggered. Never resolves if every trigger is
    /// dropped without firing.
    pub async fn wait(&mut self) {
        let fired = self.rx.wait_for(|triggered| *triggered).await.is_ok();
        if !fired {
            std::future::pending::<()>().await;
        }
    }
}

/// Create a linked trigger / observer pair
pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx: Arc::new(tx) }, Shutdown { rx })
}
