//! The pattern bus: a single-slot handoff from dispatcher to renderer.
//!
//! [`PatternBus::send`] resolves only once the renderer has handled the
//! command and called [`BusRequest::accept`]. For `Stop` that means the
//! animation has fully terminated.

use crate::error::{GlowError, Result};
use crate::event::PatternCommand;
use tokio::sync::{mpsc, oneshot};

/// A command waiting for the renderer.
#[derive(Debug)]
pub struct BusRequest {
    pub command: PatternCommand,
    accepted: oneshot::Sender<()>,
}

impl BusRequest {
    /// Release the sender blocked on this command.
    pub fn accept(self) {
        let _ = self.accepted.send(());
    }
}

/// Sending half, held by the dispatcher.
#[derive(Debug, Clone)]
pub struct PatternBus {
    tx: mpsc::Sender<BusRequest>,
}

/// Receiving half, held by the renderer.
#[derive(Debug)]
pub struct BusReceiver {
    rx: mpsc::Receiver<BusRequest>,
}

/// Create a connected bus pair.
pub fn channel() -> (PatternBus, BusReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (PatternBus { tx }, BusReceiver { rx })
}

impl PatternBus {
    /// Hand `command` to the renderer and wait until it is handled.
    ///
    /// # Errors
    /// Returns `GlowError::BusClosed` if the renderer is gone, or drops the
    /// request without accepting it.
    pub async fn send(&self, command: PatternCommand) -> Result<()> {
        let (accepted, ack) = oneshot::channel();
        self.tx
            .send(BusRequest { command, accepted })
            .await
            .map_err(|_| GlowError::BusClosed)?;
        ack.await.map_err(|_| GlowError::BusClosed)
    }
}

impl BusReceiver {
    /// Next command, or `None` once every sender is dropped.
    pub async fn recv(&mut self) -> Option<BusRequest> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Pattern;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn send_waits_for_accept() {
        let (bus, mut rx) = channel();
        let sender = tokio::spawn(async move { bus.send(PatternCommand::Stop).await });

        let req = rx.recv().await.unwrap();
        assert_eq!(req.command, PatternCommand::Stop);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!sender.is_finished());

        req.accept();
        sender.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn dropped_request_reports_closed() {
        let (bus, mut rx) = channel();
        let sender =
            tokio::spawn(async move { bus.send(PatternCommand::Start(Pattern::Wipe)).await });
        drop(rx.recv().await.unwrap());
        assert!(matches!(sender.await.unwrap(), Err(GlowError::BusClosed)));
    }

    #[tokio::test]
    async fn closed_receiver_reports_closed() {
        let (bus, rx) = channel();
        drop(rx);
        assert!(matches!(
            bus.send(PatternCommand::Stop).await,
            Err(GlowError::BusClosed)
        ));
    }
}
