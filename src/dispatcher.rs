use crate::bus::PatternBus;
use crate::button::{Button, SPARKLE_BUTTON, TOGGLE_BUTTON};
use crate::error::Result;
use crate::event::{Pattern, PatternCommand};
use crate::sparkle::{run_sparkle, Indicators};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Turns button presses into pattern bus commands.
///
/// Owns the running flag, the activation counter and the indicator LEDs.
/// Nothing else reads or writes them.
pub struct Dispatcher {
    running: bool,
    generation: u64,
    bus: PatternBus,
    indicators: Option<Indicators>,
    sparkle: Option<JoinHandle<Result<Indicators>>>,
    sparkle_cancel: CancellationToken,
    cancel: CancellationToken,
}

impl Dispatcher {
    pub fn new(bus: PatternBus, indicators: Indicators, cancel: CancellationToken) -> Self {
        Self {
            running: false,
            generation: 0,
            bus,
            indicators: Some(indicators),
            sparkle: None,
            sparkle_cancel: cancel.child_token(),
            cancel,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Consume presses in arrival order until cancelled or every watcher is gone.
    ///
    /// # Errors
    /// Returns an error if the renderer disappears or a sparkle sequence fails.
    pub async fn run(mut self, mut events: mpsc::Receiver<Button>) -> Result<()> {
        let outcome = loop {
            tokio::select! {
                () = self.cancel.cancelled() => break Ok(()),
                joined = wait_sparkle(&mut self.sparkle) => {
                    self.sparkle = None;
                    match joined {
                        Ok(indicators) => self.indicators = Some(indicators),
                        Err(e) => break Err(e),
                    }
                }
                press = events.recv() => {
                    let Some(button) = press else {
                        debug!("event channel closed");
                        break Ok(());
                    };
                    if let Err(e) = self.handle_press(button).await {
                        break Err(e);
                    }
                }
            }
        };

        self.sparkle_cancel.cancel();
        if let Some(handle) = self.sparkle.take() {
            // Drops the indicators, which unexports them.
            let _ = handle.await;
        }
        info!("dispatcher stopped");
        outcome
    }

    async fn handle_press(&mut self, button: Button) -> Result<()> {
        info!("got {button} button press");
        match button {
            SPARKLE_BUTTON => self.start_sparkle().await,
            TOGGLE_BUTTON => self.toggle().await,
            _ => {
                debug!("no action bound to {button} button");
                Ok(())
            }
        }
    }

    async fn start_sparkle(&mut self) -> Result<()> {
        if self.indicators.is_none() {
            match self.sparkle.take() {
                Some(handle) if handle.is_finished() => {
                    self.indicators = Some(handle.await??);
                }
                other => {
                    self.sparkle = other;
                    debug!("sparkle already running, ignoring press");
                    return Ok(());
                }
            }
        }

        if let Some(indicators) = self.indicators.take() {
            self.sparkle = Some(tokio::spawn(run_sparkle(
                indicators,
                self.sparkle_cancel.clone(),
            )));
        }
        Ok(())
    }

    async fn toggle(&mut self) -> Result<()> {
        let command = if self.running {
            self.running = false;
            info!("stopping strip pattern");
            PatternCommand::Stop
        } else {
            self.generation += 1;
            self.running = true;
            let pattern = Pattern::for_generation(self.generation);
            info!("starting {pattern} (generation {})", self.generation);
            PatternCommand::Start(pattern)
        };

        tokio::select! {
            () = self.cancel.cancelled() => Ok(()),
            res = self.bus.send(command) => res,
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        // Reached with a sparkle only when the dispatcher task itself is aborted.
        if let Some(handle) = self.sparkle.take() {
            handle.abort();
        }
    }
}

async fn wait_sparkle(handle: &mut Option<JoinHandle<Result<Indicators>>>) -> Result<Indicators> {
    match handle {
        Some(handle) => handle.await?,
        None => std::future::pending().await,
    }
}
