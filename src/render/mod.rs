//! The LED renderer: owns the OPC connection and runs one animation at a time.
//!
//! The connection is moved into the running animation task and moved back
//! when that task stops, so only one task ever writes to it.

pub mod solid;
pub mod wipe;

use crate::bus::BusReceiver;
use crate::error::{GlowError, Result};
use crate::event::{Pattern, PatternCommand};
use crate::opc::OpcClient;
use tokio::io::AsyncWrite;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

struct Animation<W> {
    pattern: Pattern,
    stop: CancellationToken,
    handle: JoinHandle<Result<OpcClient<W>>>,
}

pub struct Renderer<W> {
    client: Option<OpcClient<W>>,
    active: Option<Animation<W>>,
}

impl<W> Renderer<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(client: OpcClient<W>) -> Self {
        Self {
            client: Some(client),
            active: None,
        }
    }

    /// Handle bus commands until cancelled or the dispatcher goes away.
    ///
    /// A running animation is stopped (strip cleared) before returning, and
    /// the connection is closed when the renderer drops.
    ///
    /// # Errors
    /// Returns `GlowError::Send` if an animation fails to write a frame.
    pub async fn run(mut self, mut bus: BusReceiver, cancel: CancellationToken) -> Result<()> {
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                finished = wait_animation(&mut self.active) => {
                    // Animations only end on their own when they fail.
                    self.active = None;
                    self.client = Some(finished?);
                    warn!("animation ended without a stop request");
                }
                request = bus.recv() => {
                    let Some(request) = request else {
                        debug!("pattern bus closed");
                        break;
                    };
                    debug!("bus command: {:?}", request.command);
                    self.handle(request.command).await?;
                    request.accept();
                }
            }
        }

        self.stop_active().await?;
        info!("renderer stopped");
        Ok(())
    }

    async fn handle(&mut self, command: PatternCommand) -> Result<()> {
        match command {
            PatternCommand::Stop => {
                if self.active.is_none() {
                    warn!("stop requested with no animation running");
                }
                self.stop_active().await
            }
            PatternCommand::Start(pattern) => {
                if let Some(active) = &self.active {
                    warn!(
                        "{pattern} requested while {} is running, stopping it first",
                        active.pattern
                    );
                    self.stop_active().await?;
                }
                self.start(pattern)
            }
        }
    }

    fn start(&mut self, pattern: Pattern) -> Result<()> {
        let client = self.client.take().ok_or(GlowError::NoConnection)?;
        let stop = CancellationToken::new();
        info!("starting {pattern}");
        let handle = match pattern {
            Pattern::Wipe => tokio::spawn(wipe::run(client, stop.clone())),
            Pattern::SolidCycle => tokio::spawn(solid::run(client, stop.clone())),
        };
        self.active = Some(Animation {
            pattern,
            stop,
            handle,
        });
        Ok(())
    }

    /// Signal the running animation and wait until it has cleared the strip.
    async fn stop_active(&mut self) -> Result<()> {
        let Some(animation) = self.active.take() else {
            return Ok(());
        };
        info!("stopping {}", animation.pattern);
        animation.stop.cancel();
        self.client = Some(animation.handle.await??);
        debug!("{} stopped", animation.pattern);
        Ok(())
    }
}

impl<W> Drop for Renderer<W> {
    fn drop(&mut self) {
        // Reached without a stop only when the renderer task itself is aborted.
        if let Some(animation) = self.active.take() {
            animation.handle.abort();
        }
    }
}

async fn wait_animation<W>(active: &mut Option<Animation<W>>) -> Result<OpcClient<W>> {
    match active {
        Some(animation) => (&mut animation.handle).await?,
        None => std::future::pending().await,
    }
}
