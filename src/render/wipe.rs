//! Pattern 1: wipe each palette color over the previous one, one LED per tick.

use crate::color::{palette_color, Rgb, BLACK, PALETTE};
use crate::error::Result;
use crate::opc::{Frame, OpcClient, LED_COUNT};
use std::time::Duration;
use tokio::io::AsyncWrite;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub const WIPE_TICK: Duration = Duration::from_millis(10);

/// Frame `step` of a wipe: LEDs `[0, step)` show `new`, the rest `old`.
pub fn wipe_frame(step: usize, new: Rgb, old: Rgb) -> Frame {
    let mut frame = [old; LED_COUNT];
    frame[..step.min(LED_COUNT)].fill(new);
    frame
}

#[derive(Debug)]
struct WipeState {
    index: usize,
    current: Rgb,
    previous: Rgb,
}

impl WipeState {
    fn new() -> Self {
        Self {
            index: 0,
            current: palette_color(0),
            previous: BLACK,
        }
    }

    fn advance(&mut self) {
        self.previous = self.current;
        self.index = (self.index + 1) % PALETTE.len();
        self.current = palette_color(self.index);
    }
}

/// Run the wipe until `stop` fires, then clear the strip and hand the client back.
///
/// # Errors
/// Returns `GlowError::Send` if a frame cannot be written.
pub async fn run<W>(mut client: OpcClient<W>, stop: CancellationToken) -> Result<OpcClient<W>>
where
    W: AsyncWrite + Unpin,
{
    info!("wipe started");
    let mut state = WipeState::new();
    let mut ticker = tokio::time::interval_at(Instant::now() + WIPE_TICK, WIPE_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        debug!(
            "wiping {:?} over {:?} (palette index {})",
            state.current, state.previous, state.index
        );
        for step in 0..LED_COUNT {
            tokio::select! {
                biased;
                () = stop.cancelled() => {
                    client.clear().await?;
                    info!("wipe stopped");
                    return Ok(client);
                }
                _ = ticker.tick() => {}
            }
            client
                .send_pixels(&wipe_frame(step, state.current, state.previous))
                .await?;
        }
        state.advance();
    }
}
