//! Pattern 2: hold each palette color on the whole strip in turn.

use crate::color::{palette_color, Rgb, PALETTE};
use crate::error::Result;
use crate::opc::{Frame, OpcClient, LED_COUNT};
use std::time::Duration;
use tokio::io::AsyncWrite;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Delay from the start of a color step to its frame.
pub const LEAD_IN: Duration = Duration::from_millis(200);

/// Length of one color step, lead-in included.
pub const SOLID_TICK: Duration = Duration::from_millis(1800);

/// Gap between the two clear frames sent on stop.
pub const SETTLE: Duration = Duration::from_millis(10);

pub fn solid_frame(color: Rgb) -> Frame {
    [color; LED_COUNT]
}

/// Run the solid cycle until `stop` fires, then clear the strip and hand the client back.
///
/// # Errors
/// Returns `GlowError::Send` if a frame cannot be written.
pub async fn run<W>(mut client: OpcClient<W>, stop: CancellationToken) -> Result<OpcClient<W>>
where
    W: AsyncWrite + Unpin,
{
    info!("solid cycle started");
    // The controller mistimes the first frame unless the strip starts dark.
    client.clear().await?;

    let mut index = 0;
    loop {
        let step_start = Instant::now();
        let color = palette_color(index);

        tokio::select! {
            biased;
            () = stop.cancelled() => return finish(client).await,
            () = tokio::time::sleep_until(step_start + LEAD_IN) => {}
        }
        debug!("solid color {color:?} (palette index {index})");
        client.send_pixels(&solid_frame(color)).await?;

        tokio::select! {
            biased;
            () = stop.cancelled() => return finish(client).await,
            () = tokio::time::sleep_until(step_start + SOLID_TICK) => {}
        }
        index = (index + 1) % PALETTE.len();
    }
}

/// Clear twice; a single clear is sometimes swallowed by the controller's frame buffering.
async fn finish<W>(mut client: OpcClient<W>) -> Result<OpcClient<W>>
where
    W: AsyncWrite + Unpin,
{
    client.clear().await?;
    tokio::time::sleep(SETTLE).await;
    client.clear().await?;
    info!("solid cycle stopped");
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::BLACK;
    use crate::opc::{decode_all, Message};

    fn is_solid(frame: &[Rgb], color: Rgb) -> bool {
        frame.len() == LED_COUNT && frame.iter().all(|&c| c == color)
    }

    async fn run_for(ms: u64) -> Vec<Vec<Rgb>> {
        let stop = CancellationToken::new();
        let handle = tokio::spawn(run(OpcClient::new(Vec::<u8>::new()), stop.clone()));
        tokio::time::sleep(Duration::from_millis(ms)).await;
        stop.cancel();
        let client = handle.await.unwrap().unwrap();
        decode_all(client.get_ref())
            .iter()
            .map(Message::pixels)
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn one_frame_per_palette_entry_then_double_clear() {
        let frames = run_for(10_900).await;
        assert_eq!(frames.len(), 1 + PALETTE.len() + 2);
        assert!(is_solid(&frames[0], BLACK));
        for (i, color) in PALETTE.iter().enumerate() {
            assert!(is_solid(&frames[i + 1], *color), "frame {i}");
        }
        assert!(is_solid(&frames[7], BLACK));
        assert!(is_solid(&frames[8], BLACK));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_while_holding_color() {
        let stop = CancellationToken::new();
        let handle = tokio::spawn(run(OpcClient::new(Vec::<u8>::new()), stop.clone()));
        tokio::time::sleep(Duration::from_millis(1000)).await;

        let stopped_at = Instant::now();
        stop.cancel();
        let client = handle.await.unwrap().unwrap();
        let settle = stopped_at.elapsed();
        assert!(settle >= SETTLE, "clears {settle:?} apart");
        assert!(settle < SETTLE * 2, "clears {settle:?} apart");

        let frames: Vec<Vec<Rgb>> = decode_all(client.get_ref())
            .iter()
            .map(Message::pixels)
            .collect();
        assert_eq!(frames.len(), 4);
        assert!(is_solid(&frames[1], PALETTE[0]));
        assert!(is_solid(&frames[3], BLACK));
    }

    #[tokio::test(start_paused = true)]
    async fn colors_wrap_after_full_cycle() {
        let frames = run_for(11_100).await;
        assert_eq!(frames.len(), 1 + PALETTE.len() + 1 + 2);
        assert!(is_solid(&frames[7], PALETTE[0]));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_lead_in_sends_no_color() {
        let frames = run_for(100).await;
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| is_solid(f, BLACK)));
    }
}
