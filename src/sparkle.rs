use crate::button::Button;
use crate::error::Result;
use crate::gpio::{Gpio, OutputLine};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub const SPARKLE_CYCLES: usize = 22;
pub const SPARKLE_STEP: Duration = Duration::from_millis(500);

/// Which indicator is lit on each step of a cycle.
const SPARKLE_ORDER: [Button; 3] = [Button::Blue, Button::Green, Button::Red];

/// The indicator LEDs of all buttons.
///
/// Whoever holds this value is the only writer of the indicators.
pub struct Indicators {
    red: OutputLine,
    blue: OutputLine,
    green: OutputLine,
}

impl Indicators {
    /// Export every indicator pin as an output.
    ///
    /// # Errors
    /// Returns `GlowError::Gpio` if any pin cannot be set up. Pins already
    /// acquired are released.
    pub fn acquire(gpio: &Arc<dyn Gpio>) -> Result<Self> {
        let indicators = Self {
            red: OutputLine::acquire(gpio.clone(), Button::Red.led_pin())?,
            blue: OutputLine::acquire(gpio.clone(), Button::Blue.led_pin())?,
            green: OutputLine::acquire(gpio.clone(), Button::Green.led_pin())?,
        };
        info!("indicator LEDs ready");
        Ok(indicators)
    }

    fn line_mut(&mut self, button: Button) -> &mut OutputLine {
        match button {
            Button::Red => &mut self.red,
            Button::Blue => &mut self.blue,
            Button::Green => &mut self.green,
        }
    }

    /// Light `lit` and switch the other two off.
    pub fn light_only(&mut self, lit: Button) -> Result<()> {
        for button in SPARKLE_ORDER {
            self.line_mut(button).write(button == lit)?;
        }
        Ok(())
    }
}

/// Rotate the lit indicator blue, green, red for [`SPARKLE_CYCLES`] cycles.
///
/// Hands the indicators back when finished or cancelled.
///
/// # Errors
/// Returns `GlowError::Gpio` if an indicator write fails.
pub async fn run_sparkle(mut indicators: Indicators, cancel: CancellationToken) -> Result<Indicators> {
    info!("sparkle started");
    for _ in 0..SPARKLE_CYCLES {
        for lit in SPARKLE_ORDER {
            indicators.light_only(lit)?;
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("sparkle cancelled");
                    return Ok(indicators);
                }
                () = tokio::time::sleep(SPARKLE_STEP) => {}
            }
        }
    }
    info!("sparkle finished");
    Ok(indicators)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::mock::MockGpio;
    use tokio::time::Instant;

    fn setup() -> (Arc<MockGpio>, Indicators) {
        let mock = Arc::new(MockGpio::default());
        let gpio: Arc<dyn Gpio> = mock.clone();
        let indicators = Indicators::acquire(&gpio).unwrap();
        (mock, indicators)
    }

    #[tokio::test(start_paused = true)]
    async fn full_sequence_has_66_steps() {
        let (mock, indicators) = setup();
        let start = Instant::now();

        run_sparkle(indicators, CancellationToken::new()).await.unwrap();

        let elapsed = start.elapsed();
        assert!(elapsed >= SPARKLE_STEP * 66);
        assert!(elapsed < SPARKLE_STEP * 67);
        let writes = mock.writes();
        assert_eq!(writes.len(), 66 * 3);
        for (step, chunk) in writes.chunks(3).enumerate() {
            let lit: Vec<u32> = chunk.iter().filter(|w| w.1).map(|w| w.0).collect();
            assert_eq!(lit, vec![SPARKLE_ORDER[step % 3].led_pin()]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn steps_are_spaced_500ms() {
        let (mock, indicators) = setup();
        let handle = tokio::spawn(run_sparkle(indicators, CancellationToken::new()));

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(mock.writes().len(), 3);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(mock.writes().len(), 6);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_returns_indicators() {
        let (mock, indicators) = setup();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_sparkle(indicators, cancel.clone()));

        tokio::time::sleep(Duration::from_millis(1200)).await;
        cancel.cancel();
        let indicators = handle.await.unwrap().unwrap();
        assert_eq!(mock.writes().len(), 9);

        drop(indicators);
        for button in Button::ALL {
            assert!(!mock.is_exported(button.led_pin()));
        }
    }
}
