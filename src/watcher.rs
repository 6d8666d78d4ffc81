use crate::button::Button;
use crate::error::Result;
use crate::gpio::{Gpio, InputLine};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How often a sense line is sampled.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Pending presses the event channel can hold before presses are dropped.
pub const EVENT_CAPACITY: usize = 100;

/// Falling-edge detector over periodic samples.
///
/// A high sample arms it; the next low sample fires once and disarms it.
/// There is no minimum press duration.
#[derive(Debug, Default)]
pub struct EdgeDetector {
    pressed: bool,
}

impl EdgeDetector {
    /// Feed one sample. Returns `true` when a press-release cycle completes.
    pub fn sample(&mut self, level: bool) -> bool {
        if level {
            self.pressed = true;
            false
        } else if self.pressed {
            self.pressed = false;
            true
        } else {
            false
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}

/// Polls one button's sense line and emits a press per release.
pub struct ButtonWatcher {
    button: Button,
    gpio: Arc<dyn Gpio>,
    tx: mpsc::Sender<Button>,
}

impl ButtonWatcher {
    pub fn new(button: Button, gpio: Arc<dyn Gpio>, tx: mpsc::Sender<Button>) -> Self {
        Self { button, gpio, tx }
    }

    /// Poll until cancelled. The sense line is unexported on every exit path.
    ///
    /// # Errors
    /// Returns `GlowError::Gpio` if the line cannot be exported or read.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let line = InputLine::acquire(self.gpio.clone(), self.button.sense_pin())?;
        info!("watching {} button on gpio {}", self.button, line.pin());

        let mut edges = EdgeDetector::default();
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("{} button watcher shutting down", self.button);
                    return Ok(());
                }
                _ = ticker.tick() => {}
            }

            if edges.sample(line.read()?) && !self.emit() {
                return Ok(());
            }
        }
    }

    /// Queue a press without blocking. Returns `false` once nobody is listening.
    fn emit(&self) -> bool {
        debug!("{} button released", self.button);
        match self.tx.try_send(self.button) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("event queue full, dropping {} press", self.button);
                true
            }
            Err(TrySendError::Closed(_)) => {
                debug!("event queue closed, stopping {} watcher", self.button);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::mock::MockGpio;

    fn count_presses(samples: &[u8]) -> usize {
        let mut edges = EdgeDetector::default();
        samples.iter().filter(|&&s| edges.sample(s == 1)).count()
    }

    #[test]
    fn one_press_per_release() {
        assert_eq!(count_presses(&[0, 1, 1, 1, 0, 0]), 1);
        assert_eq!(count_presses(&[1, 0, 1, 0, 1, 0]), 3);
        assert_eq!(count_presses(&[0, 1, 0, 0, 1, 1, 0, 1]), 2);
    }

    #[test]
    fn steady_levels_never_fire() {
        assert_eq!(count_presses(&[1; 50]), 0);
        assert_eq!(count_presses(&[0; 50]), 0);
    }

    #[test]
    fn held_button_stays_armed() {
        let mut edges = EdgeDetector::default();
        assert!(!edges.sample(true));
        assert!(edges.is_pressed());
        assert!(edges.sample(false));
        assert!(!edges.is_pressed());
    }

    #[tokio::test(start_paused = true)]
    async fn watcher_emits_on_release_and_unexports() {
        let gpio = Arc::new(MockGpio::default());
        let (tx, mut rx) = mpsc::channel(EVENT_CAPACITY);
        let cancel = CancellationToken::new();
        let pin = Button::Blue.sense_pin();

        let watcher = ButtonWatcher::new(Button::Blue, gpio.clone(), tx);
        let handle = tokio::spawn(watcher.run(cancel.clone()));

        tokio::time::sleep(Duration::from_millis(25)).await;
        assert!(rx.try_recv().is_err());

        gpio.set_level(pin, true);
        tokio::time::sleep(Duration::from_millis(57)).await;
        assert!(rx.try_recv().is_err(), "held button must not fire");

        gpio.set_level(pin, false);
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert_eq!(rx.try_recv().unwrap(), Button::Blue);
        assert!(rx.try_recv().is_err());

        cancel.cancel();
        handle.await.unwrap().unwrap();
        assert!(!gpio.is_exported(pin));
    }

    #[tokio::test(start_paused = true)]
    async fn full_queue_drops_presses_and_keeps_polling() {
        let gpio = Arc::new(MockGpio::default());
        let (tx, mut rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let pin = Button::Red.sense_pin();

        let watcher = ButtonWatcher::new(Button::Red, gpio.clone(), tx);
        let handle = tokio::spawn(watcher.run(cancel.clone()));

        for _ in 0..3 {
            gpio.set_level(pin, true);
            tokio::time::sleep(Duration::from_millis(25)).await;
            gpio.set_level(pin, false);
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        assert!(!handle.is_finished());

        assert_eq!(rx.try_recv().unwrap(), Button::Red);
        assert!(rx.try_recv().is_err());

        // Polling continued while the queue was full.
        gpio.set_level(pin, true);
        tokio::time::sleep(Duration::from_millis(25)).await;
        gpio.set_level(pin, false);
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert_eq!(rx.try_recv().unwrap(), Button::Red);

        cancel.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn read_failure_is_fatal_and_releases_line() {
        let gpio = Arc::new(MockGpio::default());
        let (tx, _rx) = mpsc::channel(EVENT_CAPACITY);
        let pin = Button::Red.sense_pin();

        let watcher = ButtonWatcher::new(Button::Red, gpio.clone(), tx);
        let handle = tokio::spawn(watcher.run(CancellationToken::new()));
        tokio::time::sleep(Duration::from_millis(15)).await;
        gpio.fail_pin(pin);

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, crate::error::GlowError::Gpio { op: "read", .. }));
        assert!(!gpio.is_exported(pin));
    }
}
