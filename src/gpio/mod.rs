//! GPIO line access.
//!
//! The [`Gpio`] trait is the seam to the hardware. Pins are held through
//! [`InputLine`] and [`OutputLine`], which export and configure the pin on
//! acquisition and unexport it when dropped, on every exit path.

pub mod mock;
pub mod sysfs;

use crate::error::Result;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Pin direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Low-level access to numbered GPIO pins.
pub trait Gpio: Send + Sync {
    fn export(&self, pin: u32) -> Result<()>;
    fn unexport(&self, pin: u32) -> Result<()>;
    fn set_direction(&self, pin: u32, direction: Direction) -> Result<()>;
    fn read_value(&self, pin: u32) -> Result<bool>;
    fn write_value(&self, pin: u32, value: bool) -> Result<()>;
}

/// Exported pin, released on drop.
struct ExportedPin {
    gpio: Arc<dyn Gpio>,
    pin: u32,
}

impl ExportedPin {
    fn acquire(gpio: Arc<dyn Gpio>, pin: u32, direction: Direction) -> Result<Self> {
        gpio.export(pin)?;
        // From here on the guard owns the export, so a direction failure still unexports.
        let exported = Self { gpio, pin };
        exported.gpio.set_direction(pin, direction)?;
        debug!("gpio {pin} exported as {direction}");
        Ok(exported)
    }
}

impl Drop for ExportedPin {
    fn drop(&mut self) {
        debug!("unexporting gpio {}", self.pin);
        if let Err(e) = self.gpio.unexport(self.pin) {
            warn!("failed to unexport gpio {}: {e}", self.pin);
        }
    }
}

/// A pin configured as input.
pub struct InputLine(ExportedPin);

impl InputLine {
    /// Export `pin` and set it to input.
    ///
    /// # Errors
    /// Returns `GlowError::Gpio` if the pin cannot be exported or configured.
    pub fn acquire(gpio: Arc<dyn Gpio>, pin: u32) -> Result<Self> {
        ExportedPin::acquire(gpio, pin, Direction::In).map(Self)
    }

    pub fn pin(&self) -> u32 {
        self.0.pin
    }

    /// Current logical level.
    pub fn read(&self) -> Result<bool> {
        self.0.gpio.read_value(self.0.pin)
    }
}

/// A pin configured as output.
pub struct OutputLine(ExportedPin);

impl OutputLine {
    /// Export `pin` and set it to output.
    ///
    /// # Errors
    /// Returns `GlowError::Gpio` if the pin cannot be exported or configured.
    pub fn acquire(gpio: Arc<dyn Gpio>, pin: u32) -> Result<Self> {
        ExportedPin::acquire(gpio, pin, Direction::Out).map(Self)
    }

    pub fn pin(&self) -> u32 {
        self.0.pin
    }

    pub fn write(&mut self, value: bool) -> Result<()> {
        self.0.gpio.write_value(self.0.pin, value)
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{MockGpio, Op};
    use super::*;

    #[test]
    fn input_line_unexports_on_drop() {
        let gpio = Arc::new(MockGpio::default());
        {
            let line = InputLine::acquire(gpio.clone(), 7).unwrap();
            gpio.set_level(7, true);
            assert!(line.read().unwrap());
        }
        assert_eq!(
            gpio.ops(),
            vec![
                Op::Export(7),
                Op::Direction(7, Direction::In),
                Op::Unexport(7)
            ]
        );
        assert!(!gpio.is_exported(7));
    }

    #[test]
    fn failed_direction_still_unexports() {
        let gpio = Arc::new(MockGpio::default());
        gpio.fail_pin(9);
        assert!(OutputLine::acquire(gpio.clone(), 9).is_err());
        assert!(!gpio.is_exported(9));
    }

    #[test]
    fn output_line_writes_value() {
        let gpio = Arc::new(MockGpio::default());
        let mut line = OutputLine::acquire(gpio.clone(), 3).unwrap();
        assert_eq!(line.pin(), 3);
        line.write(true).unwrap();
        assert!(gpio.level(line.pin()));
        line.write(false).unwrap();
        assert!(!gpio.level(line.pin()));
    }
}
