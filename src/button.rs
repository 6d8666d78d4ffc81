use std::fmt;

/// A physical push-button on the installation.
///
/// Each button has a sense line (read) and an indicator LED line (written).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Red,
    Blue,
    Green,
}

/// Starts and stops the strip animations.
pub const TOGGLE_BUTTON: Button = Button::Blue;

/// Runs the indicator sparkle sequence.
pub const SPARKLE_BUTTON: Button = Button::Red;

/// Buttons whose sense lines are polled. Green only carries an indicator.
pub const WATCHED_BUTTONS: [Button; 2] = [Button::Red, Button::Blue];

impl Button {
    pub const ALL: [Button; 3] = [Button::Red, Button::Blue, Button::Green];

    /// GPIO pin the button state is read from.
    pub const fn sense_pin(self) -> u32 {
        match self {
            Button::Red => 408,
            Button::Blue => 412,
            Button::Green => 123,
        }
    }

    /// GPIO pin driving the button's own LED.
    pub const fn led_pin(self) -> u32 {
        match self {
            Button::Red => 410,
            Button::Blue => 414,
            Button::Green => 120,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Button::Red => "red",
            Button::Blue => "blue",
            Button::Green => "green",
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
