//! In-memory GPIO backend for tests and bench runs without hardware.

use super::{Direction, Gpio};
use crate::error::{GlowError, Result};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// A recorded GPIO operation. Reads are not recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Export(u32),
    Unexport(u32),
    Direction(u32, Direction),
    Write(u32, bool),
}

#[derive(Default)]
struct State {
    levels: HashMap<u32, bool>,
    exported: HashSet<u32>,
    failing: HashSet<u32>,
    ops: Vec<Op>,
}

/// GPIO backend whose input levels are set by the caller.
#[derive(Default)]
pub struct MockGpio {
    state: Mutex<State>,
}

impl MockGpio {
    fn state(&self) -> MutexGuard<'_, State> {
        // A poisoned lock only means another test thread panicked.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Drive the level that the next read of `pin` returns.
    pub fn set_level(&self, pin: u32, level: bool) {
        self.state().levels.insert(pin, level);
    }

    pub fn level(&self, pin: u32) -> bool {
        self.state().levels.get(&pin).copied().unwrap_or(false)
    }

    /// Make every direction, read and write on `pin` fail.
    pub fn fail_pin(&self, pin: u32) {
        self.state().failing.insert(pin);
    }

    pub fn is_exported(&self, pin: u32) -> bool {
        self.state().exported.contains(&pin)
    }

    pub fn ops(&self) -> Vec<Op> {
        self.state().ops.clone()
    }

    /// Recorded writes as `(pin, value)` pairs, in order.
    pub fn writes(&self) -> Vec<(u32, bool)> {
        self.state()
            .ops
            .iter()
            .filter_map(|op| match *op {
                Op::Write(pin, value) => Some((pin, value)),
                _ => None,
            })
            .collect()
    }

    fn check(state: &State, pin: u32, op: &'static str) -> Result<()> {
        if state.failing.contains(&pin) {
            return Err(GlowError::Gpio {
                pin,
                op,
                source: std::io::Error::other("injected failure"),
            });
        }
        if !state.exported.contains(&pin) {
            return Err(GlowError::Gpio {
                pin,
                op,
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        Ok(())
    }
}

impl Gpio for MockGpio {
    fn export(&self, pin: u32) -> Result<()> {
        let mut state = self.state();
        state.exported.insert(pin);
        state.ops.push(Op::Export(pin));
        Ok(())
    }

    fn unexport(&self, pin: u32) -> Result<()> {
        let mut state = self.state();
        state.exported.remove(&pin);
        state.ops.push(Op::Unexport(pin));
        Ok(())
    }

    fn set_direction(&self, pin: u32, direction: Direction) -> Result<()> {
        let mut state = self.state();
        Self::check(&state, pin, "set direction")?;
        state.ops.push(Op::Direction(pin, direction));
        Ok(())
    }

    fn read_value(&self, pin: u32) -> Result<bool> {
        let state = self.state();
        Self::check(&state, pin, "read")?;
        Ok(state.levels.get(&pin).copied().unwrap_or(false))
    }

    fn write_value(&self, pin: u32, value: bool) -> Result<()> {
        let mut state = self.state();
        Self::check(&state, pin, "write")?;
        state.levels.insert(pin, value);
        state.ops.push(Op::Write(pin, value));
        Ok(())
    }
}
