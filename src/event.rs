use std::fmt;

/// Strip animations the renderer can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Pattern 1: palette color wipe.
    Wipe,
    /// Pattern 2: solid palette color cycle.
    SolidCycle,
}

impl Pattern {
    /// Odd activations run the wipe, even ones the solid cycle.
    pub const fn for_generation(generation: u64) -> Self {
        if generation % 2 == 1 {
            Pattern::Wipe
        } else {
            Pattern::SolidCycle
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Wipe => f.write_str("pattern 1 (wipe)"),
            Pattern::SolidCycle => f.write_str("pattern 2 (solid cycle)"),
        }
    }
}

/// Commands carried on the pattern bus from the dispatcher to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternCommand {
    /// Stop the running animation and clear the strip.
    Stop,
    /// Start an animation.
    Start(Pattern),
}
