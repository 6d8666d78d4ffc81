#![allow(
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::ignored_unit_patterns
)]

pub mod bus;
pub mod button;
pub mod color;
pub mod config;
pub mod daemon;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod gpio;
pub mod opc;
pub mod render;
pub mod sparkle;
pub mod watcher;
