use std::path::PathBuf;

/// Central error type for glowd.
#[derive(Debug, thiserror::Error)]
pub enum GlowError {
    #[error("config error: {0}")]
    Config(String),

    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("gpio {op} failed on pin {pin}: {source}")]
    Gpio {
        pin: u32,
        op: &'static str,
        source: std::io::Error,
    },

    #[error("gpio pin {pin} returned unexpected value {raw:?}")]
    GpioValue { pin: u32, raw: String },

    #[error("could not connect to OPC server {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    #[error("failed to send frame: {0}")]
    Send(std::io::Error),

    #[error("OPC connection unavailable")]
    NoConnection,

    #[error("pattern bus closed")]
    BusClosed,

    #[error("task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GlowError>;
