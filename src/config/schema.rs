use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub glowd: GlowdConfig,
}

/// Daemon settings. Pins, LED count and timings are fixed by the installation.
#[derive(Debug, Clone, Deserialize)]
pub struct GlowdConfig {
    /// OPC server address, `host:port`.
    #[serde(default = "default_opc_server")]
    pub opc_server: String,

    /// Root of the sysfs GPIO tree.
    #[serde(default = "default_gpio_root")]
    pub gpio_root: PathBuf,

    /// How long shutdown waits for tasks to release their resources.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_ms: u64,
}

impl GlowdConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

impl Default for GlowdConfig {
    fn default() -> Self {
        Self {
            opc_server: default_opc_server(),
            gpio_root: default_gpio_root(),
            shutdown_timeout_ms: default_shutdown_timeout(),
        }
    }
}

// --- Defaults ---

fn default_opc_server() -> String {
    "localhost:7890".to_string()
}

fn default_gpio_root() -> PathBuf {
    PathBuf::from("/sys/class/gpio")
}

fn default_shutdown_timeout() -> u64 {
    5000
}
