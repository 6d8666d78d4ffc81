use clap::Parser;
use glowd::button::WATCHED_BUTTONS;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// glowd — button-driven LED strip daemon
#[derive(Parser)]
#[command(name = "glowd", version, about)]
struct Cli {
    /// Path to the config file (TOML).
    #[arg(short, long, default_value = "/etc/glowd/config.toml")]
    config: PathBuf,

    /// Override the OPC server address (host:port).
    #[arg(short, long)]
    server: Option<String>,

    /// Enable JSON log output (for journald).
    #[arg(long)]
    json: bool,

    /// Validate config and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Init tracing.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("glowd=info"));

    if cli.json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt().with_env_filter(filter).init();
    }

    info!("glowd v{}", env!("CARGO_PKG_VERSION"));

    let mut config = glowd::config::load(&cli.config)?;
    if let Some(server) = cli.server {
        config.glowd.opc_server = server;
        glowd::config::validate(&config)?;
    }

    if cli.check {
        let watched: Vec<&str> = WATCHED_BUTTONS.iter().map(|b| b.name()).collect();
        println!(
            "config OK: OPC server {}, GPIO root {}, watching {} buttons",
            config.glowd.opc_server,
            config.glowd.gpio_root.display(),
            watched.join(" and "),
        );
        return Ok(());
    }

    glowd::daemon::run(config).await?;

    Ok(())
}
