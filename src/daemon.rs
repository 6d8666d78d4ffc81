use crate::bus;
use crate::button::{SPARKLE_BUTTON, TOGGLE_BUTTON, WATCHED_BUTTONS};
use crate::config::schema::AppConfig;
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::gpio::sysfs::SysfsGpio;
use crate::gpio::Gpio;
use crate::opc::OpcClient;
use crate::render::Renderer;
use crate::sparkle::Indicators;
use crate::watcher::{ButtonWatcher, EVENT_CAPACITY};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Run the glowd daemon against the real GPIO tree and OPC server.
///
/// # Errors
/// Returns `GlowError` if the OPC server is unreachable or any task fails.
pub async fn run(config: AppConfig) -> Result<()> {
    let gpio: Arc<dyn Gpio> = Arc::new(SysfsGpio::new(&config.glowd.gpio_root));
    let client = OpcClient::connect(&config.glowd.opc_server).await?;
    run_with(
        gpio,
        client,
        config.glowd.shutdown_timeout(),
        shutdown_signal(),
    )
    .await
}

/// Run every task until `shutdown` resolves or one of them fails.
///
/// On the way out all tasks are cancelled and given `shutdown_timeout` to
/// clear the strip and unexport their pins.
///
/// # Errors
/// Returns the first error reported by a task.
pub async fn run_with<W, S>(
    gpio: Arc<dyn Gpio>,
    client: OpcClient<W>,
    shutdown_timeout: Duration,
    shutdown: S,
) -> Result<()>
where
    W: AsyncWrite + Unpin + Send + 'static,
    S: Future<Output = ()>,
{
    let cancel = CancellationToken::new();
    let indicators = Indicators::acquire(&gpio)?;
    let (events_tx, events_rx) = mpsc::channel(EVENT_CAPACITY);
    let (pattern_bus, bus_rx) = bus::channel();

    let mut tasks = JoinSet::new();
    tasks.spawn(Renderer::new(client).run(bus_rx, cancel.clone()));
    tasks.spawn(Dispatcher::new(pattern_bus, indicators, cancel.clone()).run(events_rx));
    for button in WATCHED_BUTTONS {
        let watcher = ButtonWatcher::new(button, gpio.clone(), events_tx.clone());
        tasks.spawn(watcher.run(cancel.clone()));
    }
    drop(events_tx);

    info!("glowd running, toggle: {TOGGLE_BUTTON}, sparkle: {SPARKLE_BUTTON}");

    tokio::pin!(shutdown);
    let mut outcome = Ok(());
    loop {
        tokio::select! {
            () = &mut shutdown => {
                info!("shutdown requested");
                break;
            }
            joined = tasks.join_next() => match joined {
                None => break,
                Some(Ok(Ok(()))) => {
                    warn!("task exited unexpectedly, shutting down");
                    break;
                }
                Some(Ok(Err(e))) => {
                    error!("fatal: {e}");
                    outcome = Err(e);
                    break;
                }
                Some(Err(e)) => {
                    error!("task panicked: {e}");
                    outcome = Err(e.into());
                    break;
                }
            },
        }
    }

    info!("daemon shutting down...");
    cancel.cancel();

    let drained = tokio::time::timeout(shutdown_timeout, async {
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("task failed during shutdown: {e}"),
                Err(e) => warn!("task panicked during shutdown: {e}"),
            }
        }
    })
    .await;

    if drained.is_err() {
        warn!("tasks still running after {shutdown_timeout:?}, aborting");
        tasks.abort_all();
    }

    info!("daemon stopped");
    outcome
}

/// Resolve on SIGINT, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for SIGINT: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => info!("received SIGINT"),
        () = terminate => info!("received SIGTERM"),
    }
}
