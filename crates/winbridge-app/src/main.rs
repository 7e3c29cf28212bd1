mod cli;
mod driver;
mod output;
mod process;

use std::sync::Arc;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;
use winbridge_common::{ConfigError, EventBus};
use winbridge_config::BridgeConfig;
use tokio::sync::{mpsc, watch};
use winbridge_core::{
    to_number, CoordinatorOptions, HeadlessHost, ParameterConfig, ParameterStore, PlayboardRelay,
    WindowContext, WindowCoordinator,
};

use crate::driver::Dispatcher;
use crate::output::ChannelEmitter;
use crate::process::SystemProcess;

fn load_config(args: &cli::Args) -> Result<BridgeConfig, ConfigError> {
    match args.config {
        Some(ref path) => winbridge_config::load_config_from(path),
        None => winbridge_config::load_config(),
    }
}

fn init_logging(directive: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                directive
                    .parse()
                    .or_else(|_| "winbridge=info".parse())
                    .unwrap_or_else(|_| LevelFilter::INFO.into()),
            ),
        )
        .init();
}

fn context_for(args: &cli::Args, config: &BridgeConfig) -> WindowContext {
    let main_label = &config.main_window.label;
    let label = args.label.clone().unwrap_or_else(|| main_label.clone());
    match args.role {
        Some(role) => WindowContext::new(label, role.into()),
        None => WindowContext::resolve(label, main_label),
    }
}

#[tokio::main]
async fn main() {
    let args = cli::parse();

    // Logging needs the config's level, so config load errors are reported after init.
    let loaded = load_config(&args);
    let level = loaded
        .as_ref()
        .map(|c| c.logging.level)
        .unwrap_or_default()
        .as_filter();
    let directive = args
        .log_level
        .clone()
        .unwrap_or_else(|| format!("winbridge={level}"));
    init_logging(&directive);

    tracing::info!("winbridge v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Some(ref path) = args.config {
        tracing::info!("Using config override: {}", path.display());
    }
    let config = loaded.unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        BridgeConfig::default()
    });

    tracing::debug!(config = %winbridge_config::config_to_json(&config), "effective config");

    // One capacity bounds every queue; a full queue makes its producer wait.
    let capacity = config.bus.capacity as usize;
    let host = HeadlessHost::new(EventBus::new(capacity));

    let context = context_for(&args, &config);
    host.open(context.label.clone(), context.role);
    tracing::info!(label = %context.label, role = %context.role, "window context");

    let store = ParameterStore::with_initial(ParameterConfig {
        width: to_number(&config.parameters.width),
        height: to_number(&config.parameters.height),
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(None);
    let (out_tx, out_rx) = mpsc::channel(capacity);
    let (in_tx, in_rx) = mpsc::channel(capacity);
    let (playboard, playboard_rx) = PlayboardRelay::channel(capacity);

    let reporter = output::spawn_reporter(
        tokio::io::stdout(),
        out_rx,
        host.watch_windows(),
        store.subscribe(),
    );
    let _worker = output::spawn_playboard_worker(playboard_rx, out_tx.clone());

    let options = CoordinatorOptions {
        main_label: config.main_window.label.clone(),
        serialize_by_label: config.coordinator.serialize_by_label,
    };
    let coordinator = WindowCoordinator::new(
        context,
        options,
        Arc::new(host.clone()),
        Arc::new(ChannelEmitter::new(out_tx)),
        Arc::new(SystemProcess::new(shutdown_tx)),
    );
    let dispatcher =
        Dispatcher::new(store, coordinator, playboard).spawn(in_rx, shutdown_rx.clone());

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let pump = tokio::spawn(driver::pump(stdin, in_tx));

    // Ends on end of input or on an exit/relaunch request.
    match dispatcher.await {
        Ok(handled) => tracing::info!(envelopes = handled, "dispatcher finished"),
        Err(e) => tracing::error!("dispatcher task failed: {e}"),
    }
    pump.abort();

    // The outbound senders went away with the dispatcher and the playboard
    // worker, so the reporter ends once it has written everything queued.
    match reporter.await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => tracing::error!("stdout write failed: {e}"),
        Err(e) => tracing::error!("reporter task failed: {e}"),
    }

    let request = *shutdown_rx.borrow();
    if let Some(request) = request {
        process::terminate(request);
    }
    tracing::info!("Shutdown complete");
}
