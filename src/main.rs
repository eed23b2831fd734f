use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tokio::sync::watch;

use orderstream::orderstream::datasource::{ConsoleSink, FileSource, FileSourceConfig};
use orderstream::orderstream::engine::QueryRegistry;
use orderstream::orderstream::schema::Schema;
use orderstream::orderstream::server::{
    parse_variant, shutdown_signal, AnalyticsConfig, ConfigError, TriggerScheduler,
};

#[derive(Parser)]
#[command(name = "orderstream")]
#[command(about = "Micro-batch streaming analytics over order CSV feeds")]
#[command(version = "0.1.0")]
struct Cli {
    /// CSV schema variant: 1 (orders1 layout) or 2 (orders2/orders3 layout)
    #[arg(default_value = "1")]
    schema_variant: String,

    /// Watched directory (default: ./data/orders1 or ./data/orders2)
    #[arg(long)]
    path: Option<PathBuf>,

    /// Committed-file log location
    #[arg(long)]
    offset_log: Option<PathBuf>,

    /// Trigger interval in milliseconds
    #[arg(long, default_value = "1000")]
    trigger_interval_ms: u64,

    /// Poll retries before a source outage becomes fatal
    #[arg(long, default_value = "5")]
    max_poll_retries: u32,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        error!("{}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let variant = parse_variant(&cli.schema_variant)?;
    if cli.trigger_interval_ms == 0 {
        return Err(Box::new(ConfigError::InvalidTriggerInterval(
            cli.trigger_interval_ms.to_string(),
        )));
    }

    let mut config = AnalyticsConfig::for_variant(variant)
        .with_trigger_interval(Duration::from_millis(cli.trigger_interval_ms))
        .with_max_poll_retries(cli.max_poll_retries);
    if let Some(path) = cli.path {
        config = config.with_data_dir(path);
    }
    if let Some(path) = cli.offset_log {
        config = config.with_offset_log(path);
    }
    let config = config.apply_env()?;

    info!("=======================================================");
    info!("Starting order analytics with schema variant {}", variant);
    info!("Watching directory: {}", config.data_dir.display());
    info!("=======================================================");

    let source_config = FileSourceConfig::new(&config.data_dir, &config.offset_log);
    let mut source = FileSource::new(source_config, Schema::for_variant(variant))?;
    let mut sink = ConsoleSink::new();
    let registry = QueryRegistry::for_variant(variant);
    let mut scheduler = TriggerScheduler::new(registry, &config);

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        let signal = shutdown_signal().await;
        info!("Received {}, stopping after the in-flight trigger", signal);
        let _ = stop_tx.send(true);
    });

    scheduler.run(&mut source, &mut sink, stop_rx).await?;
    info!("Scheduler stopped cleanly");
    Ok(())
}
