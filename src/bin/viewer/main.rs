use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use service_history::client::{HistorySource, ReqwestHistorySource};
use service_history::controller::{Controller, LoadOutcome, Trigger};
use service_history::html::render_table;
use service_history::page::{Page, PageHandle};
use service_history::{load_config, server, Config};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => {
            tracing::debug!("Loading configuration from {:?}", path);
            load_config(path)?
        }
        None => Config::default(),
    };
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }

    let source: Arc<dyn HistorySource> = Arc::new(ReqwestHistorySource::new(
        config.endpoint.clone(),
        config.request_timeout(),
    )?);

    match cli.command {
        Command::Serve { address, service } => {
            if let Some(address) = address {
                config.address = address;
            }
            if let Some(service) = service {
                config.page.service = service;
            }
            serve(config, source).await
        }
        Command::Render {
            service,
            from_tick,
            to_tick,
            current,
        } => {
            config.page.service = service;
            apply_tick_range(&mut config, from_tick, to_tick);
            let trigger = if current {
                Trigger::LoadCurrent
            } else {
                Trigger::PageLoad
            };
            render_once(config, source, trigger).await
        }
    }
}

/// Maps `[from_tick, to_tick)` onto the page's inclusive range inputs.
fn apply_tick_range(config: &mut Config, from_tick: i64, to_tick: Option<i64>) {
    config.page.min_tick = from_tick;
    if let Some(to_tick) = to_tick {
        config.page.max_tick = to_tick.saturating_sub(1);
    }
}

async fn serve(
    config: Config,
    source: Arc<dyn HistorySource>,
) -> Result<(), Box<dyn std::error::Error>> {
    let page = PageHandle::spawn(Page::new(&config.page));
    let controller = Arc::new(Controller::from_config(&config, source, page));

    tokio::spawn({
        let controller = Arc::clone(&controller);
        async move {
            let outcome = controller.load(Trigger::PageLoad).await;
            tracing::debug!("Initial load: {:?}", outcome);
        }
    });

    let app = server::build_router(controller);

    info!("Binding to {}", config.address);
    let listener = tokio::net::TcpListener::bind(&config.address).await?;
    info!("Serving history page for {}", config.endpoint);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}

async fn render_once(
    config: Config,
    source: Arc<dyn HistorySource>,
    trigger: Trigger,
) -> Result<(), Box<dyn std::error::Error>> {
    let page = PageHandle::spawn(Page::new(&config.page));
    let controller = Controller::from_config(&config, source, page);

    match controller.load(trigger).await {
        LoadOutcome::Applied { .. } => {}
        outcome => return Err(format!("Nothing to render: {:?}", outcome).into()),
    }

    let table = controller
        .page()
        .inspect(|page: &Page| page.table.as_ref().map(render_table))
        .await?;
    if let Some(table) = table {
        println!("{table}");
    }
    Ok(())
}

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Path to a JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// URL of the service-history.json endpoint (overrides config file)
    #[arg(short, long, global = true)]
    endpoint: Option<String>,

    /// Log level
    #[arg(short, long, global = true, default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the history page
    Serve {
        /// Listening address (overrides config file)
        #[arg(short, long)]
        address: Option<String>,

        /// Service shown on startup (overrides config file)
        #[arg(short, long)]
        service: Option<String>,
    },
    /// Fetch one history and print it as an HTML table
    Render {
        /// Service slug
        #[arg(short, long)]
        service: String,

        /// First tick to show
        #[arg(long, default_value_t = 0)]
        from_tick: i64,

        /// Tick after the last one to show
        #[arg(long, conflicts_with = "current")]
        to_tick: Option<i64>,

        /// Show everything up to the server's current tick
        #[arg(long)]
        current: bool,
    },
}
