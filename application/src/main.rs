use std::{future::IntoFuture as _, io, sync::OnceLock};

use application::{args::Command, seed, Args, Config, Service};
use futures::TryFutureExt as _;
use service::{domain::charge, infra::Memory, query::ComputeCharges, Query as _};
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    layer::{Layer as _, SubscriberExt as _},
    util::SubscriberInitExt as _,
};

const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stdout)
                .with_filter(filter_fn(|meta| {
                    meta.is_span()
                        || (!STDERR_LEVELS.contains(meta.level()))
                            && enabled(meta.level())
                })),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stderr)
                .with_filter(filter_fn(|meta| {
                    meta.is_span()
                        || (STDERR_LEVELS.contains(meta.level()))
                            && enabled(meta.level())
                })),
        )
        .init();

    if start().await.is_err() {
        std::process::exit(1);
    }
}

/// Checks whether events of the provided `level` pass the configured one.
fn enabled(level: &log::Level) -> bool {
    LOG_LEVEL.get().copied().unwrap_or(log::Level::INFO) >= *level
}

async fn start() -> Result<(), ()> {
    let Args { config, command } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config { service, log } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    let settings_seed = service.settings_seed.clone();
    let (service, background) = Service::new(service.into(), Memory::new());

    if let Some(path) = settings_seed {
        let count = seed::settings(&service, &path).await.map_err(|e| {
            log::error!("failed to seed settings from `{path}`: {e}");
        })?;
        log::info!("seeded {count} settings from `{path}`");
    }

    match command {
        Command::Compute { context } => {
            let raw = std::fs::read_to_string(&context).map_err(|e| {
                log::error!("failed to read `{}`: {e}", context.display());
            })?;
            let ctx: charge::Context =
                serde_json::from_str(&raw).map_err(|e| {
                    log::error!("failed to parse `{}`: {e}", context.display());
                })?;

            let charges =
                service.execute(ComputeCharges(ctx)).await.map_err(|e| {
                    log::error!("failed to compute charges: {e}");
                })?;

            let out = serde_json::to_string_pretty(&charges).map_err(|e| {
                log::error!("failed to serialize charges: {e}");
            })?;
            println!("{out}");
            Ok(())
        }
        Command::Run => {
            log::info!("running background tasks");
            background
                .into_future()
                .map_err(|e| log::error!("background task failed: {e}"))
                .await
        }
    }
}
