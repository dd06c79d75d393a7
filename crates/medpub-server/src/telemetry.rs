//! Subscriber setup: `EnvFilter` plus a plain or JSON fmt layer, with `log`
//! records from the library forwarded into `tracing`.

use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

use medpub::config::LoggingConfig;

use crate::error::StartupError;

const DEFAULT_FILTER: &str = "medpub=info,medpub_server=info,tower_http=info";

fn filter(logging: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = logging.level.as_deref().unwrap_or(DEFAULT_FILTER);
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    })
}

pub fn init(logging: &LoggingConfig) -> Result<(), StartupError> {
    let output: Box<dyn Layer<Registry> + Send + Sync> = if logging.json {
        fmt::layer().json().with_current_span(true).boxed()
    } else {
        fmt::layer().boxed()
    };
    let subscriber = Registry::default().with(output).with(filter(logging));

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| StartupError::Telemetry(e.to_string()))?;
    tracing_log::LogTracer::init().map_err(|e| StartupError::Telemetry(e.to_string()))?;
    Ok(())
}
