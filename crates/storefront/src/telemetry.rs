//! Logging and Sentry setup for binaries embedding the storefront.

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::TelemetryConfig;

/// Initialize Sentry error tracking and return guard that must be kept alive.
///
/// Returns `None` when no DSN is configured.
#[must_use]
pub fn init_sentry(config: &TelemetryConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(std::borrow::Cow::Owned(
                config
                    .sentry_environment
                    .clone()
                    .unwrap_or_else(|| "development".to_string()),
            )),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
#[must_use]
pub fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Install the global tracing subscriber.
///
/// Filtering follows `RUST_LOG`, defaulting to `shopfront=info`. Output is
/// JSON when `config.log_json` is set.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TryInitError> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopfront=info,shopfront_cli=info".into());

    let json = config
        .log_json
        .then(|| tracing_subscriber::fmt::layer().json());
    let text = (!config.log_json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json)
        .with(text)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .try_init()
}

/// Initialize Sentry (first) and then tracing.
///
/// Keep the returned guard alive for the life of the process so buffered
/// Sentry events are flushed on exit.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init(config: &TelemetryConfig) -> Result<Option<sentry::ClientInitGuard>, TryInitError> {
    let guard = init_sentry(config);
    init_tracing(config)?;
    Ok(guard)
}
