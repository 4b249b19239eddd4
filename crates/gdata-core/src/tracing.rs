//! Subscriber setup for applications embedding the GData crates.
//!
//! The library crates only emit `tracing` events; nothing is printed unless
//! the host installs a subscriber, for instance with [`init_tracing`].

use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter used when neither an explicit directive nor `RUST_LOG` is set.
pub const DEFAULT_DIRECTIVE: &str = "gdata=warn";

#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("failed to parse env filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// Builds the filter: `directive` if given, else `RUST_LOG`, else
/// [`DEFAULT_DIRECTIVE`].
pub fn env_filter(directive: Option<&str>) -> Result<EnvFilter, TracingError> {
    match directive {
        Some(directive) => Ok(EnvFilter::try_new(directive)?),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))),
    }
}

/// Installs a global compact subscriber filtered by [`env_filter`].
///
/// # Errors
///
/// Fails if a global subscriber is already set or `directive` is invalid.
pub fn init_tracing(directive: Option<&str>) -> Result<(), TracingError> {
    let filter = env_filter(directive)?;
    let layer = fmt::layer().compact().with_target(true);
    tracing::subscriber::set_global_default(tracing_subscriber::registry().with(filter).with(layer))?;
    Ok(())
}
