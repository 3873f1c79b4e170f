use std::str::FromStr;

use tracing_subscriber::{
    filter::ParseError,
    fmt::format::FmtSpan,
    prelude::*,
    EnvFilter,
};

pub const DEFAULT_LEVEL_STR: &str = {
    cfg_if::cfg_if! {
        if #[cfg(not(debug_assertions))] {
            "warn,leash=info"
        } else {
            "info,leash=debug,leash_runtime=debug"
        }
    }
};

/// Installs the global subscriber. `RUST_LOG` overrides [`DEFAULT_LEVEL_STR`].
pub fn init() -> eyre::Result<()> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE);

    let stderr_layer = {
        cfg_if::cfg_if! {
            if #[cfg(debug_assertions)] {
                stderr_layer.pretty()
            } else {
                stderr_layer.json()
            }
        }
    };

    let level_filter = mk_level_filter()?;
    bootstrap!("enabling tracing with filter directive: {}", level_filter);

    tracing_subscriber::registry().with(level_filter).with(stderr_layer).try_init()?;

    Ok(())
}

fn mk_level_filter() -> Result<EnvFilter, ParseError> {
    EnvFilter::try_from_default_env().or_else(|_| EnvFilter::from_str(DEFAULT_LEVEL_STR))
}
