//! Console logging for the demo.
//!
//! Events from the binary and from `sharepool` (built with its `tracing`
//! feature) are printed through `tracing_subscriber::fmt`. The level defaults
//! to `info` and is overridden with `RUST_LOG`, e.g. `RUST_LOG=sharepool=trace`
//! to watch workers being built and terminated.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_file(true)
                .compact(),
        )
        .try_init()?;

    Ok(())
}
