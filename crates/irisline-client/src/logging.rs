//! Tracing bootstrap for applications embedding the client.

use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info,irisline_client=info,irisline_core=warn";

/// Install a `fmt` subscriber. Filter comes from `RUST_LOG`, then
/// `IRISLINE_LOG`, then a built-in default. A second call is a no-op.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("IRISLINE_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = fmt().with_env_filter(filter).try_init();
}
