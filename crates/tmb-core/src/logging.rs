use tracing_subscriber::EnvFilter;

/// Initialize tracing for the bridge.
///
/// `RUST_LOG` takes precedence; otherwise the `debug` config flag raises the
/// bridge crates to debug level while everything else stays at warn.
pub fn init(debug: bool) {
    let default = if debug {
        "warn,tmb=debug,tmb_core=debug,tmb_telegram=debug,tmb_messenger=debug"
    } else {
        "warn,tmb=info,tmb_core=info,tmb_telegram=info,tmb_messenger=info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
