pub mod api;
pub mod core;

/// Installs the `env_logger` backend once; later calls are no-ops.
/// Level defaults to `info` and follows `RUST_LOG` when set.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
