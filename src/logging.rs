use env_logger::Env;

/// Install the global logger. `RUST_LOG` overrides `default_filter`.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init(default_filter: &str) {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp_secs()
        .try_init();
}
