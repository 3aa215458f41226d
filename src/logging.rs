use log::LevelFilter;

/// Installs the global logger (reads the RUST_LOG env var, defaults to Info).
///
/// Embedders that bring their own logger can skip this; calling it more than
/// once is harmless.
pub fn init() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .try_init();
}
