use tracing_subscriber::EnvFilter;

/// Applies `.env` from the working directory, if present. Variables already
/// set in the process environment win.
pub fn init_env() {
    if let Err(err) = dotenvy::dotenv()
        && !err.not_found()
    {
        eprintln!("Ignoring unreadable .env file: {err}");
    }
}

/// Installs the global subscriber. Progress lines go to stdout; `RUST_LOG`
/// overrides `fallback_level`.
pub fn init_tracing(fallback_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
