// Logs go to stderr so that anything kcctl prints on stdout (e.g., `discover --format json`) can
// be piped somewhere else
pub fn setup_for_cli(env_filter: &str) {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .compact()
        .init();
}
