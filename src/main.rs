use railyard::cli::run_cli;
use railyard::logging::{init_logging, LogConfig};

fn main() -> anyhow::Result<()> {
    let mut config = LogConfig::from_env();
    if std::env::var("RAILYARD_LOG_LEVEL").is_err() {
        // Keep command output readable unless asked otherwise.
        config.log_level = "warn".to_string();
    }
    init_logging(&config)?;
    run_cli()
}
