use flexi_logger::{Logger, LoggerHandle};
use log::info;

const DEFAULT_LEVEL: &str = "info";

/// Start the stderr logger. `RUST_LOG` overrides the default level.
///
/// The returned handle must be kept alive for the lifetime of the app.
pub fn init_logging() -> Result<LoggerHandle, String> {
    let handle = Logger::try_with_env_or_str(DEFAULT_LEVEL)
        .map_err(|e| format!("invalid log specification: {e}"))?
        .log_to_stderr()
        .format(flexi_logger::detailed_format)
        .start()
        .map_err(|e| format!("failed to start logger: {e}"))?;

    info!(
        "event=app_start platform={} version={}",
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION")
    );
    Ok(handle)
}
