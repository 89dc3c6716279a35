use std::process::ExitCode;

use monzo_receipts::telemetry::LoggingConfig;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = LoggingConfig::from_env().init() {
        eprintln!("failed to initialise logging: {e}");
    }

    match monzo_receipts::app::run().await {
        Ok(uploaded) => {
            tracing::info!(uploaded, "done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::debug!(code = e.error_code(), reauth = e.needs_reauth(), "run failed");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
