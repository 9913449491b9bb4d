//! Blog kernel entry point.

use std::process::ExitCode;

use app::{Config, telemetry};

fn main() -> ExitCode {
    // 1. Load configuration
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // 2. Initialize tracing
    telemetry::init_tracing(&config);

    // 3. Install Prometheus metrics recorder
    let metrics_handle = telemetry::install_metrics().expect("failed to install Prometheus recorder");

    // 4. Wire the kernel and run the demo session
    let outcome = app::run(&config);

    // 5. Report
    let code = match outcome {
        Ok(report) => {
            match serde_json::to_string(&report) {
                Ok(json) => tracing::info!(report = %json, "Demo report"),
                Err(e) => tracing::warn!(error = %e, "Failed to serialize demo report"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Demo failed");
            ExitCode::FAILURE
        }
    };

    tracing::info!(metrics = %metrics_handle.render(), "Metrics snapshot");
    code
}
