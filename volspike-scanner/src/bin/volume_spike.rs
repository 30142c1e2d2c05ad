/// Volume Spike Report
///
/// Lists KOSPI/KOSDAQ instruments whose volume in the last session was at least
/// `VOLSPIKE_THRESHOLD` times the session before, biggest multiples first.
use std::process::ExitCode;
use volspike_notify::init_logging;
use volspike_scanner::{ReportPreset, run_cli};

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    run_cli(ReportPreset::Spike).await
}
