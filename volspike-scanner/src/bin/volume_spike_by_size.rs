/// Volume Spike Report by Size
///
/// Same spikes as `volume-spike`, ranked by market capitalisation with compact aligned rows.
use std::process::ExitCode;
use volspike_notify::init_logging;
use volspike_scanner::{ReportPreset, run_cli};

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    run_cli(ReportPreset::Size).await
}
