//! thermo-telemetry entry point.

use thermo_telemetry::cli::{self, Cli};
use thermo_telemetry::core::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    cli::execute(cli).await
}
