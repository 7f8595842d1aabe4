use std::process::ExitCode;

use clap::Parser;

use nodecfg_config::LaunchArgs;

fn main() -> ExitCode {
    let args = LaunchArgs::parse();
    match nodecfgd::run_daemon(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            // Telemetry may not be installed yet when startup fails.
            eprintln!("nodecfgd: {error}");
            ExitCode::FAILURE
        }
    }
}
