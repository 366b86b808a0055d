use std::process::ExitCode;

use releaser::cli::{self, Args};
use releaser::ui;

fn main() -> ExitCode {
    let args = Args::parse_args();

    env_logger::Builder::new()
        .filter_level(args.cli_log_level)
        .init();

    match cli::execute_command(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::display_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
