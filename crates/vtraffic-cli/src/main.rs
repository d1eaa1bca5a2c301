use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = vtraffic_cli::Cli::parse();
    match vtraffic_cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::from(error.exit_code())
        }
    }
}
