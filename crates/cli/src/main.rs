use std::process::ExitCode;

fn main() -> ExitCode {
    cardesk_cli::run()
}
