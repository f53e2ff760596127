use std::process::ExitCode;

fn main() -> ExitCode {
    rental_cli::run()
}
