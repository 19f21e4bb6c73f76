//! repo-forge: generate unit tests and repository reports with an LLM backend

use std::process::ExitCode;

fn main() -> ExitCode {
    match repo_forge::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::from(repo_forge::cli::exit_code(&e))
        }
    }
}
