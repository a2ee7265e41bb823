//! # Duka POS Terminal Entry Point
//!
//! Starts the tokio runtime and hands over to [`duka_terminal_lib::run`].
//! The setup lives in the library so it can be tested.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match duka_terminal_lib::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("duka-terminal: {}", e);
            ExitCode::FAILURE
        }
    }
}
