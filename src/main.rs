//! The main entry point for the console-relay application.
mod app;

use anyhow::Result;

/// The main function of the application.
///
/// Runs either a mirrored command or a viewer, based on command-line
/// arguments, and exits with the mirrored command's exit code.
///
/// # Errors
///
/// Returns an error if the application fails to start.
#[tokio::main]
async fn main() -> Result<()> {
    let code = app::launch().await?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
