//! Runs a child process and mirrors its stdout through the coordinator.
use super::args::RunArgs;
use anyhow::{anyhow, Context, Result};
use console_relay::console::LineSplitter;
use console_relay::{ClientCredentials, ConsoleOptions, OutputCoordinator};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Runs the command to completion and returns its exit code.
pub async fn run(options: ConsoleOptions, args: RunArgs) -> Result<i32> {
    let coordinator = Arc::new(OutputCoordinator::new(options));

    connect_viewer(&coordinator, &args).await;

    let (program, program_args) = args
        .command
        .split_first()
        .ok_or_else(|| anyhow!("No command given"))?;

    let mut child = Command::new(program)
        .args(program_args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .with_context(|| format!("Failed to start '{}'", program))?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("Child stdout was not captured"))?;

    let mut splitter = LineSplitter::new();
    let mut buffer = [0u8; 8192];
    loop {
        let read = match stdout.read(&mut buffer).await {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) => {
                error!("Failed to read child output: {}", e);
                break;
            }
        };
        for segment in splitter.push(&buffer[..read]) {
            segment.apply(&coordinator).await;
        }
    }
    if let Some(segment) = splitter.finish() {
        segment.apply(&coordinator).await;
    }

    let status = child.wait().await?;
    info!("'{}' exited with {}", program, status);

    if args.print_log {
        eprintln!("{}", coordinator.export_log());
    }

    coordinator.stop().await;

    Ok(status.code().unwrap_or(1))
}

/// Connects to the viewer if one was requested. Failure is logged and the
/// command still runs.
async fn connect_viewer(coordinator: &OutputCoordinator, args: &RunArgs) {
    let url = match (&args.url, args.port) {
        (Some(url), _) => url.clone(),
        (None, Some(port)) => format!("ws://localhost:{}/", port),
        (None, None) => return,
    };
    let name = args
        .name
        .clone()
        .or_else(|| args.command.first().cloned())
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());
    let credentials = ClientCredentials::new(name, Uuid::new_v4().to_string(), &args.password);

    let timeout = Duration::from_secs(args.connect_timeout);
    match tokio::time::timeout(timeout, coordinator.connect(&url, credentials)).await {
        Ok(Ok(_client)) => {}
        Ok(Err(e)) => warn!("Could not connect to console viewer at {}: {}", url, e),
        Err(_) => warn!(
            "Timed out after {:?} connecting to console viewer at {}",
            timeout, url
        ),
    }
}
