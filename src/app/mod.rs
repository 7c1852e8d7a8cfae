pub mod args;
mod run;
mod setup;
mod viewer;

pub use args::AppArgs;

use anyhow::Result;
use args::Command;

/// Parses the command line and runs the chosen subcommand, returning the
/// process exit code.
pub async fn launch() -> Result<i32> {
    launch_with_args(AppArgs::from_cli()).await
}

pub async fn launch_with_args(args: AppArgs) -> Result<i32> {
    setup::configure_logging();
    let options = setup::load_options(&args)?;

    match args.command {
        Command::Run(run_args) => {
            let options = setup::apply_run_args(options, &run_args);
            run::run(options, run_args).await
        }
        Command::Viewer(viewer_args) => viewer::run(viewer_args).await.map(|()| 0),
    }
}
