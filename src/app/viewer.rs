//! Runs a viewer that prints mirrored output to this terminal.
use super::args::ViewerArgs;
use anyhow::Result;
use console_relay::console::Markup;
use console_relay::web::{render_markup, start_viewer, ViewerEvent};
use std::io::Write;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info};

pub async fn run(args: ViewerArgs) -> Result<()> {
    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr).await?;

    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<ViewerEvent>();

    tokio::spawn(async move {
        if let Err(e) = start_viewer(listener, args.password, events_tx).await {
            error!("Console viewer stopped: {}", e);
        }
    });

    let mut stdout = std::io::stdout();
    while let Some(event) = events_rx.recv().await {
        match event {
            ViewerEvent::Connected { name, id } => info!("{} ({}) connected", name, id),
            ViewerEvent::Disconnected { name, id } => info!("{} ({}) disconnected", name, id),
            ViewerEvent::Output { message, .. } => {
                let rendered = render_markup(&Markup::parse(&message.text));
                if message.is_line {
                    writeln!(stdout, "{}", rendered)?;
                } else {
                    write!(stdout, "{}", rendered)?;
                }
                stdout.flush()?;
            }
        }
    }

    Ok(())
}
