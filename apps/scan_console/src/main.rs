use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use scan_core::{load_settings, load_settings_from, HttpItemLookup, ScanSession, ScanSnapshot};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod render;

use render::{parse_line, render, ConsoleInput};

/// Feeds decoded codes from stdin into a scan session and prints each
/// resulting snapshot.
#[derive(Parser, Debug)]
struct Args {
    /// Settings file; defaults to ./scanner.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the lookup service URL from settings and environment.
    #[arg(long)]
    lookup_url: Option<String>,
    /// Print snapshots as JSON instead of text.
    #[arg(long)]
    json: bool,
}

fn print_snapshot(snapshot: &ScanSnapshot, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(snapshot)?);
    } else {
        println!("{}\n", render(snapshot));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => load_settings_from(path, true),
        None => load_settings(),
    }
    .context("failed to load lookup settings")?;
    if let Some(url) = args.lookup_url {
        settings.lookup_url = url;
        settings.validate().context("invalid --lookup-url")?;
    }

    let lookup = HttpItemLookup::new(&settings).context("failed to build lookup client")?;
    let (handle, session_task) = ScanSession::spawn(Arc::new(lookup));
    info!(url = %settings.lookup_url, "scanner ready");

    let mut snapshots = handle.subscribe();
    let json = args.json;
    let printer = tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            if let Err(err) = print_snapshot(&snapshot, json) {
                warn!(error = %err, "failed to print snapshot");
            }
        }
    });
    print_snapshot(&handle.snapshot(), json)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line, &settings.barcode_types) {
            ConsoleInput::Empty => {}
            ConsoleInput::Quit => break,
            ConsoleInput::Show => print_snapshot(&handle.snapshot(), json)?,
            ConsoleInput::DismissAlert => {
                handle.dismiss_alert().await?;
            }
            ConsoleInput::Reset => {
                if let Err(err) = handle.reset().await {
                    warn!(error = %err, "reset refused");
                }
            }
            ConsoleInput::Code(code) => {
                if handle.snapshot().scanning_paused() {
                    info!("scanning paused; detection not delivered");
                    continue;
                }
                handle.scan(code).await?;
            }
        }
    }

    drop(handle);
    session_task.await.context("scan session task failed")?;
    printer.await.context("snapshot printer task failed")?;
    Ok(())
}
