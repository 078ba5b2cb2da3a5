#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::style)]

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use sbm::cli::{Args, Command};
use sbm::parser::{import_subscription, parse_uri};
use sbm::scheduler::Scheduler;
use sbm::service::Manager;
use sbm::source::read_text;
use sbm::store::Store;
use tokio::sync::Mutex;
use tracing::Level;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let is_verbose = args.verbose;
    tracing_subscriber::fmt()
        .with_max_level(if is_verbose {
            Level::TRACE
        } else {
            Level::INFO
        })
        .init();

    if let Err(e) = run(args).await {
        tracing::error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    match args.command {
        Command::Parse { uri } => {
            let node = parse_uri(&uri)?;
            println!("{}", serde_json::to_string_pretty(&node)?);
        }
        Command::Import { source } => {
            let body = read_text(&source).await?;
            let report = import_subscription(&body);
            for error in &report.errors {
                tracing::warn!("Line {}: {} ({})", error.line, error.error, error.uri);
            }
            println!("{}", serde_json::to_string_pretty(&report.nodes)?);
            tracing::info!(
                "Imported {} nodes, {} lines failed",
                report.succeeded(),
                report.failed()
            );
        }
        Command::Build {
            profile,
            output,
            no_refresh,
        } => {
            let mut manager = Manager::load(&profile).await?;
            if !no_refresh {
                manager.refresh_all().await?;
            }
            match output {
                Some(output) => manager.apply_to(Path::new(&output)).await?,
                None => {
                    manager.apply().await?;
                }
            }
            tracing::info!("Config generation complete!");
        }
        Command::Watch { profile } => watch(&profile).await?,
    }
    Ok(())
}

async fn watch(profile: &str) -> anyhow::Result<()> {
    let manager = Arc::new(Mutex::new(Manager::load(profile).await?));
    let interval = manager.lock().await.settings().subscription_interval;

    let refresh = {
        let manager = manager.clone();
        move || {
            let manager = manager.clone();
            async move { manager.lock().await.refresh_all().await.map(|_| ()) }
        }
    };
    let apply = {
        let manager = manager.clone();
        move || {
            let manager = manager.clone();
            async move { manager.lock().await.apply().await.map(|_| ()) }
        }
    };

    let mut scheduler = Scheduler::new(refresh).with_on_update(apply);
    if let Err(e) = scheduler.run_now().await {
        tracing::warn!("Initial refresh failed: {:#}", e);
        manager.lock().await.apply().await?;
    }

    scheduler.start(interval);
    if !scheduler.is_running() {
        return Ok(());
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;
    scheduler.stop();
    Ok(())
}
