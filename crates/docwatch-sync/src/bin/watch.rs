//! Docwatch Operator Console
//!
//! Watch a document-monitor fleet from the terminal: discovery, event feed,
//! and sync status refreshes stream to stdout until interrupted.
//!
//! Usage:
//!   cargo run --bin docwatch                    # poll and print refreshes
//!   cargo run --bin docwatch -- --once          # discover, print, exit
//!   cargo run --bin docwatch -- --select c1     # poll the sync panel of client c1
//!   cargo run --bin docwatch -- --workflows     # list workflows + recent runs
//!   cargo run --bin docwatch -- --cleanup       # run retention cleanup (asks first)

use std::env;
use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docwatch_client::{ApiClient, EventView, MonitorRegistry, RetentionClient, WorkflowClient};
use docwatch_core::{defaults, MonitorClient, SessionStore};
use docwatch_sync::{Poller, PollerConfig, PollerEvent};

#[derive(Debug, Default)]
struct Args {
    once: bool,
    cleanup: bool,
    workflows: bool,
    select: Option<String>,
}

fn parse_args() -> Args {
    let args: Vec<String> = env::args().collect();
    let mut result = Args::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--once" => result.once = true,
            "--cleanup" => result.cleanup = true,
            "--workflows" => result.workflows = true,
            "--select" | "-s" => {
                i += 1;
                if i < args.len() {
                    result.select = Some(args[i].clone());
                }
            }
            "--help" | "-h" => {
                println!(
                    "Usage: docwatch [--once] [--cleanup] [--workflows] [--select CLIENT_ID]"
                );
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                std::process::exit(2);
            }
        }
        i += 1;
    }
    result
}

fn print_fleet(clients: &[MonitorClient]) {
    if clients.is_empty() {
        println!("No monitor clients registered.");
        return;
    }
    println!("{:<12} {:<20} {:<8} folders", "ID", "NAME", "STATUS");
    for client in clients {
        println!(
            "{:<12} {:<20} {:<8?} {}",
            client.id,
            client.name,
            client.status,
            client.folders.join(", ")
        );
    }
}

/// Ask the operator before a destructive action.
fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = parse_args();

    let session = Arc::new(SessionStore::from_env().context("failed to open session store")?);
    let api = Arc::new(ApiClient::from_env(session).context("failed to build API client")?);

    if args.cleanup {
        let prompt = format!(
            "Delete monitor events older than {}h beyond the newest {}?",
            defaults::CLEANUP_MAX_AGE_HOURS,
            defaults::CLEANUP_MAX_EVENTS
        );
        if !confirm(&prompt)? {
            println!("Aborted.");
            return Ok(());
        }
        let report = RetentionClient::new(api).cleanup_default().await?;
        println!(
            "Cleanup: {} events, -{} by age, -{} by count, {} remaining",
            report.initial_count,
            report.deleted_by_age,
            report.deleted_by_count,
            report.final_count
        );
        return Ok(());
    }

    if args.workflows {
        let workflows = WorkflowClient::new(api);
        for workflow in workflows.list().await? {
            println!(
                "{:<12} {:<24} {}",
                workflow.id,
                workflow.name,
                workflow.description.unwrap_or_default()
            );
        }
        let now = chrono::Utc::now();
        for run in workflows.recent_executions().await {
            println!(
                "  {} {:<24} {:<10?} {}",
                run.execution_id,
                run.workflow_name,
                run.status,
                run.duration_label(now)
            );
        }
        return Ok(());
    }

    if args.once {
        let clients = MonitorRegistry::new(api).discover().await?;
        print_fleet(&clients);
        return Ok(());
    }

    let poller = Poller::new(api, PollerConfig::from_env());
    let mut events = poller.events();
    let handle = poller.start();

    if let Some(client_id) = &args.select {
        // Selection needs a roster; wait for the first discovery pass.
        loop {
            match events.recv().await {
                Ok(PollerEvent::ClientsRefreshed { .. }) => break,
                Ok(_) => continue,
                Err(e) => anyhow::bail!("poller stopped before first discovery: {}", e),
            }
        }
        if poller.select_client(client_id).await {
            info!(client_id = %client_id, "Sync panel selected");
        } else {
            eprintln!("Client {} not found in the roster.", client_id);
        }
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\nShutting down.");
                handle.shutdown().await?;
                break;
            }
            event = events.recv() => match event {
                Ok(PollerEvent::ClientsRefreshed { count }) => {
                    println!("-- fleet refreshed ({} clients) --", count);
                    print_fleet(&poller.snapshot().await.clients);
                }
                Ok(PollerEvent::EventsRefreshed { client_id, count }) => {
                    let view = EventView::new(poller.snapshot().await.events);
                    println!(
                        "events[{}]: {} in window, {} page(s) of {}",
                        client_id,
                        count,
                        view.page_count(),
                        view.page_size()
                    );
                }
                Ok(PollerEvent::SyncRefreshed { client_id, connected }) => {
                    println!(
                        "sync[{}]: {}",
                        client_id,
                        if connected { "connected" } else { "disconnected" }
                    );
                }
                Ok(PollerEvent::CommandSettled { client_id, command }) => {
                    println!("command[{}]: {} settled", client_id, command);
                }
                Ok(PollerEvent::RefreshFailed { scope, error }) => {
                    eprintln!("refresh failed ({:?}): {}", scope, error);
                }
                Ok(PollerEvent::Started) | Ok(PollerEvent::Stopped) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    eprintln!("display lagged, skipped {} notifications", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    Ok(())
}
