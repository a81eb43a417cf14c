//! Runs a handful of candidates against one in-memory lease store and
//! rotates leadership between them until interrupted.
//!
//! ```text
//! RUST_LOG=d_leader=debug LEADER_DEMO_CANDIDATES=3 cargo run
//! ```

use std::env;
use std::sync::Arc;
use std::time::Duration;

use d_leader::CoordinatorConfig;
use d_leader::DefaultCandidate;
use d_leader::DefaultLeaderEventPublisher;
use d_leader::Error;
use d_leader::LeaderCoordinator;
use d_leader::LeaderEventKind;
use d_leader::MemoryLeaseStore;
use d_leader::Result;
use d_leader::TtlLeaseBackend;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio::sync::broadcast::error::RecvError;
use tracing::error;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_CANDIDATES: usize = 3;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let settings = CoordinatorConfig::new()?.validate()?;
    let candidates = candidate_count()?;

    let store = Arc::new(MemoryLeaseStore::new());
    let publisher = DefaultLeaderEventPublisher::default();
    let mut coordinators = Vec::with_capacity(candidates);
    for n in 0..candidates {
        let candidate = DefaultCandidate::new(format!("candidate-{n}"), "demo");
        let backend = Arc::new(TtlLeaseBackend::from_config(store.clone(), &settings.election));
        let coordinator = LeaderCoordinator::new(Arc::new(candidate), backend, settings.election.clone())
            .with_publisher(Arc::new(publisher.clone()));
        coordinator.start().await?;
        coordinators.push(coordinator);
    }

    let mut events = publisher.subscribe();
    let rotate_every = settings.election.ttl();
    info!("{} candidates started. Waiting for CTRL+C signal...", candidates);

    let shutdown = graceful_shutdown();
    tokio::pin!(shutdown);
    let mut rotation = tokio::time::interval(rotate_every);
    rotation.tick().await;

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    error!("Failed to listen for shutdown signal: {:?}", e);
                }
                break;
            }
            event = events.recv() => match event {
                Ok(event) if event.kind == LeaderEventKind::Granted => {
                    println!("{} now leads {}", event.source, event.role);
                }
                Ok(event) => println!("{}: {}", event.source, event.kind),
                Err(RecvError::Lagged(skipped)) => info!("skipped {} events", skipped),
                Err(RecvError::Closed) => break,
            },
            _ = rotation.tick() => {
                if let Some(leader) = coordinators.iter().find(|c| c.is_leader()) {
                    info!("asking {} to yield", leader.candidate_id());
                    leader.context().yield_leadership();
                }
            }
        }
    }

    for coordinator in &coordinators {
        if let Err(e) = coordinator.destroy().await {
            error!("Failed to destroy {}: {:?}", coordinator.candidate_id(), e);
        }
    }
    println!("Exiting program.");
    Ok(())
}

fn candidate_count() -> Result<usize> {
    match env::var("LEADER_DEMO_CANDIDATES") {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Fatal(format!("LEADER_DEMO_CANDIDATES must be a number, got {raw:?}: {e}"))),
        Err(_) => Ok(DEFAULT_CANDIDATES),
    }
}

async fn graceful_shutdown() -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt()).map_err(|e| Error::Fatal(e.to_string()))?;
    let mut sigterm = signal(SignalKind::terminate()).map_err(|e| Error::Fatal(e.to_string()))?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
    }
    Ok(())
}
