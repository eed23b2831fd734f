//! Signal handling for graceful shutdown.
//!
//! SIGINT (Ctrl+C) and SIGTERM (kill, Kubernetes, Docker) both request a
//! graceful stop. The scheduler observes the stop at its idle boundary, so
//! the in-flight trigger always completes before the process exits.

use log::info;
use std::fmt;

/// The type of shutdown signal received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGINT - user interrupt (Ctrl+C)
    Interrupt,
    /// SIGTERM - termination request (kill, Kubernetes, Docker)
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => write!(f, "SIGINT (Ctrl+C)"),
            ShutdownSignal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Wait for SIGINT or SIGTERM.
#[cfg(unix)]
pub async fn shutdown_signal() -> ShutdownSignal {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("Failed to install SIGINT handler");

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM - initiating graceful shutdown");
            ShutdownSignal::Terminate
        }
        _ = sigint.recv() => {
            info!("Received SIGINT (Ctrl+C) - initiating graceful shutdown");
            ShutdownSignal::Interrupt
        }
    }
}

/// Windows-compatible handler (only Ctrl+C).
#[cfg(not(unix))]
pub async fn shutdown_signal() -> ShutdownSignal {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("Received Ctrl+C - initiating graceful shutdown");
    ShutdownSignal::Interrupt
}
