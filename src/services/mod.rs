//! Health probes for the collaborating audio services
//!
//! The speech-to-text server, the text-to-speech server, and the audio
//! transport run as separate processes. This module only probes their local
//! ports; it does not start, stop, or supervise anything.

use std::time::Duration;

use serde::Serialize;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::config::Config;

const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Probe result for one service
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub name: &'static str,
    pub port: u16,
    pub running: bool,
}

/// Whether a local service accepts connections on `port`.
pub async fn probe_port(port: u16) -> bool {
    matches!(
        timeout(PROBE_TIMEOUT, TcpStream::connect(("127.0.0.1", port))).await,
        Ok(Ok(_))
    )
}

/// Probe every collaborating service.
pub async fn check_all(config: &Config) -> Vec<ServiceStatus> {
    let specs = [
        ("speech-to-text", config.stt_port),
        ("text-to-speech", config.tts_port),
        ("audio-transport", config.transport_port),
    ];

    let mut statuses = Vec::with_capacity(specs.len());
    for (name, port) in specs {
        statuses.push(ServiceStatus {
            name,
            port,
            running: probe_port(port).await,
        });
    }
    statuses
}
