//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the harness.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FaultConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// Race reproduction knobs.
    pub race: RaceConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            max_connections: 1_024,
        }
    }
}

/// Knobs controlling how reproducible the dispatch race is.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RaceConfig {
    /// Delay slept by the body writer's failure path before submission,
    /// applied only when a request asks for it (`/fails?delay=true`).
    pub submit_delay_ms: u64,

    /// Completion monitor poll interval for the closed flag.
    pub poll_interval_ms: u64,

    /// How long the failing producer waits for the peer to close before
    /// giving up and writing anyway.
    pub peer_close_grace_ms: u64,

    /// Payload size for the failing endpoint; must exceed socket buffers
    /// so the write genuinely reaches the dead peer.
    pub payload_bytes: usize,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            submit_delay_ms: 200,
            poll_interval_ms: 5,
            peer_close_grace_ms: 2_000,
            payload_bytes: 99_999,
        }
    }
}

impl RaceConfig {
    /// The failure-path delay as a `Duration`.
    pub fn submit_delay(&self) -> Duration {
        Duration::from_millis(self.submit_delay_ms)
    }

    /// The monitor poll interval as a `Duration`.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// The peer-close grace period as a `Duration`.
    pub fn peer_close_grace(&self) -> Duration {
        Duration::from_millis(self.peer_close_grace_ms)
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default tracing filter when RUST_LOG is not set.
    pub log_filter: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "streamfault=debug".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reproduction() {
        let config = FaultConfig::default();
        assert_eq!(config.race.submit_delay_ms, 200);
        assert_eq!(config.race.payload_bytes, 99_999);
        assert!(config.race.submit_delay() > config.race.poll_interval());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: FaultConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [race]
            submit_delay_ms = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.listener.max_connections, 1_024);
        assert_eq!(config.race.submit_delay_ms, 50);
        assert_eq!(config.race.poll_interval_ms, 5);
    }
}
