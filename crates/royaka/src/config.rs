//! Client configuration: endpoint resolution and the reconnect policy.

use std::time::Duration;

use rand::Rng;

/// The development endpoint used when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8080/ws";

/// Environment variable that overrides the endpoint at startup.
pub const ENDPOINT_ENV: &str = "ROYAKA_WS_URL";

/// Configuration for a [`Client`](crate::Client).
///
/// The endpoint is resolved once at startup; the connection manager
/// never re-reads the environment.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// The `ws://` or `wss://` URL of the game server.
    pub endpoint: String,

    /// How to schedule retries after a dial failure or a drop.
    pub reconnect: ReconnectPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Resolves the endpoint from `ROYAKA_WS_URL`, falling back to the
    /// development default.
    pub fn from_env() -> Self {
        let endpoint = std::env::var(ENDPOINT_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        Self {
            endpoint,
            ..Self::default()
        }
    }
}

/// The rule governing when the connection manager retries after a drop.
///
/// Retries continue until [`Client::stop`](crate::Client::stop) — there
/// is no maximum attempt count in either policy.
#[derive(Debug, Clone)]
pub enum ReconnectPolicy {
    /// A flat delay between attempts. The default is 3 seconds, the
    /// cadence the original client shipped with.
    Fixed {
        delay: Duration,
    },

    /// Exponential backoff with full jitter: attempt `n` waits a
    /// uniformly random duration in `[0, min(base · 2ⁿ⁻¹, cap)]`.
    Backoff {
        base: Duration,
        cap: Duration,
    },
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::Fixed {
            delay: Duration::from_millis(3000),
        }
    }
}

impl ReconnectPolicy {
    /// The delay to wait before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => *delay,
            Self::Backoff { base, cap } => {
                let exp = base.saturating_mul(
                    2u32.saturating_pow(attempt.saturating_sub(1)),
                );
                let ceiling = exp.min(*cap);
                let micros = ceiling.as_micros() as u64;
                if micros == 0 {
                    return Duration::ZERO;
                }
                // Full jitter desynchronizes clients that all lost the
                // same server at the same instant.
                let drawn = rand::rng().random_range(0..=micros);
                Duration::from_micros(drawn)
            }
        }
    }
}
