//! Environment-driven configuration for the server and the terminal client

use std::path::PathBuf;
use std::time::Duration;

/// Server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub db_path: PathBuf,
    /// Allowed browser origin; any origin when unset
    pub cors_origin: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let db_path = std::env::var("IVY_DB_PATH").map_or_else(
            |_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(format!("{home}/.helloivy/helloivy.db"))
            },
            PathBuf::from,
        );

        Self {
            port: env_parse("IVY_PORT").unwrap_or(3000),
            db_path,
            cors_origin: std::env::var("IVY_CORS_ORIGIN")
                .ok()
                .filter(|o| !o.is_empty()),
        }
    }
}

/// Terminal client settings
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the helloivy server, e.g. `http://localhost:3000`
    pub server_url: String,
    /// Pause before a scripted question or reply is shown
    pub reply_latency: Duration,
    /// Pause before the opening greeting
    pub greeting_latency: Duration,
    /// Typewriter tick
    pub tick: Duration,
    /// Audio clip length
    pub chunk_period: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:3000".to_string(),
            reply_latency: Duration::from_millis(1000),
            greeting_latency: Duration::from_millis(500),
            tick: Duration::from_millis(30),
            chunk_period: Duration::from_secs(4),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_url: std::env::var("IVY_SERVER_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.server_url),
            reply_latency: env_parse("IVY_REPLY_LATENCY_MS")
                .map_or(defaults.reply_latency, Duration::from_millis),
            greeting_latency: env_parse("IVY_GREETING_LATENCY_MS")
                .map_or(defaults.greeting_latency, Duration::from_millis),
            tick: env_parse("IVY_TICK_MS").map_or(defaults.tick, Duration::from_millis),
            chunk_period: env_parse("IVY_CHUNK_SECS")
                .filter(|secs| *secs > 0)
                .map_or(defaults.chunk_period, Duration::from_secs),
        }
    }

    /// `/api/chat` endpoint on the configured server
    pub fn chat_url(&self) -> String {
        format!("{}/api/chat", self.server_url)
    }

    /// Audio socket endpoint on the configured server
    pub fn socket_url(&self) -> String {
        let ws_base = if let Some(rest) = self.server_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.server_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.server_url.clone()
        };
        format!("{ws_base}/socket")
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
