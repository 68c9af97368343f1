use std::{path::PathBuf, time::Duration};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8082";
const DEFAULT_STORE_PATH: &str = "callbacks.json";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportRuntime {
    Std,
    Axum,
}

impl TransportRuntime {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Std => "std",
            Self::Axum => "axum",
        }
    }
}

/// Startup configuration, read once from the environment.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub store_path: PathBuf,
    pub log_dir: PathBuf,
    /// Notification spool; notifications are disabled when unset.
    pub outbox_dir: Option<PathBuf>,
    pub http_workers: usize,
    pub lock_timeout: Duration,
    pub transport_runtime: TransportRuntime,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_string("LEADS_CALLBACK_BIND")
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            store_path: env_string("LEADS_CALLBACK_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH)),
            log_dir: env_string("LEADS_CALLBACK_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
            outbox_dir: env_string("LEADS_CALLBACK_OUTBOX_DIR").map(PathBuf::from),
            http_workers: parse_env_usize("LEADS_CALLBACK_HTTP_WORKERS")
                .filter(|workers| *workers > 0)
                .unwrap_or_else(default_http_workers),
            lock_timeout: Duration::from_millis(
                parse_env_u64("LEADS_CALLBACK_LOCK_TIMEOUT_MS")
                    .filter(|value| *value > 0)
                    .unwrap_or(DEFAULT_LOCK_TIMEOUT_MS),
            ),
            transport_runtime: parse_transport_runtime(),
        }
    }
}

pub(super) fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

pub(super) fn parse_env_usize(key: &str) -> Option<usize> {
    env_string(key).and_then(|value| value.trim().parse::<usize>().ok())
}

pub(super) fn parse_env_u64(key: &str) -> Option<u64> {
    env_string(key).and_then(|value| value.trim().parse::<u64>().ok())
}

fn default_http_workers() -> usize {
    std::thread::available_parallelism()
        .map(|parallelism| parallelism.get().clamp(1, 32))
        .unwrap_or(4)
}

fn parse_transport_runtime() -> TransportRuntime {
    match env_string("LEADS_CALLBACK_TRANSPORT_RUNTIME").as_deref() {
        Some("axum") => TransportRuntime::Axum,
        _ => TransportRuntime::Std,
    }
}
