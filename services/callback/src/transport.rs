use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Instant,
};

use store::CallbackStore;

mod config;
mod event_log;
mod http;
mod notify;
mod payload;
mod request;
mod routes;
mod server_runtime;


pub use config::{ServiceConfig, TransportRuntime};
pub use server_runtime::{serve_http, serve_http_with_workers};

pub(crate) use event_log::EventLog;
pub(crate) use http::{HttpRequest, HttpResponse};
pub(crate) use routes::handle_request;

// Form submissions are small; anything larger than this is not a lead.
pub(crate) const MAX_HTTP_BODY_BYTES: usize = 64 * 1024;
pub(crate) const SOCKET_TIMEOUT_SECS: u64 = 5;

const DEFAULT_REPORT_RECENT: usize = 10;

pub type SharedRuntime = Arc<Mutex<ServiceRuntime>>;

/// Per-process service state shared by all transport workers: the store
/// handle, the day-bucketed event log, the notification outbox, and
/// operational counters.
pub struct ServiceRuntime {
    store: CallbackStore,
    event_log: EventLog,
    outbox_dir: Option<PathBuf>,
    report_recent: usize,
    submit_success_total: u64,
    submit_rejected_total: u64,
    submit_failed_total: u64,
    list_requests_total: u64,
    corrupt_recovered_total: u64,
    notifications_dispatched_total: u64,
    started_at: Instant,
}

impl ServiceRuntime {
    pub fn new(config: &ServiceConfig) -> Self {
        let store =
            CallbackStore::open_with_lock_timeout(&config.store_path, config.lock_timeout);
        Self::with_parts(store, EventLog::new(&config.log_dir), config.outbox_dir.clone())
    }

    pub fn with_parts(
        store: CallbackStore,
        event_log: EventLog,
        outbox_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            store,
            event_log,
            outbox_dir,
            report_recent: DEFAULT_REPORT_RECENT,
            submit_success_total: 0,
            submit_rejected_total: 0,
            submit_failed_total: 0,
            list_requests_total: 0,
            corrupt_recovered_total: 0,
            notifications_dispatched_total: 0,
            started_at: Instant::now(),
        }
    }

    pub(crate) fn store(&self) -> &CallbackStore {
        &self.store
    }

    pub(crate) fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    pub(crate) fn outbox_dir(&self) -> Option<&PathBuf> {
        self.outbox_dir.as_ref()
    }

    pub(crate) fn report_recent(&self) -> usize {
        self.report_recent
    }

    pub(crate) fn observe_submit_success(&mut self) {
        self.submit_success_total += 1;
    }

    pub(crate) fn observe_submit_rejected(&mut self) {
        self.submit_rejected_total += 1;
    }

    pub(crate) fn observe_submit_failed(&mut self) {
        self.submit_failed_total += 1;
    }

    pub(crate) fn observe_list_request(&mut self) {
        self.list_requests_total += 1;
    }

    pub(crate) fn observe_corrupt_recovered(&mut self) {
        self.corrupt_recovered_total += 1;
    }

    pub(crate) fn observe_notification_dispatched(&mut self) {
        self.notifications_dispatched_total += 1;
    }

    pub fn metrics_text(&self) -> String {
        format!(
            "callback_submit_success_total {}\n\
             callback_submit_rejected_total {}\n\
             callback_submit_failed_total {}\n\
             callback_list_requests_total {}\n\
             callback_corrupt_recovered_total {}\n\
             callback_notifications_dispatched_total {}\n\
             callback_uptime_seconds {}\n",
            self.submit_success_total,
            self.submit_rejected_total,
            self.submit_failed_total,
            self.list_requests_total,
            self.corrupt_recovered_total,
            self.notifications_dispatched_total,
            self.started_at.elapsed().as_secs(),
        )
    }
}

/// Parses one raw HTTP/1.1 request held fully in memory and returns the
/// rendered response bytes. Used by integration tests and the load
/// tooling; the serving path reads from sockets instead.
pub fn handle_http_request_bytes(
    runtime: &SharedRuntime,
    raw_request: &[u8],
) -> Result<Vec<u8>, String> {
    let request_text =
        std::str::from_utf8(raw_request).map_err(|_| "request must be valid UTF-8".to_string())?;
    let (header_block, body) = request_text
        .split_once("\r\n\r\n")
        .ok_or_else(|| "missing HTTP header terminator".to_string())?;

    let mut lines = header_block.split("\r\n");
    let request_line = lines
        .next()
        .ok_or_else(|| "missing request line".to_string())?;
    let (method, target) = request::parse_request_line(request_line)?;

    let mut headers = std::collections::HashMap::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| "invalid HTTP header".to_string())?;
        headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
    }

    let content_length = match headers.get("content-length") {
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| "invalid content-length header".to_string())?,
        None => 0,
    };
    if content_length > MAX_HTTP_BODY_BYTES {
        return Err(format!(
            "content-length exceeds max body size ({MAX_HTTP_BODY_BYTES} bytes)"
        ));
    }
    if content_length != body.len() {
        return Err("content-length does not match body size".to_string());
    }

    let request = HttpRequest {
        method,
        target,
        headers,
        body: body.as_bytes().to_vec(),
    };
    let response = handle_request(runtime, &request);
    Ok(http::render_response_text(&response).into_bytes())
}
