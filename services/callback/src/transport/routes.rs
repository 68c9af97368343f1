use std::collections::HashMap;

use schema::SubmissionFields;

use crate::api::SubmitApiResponse;
use crate::{SubmitError, submit_callback};

use super::request::split_target;
use super::{HttpRequest, HttpResponse, SharedRuntime, notify, payload};

const SUBMIT_ACCEPTED_MESSAGE: &str =
    "Callback request received successfully! We will contact you soon.";
const SUBMIT_REJECTED_MESSAGE: &str = "Please correct the highlighted fields and try again.";
// Deliberately generic: store paths and root causes stay in the event log.
const SUBMIT_FAILED_MESSAGE: &str = "Error saving callback request. Please try again later.";

pub(crate) fn handle_request(runtime: &SharedRuntime, request: &HttpRequest) -> HttpResponse {
    let (path, query) = split_target(&request.target);
    match (request.method.as_str(), path.as_str()) {
        ("GET", "/health") => HttpResponse::ok_json("{\"status\":\"ok\"}".to_string()),
        ("GET", "/metrics") => match runtime.lock() {
            Ok(rt) => HttpResponse::ok_text(rt.metrics_text()),
            Err(_) => HttpResponse::ok_text("callback_metrics_unavailable 1\n".to_string()),
        },
        ("POST", "/callback") => handle_submit(runtime, request),
        ("GET", "/callback") => handle_list(runtime, &query),
        ("GET", "/diagnostics") => handle_diagnostics(runtime, false),
        ("POST", "/diagnostics/setup") => handle_diagnostics(runtime, true),
        (_, "/callback") => {
            HttpResponse::method_not_allowed("/callback supports GET and POST only")
        }
        (_, "/health") | (_, "/metrics") | (_, "/diagnostics") | (_, "/diagnostics/setup") => {
            HttpResponse::method_not_allowed("unsupported method for this path")
        }
        _ => HttpResponse::not_found("unknown path"),
    }
}

fn parse_submission_body(request: &HttpRequest) -> Result<SubmissionFields, String> {
    let content_type = request
        .headers
        .get("content-type")
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    if content_type.contains("application/json") {
        let body = std::str::from_utf8(&request.body)
            .map_err(|_| "request body must be valid UTF-8".to_string())?;
        return payload::build_submission_from_json(body);
    }
    if content_type.is_empty() || content_type.contains("application/x-www-form-urlencoded") {
        return Ok(payload::build_submission_from_form(&request.body));
    }
    Err(
        "content-type must be application/json or application/x-www-form-urlencoded".to_string(),
    )
}

fn handle_submit(runtime: &SharedRuntime, request: &HttpRequest) -> HttpResponse {
    let fields = match parse_submission_body(request) {
        Ok(fields) => fields,
        Err(err) => return HttpResponse::bad_request(&err),
    };

    let Ok(mut rt) = runtime.lock() else {
        return HttpResponse::internal_server_error("failed to acquire service runtime lock");
    };
    rt.event_log().log("submission received");

    match submit_callback(rt.store(), &fields) {
        Ok(outcome) => {
            if outcome.corrupt_recovered {
                rt.observe_corrupt_recovered();
                rt.event_log().log(
                    "WARNING: store document was unparsable and has been reset; \
                     records prior to this append were lost",
                );
                eprintln!("callback store was corrupt and recovered as empty");
            }
            let document_bytes = std::fs::metadata(rt.store().path())
                .map(|meta| meta.len())
                .unwrap_or(0);
            rt.event_log().log(&format!(
                "record persisted: id={}, total_records={}, document_bytes={document_bytes}",
                outcome.record.id, outcome.total_records
            ));
            rt.observe_submit_success();
            if notify::spawn_notification(
                rt.outbox_dir().map(|dir| dir.as_path()),
                rt.event_log(),
                &outcome.record,
            ) {
                rt.observe_notification_dispatched();
            }
            HttpResponse::ok_json(payload::render_json(&SubmitApiResponse::accepted(
                outcome.record.id,
                SUBMIT_ACCEPTED_MESSAGE,
            )))
        }
        Err(SubmitError::Invalid(errors)) => {
            rt.observe_submit_rejected();
            rt.event_log().log(&format!(
                "submission rejected: {} field failure(s)",
                errors.len()
            ));
            HttpResponse::json_with_status(
                400,
                payload::render_json(&SubmitApiResponse::rejected(
                    SUBMIT_REJECTED_MESSAGE,
                    payload::field_failures(&errors),
                )),
            )
        }
        Err(SubmitError::Store(err)) => {
            rt.observe_submit_failed();
            rt.event_log().log(&format!("store append failed: {err:?}"));
            eprintln!("callback store append failed: {err:?}");
            HttpResponse::json_with_status(
                500,
                payload::render_json(&SubmitApiResponse::failed(SUBMIT_FAILED_MESSAGE)),
            )
        }
    }
}

fn handle_list(runtime: &SharedRuntime, query: &HashMap<String, String>) -> HttpResponse {
    // `get_all` is what the original dashboard client sends.
    match query.get("action").map(String::as_str) {
        Some("list") | Some("get_all") => {}
        _ => return HttpResponse::bad_request("query parameter 'action' must be 'list'"),
    }

    let Ok(mut rt) = runtime.lock() else {
        return HttpResponse::internal_server_error("failed to acquire service runtime lock");
    };
    rt.observe_list_request();
    match rt.store().read_all() {
        Ok(snapshot) => {
            if snapshot.corrupt_recovered {
                rt.observe_corrupt_recovered();
                rt.event_log()
                    .log("WARNING: store document is unparsable; list served as empty");
                eprintln!("callback store is corrupt; list served as empty");
            }
            HttpResponse::ok_json(payload::render_json(&snapshot.records))
        }
        Err(err) => {
            rt.event_log().log(&format!("store read failed: {err:?}"));
            HttpResponse::internal_server_error("failed to read callback records")
        }
    }
}

fn handle_diagnostics(runtime: &SharedRuntime, setup: bool) -> HttpResponse {
    let Ok(mut rt) = runtime.lock() else {
        return HttpResponse::internal_server_error("failed to acquire service runtime lock");
    };

    let mut store_created = false;
    if setup {
        match rt.store().ensure_exists() {
            Ok(created) => {
                store_created = created;
                if created {
                    rt.event_log().log("store document created by setup");
                }
            }
            Err(err) => {
                rt.event_log()
                    .log(&format!("store initialization failed: {err:?}"));
                return HttpResponse::internal_server_error("failed to initialize callback store");
            }
        }
        if let Err(err) = rt.event_log().ensure_dir() {
            eprintln!("callback log directory setup failed: {err}");
        }
    }

    match rt.store().report(rt.report_recent()) {
        Ok(report) => {
            if report.corrupt_recovered {
                rt.observe_corrupt_recovered();
                rt.event_log()
                    .log("WARNING: store document is unparsable; diagnostics reported it as empty");
            }
            let body = serde_json::json!({
                "store": report,
                "storeCreated": store_created,
                "logDir": rt.event_log().dir(),
                "logDirExists": rt.event_log().dir().is_dir(),
                "recentLogLines": rt.event_log().tail_current(20),
            });
            HttpResponse::ok_json(body.to_string())
        }
        Err(err) => {
            rt.event_log().log(&format!("store report failed: {err:?}"));
            HttpResponse::internal_server_error("failed to inspect callback store")
        }
    }
}
