use std::{
    fs::{OpenOptions, create_dir_all},
    io::Write,
    path::{Path, PathBuf},
};

use schema::CallbackRecord;

use super::EventLog;

/// Best-effort notification: renders a plain-text summary of the record
/// and drops it into the outbox spool on a background thread, after the
/// append has already committed. Returns `true` when a dispatch was
/// started. The thread's outcome never reaches the client.
pub(super) fn spawn_notification(
    outbox_dir: Option<&Path>,
    event_log: &EventLog,
    record: &CallbackRecord,
) -> bool {
    let Some(outbox_dir) = outbox_dir else {
        return false;
    };
    let outbox_dir = outbox_dir.to_path_buf();
    let event_log = event_log.clone();
    let record = record.clone();
    std::thread::spawn(move || match write_outbox_entry(&outbox_dir, &record) {
        Ok(path) => event_log.log(&format!("notification queued: {}", path.display())),
        Err(err) => {
            event_log.log(&format!("notification failed for {}: {err}", record.id));
            eprintln!("callback notification failed for {}: {err}", record.id);
        }
    });
    true
}

fn write_outbox_entry(outbox_dir: &Path, record: &CallbackRecord) -> Result<PathBuf, String> {
    create_dir_all(outbox_dir).map_err(|err| format!("creating outbox failed: {err}"))?;
    let path = outbox_dir.join(format!("{}.txt", record.id));
    let mut file = OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(&path)
        .map_err(|err| format!("creating outbox entry failed: {err}"))?;
    file.write_all(render_notification_body(record).as_bytes())
        .map_err(|err| format!("writing outbox entry failed: {err}"))?;
    Ok(path)
}

pub(super) fn render_notification_body(record: &CallbackRecord) -> String {
    format!(
        "Subject: New Callback Request - {}\n\
         \n\
         ID: {}\n\
         Date & Time: {}\n\
         Full Name: {}\n\
         Mobile Number: {}\n\
         Email: {}\n\
         Business Name: {}\n\
         Requirement: {}\n\
         Message: {}\n",
        record.full_name,
        record.id,
        record.created_at.to_rfc3339(),
        record.full_name,
        record.mobile_number,
        record.email,
        record.business_name,
        record.requirement,
        record.message,
    )
}
