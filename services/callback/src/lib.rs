pub mod api;
pub mod transport;
#[cfg(feature = "async-transport")]
pub mod transport_axum;

use chrono::Utc;
use schema::{
    CallbackRecord, CallbackStatus, SubmissionFields, ValidSubmission, ValidationError,
    sanitize_input, validate_submission,
};
use store::{CallbackStore, StoreError};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitError {
    /// Client-caused: the submission failed one or more field rules.
    /// Nothing was persisted.
    Invalid(Vec<ValidationError>),
    /// Environment-caused: the store could not commit the record.
    Store(StoreError),
}

impl From<StoreError> for SubmitError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub record: CallbackRecord,
    pub total_records: usize,
    /// The store document existed but was unparsable and was recovered as
    /// empty during this append. Callers must log this prominently.
    pub corrupt_recovered: bool,
}

/// Builds the persisted record from a validated submission: server-assigned
/// id and timestamps, every field sanitized, status `pending`.
pub fn build_record(valid: &ValidSubmission) -> CallbackRecord {
    let created_at = Utc::now();
    CallbackRecord {
        id: format!("CB_{}", Uuid::new_v4().simple()),
        created_at,
        date: created_at.format("%Y-%m-%d").to_string(),
        full_name: sanitize_input(&valid.full_name),
        mobile_number: sanitize_input(&valid.mobile_number),
        email: sanitize_input(&valid.email),
        business_name: sanitize_input(&valid.business_name),
        requirement: sanitize_input(&valid.requirement),
        message: sanitize_input(&valid.message),
        status: CallbackStatus::Pending,
        notes: String::new(),
    }
}

/// Validate → sanitize → append, as one logical operation. Validation
/// failures short-circuit before any store access.
pub fn submit_callback(
    store: &CallbackStore,
    fields: &SubmissionFields,
) -> Result<SubmitOutcome, SubmitError> {
    let valid = validate_submission(fields).map_err(SubmitError::Invalid)?;
    let record = build_record(&valid);
    let receipt = store.append(record.clone())?;
    Ok(SubmitOutcome {
        record,
        total_records: receipt.total_records,
        corrupt_recovered: receipt.corrupt_recovered,
    })
}
