use schema::{SubmissionFields, ValidationError};
use serde::Serialize;

use crate::api::{FieldFailure, SubmitApiRequest};

pub(super) fn build_submission_from_json(body: &str) -> Result<SubmissionFields, String> {
    let request: SubmitApiRequest = serde_json::from_str(body)
        .map_err(|err| format!("request body must be a JSON object with form fields: {err}"))?;
    Ok(request.into_fields())
}

/// Unknown keys (the site client sends `timestamp` and `language`
/// alongside the form fields) are ignored.
pub(super) fn build_submission_from_form(body: &[u8]) -> SubmissionFields {
    let mut fields = SubmissionFields::default();
    for (key, value) in url::form_urlencoded::parse(body) {
        let value = value.into_owned();
        match key.as_ref() {
            "fullName" => fields.full_name = Some(value),
            "mobileNumber" => fields.mobile_number = Some(value),
            "email" => fields.email = Some(value),
            "businessName" => fields.business_name = Some(value),
            "requirement" => fields.requirement = Some(value),
            "message" => fields.message = Some(value),
            _ => {}
        }
    }
    fields
}

pub(super) fn field_failures(errors: &[ValidationError]) -> Vec<FieldFailure> {
    errors
        .iter()
        .map(|error| FieldFailure {
            field: error.field().to_string(),
            message: error.message(),
        })
        .collect()
}

pub(super) fn render_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "{\"error\":\"response serialization failed\"}".to_string())
}
