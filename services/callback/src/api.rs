use schema::SubmissionFields;
use serde::{Deserialize, Serialize};

/// Incoming submission payload. Clients send extra bookkeeping fields
/// (`timestamp`, `language`); anything outside the form fields is ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmitApiRequest {
    pub full_name: Option<String>,
    pub mobile_number: Option<String>,
    pub email: Option<String>,
    pub business_name: Option<String>,
    pub requirement: Option<String>,
    pub message: Option<String>,
}

impl SubmitApiRequest {
    pub fn into_fields(self) -> SubmissionFields {
        SubmissionFields {
            full_name: self.full_name,
            mobile_number: self.mobile_number,
            email: self.email,
            business_name: self.business_name,
            requirement: self.requirement,
            message: self.message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFailure {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitApiResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldFailure>,
}

impl SubmitApiResponse {
    pub fn accepted(id: String, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            id: Some(id),
            errors: Vec::new(),
        }
    }

    pub fn rejected(message: impl Into<String>, errors: Vec<FieldFailure>) -> Self {
        Self {
            success: false,
            message: message.into(),
            id: None,
            errors,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            id: None,
            errors: Vec::new(),
        }
    }
}
