use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Core domain enums
// ---------------------------------------------------------------------------

/// Operator-facing lifecycle of a captured lead. A record is created as
/// `Pending`; later transitions happen outside the capture path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackStatus {
    #[default]
    Pending,
    Contacted,
    Closed,
}

// ---------------------------------------------------------------------------
// Core domain types
// ---------------------------------------------------------------------------

/// One captured lead, exactly as it lives in the store document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackRecord {
    pub id: String,
    /// Server-assigned at persistence time, never client-supplied.
    pub created_at: DateTime<Utc>,
    /// Calendar-day bucket (`YYYY-MM-DD`) kept alongside the instant for
    /// correlation with the day-bucketed event log.
    pub date: String,
    pub full_name: String,
    pub mobile_number: String,
    pub email: String,
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub requirement: String,
    #[serde(default)]
    pub message: String,
    pub status: CallbackStatus,
    #[serde(default)]
    pub notes: String,
}

/// Raw form fields as they arrive over the wire, before any validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionFields {
    pub full_name: Option<String>,
    pub mobile_number: Option<String>,
    pub email: Option<String>,
    pub business_name: Option<String>,
    pub requirement: Option<String>,
    pub message: Option<String>,
}

/// Trimmed, validated field set. Optional fields default to empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSubmission {
    pub full_name: String,
    pub mobile_number: String,
    pub email: String,
    pub business_name: String,
    pub requirement: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    MissingField(&'static str),
    InvalidFormat(&'static str),
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField(field) | Self::InvalidFormat(field) => field,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::MissingField(field) => format!("{field} is required"),
            Self::InvalidFormat(field) => format!("{field} has an invalid format"),
        }
    }
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"))
}

fn mobile_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[6-9][0-9]{9}$").expect("mobile pattern is valid"))
}

fn trimmed(value: Option<&String>) -> &str {
    value.map(|raw| raw.trim()).unwrap_or("")
}

/// Checks every rule and collects all failures instead of stopping at the
/// first, so the caller can report field-level detail in one response.
///
/// Rules: `fullName`, `mobileNumber`, `email` are required and non-empty
/// after trimming; `email` must look like `local@domain.tld`; `mobileNumber`
/// must be exactly 10 digits starting with 6-9; `businessName`, when
/// present, must be at least 3 characters.
pub fn validate_submission(
    fields: &SubmissionFields,
) -> Result<ValidSubmission, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let full_name = trimmed(fields.full_name.as_ref());
    if full_name.is_empty() {
        errors.push(ValidationError::MissingField("fullName"));
    }

    let mobile_number = trimmed(fields.mobile_number.as_ref());
    if mobile_number.is_empty() {
        errors.push(ValidationError::MissingField("mobileNumber"));
    } else if !mobile_regex().is_match(mobile_number) {
        errors.push(ValidationError::InvalidFormat("mobileNumber"));
    }

    let email = trimmed(fields.email.as_ref());
    if email.is_empty() {
        errors.push(ValidationError::MissingField("email"));
    } else if !email_regex().is_match(email) {
        errors.push(ValidationError::InvalidFormat("email"));
    }

    let business_name = trimmed(fields.business_name.as_ref());
    if !business_name.is_empty() && business_name.chars().count() < 3 {
        errors.push(ValidationError::InvalidFormat("businessName"));
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ValidSubmission {
        full_name: full_name.to_string(),
        mobile_number: mobile_number.to_string(),
        email: email.to_string(),
        business_name: business_name.to_string(),
        requirement: trimmed(fields.requirement.as_ref()).to_string(),
        message: trimmed(fields.message.as_ref()).to_string(),
    })
}

// ---------------------------------------------------------------------------
// Sanitization
// ---------------------------------------------------------------------------

const ESCAPED_ENTITIES: [&str; 5] = ["&amp;", "&lt;", "&gt;", "&quot;", "&#39;"];

/// Trims the input and escapes HTML-significant characters. An `&` that
/// already begins one of the entities this function emits is left alone,
/// which keeps the function idempotent: sanitizing sanitized text is a
/// no-op.
pub fn sanitize_input(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut out = String::with_capacity(trimmed.len());
    for (idx, ch) in trimmed.char_indices() {
        match ch {
            '&' => {
                let rest = &trimmed[idx..];
                if ESCAPED_ENTITIES.iter().any(|entity| rest.starts_with(entity)) {
                    out.push('&');
                } else {
                    out.push_str("&amp;");
                }
            }
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
