use serde_json::Value;
use thiserror::Error;

/// Errors produced while turning a payload or policy into an [`AclDocument`](crate::AclDocument).
#[derive(Debug, Error)]
pub enum AclError {
    /// The resolved-ACL payload does not have the expected shape.
    #[error("malformed ACL payload at `{location}`: expected {expected}, found {found}")]
    MalformedAcl {
        location: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The authorization service returned no payload at all.
    #[error("the authorization service returned no ACL data")]
    NoData,

    /// An offline policy document could not be compiled.
    #[error("invalid policy `{policy}` at path `{path}`: {reason}")]
    InvalidPolicy {
        policy: String,
        path: String,
        reason: String,
    },
}

impl AclError {
    pub(crate) fn malformed(location: impl Into<String>, expected: &'static str, found: &Value) -> Self {
        AclError::MalformedAcl {
            location: location.into(),
            expected,
            found: value_kind(found),
        }
    }
}

/// Errors raised by an [`AclSource`](crate::AclSource) while fetching a payload.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors from [`AclHandle::refresh`](crate::AclHandle::refresh).
///
/// Whatever the variant, the previously published document stays in place.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("failed to fetch ACL: {0}")]
    Source(#[from] SourceError),

    #[error(transparent)]
    Acl(#[from] AclError),
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
