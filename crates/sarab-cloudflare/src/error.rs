//! Control-plane client errors.

use thiserror::Error;

/// Cloudflare API error codes meaning "this DNS record already exists".
const RECORD_EXISTS_CODES: [u32; 2] = [81053, 81057];

/// Errors from control-plane calls.
#[derive(Debug, Error)]
pub enum CloudflareError {
    /// The control plane rejected the credential outright.
    #[error("credential rejected by the control plane (token missing, expired, or disabled)")]
    CredentialInvalid,

    /// The credential is valid but grants access to zero accounts.
    #[error("credential is valid but has no access to any account")]
    NoAccountAccess,

    /// An account-scoped call was made with an identity lacking a cached
    /// account id.
    #[error("account id missing for identity")]
    MissingAccountId,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response or `success: false` envelope from the API.
    #[error("Cloudflare API error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<u32>,
        message: String,
    },

    /// A 2xx response whose body did not match the expected shape.
    #[error("unexpected Cloudflare response: {0}")]
    Malformed(String),
}

impl CloudflareError {
    /// Whether this error means a DNS record with the same name already
    /// exists, i.e. reconciliation should take over.
    pub fn is_record_conflict(&self) -> bool {
        match self {
            Self::Api { code, message, .. } => {
                code.is_some_and(|c| RECORD_EXISTS_CODES.contains(&c))
                    || message.contains("already exists")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn conflict_detected_by_code() {
        let err = CloudflareError::Api {
            status: 400,
            code: Some(81057),
            message: "Record already exists.".into(),
        };
        assert!(err.is_record_conflict());
    }

    #[test]
    fn conflict_detected_by_message_without_code() {
        let err = CloudflareError::Api {
            status: 400,
            code: None,
            message: "An A, AAAA, or CNAME record with that host already exists".into(),
        };
        assert!(err.is_record_conflict());
    }

    #[test]
    fn other_api_errors_are_not_conflicts() {
        let err = CloudflareError::Api {
            status: 403,
            code: Some(9109),
            message: "Invalid access token".into(),
        };
        assert!(!err.is_record_conflict());
        assert!(!CloudflareError::CredentialInvalid.is_record_conflict());
    }
}
