//! Errors raised by pull request sources

use thiserror::Error;

/// Errors a `PullRequestSource` reports in a form the tree can act on
///
/// Sources return `anyhow::Result`; the tree downcasts to this type to
/// decide between a sign-in prompt and a plain error entry.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No credentials for the host
    #[error("Not signed in to {host}")]
    Unauthenticated {
        /// Host that rejected the request
        host: String,
    },

    /// The requested pull request does not exist
    #[error("Pull request #{0} not found")]
    NotFound(u64),

    /// The request itself failed
    #[error("Request failed: {0}")]
    Request(String),
}

impl ClientError {
    /// Whether the error asks the user to sign in to an enterprise host
    pub fn is_enterprise_auth(&self) -> bool {
        matches!(self, ClientError::Unauthenticated { host } if host != crate::DEFAULT_HOST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enterprise_auth_detection() {
        let github = ClientError::Unauthenticated {
            host: "github.com".to_string(),
        };
        let ghe = ClientError::Unauthenticated {
            host: "ghe.example.com".to_string(),
        };
        assert!(!github.is_enterprise_auth());
        assert!(ghe.is_enterprise_auth());
        assert!(!ClientError::NotFound(1).is_enterprise_auth());
    }

    #[test]
    fn test_downcast_from_anyhow() {
        let err: anyhow::Error = ClientError::Request("timeout".to_string()).into();
        let client_err = err.downcast_ref::<ClientError>().unwrap();
        assert_eq!(client_err.to_string(), "Request failed: timeout");
    }
}
