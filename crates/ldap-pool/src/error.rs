//! Pool and directory error types.

use std::time::Duration;

use thiserror::Error;

use crate::result_code::ResultCode;

/// Errors that can occur during pool operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PoolError {
    /// Failed to acquire a connection within the configured timeout.
    #[error("connection acquisition timeout after {0:?}")]
    AcquisitionTimeout(Duration),

    /// Pool is closed.
    #[error("pool is closed")]
    PoolClosed,

    /// The connection factory failed to produce a connection.
    #[error("failed to create connection: {0}")]
    ConnectionCreation(#[source] DirectoryError),

    /// Pool configuration error.
    #[error("pool configuration error: {0}")]
    Configuration(String),
}

impl PoolError {
    /// Check if this error means the pool has been shut down.
    ///
    /// Callers should stop retrying once they see this.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::PoolClosed)
    }

    /// Check if the same call may succeed if attempted again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AcquisitionTimeout(_) | Self::ConnectionCreation(_))
    }
}

/// Errors returned by a directory connection or connection factory.
///
/// These pass through the pool unmodified. The pool only looks at
/// [`result_code()`](DirectoryError::result_code) to decide whether a
/// connection should be retired.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum DirectoryError {
    /// The server answered with a non-success result.
    #[error("LDAP result code {code}: {message}")]
    Result {
        /// Result code from the response.
        code: ResultCode,
        /// Matched DN from the response, possibly empty.
        matched_dn: String,
        /// Diagnostic message from the response, possibly empty.
        message: String,
    },

    /// Transport-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// The operation did not complete within the connection timeout.
    #[error("operation timed out")]
    Timeout,

    /// The connection does not support the requested operation.
    #[error("operation not supported: {0}")]
    Unsupported(String),

    /// Any other client-side failure.
    #[error("{0}")]
    Other(String),
}

impl DirectoryError {
    /// Create a result error with an empty matched DN.
    pub fn result(code: ResultCode, message: impl Into<String>) -> Self {
        Self::Result {
            code,
            matched_dn: String::new(),
            message: message.into(),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// The result code this error carries, if any.
    ///
    /// Transport failures and timeouts report
    /// [`ResultCode::NETWORK_ERROR`].
    #[must_use]
    pub fn result_code(&self) -> Option<ResultCode> {
        match self {
            Self::Result { code, .. } => Some(*code),
            Self::Network(_) | Self::Timeout => Some(ResultCode::NETWORK_ERROR),
            Self::Unsupported(_) | Self::Other(_) => None,
        }
    }

    /// Check if this error carries the given result code.
    #[must_use]
    pub fn has_code(&self, code: ResultCode) -> bool {
        self.result_code() == Some(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_code_of_server_error() {
        let err = DirectoryError::result(ResultCode::BUSY, "try later");
        assert_eq!(err.result_code(), Some(ResultCode::BUSY));
        assert!(err.has_code(ResultCode::BUSY));
        assert!(!err.has_code(ResultCode::UNAVAILABLE));
    }

    #[test]
    fn test_transport_errors_report_network_code() {
        assert_eq!(
            DirectoryError::network("connection reset").result_code(),
            Some(ResultCode::NETWORK_ERROR)
        );
        assert_eq!(
            DirectoryError::Timeout.result_code(),
            Some(ResultCode::NETWORK_ERROR)
        );
    }

    #[test]
    fn test_codeless_errors() {
        assert!(DirectoryError::Unsupported("x".into()).result_code().is_none());
        assert!(DirectoryError::Other("x".into()).result_code().is_none());
    }

    #[test]
    fn test_pool_error_classification() {
        assert!(PoolError::PoolClosed.is_closed());
        assert!(!PoolError::PoolClosed.is_retryable());
        assert!(PoolError::AcquisitionTimeout(Duration::from_secs(1)).is_retryable());
        assert!(PoolError::ConnectionCreation(DirectoryError::Timeout).is_retryable());
        assert!(!PoolError::Configuration("bad".into()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = DirectoryError::result(ResultCode::INVALID_CREDENTIALS, "bad password");
        assert_eq!(
            err.to_string(),
            "LDAP result code 49 (invalidCredentials): bad password"
        );

        let err = PoolError::ConnectionCreation(DirectoryError::network("refused"));
        assert_eq!(
            err.to_string(),
            "failed to create connection: network error: refused"
        );
    }
}
