//! LDAP result codes.
//!
//! Result codes are carried by [`DirectoryError::Result`](crate::DirectoryError)
//! and are what a [`RetirementPolicy`](crate::RetirementPolicy) matches on.
//! Codes `0..=123` come from RFC 4511 and its extensions; codes `200..=206`
//! are client-side conditions that never travel on the wire (a broken
//! socket, an unparsable filter, ...).

use std::fmt;

/// A protocol-level LDAP result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResultCode(u16);

impl ResultCode {
    /// Operation completed successfully.
    pub const SUCCESS: Self = Self(0);
    /// Server-side operations error.
    pub const OPERATIONS_ERROR: Self = Self(1);
    /// Malformed or unexpected protocol data.
    pub const PROTOCOL_ERROR: Self = Self(2);
    /// The server-side time limit for the operation was exceeded.
    pub const TIME_LIMIT_EXCEEDED: Self = Self(3);
    /// The server-side size limit for the operation was exceeded.
    pub const SIZE_LIMIT_EXCEEDED: Self = Self(4);
    /// Compare operation evaluated to false.
    pub const COMPARE_FALSE: Self = Self(5);
    /// Compare operation evaluated to true.
    pub const COMPARE_TRUE: Self = Self(6);
    /// Requested authentication method is not supported.
    pub const AUTH_METHOD_NOT_SUPPORTED: Self = Self(7);
    /// Stronger authentication is required.
    pub const STRONGER_AUTH_REQUIRED: Self = Self(8);
    /// A referral was returned.
    pub const REFERRAL: Self = Self(10);
    /// An administrative limit was exceeded.
    pub const ADMIN_LIMIT_EXCEEDED: Self = Self(11);
    /// A critical control is not available.
    pub const UNAVAILABLE_CRITICAL_EXTENSION: Self = Self(12);
    /// Confidentiality (TLS) is required.
    pub const CONFIDENTIALITY_REQUIRED: Self = Self(13);
    /// SASL bind is in progress.
    pub const SASL_BIND_IN_PROGRESS: Self = Self(14);
    /// The attribute does not exist on the entry.
    pub const NO_SUCH_ATTRIBUTE: Self = Self(16);
    /// The attribute type is not defined in the schema.
    pub const UNDEFINED_ATTRIBUTE_TYPE: Self = Self(17);
    /// Inappropriate matching rule.
    pub const INAPPROPRIATE_MATCHING: Self = Self(18);
    /// A constraint was violated.
    pub const CONSTRAINT_VIOLATION: Self = Self(19);
    /// The attribute or value already exists.
    pub const ATTRIBUTE_OR_VALUE_EXISTS: Self = Self(20);
    /// Invalid attribute syntax.
    pub const INVALID_ATTRIBUTE_SYNTAX: Self = Self(21);
    /// The target entry does not exist.
    pub const NO_SUCH_OBJECT: Self = Self(32);
    /// Alias problem.
    pub const ALIAS_PROBLEM: Self = Self(33);
    /// Malformed distinguished name.
    pub const INVALID_DN_SYNTAX: Self = Self(34);
    /// Alias dereferencing problem.
    pub const ALIAS_DEREFERENCING_PROBLEM: Self = Self(36);
    /// Inappropriate authentication.
    pub const INAPPROPRIATE_AUTHENTICATION: Self = Self(48);
    /// Invalid credentials.
    pub const INVALID_CREDENTIALS: Self = Self(49);
    /// Insufficient access rights.
    pub const INSUFFICIENT_ACCESS_RIGHTS: Self = Self(50);
    /// The server is busy.
    pub const BUSY: Self = Self(51);
    /// The server is unavailable.
    pub const UNAVAILABLE: Self = Self(52);
    /// The server is unwilling to perform the operation.
    pub const UNWILLING_TO_PERFORM: Self = Self(53);
    /// A loop was detected.
    pub const LOOP_DETECT: Self = Self(54);
    /// Naming violation.
    pub const NAMING_VIOLATION: Self = Self(64);
    /// Object class violation.
    pub const OBJECT_CLASS_VIOLATION: Self = Self(65);
    /// Operation not allowed on a non-leaf entry.
    pub const NOT_ALLOWED_ON_NON_LEAF: Self = Self(66);
    /// Operation not allowed on an RDN attribute.
    pub const NOT_ALLOWED_ON_RDN: Self = Self(67);
    /// The entry already exists.
    pub const ENTRY_ALREADY_EXISTS: Self = Self(68);
    /// Object class modifications are prohibited.
    pub const OBJECT_CLASS_MODS_PROHIBITED: Self = Self(69);
    /// The operation affects multiple DSAs.
    pub const AFFECTS_MULTIPLE_DSAS: Self = Self(71);
    /// Unspecified server error.
    pub const OTHER: Self = Self(80);
    /// The operation was canceled.
    pub const CANCELED: Self = Self(118);
    /// No such operation to cancel.
    pub const NO_SUCH_OPERATION: Self = Self(119);
    /// Too late to cancel.
    pub const TOO_LATE: Self = Self(120);
    /// Cannot cancel the operation.
    pub const CANNOT_CANCEL: Self = Self(121);
    /// Assertion control evaluated to false.
    pub const ASSERTION_FAILED: Self = Self(122);
    /// Proxied authorization was denied.
    pub const AUTHORIZATION_DENIED: Self = Self(123);

    /// Client-side: the transport failed or timed out.
    pub const NETWORK_ERROR: Self = Self(200);
    /// Client-side: a search filter could not be compiled.
    pub const FILTER_COMPILE: Self = Self(201);
    /// Client-side: a search filter could not be decompiled.
    pub const FILTER_DECOMPILE: Self = Self(202);
    /// Client-side: debugging failure.
    pub const DEBUGGING: Self = Self(203);
    /// Client-side: an unexpected message was received.
    pub const UNEXPECTED_MESSAGE: Self = Self(204);
    /// Client-side: an unexpected response was received.
    pub const UNEXPECTED_RESPONSE: Self = Self(205);
    /// Client-side: a simple bind was attempted with an empty password.
    pub const EMPTY_PASSWORD: Self = Self(206);

    /// Create a result code from its numeric value.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric value of this code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Check if this code is generated on the client rather than by a server.
    #[must_use]
    pub const fn is_client_side(self) -> bool {
        self.0 >= 200
    }

    /// Short symbolic name, if this is a well-known code.
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::SUCCESS => "success",
            Self::OPERATIONS_ERROR => "operationsError",
            Self::PROTOCOL_ERROR => "protocolError",
            Self::TIME_LIMIT_EXCEEDED => "timeLimitExceeded",
            Self::SIZE_LIMIT_EXCEEDED => "sizeLimitExceeded",
            Self::COMPARE_FALSE => "compareFalse",
            Self::COMPARE_TRUE => "compareTrue",
            Self::AUTH_METHOD_NOT_SUPPORTED => "authMethodNotSupported",
            Self::STRONGER_AUTH_REQUIRED => "strongerAuthRequired",
            Self::REFERRAL => "referral",
            Self::ADMIN_LIMIT_EXCEEDED => "adminLimitExceeded",
            Self::UNAVAILABLE_CRITICAL_EXTENSION => "unavailableCriticalExtension",
            Self::CONFIDENTIALITY_REQUIRED => "confidentialityRequired",
            Self::SASL_BIND_IN_PROGRESS => "saslBindInProgress",
            Self::NO_SUCH_ATTRIBUTE => "noSuchAttribute",
            Self::UNDEFINED_ATTRIBUTE_TYPE => "undefinedAttributeType",
            Self::INAPPROPRIATE_MATCHING => "inappropriateMatching",
            Self::CONSTRAINT_VIOLATION => "constraintViolation",
            Self::ATTRIBUTE_OR_VALUE_EXISTS => "attributeOrValueExists",
            Self::INVALID_ATTRIBUTE_SYNTAX => "invalidAttributeSyntax",
            Self::NO_SUCH_OBJECT => "noSuchObject",
            Self::ALIAS_PROBLEM => "aliasProblem",
            Self::INVALID_DN_SYNTAX => "invalidDNSyntax",
            Self::ALIAS_DEREFERENCING_PROBLEM => "aliasDereferencingProblem",
            Self::INAPPROPRIATE_AUTHENTICATION => "inappropriateAuthentication",
            Self::INVALID_CREDENTIALS => "invalidCredentials",
            Self::INSUFFICIENT_ACCESS_RIGHTS => "insufficientAccessRights",
            Self::BUSY => "busy",
            Self::UNAVAILABLE => "unavailable",
            Self::UNWILLING_TO_PERFORM => "unwillingToPerform",
            Self::LOOP_DETECT => "loopDetect",
            Self::NAMING_VIOLATION => "namingViolation",
            Self::OBJECT_CLASS_VIOLATION => "objectClassViolation",
            Self::NOT_ALLOWED_ON_NON_LEAF => "notAllowedOnNonLeaf",
            Self::NOT_ALLOWED_ON_RDN => "notAllowedOnRDN",
            Self::ENTRY_ALREADY_EXISTS => "entryAlreadyExists",
            Self::OBJECT_CLASS_MODS_PROHIBITED => "objectClassModsProhibited",
            Self::AFFECTS_MULTIPLE_DSAS => "affectsMultipleDSAs",
            Self::OTHER => "other",
            Self::CANCELED => "canceled",
            Self::NO_SUCH_OPERATION => "noSuchOperation",
            Self::TOO_LATE => "tooLate",
            Self::CANNOT_CANCEL => "cannotCancel",
            Self::ASSERTION_FAILED => "assertionFailed",
            Self::AUTHORIZATION_DENIED => "authorizationDenied",
            Self::NETWORK_ERROR => "networkError",
            Self::FILTER_COMPILE => "filterCompile",
            Self::FILTER_DECOMPILE => "filterDecompile",
            Self::DEBUGGING => "debugging",
            Self::UNEXPECTED_MESSAGE => "unexpectedMessage",
            Self::UNEXPECTED_RESPONSE => "unexpectedResponse",
            Self::EMPTY_PASSWORD => "emptyPassword",
            _ => return None,
        };
        Some(name)
    }
}

impl From<u16> for ResultCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl From<ResultCode> for u16 {
    fn from(code: ResultCode) -> Self {
        code.0
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({name})", self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_known_code() {
        assert_eq!(
            ResultCode::TIME_LIMIT_EXCEEDED.to_string(),
            "3 (timeLimitExceeded)"
        );
        assert_eq!(ResultCode::NETWORK_ERROR.to_string(), "200 (networkError)");
    }

    #[test]
    fn test_display_unknown_code() {
        assert_eq!(ResultCode::new(4096).to_string(), "4096");
        assert!(ResultCode::new(4096).name().is_none());
    }

    #[test]
    fn test_client_side_codes() {
        assert!(ResultCode::NETWORK_ERROR.is_client_side());
        assert!(ResultCode::EMPTY_PASSWORD.is_client_side());
        assert!(!ResultCode::BUSY.is_client_side());
        assert!(!ResultCode::OTHER.is_client_side());
    }

    #[test]
    fn test_numeric_conversions() {
        let code = ResultCode::from(49u16);
        assert_eq!(code, ResultCode::INVALID_CREDENTIALS);
        assert_eq!(u16::from(code), 49);
        assert_eq!(code.as_u16(), 49);
    }
}
