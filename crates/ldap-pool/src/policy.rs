//! Error-driven connection retirement.

use std::collections::HashSet;

use crate::error::DirectoryError;
use crate::result_code::ResultCode;

/// The set of result codes that retire a connection instead of recycling it.
///
/// When an operation on a [`PooledConnection`](crate::PooledConnection)
/// fails with an error whose [`result_code()`](DirectoryError::result_code)
/// is in this set, the connection is marked unusable and will be torn down
/// on close. Matching is exact; the set is fixed once the pool is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetirementPolicy {
    codes: HashSet<ResultCode>,
}

impl RetirementPolicy {
    /// Create a policy that never retires connections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a policy that retires on the given codes.
    pub fn from_codes(codes: impl IntoIterator<Item = ResultCode>) -> Self {
        Self {
            codes: codes.into_iter().collect(),
        }
    }

    /// Retire on server time limits and transport failures.
    #[must_use]
    pub fn network_and_time_limit() -> Self {
        Self::from_codes([ResultCode::TIME_LIMIT_EXCEEDED, ResultCode::NETWORK_ERROR])
    }

    /// Add a code to the policy.
    #[must_use]
    pub fn with_code(mut self, code: ResultCode) -> Self {
        self.codes.insert(code);
        self
    }

    /// Check if the given code retires a connection.
    #[must_use]
    pub fn contains(&self, code: ResultCode) -> bool {
        self.codes.contains(&code)
    }

    /// Check if the given error retires a connection.
    #[must_use]
    pub fn should_retire(&self, err: &DirectoryError) -> bool {
        err.result_code().is_some_and(|code| self.contains(code))
    }

    /// Number of codes in the policy.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Check if the policy is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Iterate over the configured codes in no particular order.
    pub fn codes(&self) -> impl Iterator<Item = ResultCode> + '_ {
        self.codes.iter().copied()
    }
}

impl FromIterator<ResultCode> for RetirementPolicy {
    fn from_iter<I: IntoIterator<Item = ResultCode>>(iter: I) -> Self {
        Self::from_codes(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_policy_never_retires() {
        let policy = RetirementPolicy::new();
        assert!(policy.is_empty());
        assert!(!policy.should_retire(&DirectoryError::network("reset")));
        assert!(!policy.should_retire(&DirectoryError::result(ResultCode::BUSY, "")));
    }

    #[test]
    fn test_exact_code_match() {
        let policy = RetirementPolicy::network_and_time_limit();
        assert_eq!(policy.len(), 2);

        assert!(policy.should_retire(&DirectoryError::result(
            ResultCode::TIME_LIMIT_EXCEEDED,
            "time limit"
        )));
        assert!(policy.should_retire(&DirectoryError::network("broken pipe")));
        assert!(policy.should_retire(&DirectoryError::Timeout));

        assert!(!policy.should_retire(&DirectoryError::result(
            ResultCode::SIZE_LIMIT_EXCEEDED,
            "size limit"
        )));
        assert!(!policy.should_retire(&DirectoryError::Other("boom".into())));
    }

    #[test]
    fn test_duplicates_collapse() {
        let policy: RetirementPolicy = [ResultCode::BUSY, ResultCode::BUSY, ResultCode::UNAVAILABLE]
            .into_iter()
            .collect();
        assert_eq!(policy.len(), 2);
        assert!(policy.contains(ResultCode::UNAVAILABLE));
    }

    #[test]
    fn test_with_code() {
        let policy = RetirementPolicy::new().with_code(ResultCode::UNWILLING_TO_PERFORM);
        assert!(policy.contains(ResultCode::UNWILLING_TO_PERFORM));
        assert_eq!(policy.codes().count(), 1);
    }
}
