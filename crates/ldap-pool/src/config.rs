//! Pool configuration.

use std::sync::Arc;
use std::time::Duration;

use crate::error::PoolError;
use crate::policy::RetirementPolicy;
use crate::result_code::ResultCode;

/// Default diagnostic name of a pool.
pub const DEFAULT_POOL_NAME: &str = "ldap-pool";

/// Configuration for the connection pool.
///
/// This struct is marked `#[non_exhaustive]` to allow adding new fields
/// in future minor versions without breaking changes. Use the builder
/// pattern methods or [`Default::default()`] to construct instances.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct PoolConfig {
    /// Diagnostic name, passed to the factory and attached to log records.
    pub name: Arc<str>,

    /// Number of connections created eagerly when the pool is built.
    pub initial_connections: u32,

    /// Maximum number of live connections (idle plus checked out).
    pub max_connections: u32,

    /// How long [`Pool::get`](crate::Pool::get) may wait for a connection.
    ///
    /// `None` waits until a connection is returned or the pool shuts down.
    pub connection_timeout: Option<Duration>,

    /// Idle time after which the reaper evicts a connection.
    pub idle_timeout: Option<Duration>,

    /// Age after which the reaper evicts an idle connection.
    pub max_lifetime: Option<Duration>,

    /// Result codes that retire a connection instead of recycling it.
    pub retirement: RetirementPolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: Arc::from(DEFAULT_POOL_NAME),
            initial_connections: 1,
            max_connections: 10,
            connection_timeout: None,
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
            retirement: RetirementPolicy::default(),
        }
    }
}

impl PoolConfig {
    /// Create a new pool configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the diagnostic name.
    #[must_use]
    pub fn name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the number of connections created at startup.
    #[must_use]
    pub fn initial_connections(mut self, count: u32) -> Self {
        self.initial_connections = count;
        self
    }

    /// Set the maximum number of connections.
    #[must_use]
    pub fn max_connections(mut self, count: u32) -> Self {
        self.max_connections = count;
        self
    }

    /// Bound how long a checkout may wait.
    #[must_use]
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = Some(timeout);
        self
    }

    /// Set the idle connection timeout used by the reaper.
    #[must_use]
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the maximum connection lifetime used by the reaper.
    #[must_use]
    pub fn max_lifetime(mut self, lifetime: Option<Duration>) -> Self {
        self.max_lifetime = lifetime;
        self
    }

    /// Set the result codes that retire a connection.
    #[must_use]
    pub fn retire_on(mut self, codes: impl IntoIterator<Item = ResultCode>) -> Self {
        self.retirement = RetirementPolicy::from_codes(codes);
        self
    }

    /// Set the retirement policy.
    #[must_use]
    pub fn retirement(mut self, policy: RetirementPolicy) -> Self {
        self.retirement = policy;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.max_connections == 0 {
            return Err(PoolError::Configuration(
                "max_connections must be greater than 0".into(),
            ));
        }
        if self.initial_connections > self.max_connections {
            return Err(PoolError::Configuration(
                "initial_connections cannot be greater than max_connections".into(),
            ));
        }
        if self.connection_timeout == Some(Duration::ZERO) {
            return Err(PoolError::Configuration(
                "connection_timeout must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
