//! Connection pool implementation.
//!
//! All capacity accounting lives in one [`PoolState`] behind a single
//! `parking_lot::Mutex`. `live` counts every connection the pool is
//! responsible for: idle ones, checked-out ones, and creations in flight.
//! It never exceeds `max_connections`. The lock is never held across an
//! `.await`; connections are created and torn down outside it.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::PoolConfig;
use crate::connection::{ConnectionFactory, DirectoryConnection};
use crate::error::PoolError;
use crate::lifecycle::ConnectionMetadata;
use crate::policy::RetirementPolicy;
use crate::pooled::PooledConnection;
use crate::result_code::ResultCode;

/// A bounded pool of directory connections.
///
/// The pool hands out [`PooledConnection`]s, creating connections through
/// its factory on demand up to `max_connections`. Callers give a
/// connection back with [`PooledConnection::close`]. Connections that hit a
/// retirement result code are torn down instead of recycled.
///
/// `Pool` is a cheap handle; clones share the same connections.
///
/// # Example
///
/// ```rust,ignore
/// use ldap_pool::{Pool, ResultCode, SearchRequest};
///
/// let pool = Pool::builder()
///     .name("corp-directory")
///     .initial_connections(2)
///     .max_connections(10)
///     .retire_on([ResultCode::TIME_LIMIT_EXCEEDED, ResultCode::NETWORK_ERROR])
///     .factory(factory)
///     .build()
///     .await?;
///
/// let mut conn = pool.get().await?;
/// let result = conn.search(&SearchRequest::new("dc=example,dc=com", "(uid=alice)")).await;
/// conn.close().await;
/// ```
pub struct Pool<C: DirectoryConnection> {
    inner: Arc<PoolInner<C>>,
}

/// A raw connection together with its bookkeeping.
pub(crate) struct PoolEntry<C> {
    pub(crate) connection: C,
    pub(crate) metadata: ConnectionMetadata,
}

struct PoolState<C> {
    /// Idle connections; the most recently returned one is at the end.
    idle: Vec<PoolEntry<C>>,
    /// Idle + checked out + creations in flight.
    live: usize,
    closed: bool,
}

pub(crate) struct PoolInner<C> {
    config: PoolConfig,
    factory: Box<dyn ConnectionFactory<C>>,
    state: Mutex<PoolState<C>>,
    /// Signalled once per returned connection or released slot, and for
    /// every waiter on shutdown.
    available: Notify,
    /// Cancelled on shutdown; background tasks derive child tokens from it.
    shutdown: CancellationToken,
    next_connection_id: AtomicU64,
    created_at: Instant,
    metrics: Mutex<PoolMetricsInner>,
}

/// Internal metrics tracking.
#[derive(Debug, Default)]
struct PoolMetricsInner {
    connections_created: u64,
    connections_closed: u64,
    connections_retired: u64,
    connections_reaped: u64,
    creation_failures: u64,
    checkouts_successful: u64,
    checkouts_failed: u64,
}

impl<C: DirectoryConnection> Pool<C> {
    /// Create a new pool builder.
    #[must_use]
    pub fn builder() -> PoolBuilder<C> {
        PoolBuilder::new()
    }

    /// Create a pool and eagerly open `initial_connections` connections.
    ///
    /// If any initial connection fails, the ones already opened are torn
    /// down and the factory error is returned.
    pub async fn new<F>(config: PoolConfig, factory: F) -> Result<Self, PoolError>
    where
        F: ConnectionFactory<C>,
    {
        Self::with_boxed_factory(config, Box::new(factory)).await
    }

    async fn with_boxed_factory(
        config: PoolConfig,
        factory: Box<dyn ConnectionFactory<C>>,
    ) -> Result<Self, PoolError> {
        config.validate()?;

        let inner = Arc::new(PoolInner {
            factory,
            state: Mutex::new(PoolState {
                idle: Vec::with_capacity(config.max_connections as usize),
                live: 0,
                closed: false,
            }),
            available: Notify::new(),
            shutdown: CancellationToken::new(),
            next_connection_id: AtomicU64::new(1),
            created_at: Instant::now(),
            metrics: Mutex::new(PoolMetricsInner::default()),
            config,
        });

        let mut created = Vec::with_capacity(inner.config.initial_connections as usize);
        for _ in 0..inner.config.initial_connections {
            match inner.factory.create(&inner.config.name).await {
                Ok(connection) => created.push(inner.register(connection)),
                Err(err) => {
                    inner.metrics.lock().creation_failures += 1;
                    tracing::warn!(
                        pool = %inner.config.name,
                        opened = created.len(),
                        error = %err,
                        "initial connection failed, tearing down pool"
                    );
                    for entry in created {
                        inner.teardown(entry).await;
                    }
                    return Err(PoolError::ConnectionCreation(err));
                }
            }
        }

        {
            let mut state = inner.state.lock();
            state.live = created.len();
            state.idle = created;
        }

        tracing::info!(
            pool = %inner.config.name,
            initial = inner.config.initial_connections,
            max = inner.config.max_connections,
            "connection pool created"
        );

        Ok(Self { inner })
    }

    /// Get a connection from the pool.
    ///
    /// Returns the most recently returned idle connection if there is one.
    /// Otherwise a new connection is created if the pool is below
    /// `max_connections`. At capacity, this waits until a connection is
    /// returned or retired, the pool shuts down, or the configured
    /// `connection_timeout` elapses.
    ///
    /// A failed creation does not consume capacity. Dropping the returned
    /// future (for example on an outer timeout) releases anything it had
    /// reserved.
    pub async fn get(&self) -> Result<PooledConnection<C>, PoolError> {
        let result = match self.inner.config.connection_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.acquire())
                .await
                .unwrap_or(Err(PoolError::AcquisitionTimeout(timeout))),
            None => self.acquire().await,
        };

        let mut metrics = self.inner.metrics.lock();
        match &result {
            Ok(_) => metrics.checkouts_successful += 1,
            Err(_) => metrics.checkouts_failed += 1,
        }
        drop(metrics);

        result
    }

    /// Try to get an idle connection without waiting or creating one.
    ///
    /// Returns `Ok(None)` if no idle connection is available.
    pub fn try_get(&self) -> Result<Option<PooledConnection<C>>, PoolError> {
        let entry = {
            let mut state = self.inner.state.lock();
            if state.closed {
                return Err(PoolError::PoolClosed);
            }
            state.idle.pop()
        };

        Ok(entry.map(|entry| {
            self.inner.metrics.lock().checkouts_successful += 1;
            self.checkout(entry)
        }))
    }

    async fn acquire(&self) -> Result<PooledConnection<C>, PoolError> {
        loop {
            // Register interest before inspecting the state so a return
            // between the check and the await is not missed.
            let notified = self.inner.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let next = {
                let mut state = self.inner.state.lock();
                if state.closed {
                    return Err(PoolError::PoolClosed);
                }
                if let Some(entry) = state.idle.pop() {
                    Next::Idle(entry)
                } else if state.live < self.inner.config.max_connections as usize {
                    state.live += 1;
                    Next::Create
                } else {
                    Next::Wait
                }
            };

            match next {
                Next::Idle(entry) => return Ok(self.checkout(entry)),
                Next::Create => {
                    let slot = SlotGuard::new(&self.inner);
                    return self.open_connection(slot).await;
                }
                Next::Wait => {
                    tracing::trace!(
                        pool = %self.inner.config.name,
                        "pool at capacity, waiting for a connection"
                    );
                    notified.await;
                }
            }
        }
    }

    async fn open_connection(
        &self,
        slot: SlotGuard<'_, C>,
    ) -> Result<PooledConnection<C>, PoolError> {
        let connection = match self.inner.factory.create(&self.inner.config.name).await {
            Ok(connection) => connection,
            Err(err) => {
                self.inner.metrics.lock().creation_failures += 1;
                tracing::warn!(
                    pool = %self.inner.config.name,
                    error = %err,
                    "failed to create connection"
                );
                drop(slot);
                return Err(PoolError::ConnectionCreation(err));
            }
        };

        let entry = self.inner.register(connection);

        if self.inner.state.lock().closed {
            drop(slot);
            self.inner.teardown(entry).await;
            return Err(PoolError::PoolClosed);
        }

        slot.commit();
        Ok(self.checkout(entry))
    }

    fn checkout(&self, mut entry: PoolEntry<C>) -> PooledConnection<C> {
        entry.metadata.mark_checkout();
        tracing::trace!(
            pool = %self.inner.config.name,
            connection_id = entry.metadata.id,
            checkouts = entry.metadata.checkout_count,
            "connection checked out"
        );
        PooledConnection::new(entry, Arc::clone(&self.inner))
    }

    /// Number of idle connections.
    ///
    /// This is a snapshot for observability; it may be stale as soon as it
    /// is returned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.state.lock().idle.len()
    }

    /// Check if there are no idle connections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the current pool status.
    #[must_use]
    pub fn status(&self) -> PoolStatus {
        let state = self.inner.state.lock();
        let available = state.idle.len() as u32;
        let total = state.live as u32;
        PoolStatus {
            available,
            in_use: total.saturating_sub(available),
            total,
            max: self.inner.config.max_connections,
        }
    }

    /// Get pool metrics.
    #[must_use]
    pub fn metrics(&self) -> PoolMetrics {
        let inner = self.inner.metrics.lock();
        PoolMetrics {
            connections_created: inner.connections_created,
            connections_closed: inner.connections_closed,
            connections_retired: inner.connections_retired,
            connections_reaped: inner.connections_reaped,
            creation_failures: inner.creation_failures,
            checkouts_successful: inner.checkouts_successful,
            checkouts_failed: inner.checkouts_failed,
            uptime: self.inner.created_at.elapsed(),
        }
    }

    /// Shut the pool down.
    ///
    /// Marks the pool closed, tears down every idle connection and fails
    /// all waiting [`get`](Pool::get) calls with [`PoolError::PoolClosed`].
    /// Connections that are checked out stay with their holders and are
    /// torn down when closed. Calling this more than once has no further
    /// effect.
    pub async fn shutdown(&self) {
        let drained = {
            let mut state = self.inner.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            let drained: Vec<_> = state.idle.drain(..).collect();
            state.live -= drained.len();
            drained
        };

        self.inner.available.notify_waiters();
        self.inner.shutdown.cancel();

        tracing::info!(
            pool = %self.inner.config.name,
            idle_closed = drained.len(),
            "connection pool shut down"
        );

        for entry in drained {
            self.inner.teardown(entry).await;
        }
    }

    /// Check if the pool is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    /// The pool's diagnostic name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    /// Get the pool configuration.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    pub(crate) fn inner(&self) -> &Arc<PoolInner<C>> {
        &self.inner
    }
}

impl<C: DirectoryConnection> Clone for Pool<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: DirectoryConnection> fmt::Debug for Pool<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("name", &self.inner.config.name)
            .field("status", &self.status())
            .field("closed", &self.is_closed())
            .finish()
    }
}

enum Next<C> {
    Idle(PoolEntry<C>),
    Create,
    Wait,
}

/// A capacity slot held for a connection being created or torn down.
///
/// Released on drop unless committed, so a failed creation or a dropped
/// teardown never leaks capacity.
struct SlotGuard<'a, C: DirectoryConnection> {
    inner: &'a PoolInner<C>,
    committed: bool,
}

impl<'a, C: DirectoryConnection> SlotGuard<'a, C> {
    fn new(inner: &'a PoolInner<C>) -> Self {
        Self {
            inner,
            committed: false,
        }
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl<C: DirectoryConnection> Drop for SlotGuard<'_, C> {
    fn drop(&mut self) {
        if !self.committed {
            self.inner.release_slot();
        }
    }
}

impl<C: DirectoryConnection> PoolInner<C> {
    pub(crate) fn name(&self) -> &str {
        &self.config.name
    }

    pub(crate) fn retirement(&self) -> &RetirementPolicy {
        &self.config.retirement
    }

    fn register(&self, connection: C) -> PoolEntry<C> {
        let id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);
        self.metrics.lock().connections_created += 1;
        tracing::debug!(pool = %self.config.name, connection_id = id, "connection created");
        PoolEntry {
            connection,
            metadata: ConnectionMetadata::new(id),
        }
    }

    /// Give up one unit of capacity and let a waiter use it.
    fn release_slot(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.live > 0, "slot released with no live connections");
        state.live -= 1;
        self.available.notify_one();
    }

    /// Return a usable connection to the idle set.
    pub(crate) async fn put(&self, mut entry: PoolEntry<C>) {
        entry.metadata.mark_checkin();
        let rejected = {
            let mut state = self.state.lock();
            if state.closed {
                state.live -= 1;
                Some(entry)
            } else {
                tracing::trace!(
                    pool = %self.config.name,
                    connection_id = entry.metadata.id,
                    "connection returned to pool"
                );
                state.idle.push(entry);
                self.available.notify_one();
                None
            }
        };

        if let Some(entry) = rejected {
            tracing::debug!(
                pool = %self.config.name,
                connection_id = entry.metadata.id,
                "pool closed, tearing down returned connection"
            );
            self.teardown(entry).await;
        }
    }

    /// Retire a connection: tear it down, then free its slot.
    ///
    /// The slot is freed even if this future is dropped mid-teardown.
    pub(crate) async fn discard(&self, entry: PoolEntry<C>) {
        self.metrics.lock().connections_retired += 1;
        tracing::debug!(
            pool = %self.config.name,
            connection_id = entry.metadata.id,
            "closing unusable connection"
        );
        let slot = SlotGuard::new(self);
        self.teardown(entry).await;
        drop(slot);
    }

    /// Free the slot of a connection that has left the pool without teardown.
    pub(crate) fn forget(&self, connection_id: u64) {
        self.metrics.lock().connections_closed += 1;
        tracing::debug!(
            pool = %self.config.name,
            connection_id,
            "connection removed from pool"
        );
        self.release_slot();
    }

    /// Close a connection. Failures are logged and otherwise ignored.
    pub(crate) async fn teardown(&self, mut entry: PoolEntry<C>) {
        if let Err(err) = entry.connection.close().await {
            tracing::warn!(
                pool = %self.config.name,
                connection_id = entry.metadata.id,
                error = %err,
                "error closing connection"
            );
        }
        self.metrics.lock().connections_closed += 1;
    }

    /// Evict idle connections past their idle timeout or lifetime.
    ///
    /// Each evicted connection keeps its slot until it has been torn down
    /// or its teardown is abandoned.
    /// Returns the number of connections evicted.
    pub(crate) async fn reap(&self) -> usize {
        let expired = self.take_expired();
        let count = expired.len();
        if count > 0 {
            self.metrics.lock().connections_reaped += count as u64;
            tracing::debug!(
                pool = %self.config.name,
                evicted = count,
                "evicting idle connections"
            );
        }
        let expired: Vec<_> = expired
            .into_iter()
            .map(|entry| (entry, SlotGuard::new(self)))
            .collect();
        for (entry, slot) in expired {
            self.teardown(entry).await;
            drop(slot);
        }
        count
    }

    fn take_expired(&self) -> Vec<PoolEntry<C>> {
        let idle_timeout = self.config.idle_timeout;
        let max_lifetime = self.config.max_lifetime;
        if idle_timeout.is_none() && max_lifetime.is_none() {
            return Vec::new();
        }

        let is_expired = |entry: &PoolEntry<C>| {
            idle_timeout.is_some_and(|t| entry.metadata.is_idle_expired(t))
                || max_lifetime.is_some_and(|t| entry.metadata.is_expired(t))
        };

        let mut state = self.state.lock();
        if state.closed || !state.idle.iter().any(is_expired) {
            return Vec::new();
        }
        let (expired, kept): (Vec<_>, Vec<_>) = state.idle.drain(..).partition(is_expired);
        state.idle = kept;
        expired
    }

    pub(crate) fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }
}

/// Builder for creating a connection pool.
///
/// # Example
///
/// ```rust,ignore
/// let pool = Pool::builder()
///     .initial_connections(2)
///     .max_connections(8)
///     .factory(|name: String| async move { connect(&name).await })
///     .build()
///     .await?;
/// ```
pub struct PoolBuilder<C> {
    pool_config: PoolConfig,
    factory: Option<Box<dyn ConnectionFactory<C>>>,
}

impl<C: DirectoryConnection> PoolBuilder<C> {
    /// Create a new pool builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pool_config: PoolConfig::default(),
            factory: None,
        }
    }

    /// Set the pool configuration.
    #[must_use]
    pub fn pool_config(mut self, config: PoolConfig) -> Self {
        self.pool_config = config;
        self
    }

    /// Set the connection factory.
    #[must_use]
    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: ConnectionFactory<C>,
    {
        self.factory = Some(Box::new(factory));
        self
    }

    /// Set the diagnostic name.
    #[must_use]
    pub fn name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.pool_config.name = name.into();
        self
    }

    /// Set the number of connections created at startup.
    #[must_use]
    pub fn initial_connections(mut self, count: u32) -> Self {
        self.pool_config.initial_connections = count;
        self
    }

    /// Set the maximum number of connections.
    #[must_use]
    pub fn max_connections(mut self, count: u32) -> Self {
        self.pool_config.max_connections = count;
        self
    }

    /// Bound how long a checkout may wait.
    #[must_use]
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.pool_config.connection_timeout = Some(timeout);
        self
    }

    /// Set the idle connection timeout used by the reaper.
    #[must_use]
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.pool_config.idle_timeout = timeout;
        self
    }

    /// Set the maximum connection lifetime used by the reaper.
    #[must_use]
    pub fn max_lifetime(mut self, lifetime: Option<Duration>) -> Self {
        self.pool_config.max_lifetime = lifetime;
        self
    }

    /// Set the result codes that retire a connection.
    #[must_use]
    pub fn retire_on(mut self, codes: impl IntoIterator<Item = ResultCode>) -> Self {
        self.pool_config.retirement = RetirementPolicy::from_codes(codes);
        self
    }

    /// Build the pool.
    ///
    /// Fails with [`PoolError::Configuration`] if no factory was set or the
    /// configuration is invalid.
    pub async fn build(self) -> Result<Pool<C>, PoolError> {
        let factory = self
            .factory
            .ok_or_else(|| PoolError::Configuration("a connection factory is required".into()))?;
        Pool::with_boxed_factory(self.pool_config, factory).await
    }
}

impl<C: DirectoryConnection> Default for PoolBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Status information about the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Number of idle connections available.
    pub available: u32,
    /// Number of connections checked out or being created.
    pub in_use: u32,
    /// Total number of live connections.
    pub total: u32,
    /// Maximum allowed connections.
    pub max: u32,
}

impl PoolStatus {
    /// Calculate the utilization percentage.
    #[must_use]
    pub fn utilization(&self) -> f64 {
        if self.max == 0 {
            return 0.0;
        }
        (self.in_use as f64 / self.max as f64) * 100.0
    }

    /// Check if the pool is at capacity.
    #[must_use]
    pub fn is_at_capacity(&self) -> bool {
        self.total >= self.max
    }
}

/// Metrics collected from the pool.
#[derive(Debug, Clone)]
pub struct PoolMetrics {
    /// Total connections created since pool start.
    pub connections_created: u64,
    /// Total connections torn down or removed since pool start.
    pub connections_closed: u64,
    /// Connections retired because they were marked unusable.
    pub connections_retired: u64,
    /// Idle connections evicted by the reaper.
    pub connections_reaped: u64,
    /// Factory calls that failed.
    pub creation_failures: u64,
    /// Successful connection checkouts.
    pub checkouts_successful: u64,
    /// Failed connection checkouts (timeouts, pool closed, factory errors).
    pub checkouts_failed: u64,
    /// Time since pool creation.
    pub uptime: Duration,
}

impl PoolMetrics {
    /// Calculate checkout success rate (0.0 to 1.0).
    #[must_use]
    pub fn checkout_success_rate(&self) -> f64 {
        let total = self.checkouts_successful + self.checkouts_failed;
        if total == 0 {
            return 1.0;
        }
        self.checkouts_successful as f64 / total as f64
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::DirectoryError;
    use crate::message::{
        AddRequest, DeleteRequest, ModifyRequest, PasswordModifyRequest, PasswordModifyResult,
        SearchRequest, SearchResult, SimpleBindRequest, SimpleBindResult,
    };

    /// Connection that refuses every operation; only capacity is exercised.
    struct NullConnection;

    fn refused<T>() -> Result<T, DirectoryError> {
        Err(DirectoryError::Unsupported("null connection".into()))
    }

    #[async_trait::async_trait]
    impl DirectoryConnection for NullConnection {
        async fn close(&mut self) -> Result<(), DirectoryError> {
            Ok(())
        }

        async fn start_tls(
            &mut self,
            _config: Arc<rustls::ClientConfig>,
        ) -> Result<(), DirectoryError> {
            refused()
        }

        async fn bind(&mut self, _: &str, _: &str) -> Result<(), DirectoryError> {
            refused()
        }

        async fn simple_bind(
            &mut self,
            _: &SimpleBindRequest,
        ) -> Result<SimpleBindResult, DirectoryError> {
            refused()
        }

        fn set_timeout(&mut self, _: Duration) {}

        async fn add(&mut self, _: &AddRequest) -> Result<(), DirectoryError> {
            refused()
        }

        async fn delete(&mut self, _: &DeleteRequest) -> Result<(), DirectoryError> {
            refused()
        }

        async fn modify(&mut self, _: &ModifyRequest) -> Result<(), DirectoryError> {
            refused()
        }

        async fn compare(&mut self, _: &str, _: &str, _: &str) -> Result<bool, DirectoryError> {
            refused()
        }

        async fn password_modify(
            &mut self,
            _: &PasswordModifyRequest,
        ) -> Result<PasswordModifyResult, DirectoryError> {
            refused()
        }

        async fn search(&mut self, _: &SearchRequest) -> Result<SearchResult, DirectoryError> {
            refused()
        }

        async fn search_with_paging(
            &mut self,
            _: &SearchRequest,
            _: u32,
        ) -> Result<SearchResult, DirectoryError> {
            refused()
        }
    }

    async fn null_pool(initial: u32, max: u32) -> Pool<NullConnection> {
        let config = PoolConfig::new()
            .initial_connections(initial)
            .max_connections(max);
        let factory = |_name: String| async { Ok::<_, DirectoryError>(NullConnection) };
        Pool::new(config, factory)
            .await
            .expect("Failed to create pool")
    }

    #[tokio::test]
    async fn test_detach_releases_slot() {
        let pool = null_pool(1, 1).await;
        let conn = pool.get().await.unwrap();
        assert!(pool.status().is_at_capacity());

        drop(conn.detach());
        assert_eq!(pool.status().total, 0);
        assert!(pool.try_get().unwrap().is_none());
    }

    #[cfg(debug_assertions)]
    #[tokio::test]
    #[should_panic(expected = "slot released with no live connections")]
    async fn test_release_slot_without_live_connection_panics() {
        let pool = null_pool(0, 1).await;
        pool.inner().release_slot();
    }

    #[test]
    fn test_pool_status_utilization() {
        let status = PoolStatus {
            available: 5,
            in_use: 5,
            total: 10,
            max: 20,
        };
        assert!((status.utilization() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pool_status_at_capacity() {
        let status = PoolStatus {
            available: 0,
            in_use: 10,
            total: 10,
            max: 10,
        };
        assert!(status.is_at_capacity());

        let status2 = PoolStatus {
            available: 5,
            in_use: 5,
            total: 10,
            max: 20,
        };
        assert!(!status2.is_at_capacity());
    }

    #[test]
    fn test_pool_metrics_success_rate() {
        let metrics = PoolMetrics {
            connections_created: 10,
            connections_closed: 2,
            connections_retired: 1,
            connections_reaped: 1,
            creation_failures: 0,
            checkouts_successful: 90,
            checkouts_failed: 10,
            uptime: Duration::from_secs(3600),
        };

        assert!((metrics.checkout_success_rate() - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pool_metrics_success_rate_without_checkouts() {
        let metrics = PoolMetrics {
            connections_created: 0,
            connections_closed: 0,
            connections_retired: 0,
            connections_reaped: 0,
            creation_failures: 0,
            checkouts_successful: 0,
            checkouts_failed: 0,
            uptime: Duration::ZERO,
        };

        assert!((metrics.checkout_success_rate() - 1.0).abs() < f64::EPSILON);
    }
}
