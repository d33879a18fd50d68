//! Checked-out connections.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::connection::DirectoryConnection;
use crate::error::DirectoryError;
use crate::lifecycle::ConnectionMetadata;
use crate::message::{
    AddRequest, DeleteRequest, ModifyRequest, PasswordModifyRequest, PasswordModifyResult,
    SearchRequest, SearchResult, SimpleBindRequest, SimpleBindResult,
};
use crate::pool::{PoolEntry, PoolInner};

/// A connection checked out of a [`Pool`](crate::Pool).
///
/// Every directory operation is forwarded to the underlying connection and
/// its result returned unchanged. If an operation fails with a result code
/// in the pool's [`RetirementPolicy`](crate::RetirementPolicy), the
/// connection is marked unusable before the error is handed back.
///
/// Call [`close`](PooledConnection::close) when done. A usable connection
/// goes back to the pool; an unusable one is torn down and its capacity
/// released.
///
/// Dropping a `PooledConnection` without closing it does not return it to
/// the pool: the connection is dropped without a protocol-level teardown and
/// its capacity is released.
pub struct PooledConnection<C: DirectoryConnection> {
    entry: Option<PoolEntry<C>>,
    pool: Arc<PoolInner<C>>,
    unusable: bool,
}

impl<C: DirectoryConnection> PooledConnection<C> {
    pub(crate) fn new(entry: PoolEntry<C>, pool: Arc<PoolInner<C>>) -> Self {
        Self {
            entry: Some(entry),
            pool,
            unusable: false,
        }
    }

    fn entry(&self) -> &PoolEntry<C> {
        match &self.entry {
            Some(entry) => entry,
            None => unreachable!("connection is held until the wrapper is consumed"),
        }
    }

    fn connection_mut(&mut self) -> &mut C {
        match &mut self.entry {
            Some(entry) => &mut entry.connection,
            None => unreachable!("connection is held until the wrapper is consumed"),
        }
    }

    /// Mark the connection as unusable.
    ///
    /// It will be torn down instead of returned to the pool when closed.
    pub fn mark_unusable(&mut self) {
        self.unusable = true;
    }

    /// Check if the connection has been marked unusable.
    #[must_use]
    pub fn is_unusable(&self) -> bool {
        self.unusable
    }

    /// The connection's identifier within its pool.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.entry().metadata.id
    }

    /// Get the connection metadata.
    #[must_use]
    pub fn metadata(&self) -> &ConnectionMetadata {
        &self.entry().metadata
    }

    /// Release the connection.
    ///
    /// Usable connections return to the pool's idle set (or are torn down if
    /// the pool has shut down). Unusable ones are torn down and their
    /// capacity freed for a new connection. Teardown errors are logged, not
    /// returned.
    pub async fn close(mut self) {
        let Some(entry) = self.entry.take() else {
            return;
        };

        if self.unusable {
            self.pool.discard(entry).await;
        } else {
            self.pool.put(entry).await;
        }
    }

    /// Detach the connection from the pool.
    ///
    /// The pool forgets the connection and frees its capacity; the caller
    /// becomes responsible for closing it.
    #[must_use = "the detached connection must be closed by the caller"]
    pub fn detach(mut self) -> C {
        match self.entry.take() {
            Some(entry) => {
                self.pool.forget(entry.metadata.id);
                entry.connection
            }
            None => unreachable!("connection is held until the wrapper is consumed"),
        }
    }

    fn classify<T>(&mut self, result: Result<T, DirectoryError>) -> Result<T, DirectoryError> {
        if let Err(err) = &result {
            if !self.unusable && self.pool.retirement().should_retire(err) {
                tracing::debug!(
                    pool = %self.pool.name(),
                    connection_id = self.id(),
                    code = ?err.result_code(),
                    "connection marked unusable"
                );
                self.mark_unusable();
            }
        }
        result
    }

    /// Start background processing on the connection.
    pub fn start(&mut self) {
        self.connection_mut().start();
    }

    /// Upgrade the transport with StartTLS.
    pub async fn start_tls(
        &mut self,
        config: Arc<rustls::ClientConfig>,
    ) -> Result<(), DirectoryError> {
        let result = self.connection_mut().start_tls(config).await;
        self.classify(result)
    }

    /// Bind with a DN and password.
    pub async fn bind(&mut self, username: &str, password: &str) -> Result<(), DirectoryError> {
        let result = self.connection_mut().bind(username, password).await;
        self.classify(result)
    }

    /// Perform a simple bind.
    pub async fn simple_bind(
        &mut self,
        request: &SimpleBindRequest,
    ) -> Result<SimpleBindResult, DirectoryError> {
        let result = self.connection_mut().simple_bind(request).await;
        self.classify(result)
    }

    /// Set the timeout applied to subsequent operations.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.connection_mut().set_timeout(timeout);
    }

    /// Add an entry.
    pub async fn add(&mut self, request: &AddRequest) -> Result<(), DirectoryError> {
        let result = self.connection_mut().add(request).await;
        self.classify(result)
    }

    /// Delete an entry.
    pub async fn delete(&mut self, request: &DeleteRequest) -> Result<(), DirectoryError> {
        let result = self.connection_mut().delete(request).await;
        self.classify(result)
    }

    /// Modify an entry.
    pub async fn modify(&mut self, request: &ModifyRequest) -> Result<(), DirectoryError> {
        let result = self.connection_mut().modify(request).await;
        self.classify(result)
    }

    /// Compare an attribute value.
    pub async fn compare(
        &mut self,
        dn: &str,
        attribute: &str,
        value: &str,
    ) -> Result<bool, DirectoryError> {
        let result = self.connection_mut().compare(dn, attribute, value).await;
        self.classify(result)
    }

    /// Change a password with the password modify extended operation.
    pub async fn password_modify(
        &mut self,
        request: &PasswordModifyRequest,
    ) -> Result<PasswordModifyResult, DirectoryError> {
        let result = self.connection_mut().password_modify(request).await;
        self.classify(result)
    }

    /// Run a search.
    pub async fn search(
        &mut self,
        request: &SearchRequest,
    ) -> Result<SearchResult, DirectoryError> {
        let result = self.connection_mut().search(request).await;
        self.classify(result)
    }

    /// Run a paged search.
    pub async fn search_with_paging(
        &mut self,
        request: &SearchRequest,
        page_size: u32,
    ) -> Result<SearchResult, DirectoryError> {
        let result = self
            .connection_mut()
            .search_with_paging(request, page_size)
            .await;
        self.classify(result)
    }
}

impl<C: DirectoryConnection> fmt::Debug for PooledConnection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("pool", &self.pool.name())
            .field("metadata", &self.entry.as_ref().map(|e| &e.metadata))
            .field("unusable", &self.unusable)
            .finish()
    }
}

impl<C: DirectoryConnection> Drop for PooledConnection<C> {
    fn drop(&mut self) {
        if let Some(entry) = self.entry.take() {
            let connection_id = entry.metadata.id;
            tracing::warn!(
                pool = %self.pool.name(),
                connection_id,
                "pooled connection dropped without close, discarding it"
            );
            drop(entry);
            self.pool.forget(connection_id);
        }
    }
}
