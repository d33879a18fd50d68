//! Directory connection and factory traits.
//!
//! The pool knows nothing about the LDAP wire protocol. It manages values
//! implementing [`DirectoryConnection`], produced on demand by a
//! [`ConnectionFactory`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::DirectoryError;
use crate::message::{
    AddRequest, DeleteRequest, ModifyRequest, PasswordModifyRequest, PasswordModifyResult,
    SearchRequest, SearchResult, SimpleBindRequest, SimpleBindResult,
};

/// An established directory connection.
///
/// Implementations wrap a concrete LDAP client. The pool calls
/// [`close`](DirectoryConnection::close) exactly once when a connection is
/// retired or the pool shuts down; every other method is only ever invoked
/// by the caller currently holding the connection.
#[async_trait]
pub trait DirectoryConnection: Send + 'static {
    /// Start background processing for the connection, if the client needs it.
    fn start(&mut self) {}

    /// Tear down the connection.
    async fn close(&mut self) -> Result<(), DirectoryError>;

    /// Upgrade the transport with StartTLS.
    async fn start_tls(&mut self, config: Arc<rustls::ClientConfig>)
    -> Result<(), DirectoryError>;

    /// Bind with a DN and password.
    async fn bind(&mut self, username: &str, password: &str) -> Result<(), DirectoryError>;

    /// Perform a simple bind.
    async fn simple_bind(
        &mut self,
        request: &SimpleBindRequest,
    ) -> Result<SimpleBindResult, DirectoryError>;

    /// Set the timeout applied to subsequent operations.
    fn set_timeout(&mut self, timeout: Duration);

    /// Add an entry.
    async fn add(&mut self, request: &AddRequest) -> Result<(), DirectoryError>;

    /// Delete an entry.
    async fn delete(&mut self, request: &DeleteRequest) -> Result<(), DirectoryError>;

    /// Modify an entry.
    async fn modify(&mut self, request: &ModifyRequest) -> Result<(), DirectoryError>;

    /// Compare an attribute value. Returns `true` if the entry holds it.
    async fn compare(
        &mut self,
        dn: &str,
        attribute: &str,
        value: &str,
    ) -> Result<bool, DirectoryError>;

    /// Change a password with the password modify extended operation.
    async fn password_modify(
        &mut self,
        request: &PasswordModifyRequest,
    ) -> Result<PasswordModifyResult, DirectoryError>;

    /// Run a search.
    async fn search(&mut self, request: &SearchRequest) -> Result<SearchResult, DirectoryError>;

    /// Run a search using the simple paged results control.
    async fn search_with_paging(
        &mut self,
        request: &SearchRequest,
        page_size: u32,
    ) -> Result<SearchResult, DirectoryError>;
}

/// Creates ready-to-use connections for a pool.
///
/// A factory is expected to return a connection that is connected, upgraded
/// to TLS if required, and bound. The `name` argument is the pool's
/// diagnostic name.
///
/// Any `Fn(String) -> impl Future<Output = Result<C, DirectoryError>>`
/// closure is a factory:
///
/// ```rust,ignore
/// let pool = Pool::builder()
///     .factory(|name: String| async move { MyConnection::connect(&name).await })
///     .build()
///     .await?;
/// ```
#[async_trait]
pub trait ConnectionFactory<C>: Send + Sync + 'static {
    /// Create a new connection.
    async fn create(&self, name: &str) -> Result<C, DirectoryError>;
}

#[async_trait]
impl<C, F, Fut> ConnectionFactory<C> for F
where
    C: Send + 'static,
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<C, DirectoryError>> + Send + 'static,
{
    async fn create(&self, name: &str) -> Result<C, DirectoryError> {
        (self)(name.to_owned()).await
    }
}
