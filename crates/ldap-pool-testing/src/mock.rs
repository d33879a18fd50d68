//! In-memory directory for pool tests.
//!
//! [`MockDirectory`] holds a set of entries and the bookkeeping shared by
//! every [`MockConnection`] opened against it: how many connections exist,
//! the most that ever existed at once, and how many were closed. Failures
//! can be scripted per operation so tests can drive a connection into a
//! retirement code on demand.
//!
//! ```rust,ignore
//! use ldap_pool::{DirectoryError, Pool, ResultCode};
//! use ldap_pool_testing::mock::{MockDirectory, MockOperation};
//!
//! let directory = MockDirectory::new();
//! let pool = Pool::builder().factory(directory.factory()).build().await?;
//!
//! directory.fail_next(
//!     MockOperation::Search,
//!     DirectoryError::result(ResultCode::TIME_LIMIT_EXCEEDED, "slow"),
//! );
//! ```

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use ldap_pool::{
    AddRequest, ConnectionFactory, DeleteRequest, DirectoryConnection, DirectoryError, Entry,
    ModifyOperation, ModifyRequest, PasswordModifyRequest, PasswordModifyResult, ResultCode,
    Scope, SearchRequest, SearchResult, SimpleBindRequest, SimpleBindResult,
};

/// Operations that can be scripted to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    /// Connection teardown.
    Close,
    /// StartTLS upgrade.
    StartTls,
    /// `bind` and `simple_bind`.
    Bind,
    /// Add.
    Add,
    /// Delete.
    Delete,
    /// Modify.
    Modify,
    /// Compare.
    Compare,
    /// Password modify.
    PasswordModify,
    /// `search` and `search_with_paging`.
    Search,
}

#[derive(Debug, Default)]
struct DirectoryState {
    entries: BTreeMap<String, Entry>,
    passwords: HashMap<String, String>,
    failures: HashMap<MockOperation, VecDeque<DirectoryError>>,
    creation_failures: VecDeque<DirectoryError>,
    creation_delay: Option<Duration>,
    close_delay: Option<Duration>,
    next_id: u64,
    open: usize,
    peak_open: usize,
    created: u64,
    closed: u64,
    dropped: u64,
    operations: u64,
}

/// A shared in-memory directory.
///
/// Cloning gives another handle to the same directory.
#[derive(Debug, Clone, Default)]
pub struct MockDirectory {
    state: Arc<Mutex<DirectoryState>>,
}

impl MockDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry.
    #[must_use]
    pub fn with_entry(self, entry: Entry) -> Self {
        self.insert(entry);
        self
    }

    /// Accept binds as `dn` with `password`.
    #[must_use]
    pub fn with_user(self, dn: impl Into<String>, password: impl Into<String>) -> Self {
        self.state.lock().passwords.insert(dn.into(), password.into());
        self
    }

    /// Delay every connection creation.
    #[must_use]
    pub fn with_creation_delay(self, delay: Duration) -> Self {
        self.state.lock().creation_delay = Some(delay);
        self
    }

    /// Delay every connection close, as a server that never answers the
    /// unbind would.
    #[must_use]
    pub fn with_close_delay(self, delay: Duration) -> Self {
        self.state.lock().close_delay = Some(delay);
        self
    }

    /// Insert or replace an entry.
    pub fn insert(&self, entry: Entry) {
        self.state.lock().entries.insert(entry.dn.clone(), entry);
    }

    /// Look up an entry by DN.
    #[must_use]
    pub fn entry(&self, dn: &str) -> Option<Entry> {
        self.state.lock().entries.get(dn).cloned()
    }

    /// Make the next `operation` on any connection fail with `error`.
    ///
    /// Failures queue up; each one is consumed by a single call.
    pub fn fail_next(&self, operation: MockOperation, error: DirectoryError) {
        self.state
            .lock()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Make the next connection creation fail with `error`.
    pub fn fail_next_creation(&self, error: DirectoryError) {
        self.state.lock().creation_failures.push_back(error);
    }

    /// A factory producing connections to this directory.
    #[must_use]
    pub fn factory(&self) -> MockFactory {
        MockFactory {
            directory: self.clone(),
        }
    }

    /// Open a connection directly, bypassing any scripted creation failure.
    #[must_use]
    pub fn connect(&self) -> MockConnection {
        let mut state = self.state.lock();
        state.next_id += 1;
        state.created += 1;
        state.open += 1;
        state.peak_open = state.peak_open.max(state.open);
        MockConnection {
            id: state.next_id,
            directory: self.clone(),
            bound_dn: None,
            timeout: None,
            tls: false,
            closed: false,
        }
    }

    /// Connections that exist and have not been closed or dropped.
    #[must_use]
    pub fn open_connections(&self) -> usize {
        self.state.lock().open
    }

    /// The most connections that were ever open at the same time.
    #[must_use]
    pub fn peak_open_connections(&self) -> usize {
        self.state.lock().peak_open
    }

    /// Connections created so far.
    #[must_use]
    pub fn created(&self) -> u64 {
        self.state.lock().created
    }

    /// Connections torn down with `close`.
    #[must_use]
    pub fn closed(&self) -> u64 {
        self.state.lock().closed
    }

    /// Connections dropped without being closed.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.state.lock().dropped
    }

    /// Directory operations performed, across all connections.
    #[must_use]
    pub fn operations(&self) -> u64 {
        self.state.lock().operations
    }

    fn begin(&self, operation: MockOperation) -> Result<(), DirectoryError> {
        let mut state = self.state.lock();
        state.operations += 1;
        match state.failures.get_mut(&operation).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// A connection to a [`MockDirectory`].
#[derive(Debug)]
pub struct MockConnection {
    id: u64,
    directory: MockDirectory,
    bound_dn: Option<String>,
    timeout: Option<Duration>,
    tls: bool,
    closed: bool,
}

impl MockConnection {
    /// Creation order of this connection within its directory, from 1.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// DN of the last successful bind.
    #[must_use]
    pub fn bound_dn(&self) -> Option<&str> {
        self.bound_dn.as_deref()
    }

    /// The timeout last set on this connection.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Check if StartTLS has been negotiated.
    #[must_use]
    pub fn is_tls(&self) -> bool {
        self.tls
    }

    /// Check if the connection has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<(), DirectoryError> {
        if self.closed {
            return Err(DirectoryError::network("connection closed"));
        }
        Ok(())
    }

    fn begin(&self, operation: MockOperation) -> Result<(), DirectoryError> {
        self.ensure_open()?;
        self.directory.begin(operation)
    }

    fn check_bind(&self, username: &str, password: &str) -> Result<(), DirectoryError> {
        let state = self.directory.state.lock();
        match state.passwords.get(username) {
            Some(expected) if expected == password => Ok(()),
            _ => Err(DirectoryError::result(
                ResultCode::INVALID_CREDENTIALS,
                "invalid credentials",
            )),
        }
    }
}

fn no_such_object(dn: &str) -> DirectoryError {
    DirectoryError::result(ResultCode::NO_SUCH_OBJECT, format!("no such object: {dn}"))
}

fn in_scope(dn: &str, base: &str, scope: Scope) -> bool {
    if base.is_empty() {
        return scope == Scope::Subtree;
    }
    let dn = dn.to_ascii_lowercase();
    let base = base.to_ascii_lowercase();
    if dn == base {
        return scope != Scope::OneLevel;
    }
    let Some(parent) = dn.strip_suffix(&base).and_then(|rest| rest.strip_suffix(',')) else {
        return false;
    };
    match scope {
        Scope::Base => false,
        Scope::OneLevel => !parent.contains(','),
        Scope::Subtree => true,
    }
}

/// Equality filters of the form `(attr=value)`; `(attr=*)` tests presence.
/// Anything else matches every entry.
fn matches(entry: &Entry, filter: &str) -> bool {
    let Some((attribute, value)) = filter
        .strip_prefix('(')
        .and_then(|f| f.strip_suffix(')'))
        .and_then(|f| f.split_once('='))
    else {
        return true;
    };
    if attribute.starts_with(['&', '|', '!']) {
        return true;
    }
    let values = entry.values(attribute);
    if value == "*" {
        return !values.is_empty();
    }
    values.iter().any(|v| v.eq_ignore_ascii_case(value))
}

fn project(entry: &Entry, request: &SearchRequest) -> Entry {
    let mut projected = Entry::new(entry.dn.clone());
    for (name, values) in &entry.attributes {
        let wanted = request.attributes.is_empty()
            || request.attributes.iter().any(|a| a == "*" || a == name);
        if wanted {
            let values = if request.types_only {
                Vec::new()
            } else {
                values.clone()
            };
            projected.attributes.insert(name.clone(), values);
        }
    }
    projected
}

#[async_trait]
impl DirectoryConnection for MockConnection {
    async fn close(&mut self) -> Result<(), DirectoryError> {
        if self.closed {
            return Err(DirectoryError::Other("connection already closed".into()));
        }
        let delay = self.directory.state.lock().close_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.closed = true;
        {
            let mut state = self.directory.state.lock();
            state.open -= 1;
            state.closed += 1;
        }
        self.directory.begin(MockOperation::Close)
    }

    async fn start_tls(
        &mut self,
        _config: Arc<rustls::ClientConfig>,
    ) -> Result<(), DirectoryError> {
        self.begin(MockOperation::StartTls)?;
        if self.tls {
            return Err(DirectoryError::result(
                ResultCode::OPERATIONS_ERROR,
                "TLS already established",
            ));
        }
        self.tls = true;
        Ok(())
    }

    async fn bind(&mut self, username: &str, password: &str) -> Result<(), DirectoryError> {
        self.begin(MockOperation::Bind)?;
        self.check_bind(username, password)?;
        self.bound_dn = Some(username.to_owned());
        Ok(())
    }

    async fn simple_bind(
        &mut self,
        request: &SimpleBindRequest,
    ) -> Result<SimpleBindResult, DirectoryError> {
        self.begin(MockOperation::Bind)?;
        if request.password.is_empty() {
            if !request.allow_empty_password {
                return Err(DirectoryError::result(
                    ResultCode::EMPTY_PASSWORD,
                    "empty password not allowed",
                ));
            }
            self.bound_dn = None;
            return Ok(SimpleBindResult::default());
        }
        self.check_bind(&request.username, &request.password)?;
        self.bound_dn = Some(request.username.clone());
        Ok(SimpleBindResult::default())
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    async fn add(&mut self, request: &AddRequest) -> Result<(), DirectoryError> {
        self.begin(MockOperation::Add)?;
        let mut state = self.directory.state.lock();
        if state.entries.contains_key(&request.dn) {
            return Err(DirectoryError::result(
                ResultCode::ENTRY_ALREADY_EXISTS,
                format!("entry already exists: {}", request.dn),
            ));
        }
        let mut entry = Entry::new(request.dn.clone());
        for attribute in &request.attributes {
            entry
                .attributes
                .insert(attribute.name.clone(), attribute.values.clone());
        }
        state.entries.insert(request.dn.clone(), entry);
        Ok(())
    }

    async fn delete(&mut self, request: &DeleteRequest) -> Result<(), DirectoryError> {
        self.begin(MockOperation::Delete)?;
        match self.directory.state.lock().entries.remove(&request.dn) {
            Some(_) => Ok(()),
            None => Err(no_such_object(&request.dn)),
        }
    }

    async fn modify(&mut self, request: &ModifyRequest) -> Result<(), DirectoryError> {
        self.begin(MockOperation::Modify)?;
        let mut state = self.directory.state.lock();
        let Some(entry) = state.entries.get_mut(&request.dn) else {
            return Err(no_such_object(&request.dn));
        };
        for change in &request.changes {
            let name = &change.attribute.name;
            let values = &change.attribute.values;
            match change.operation {
                ModifyOperation::Add => {
                    entry
                        .attributes
                        .entry(name.clone())
                        .or_default()
                        .extend(values.iter().cloned());
                }
                ModifyOperation::Delete if values.is_empty() => {
                    entry.attributes.remove(name);
                }
                ModifyOperation::Delete => {
                    if let Some(current) = entry.attributes.get_mut(name) {
                        current.retain(|v| !values.contains(v));
                    }
                }
                ModifyOperation::Replace => {
                    entry.attributes.insert(name.clone(), values.clone());
                }
                ModifyOperation::Increment => {
                    let by: i64 = values.first().and_then(|v| v.parse().ok()).unwrap_or(0);
                    let current = entry.attributes.entry(name.clone()).or_default();
                    let value: i64 = current.first().and_then(|v| v.parse().ok()).unwrap_or(0);
                    *current = vec![(value + by).to_string()];
                }
            }
        }
        Ok(())
    }

    async fn compare(
        &mut self,
        dn: &str,
        attribute: &str,
        value: &str,
    ) -> Result<bool, DirectoryError> {
        self.begin(MockOperation::Compare)?;
        let state = self.directory.state.lock();
        let entry = state.entries.get(dn).ok_or_else(|| no_such_object(dn))?;
        Ok(entry.values(attribute).iter().any(|v| v == value))
    }

    async fn password_modify(
        &mut self,
        request: &PasswordModifyRequest,
    ) -> Result<PasswordModifyResult, DirectoryError> {
        self.begin(MockOperation::PasswordModify)?;
        let Some(user) = request
            .user_identity
            .clone()
            .or_else(|| self.bound_dn.clone())
        else {
            return Err(DirectoryError::result(
                ResultCode::UNWILLING_TO_PERFORM,
                "no user identity and not bound",
            ));
        };

        let mut state = self.directory.state.lock();
        if let Some(old) = &request.old_password {
            if state.passwords.get(&user) != Some(old) {
                return Err(DirectoryError::result(
                    ResultCode::INVALID_CREDENTIALS,
                    "old password does not match",
                ));
            }
        }
        let (password, generated_password) = match &request.new_password {
            Some(password) => (password.clone(), None),
            None => {
                let generated = format!("generated-{}", state.operations);
                (generated.clone(), Some(generated))
            }
        };
        state.passwords.insert(user, password);
        Ok(PasswordModifyResult { generated_password })
    }

    async fn search(&mut self, request: &SearchRequest) -> Result<SearchResult, DirectoryError> {
        self.begin(MockOperation::Search)?;
        let state = self.directory.state.lock();
        if !request.base_dn.is_empty() && !state.entries.contains_key(&request.base_dn) {
            return Err(no_such_object(&request.base_dn));
        }
        let mut result = SearchResult::default();
        let candidates = state
            .entries
            .values()
            .filter(|entry| in_scope(&entry.dn, &request.base_dn, request.scope))
            .filter(|entry| matches(entry, &request.filter));
        for entry in candidates {
            if request.size_limit > 0 && result.entries.len() >= request.size_limit as usize {
                return Err(DirectoryError::result(
                    ResultCode::SIZE_LIMIT_EXCEEDED,
                    "size limit exceeded",
                ));
            }
            result.entries.push(project(entry, request));
        }
        Ok(result)
    }

    async fn search_with_paging(
        &mut self,
        request: &SearchRequest,
        page_size: u32,
    ) -> Result<SearchResult, DirectoryError> {
        if page_size == 0 {
            return Err(DirectoryError::result(
                ResultCode::PROTOCOL_ERROR,
                "page size must be positive",
            ));
        }
        self.search(request).await
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        if !self.closed {
            let mut state = self.directory.state.lock();
            state.open -= 1;
            state.dropped += 1;
        }
    }
}

/// Factory opening [`MockConnection`]s to a [`MockDirectory`].
#[derive(Debug, Clone)]
pub struct MockFactory {
    directory: MockDirectory,
}

impl MockFactory {
    /// The directory this factory connects to.
    #[must_use]
    pub fn directory(&self) -> &MockDirectory {
        &self.directory
    }
}

#[async_trait]
impl ConnectionFactory<MockConnection> for MockFactory {
    async fn create(&self, name: &str) -> Result<MockConnection, DirectoryError> {
        let (delay, failure) = {
            let mut state = self.directory.state.lock();
            (state.creation_delay, state.creation_failures.pop_front())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = failure {
            tracing::debug!(pool = %name, error = %err, "mock connection creation failed");
            return Err(err);
        }
        Ok(self.directory.connect())
    }
}
