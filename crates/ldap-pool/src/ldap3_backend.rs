//! [`DirectoryConnection`] backed by the `ldap3` crate.
//!
//! Enabled with the `ldap3` feature.
//!
//! ```rust,ignore
//! use ldap_pool::ldap3_backend::{Ldap3Config, Ldap3Factory};
//! use ldap_pool::Pool;
//!
//! let factory = Ldap3Factory::new(
//!     Ldap3Config::new("ldap://localhost:389")
//!         .bind("cn=admin,dc=example,dc=com", "secret")
//!         .starttls(true),
//! );
//! let pool = Pool::builder().max_connections(8).factory(factory).build().await?;
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ldap3::adapters::{Adapter, PagedResults};
use ldap3::exop::{PasswordModify, PasswordModifyResp};
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, LdapError, Mod, ResultEntry, SearchEntry};

use crate::connection::{ConnectionFactory, DirectoryConnection};
use crate::error::DirectoryError;
use crate::message::{
    AddRequest, DeleteRequest, DerefAliases, Entry, ModifyOperation, ModifyRequest,
    PasswordModifyRequest, PasswordModifyResult, Scope, SearchRequest, SearchResult,
    SimpleBindRequest, SimpleBindResult,
};
use crate::result_code::ResultCode;

/// Settings for connecting to a directory server with `ldap3`.
#[derive(Clone)]
pub struct Ldap3Config {
    /// Server URL (`ldap://`, `ldaps://` or `ldapi://`).
    pub url: String,
    /// DN to bind as after connecting. No bind is made when `None`.
    pub bind_dn: Option<String>,
    /// Password for `bind_dn`.
    pub bind_password: String,
    /// Negotiate StartTLS on plain `ldap://` connections.
    pub starttls: bool,
    /// Skip server certificate verification.
    pub no_tls_verify: bool,
    /// Timeout for establishing the connection.
    pub connect_timeout: Option<Duration>,
    /// Timeout applied to every operation until overridden per connection.
    pub operation_timeout: Option<Duration>,
}

impl Ldap3Config {
    /// Create settings for the given server URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            bind_dn: None,
            bind_password: String::new(),
            starttls: false,
            no_tls_verify: false,
            connect_timeout: Some(Duration::from_secs(10)),
            operation_timeout: None,
        }
    }

    /// Bind with these credentials after connecting.
    #[must_use]
    pub fn bind(mut self, dn: impl Into<String>, password: impl Into<String>) -> Self {
        self.bind_dn = Some(dn.into());
        self.bind_password = password.into();
        self
    }

    /// Enable or disable StartTLS.
    #[must_use]
    pub fn starttls(mut self, enabled: bool) -> Self {
        self.starttls = enabled;
        self
    }

    /// Skip server certificate verification.
    ///
    /// Only for testing against servers with self-signed certificates.
    #[must_use]
    pub fn no_tls_verify(mut self, enabled: bool) -> Self {
        self.no_tls_verify = enabled;
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the default operation timeout.
    #[must_use]
    pub fn operation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.operation_timeout = timeout;
        self
    }

    fn settings(&self) -> LdapConnSettings {
        let mut settings = LdapConnSettings::new()
            .set_starttls(self.starttls)
            .set_no_tls_verify(self.no_tls_verify);
        if let Some(timeout) = self.connect_timeout {
            settings = settings.set_conn_timeout(timeout);
        }
        settings
    }
}

impl fmt::Debug for Ldap3Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ldap3Config")
            .field("url", &self.url)
            .field("bind_dn", &self.bind_dn)
            .field("bind_password", &"[REDACTED]")
            .field("starttls", &self.starttls)
            .field("no_tls_verify", &self.no_tls_verify)
            .field("connect_timeout", &self.connect_timeout)
            .field("operation_timeout", &self.operation_timeout)
            .finish()
    }
}

/// A directory connection driven by `ldap3`.
pub struct Ldap3Connection {
    ldap: Ldap,
    timeout: Option<Duration>,
    tls_started: bool,
}

impl Ldap3Connection {
    /// Connect to the server. The connection is driven on the current tokio
    /// runtime but not bound.
    pub async fn connect(config: &Ldap3Config) -> Result<Self, DirectoryError> {
        let (conn, ldap) = LdapConnAsync::with_settings(config.settings(), &config.url).await?;
        let url = config.url.clone();
        tokio::spawn(async move {
            if let Err(err) = conn.drive().await {
                tracing::warn!(%url, error = %err, "LDAP connection driver stopped");
            }
        });
        Ok(Self {
            ldap,
            timeout: config.operation_timeout,
            tls_started: config.starttls || config.url.starts_with("ldaps://"),
        })
    }

    /// Wrap an already driven `ldap3` handle.
    pub fn from_ldap(ldap: Ldap) -> Self {
        Self {
            ldap,
            timeout: None,
            tls_started: false,
        }
    }

    /// The underlying `ldap3` handle with the operation timeout armed.
    fn ldap(&mut self) -> &mut Ldap {
        if let Some(timeout) = self.timeout {
            self.ldap.with_timeout(timeout);
        }
        &mut self.ldap
    }

    fn prepare_search(&mut self, request: &SearchRequest) -> &mut Ldap {
        let options = ldap3::SearchOptions::new()
            .deref(deref_aliases(request.deref_aliases))
            .sizelimit(clamp_limit(request.size_limit))
            .timelimit(clamp_limit(request.time_limit))
            .typesonly(request.types_only);
        let ldap = self.ldap();
        ldap.with_search_options(options);
        ldap
    }
}

impl fmt::Debug for Ldap3Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ldap3Connection")
            .field("timeout", &self.timeout)
            .field("tls_started", &self.tls_started)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DirectoryConnection for Ldap3Connection {
    async fn close(&mut self) -> Result<(), DirectoryError> {
        self.ldap.unbind().await?;
        Ok(())
    }

    async fn start_tls(
        &mut self,
        _config: Arc<rustls::ClientConfig>,
    ) -> Result<(), DirectoryError> {
        if self.tls_started {
            return Ok(());
        }
        Err(DirectoryError::Unsupported(
            "StartTLS must be requested when connecting".into(),
        ))
    }

    async fn bind(&mut self, username: &str, password: &str) -> Result<(), DirectoryError> {
        self.ldap().simple_bind(username, password).await?.success()?;
        Ok(())
    }

    async fn simple_bind(
        &mut self,
        request: &SimpleBindRequest,
    ) -> Result<SimpleBindResult, DirectoryError> {
        if request.password.is_empty() && !request.allow_empty_password {
            return Err(DirectoryError::result(
                ResultCode::EMPTY_PASSWORD,
                "empty password not allowed by the client",
            ));
        }
        let result = self
            .ldap()
            .simple_bind(&request.username, &request.password)
            .await?
            .success()?;
        Ok(SimpleBindResult {
            message: result.text,
        })
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    async fn add(&mut self, request: &AddRequest) -> Result<(), DirectoryError> {
        let attributes: Vec<(String, HashSet<String>)> = request
            .attributes
            .iter()
            .map(|attr| (attr.name.clone(), attr.values.iter().cloned().collect()))
            .collect();
        self.ldap().add(&request.dn, attributes).await?.success()?;
        Ok(())
    }

    async fn delete(&mut self, request: &DeleteRequest) -> Result<(), DirectoryError> {
        self.ldap().delete(&request.dn).await?.success()?;
        Ok(())
    }

    async fn modify(&mut self, request: &ModifyRequest) -> Result<(), DirectoryError> {
        let mut mods = Vec::with_capacity(request.changes.len());
        for change in &request.changes {
            let name = change.attribute.name.clone();
            let values: HashSet<String> = change.attribute.values.iter().cloned().collect();
            mods.push(match change.operation {
                ModifyOperation::Add => Mod::Add(name, values),
                ModifyOperation::Delete => Mod::Delete(name, values),
                ModifyOperation::Replace => Mod::Replace(name, values),
                ModifyOperation::Increment => {
                    let Some(by) = change.attribute.values.first() else {
                        return Err(DirectoryError::Other(format!(
                            "increment of {name} requires a value"
                        )));
                    };
                    Mod::Increment(name, by.clone())
                }
            });
        }
        self.ldap().modify(&request.dn, mods).await?.success()?;
        Ok(())
    }

    async fn compare(
        &mut self,
        dn: &str,
        attribute: &str,
        value: &str,
    ) -> Result<bool, DirectoryError> {
        Ok(self.ldap().compare(dn, attribute, value).await?.equal()?)
    }

    async fn password_modify(
        &mut self,
        request: &PasswordModifyRequest,
    ) -> Result<PasswordModifyResult, DirectoryError> {
        let exop = PasswordModify {
            user_id: request.user_identity.as_deref(),
            old_pass: request.old_password.as_deref(),
            new_pass: request.new_password.as_deref(),
        };
        let (response, _) = self.ldap().extended(exop).await?.success()?;
        let generated_password = response
            .val
            .is_some()
            .then(|| response.parse::<PasswordModifyResp>().gen_pass);
        Ok(PasswordModifyResult { generated_password })
    }

    async fn search(&mut self, request: &SearchRequest) -> Result<SearchResult, DirectoryError> {
        let (entries, _) = self
            .prepare_search(request)
            .search(
                &request.base_dn,
                scope(request.scope),
                &request.filter,
                &request.attributes,
            )
            .await?
            .success()?;

        let mut result = SearchResult::default();
        for entry in entries {
            collect(&mut result, entry);
        }
        Ok(result)
    }

    async fn search_with_paging(
        &mut self,
        request: &SearchRequest,
        page_size: u32,
    ) -> Result<SearchResult, DirectoryError> {
        let adapters: Vec<Box<dyn Adapter<_, _>>> =
            vec![Box::new(PagedResults::new(clamp_limit(page_size)))];
        let mut stream = self
            .prepare_search(request)
            .streaming_search_with(
                adapters,
                &request.base_dn,
                scope(request.scope),
                &request.filter,
                &request.attributes,
            )
            .await?;

        let mut result = SearchResult::default();
        while let Some(entry) = stream.next().await? {
            collect(&mut result, entry);
        }
        stream.finish().await.success()?;
        Ok(result)
    }
}

/// Connects, optionally binds and hands out [`Ldap3Connection`]s.
#[derive(Debug, Clone)]
pub struct Ldap3Factory {
    config: Arc<Ldap3Config>,
}

impl Ldap3Factory {
    /// Create a factory from connection settings.
    pub fn new(config: Ldap3Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// The connection settings.
    #[must_use]
    pub fn config(&self) -> &Ldap3Config {
        &self.config
    }
}

#[async_trait]
impl ConnectionFactory<Ldap3Connection> for Ldap3Factory {
    async fn create(&self, name: &str) -> Result<Ldap3Connection, DirectoryError> {
        tracing::debug!(pool = %name, url = %self.config.url, "connecting to directory server");
        let mut connection = Ldap3Connection::connect(&self.config).await?;
        if let Some(dn) = &self.config.bind_dn {
            if let Err(err) = connection.bind(dn, &self.config.bind_password).await {
                // Best effort; the bind failure is what the caller needs.
                let _ = connection.close().await;
                return Err(err);
            }
        }
        Ok(connection)
    }
}

impl From<LdapError> for DirectoryError {
    fn from(err: LdapError) -> Self {
        match err {
            LdapError::LdapResult { result } => DirectoryError::Result {
                code: u16::try_from(result.rc).map_or(ResultCode::OTHER, ResultCode::from),
                matched_dn: result.matched,
                message: result.text,
            },
            LdapError::Timeout { .. } => DirectoryError::Timeout,
            io @ LdapError::Io { .. } => DirectoryError::Network(io.to_string()),
            other => DirectoryError::Other(other.to_string()),
        }
    }
}

fn collect(result: &mut SearchResult, entry: ResultEntry) {
    if entry.is_ref() {
        result.referrals.extend(ldap3::parse_refs(entry.0));
    } else if !entry.is_intermediate() {
        let entry = SearchEntry::construct(entry);
        result.entries.push(Entry {
            dn: entry.dn,
            attributes: entry.attrs,
        });
    }
}

fn scope(scope: Scope) -> ldap3::Scope {
    match scope {
        Scope::Base => ldap3::Scope::Base,
        Scope::OneLevel => ldap3::Scope::OneLevel,
        Scope::Subtree => ldap3::Scope::Subtree,
    }
}

fn deref_aliases(deref: DerefAliases) -> ldap3::DerefAliases {
    match deref {
        DerefAliases::Never => ldap3::DerefAliases::Never,
        DerefAliases::InSearching => ldap3::DerefAliases::Searching,
        DerefAliases::FindingBase => ldap3::DerefAliases::Finding,
        DerefAliases::Always => ldap3::DerefAliases::Always,
    }
}

fn clamp_limit(limit: u32) -> i32 {
    i32::try_from(limit).unwrap_or(i32::MAX)
}
