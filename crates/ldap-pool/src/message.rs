//! Directory operation requests and results.
//!
//! These types are carried through the pool untouched. The pool never
//! inspects filters, attributes or entries; they exist so that the
//! [`DirectoryConnection`](crate::DirectoryConnection) trait has a concrete,
//! backend-neutral vocabulary.

use std::collections::HashMap;

/// Search scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// Only the base object.
    Base,
    /// Immediate children of the base object.
    OneLevel,
    /// The base object and all its descendants.
    #[default]
    Subtree,
}

/// Alias dereferencing behavior during a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DerefAliases {
    /// Never dereference aliases.
    #[default]
    Never,
    /// Dereference while searching below the base object.
    InSearching,
    /// Dereference when locating the base object.
    FindingBase,
    /// Always dereference.
    Always,
}

/// A search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Base DN of the search.
    pub base_dn: String,
    /// Search scope.
    pub scope: Scope,
    /// Alias dereferencing.
    pub deref_aliases: DerefAliases,
    /// Maximum number of entries to return (0 = no limit).
    pub size_limit: u32,
    /// Server-side time limit in seconds (0 = no limit).
    pub time_limit: u32,
    /// Return attribute names only.
    pub types_only: bool,
    /// Search filter, e.g. `(objectClass=person)`.
    pub filter: String,
    /// Attributes to return; empty means all user attributes.
    pub attributes: Vec<String>,
}

impl SearchRequest {
    /// Create a subtree search with no limits.
    pub fn new(base_dn: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            base_dn: base_dn.into(),
            scope: Scope::default(),
            deref_aliases: DerefAliases::default(),
            size_limit: 0,
            time_limit: 0,
            types_only: false,
            filter: filter.into(),
            attributes: Vec::new(),
        }
    }

    /// Set the search scope.
    #[must_use]
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Set alias dereferencing.
    #[must_use]
    pub fn deref_aliases(mut self, deref: DerefAliases) -> Self {
        self.deref_aliases = deref;
        self
    }

    /// Set the size limit.
    #[must_use]
    pub fn size_limit(mut self, limit: u32) -> Self {
        self.size_limit = limit;
        self
    }

    /// Set the server-side time limit in seconds.
    #[must_use]
    pub fn time_limit(mut self, seconds: u32) -> Self {
        self.time_limit = seconds;
        self
    }

    /// Return attribute names only.
    #[must_use]
    pub fn types_only(mut self, enabled: bool) -> Self {
        self.types_only = enabled;
        self
    }

    /// Set the attributes to return.
    #[must_use]
    pub fn attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }
}

/// A single search result entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Entry {
    /// Distinguished name of the entry.
    pub dn: String,
    /// Attribute values keyed by attribute name.
    pub attributes: HashMap<String, Vec<String>>,
}

impl Entry {
    /// Create an entry with no attributes.
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: HashMap::new(),
        }
    }

    /// Add values for an attribute.
    #[must_use]
    pub fn with_attribute<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes
            .entry(name.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// All values of an attribute.
    #[must_use]
    pub fn values(&self, name: &str) -> &[String] {
        self.attributes.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First value of an attribute.
    #[must_use]
    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.values(name).first().map(String::as_str)
    }
}

/// The result of a search.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchResult {
    /// Returned entries.
    pub entries: Vec<Entry>,
    /// Continuation references returned by the server.
    pub referrals: Vec<String>,
}

/// An attribute with its values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute type name.
    pub name: String,
    /// Attribute values.
    pub values: Vec<String>,
}

impl Attribute {
    /// Create an attribute.
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// An add request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddRequest {
    /// DN of the entry to create.
    pub dn: String,
    /// Attributes of the new entry.
    pub attributes: Vec<Attribute>,
}

impl AddRequest {
    /// Create an add request with no attributes.
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: Vec::new(),
        }
    }

    /// Add an attribute to the new entry.
    #[must_use]
    pub fn attribute<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes.push(Attribute::new(name, values));
        self
    }
}

/// A delete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    /// DN of the entry to delete.
    pub dn: String,
}

impl DeleteRequest {
    /// Create a delete request.
    pub fn new(dn: impl Into<String>) -> Self {
        Self { dn: dn.into() }
    }
}

/// Kind of change in a [`ModifyRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyOperation {
    /// Add values.
    Add,
    /// Delete values, or the whole attribute if no values are given.
    Delete,
    /// Replace all values.
    Replace,
    /// Increment a numeric value.
    Increment,
}

/// One change within a [`ModifyRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modification {
    /// Kind of change.
    pub operation: ModifyOperation,
    /// Attribute being changed.
    pub attribute: Attribute,
}

/// A modify request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyRequest {
    /// DN of the entry to modify.
    pub dn: String,
    /// Changes, applied in order.
    pub changes: Vec<Modification>,
}

impl ModifyRequest {
    /// Create an empty modify request.
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            changes: Vec::new(),
        }
    }

    fn push<I, S>(mut self, operation: ModifyOperation, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.changes.push(Modification {
            operation,
            attribute: Attribute::new(name, values),
        });
        self
    }

    /// Add values to an attribute.
    #[must_use]
    pub fn add<I, S>(self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(ModifyOperation::Add, name, values)
    }

    /// Delete values from an attribute.
    #[must_use]
    pub fn delete<I, S>(self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(ModifyOperation::Delete, name, values)
    }

    /// Replace the values of an attribute.
    #[must_use]
    pub fn replace<I, S>(self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(ModifyOperation::Replace, name, values)
    }

    /// Increment a numeric attribute.
    #[must_use]
    pub fn increment(self, name: impl Into<String>, by: impl Into<String>) -> Self {
        self.push(ModifyOperation::Increment, name, [by])
    }
}

/// A simple bind request.
#[derive(Clone, PartialEq, Eq)]
pub struct SimpleBindRequest {
    /// Bind DN.
    pub username: String,
    /// Bind password.
    pub password: String,
    /// Allow an unauthenticated bind with an empty password.
    pub allow_empty_password: bool,
}

impl SimpleBindRequest {
    /// Create a simple bind request.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            allow_empty_password: false,
        }
    }
}

impl std::fmt::Debug for SimpleBindRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleBindRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("allow_empty_password", &self.allow_empty_password)
            .finish()
    }
}

/// The result of a successful simple bind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SimpleBindResult {
    /// Diagnostic message from the server, possibly empty.
    pub message: String,
}

/// A password modify extended operation (RFC 3062).
#[derive(Clone, PartialEq, Eq, Default)]
pub struct PasswordModifyRequest {
    /// User whose password changes; `None` means the bound user.
    pub user_identity: Option<String>,
    /// Current password, if the server requires it.
    pub old_password: Option<String>,
    /// New password; `None` asks the server to generate one.
    pub new_password: Option<String>,
}

impl std::fmt::Debug for PasswordModifyRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordModifyRequest")
            .field("user_identity", &self.user_identity)
            .field("old_password", &self.old_password.as_ref().map(|_| "[REDACTED]"))
            .field("new_password", &self.new_password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// The result of a password modify operation.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct PasswordModifyResult {
    /// Password generated by the server, if one was requested.
    pub generated_password: Option<String>,
}

impl std::fmt::Debug for PasswordModifyResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordModifyResult")
            .field(
                "generated_password",
                &self.generated_password.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}
