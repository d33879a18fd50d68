//! # ldap-pool
//!
//! Bounded connection pool for LDAP directory clients.
//!
//! The pool keeps a set of idle connections, creates new ones through a
//! user-supplied [`ConnectionFactory`] up to a hard cap, and makes callers
//! wait when the cap is reached. Connections that fail with a configured
//! result code (a network error or `timeLimitExceeded`, for example) are
//! retired on release instead of being recycled.
//!
//! ## Features
//!
//! - Hard cap on live connections, with waiting checkouts
//! - Eager creation of an initial set of connections
//! - Error-driven retirement through a [`RetirementPolicy`]
//! - Optional acquisition timeout and idle reaper
//! - `ldap3` feature: a ready-made backend built on the `ldap3` crate
//!
//! ## Example
//!
//! ```rust,ignore
//! use ldap_pool::{Pool, ResultCode, SearchRequest};
//! use ldap_pool::ldap3_backend::{Ldap3Config, Ldap3Factory};
//!
//! let factory = Ldap3Factory::new(
//!     Ldap3Config::new("ldap://localhost:389").bind("cn=admin,dc=example,dc=com", "secret"),
//! );
//!
//! let pool = Pool::builder()
//!     .initial_connections(2)
//!     .max_connections(10)
//!     .retire_on([ResultCode::TIME_LIMIT_EXCEEDED, ResultCode::NETWORK_ERROR])
//!     .factory(factory)
//!     .build()
//!     .await?;
//!
//! let mut conn = pool.get().await?;
//! let result = conn.search(&SearchRequest::new("dc=example,dc=com", "(uid=alice)")).await;
//! // Returns the connection to the pool, or retires it if the search
//! // failed with a retirement code.
//! conn.close().await;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod connection;
pub mod error;
pub mod lifecycle;
pub mod message;
pub mod policy;
pub mod pool;
pub mod pooled;
pub mod reaper;
pub mod result_code;

#[cfg(feature = "ldap3")]
pub mod ldap3_backend;

pub use config::PoolConfig;
pub use connection::{ConnectionFactory, DirectoryConnection};
pub use error::{DirectoryError, PoolError};
pub use lifecycle::ConnectionMetadata;
pub use message::{
    AddRequest, Attribute, DeleteRequest, DerefAliases, Entry, ModifyOperation, ModifyRequest,
    Modification, PasswordModifyRequest, PasswordModifyResult, Scope, SearchRequest,
    SearchResult, SimpleBindRequest, SimpleBindResult,
};
pub use policy::RetirementPolicy;
pub use pool::{Pool, PoolBuilder, PoolMetrics, PoolStatus};
pub use pooled::PooledConnection;
pub use reaper::ReaperHandle;
pub use result_code::ResultCode;
