//! # ldap-pool-testing
//!
//! Test infrastructure for the LDAP connection pool.
//!
//! ## Features
//!
//! - In-memory mock directory with scripted failures (no server required)
//! - Connection accounting for checking pool capacity limits
//! - Directory tree fixtures
//! - OpenLDAP container management via testcontainers
//!
//! ## Mock Directory Example
//!
//! ```rust,ignore
//! use ldap_pool::{Pool, ResultCode, SearchRequest};
//! use ldap_pool_testing::fixtures::TestFixture;
//!
//! #[tokio::test]
//! async fn test_with_mock_directory() {
//!     let fixture = TestFixture::default().with_user("alice");
//!     let directory = fixture.directory();
//!
//!     let pool = Pool::builder()
//!         .max_connections(2)
//!         .factory(directory.factory())
//!         .build()
//!         .await
//!         .unwrap();
//!
//!     let mut conn = pool.get().await.unwrap();
//!     conn.search(&SearchRequest::new("dc=example,dc=com", "(uid=alice)")).await.unwrap();
//!     conn.close().await;
//!
//!     assert!(directory.peak_open_connections() <= 2);
//! }
//! ```
//!
//! ## Container Example
//!
//! ```rust,ignore
//! use ldap_pool_testing::{LDAP_PORT, OpenLdapContainer};
//! use testcontainers::runners::AsyncRunner;
//!
//! #[tokio::test]
//! async fn test_with_real_server() {
//!     let container = OpenLdapContainer::default().start().await.unwrap();
//!     let port = container.get_host_port_ipv4(LDAP_PORT).await.unwrap();
//!     // Connect to ldap://localhost:port...
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod container;
pub mod fixtures;
pub mod mock;

pub use container::{LDAP_PORT, OpenLdapContainer};
pub use mock::{MockConnection, MockDirectory, MockFactory, MockOperation};
