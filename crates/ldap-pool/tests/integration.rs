//! Connection pool integration tests against a real directory server.
//!
//! These tests require the `ldap3` feature and a running LDAP server. They
//! are ignored by default and can be run with:
//!
//! ```bash
//! # Set connection details via environment variables
//! export LDAP_URL=ldap://localhost:389
//! export LDAP_BIND_DN=cn=admin,dc=example,dc=org
//! export LDAP_BIND_PASSWORD=adminpassword
//! export LDAP_BASE_DN=dc=example,dc=org
//!
//! cargo test -p ldap-conn-pool --features ldap3 --test integration -- --ignored
//! ```
//!
//! `test_pool_against_container` starts its own OpenLDAP container and only
//! needs Docker.

#![cfg(feature = "ldap3")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use ldap_pool::ldap3_backend::{Ldap3Config, Ldap3Connection, Ldap3Factory};
use ldap_pool::{Pool, PoolError, ResultCode, Scope, SearchRequest};
use ldap_pool_testing::{LDAP_PORT, OpenLdapContainer, fixtures};
use testcontainers::runners::AsyncRunner;

struct Target {
    config: Ldap3Config,
    base_dn: String,
}

/// Helper to get test configuration from environment variables.
fn get_test_config() -> Option<Target> {
    let url = std::env::var("LDAP_URL").ok()?;
    let bind_dn =
        std::env::var("LDAP_BIND_DN").unwrap_or_else(|_| "cn=admin,dc=example,dc=org".into());
    let password =
        std::env::var("LDAP_BIND_PASSWORD").unwrap_or_else(|_| "adminpassword".into());
    let base_dn = std::env::var("LDAP_BASE_DN").unwrap_or_else(|_| "dc=example,dc=org".into());

    Some(Target {
        config: Ldap3Config::new(url)
            .bind(bind_dn, password)
            .operation_timeout(Some(Duration::from_secs(5))),
        base_dn,
    })
}

async fn build_pool(config: Ldap3Config, max: u32) -> Pool<Ldap3Connection> {
    fixtures::init_tracing();
    Pool::builder()
        .name("integration")
        .initial_connections(1)
        .max_connections(max)
        .retire_on([ResultCode::TIME_LIMIT_EXCEEDED, ResultCode::NETWORK_ERROR])
        .factory(Ldap3Factory::new(config))
        .build()
        .await
        .expect("Failed to create pool")
}

// =============================================================================
// Live Server Tests
// =============================================================================

#[tokio::test]
#[ignore = "Requires LDAP server"]
async fn test_pool_search_and_reuse() {
    let target = get_test_config().expect("LDAP_URL required");
    let pool = build_pool(target.config, 2).await;

    let mut conn = pool.get().await.expect("Failed to get connection");
    let id = conn.id();
    let result = conn
        .search(&SearchRequest::new(target.base_dn.clone(), "(objectClass=*)").scope(Scope::Base))
        .await
        .expect("Search failed");
    assert_eq!(result.entries.len(), 1);
    conn.close().await;

    let conn = pool.get().await.expect("Failed to get connection");
    assert_eq!(conn.id(), id, "Should reuse the same connection");
    conn.close().await;

    pool.shutdown().await;
    assert!(matches!(pool.get().await, Err(PoolError::PoolClosed)));
}

#[tokio::test]
#[ignore = "Requires LDAP server"]
async fn test_pool_concurrent_searches() {
    let target = get_test_config().expect("LDAP_URL required");
    let pool = build_pool(target.config, 3).await;

    let mut handles = Vec::new();
    for _ in 0..12 {
        let pool = pool.clone();
        let base_dn = target.base_dn.clone();
        handles.push(tokio::spawn(async move {
            let mut conn = pool.get().await?;
            let result = conn
                .search(&SearchRequest::new(base_dn, "(objectClass=*)").scope(Scope::Base))
                .await;
            conn.close().await;
            Ok::<_, PoolError>(result.is_ok())
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap().unwrap());
    }

    let status = pool.status();
    assert!(status.total <= 3);
    assert_eq!(status.in_use, 0);

    pool.shutdown().await;
}

#[tokio::test]
#[ignore = "Requires LDAP server"]
async fn test_pool_bad_credentials_fail_creation() {
    let target = get_test_config().expect("LDAP_URL required");
    let config = target.config.bind("cn=nobody,dc=invalid", "wrong");

    let result = Pool::builder()
        .initial_connections(1)
        .factory(Ldap3Factory::new(config))
        .build()
        .await;

    match result {
        Err(PoolError::ConnectionCreation(err)) => {
            assert!(err.result_code().is_some());
        }
        other => panic!("expected a creation error, got {other:?}"),
    }
}

// =============================================================================
// Container Tests
// =============================================================================

#[tokio::test]
#[ignore = "Requires Docker"]
async fn test_pool_against_container() {
    let image = OpenLdapContainer::default();
    let admin_dn = image.admin_dn();
    let password = image.admin_password.clone();
    let root_dn = image.root_dn.clone();

    let container = image.start().await.expect("Failed to start container");
    let port = container
        .get_host_port_ipv4(LDAP_PORT)
        .await
        .expect("Failed to map port");

    let config =
        Ldap3Config::new(OpenLdapContainer::url("127.0.0.1", port)).bind(admin_dn, password);
    let pool = build_pool(config, 2).await;

    let mut conn = pool.get().await.expect("Failed to get connection");
    let result = conn
        .search(&SearchRequest::new(root_dn, "(objectClass=*)").scope(Scope::Base))
        .await
        .expect("Search failed");
    assert_eq!(result.entries.len(), 1);
    conn.close().await;

    pool.shutdown().await;
}
