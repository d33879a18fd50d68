//! Connection pooling against a live directory server.
//!
//! This example builds a pool of `ldap3` connections, runs concurrent
//! searches through it, shows how a retiring error code removes a
//! connection, and reports pool status and metrics along the way.
//!
//! # Running
//!
//! ```bash
//! export LDAP_URL=ldap://localhost:389
//! export LDAP_BIND_DN=cn=admin,dc=example,dc=org
//! export LDAP_BIND_PASSWORD=adminpassword
//! export LDAP_BASE_DN=dc=example,dc=org
//!
//! cargo run -p ldap-conn-pool --features ldap3 --example ldap_pool
//! ```

// Allow common patterns in example code
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use ldap_pool::ldap3_backend::{Ldap3Config, Ldap3Connection, Ldap3Factory};
use ldap_pool::{Pool, PoolConfig, PoolError, ResultCode, Scope, SearchRequest};
use tokio::time::Instant;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let url = std::env::var("LDAP_URL").unwrap_or_else(|_| "ldap://localhost:389".into());
    let bind_dn =
        std::env::var("LDAP_BIND_DN").unwrap_or_else(|_| "cn=admin,dc=example,dc=org".into());
    let password =
        std::env::var("LDAP_BIND_PASSWORD").unwrap_or_else(|_| "adminpassword".into());
    let base_dn = std::env::var("LDAP_BASE_DN").unwrap_or_else(|_| "dc=example,dc=org".into());

    let ldap_config = Ldap3Config::new(url)
        .bind(bind_dn, password)
        .operation_timeout(Some(Duration::from_secs(5)));

    println!("=== LDAP Connection Pool Example ===\n");

    // Configure the pool
    let pool_config = PoolConfig::new()
        .name("example")
        .initial_connections(2)
        .max_connections(5)
        .connection_timeout(Duration::from_secs(10))
        .idle_timeout(Some(Duration::from_secs(60)))
        .retire_on([ResultCode::TIME_LIMIT_EXCEEDED, ResultCode::NETWORK_ERROR]);

    println!("Pool configuration:");
    println!("  Initial connections: {}", pool_config.initial_connections);
    println!("  Max connections: {}", pool_config.max_connections);
    println!("  Idle timeout: {:?}", pool_config.idle_timeout);
    println!(
        "  Retiring codes: {:?}",
        pool_config.retirement.codes().collect::<Vec<_>>()
    );
    println!();

    let pool: Pool<Ldap3Connection> =
        Pool::new(pool_config, Ldap3Factory::new(ldap_config)).await?;
    let reaper = pool.spawn_reaper(Duration::from_secs(5));

    print_pool_status(&pool);

    // Example 1: Basic pool usage
    println!("\n1. Basic pool usage:");
    {
        let mut conn = pool.get().await?;
        let result = conn
            .search(&SearchRequest::new(base_dn.clone(), "(objectClass=*)").scope(Scope::Base))
            .await?;
        for entry in &result.entries {
            println!("  Found: {}", entry.dn);
        }
        // Hand the connection back for reuse
        conn.close().await;
    }

    // Example 2: Concurrent usage
    println!("\n2. Concurrent pool usage (20 parallel searches):");
    let start = Instant::now();
    let mut handles = vec![];

    for _ in 0..20 {
        let pool = pool.clone();
        let base_dn = base_dn.clone();
        handles.push(tokio::spawn(async move {
            let mut conn = pool.get().await?;
            let result = conn
                .search(
                    &SearchRequest::new(base_dn, "(objectClass=*)")
                        .scope(Scope::OneLevel)
                        .size_limit(10),
                )
                .await;
            conn.close().await;
            Ok::<_, PoolError>(result.is_ok())
        }));
    }

    let mut completed = 0;
    for handle in handles {
        if let Ok(true) = handle.await? {
            completed += 1;
        }
    }

    println!("  Completed {} searches in {:?}", completed, start.elapsed());
    print_pool_metrics(&pool);

    // Example 3: Retiring a connection
    println!("\n3. Retiring a connection:");
    {
        let mut conn = pool.get().await?;
        let id = conn.id();
        conn.mark_unusable();
        conn.close().await;
        println!("  Connection {} retired", id);
        print_pool_status(&pool);
    }

    // Example 4: Pool health
    println!("\n4. Pool health monitoring:");
    let status = pool.status();
    let utilization = status.utilization();
    let health_status = if utilization < 70.0 {
        "HEALTHY"
    } else if utilization < 90.0 {
        "WARNING"
    } else {
        "CRITICAL"
    };
    println!("  Pool health: {}", health_status);
    println!("  Utilization: {:.1}%", utilization);
    println!("  Idle connections: {}", pool.len());

    // Graceful shutdown
    println!("\n5. Graceful shutdown:");
    reaper.stop().await;
    pool.shutdown().await;
    print_pool_metrics(&pool);
    println!("  Pool closed.");

    Ok(())
}

fn print_pool_status(pool: &Pool<Ldap3Connection>) {
    let status = pool.status();
    println!(
        "  Status: {} idle, {}/{} connections ({:.1}% utilization)",
        status.available,
        status.in_use,
        status.total,
        status.utilization()
    );
}

fn print_pool_metrics(pool: &Pool<Ldap3Connection>) {
    let metrics = pool.metrics();
    println!("  Metrics:");
    println!("    Connections created: {}", metrics.connections_created);
    println!("    Connections closed: {}", metrics.connections_closed);
    println!("    Connections retired: {}", metrics.connections_retired);
    println!("    Connections reaped: {}", metrics.connections_reaped);
    println!(
        "    Checkout success rate: {:.2}%",
        metrics.checkout_success_rate() * 100.0
    );
}
