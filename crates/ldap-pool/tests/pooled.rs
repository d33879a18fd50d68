//! Checked-out connection behavior: pass-through, retirement and release.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use ldap_pool::{
    AddRequest, DeleteRequest, DirectoryConnection, DirectoryError, ModifyRequest,
    PasswordModifyRequest, Pool, PoolError, ResultCode, Scope, SearchRequest, SimpleBindRequest,
};
use ldap_pool_testing::fixtures::{self, ADMIN_DN, ADMIN_PASSWORD, BASE_DN, TestFixture};
use ldap_pool_testing::{MockConnection, MockDirectory, MockOperation};
use tokio_test::{assert_pending, assert_ready_ok, task};

async fn retiring_pool(directory: &MockDirectory, initial: u32, max: u32) -> Pool<MockConnection> {
    fixtures::init_tracing();
    Pool::builder()
        .name("retiring")
        .initial_connections(initial)
        .max_connections(max)
        .retire_on([ResultCode::TIME_LIMIT_EXCEEDED, ResultCode::NETWORK_ERROR])
        .factory(directory.factory())
        .build()
        .await
        .expect("Failed to create pool")
}

// =============================================================================
// Pass-through
// =============================================================================

#[tokio::test]
async fn test_operations_pass_through() {
    let fixture = TestFixture::default().with_user("alice").with_user("bob");
    let directory = fixture.directory();
    let pool = retiring_pool(&directory, 1, 1).await;
    let mut conn = pool.get().await.expect("Failed to get connection");

    conn.bind(ADMIN_DN, ADMIN_PASSWORD).await.expect("bind failed");

    let result = conn
        .search(
            &SearchRequest::new(format!("ou=people,{BASE_DN}"), "(objectClass=inetOrgPerson)")
                .scope(Scope::OneLevel)
                .attributes(["uid", "mail"]),
        )
        .await
        .expect("search failed");
    assert_eq!(result.entries.len(), 2);
    assert!(result.entries.iter().all(|e| e.values("cn").is_empty()));

    let carol = fixture.user_dn("carol");
    conn.add(
        &AddRequest::new(carol.clone())
            .attribute("objectClass", ["top", "inetOrgPerson"])
            .attribute("uid", ["carol"]),
    )
    .await
    .expect("add failed");

    conn.modify(&ModifyRequest::new(carol.clone()).replace("mail", ["carol@example.com"]))
        .await
        .expect("modify failed");
    assert!(
        conn.compare(&carol, "mail", "carol@example.com")
            .await
            .expect("compare failed")
    );
    assert!(!conn.compare(&carol, "mail", "nobody@example.com").await.unwrap());

    let paged = conn
        .search_with_paging(&SearchRequest::new(BASE_DN, "(uid=*)"), 1)
        .await
        .expect("paged search failed");
    assert_eq!(paged.entries.len(), 3);

    conn.delete(&DeleteRequest::new(carol.clone()))
        .await
        .expect("delete failed");
    assert!(directory.entry(&carol).is_none());

    assert!(!conn.is_unusable());
    conn.close().await;
    pool.shutdown().await;
}

#[tokio::test]
async fn test_bind_and_password_modify_pass_through() {
    let fixture = TestFixture::default().with_user("alice");
    let directory = fixture.directory().with_user(fixture.user_dn("alice"), "old-secret");
    let pool = retiring_pool(&directory, 0, 1).await;
    let mut conn = pool.get().await.unwrap();

    let alice = fixture.user_dn("alice");
    conn.simple_bind(&SimpleBindRequest::new(alice.clone(), "old-secret"))
        .await
        .expect("simple bind failed");

    let result = conn
        .password_modify(&PasswordModifyRequest {
            old_password: Some("old-secret".into()),
            ..PasswordModifyRequest::default()
        })
        .await
        .expect("password modify failed");
    let generated = result.generated_password.expect("a password was generated");

    conn.bind(&alice, &generated).await.expect("bind with new password");

    let err = conn
        .simple_bind(&SimpleBindRequest::new(alice, ""))
        .await
        .unwrap_err();
    assert!(err.has_code(ResultCode::EMPTY_PASSWORD));
    assert!(!conn.is_unusable());

    conn.close().await;
}

#[tokio::test]
async fn test_timeout_and_tls_reach_the_raw_connection() {
    let directory = MockDirectory::new();
    let pool = retiring_pool(&directory, 0, 1).await;
    let mut conn = pool.get().await.unwrap();

    conn.start();
    conn.set_timeout(Duration::from_secs(5));
    conn.start_tls(fixtures::tls_config())
        .await
        .expect("StartTLS failed");

    let raw = conn.detach();
    assert_eq!(raw.timeout(), Some(Duration::from_secs(5)));
    assert!(raw.is_tls());
}

// =============================================================================
// Retirement
// =============================================================================

#[tokio::test]
async fn test_retirement_code_marks_unusable() {
    let directory = TestFixture::default().directory();
    let pool = retiring_pool(&directory, 1, 2).await;
    let mut conn = pool.get().await.unwrap();
    let retired_id = conn.id();

    directory.fail_next(
        MockOperation::Search,
        DirectoryError::result(ResultCode::TIME_LIMIT_EXCEEDED, "time limit exceeded"),
    );
    let err = conn
        .search(&SearchRequest::new(BASE_DN, "(objectClass=*)"))
        .await
        .unwrap_err();

    assert!(err.has_code(ResultCode::TIME_LIMIT_EXCEEDED), "error is passed through");
    assert_eq!(err.to_string(), "LDAP result code 3 (timeLimitExceeded): time limit exceeded");
    assert!(conn.is_unusable());

    conn.close().await;
    assert_eq!(pool.len(), 0);
    assert_eq!(pool.status().total, 0);
    assert_eq!(directory.closed(), 1);

    let conn = pool.get().await.unwrap();
    assert_ne!(conn.id(), retired_id, "a retired connection is never handed out again");
    conn.close().await;
}

#[tokio::test]
async fn test_network_error_marks_unusable() {
    let directory = TestFixture::default().directory();
    let pool = retiring_pool(&directory, 1, 1).await;
    let mut conn = pool.get().await.unwrap();

    directory.fail_next(MockOperation::Modify, DirectoryError::network("connection reset"));
    let err = conn
        .modify(&ModifyRequest::new(BASE_DN).replace("description", ["x"]))
        .await
        .unwrap_err();

    assert!(matches!(err, DirectoryError::Network(_)));
    assert!(conn.is_unusable());
    conn.close().await;
    assert_eq!(pool.status().total, 0);
}

#[tokio::test]
async fn test_other_codes_keep_connection_usable() {
    let directory = TestFixture::default().directory();
    let pool = retiring_pool(&directory, 1, 1).await;
    let mut conn = pool.get().await.unwrap();
    let id = conn.id();

    let err = conn
        .search(&SearchRequest::new("ou=missing,dc=example,dc=com", "(objectClass=*)"))
        .await
        .unwrap_err();
    assert!(err.has_code(ResultCode::NO_SUCH_OBJECT));

    let err = conn.bind(ADMIN_DN, "wrong").await.unwrap_err();
    assert!(err.has_code(ResultCode::INVALID_CREDENTIALS));

    assert!(!conn.is_unusable());
    conn.close().await;

    assert_eq!(pool.len(), 1);
    let conn = pool.get().await.unwrap();
    assert_eq!(conn.id(), id);
    conn.close().await;
}

#[tokio::test]
async fn test_empty_policy_never_retires() {
    let directory = TestFixture::default().directory();
    let pool = Pool::builder()
        .max_connections(1)
        .factory(directory.factory())
        .build()
        .await
        .unwrap();
    let mut conn = pool.get().await.unwrap();

    directory.fail_next(MockOperation::Search, DirectoryError::network("reset"));
    assert!(
        conn.search(&SearchRequest::new(BASE_DN, "(objectClass=*)"))
            .await
            .is_err()
    );
    assert!(!conn.is_unusable());

    conn.close().await;
    assert_eq!(pool.len(), 1);
}

#[tokio::test]
async fn test_mark_unusable_is_idempotent() {
    let directory = MockDirectory::new();
    let pool = retiring_pool(&directory, 1, 1).await;
    let mut conn = pool.get().await.unwrap();

    conn.mark_unusable();
    conn.mark_unusable();
    assert!(conn.is_unusable());

    conn.close().await;
    assert_eq!(directory.closed(), 1);
    assert_eq!(pool.metrics().connections_retired, 1);
}

#[tokio::test]
async fn test_teardown_failure_still_frees_capacity() {
    let directory = MockDirectory::new();
    let pool = retiring_pool(&directory, 1, 1).await;
    let mut conn = pool.get().await.unwrap();

    directory.fail_next(MockOperation::Close, DirectoryError::network("broken pipe"));
    conn.mark_unusable();
    conn.close().await;

    assert_eq!(pool.status().total, 0);
    let conn = pool.get().await.expect("capacity was released");
    conn.close().await;
}

#[tokio::test]
async fn test_retired_slot_unblocks_waiter() {
    let directory = MockDirectory::new();
    let pool = retiring_pool(&directory, 1, 1).await;
    let mut held = pool.get().await.unwrap();
    let held_id = held.id();

    let mut waiter = task::spawn(pool.get());
    assert_pending!(waiter.poll());

    held.mark_unusable();
    held.close().await;
    assert!(waiter.is_woken());

    let conn = assert_ready_ok!(waiter.poll());
    assert_ne!(conn.id(), held_id);
    assert_eq!(directory.peak_open_connections(), 1, "no transient over-allocation");
    conn.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_teardown_frees_capacity() {
    fixtures::init_tracing();
    let directory = MockDirectory::new().with_close_delay(Duration::from_secs(3600));
    let pool = Pool::builder()
        .initial_connections(1)
        .max_connections(1)
        .connection_timeout(Duration::from_secs(5))
        .factory(directory.factory())
        .build()
        .await
        .unwrap();

    let mut conn = pool.get().await.unwrap();
    let stuck_id = conn.id();
    conn.mark_unusable();
    let closed = tokio::time::timeout(Duration::from_secs(1), conn.close()).await;
    assert!(closed.is_err(), "teardown never completes");

    assert_eq!(pool.status().total, 0);
    assert_eq!(directory.dropped(), 1);

    let conn = pool.get().await.expect("capacity was released");
    assert_ne!(conn.id(), stuck_id);
    assert_eq!(directory.peak_open_connections(), 1);
    conn.close().await;
}

// =============================================================================
// Release without close
// =============================================================================

#[tokio::test]
async fn test_drop_without_close_releases_slot() {
    let directory = MockDirectory::new();
    let pool = retiring_pool(&directory, 1, 1).await;

    let conn = pool.get().await.unwrap();
    drop(conn);

    assert_eq!(pool.len(), 0, "a dropped connection is not recycled");
    assert_eq!(pool.status().total, 0);
    assert_eq!(directory.dropped(), 1);

    let conn = pool.get().await.expect("capacity was released");
    conn.close().await;
}

#[tokio::test]
async fn test_detach_hands_ownership_to_caller() {
    let directory = MockDirectory::new();
    let pool = retiring_pool(&directory, 1, 1).await;

    let conn = pool.get().await.unwrap();
    let mut raw = conn.detach();

    assert_eq!(pool.status().total, 0);
    assert_eq!(directory.open_connections(), 1);

    let other = pool.get().await.expect("capacity was released");
    assert_eq!(directory.created(), 2);
    other.close().await;

    raw.close().await.expect("caller closes the detached connection");
    assert!(raw.is_closed());
}

// =============================================================================
// End-to-end scenario
// =============================================================================

#[tokio::test]
async fn test_checkout_retire_scenario() {
    let directory = MockDirectory::new();
    let pool = retiring_pool(&directory, 1, 2).await;
    assert_eq!(pool.len(), 1);

    let first = pool.get().await.unwrap();
    let second = pool.get().await.unwrap();
    assert_eq!(pool.status().total, 2);

    let mut third = task::spawn(pool.get());
    assert_pending!(third.poll());

    let returned_id = first.id();
    first.close().await;
    let mut conn = assert_ready_ok!(third.poll());
    assert_eq!(conn.id(), returned_id);

    conn.mark_unusable();
    conn.close().await;

    let status = pool.status();
    assert_eq!(status.total, 1);
    assert_eq!(pool.len(), 0);

    second.close().await;
    pool.shutdown().await;

    assert!(matches!(pool.get().await, Err(PoolError::PoolClosed)));
    assert_eq!(directory.open_connections(), 0);
}
