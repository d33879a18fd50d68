//! Connection lifecycle bookkeeping.
//!
//! Every raw connection carries a [`ConnectionMetadata`] record from the
//! moment the factory produces it until it is torn down. The record moves
//! with the connection between the idle set and the checked-out wrapper.

use std::time::Duration;

use tokio::time::Instant;

/// Metadata about a pooled connection.
#[derive(Debug, Clone)]
pub struct ConnectionMetadata {
    /// Unique identifier for this connection within its pool.
    pub id: u64,
    /// When the connection was created.
    pub created_at: Instant,
    /// When the connection was last checked out or returned.
    pub last_used_at: Instant,
    /// Number of times the connection has been checked out.
    pub checkout_count: u64,
}

impl ConnectionMetadata {
    /// Create metadata for a new connection.
    #[must_use]
    pub fn new(id: u64) -> Self {
        let now = Instant::now();
        Self {
            id,
            created_at: now,
            last_used_at: now,
            checkout_count: 0,
        }
    }

    /// Check if the connection has exceeded its maximum lifetime.
    #[must_use]
    pub fn is_expired(&self, max_lifetime: Duration) -> bool {
        self.created_at.elapsed() > max_lifetime
    }

    /// Check if the connection has been idle too long.
    #[must_use]
    pub fn is_idle_expired(&self, idle_timeout: Duration) -> bool {
        self.last_used_at.elapsed() > idle_timeout
    }

    /// Mark the connection as checked out.
    pub fn mark_checkout(&mut self) {
        self.last_used_at = Instant::now();
        self.checkout_count += 1;
    }

    /// Mark the connection as returned to idle.
    pub fn mark_checkin(&mut self) {
        self.last_used_at = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_metadata_new() {
        let meta = ConnectionMetadata::new(1);
        assert_eq!(meta.id, 1);
        assert_eq!(meta.checkout_count, 0);
        assert!(!meta.is_expired(Duration::from_secs(60)));
        assert!(!meta.is_idle_expired(Duration::from_secs(60)));
    }

    #[test]
    fn test_connection_metadata_checkout() {
        let mut meta = ConnectionMetadata::new(1);
        meta.mark_checkout();
        meta.mark_checkout();

        assert_eq!(meta.checkout_count, 2);
    }

    #[test]
    fn test_connection_metadata_checkin_refreshes_idle_clock() {
        let mut meta = ConnectionMetadata::new(1);
        meta.last_used_at -= Duration::from_millis(200);
        assert!(meta.is_idle_expired(Duration::from_millis(100)));

        meta.mark_checkin();
        assert!(!meta.is_idle_expired(Duration::from_millis(100)));
    }

    #[test]
    fn test_connection_metadata_lifetime() {
        let mut meta = ConnectionMetadata::new(7);
        meta.created_at -= Duration::from_millis(200);

        assert!(meta.is_expired(Duration::from_millis(100)));
        assert!(!meta.is_expired(Duration::from_secs(10)));
    }
}
