//! Test fixture utilities.

use std::sync::{Arc, Once};

use ldap_pool::Entry;

use crate::mock::MockDirectory;

/// Base DN of the fixture directory.
pub const BASE_DN: &str = "dc=example,dc=com";

/// DN of the fixture administrator.
pub const ADMIN_DN: &str = "cn=admin,dc=example,dc=com";

/// Password of the fixture administrator.
pub const ADMIN_PASSWORD: &str = "admin-secret";

/// Directory tree used across tests.
pub struct TestFixture {
    /// Base DN.
    pub base_dn: String,
    /// Organizational units created under the base.
    pub units: Vec<String>,
    /// User ids created under `ou=people`.
    pub users: Vec<String>,
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new(BASE_DN)
    }
}

impl TestFixture {
    /// Create a new fixture rooted at `base_dn`.
    #[must_use]
    pub fn new(base_dn: impl Into<String>) -> Self {
        Self {
            base_dn: base_dn.into(),
            units: vec!["people".into(), "groups".into()],
            users: Vec::new(),
        }
    }

    /// Add a user under `ou=people`.
    #[must_use]
    pub fn with_user(mut self, uid: impl Into<String>) -> Self {
        self.users.push(uid.into());
        self
    }

    /// DN of the user `uid`.
    #[must_use]
    pub fn user_dn(&self, uid: &str) -> String {
        format!("uid={uid},ou=people,{}", self.base_dn)
    }

    /// Every entry of the fixture, parents first.
    #[must_use]
    pub fn entries(&self) -> Vec<Entry> {
        let dc = self
            .base_dn
            .split(',')
            .next()
            .and_then(|rdn| rdn.strip_prefix("dc="))
            .unwrap_or_default()
            .to_owned();

        let mut entries = vec![
            Entry::new(self.base_dn.clone())
                .with_attribute("objectClass", ["top", "domain"])
                .with_attribute("dc", [dc]),
        ];
        for unit in &self.units {
            entries.push(
                Entry::new(format!("ou={unit},{}", self.base_dn))
                    .with_attribute("objectClass", ["top", "organizationalUnit"])
                    .with_attribute("ou", [unit.clone()]),
            );
        }
        for uid in &self.users {
            entries.push(
                Entry::new(self.user_dn(uid))
                    .with_attribute("objectClass", ["top", "inetOrgPerson"])
                    .with_attribute("uid", [uid.clone()])
                    .with_attribute("cn", [uid.clone()])
                    .with_attribute("sn", [uid.clone()])
                    .with_attribute("mail", [format!("{uid}@example.com")]),
            );
        }
        entries
    }

    /// A mock directory holding the fixture entries and the admin user.
    #[must_use]
    pub fn directory(&self) -> MockDirectory {
        let directory = MockDirectory::new().with_user(ADMIN_DN, ADMIN_PASSWORD);
        for entry in self.entries() {
            directory.insert(entry);
        }
        directory
    }
}

/// Install a `tracing` subscriber honouring `RUST_LOG`, once per process.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A TLS client configuration trusting no roots, for StartTLS plumbing tests.
#[must_use]
pub fn tls_config() -> Arc<rustls::ClientConfig> {
    // Other crates in the build may enable a second crypto backend.
    let _ = rustls::crypto::ring::default_provider().install_default();
    let config = rustls::ClientConfig::builder()
        .with_root_certificates(rustls::RootCertStore::empty())
        .with_no_client_auth();
    Arc::new(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_entries() {
        let fixture = TestFixture::default().with_user("alice").with_user("bob");
        let entries = fixture.entries();

        assert_eq!(entries.len(), 5);
        assert_eq!(entries[0].dn, BASE_DN);
        assert_eq!(entries[0].first_value("dc"), Some("example"));
        assert_eq!(entries[3].dn, "uid=alice,ou=people,dc=example,dc=com");
        assert_eq!(entries[4].first_value("mail"), Some("bob@example.com"));
    }

    #[test]
    fn test_fixture_directory() {
        let fixture = TestFixture::default().with_user("alice");
        let directory = fixture.directory();

        assert!(directory.entry(&fixture.user_dn("alice")).is_some());
        assert!(directory.entry("ou=groups,dc=example,dc=com").is_some());
        assert_eq!(directory.open_connections(), 0);
    }
}
