//! OpenLDAP container support via testcontainers.

use testcontainers::Image;
use testcontainers::core::{ContainerPort, WaitFor};

/// Port the container's LDAP listener is bound to.
pub const LDAP_PORT: u16 = 1389;

/// OpenLDAP container image.
///
/// Uses the Bitnami OpenLDAP image, which seeds `ou=users` under the root DN
/// and an administrator `cn=<admin_username>,<root_dn>`.
#[derive(Debug, Clone)]
pub struct OpenLdapContainer {
    /// Root DN of the directory tree.
    pub root_dn: String,
    /// Administrator user name.
    pub admin_username: String,
    /// Administrator password.
    pub admin_password: String,
    /// Container tag (version).
    pub tag: String,
}

impl Default for OpenLdapContainer {
    fn default() -> Self {
        Self {
            root_dn: "dc=example,dc=org".to_string(),
            admin_username: "admin".to_string(),
            admin_password: "adminpassword".to_string(),
            tag: "2.6".to_string(),
        }
    }
}

impl OpenLdapContainer {
    /// Create a new OpenLDAP container configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the root DN.
    #[must_use]
    pub fn with_root_dn(mut self, root_dn: impl Into<String>) -> Self {
        self.root_dn = root_dn.into();
        self
    }

    /// Set the administrator password.
    #[must_use]
    pub fn with_admin_password(mut self, password: impl Into<String>) -> Self {
        self.admin_password = password.into();
        self
    }

    /// Set the container tag (OpenLDAP version).
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// DN of the administrator.
    #[must_use]
    pub fn admin_dn(&self) -> String {
        format!("cn={},{}", self.admin_username, self.root_dn)
    }

    /// `ldap://` URL for a mapped host port.
    #[must_use]
    pub fn url(host: &str, port: u16) -> String {
        format!("ldap://{host}:{port}")
    }
}

impl Image for OpenLdapContainer {
    fn name(&self) -> &str {
        "bitnami/openldap"
    }

    fn tag(&self) -> &str {
        &self.tag
    }

    fn ready_conditions(&self) -> Vec<WaitFor> {
        vec![WaitFor::message_on_stderr("slapd starting")]
    }

    fn env_vars(
        &self,
    ) -> impl IntoIterator<
        Item = (
            impl Into<std::borrow::Cow<'_, str>>,
            impl Into<std::borrow::Cow<'_, str>>,
        ),
    > {
        vec![
            ("LDAP_ROOT", self.root_dn.as_str()),
            ("LDAP_ADMIN_USERNAME", self.admin_username.as_str()),
            ("LDAP_ADMIN_PASSWORD", self.admin_password.as_str()),
            ("LDAP_SKIP_DEFAULT_TREE", "no"),
        ]
    }

    fn expose_ports(&self) -> &[ContainerPort] {
        &[ContainerPort::Tcp(LDAP_PORT)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_defaults() {
        let container = OpenLdapContainer::new()
            .with_root_dn("dc=corp,dc=test")
            .with_tag("2.6.8");

        assert_eq!(container.admin_dn(), "cn=admin,dc=corp,dc=test");
        assert_eq!(container.tag(), "2.6.8");
        assert_eq!(OpenLdapContainer::url("127.0.0.1", 49153), "ldap://127.0.0.1:49153");
    }
}
