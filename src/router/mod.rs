//! HTTP routes exposing the authentication middlewares.

pub mod login;
pub mod middleware;
pub mod status;

/// Application state backed by an in-memory directory.
///
/// MUST NEVER be used in production.
#[cfg(test)]
pub fn state() -> crate::AppState {
    use std::sync::Arc;

    use crate::config::Configuration;
    use crate::ldap::LdapBackend;
    use crate::ldap::testing::MockDirectory;
    use crate::middleware::Registry;

    let directory = MockDirectory::new("cn=svc", "p")
        .with_entry("uid=alice,dc=x", "alice", "secret");

    let mut config = Configuration::default();
    config.params = [
        ("hostname", "ldap.gravitalia.com"),
        ("use_ssl", "false"),
        ("bind_dn", "cn=svc"),
        ("bind_password", "p"),
        ("base_dn", "dc=x"),
        ("search_filter", "(uid=%s)"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v.to_owned()))
    .collect();

    crate::AppState {
        config: Arc::new(config),
        registry: Registry::builder()
            .register(crate::ldap::backend::NAME, LdapBackend::new(directory))
            .build(),
        metrics: None,
    }
}
