//! Typed directory parameters built from the host key/value map.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use super::filter::{FilterEscaping, FilterTemplate};

pub const HOSTNAME: &str = "hostname";
pub const PORT: &str = "port";
pub const USE_SSL: &str = "use_ssl";
pub const VERIFY_SSL: &str = "verify_ssl";
pub const BIND_DN: &str = "bind_dn";
pub const BIND_PASSWORD: &str = "bind_password";
pub const BASE_DN: &str = "base_dn";
pub const SEARCH_FILTER: &str = "search_filter";
pub const ESCAPE_FILTER: &str = "escape_filter";
pub const TIMEOUT: &str = "timeout";

/// Connection and lookup parameters for one verification attempt.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct DirectoryConfig {
    /// Directory server address.
    pub hostname: String,
    /// TCP port. `None` lets the scheme default apply.
    pub port: Option<String>,
    /// Negotiate TLS on connect.
    pub use_tls: bool,
    /// Validate the server certificate. Ignored without TLS.
    pub verify_tls: bool,
    /// Service account DN.
    pub bind_dn: String,
    /// Service account secret.
    pub bind_password: String,
    /// Search root.
    pub base_dn: String,
    pub search_filter: FilterTemplate,
    pub escaping: FilterEscaping,
    /// Connection establishment timeout.
    pub timeout: Option<Duration>,
}

impl DirectoryConfig {
    /// Build a [`DirectoryConfig`] from middleware parameters.
    ///
    /// `use_ssl` and `verify_ssl` stay enabled unless set to the literal
    /// string `"false"`. `escape_filter` is enabled only by `"true"`.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let get = |key: &str| params.get(key).cloned().unwrap_or_default();
        let is = |key: &str, value: &str| {
            params.get(key).is_some_and(|v| v == value)
        };

        let timeout = params.get(TIMEOUT).filter(|t| !t.is_empty()).and_then(
            |t| match t.parse::<u64>() {
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(err) => {
                    tracing::warn!(
                        value = %t,
                        error = %err,
                        "ignoring invalid ldap timeout"
                    );
                    None
                },
            },
        );

        Self {
            hostname: get(HOSTNAME),
            port: params.get(PORT).filter(|p| !p.is_empty()).cloned(),
            use_tls: !is(USE_SSL, "false"),
            verify_tls: !is(VERIFY_SSL, "false"),
            bind_dn: get(BIND_DN),
            bind_password: get(BIND_PASSWORD),
            base_dn: get(BASE_DN),
            search_filter: FilterTemplate::new(get(SEARCH_FILTER)),
            escaping: if is(ESCAPE_FILTER, "true") {
                FilterEscaping::Escaped
            } else {
                FilterEscaping::Verbatim
            },
            timeout,
        }
    }
}

impl fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("use_tls", &self.use_tls)
            .field("verify_tls", &self.verify_tls)
            .field("bind_dn", &self.bind_dn)
            .field("bind_password", &"[redacted]")
            .field("base_dn", &self.base_dn)
            .field("search_filter", &self.search_filter.as_str())
            .field("escaping", &self.escaping)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Submitted login, alive for a single verification call.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub login_name: String,
    pub password: String,
}

impl Credential {
    pub fn new(login_name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login_name: login_name.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("login_name", &self.login_name)
            .field("password", &"[redacted]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = DirectoryConfig::from_params(&HashMap::new());

        assert!(config.use_tls);
        assert!(config.verify_tls);
        assert_eq!(config.port, None);
        assert_eq!(config.escaping, FilterEscaping::Verbatim);
        assert_eq!(config.timeout, None);
        assert_eq!(config.search_filter.as_str(), "");
    }

    #[test]
    fn test_only_literal_false_disables_tls() {
        for value in ["", "no", "0", "False", "FALSE", "off", "true"] {
            let config = DirectoryConfig::from_params(&params(&[
                (USE_SSL, value),
                (VERIFY_SSL, value),
            ]));
            assert!(config.use_tls, "use_ssl={value:?}");
            assert!(config.verify_tls, "verify_ssl={value:?}");
        }

        let config = DirectoryConfig::from_params(&params(&[
            (USE_SSL, "false"),
            (VERIFY_SSL, "false"),
        ]));
        assert!(!config.use_tls);
        assert!(!config.verify_tls);
    }

    #[test]
    fn test_from_params() {
        let config = DirectoryConfig::from_params(&params(&[
            (HOSTNAME, "ldap.gravitalia.com"),
            (PORT, "636"),
            (BIND_DN, "cn=svc,dc=gravitalia,dc=com"),
            (BIND_PASSWORD, "p"),
            (BASE_DN, "dc=gravitalia,dc=com"),
            (SEARCH_FILTER, "(uid=%s)"),
            (ESCAPE_FILTER, "true"),
            (TIMEOUT, "5"),
        ]));

        assert_eq!(config.hostname, "ldap.gravitalia.com");
        assert_eq!(config.port.as_deref(), Some("636"));
        assert_eq!(config.bind_dn, "cn=svc,dc=gravitalia,dc=com");
        assert_eq!(config.base_dn, "dc=gravitalia,dc=com");
        assert_eq!(config.search_filter, FilterTemplate::new("(uid=%s)"));
        assert_eq!(config.escaping, FilterEscaping::Escaped);
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));

        let config = DirectoryConfig::from_params(&params(&[
            (PORT, ""),
            (TIMEOUT, "soon"),
        ]));
        assert_eq!(config.port, None);
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_secrets_are_not_debugged() {
        let config = DirectoryConfig::from_params(&params(&[(
            BIND_PASSWORD,
            "hunter2",
        )]));
        assert!(!format!("{config:?}").contains("hunter2"));

        let credential = Credential::new("alice", "secret");
        let debug = format!("{credential:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("secret"));
    }
}
