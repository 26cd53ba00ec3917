//! Transport to the directory server.

use std::net::Ipv6Addr;

use async_trait::async_trait;
use ldap3::{
    DerefAliases, Ldap, LdapConnAsync, LdapConnSettings, LdapError,
    ResultEntry, Scope, SearchEntry, SearchOptions,
};
use thiserror::Error;
use url::Url;

use super::config::DirectoryConfig;

/// Attribute list asking the server for no attribute at all (RFC 4511).
const NO_ATTRIBUTES: &str = "1.1";

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("missing directory hostname")]
    MissingHostname,

    #[error("invalid directory address: {0}")]
    Address(#[from] url::ParseError),

    #[error(transparent)]
    Ldap(#[from] LdapError),
}

/// Trust policy applied when dialing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportSecurity {
    Plain,
    /// `verify: false` accepts any certificate, self-signed or issued for
    /// another host.
    Tls { verify: bool },
}

impl TransportSecurity {
    pub fn from_config(config: &DirectoryConfig) -> Self {
        if config.use_tls {
            TransportSecurity::Tls {
                verify: config.verify_tls,
            }
        } else {
            TransportSecurity::Plain
        }
    }

    fn scheme(&self) -> &'static str {
        match self {
            TransportSecurity::Plain => "ldap",
            TransportSecurity::Tls { .. } => "ldaps",
        }
    }

    /// Whether server certificates go unchecked.
    pub fn accepts_any_certificate(&self) -> bool {
        matches!(self, TransportSecurity::Tls { verify: false })
    }

    /// Settings handed to `ldap3`.
    fn settings(&self) -> LdapConnSettings {
        LdapConnSettings::new()
            .set_no_tls_verify(self.accepts_any_certificate())
    }
}

/// Build the LDAP URL to dial: `hostname`, or `hostname:port` when a port
/// is configured. A hostname may already carry its port (`host:636`).
pub fn dial_url(config: &DirectoryConfig) -> Result<Url, ConnectError> {
    let hostname = config.hostname.trim();
    if hostname.is_empty() {
        return Err(ConnectError::MissingHostname);
    }

    // IPv6 literals must be bracketed inside an URL.
    let host = if hostname.parse::<Ipv6Addr>().is_ok() {
        format!("[{hostname}]")
    } else {
        hostname.to_owned()
    };

    let address = match &config.port {
        Some(port) => format!("{host}:{port}"),
        None => host,
    };
    let scheme = TransportSecurity::from_config(config).scheme();

    Ok(Url::parse(&format!("{scheme}://{address}"))?)
}

/// Opens connections to a directory server.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open one connection. Ownership goes to the caller, who must close it.
    async fn connect(
        &self,
        config: &DirectoryConfig,
    ) -> Result<Box<dyn DirectoryConnection>, ConnectError>;
}

/// Operations issued on one open directory connection.
///
/// Dropping a connection closes it. [`DirectoryConnection::unbind`] closes
/// it gracefully; a connection closed this way is not closed again on drop.
#[async_trait]
pub trait DirectoryConnection: Send {
    /// Simple bind. A non-success result code is an error.
    async fn simple_bind(
        &mut self,
        dn: &str,
        password: &str,
    ) -> Result<(), LdapError>;

    /// Subtree search from `base_dn` never dereferencing aliases, with no
    /// client side limit. Returns matched entry DNs.
    async fn search(
        &mut self,
        base_dn: &str,
        filter: &str,
    ) -> Result<Vec<String>, LdapError>;

    /// Send an unbind request and close the connection.
    async fn unbind(&mut self) -> Result<(), LdapError>;
}

/// [`Connector`] backed by `ldap3`.
#[derive(Debug, Default, Clone)]
pub struct Ldap3Connector;

impl Ldap3Connector {
    /// Create a new [`Ldap3Connector`].
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for Ldap3Connector {
    async fn connect(
        &self,
        config: &DirectoryConfig,
    ) -> Result<Box<dyn DirectoryConnection>, ConnectError> {
        let url = dial_url(config)?;
        let mut settings = TransportSecurity::from_config(config).settings();
        if let Some(timeout) = config.timeout {
            settings = settings.set_conn_timeout(timeout);
        }

        let (conn, ldap) =
            LdapConnAsync::with_settings(settings, url.as_str()).await?;

        // Driver owns the socket and stops once every `Ldap` handle is gone.
        tokio::spawn(async move {
            if let Err(err) = conn.drive().await {
                tracing::warn!(error = %err, "ldap connection driver stopped");
            }
        });

        tracing::debug!(url = %url, "ldap connection established");

        Ok(Box::new(Ldap3Connection { ldap }))
    }
}

struct Ldap3Connection {
    ldap: Ldap,
}

#[async_trait]
impl DirectoryConnection for Ldap3Connection {
    async fn simple_bind(
        &mut self,
        dn: &str,
        password: &str,
    ) -> Result<(), LdapError> {
        self.ldap.simple_bind(dn, password).await?.success()?;
        Ok(())
    }

    async fn search(
        &mut self,
        base_dn: &str,
        filter: &str,
    ) -> Result<Vec<String>, LdapError> {
        let (entries, _) = self
            .ldap
            .with_search_options(
                SearchOptions::new()
                    .deref(DerefAliases::Never)
                    .sizelimit(0)
                    .timelimit(0),
            )
            .search(base_dn, Scope::Subtree, filter, vec![NO_ATTRIBUTES])
            .await?
            .success()?;

        Ok(entry_dns(entries))
    }

    async fn unbind(&mut self) -> Result<(), LdapError> {
        self.ldap.unbind().await
    }
}

/// DNs of the entries returned by a search.
///
/// Referrals and intermediate responses are not entries and never count as
/// a match.
fn entry_dns(entries: Vec<ResultEntry>) -> Vec<String> {
    let (entries, skipped): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .partition(|entry| !entry.is_ref() && !entry.is_intermediate());

    if !skipped.is_empty() {
        tracing::debug!(count = skipped.len(), "ignoring search references");
    }

    entries
        .into_iter()
        .map(|entry| SearchEntry::construct(entry).dn)
        .collect()
}
