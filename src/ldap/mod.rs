//! LDAP search-then-bind verification.
//!
//! One attempt runs, on a single connection:
//! 1. a simple bind as the service account,
//! 2. a subtree search resolving the login name to exactly one DN,
//! 3. a simple bind as that DN with the submitted password.
//!
//! Any failing stage ends the attempt. The connection is closed before
//! [`authenticate`] returns, whatever the outcome.

pub mod backend;
pub mod bind;
pub mod config;
pub mod connection;
pub mod error;
pub mod filter;
pub mod search;
#[cfg(test)]
pub mod testing;

pub use backend::LdapBackend;
pub use config::{Credential, DirectoryConfig};
pub use connection::{Connector, DirectoryConnection, Ldap3Connector};
pub use error::{AuthError, Reason, Result};

/// Identity proven by a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedUser {
    /// Login name as submitted.
    pub login_name: String,
    /// Directory entry the password was checked against.
    pub dn: String,
}

/// Verify `credential` against the directory described by `config`.
///
/// Failures are logged with their stage and login name, never the password.
pub async fn authenticate(
    connector: &dyn Connector,
    config: &DirectoryConfig,
    credential: &Credential,
) -> Result<VerifiedUser> {
    let result = connect_and_verify(connector, config, credential).await;

    match &result {
        Ok(user) => {
            tracing::info!(
                login = %credential.login_name,
                dn = %user.dn,
                "ldap authentication successful"
            );
            metrics::counter!(
                "ldap_authentications_total",
                "outcome" => "success",
                "reason" => "none"
            )
            .increment(1);
        },
        Err(err) => {
            tracing::warn!(
                login = %credential.login_name,
                reason = %err.reason(),
                error = %err,
                "ldap authentication failed"
            );
            metrics::counter!(
                "ldap_authentications_total",
                "outcome" => "failure",
                "reason" => err.reason().as_str()
            )
            .increment(1);
        },
    }

    result
}

async fn connect_and_verify(
    connector: &dyn Connector,
    config: &DirectoryConfig,
    credential: &Credential,
) -> Result<VerifiedUser> {
    let mut conn = connector
        .connect(config)
        .await
        .map_err(|err| AuthError::Connection(err.into()))?;

    // If this future is dropped mid-flight, dropping `conn` closes it.
    let outcome = verify_on(conn.as_mut(), config, credential).await;

    if let Err(err) = conn.unbind().await {
        tracing::debug!(error = %err, "ldap unbind failed");
    }

    outcome
}

async fn verify_on(
    conn: &mut dyn DirectoryConnection,
    config: &DirectoryConfig,
    credential: &Credential,
) -> Result<VerifiedUser> {
    bind::bind_service(conn, &config.bind_dn, &config.bind_password).await?;

    let dn = search::resolve(
        conn,
        &config.base_dn,
        &config.search_filter,
        config.escaping,
        &credential.login_name,
    )
    .await?;

    bind::verify(conn, &dn, &credential.password).await?;

    Ok(VerifiedUser {
        login_name: credential.login_name.clone(),
        dn,
    })
}
