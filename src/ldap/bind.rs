//! Simple binds: service account first, then the user being verified.

use super::connection::DirectoryConnection;
use super::error::{AuthError, EmptyPassword, Result};

/// Authenticate the connection as the service account.
///
/// Empty credentials are sent as-is and give an anonymous bind.
pub async fn bind_service(
    conn: &mut dyn DirectoryConnection,
    bind_dn: &str,
    bind_password: &str,
) -> Result<()> {
    conn.simple_bind(bind_dn, bind_password)
        .await
        .map_err(|err| AuthError::ServiceBind(err.into()))
}

/// Re-bind the same connection as `user_dn`. Success is the only proof that
/// `password` is valid.
pub async fn verify(
    conn: &mut dyn DirectoryConnection,
    user_dn: &str,
    password: &str,
) -> Result<()> {
    if password.is_empty() {
        return Err(AuthError::UserBind(EmptyPassword.into()));
    }

    conn.simple_bind(user_dn, password)
        .await
        .map_err(|err| AuthError::UserBind(err.into()))
}
