//! Resolve a login name to the DN of its directory entry.

use super::connection::DirectoryConnection;
use super::error::{AuthError, Result};
use super::filter::{FilterEscaping, FilterTemplate};

/// Search `base_dn` for the entry matching `login_name`.
///
/// Zero or several matches are both refused: an ambiguous identity is an
/// authentication failure. The returned DN, not the login name, is what the
/// verification bind uses.
pub async fn resolve(
    conn: &mut dyn DirectoryConnection,
    base_dn: &str,
    template: &FilterTemplate,
    escaping: FilterEscaping,
    login_name: &str,
) -> Result<String> {
    let filter = template
        .render(login_name, escaping)
        .map_err(|err| AuthError::Search(err.into()))?;

    let entries = conn
        .search(base_dn, &filter)
        .await
        .map_err(|err| AuthError::Search(err.into()))?;

    match <[String; 1]>::try_from(entries) {
        Ok([dn]) => Ok(dn),
        Err(entries) => Err(AuthError::NoUniqueMatch {
            count: entries.len(),
        }),
    }
}
