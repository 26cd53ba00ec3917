//! LDAP authentication middleware.

use std::sync::Arc;

use async_trait::async_trait;

use super::config::{
    BASE_DN, BIND_DN, BIND_PASSWORD, Credential, DirectoryConfig,
    ESCAPE_FILTER, HOSTNAME, PORT, SEARCH_FILTER, TIMEOUT, USE_SSL,
    VERIFY_SSL,
};
use super::connection::Connector;
use crate::error::{Result, ServerError};
use crate::middleware::{
    AuthenticationMiddleware, FieldType, Form, FormElement, Params,
};

pub const NAME: &str = "ldap";
pub const LOGIN_PATH: &str = "/api/session/auth/";

const USER: &str = "user";
const PASSWORD: &str = "password";

/// Middleware checking logins with [`super::authenticate`].
#[derive(Clone)]
pub struct LdapBackend {
    connector: Arc<dyn Connector>,
}

impl LdapBackend {
    /// Create a new [`LdapBackend`] dialing through `connector`.
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self {
            connector: Arc::new(connector),
        }
    }
}

#[async_trait]
impl AuthenticationMiddleware for LdapBackend {
    fn setup(&self) -> Form {
        Form {
            elements: vec![
                FormElement::new("type", FieldType::Hidden).value(NAME),
                FormElement::new(HOSTNAME, FieldType::Text)
                    .placeholder("Hostname"),
                FormElement::new(PORT, FieldType::Text).placeholder("Port"),
                FormElement::new(USE_SSL, FieldType::Boolean)
                    .default(true)
                    .placeholder("Use SSL"),
                FormElement::new(VERIFY_SSL, FieldType::Boolean)
                    .default(true)
                    .placeholder("Verify SSL certificate"),
                FormElement::new(BIND_DN, FieldType::Text)
                    .placeholder("Bind DN"),
                FormElement::new(BIND_PASSWORD, FieldType::Password)
                    .placeholder("Bind password"),
                FormElement::new(BASE_DN, FieldType::Text)
                    .placeholder("Base DN"),
                FormElement::new(SEARCH_FILTER, FieldType::Text)
                    .placeholder("(&(objectClass=person)(uid=%s))"),
                FormElement::new(ESCAPE_FILTER, FieldType::Boolean)
                    .default(false)
                    .placeholder("Escape login name in search filter"),
                FormElement::new(TIMEOUT, FieldType::Number)
                    .placeholder("Connection timeout (seconds)"),
            ],
        }
    }

    fn entry_point(&self, _params: &Params, flash: Option<&str>) -> String {
        let flash = flash
            .map(|notice| {
                format!(r#"<p class="flash">{}</p>"#, escape_html(notice))
            })
            .unwrap_or_default();

        format!(
            r#"<!DOCTYPE html>
<html>
  <head><meta charset="utf-8"><title>Login</title></head>
  <body>
    <form action="{LOGIN_PATH}" method="post" class="component_middleware">
      <label>
        <input type="text" name="{USER}" value="" placeholder="User" />
      </label>
      <label>
        <input type="password" name="{PASSWORD}" value="" placeholder="Password" />
      </label>
      <button>CONNECT</button>
      {flash}
      <style>
        .flash {{ color: #f26d6d; font-weight: bold; }}
        form {{ padding-top: 10vh; }}
      </style>
    </form>
  </body>
</html>"#
        )
    }

    async fn callback(&self, form: &Params, params: &Params) -> Result<Params> {
        let config = DirectoryConfig::from_params(params);
        let credential = Credential::new(
            form.get(USER).cloned().unwrap_or_default(),
            form.get(PASSWORD).cloned().unwrap_or_default(),
        );

        // Stage details are already logged, the caller only learns a failure.
        super::authenticate(self.connector.as_ref(), &config, &credential)
            .await
            .map_err(|_| ServerError::AuthenticationFailed)?;

        Ok(Params::from([
            (USER.to_owned(), credential.login_name),
            (PASSWORD.to_owned(), credential.password),
        ]))
    }
}

/// Escape text placed inside HTML.
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}
