//! Search filter templates.
//!
//! A template holds exactly one `%s` placeholder replaced by the login name.
//! `%%` stands for a literal `%`.

use std::borrow::Cow;

use ldap3::ldap_escape;
use thiserror::Error;

const PLACEHOLDER: char = 's';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error(
        "search filter must hold exactly one `%s` placeholder, found {0}"
    )]
    Placeholders(usize),
}

/// How the login name is embedded into the filter.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FilterEscaping {
    /// Login name is inserted as received. Filter metacharacters in it
    /// change the meaning of the filter.
    #[default]
    Verbatim,
    /// Login name is escaped following RFC 4515.
    Escaped,
}

/// Search filter containing a single login name placeholder.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FilterTemplate(String);

impl FilterTemplate {
    /// Create a new [`FilterTemplate`].
    ///
    /// Template is checked on [`FilterTemplate::render`], so a malformed
    /// configuration surfaces as a failed search and not at load time.
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitute `login_name` into the template.
    pub fn render(
        &self,
        login_name: &str,
        escaping: FilterEscaping,
    ) -> Result<String, FilterError> {
        let value: Cow<'_, str> = match escaping {
            FilterEscaping::Verbatim => Cow::Borrowed(login_name),
            FilterEscaping::Escaped => ldap_escape(login_name),
        };

        let mut filter = String::with_capacity(self.0.len() + value.len());
        let mut placeholders = 0;
        let mut chars = self.0.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                filter.push(c);
                continue;
            }

            match chars.peek() {
                Some('%') => {
                    chars.next();
                    filter.push('%');
                },
                Some(&PLACEHOLDER) => {
                    chars.next();
                    placeholders += 1;
                    filter.push_str(&value);
                },
                _ => filter.push('%'),
            }
        }

        if placeholders != 1 {
            return Err(FilterError::Placeholders(placeholders));
        }

        Ok(filter)
    }
}

impl From<&str> for FilterTemplate {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}
