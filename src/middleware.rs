//! Authentication middlewares offered to the host.
//!
//! A middleware exposes three capabilities: its configuration form
//! ([`AuthenticationMiddleware::setup`]), its login page
//! ([`AuthenticationMiddleware::entry_point`]) and the check of a submitted
//! login ([`AuthenticationMiddleware::callback`]). Middlewares are
//! registered once at start-up into a [`Registry`] that never changes after.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

/// Key/value map, used both for middleware parameters and form data.
pub type Params = HashMap<String, String>;

/// Kind of input rendered for a [`FormElement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Hidden,
    Text,
    Number,
    Boolean,
    Password,
}

/// One configurable field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormElement {
    pub name: &'static str,
    pub r#type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
}

impl FormElement {
    pub fn new(name: &'static str, r#type: FieldType) -> Self {
        Self {
            name,
            r#type,
            value: None,
            default: None,
            placeholder: None,
        }
    }

    pub fn value(mut self, value: &'static str) -> Self {
        self.value = Some(value);
        self
    }

    pub fn default(mut self, default: impl Into<serde_json::Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }
}

/// Configuration form of a middleware.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Form {
    pub elements: Vec<FormElement>,
}

#[async_trait]
pub trait AuthenticationMiddleware: Send + Sync {
    /// Fields the operator fills to configure the middleware.
    fn setup(&self) -> Form;

    /// HTML login page, with an optional one-shot notice.
    fn entry_point(&self, params: &Params, flash: Option<&str>) -> String;

    /// Check submitted `form` data with the operator `params`.
    ///
    /// Returns the identity handed back to the host. Every failure is the
    /// same [`crate::error::ServerError::AuthenticationFailed`].
    async fn callback(&self, form: &Params, params: &Params) -> Result<Params>;
}

/// Middlewares available to the host, keyed by name.
#[derive(Clone, Default)]
pub struct Registry {
    middlewares: Arc<HashMap<&'static str, Arc<dyn AuthenticationMiddleware>>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn AuthenticationMiddleware>> {
        self.middlewares.get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.middlewares.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

/// Collects middlewares before the [`Registry`] is frozen.
#[derive(Default)]
pub struct RegistryBuilder {
    middlewares: HashMap<&'static str, Arc<dyn AuthenticationMiddleware>>,
}

impl RegistryBuilder {
    /// Register `middleware` under `name`, replacing any previous one.
    pub fn register(
        mut self,
        name: &'static str,
        middleware: impl AuthenticationMiddleware + 'static,
    ) -> Self {
        if self
            .middlewares
            .insert(name, Arc::new(middleware))
            .is_some()
        {
            tracing::warn!(name, "authentication middleware registered twice");
        }
        self
    }

    pub fn build(self) -> Registry {
        Registry {
            middlewares: Arc::new(self.middlewares),
        }
    }
}
