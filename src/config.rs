//! Configuration manager for autha-ldap.

use std::fs::File;
use std::net::{AddrParseError, SocketAddr};
use std::path::{Path, PathBuf};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::middleware::Params;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const DEFAULT_ADDRESS: &str = "0.0.0.0:8888";
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Instance name.
    pub name: String,
    /// Listening socket address.
    pub address: String,
    /// Authentication middleware used for logins.
    pub middleware: String,
    /// Parameters handed to the middleware on every login.
    #[serde(skip_serializing, deserialize_with = "scalars")]
    pub params: Params,
    #[serde(skip_deserializing)]
    version: String,
    #[serde(skip)]
    path: PathBuf,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: env!("CARGO_CRATE_NAME").to_owned(),
            address: DEFAULT_ADDRESS.to_owned(),
            middleware: crate::ldap::backend::NAME.to_owned(),
            params: Params::default(),
            version: VERSION.to_owned(),
            path: PathBuf::default(),
        }
    }
}

impl Configuration {
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Parsed [`Configuration::address`].
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        self.address.parse()
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location.
    pub fn read(self) -> Self {
        let file_path = if self.path.is_file() {
            self.path.clone()
        } else {
            Path::new(DEFAULT_CONFIG_PATH).to_path_buf()
        };

        match File::open(&file_path) {
            Ok(file) => match serde_yaml::from_reader::<_, Self>(file) {
                Ok(mut config) => {
                    // set app version.
                    config.version = VERSION.to_owned();
                    config.path = file_path;
                    config
                },
                Err(err) => Self::error(file_path, err),
            },
            Err(err) => Self::error(file_path, err),
        }
    }

    /// Return a default configuration as fallback.
    fn error(file_path: PathBuf, err: impl std::error::Error) -> Self {
        tracing::error!(
            error = %err,
            path = %file_path.display(),
            "cannot read configuration file, using defaults"
        );
        Self {
            path: file_path,
            ..Default::default()
        }
    }
}

/// Accept any YAML scalar as parameter value, so `use_ssl: false` and
/// `use_ssl: "false"` mean the same.
fn scalars<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Params, D::Error> {
    let raw =
        std::collections::HashMap::<String, serde_yaml::Value>::deserialize(
            deserializer,
        )?;

    raw.into_iter()
        .map(|(key, value)| {
            let value = match value {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Bool(b) => b.to_string(),
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::Null => String::new(),
                _ => {
                    return Err(D::Error::custom(format!(
                        "parameter `{key}` must be a scalar"
                    )));
                },
            };
            Ok((key, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let config: Configuration = serde_yaml::from_str(
            r#"
name: directory
address: 127.0.0.1:9000
params:
  hostname: ldap.gravitalia.com
  use_ssl: "false"
  search_filter: (uid=%s)
"#,
        )
        .unwrap();

        assert_eq!(config.name, "directory");
        assert_eq!(config.middleware, "ldap");
        assert_eq!(
            config.socket_addr().unwrap(),
            "127.0.0.1:9000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            config.params.get("use_ssl").map(String::as_str),
            Some("false")
        );
        assert_eq!(
            config.params.get("search_filter").map(String::as_str),
            Some("(uid=%s)")
        );
    }

    #[test]
    fn test_untyped_scalars() {
        let config: Configuration = serde_yaml::from_str(
            r#"
params:
  use_ssl: false
  port: 636
  bind_password:
"#,
        )
        .unwrap();

        assert_eq!(config.params["use_ssl"], "false");
        assert_eq!(config.params["port"], "636");
        assert_eq!(config.params["bind_password"], "");

        let err = serde_yaml::from_str::<Configuration>(
            "params:\n  hostname: [a, b]\n",
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = Configuration::default()
            .path(PathBuf::from("/nonexistent/autha-ldap.yaml"))
            .read();

        assert_eq!(config.address, DEFAULT_ADDRESS);
        assert_eq!(config.version(), VERSION);
        assert!(config.params.is_empty());
        // The file actually tried is reported, not the missing one.
        assert_eq!(config.path, PathBuf::from(DEFAULT_CONFIG_PATH));
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let file_path = std::env::temp_dir()
            .join(format!("autha-ldap-{}.yaml", std::process::id()));
        std::fs::write(&file_path, "params: [not, a, map]\n").unwrap();

        let config = Configuration::default().path(file_path.clone()).read();
        std::fs::remove_file(&file_path).unwrap();

        assert_eq!(config.address, DEFAULT_ADDRESS);
        assert!(config.params.is_empty());
        assert_eq!(config.path, file_path);
    }

    #[test]
    fn test_secrets_not_serialized() {
        let mut config = Configuration::default();
        config
            .params
            .insert("bind_password".into(), "hunter2".into());

        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("hunter2"));
    }
}
