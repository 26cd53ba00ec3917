//! In-memory directory with call recording.
//!
//! MUST NEVER be used in production.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use ldap3::{LdapError, LdapResult};

use super::config::DirectoryConfig;
use super::connection::{ConnectError, Connector, DirectoryConnection};

const INVALID_CREDENTIALS: u32 = 49;

/// Operation observed by the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect,
    Bind(String),
    Search { base_dn: String, filter: String },
    Close,
}

#[derive(Debug, Clone)]
struct Entry {
    dn: String,
    uid: String,
    password: String,
}

#[derive(Debug, Default)]
struct State {
    service_dn: String,
    service_password: String,
    entries: Vec<Entry>,
    unreachable: bool,
    failing_search: bool,
    stalled_search: bool,
    calls: Vec<Call>,
}

#[derive(Debug, Clone, Default)]
pub struct MockDirectory {
    state: Arc<Mutex<State>>,
}

impl MockDirectory {
    pub fn new(service_dn: &str, service_password: &str) -> Self {
        let directory = Self::default();
        {
            let mut state = directory.state();
            state.service_dn = service_dn.into();
            state.service_password = service_password.into();
        }
        directory
    }

    /// Add an entry matched by `(uid=<uid>)` and bindable with `password`.
    pub fn with_entry(self, dn: &str, uid: &str, password: &str) -> Self {
        self.state().entries.push(Entry {
            dn: dn.into(),
            uid: uid.into(),
            password: password.into(),
        });
        self
    }

    /// Refuse every connection.
    pub fn unreachable(self) -> Self {
        self.state().unreachable = true;
        self
    }

    /// Fail every search at the transport level.
    pub fn failing_search(self) -> Self {
        self.state().failing_search = true;
        self
    }

    /// Never answer searches.
    pub fn stalled_search(self) -> Self {
        self.state().stalled_search = true;
        self
    }

    /// Open a connection without recording [`Call::Connect`].
    pub fn open(&self) -> Box<dyn DirectoryConnection> {
        Box::new(MockConnection {
            directory: self.clone(),
            closed: false,
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn binds(&self) -> usize {
        self.count(|call| matches!(call, Call::Bind(_)))
    }

    pub fn searches(&self) -> usize {
        self.count(|call| matches!(call, Call::Search { .. }))
    }

    pub fn closes(&self) -> usize {
        self.count(|call| matches!(call, Call::Close))
    }

    fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.state().calls.iter().filter(|call| predicate(call)).count()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn record(&self, call: Call) {
        self.state().calls.push(call);
    }
}

#[async_trait]
impl Connector for MockDirectory {
    async fn connect(
        &self,
        _config: &DirectoryConfig,
    ) -> Result<Box<dyn DirectoryConnection>, ConnectError> {
        self.record(Call::Connect);

        if self.state().unreachable {
            return Err(ConnectError::Ldap(LdapError::from(
                std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                ),
            )));
        }

        Ok(self.open())
    }
}

struct MockConnection {
    directory: MockDirectory,
    closed: bool,
}

fn invalid_credentials() -> LdapError {
    LdapError::LdapResult {
        result: LdapResult {
            rc: INVALID_CREDENTIALS,
            matched: String::new(),
            text: "invalid credentials".into(),
            refs: Vec::new(),
            ctrls: Vec::new(),
        },
    }
}

#[async_trait]
impl DirectoryConnection for MockConnection {
    async fn simple_bind(
        &mut self,
        dn: &str,
        password: &str,
    ) -> Result<(), LdapError> {
        self.directory.record(Call::Bind(dn.into()));

        let state = self.directory.state();
        let is_service =
            dn == state.service_dn && password == state.service_password;
        let is_entry = state
            .entries
            .iter()
            .any(|entry| entry.dn == dn && entry.password == password);

        if is_service || is_entry {
            Ok(())
        } else {
            Err(invalid_credentials())
        }
    }

    async fn search(
        &mut self,
        base_dn: &str,
        filter: &str,
    ) -> Result<Vec<String>, LdapError> {
        self.directory.record(Call::Search {
            base_dn: base_dn.into(),
            filter: filter.into(),
        });

        let (failing, stalled) = {
            let state = self.directory.state();
            (state.failing_search, state.stalled_search)
        };

        if stalled {
            std::future::pending::<()>().await;
        }
        if failing {
            return Err(LdapError::from(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )));
        }

        Ok(self
            .directory
            .state()
            .entries
            .iter()
            .filter(|entry| entry.dn.ends_with(base_dn))
            .filter(|entry| filter.contains(&format!("(uid={})", entry.uid)))
            .map(|entry| entry.dn.clone())
            .collect())
    }

    async fn unbind(&mut self) -> Result<(), LdapError> {
        self.closed = true;
        self.directory.record(Call::Close);
        Ok(())
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        if !self.closed {
            self.directory.record(Call::Close);
        }
    }
}
