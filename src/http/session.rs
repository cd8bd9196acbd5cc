//! Session access through the host.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::blob::{Blob, Key, Store};
use crate::host::SharedHost;

/// Errors produced while interpreting a session directive.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session directive must be a boolean or a string, {found} given")]
    TypeMismatch { found: &'static str },
}

/// Whether, and under which name, a request engages the host's session.
///
/// In configuration files the directive is written as `false`, `true`, or a
/// session name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum SessionDirective {
    /// Never touch the host's session.
    Disabled,
    /// Engage the session under the host's default name.
    #[default]
    Default,
    /// Engage the session under the given name.
    Named(String),
}

impl From<bool> for SessionDirective {
    fn from(engage: bool) -> Self {
        if engage { Self::Default } else { Self::Disabled }
    }
}

impl From<&str> for SessionDirective {
    fn from(name: &str) -> Self {
        Self::Named(name.to_owned())
    }
}

impl From<String> for SessionDirective {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl TryFrom<Value> for SessionDirective {
    type Error = SessionError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Bool(engage) => Ok(engage.into()),
            Value::String(name) => Ok(name.into()),
            other => Err(SessionError::TypeMismatch {
                found: value_kind(&other),
            }),
        }
    }
}

impl From<SessionDirective> for Value {
    fn from(directive: SessionDirective) -> Self {
        match directive {
            SessionDirective::Disabled => Value::Bool(false),
            SessionDirective::Default => Value::Bool(true),
            SessionDirective::Named(name) => Value::String(name),
        }
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Session facade over the host.
///
/// Engaged stores proxy every read and write straight to the host's session
/// data. A store built from [`SessionDirective::Disabled`] is inert: reads see
/// nothing and writes are dropped, whatever the host holds.
pub struct SessionStore {
    host: SharedHost,
    engaged: bool,
}

impl SessionStore {
    /// Creates a session store, starting the host session if the directive asks
    /// for one and none is active yet.
    pub fn new(host: SharedHost, directive: &SessionDirective) -> Self {
        let engaged = match directive {
            SessionDirective::Disabled => false,
            SessionDirective::Default => {
                start(&host, None);
                true
            }
            SessionDirective::Named(name) => {
                start(&host, Some(name.as_str()));
                true
            }
        };

        Self { host, engaged }
    }

    /// Returns `true` if this store is bound to the host session.
    pub fn is_active(&self) -> bool {
        self.engaged
    }

    /// Returns a copy of the session data; empty when disabled.
    pub fn all(&self) -> Blob {
        if !self.engaged {
            return Blob::new();
        }
        self.host.session_all()
    }

    /// Returns the session value for `key`, or `None` when absent or disabled.
    pub fn get(&self, key: impl Into<Key>) -> Option<Value> {
        if !self.engaged {
            return None;
        }
        self.host.session_get(&key.into())
    }

    /// Returns the session value for `key`, or `default`.
    pub fn get_or(&self, key: impl Into<Key>, default: impl Into<Value>) -> Value {
        self.get(key).unwrap_or_else(|| default.into())
    }

    /// Returns `true` if the session holds `key`.
    pub fn has(&self, key: impl Into<Key>) -> bool {
        self.get(key).is_some()
    }

    /// Stores `value` under `key` in the host session.
    pub fn set(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> &mut Self {
        if self.engaged {
            self.host.session_set(key.into(), value.into());
        }
        self
    }

    /// Removes `key` from the host session.
    pub fn delete(&mut self, key: impl Into<Key>) -> &mut Self {
        if self.engaged {
            self.host.session_delete(&key.into());
        }
        self
    }
}

fn start(host: &SharedHost, name: Option<&str>) {
    if host.session_active() {
        debug!("session already active, reusing it");
        return;
    }
    debug!(name = name.unwrap_or("<default>"), "starting session");
    host.start_session(name);
}

impl Store for SessionStore {
    fn all(&self) -> Blob {
        SessionStore::all(self)
    }

    fn get(&self, key: &Key) -> Option<Value> {
        SessionStore::get(self, key.clone())
    }

    fn has(&self, key: &Key) -> bool {
        SessionStore::has(self, key.clone())
    }

    fn set(&mut self, key: Key, value: Value) {
        SessionStore::set(self, key, value);
    }

    fn delete(&mut self, key: &Key) {
        SessionStore::delete(self, key.clone());
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("engaged", &self.engaged)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use serde_json::json;

    use super::*;
    use crate::host::{Host, MemoryHost};

    #[test]
    fn directive_from_value() {
        assert_eq!(
            SessionDirective::try_from(json!(true)),
            Ok(SessionDirective::Default)
        );
        assert_eq!(
            SessionDirective::try_from(json!(false)),
            Ok(SessionDirective::Disabled)
        );
        assert_eq!(
            SessionDirective::try_from(json!("cart")),
            Ok(SessionDirective::Named("cart".to_owned()))
        );
    }

    #[test]
    fn directive_rejects_other_types() {
        assert_eq!(
            SessionDirective::try_from(json!(1)),
            Err(SessionError::TypeMismatch { found: "number" })
        );
        assert_eq!(
            SessionDirective::try_from(json!(["a"])),
            Err(SessionError::TypeMismatch { found: "array" })
        );
        assert_eq!(
            SessionDirective::try_from(json!(null)),
            Err(SessionError::TypeMismatch { found: "null" })
        );
    }

    #[test]
    fn directive_deserializes_from_json() {
        let directive: SessionDirective = serde_json::from_str("\"shop\"").unwrap();
        assert_eq!(directive, SessionDirective::Named("shop".to_owned()));
        assert!(serde_json::from_str::<SessionDirective>("3").is_err());
    }

    #[test]
    fn default_session_starts_once() {
        let host = Rc::new(MemoryHost::new());
        let _one = SessionStore::new(host.clone(), &SessionDirective::Default);
        let _two = SessionStore::new(host.clone(), &SessionDirective::Default);
        assert!(host.session_active());
        assert_eq!(host.session_starts(), 1);
    }

    #[test]
    fn already_active_session_is_not_restarted() {
        let host = Rc::new(MemoryHost::new().with_session(Blob::new()));
        let store = SessionStore::new(host.clone(), &SessionDirective::Default);
        assert!(store.is_active());
        assert_eq!(host.session_starts(), 0);
    }

    #[test]
    fn named_session_passes_name() {
        let host = Rc::new(MemoryHost::new());
        let session = SessionStore::new(host.clone(), &"my_session".into());
        assert_eq!(host.session_name().as_deref(), Some("my_session"));
        assert!(session.all().is_empty());
    }

    #[test]
    fn set_get_delete_proxy_to_host() {
        let host = Rc::new(MemoryHost::new());
        let mut session = SessionStore::new(host.clone(), &SessionDirective::Default);

        assert_eq!(session.get("key"), None);
        assert!(!session.has("key"));

        session.set("key", "value");
        assert_eq!(session.get("key"), Some(json!("value")));
        assert!(session.has("key"));
        assert_eq!(host.session_get(&Key::from("key")), Some(json!("value")));

        session.delete("key");
        assert_eq!(session.get("key"), None);
        assert_eq!(session.get_or("key", "fallback"), json!("fallback"));
    }

    #[test]
    fn disabled_session_is_inert_even_with_host_data() {
        let mut data = Blob::new();
        data.set("user", 1);
        let host = Rc::new(MemoryHost::new().with_session(data));
        let mut session = SessionStore::new(host.clone(), &SessionDirective::Disabled);

        assert!(!session.is_active());
        assert!(session.all().is_empty());
        assert_eq!(session.get("user"), None);
        assert!(!session.has("user"));

        session.set("other", 2).delete("user");
        assert_eq!(host.session_get(&Key::from("user")), Some(json!(1)));
        assert_eq!(host.session_get(&Key::from("other")), None);
    }

    #[test]
    fn disabled_session_never_starts() {
        let host = Rc::new(MemoryHost::new());
        let _session = SessionStore::new(host.clone(), &false.into());
        assert!(!host.session_active());
    }
}
