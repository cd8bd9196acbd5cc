//! Cookie access through the host.
//!
//! Reads always reflect the cookies the client sent with the current
//! request. Writes become [`SetCookie`] instructions for the host and only
//! show up in reads on the client's next request.

use std::fmt;
use std::time::{Duration, SystemTime};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;
use thiserror::Error;
use tracing::{trace, warn};

use super::blob::{Blob, Key, Store, scalar_to_string};
use crate::config::Config;
use crate::host::SharedHost;

// Everything except ASCII alphanumerics and `-_.` is escaped in cookie values.
const COOKIE_VALUE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

const FORBIDDEN_IN_NAME: &[char] = &['=', ',', ';', ' ', '\t', '\r', '\n', '\x0b', '\x0c'];

/// Errors produced while writing cookies.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CookieError {
    #[error("cookie name {name:?} is empty or contains one of `=,; \\t\\r\\n\\x0b\\x0c`")]
    InvalidName { name: String },
}

fn check_name(name: &str) -> Result<(), CookieError> {
    if name.is_empty() || name.contains(FORBIDDEN_IN_NAME) {
        return Err(CookieError::InvalidName {
            name: name.to_owned(),
        });
    }
    Ok(())
}

/// An instruction for the host to set (or expire) a cookie on the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub expires: SystemTime,
}

impl SetCookie {
    /// A cookie that expires `lifetime` from now.
    pub fn new(name: impl Into<String>, value: impl Into<String>, lifetime: Duration) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires: SystemTime::now() + lifetime,
        }
    }

    /// An empty cookie that expired one second ago, which makes clients drop it.
    pub fn removal(name: impl Into<String>) -> Self {
        let now = SystemTime::now();
        Self {
            name: name.into(),
            value: String::new(),
            expires: now
                .checked_sub(Duration::from_secs(1))
                .unwrap_or(SystemTime::UNIX_EPOCH),
        }
    }

    /// Returns `true` if the expiry is already in the past.
    pub fn is_expired(&self) -> bool {
        self.expires <= SystemTime::now()
    }

    /// Renders the value of a `Set-Cookie` header for this instruction.
    ///
    /// The value is percent-encoded, so it can never add attributes or break
    /// the header line.
    ///
    /// ```
    /// use std::time::{Duration, SystemTime};
    /// use hostbridge::http::SetCookie;
    ///
    /// let cookie = SetCookie {
    ///     name: "theme".into(),
    ///     value: "dark".into(),
    ///     expires: SystemTime::UNIX_EPOCH + Duration::from_secs(784_111_777),
    /// };
    /// assert_eq!(
    ///     cookie.header_value(),
    ///     "theme=dark; Expires=Sun, 06 Nov 1994 08:49:37 GMT"
    /// );
    /// ```
    pub fn header_value(&self) -> String {
        format!(
            "{}={}; Expires={}",
            self.name,
            utf8_percent_encode(&self.value, COOKIE_VALUE),
            httpdate::fmt_http_date(self.expires)
        )
    }
}

impl fmt::Display for SetCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header_value())
    }
}

/// Cookie facade over the host.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use hostbridge::host::MemoryHost;
/// use hostbridge::http::{Blob, CookieStore};
///
/// let cookies: Blob = [("session", "abc")].into_iter().collect();
/// let host = Rc::new(MemoryHost::new().with_cookies(cookies));
/// let store = CookieStore::new(host.clone());
///
/// assert_eq!(store.get("session").unwrap(), "abc");
///
/// store.set("theme", "dark").unwrap();
/// // Not visible until the client sends it back.
/// assert!(!store.has("theme"));
/// assert_eq!(host.cookie_jar()[0].name, "theme");
/// ```
#[derive(Clone)]
pub struct CookieStore {
    host: SharedHost,
    lifetime: Duration,
}

impl CookieStore {
    /// Creates a cookie store with the default 30 second lifetime.
    pub fn new(host: SharedHost) -> Self {
        Self::with_config(host, &Config::default())
    }

    /// Creates a cookie store using the configured default lifetime.
    pub fn with_config(host: SharedHost, config: &Config) -> Self {
        Self {
            host,
            lifetime: Duration::from_secs(config.cookie_lifetime_secs),
        }
    }

    /// Returns the cookies the client sent, as of now.
    pub fn all(&self) -> Blob {
        self.host.cookies()
    }

    /// Returns the value the client sent for `key`.
    pub fn get(&self, key: impl Into<Key>) -> Option<Value> {
        self.host.cookies().get(key).cloned()
    }

    /// Returns the value the client sent for `key`, or `default`.
    pub fn get_or(&self, key: impl Into<Key>, default: impl Into<Value>) -> Value {
        self.host.cookies().get_or(key, default)
    }

    /// Returns `true` if the client sent `key`.
    pub fn has(&self, key: impl Into<Key>) -> bool {
        self.host.cookies().has(key)
    }

    /// Asks the host to set a cookie with the default lifetime.
    ///
    /// # Errors
    ///
    /// [`CookieError::InvalidName`] if the name is empty or contains a
    /// separator; nothing is sent to the host.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<String>) -> Result<&Self, CookieError> {
        self.set_with_lifetime(key, value, self.lifetime)
    }

    /// Asks the host to set a cookie that expires after `seconds`.
    ///
    /// # Errors
    ///
    /// [`CookieError::InvalidName`], as for [`CookieStore::set`].
    pub fn set_with_expiry(
        &self,
        key: impl Into<Key>,
        value: impl Into<String>,
        seconds: u64,
    ) -> Result<&Self, CookieError> {
        self.set_with_lifetime(key, value, Duration::from_secs(seconds))
    }

    /// Asks the host to expire a cookie on the client.
    ///
    /// # Errors
    ///
    /// [`CookieError::InvalidName`], as for [`CookieStore::set`].
    pub fn delete(&self, key: impl Into<Key>) -> Result<&Self, CookieError> {
        let name = key.into().to_string();
        check_name(&name)?;
        trace!(cookie = %name, "expiring cookie");
        self.host.set_cookie(SetCookie::removal(name));
        Ok(self)
    }

    fn set_with_lifetime(
        &self,
        key: impl Into<Key>,
        value: impl Into<String>,
        lifetime: Duration,
    ) -> Result<&Self, CookieError> {
        let name = key.into().to_string();
        check_name(&name)?;
        let cookie = SetCookie::new(name, value, lifetime);
        trace!(cookie = %cookie.name, lifetime = ?lifetime, "setting cookie");
        self.host.set_cookie(cookie);
        Ok(self)
    }
}

impl Store for CookieStore {
    fn all(&self) -> Blob {
        CookieStore::all(self)
    }

    fn get(&self, key: &Key) -> Option<Value> {
        CookieStore::get(self, key.clone())
    }

    fn has(&self, key: &Key) -> bool {
        CookieStore::has(self, key.clone())
    }

    fn set(&mut self, key: Key, value: Value) {
        let text = scalar_to_string(&value).unwrap_or_else(|| value.to_string());
        if let Err(err) = CookieStore::set(self, key, text) {
            warn!(error = %err, "cookie dropped");
        }
    }

    fn delete(&mut self, key: &Key) {
        if let Err(err) = CookieStore::delete(self, key.clone()) {
            warn!(error = %err, "cookie removal dropped");
        }
    }
}

impl fmt::Debug for CookieStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieStore")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use serde_json::json;

    use super::*;
    use crate::host::MemoryHost;

    fn host_with(cookies: &[(&str, &str)]) -> Rc<MemoryHost> {
        let blob: Blob = cookies.iter().copied().collect();
        Rc::new(MemoryHost::new().with_cookies(blob))
    }

    #[test]
    fn empty_when_client_sent_nothing() {
        let store = CookieStore::new(host_with(&[]));
        assert!(store.all().is_empty());
        assert_eq!(store.get("key"), None);
        assert!(!store.has("key"));
    }

    #[test]
    fn reads_reflect_current_host_state() {
        let host = host_with(&[]);
        let store = CookieStore::new(host.clone());
        assert!(store.all().is_empty());

        host.replace_cookies([("key", "value")].into_iter().collect());
        assert_eq!(store.get("key"), Some(json!("value")));
        assert!(store.has("key"));
    }

    #[test]
    fn set_is_not_visible_in_same_request() {
        let host = host_with(&[("k", "old")]);
        let store = CookieStore::new(host.clone());

        store.set("k", "v").unwrap();
        assert_eq!(store.get("k"), Some(json!("old")));

        let jar = host.cookie_jar();
        assert_eq!(jar.len(), 1);
        assert_eq!(jar[0].name, "k");
        assert_eq!(jar[0].value, "v");
        assert!(!jar[0].is_expired());
    }

    #[test]
    fn set_uses_default_lifetime() {
        let host = host_with(&[]);
        let store = CookieStore::new(host.clone());
        let before = SystemTime::now();
        store.set("k", "v").unwrap();
        let expires = host.cookie_jar()[0].expires;
        let lifetime = expires.duration_since(before).unwrap_or_default();
        assert!(lifetime >= Duration::from_secs(30));
        assert!(lifetime < Duration::from_secs(31));
    }

    #[test]
    fn set_with_expiry_uses_given_lifetime() {
        let host = host_with(&[]);
        let store = CookieStore::new(host.clone());
        store.set_with_expiry("k", "v", 3600).unwrap();
        let remaining = host.cookie_jar()[0]
            .expires
            .duration_since(SystemTime::now())
            .unwrap_or_default();
        assert!(remaining > Duration::from_secs(3500));
    }

    #[test]
    fn configured_lifetime_applies() {
        let host = host_with(&[]);
        let config = Config {
            cookie_lifetime_secs: 600,
            ..Config::default()
        };
        let store = CookieStore::with_config(host.clone(), &config);
        store.set("k", "v").unwrap();
        let remaining = host.cookie_jar()[0]
            .expires
            .duration_since(SystemTime::now())
            .unwrap_or_default();
        assert!(remaining > Duration::from_secs(500));
    }

    #[test]
    fn delete_emits_expired_empty_cookie() {
        let host = host_with(&[("key", "value")]);
        let store = CookieStore::new(host.clone());
        store.delete("key").unwrap();

        // still present until the next request
        assert!(store.has("key"));

        let jar = host.cookie_jar();
        assert_eq!(jar[0].name, "key");
        assert_eq!(jar[0].value, "");
        assert!(jar[0].is_expired());
    }

    #[test]
    fn store_trait_coerces_values_to_text() {
        let host = host_with(&[]);
        let mut store = CookieStore::new(host.clone());
        Store::set(&mut store, Key::from("n"), json!(42));
        Store::set(&mut store, Key::from("flag"), json!(true));
        let jar = host.cookie_jar();
        assert_eq!(jar[0].value, "42");
        assert_eq!(jar[1].value, "1");
    }

    #[test]
    fn header_value_escapes_separators_in_value() {
        let cookie = SetCookie {
            name: "k".into(),
            value: "a b; Path=/admin\r\nX-Evil: 1".into(),
            expires: SystemTime::UNIX_EPOCH,
        };
        assert_eq!(
            cookie.header_value(),
            "k=a%20b%3B%20Path%3D%2Fadmin%0D%0AX-Evil%3A%201; Expires=Thu, 01 Jan 1970 00:00:00 GMT"
        );
    }

    #[test]
    fn invalid_names_are_rejected_before_reaching_host() {
        let host = host_with(&[]);
        let mut store = CookieStore::new(host.clone());
        for name in ["", "a=b", "a b", "a;b", "a,b", "a\r\nb", "a\tb"] {
            assert_eq!(
                store.set(name, "v").unwrap_err(),
                CookieError::InvalidName { name: name.to_owned() }
            );
            assert!(store.delete(name).is_err());
        }
        Store::set(&mut store, Key::from("bad name"), json!("v"));
        assert!(host.cookie_jar().is_empty());
    }

    #[test]
    fn header_value_format() {
        let cookie = SetCookie {
            name: "a".into(),
            value: "b".into(),
            expires: SystemTime::UNIX_EPOCH,
        };
        assert_eq!(cookie.to_string(), "a=b; Expires=Thu, 01 Jan 1970 00:00:00 GMT");
    }
}
