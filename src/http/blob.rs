//! Insertion-ordered key/value container with default-on-miss lookups.
//!
//! [`Blob`] is the building block for every keyed facade in this crate: the
//! server, query, and body parameters of a [`Request`](super::Request) are
//! plain blobs, while cookies and the session go through the host but share
//! the same [`Store`] contract.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;

/// A container key: either an integer index or a string name.
///
/// Hosts commonly expose list-shaped parameters (`a[]=1&a[]=2`) with integer
/// keys next to ordinary named keys, so both are first-class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Index(i64),
    Name(String),
}

impl Key {
    /// Returns the key as a string slice if it is a name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name.as_str()),
            Self::Index(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<&String> for Key {
    fn from(name: &String) -> Self {
        Self::Name(name.clone())
    }
}

impl From<i64> for Key {
    fn from(index: i64) -> Self {
        Self::Index(index)
    }
}

impl From<i32> for Key {
    fn from(index: i32) -> Self {
        Self::Index(index.into())
    }
}

/// Fails for indices beyond `i64::MAX`.
impl TryFrom<usize> for Key {
    type Error = std::num::TryFromIntError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        i64::try_from(index).map(Self::Index)
    }
}

/// Shared contract of every keyed facade: [`Blob`], the cookie store, and the
/// session store.
///
/// Reads return owned values because some implementors proxy to host state
/// that cannot be borrowed.
pub trait Store {
    /// Returns a copy of every entry, in insertion order.
    fn all(&self) -> Blob;

    /// Returns the value for `key`, or `None` if absent.
    fn get(&self, key: &Key) -> Option<Value>;

    /// Returns the value for `key`, or `default` if absent.
    fn get_or(&self, key: &Key, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    /// Returns `true` if `key` is present.
    fn has(&self, key: &Key) -> bool;

    /// Sets `key` to `value`.
    fn set(&mut self, key: Key, value: Value);

    /// Removes `key`. Absent keys are ignored.
    fn delete(&mut self, key: &Key);
}

/// An insertion-ordered mapping from [`Key`] to a dynamic [`Value`].
///
/// Lookups for absent keys never fail; they yield `None` or the supplied
/// default.
///
/// # Examples
///
/// ```
/// use hostbridge::http::Blob;
/// use serde_json::json;
///
/// let mut blob = Blob::new();
/// blob.set("key", "value").set(0, "alpha");
///
/// assert_eq!(blob.get("key"), Some(&json!("value")));
/// assert_eq!(blob.get_or("missing", "default"), json!("default"));
/// assert!(blob.has(0));
///
/// blob.delete(0);
/// assert!(!blob.has(0));
/// assert_eq!(blob.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Blob {
    inner: IndexMap<Key, Value>,
}

impl Blob {
    /// Creates an empty blob.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every entry, in insertion order.
    pub fn all(&self) -> IndexMap<Key, Value> {
        self.inner.clone()
    }

    /// Returns the value for `key`, or `None` if absent.
    pub fn get(&self, key: impl Into<Key>) -> Option<&Value> {
        self.inner.get(&key.into())
    }

    /// Returns the value for `key`, or `default` if absent.
    pub fn get_or(&self, key: impl Into<Key>, default: impl Into<Value>) -> Value {
        match self.get(key) {
            Some(value) => value.clone(),
            None => default.into(),
        }
    }

    /// Returns the value for `key` if it is present and a string.
    pub fn get_str(&self, key: impl Into<Key>) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Returns `true` if `key` is present.
    pub fn has(&self, key: impl Into<Key>) -> bool {
        self.inner.contains_key(&key.into())
    }

    /// Sets `key` to `value`. An existing key keeps its position.
    pub fn set(&mut self, key: impl Into<Key>, value: impl Into<Value>) -> &mut Self {
        self.inner.insert(key.into(), value.into());
        self
    }

    /// Removes `key`, preserving the order of the remaining entries.
    pub fn delete(&mut self, key: impl Into<Key>) -> &mut Self {
        self.inner.shift_remove(&key.into());
        self
    }

    /// Returns an iterator over all `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.inner.iter()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Store for Blob {
    fn all(&self) -> Blob {
        self.clone()
    }

    fn get(&self, key: &Key) -> Option<Value> {
        self.inner.get(key).cloned()
    }

    fn has(&self, key: &Key) -> bool {
        self.inner.contains_key(key)
    }

    fn set(&mut self, key: Key, value: Value) {
        self.inner.insert(key, value);
    }

    fn delete(&mut self, key: &Key) {
        self.inner.shift_remove(key);
    }
}

impl From<IndexMap<Key, Value>> for Blob {
    fn from(inner: IndexMap<Key, Value>) -> Self {
        Self { inner }
    }
}

impl From<serde_json::Map<String, Value>> for Blob {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

impl<K, V> FromIterator<(K, V)> for Blob
where
    K: Into<Key>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Blob {
    type Item = (&'a Key, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

/// Renders a scalar the way hosts stringify values: `null` and `false` become
/// empty, `true` becomes `"1"`. Arrays and objects have no scalar form.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => Some(String::new()),
        Value::Bool(true) => Some("1".to_owned()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => None,
    }
}
