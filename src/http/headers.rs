//! Response header lines.
//!
//! Field names compare case-insensitively per [RFC 9110 §5]. Line order is
//! kept exactly as built, since [`Response::finish`](super::Response::finish)
//! sends the lines in that order. `Set-Cookie` style fields may repeat.
//!
//! [RFC 9110 §5]: https://www.rfc-editor.org/rfc/rfc9110#section-5

use std::fmt;

/// An ordered list of header lines with case-insensitive names.
///
/// # Examples
///
/// ```
/// use hostbridge::http::Headers;
///
/// let mut headers = Headers::new();
/// headers.set("Content-Type", "text/plain");
/// headers.append("Set-Cookie", "a=1");
/// headers.append("Set-Cookie", "b=2");
///
/// assert_eq!(headers.get("content-type"), Some("text/plain"));
/// assert_eq!(headers.get_all("set-cookie").count(), 2);
///
/// headers.set("SET-COOKIE", "c=3");
/// assert_eq!(headers.get_all("Set-Cookie").collect::<Vec<_>>(), ["c=3"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    lines: Vec<(String, String)>,
}

fn same_name(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

impl Headers {
    /// Returns an empty header list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `name` a single line holding `value`.
    ///
    /// An existing line keeps its slot and its name spelling; any further
    /// lines with that name are dropped. Otherwise the line goes last.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let mut value = Some(value.into());

        self.lines.retain_mut(|(existing, slot)| {
            if !same_name(existing, &name) {
                return true;
            }
            match value.take() {
                Some(v) => {
                    *slot = v;
                    true
                }
                None => false,
            }
        });

        if let Some(value) = value {
            self.lines.push((name, value));
        }
    }

    /// Adds a line after the existing ones, even if the name is already present.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.lines.push((name.into(), value.into()));
    }

    /// First value sent under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.lines
            .iter()
            .find(|(existing, _)| same_name(existing, name))
            .map(|(_, value)| value.as_str())
    }

    /// Every value sent under `name`, in line order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.lines
            .iter()
            .filter(move |(existing, _)| same_name(existing, name))
            .map(|(_, value)| value.as_str())
    }

    /// Drops every line named `name`; reports whether anything was dropped.
    pub fn remove(&mut self, name: &str) -> bool {
        let count = self.lines.len();
        self.lines.retain(|(existing, _)| !same_name(existing, name));
        self.lines.len() != count
    }

    /// Returns `true` if at least one line is named `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of lines, counting repeated names separately.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` if there are no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns every `(name, value)` line in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// Builds the list with [`Headers::set`], so a repeated name keeps its last value.
impl<N, V> FromIterator<(N, V)> for Headers
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        iter.into_iter()
            .for_each(|(name, value)| headers.set(name, value));
        headers
    }
}

/// Renders `name: value` lines, each terminated by CRLF.
impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.iter()
            .try_for_each(|(name, value)| write!(f, "{name}: {value}\r\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(headers: &Headers) -> Vec<(&str, &str)> {
        headers.iter().collect()
    }

    #[test]
    fn lookup_ignores_name_case() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "text/plain");
        assert_eq!(headers.get("CONTENT-type"), Some("text/plain"));
        assert!(headers.contains("content-TYPE"));
        assert!(!headers.contains("content-length"));
    }

    #[test]
    fn set_overwrites_without_moving() {
        let mut headers = Headers::new();
        headers.set("content-type", "text/html");
        headers.set("X-First", "1");
        headers.set("Content-Type", "text/plain");
        assert_eq!(
            lines(&headers),
            [("content-type", "text/plain"), ("X-First", "1")]
        );
    }

    #[test]
    fn set_collapses_repeated_lines() {
        let mut headers = Headers::new();
        headers.append("Set-Cookie", "a=1");
        headers.append("X-Between", "x");
        headers.append("Set-Cookie", "b=2");
        headers.set("set-cookie", "c=3");
        assert_eq!(lines(&headers), [("Set-Cookie", "c=3"), ("X-Between", "x")]);
    }

    #[test]
    fn get_borrows_only_from_the_list() {
        let mut headers = Headers::new();
        headers.set("Location", "/next");
        let found = {
            let name = String::from("location");
            headers.get(&name)
        };
        assert_eq!(found, Some("/next"));
    }

    #[test]
    fn append_keeps_every_line() {
        let mut headers = Headers::new();
        headers.append("Set-Cookie", "a=1");
        headers.append("set-cookie", "b=2");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("SET-COOKIE"), Some("a=1"));
        assert_eq!(headers.get_all("Set-Cookie").collect::<Vec<_>>(), ["a=1", "b=2"]);
    }

    #[test]
    fn remove_drops_all_lines_for_name() {
        let mut headers = Headers::new();
        headers.append("Vary", "Accept");
        headers.append("vary", "Cookie");
        headers.set("Location", "/next");
        assert!(headers.remove("VARY"));
        assert_eq!(lines(&headers), [("Location", "/next")]);
        assert!(!headers.remove("vary"));
    }

    #[test]
    fn collected_pairs_render_as_lines() {
        let headers: Headers = [("A", "1"), ("b", "2"), ("a", "3")].into_iter().collect();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.to_string(), "A: 3\r\nb: 2\r\n");
        assert_eq!(Headers::new().to_string(), "");
    }
}
