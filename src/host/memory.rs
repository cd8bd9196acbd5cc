//! In-memory [`Host`] implementation.

use std::cell::{Cell, RefCell};

use bytes::{BufMut, BytesMut};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::warn;

use super::Host;
use crate::http::{Blob, Key, RawUpload, SetCookie};

/// Output captured by a [`MemoryHost`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    pub status_line: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: BytesMut,
}

impl Output {
    /// Returns the body as UTF-8 text, replacing invalid sequences.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Returns the first captured value for `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Renders the captured output in HTTP/1.x wire format: status line,
    /// CRLF-terminated headers, a blank line, then the body.
    ///
    /// When no status line was captured (headers were already sent), only the
    /// body is rendered.
    pub fn to_bytes(&self) -> BytesMut {
        let estimated_size = 128 + self.headers.len() * 64 + self.body.len();
        let mut buf = BytesMut::with_capacity(estimated_size);

        if let Some(status_line) = &self.status_line {
            buf.put(status_line.as_bytes());
            buf.put(&b"\r\n"[..]);

            for (name, value) in &self.headers {
                buf.put(format!("{name}: {value}\r\n").as_bytes());
            }

            buf.put(&b"\r\n"[..]);
        }

        buf.put(&self.body[..]);
        buf
    }
}

#[derive(Debug, Default)]
struct SessionState {
    active: bool,
    name: Option<String>,
    starts: usize,
    data: Blob,
}

/// A [`Host`] backed entirely by memory.
///
/// Input is supplied up front through the `with_*` builders. Cookie
/// instructions, session activity, and output are recorded and can be
/// inspected afterwards. Cookie instructions are also sent as `Set-Cookie`
/// lines right after the status line.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use hostbridge::host::MemoryHost;
/// use hostbridge::http::{Blob, Request, Response, SessionDirective};
///
/// let host = Rc::new(MemoryHost::new());
/// let server: Blob = [("REQUEST_URI", "/hello")].into_iter().collect();
/// let request = Request::new(host.clone(), server, SessionDirective::Disabled);
///
/// let mut response = Response::new();
/// response.set_body("Hello!").unwrap();
/// response.finish(&request).unwrap();
///
/// let output = host.output();
/// assert_eq!(output.status_line.as_deref(), Some("HTTP/1.1 200 OK"));
/// assert_eq!(output.body_text(), "Hello!");
/// ```
#[derive(Debug, Default)]
pub struct MemoryHost {
    server: Blob,
    query: Blob,
    body: Blob,
    cookies: RefCell<Blob>,
    uploads: IndexMap<String, RawUpload>,
    cookie_jar: RefCell<Vec<SetCookie>>,
    cookies_flushed: Cell<usize>,
    session: RefCell<SessionState>,
    headers_sent: Cell<bool>,
    output: RefCell<Output>,
}

impl MemoryHost {
    /// Creates a host with no input, no session, and nothing sent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server parameters.
    #[must_use]
    pub fn with_server(mut self, server: Blob) -> Self {
        self.server = server;
        self
    }

    /// Sets the parsed query-string parameters.
    #[must_use]
    pub fn with_query(mut self, query: Blob) -> Self {
        self.query = query;
        self
    }

    /// Sets the parsed body parameters.
    #[must_use]
    pub fn with_body(mut self, body: Blob) -> Self {
        self.body = body;
        self
    }

    /// Sets the cookies the client sent.
    #[must_use]
    pub fn with_cookies(self, cookies: Blob) -> Self {
        *self.cookies.borrow_mut() = cookies;
        self
    }

    /// Sets the raw upload metadata.
    #[must_use]
    pub fn with_uploads(mut self, uploads: IndexMap<String, RawUpload>) -> Self {
        self.uploads = uploads;
        self
    }

    /// Marks a session as already active, holding `data`.
    #[must_use]
    pub fn with_session(self, data: Blob) -> Self {
        {
            let mut session = self.session.borrow_mut();
            session.active = true;
            session.data = data;
        }
        self
    }

    /// Pretends output has already started, so header emission is skipped.
    #[must_use]
    pub fn with_headers_sent(self) -> Self {
        self.headers_sent.set(true);
        self
    }

    /// Replaces the cookies the client sent, simulating the next request.
    pub fn replace_cookies(&self, cookies: Blob) {
        *self.cookies.borrow_mut() = cookies;
    }

    /// Returns every cookie instruction received so far.
    pub fn cookie_jar(&self) -> Vec<SetCookie> {
        self.cookie_jar.borrow().clone()
    }

    /// Returns how many times a session was actually started.
    pub fn session_starts(&self) -> usize {
        self.session.borrow().starts
    }

    /// Returns the name the session was last started under, if any.
    pub fn session_name(&self) -> Option<String> {
        self.session.borrow().name.clone()
    }

    /// Returns a copy of everything written so far.
    pub fn output(&self) -> Output {
        self.output.borrow().clone()
    }
}

impl Host for MemoryHost {
    fn server_params(&self) -> Blob {
        self.server.clone()
    }

    fn query(&self) -> Blob {
        self.query.clone()
    }

    fn body(&self) -> Blob {
        self.body.clone()
    }

    fn cookies(&self) -> Blob {
        self.cookies.borrow().clone()
    }

    fn uploads(&self) -> IndexMap<String, RawUpload> {
        self.uploads.clone()
    }

    fn set_cookie(&self, cookie: SetCookie) {
        if self.headers_sent.get() {
            warn!(cookie = %cookie.name, "output already started, cookie not sent");
        }
        self.cookie_jar.borrow_mut().push(cookie);
    }

    fn session_active(&self) -> bool {
        self.session.borrow().active
    }

    fn start_session(&self, name: Option<&str>) {
        let mut session = self.session.borrow_mut();
        session.active = true;
        session.starts += 1;
        if let Some(name) = name {
            session.name = Some(name.to_owned());
        }
    }

    fn session_all(&self) -> Blob {
        self.session.borrow().data.clone()
    }

    fn session_get(&self, key: &Key) -> Option<Value> {
        self.session.borrow().data.get(key.clone()).cloned()
    }

    fn session_set(&self, key: Key, value: Value) {
        self.session.borrow_mut().data.set(key, value);
    }

    fn session_delete(&self, key: &Key) {
        self.session.borrow_mut().data.delete(key.clone());
    }

    fn headers_sent(&self) -> bool {
        self.headers_sent.get()
    }

    fn send_status_line(&self, line: &str) {
        let jar = self.cookie_jar.borrow();
        let mut output = self.output.borrow_mut();
        output.status_line = Some(line.to_owned());
        for cookie in &jar[self.cookies_flushed.get()..] {
            output
                .headers
                .push(("Set-Cookie".to_owned(), cookie.header_value()));
        }
        self.cookies_flushed.set(jar.len());
    }

    fn send_header(&self, name: &str, value: &str) {
        self.output
            .borrow_mut()
            .headers
            .push((name.to_owned(), value.to_owned()));
    }

    fn write_body(&self, body: &[u8]) {
        self.output.borrow_mut().body.put(body);
        self.headers_sent.set(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_start_records_name_and_count() {
        let host = MemoryHost::new();
        assert!(!host.session_active());
        host.start_session(Some("shop"));
        assert!(host.session_active());
        assert_eq!(host.session_starts(), 1);
        assert_eq!(host.session_name().as_deref(), Some("shop"));
    }

    #[test]
    fn session_data_round_trip() {
        let host = MemoryHost::new().with_session(Blob::new());
        host.session_set(Key::from("user"), json!(7));
        assert_eq!(host.session_get(&Key::from("user")), Some(json!(7)));
        host.session_delete(&Key::from("user"));
        assert!(host.session_all().is_empty());
    }

    #[test]
    fn body_write_marks_headers_sent() {
        let host = MemoryHost::new();
        assert!(!host.headers_sent());
        host.write_body(b"x");
        assert!(host.headers_sent());
    }

    #[test]
    fn output_to_bytes_wire_format() {
        let host = MemoryHost::new();
        host.send_status_line("HTTP/1.1 200 OK");
        host.send_header("content-type", "text/plain");
        host.send_header("Set-Cookie", "a=1");
        host.send_header("Set-Cookie", "b=2");
        host.write_body(b"hi");

        let bytes = host.output().to_bytes();
        assert_eq!(
            &bytes[..],
            &b"HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\nSet-Cookie: a=1\r\nSet-Cookie: b=2\r\n\r\nhi"[..]
        );
    }

    #[test]
    fn cookie_instructions_go_out_with_the_status_line() {
        let host = MemoryHost::new();
        host.set_cookie(SetCookie {
            name: "theme".into(),
            value: "dark".into(),
            expires: std::time::SystemTime::UNIX_EPOCH,
        });
        host.set_cookie(SetCookie::removal("old"));
        host.send_status_line("HTTP/1.1 200 OK");
        host.send_header("content-type", "text/plain");

        let output = host.output();
        let cookies: Vec<_> = output
            .headers
            .iter()
            .filter(|(name, _)| name == "Set-Cookie")
            .map(|(_, value)| value.as_str())
            .collect();
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0], "theme=dark; Expires=Thu, 01 Jan 1970 00:00:00 GMT");
        assert!(cookies[1].starts_with("old=; Expires="));
        assert_eq!(output.headers.len(), 3);
    }

    #[test]
    fn cookies_set_after_output_started_are_not_sent() {
        let host = MemoryHost::new().with_headers_sent();
        host.set_cookie(SetCookie::removal("late"));
        assert_eq!(host.cookie_jar().len(), 1);
        assert!(host.output().headers.is_empty());
    }

    #[test]
    fn output_without_status_line_is_body_only() {
        let host = MemoryHost::new();
        host.write_body(b"late");
        assert_eq!(&host.output().to_bytes()[..], b"late");
    }
}
