//! The incoming request, assembled from host state.

use std::fmt;

use serde_json::Value;
use tracing::debug;

use super::{Blob, CookieStore, FileSet, Method, SessionDirective, SessionStore};
use crate::config::Config;
use crate::host::SharedHost;

/// The server parameter carrying the protocol, e.g. `HTTP/1.1`.
pub const SERVER_PROTOCOL: &str = "SERVER_PROTOCOL";
/// The server parameter carrying the request method.
pub const REQUEST_METHOD: &str = "REQUEST_METHOD";
/// The server parameter carrying the raw request URI, query string included.
pub const REQUEST_URI: &str = "REQUEST_URI";
/// The server parameter carrying the path of the running script.
pub const SCRIPT_NAME: &str = "SCRIPT_NAME";
/// The server parameter carrying the raw query string, without the `?`.
pub const QUERY_STRING: &str = "QUERY_STRING";

const REQUESTED_WITH: &str = "HTTP_X_REQUESTED_WITH";

/// A request facade over host state.
///
/// Protocol, method, and path info are computed once at construction. The
/// containers stay mutable, but the request always refers to the same ones.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use hostbridge::host::MemoryHost;
/// use hostbridge::http::{Blob, Method, Request};
///
/// let server: Blob = [
///     ("REQUEST_METHOD", "POST"),
///     ("SCRIPT_NAME", "/app/index.php"),
///     ("REQUEST_URI", "/app/index.php/users?active=1"),
///     ("QUERY_STRING", "active=1"),
/// ]
/// .into_iter()
/// .collect();
///
/// let request = Request::new(Rc::new(MemoryHost::new()), server, false.into());
///
/// assert_eq!(request.path_info(), "/users");
/// assert_eq!(request.method(), &Method::Post);
/// assert!(request.is_post());
/// assert_eq!(request.protocol(), "HTTP/1.1");
/// ```
pub struct Request {
    host: SharedHost,
    cookies: CookieStore,
    data: Blob,
    files: FileSet,
    query: Blob,
    server: Blob,
    session: SessionStore,
    protocol: String,
    method: Method,
    path_info: String,
}

impl Request {
    /// Builds a request from explicit server parameters with the default configuration.
    ///
    /// Query, body, cookies, and uploads always come from `host`.
    pub fn new(host: SharedHost, server: Blob, session: SessionDirective) -> Self {
        Self::with_config(host, server, session, &Config::default())
    }

    /// Builds a request using the host's own server parameters and the
    /// configured session directive.
    pub fn from_host(host: SharedHost, config: &Config) -> Self {
        let server = host.server_params();
        Self::with_config(host, server, config.session.clone(), config)
    }

    /// Builds a request from explicit server parameters.
    pub fn with_config(
        host: SharedHost,
        server: Blob,
        session: SessionDirective,
        config: &Config,
    ) -> Self {
        let cookies = CookieStore::with_config(host.clone(), config);
        let data = host.body();
        let files = FileSet::new(host.uploads());
        let query = host.query();
        let session = SessionStore::new(host.clone(), &session);

        let protocol = server
            .get_str(SERVER_PROTOCOL)
            .unwrap_or(config.default_protocol.as_str())
            .to_owned();
        let method = server
            .get_str(REQUEST_METHOD)
            .map(Method::from)
            .unwrap_or_default();
        let path_info = derive_path_info(
            server.get_str(SCRIPT_NAME).unwrap_or(""),
            server.get_str(REQUEST_URI).unwrap_or("/"),
            server.get_str(QUERY_STRING).unwrap_or(""),
        );

        debug!(
            method = %method,
            protocol = %protocol,
            path_info = %path_info,
            "request assembled"
        );

        Self {
            host,
            cookies,
            data,
            files,
            query,
            server,
            session,
            protocol,
            method,
            path_info,
        }
    }

    /// Returns the host this request was built from.
    pub fn host(&self) -> &SharedHost {
        &self.host
    }

    /// Returns the cookie store bound to this request's host.
    pub fn cookies(&self) -> &CookieStore {
        &self.cookies
    }

    /// Returns the parsed body parameters.
    pub fn data(&self) -> &Blob {
        &self.data
    }

    /// Returns the body parameters for modification.
    pub fn data_mut(&mut self) -> &mut Blob {
        &mut self.data
    }

    /// Returns the uploaded files, keyed by form field.
    pub fn files(&self) -> &FileSet {
        &self.files
    }

    /// Returns the logical request path: always starts with exactly one `/`.
    pub fn path_info(&self) -> &str {
        &self.path_info
    }

    /// Returns the protocol used in the response status line.
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Returns the parsed query-string parameters.
    pub fn query(&self) -> &Blob {
        &self.query
    }

    /// Returns the query-string parameters for modification.
    pub fn query_mut(&mut self) -> &mut Blob {
        &mut self.query
    }

    /// Returns the request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the server parameters the request was built from.
    pub fn server(&self) -> &Blob {
        &self.server
    }

    /// Returns the server parameters for modification.
    pub fn server_mut(&mut self) -> &mut Blob {
        &mut self.server
    }

    /// Returns the session store.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Returns the session store for modification.
    pub fn session_mut(&mut self) -> &mut SessionStore {
        &mut self.session
    }

    /// Looks up a server parameter by name, case-insensitively: `"request_uri"`
    /// reads `REQUEST_URI`.
    pub fn server_param(&self, name: &str) -> Option<&Value> {
        self.server.get(name.to_ascii_uppercase())
    }

    /// Returns `true` if the request was sent by `XMLHttpRequest`.
    pub fn is_ajax(&self) -> bool {
        self.server.get_str(REQUESTED_WITH) == Some("XMLHttpRequest")
    }

    /// Returns `true` for `DELETE` requests.
    pub fn is_delete(&self) -> bool {
        self.method == Method::Delete
    }

    /// Returns `true` for `GET` requests.
    pub fn is_get(&self) -> bool {
        self.method == Method::Get
    }

    /// Returns `true` for `HEAD` requests.
    pub fn is_head(&self) -> bool {
        self.method == Method::Head
    }

    /// Returns `true` for `OPTIONS` requests.
    pub fn is_options(&self) -> bool {
        self.method == Method::Options
    }

    /// Returns `true` for `PATCH` requests.
    pub fn is_patch(&self) -> bool {
        self.method == Method::Patch
    }

    /// Returns `true` for `POST` requests.
    pub fn is_post(&self) -> bool {
        self.method == Method::Post
    }

    /// Returns `true` for `PUT` requests.
    pub fn is_put(&self) -> bool {
        self.method == Method::Put
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("protocol", &self.protocol)
            .field("path_info", &self.path_info)
            .field("query", &self.query)
            .field("data", &self.data)
            .field("files", &self.files)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// Recovers the logical route path from a raw request URI.
///
/// The script path (or, failing that, its directory) is stripped from the
/// front of `request_uri`, then `?` + `query_string` from the back. All
/// matching is literal. The result starts with exactly one `/`.
///
/// ```
/// use hostbridge::http::request::derive_path_info;
///
/// assert_eq!(derive_path_info("/app/index.php", "/app/index.php/users?active=1", "active=1"), "/users");
/// assert_eq!(derive_path_info("/app/index.php", "/app/users", ""), "/users");
/// assert_eq!(derive_path_info("", "/", ""), "/");
/// ```
pub fn derive_path_info(script_path: &str, request_uri: &str, query_string: &str) -> String {
    let path = match request_uri.strip_prefix(script_path) {
        Some(rest) => rest,
        None => request_uri
            .strip_prefix(dirname(script_path))
            .unwrap_or(request_uri),
    };

    let suffix = format!("?{query_string}");
    let path = path.strip_suffix(suffix.as_str()).unwrap_or(path);

    format!("/{}", path.trim_start_matches('/'))
}

/// Parent directory of `path`, with the current-directory result `"."`
/// normalized to an empty string.
fn dirname(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        // "" has no parent; "/" and "//" are the root
        return if path.is_empty() { "" } else { "/" };
    }

    match trimmed.rfind('/') {
        None => "",
        Some(pos) => {
            let parent = trimmed[..pos].trim_end_matches('/');
            if parent.is_empty() { "/" } else { parent }
        }
    }
}
