//! The boundary between this crate and the environment that owns the
//! incoming request.
//!
//! Everything ambient (server parameters, parsed query and body, cookies,
//! uploads, the session store, and the output channel) is reached through the
//! [`Host`] trait. Nothing here reparses raw input: a host hands over data it
//! has already parsed.
//!
//! [`MemoryHost`] is a complete in-memory implementation, suitable for
//! embedding and for tests.

use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::http::{Blob, Key, RawUpload, SetCookie};

pub mod memory;

pub use memory::{MemoryHost, Output};

/// A shared handle to the host, held by a request and its cookie/session stores.
pub type SharedHost = Rc<dyn Host>;

/// Ambient request state and output channel supplied by the embedding environment.
///
/// All methods take `&self`; implementations that record state use interior
/// mutability. A host serves exactly one request on one thread.
pub trait Host {
    // ── Input ────────────────────────────────────────────────────────────────

    /// Server/environment parameters (`REQUEST_METHOD`, `REQUEST_URI`, `HTTP_*`, ...).
    fn server_params(&self) -> Blob;

    /// Parsed query-string parameters.
    fn query(&self) -> Blob;

    /// Parsed body parameters.
    fn body(&self) -> Blob;

    /// The cookies sent with the current request, read at call time.
    fn cookies(&self) -> Blob;

    /// Raw upload metadata keyed by form field name.
    fn uploads(&self) -> IndexMap<String, RawUpload>;

    // ── Cookies ──────────────────────────────────────────────────────────────

    /// Instructs the host to emit a `Set-Cookie` header when the response
    /// headers go out. Instructions given after output started are lost.
    fn set_cookie(&self, cookie: SetCookie);

    // ── Session ──────────────────────────────────────────────────────────────

    /// Returns `true` if a session is already active for this request.
    fn session_active(&self) -> bool;

    /// Starts a session, under `name` if given.
    fn start_session(&self, name: Option<&str>);

    /// Returns a copy of the session data.
    fn session_all(&self) -> Blob;

    fn session_get(&self, key: &Key) -> Option<Value>;

    fn session_set(&self, key: Key, value: Value);

    fn session_delete(&self, key: &Key);

    // ── Output ───────────────────────────────────────────────────────────────

    /// Returns `true` once output has started and headers can no longer be sent.
    fn headers_sent(&self) -> bool;

    /// Sends the response status line, e.g. `HTTP/1.1 200 OK`.
    fn send_status_line(&self, line: &str);

    /// Sends one header line. Repeated names are sent as separate lines.
    fn send_header(&self, name: &str, value: &str);

    /// Writes body bytes to the client.
    fn write_body(&self, body: &[u8]);
}
