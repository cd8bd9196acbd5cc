//! # hostbridge
//!
//! A thin request/response facade over HTTP state that a host environment
//! has already parsed: server parameters, query and body parameters,
//! cookies, uploads, and the session.
//!
//! There is no networking and no parsing here. A [`Host`](host::Host)
//! supplies the ambient state and receives the output; a [`Request`] wraps
//! it in uniform key/value containers; a [`Response`] is written back exactly
//! once.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::rc::Rc;
//! use hostbridge::host::MemoryHost;
//! use hostbridge::{Blob, Config, Request, Response};
//!
//! let server: Blob = [
//!     ("REQUEST_METHOD", "GET"),
//!     ("REQUEST_URI", "/hello?name=world"),
//!     ("QUERY_STRING", "name=world"),
//! ]
//! .into_iter()
//! .collect();
//! let query: Blob = [("name", "world")].into_iter().collect();
//! let host = Rc::new(
//!     MemoryHost::new()
//!         .with_server(server)
//!         .with_query(query),
//! );
//!
//! let request = Request::from_host(host.clone(), &Config::default());
//! assert_eq!(request.path_info(), "/hello");
//!
//! let name = request.query().get_str("name").unwrap_or("stranger");
//! let mut response = Response::new();
//! response.set_body(format!("Hello, {name}!")).unwrap();
//! response.finish(&request).unwrap();
//!
//! assert_eq!(host.output().body_text(), "Hello, world!");
//! ```

pub mod config;
pub mod host;
pub mod http;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use config::{Config, ConfigError};
pub use http::{
    Blob, CookieError, CookieStore, FileSet, Headers, Key, Method, Request, Response, ResponseError,
    SessionDirective, SessionError, SessionStore, StatusCode, Store, UploadedFile,
};
