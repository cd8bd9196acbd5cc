//! Response builder and single-use finalization.
//!
//! A [`Response`] collects a status, headers, and a text body, then writes
//! them to the host exactly once through [`Response::finish`].

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::blob::scalar_to_string;
use super::session::value_kind;
use super::{Headers, Request, StatusCode};
use crate::config::Config;

const CONTENT_LENGTH: &str = "content-length";
const CONTENT_TYPE: &str = "content-type";

/// Errors produced while building or finishing a response.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResponseError {
    #[error("body content must be null or scalar, {found} given")]
    TypeMismatch { found: &'static str },

    #[error("status code must be a recognized status code, {code} is not")]
    InvalidStatus { code: u16 },

    #[error("the response has already finished")]
    AlreadyFinished,
}

/// An HTTP response that is written to the host once.
///
/// Defaults to `200 OK`, an empty body, and
/// `content-type: text/html; charset=utf-8`.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use hostbridge::host::MemoryHost;
/// use hostbridge::http::{Blob, Request, Response, ResponseError};
///
/// let host = Rc::new(MemoryHost::new());
/// let request = Request::new(host.clone(), Blob::new(), false.into());
///
/// let mut response = Response::new();
/// response.set_body("Hello, ").unwrap().write("world!").unwrap();
/// response.set_status(201).unwrap();
/// response.finish(&request).unwrap();
///
/// let output = host.output();
/// assert_eq!(output.status_line.as_deref(), Some("HTTP/1.1 201 Created"));
/// assert_eq!(output.header("content-length"), Some("13"));
/// assert_eq!(output.body_text(), "Hello, world!");
///
/// assert_eq!(response.finish(&request).unwrap_err(), ResponseError::AlreadyFinished);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    headers: Headers,
    body: String,
    finished: bool,
}

impl Response {
    /// Creates a `200 OK` HTML response with an empty body.
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    /// Creates a `200 OK` response with the configured default content type.
    pub fn with_config(config: &Config) -> Self {
        let mut headers = Headers::new();
        headers.set(CONTENT_TYPE, config.default_content_type.as_str());
        Self {
            status: StatusCode::Ok,
            headers,
            body: String::new(),
            finished: false,
        }
    }

    /// Creates a response from a body, a status code, and headers.
    ///
    /// # Errors
    ///
    /// - [`ResponseError::InvalidStatus`]: `status` is not a recognized code.
    /// - [`ResponseError::TypeMismatch`]: `body` is an array or object.
    pub fn with_parts(
        body: impl Into<Value>,
        status: u16,
        headers: Headers,
    ) -> Result<Self, ResponseError> {
        let status = StatusCode::try_from(status)?;
        let body = coerce(&body.into())?;
        Ok(Self {
            status,
            headers,
            body,
            finished: false,
        })
    }

    /// Sets a header in builder style, replacing any previous value.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Returns the current status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the current body text.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the header lines, in the order they will be sent.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the first value of a header (case-insensitive).
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Returns `true` once [`Response::finish`] has succeeded.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Replaces the body with the text form of a scalar; `null` clears it.
    ///
    /// # Errors
    ///
    /// [`ResponseError::TypeMismatch`] for arrays and objects. The body is
    /// left unchanged.
    pub fn set_body(&mut self, value: impl Into<Value>) -> Result<&mut Self, ResponseError> {
        self.body = coerce(&value.into())?;
        Ok(self)
    }

    /// Appends the text form of a scalar to the body.
    ///
    /// # Errors
    ///
    /// [`ResponseError::TypeMismatch`] for arrays and objects. The body is
    /// left unchanged.
    pub fn write(&mut self, value: impl Into<Value>) -> Result<&mut Self, ResponseError> {
        let text = coerce(&value.into())?;
        self.body.push_str(&text);
        Ok(self)
    }

    /// Sets a header, or removes it when `value` is `None`.
    pub fn set_header(&mut self, name: &str, value: Option<&str>) -> &mut Self {
        match value {
            Some(value) => self.headers.set(name, value),
            None => {
                self.headers.remove(name);
            }
        }
        self
    }

    /// Adds another header line, keeping existing lines with the same name.
    pub fn append_header(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.headers.append(name, value);
        self
    }

    /// # Errors
    ///
    /// [`ResponseError::InvalidStatus`] if `code` is not recognized; the
    /// current status is kept.
    pub fn set_status(&mut self, code: u16) -> Result<&mut Self, ResponseError> {
        self.status = StatusCode::try_from(code)?;
        Ok(self)
    }

    /// Returns `"<code> <reason>"` for the current status.
    pub fn status_message(&self) -> String {
        self.status.to_string()
    }

    /// Returns `"<code> <reason>"` for an arbitrary code.
    ///
    /// # Errors
    ///
    /// [`ResponseError::InvalidStatus`] if `code` is not recognized.
    pub fn status_message_for(code: u16) -> Result<String, ResponseError> {
        StatusCode::try_from(code).map(|status| status.to_string())
    }

    /// Writes the response to the request's host. Succeeds once per response.
    ///
    /// Sets `content-length` from the body, then applies the no-body rules:
    /// a `HEAD` request or a bodiless status (1xx, 204, 304) clears the body,
    /// and a bodiless status also drops `content-length` and `content-type`.
    /// Unless the host already started output, the status line and every
    /// header are sent first; the body is always written.
    ///
    /// # Errors
    ///
    /// [`ResponseError::AlreadyFinished`] on every call after the first. Nothing
    /// is written in that case.
    pub fn finish(&mut self, request: &Request) -> Result<&mut Self, ResponseError> {
        if self.finished {
            warn!(status = self.status.as_u16(), "response finished twice");
            return Err(ResponseError::AlreadyFinished);
        }

        self.headers
            .set(CONTENT_LENGTH, self.body.len().to_string());

        let bodiless = self.status.is_bodiless();
        if bodiless || request.is_head() {
            self.body.clear();
        }
        if bodiless {
            self.headers.remove(CONTENT_LENGTH);
            self.headers.remove(CONTENT_TYPE);
        }

        let host = request.host();
        if host.headers_sent() {
            warn!(status = self.status.as_u16(), "output already started, headers not sent");
        } else {
            host.send_status_line(&format!("{} {}", request.protocol(), self.status));
            for (name, value) in self.headers.iter() {
                host.send_header(name, value);
            }
        }
        host.write_body(self.body.as_bytes());

        self.finished = true;
        debug!(
            status = self.status.as_u16(),
            body_len = self.body.len(),
            "response finished"
        );
        Ok(self)
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

fn coerce(value: &Value) -> Result<String, ResponseError> {
    scalar_to_string(value).ok_or(ResponseError::TypeMismatch {
        found: value_kind(value),
    })
}
