//! Error taxonomy for the JSON client.
//!
//! # Design
//! Every failure a call can produce is one variant of [`Error`], and every
//! variant maps to exactly one [`ErrorKind`]. Callers that only care about the
//! category ("was this any HTTP status failure?") match on the kind with
//! [`Error::is`] instead of walking a `source()` chain. Non-2xx responses carry
//! their raw body in [`HttpError`] so it can be rendered or decoded later.

use std::error::Error as StdError;
use std::fmt;
use std::io;

use http::{HeaderMap, Method};
use serde::de::DeserializeOwned;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The configured base URL is unusable.
    Config,
    /// The request could not be built from the path, body or headers.
    Build,
    /// The transport failed to produce a response.
    Transport,
    /// The call's context was cancelled or its deadline passed.
    Cancelled,
    /// The server answered with a status outside 200..=299.
    Http,
    /// A successful response body was not valid JSON for the target.
    Decode,
}

/// Errors returned by [`Client`](crate::Client) operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Cancelled(#[from] ContextError),

    #[error(transparent)]
    Http(Box<HttpError>),

    #[error(transparent)]
    Decode(serde_json::Error),

    /// Reading a successful response body, or writing it into a byte sink,
    /// failed part way.
    #[error("reading response body: {0}")]
    Body(#[source] io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Config,
            Error::Build(_) => ErrorKind::Build,
            Error::Transport(_) | Error::Body(_) => ErrorKind::Transport,
            Error::Cancelled(_) => ErrorKind::Cancelled,
            Error::Http(_) => ErrorKind::Http,
            Error::Decode(_) => ErrorKind::Decode,
        }
    }

    /// Returns true when this error belongs to `kind`.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }

    pub fn as_http(&self) -> Option<&HttpError> {
        match self {
            Error::Http(err) => Some(err),
            _ => None,
        }
    }

    pub fn into_http(self) -> Option<HttpError> {
        match self {
            Error::Http(err) => Some(*err),
            _ => None,
        }
    }
}

impl From<HttpError> for Error {
    fn from(err: HttpError) -> Self {
        Error::Http(Box::new(err))
    }
}

/// The base URL failed validation. Raised when a request is built, never when
/// the client is constructed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("parse {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("baseURL should be an absolute url")]
    NotAbsolute,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("BaseURL must end with a trailing slash")]
    MissingTrailingSlash,
}

/// The request could not be assembled.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("parse {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("baseURL and path cannot be both absolute")]
    BothAbsolute,

    #[error("encoding request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("invalid default header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("default header {0:?} given more than once")]
    DuplicateHeader(String),
}

/// Why a [`Context`](crate::Context) is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("context canceled")]
    Canceled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// A failure reported by a [`Transport`](crate::Transport).
///
/// Wraps whatever error the underlying HTTP implementation produced; its
/// display and source are those of the wrapped error.
#[derive(Debug)]
pub struct TransportError(Box<dyn StdError + Send + Sync + 'static>);

impl TransportError {
    pub fn new<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        Self(err.into())
    }

    pub fn get_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.0
    }

    pub fn into_inner(self) -> Box<dyn StdError + Send + Sync + 'static> {
        self.0
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

/// A response whose status fell outside 200..=299.
///
/// Holds the request line and response headers it was produced from, and the
/// response body as it was read at classification time. The body is empty
/// when the server sent none or when reading it failed.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub status_code: u16,
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    raw: Vec<u8>,
}

impl HttpError {
    pub(crate) fn new(
        status_code: u16,
        method: Method,
        url: String,
        headers: HeaderMap,
        raw: Vec<u8>,
    ) -> Self {
        Self {
            status_code,
            method,
            url,
            headers,
            raw,
        }
    }

    /// The raw response body captured when the error was created.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Decode the captured body as JSON. Can be called any number of times.
    pub fn decode_raw_as<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.raw)
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.method, self.url, self.status_code)?;
        if !self.raw.is_empty() {
            write!(f, " - {}", String::from_utf8_lossy(&self.raw))?;
        }
        Ok(())
    }
}

impl StdError for HttpError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn http_error(status: u16, raw: &str) -> HttpError {
        HttpError::new(
            status,
            Method::from_bytes(b"METHOD").unwrap(),
            "/request-url".to_string(),
            HeaderMap::new(),
            raw.as_bytes().to_vec(),
        )
    }

    #[test]
    fn http_error_renders_body_when_present() {
        let err = http_error(300, r#"{"message":"error"}"#);
        assert_eq!(err.to_string(), r#"METHOD /request-url: 300 - {"message":"error"}"#);
    }

    #[test]
    fn http_error_omits_delimiter_for_empty_body() {
        let err = http_error(300, "");
        assert_eq!(err.to_string(), "METHOD /request-url: 300");
    }

    #[test]
    fn decode_raw_as_is_repeatable() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Body {
            message: String,
        }

        let err = http_error(404, r#"{"message":"Not Found"}"#);
        let first: Body = err.decode_raw_as().unwrap();
        let second: Body = err.decode_raw_as().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.message, "Not Found");
        assert_eq!(err.raw(), br#"{"message":"Not Found"}"#);
    }

    #[test]
    fn decode_raw_as_fails_on_empty_body() {
        let err = http_error(500, "");
        assert!(err.decode_raw_as::<serde_json::Value>().is_err());
    }

    #[test]
    fn kinds_map_one_to_one() {
        let err: Error = http_error(500, "").into();
        assert!(err.is(ErrorKind::Http));
        assert!(!err.is(ErrorKind::Transport));
        assert_eq!(err.as_http().map(|e| e.status_code), Some(500));

        let err: Error = ContextError::Canceled.into();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(err.to_string(), "context canceled");

        let err = Error::Body(io::Error::new(io::ErrorKind::UnexpectedEof, "eof"));
        assert_eq!(err.kind(), ErrorKind::Transport);

        let err: Error = ConfigError::MissingTrailingSlash.into();
        assert_eq!(err.to_string(), "BaseURL must end with a trailing slash");
        assert!(err.into_http().is_none());
    }

    #[test]
    fn transport_error_displays_wrapped_error() {
        let err = TransportError::new(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        assert_eq!(err.to_string(), "refused");
        assert_eq!(Error::from(err).kind(), ErrorKind::Transport);
    }
}
