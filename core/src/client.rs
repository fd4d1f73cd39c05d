//! Request building and execution against a JSON HTTP API.
//!
//! # Design
//! `Client` holds a snapshot of its options and a shared transport; it keeps
//! no mutable state between calls, so one client can be used from many
//! threads at once. Building a request is split from executing it: the
//! caller may inspect or adjust an `OutgoingRequest` in between.
//!
//! The base URL is validated lazily, each time a request is built, so a
//! misconfigured client surfaces `ConfigError` through
//! `new_request_with_context` rather than at construction.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::context::Context;
use crate::error::{BuildError, ConfigError, Error, Result};
use crate::message::{OutgoingRequest, Response};
use crate::response::{check_response, decode_into, DecodeTarget};
use crate::transport::{Transport, UreqTransport};

/// Header name to value.
pub type Headers = HashMap<String, String>;

/// Pass as the `body` argument to build a request without one.
pub const NO_BODY: Option<&()> = None;

const INVALID_CONTROL_CHARACTER: &str = "invalid control character in URL";

/// Client settings. Loadable from any serde format; every field defaults to
/// empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Absolute `http`/`https` URL ending in `/`, or empty to use request
    /// paths verbatim.
    pub base_url: String,
    /// Headers set on every request.
    pub headers: Headers,
}

/// JSON HTTP client.
#[derive(Clone)]
pub struct Client {
    base_url: String,
    default_headers: Headers,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("default_headers", &self.default_headers)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client that sends requests with a default [`UreqTransport`].
    pub fn new(options: ClientOptions) -> Self {
        Self::with_transport(options, Arc::new(UreqTransport::new()))
    }

    pub fn with_transport(options: ClientOptions, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: options.base_url,
            default_headers: options.headers,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn default_headers(&self) -> &Headers {
        &self.default_headers
    }

    /// Build a request for `path`, resolved against the base URL.
    ///
    /// `path` is a URL reference: `"my-resource?q=1"` is appended to the base
    /// URL's path, while `"/my-resource"` replaces it. An absolute `path` is
    /// only accepted when no base URL is configured.
    ///
    /// When `body` is given it is encoded as compact JSON and the request's
    /// `Content-Type` is set to `application/json`, overriding any default
    /// header of that name. Default header names are case-insensitive; two
    /// that differ only in case are rejected. The returned request carries
    /// `ctx`.
    pub fn new_request_with_context<B>(
        &self,
        ctx: &Context,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<OutgoingRequest>
    where
        B: Serialize + ?Sized,
    {
        let base = self.parse_base_url()?;
        let url = resolve(base.as_ref(), path)?;

        let body = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(BuildError::Encode)?;

        let mut headers = HeaderMap::with_capacity(self.default_headers.len() + 1);
        for (name, value) in &self.default_headers {
            let (header_name, header_value) = parse_header(name, value)?;
            if headers.contains_key(&header_name) {
                return Err(BuildError::DuplicateHeader(header_name.as_str().to_string()).into());
            }
            headers.insert(header_name, header_value);
        }
        if body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        tracing::debug!(target: "jsonclient", method = %method, url = %url, has_body = body.is_some(), "built request");

        Ok(OutgoingRequest {
            method,
            url,
            headers,
            body,
            context: ctx.clone(),
        })
    }

    /// [`new_request_with_context`](Self::new_request_with_context) with a
    /// background context.
    pub fn new_request<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<OutgoingRequest>
    where
        B: Serialize + ?Sized,
    {
        self.new_request_with_context(&Context::background(), method, path, body)
    }

    /// Send `request` and route a successful body into `target`.
    ///
    /// A status outside 200..=299 yields [`Error::Http`] and no response. A
    /// transport failure while the request's context is done yields
    /// [`Error::Cancelled`] with the context's reason. A JSON decode failure
    /// yields [`Error::Decode`] and discards the response.
    pub fn execute(&self, request: OutgoingRequest, target: DecodeTarget<'_>) -> Result<Response> {
        let raw = match self.transport.execute(&request) {
            Ok(raw) => raw,
            Err(err) => {
                let cancelled = request.context.err();
                tracing::debug!(target: "jsonclient", method = %request.method, url = %request.url, err = %err, cancelled = cancelled.is_some(), "request error");
                return Err(match cancelled {
                    Some(reason) => Error::Cancelled(reason),
                    None => Error::Transport(err),
                });
            }
        };

        tracing::debug!(target: "jsonclient", method = %request.method, url = %request.url, status = raw.status, "response received");

        let mut response = check_response(Response::from_transport(raw, &request))?;
        decode_into(&mut response, target)?;
        Ok(response)
    }

    /// Send `request` and parse a successful body as `T`.
    ///
    /// An empty body yields `T::default()`.
    pub fn execute_json<T>(&self, request: OutgoingRequest) -> Result<(Response, T)>
    where
        T: DeserializeOwned + Default,
    {
        let mut value = T::default();
        let response = self.execute(request, DecodeTarget::json(&mut value))?;
        Ok((response, value))
    }

    fn parse_base_url(&self) -> std::result::Result<Option<Url>, ConfigError> {
        if self.base_url.is_empty() {
            return Ok(None);
        }
        let invalid = |reason: String| ConfigError::InvalidUrl {
            url: self.base_url.clone(),
            reason,
        };
        if has_control_character(&self.base_url) {
            return Err(invalid(INVALID_CONTROL_CHARACTER.to_string()));
        }

        let url = Url::parse(&self.base_url).map_err(|err| match err {
            url::ParseError::RelativeUrlWithoutBase => ConfigError::NotAbsolute,
            other => invalid(other.to_string()),
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::UnsupportedScheme(url.scheme().to_string()));
        }
        if !url.path().ends_with('/') {
            return Err(ConfigError::MissingTrailingSlash);
        }
        Ok(Some(url))
    }
}

/// Resolve `path` against `base` with RFC 3986 reference resolution. Without
/// a base the path is used verbatim.
fn resolve(base: Option<&Url>, path: &str) -> std::result::Result<String, BuildError> {
    let invalid = |reason: String| BuildError::InvalidPath {
        path: path.to_string(),
        reason,
    };
    if has_control_character(path) {
        return Err(invalid(INVALID_CONTROL_CHARACTER.to_string()));
    }

    let is_absolute = match Url::parse(path) {
        Ok(_) => true,
        Err(url::ParseError::RelativeUrlWithoutBase) => false,
        Err(err) => return Err(invalid(err.to_string())),
    };

    match base {
        Some(_) if is_absolute => Err(BuildError::BothAbsolute),
        Some(base) => base
            .join(path)
            .map(String::from)
            .map_err(|err| invalid(err.to_string())),
        None => Ok(path.to_string()),
    }
}

fn has_control_character(s: &str) -> bool {
    s.bytes().any(|b| b < 0x20 || b == 0x7f)
}

fn parse_header(name: &str, value: &str) -> std::result::Result<(HeaderName, HeaderValue), BuildError> {
    let invalid = |reason: String| BuildError::InvalidHeader {
        name: name.to_string(),
        reason,
    };
    let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| invalid(err.to_string()))?;
    let header_value = HeaderValue::from_str(value).map_err(|err| invalid(err.to_string()))?;
    Ok((header_name, header_value))
}
