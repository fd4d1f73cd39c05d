//! Request and response values exchanged with the transport.
//!
//! # Design
//! `OutgoingRequest` is plain data: once `Client::new_request_with_context`
//! returns it the caller owns it and may adjust headers before executing.
//! `Response` keeps the request line it answers so that error rendering and
//! logging never need the request again. Its body is a reader; after the
//! client decodes a body it swaps in an in-memory copy so the caller can read
//! the same bytes again.

use std::fmt;
use std::io::{self, Cursor, Read};

use http::{HeaderMap, Method};

use crate::context::Context;

/// A fully built request, ready to hand to a [`Transport`](crate::Transport).
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub method: Method,
    /// Resolved URL. Absolute whenever a base URL is configured.
    pub url: String,
    pub headers: HeaderMap,
    /// Compact JSON, present only when a body was supplied.
    pub body: Option<Vec<u8>>,
    pub context: Context,
}

/// What a transport hands back for a request it managed to send.
pub struct TransportResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Box<dyn Read + Send>,
}

impl TransportResponse {
    /// A response whose body is held in memory.
    pub fn from_bytes(status: u16, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers,
            body: Box::new(Cursor::new(body.into())),
        }
    }
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Response metadata plus a readable body.
pub struct Response {
    pub status: u16,
    pub headers: HeaderMap,
    /// Method of the request this response answers.
    pub method: Method,
    /// URL of the request this response answers.
    pub url: String,
    body: Box<dyn Read + Send>,
}

impl Response {
    pub fn new(
        status: u16,
        headers: HeaderMap,
        method: Method,
        url: String,
        body: Box<dyn Read + Send>,
    ) -> Self {
        Self {
            status,
            headers,
            method,
            url,
            body,
        }
    }

    pub(crate) fn from_transport(raw: TransportResponse, request: &OutgoingRequest) -> Self {
        Self::new(
            raw.status,
            raw.headers,
            request.method.clone(),
            request.url.clone(),
            raw.body,
        )
    }

    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    pub fn body_mut(&mut self) -> &mut (dyn Read + Send) {
        &mut *self.body
    }

    pub fn into_body(self) -> Box<dyn Read + Send> {
        self.body
    }

    /// Read the rest of the body into memory.
    pub fn read_to_vec(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.body.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Read the body into memory and leave a replayable copy in its place.
    pub(crate) fn buffer_body(&mut self) -> io::Result<Vec<u8>> {
        let bytes = self.read_to_vec()?;
        self.body = Box::new(Cursor::new(bytes.clone()));
        Ok(bytes)
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("method", &self.method)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> Response {
        Response::new(
            status,
            HeaderMap::new(),
            Method::GET,
            "http://localhost/".to_string(),
            Box::new(Cursor::new(body.as_bytes().to_vec())),
        )
    }

    #[test]
    fn success_range_is_inclusive() {
        assert!(!response(199, "").is_success());
        assert!(response(200, "").is_success());
        assert!(response(299, "").is_success());
        assert!(!response(300, "").is_success());
    }

    #[test]
    fn buffered_body_can_be_read_again() {
        let mut resp = response(200, "payload");
        assert_eq!(resp.buffer_body().unwrap(), b"payload");
        assert_eq!(resp.read_to_vec().unwrap(), b"payload");
    }
}
