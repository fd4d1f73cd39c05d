//! Status classification and body decoding.
//!
//! # Design
//! What happens to a successful body is decided once, up front, by the
//! [`DecodeTarget`] the caller passes: discard it (leave it unread), copy it
//! into a byte sink, or parse it as JSON. `Vec<u8>` is both writable and
//! deserializable; the variant chosen decides which it is treated as.

use std::io::Write;

use serde::de::DeserializeOwned;

use crate::error::{Error, HttpError, Result};
use crate::message::Response;

/// A destination a JSON body can be parsed into.
///
/// Implemented for every `DeserializeOwned` type. On failure the target is
/// left untouched.
pub trait JsonTarget {
    fn decode_json(&mut self, bytes: &[u8]) -> serde_json::Result<()>;
}

impl<T: DeserializeOwned> JsonTarget for T {
    fn decode_json(&mut self, bytes: &[u8]) -> serde_json::Result<()> {
        *self = serde_json::from_slice(bytes)?;
        Ok(())
    }
}

/// Where a successful response body goes.
pub enum DecodeTarget<'a> {
    /// Leave the body unread for the caller.
    Discard,
    /// Copy the body verbatim, without JSON parsing.
    Bytes(&'a mut dyn Write),
    /// Parse the body as JSON.
    Json(&'a mut dyn JsonTarget),
}

impl<'a> DecodeTarget<'a> {
    pub fn bytes(sink: &'a mut dyn Write) -> Self {
        DecodeTarget::Bytes(sink)
    }

    pub fn json(target: &'a mut dyn JsonTarget) -> Self {
        DecodeTarget::Json(target)
    }
}

/// Turn a response with a status outside 200..=299 into an [`HttpError`].
///
/// The error body is read in full. A failed read is not reported; the error
/// is built with an empty raw body instead.
pub fn check_response(mut response: Response) -> Result<Response> {
    if response.is_success() {
        return Ok(response);
    }

    let raw = match response.read_to_vec() {
        Ok(raw) => raw,
        Err(err) => {
            tracing::debug!(target: "jsonclient", status = response.status, err = %err, "discarding unreadable error body");
            Vec::new()
        }
    };
    Err(HttpError::new(
        response.status,
        response.method,
        response.url,
        response.headers,
        raw,
    )
    .into())
}

/// Route a successful response body into `target`.
///
/// `Discard` leaves the body unread. The other targets consume the body and
/// replace it with an in-memory copy. A JSON target given an empty or
/// whitespace-only body is left as it was.
pub(crate) fn decode_into(response: &mut Response, target: DecodeTarget<'_>) -> Result<()> {
    match target {
        DecodeTarget::Discard => Ok(()),
        DecodeTarget::Bytes(sink) => {
            let bytes = response.buffer_body().map_err(Error::Body)?;
            sink.write_all(&bytes).map_err(Error::Body)
        }
        DecodeTarget::Json(target) => {
            let bytes = response.buffer_body().map_err(Error::Body)?;
            if bytes.iter().all(u8::is_ascii_whitespace) {
                return Ok(());
            }
            target.decode_json(&bytes).map_err(Error::Decode)
        }
    }
}
