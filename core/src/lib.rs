//! Thin JSON client over a blocking HTTP transport.
//!
//! # Overview
//! [`Client`] resolves request paths against a base URL, encodes bodies as
//! compact JSON, applies default headers, sends the request through a
//! [`Transport`] and classifies the response: 2xx bodies are decoded into a
//! caller-chosen [`DecodeTarget`], anything else becomes an [`HttpError`]
//! carrying the raw body.
//!
//! ```no_run
//! use jsonclient::{Client, ClientOptions, NO_BODY};
//! use jsonclient::http::Method;
//!
//! #[derive(Default, serde::Deserialize)]
//! struct Message {
//!     message: String,
//! }
//!
//! # fn main() -> jsonclient::Result<()> {
//! let client = Client::new(ClientOptions {
//!     base_url: "https://api.example.com/v1/".to_string(),
//!     ..Default::default()
//! });
//! let request = client.new_request(Method::GET, "messages/1", NO_BODY)?;
//! let (_response, message) = client.execute_json::<Message>(request)?;
//! println!("{}", message.message);
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! - Building and executing are separate steps, so a request can be
//!   inspected or adjusted before it is sent.
//! - Every call carries a [`Context`]; when the transport fails after the
//!   context is done, the context's reason is reported instead.
//! - Errors are one enum with an [`ErrorKind`] per variant; nothing is
//!   retried or swallowed except an unreadable error body.

pub mod client;
pub mod context;
pub mod error;
pub mod message;
pub mod response;
pub mod transport;

pub use ::http;

pub use client::{Client, ClientOptions, Headers, NO_BODY};
pub use context::{CancelHandle, Context};
pub use error::{BuildError, ConfigError, ContextError, Error, ErrorKind, HttpError, Result, TransportError};
pub use message::{OutgoingRequest, Response, TransportResponse};
pub use response::{check_response, DecodeTarget, JsonTarget};
pub use transport::{Transport, UreqTransport};
