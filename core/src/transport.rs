//! The seam between the client and the HTTP implementation that moves bytes.
//!
//! # Design
//! The client never opens sockets itself. It hands each `OutgoingRequest` to a
//! `Transport` and classifies whatever comes back. `UreqTransport` is the
//! default; tests and callers with their own agent plug in through
//! `Client::with_transport`.
//!
//! Connection pooling, TLS and redirects belong to the transport. Many
//! threads may call `execute` on one shared transport at the same time.

use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::error::TransportError;
use crate::message::{OutgoingRequest, TransportResponse};

/// Executes one request, blocking until the response head arrives.
///
/// Implementations must honor `request.context`: they should refuse to send
/// once it is done and must not outlive its deadline. Any status code is a
/// successful execution; only failures to obtain a response are errors.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &OutgoingRequest) -> Result<TransportResponse, TransportError>;
}

/// How often an in-flight call re-checks its context.
const CONTEXT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// [`Transport`] backed by a `ureq::Agent`.
///
/// The agent is configured so 4xx/5xx responses are returned as data rather
/// than `Err`, leaving status interpretation to the client. The context
/// deadline becomes the agent's global timeout for the call, and a call whose
/// context is cancelled while waiting returns immediately with the context's
/// reason.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Use a caller-configured agent. It must have `http_status_as_error`
    /// disabled or error responses will surface as transport failures.
    pub fn from_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }

    fn send<B>(&self, request: &OutgoingRequest, body: B) -> Result<TransportResponse, TransportError>
    where
        B: ureq::AsSendBody + Send + 'static,
    {
        let mut http_request = http::Request::builder()
            .method(request.method.clone())
            .uri(request.url.as_str())
            .body(body)
            .map_err(TransportError::new)?;
        *http_request.headers_mut() = request.headers.clone();

        let http_request = match request.context.remaining() {
            Some(remaining) => self
                .agent
                .configure_request(http_request)
                .timeout_global(Some(remaining))
                .build(),
            None => http_request,
        };

        // The blocking call runs on its own thread so the context can be
        // watched while it is in flight. A cancelled call's thread is left to
        // finish on its own; its result is dropped.
        let agent = self.agent.clone();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = agent
                .run(http_request)
                .map(|response| {
                    let (parts, body) = response.into_parts();
                    TransportResponse {
                        status: parts.status.as_u16(),
                        headers: parts.headers,
                        body: Box::new(body.into_reader()),
                    }
                })
                .map_err(TransportError::new);
            let _ = tx.send(result);
        });

        loop {
            match rx.recv_timeout(CONTEXT_POLL_INTERVAL) {
                Ok(result) => return result,
                Err(RecvTimeoutError::Timeout) => {
                    if let Some(err) = request.context.err() {
                        return Err(TransportError::new(err));
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(TransportError::new("transport worker exited without a response"));
                }
            }
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &OutgoingRequest) -> Result<TransportResponse, TransportError> {
        if let Some(err) = request.context.err() {
            return Err(TransportError::new(err));
        }
        match &request.body {
            Some(body) => self.send(request, body.clone()),
            None => self.send(request, ()),
        }
    }
}
