//! The request/response seam between the orchestrator and the backend.
//!
//! Every step talks to the backend through [`Transport`]. The production
//! implementation is [`crate::http::HttpTransport`]; tests substitute an
//! in-memory backend. A [`Session`] pairs a transport with the token obtained
//! at the start of the run so that no step can issue an unauthenticated call.

use crate::config::Credential;
use crate::error::Result;
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// Which backend service a read is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// Content management API (files, playlists, inventory).
    Api,
    /// Proof-of-play reporting API.
    Reporting,
}

/// Bearer token plus the tenant it is scoped to.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub access_token: String,
    pub tenant: String,
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("access_token", &"<redacted>")
            .field("tenant", &self.tenant)
            .finish()
    }
}

/// A single file part of a multipart upload.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Request body for a POST.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(Value),
    Multipart(FilePart),
}

/// Query string pairs, in order.
pub type Query<'a> = &'a [(&'a str, String)];

pub trait Transport {
    fn authenticate(&self, credential: &Credential) -> Result<SessionToken>;

    fn get(
        &self,
        token: &SessionToken,
        service: Service,
        path: &str,
        query: Query<'_>,
    ) -> Result<Value>;

    fn post(&self, token: &SessionToken, path: &str, query: Query<'_>, body: Body)
        -> Result<Value>;

    fn put(&self, token: &SessionToken, path: &str, body: &Value) -> Result<()>;

    fn delete(&self, token: &SessionToken, path: &str, body: Option<&Value>) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// An authenticated view of a transport for the duration of one run.
pub struct Session<'a, T: Transport + ?Sized> {
    transport: &'a T,
    token: SessionToken,
}

impl<'a, T: Transport + ?Sized> Session<'a, T> {
    pub fn new(transport: &'a T, token: SessionToken) -> Self {
        Self { transport, token }
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    pub fn get(&self, path: &str, query: Query<'_>) -> Result<Value> {
        debug!(path, "GET");
        self.transport.get(&self.token, Service::Api, path, query)
    }

    pub fn get_report(&self, path: &str, query: Query<'_>) -> Result<Value> {
        debug!(path, "GET (reporting)");
        self.transport
            .get(&self.token, Service::Reporting, path, query)
    }

    pub fn post(&self, path: &str, query: Query<'_>, body: Body) -> Result<Value> {
        debug!(path, "POST");
        self.transport.post(&self.token, path, query, body)
    }

    pub fn put(&self, path: &str, body: &Value) -> Result<()> {
        debug!(path, "PUT");
        self.transport.put(&self.token, path, body)
    }

    pub fn delete(&self, path: &str, body: Option<&Value>) -> Result<()> {
        debug!(path, "DELETE");
        self.transport.delete(&self.token, path, body)
    }
}
