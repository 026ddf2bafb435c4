//! Pluggable transport and its default blocking implementation.
//!
//! # Design
//! The framework never touches the network itself: everything upstream of
//! [`Client::execute`] builds plain-data requests, everything downstream
//! interprets plain-data responses. The default transport wraps a single
//! [`ureq::Agent`] with status-as-error disabled, so 4xx/5xx responses come
//! back as data and status interpretation stays in the method handler.
//! Redirect policy and timeouts are agent concerns, not the pipeline's.

use std::io;

use crate::http::{Body, Request, Response};

/// Executes requests against their URL. Implementations must be safe for
/// concurrent use; the pipeline adds no locking of its own.
pub trait Client: Send + Sync {
    /// Performs one network round-trip. The request is safe to replay, but
    /// this is never done here — transport errors surface immediately.
    fn execute(&self, request: &Request) -> io::Result<Response>;
}

/// Blocking transport backed by ureq.
pub struct UreqClient {
    agent: ureq::Agent,
}

impl UreqClient {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Client for UreqClient {
    fn execute(&self, request: &Request) -> io::Result<Response> {
        use crate::http::Method::*;

        let url = &request.url;
        let headers = &request.headers;
        let result = match (request.method, request.body.as_deref()) {
            (Get, _) => headers
                .iter()
                .fold(self.agent.get(url), |r, (k, v)| r.header(k.as_str(), v.as_str()))
                .call(),
            (Head, _) => headers
                .iter()
                .fold(self.agent.head(url), |r, (k, v)| r.header(k.as_str(), v.as_str()))
                .call(),
            (Delete, _) => headers
                .iter()
                .fold(self.agent.delete(url), |r, (k, v)| r.header(k.as_str(), v.as_str()))
                .call(),
            (Post, body) => {
                let builder = headers
                    .iter()
                    .fold(self.agent.post(url), |r, (k, v)| r.header(k.as_str(), v.as_str()));
                match body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
            (Put, body) => {
                let builder = headers
                    .iter()
                    .fold(self.agent.put(url), |r, (k, v)| r.header(k.as_str(), v.as_str()));
                match body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
            (Patch, body) => {
                let builder = headers
                    .iter()
                    .fold(self.agent.patch(url), |r, (k, v)| r.header(k.as_str(), v.as_str()));
                match body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(io::Error::other)?;
        let status = response.status().as_u16();
        let reason = response
            .status()
            .canonical_reason()
            .unwrap_or_default()
            .to_string();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(io::Error::other)?;
        let body = if text.is_empty() {
            None
        } else {
            Some(Body::Text(text))
        };
        Ok(Response {
            status,
            reason,
            headers,
            body,
        })
    }
}
