//! Optional request/response logging observers.
//!
//! A wire sees every outgoing request and every incoming response of the
//! handlers it is attached to. Logging a response requires reading its
//! body, so `wire_and_rebuffer_response` materializes a streamed body and
//! hands back a rebuffered response that remains decodable. [`NoOpWire`]
//! reports itself disabled and is never asked to rebuffer — with logging
//! off, streamed bodies flow to the decoder untouched.

use std::io;

use crate::http::{Body, Request, Response};

/// Observer of the wire traffic of a bound method.
pub trait Wire: Send + Sync {
    /// Whether this wire wants traffic at all. Handlers skip disabled wires
    /// entirely, preserving streaming semantics.
    fn enabled(&self) -> bool {
        true
    }

    /// Sink for one rendered line.
    fn log(&self, line: &str);

    /// Logs an outgoing request.
    fn wire_request(&self, request: &Request) {
        self.log(&format!(
            ">> {} {} HTTP/1.1",
            request.method, request.url
        ));
        for (name, value) in &request.headers {
            self.log(&format!(">> {name}: {value}"));
        }
        if let Some(body) = &request.body {
            self.log(">> ");
            self.log(&format!(">> {body}"));
        }
    }

    /// Logs an incoming response, materializing a streamed body so it can
    /// still be decoded afterwards.
    fn wire_and_rebuffer_response(&self, response: Response) -> io::Result<Response> {
        self.log(&format!(
            "<< HTTP/1.1 {} {}",
            response.status, response.reason
        ));
        for (name, value) in &response.headers {
            self.log(&format!("<< {name}: {value}"));
        }
        let Response {
            status,
            reason,
            headers,
            body,
        } = response;
        let body = match body {
            None => None,
            Some(body) => {
                self.log("<< ");
                let text = body.text()?;
                for line in text.lines() {
                    self.log(&format!("<< {line}"));
                }
                Some(Body::Text(text))
            }
        };
        Ok(Response {
            status,
            reason,
            headers,
            body,
        })
    }
}

/// Logging disabled. Handlers treat this wire as absent.
pub struct NoOpWire;

impl Wire for NoOpWire {
    fn enabled(&self) -> bool {
        false
    }

    fn log(&self, _: &str) {}

    fn wire_request(&self, _: &Request) {}

    fn wire_and_rebuffer_response(&self, response: Response) -> io::Result<Response> {
        Ok(response)
    }
}

/// Logs each line to standard error.
pub struct ErrorWire;

impl Wire for ErrorWire {
    fn log(&self, line: &str) {
        eprintln!("{line}");
    }
}

/// Logs each line through `tracing` at debug level.
pub struct LogWire;

impl Wire for LogWire {
    fn log(&self, line: &str) {
        tracing::debug!(target: "declient::wire", "{line}");
    }
}
