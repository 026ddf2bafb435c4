//! Error types for the binding framework.
//!
//! # Design
//! One enum covers both binding-time failures (`Contract`, `MissingConfig`)
//! and call-time failures (`Argument`, `Execution`, `Status`, `Reading`,
//! `Decode`, `Encode`). Binding-time variants abort `Binder::bind` before any
//! client object exists; call-time variants carry the request method and URL
//! so a failure can be traced back to the wire. No variant is ever retried —
//! a call performs at most one network execution.

use std::fmt;

/// Errors raised while binding an API contract or invoking a bound method.
#[derive(Debug)]
pub enum Error {
    /// The method declaration is malformed: missing or duplicate verb,
    /// invalid decode pattern, conflicting body/form parameters.
    Contract { method: String, reason: String },

    /// No decoder or encoder registered under the method key or its class
    /// key.
    MissingConfig {
        method_key: String,
        class_key: String,
        component: &'static str,
    },

    /// Wrong number of call arguments, an absent required argument, or an
    /// unknown method name.
    Argument(String),

    /// The transport failed before a response was received.
    Execution {
        method: String,
        url: String,
        cause: String,
    },

    /// The server answered with a non-2xx status. `content` holds a
    /// best-effort text snippet of the response body.
    Status {
        status: u16,
        method: String,
        url: String,
        content: Option<String>,
    },

    /// I/O failure while reading a response body.
    Reading {
        method: String,
        url: String,
        cause: String,
    },

    /// A 2xx response body could not be converted into the declared shape.
    Decode(String),

    /// The request payload could not be serialized.
    Encode(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Contract { method, reason } => {
                write!(f, "invalid contract for {method}: {reason}")
            }
            Error::MissingConfig {
                method_key,
                class_key,
                component,
            } => {
                write!(f, "no {component} configured for {method_key} or {class_key}")
            }
            Error::Argument(msg) => write!(f, "invalid argument: {msg}"),
            Error::Execution { method, url, cause } => {
                write!(f, "error {cause} executing {method} {url}")
            }
            Error::Status {
                status,
                method,
                url,
                content,
            } => {
                write!(f, "status {status} reading {method} {url}")?;
                if let Some(content) = content {
                    write!(f, "; content:\n{content}")?;
                }
                Ok(())
            }
            Error::Reading { method, url, cause } => {
                write!(f, "error {cause} reading {method} {url}")
            }
            Error::Decode(msg) => write!(f, "decode failed: {msg}"),
            Error::Encode(msg) => write!(f, "encode failed: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
