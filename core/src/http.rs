//! HTTP message types shared by the whole pipeline.
//!
//! # Design
//! `Request` is plain, owned, replayable data: the framework targets
//! text-based APIs, so the body is a `String` and a request can always be
//! rebuilt or logged without touching the transport. `Response` bodies may
//! instead arrive as a live stream; [`Body::text`] is the single place that
//! materializes one, and it guarantees the underlying stream is closed on
//! every exit path so decode failures cannot leak a connection.

use std::fmt;
use std::io::{self, Read};

/// HTTP method of a request. The parser accepts exactly one per method
/// declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A readable response-body stream with an explicit close step.
///
/// Implementations that hold a connection override `close`; in-memory
/// readers can rely on the default.
pub trait BodyReader: Read + Send {
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A response body: either already materialized text or a live stream.
pub enum Body {
    Text(String),
    Stream(Box<dyn BodyReader>),
}

impl Body {
    /// Reads the body to a string.
    ///
    /// For a streamed body the underlying reader is closed exactly once,
    /// whether the read succeeds or fails.
    pub fn text(self) -> io::Result<String> {
        match self {
            Body::Text(text) => Ok(text),
            Body::Stream(mut reader) => {
                let mut buf = String::new();
                let read = reader.read_to_string(&mut buf);
                let closed = reader.close();
                read?;
                closed?;
                Ok(buf)
            }
        }
    }

    /// Closes a streamed body without reading it.
    pub fn close(self) -> io::Result<()> {
        match self {
            Body::Text(_) => Ok(()),
            Body::Stream(mut reader) => reader.close(),
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, Body::Stream(_))
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Body::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

/// An immutable, fully resolved request ready for the transport.
///
/// `method_key` identifies the declared method that produced the request;
/// it exists for tracing and is excluded from equality.
#[derive(Debug, Clone)]
pub struct Request {
    pub method_key: String,
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl PartialEq for Request {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method
            && self.url == other.url
            && self.headers == other.headers
            && self.body == other.body
    }
}

impl Eq for Request {}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} HTTP/1.1", self.method, self.url)?;
        for (name, value) in &self.headers {
            writeln!(f, "{name}: {value}")?;
        }
        if let Some(body) = &self.body {
            write!(f, "\n{body}")?;
        }
        Ok(())
    }
}

/// An immutable response as handed back by the transport.
#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Body>,
}

impl Response {
    /// First value of a header, compared case-insensitively.
    pub fn first_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
