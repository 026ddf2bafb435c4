//! Parameterized request templates and placeholder resolution.
//!
//! # Design
//! A `RequestTemplate` is built once while parsing a contract and then
//! shared, read-only, by every call to that method. `resolve` is
//! copy-on-write: it returns a new template with every `{name}` occurrence
//! substituted, leaving the parsed skeleton untouched so concurrent calls
//! never observe each other. URL and query substitutions are
//! percent-encoded; header substitutions are not. A resolved body template
//! is percent-decoded afterwards, which is why literal braces in declared
//! bodies are written `%7B` / `%7D` — they must not collide with
//! placeholder syntax.

use std::collections::HashMap;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::error::Error;
use crate::http::{Method, Request};

/// Characters escaped when a placeholder value lands in a URL path or query.
const URL_ENCODE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A parameterized HTTP request prior to resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestTemplate {
    method_key: String,
    method: Option<Method>,
    url: String,
    queries: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<String>,
    body_template: Option<String>,
}

impl RequestTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method_key(&self) -> &str {
        &self.method_key
    }

    pub fn set_method_key(&mut self, key: &str) {
        self.method_key = key.to_string();
    }

    pub fn method(&self) -> Option<Method> {
        self.method
    }

    pub fn set_method(&mut self, method: Method) {
        self.method = Some(method);
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Ordered query entries; values may still contain placeholders.
    pub fn queries(&self) -> &[(String, String)] {
        &self.queries
    }

    /// Ordered header entries; values may still contain placeholders.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn body_template(&self) -> Option<&str> {
        self.body_template.as_deref()
    }

    /// Appends a literal path fragment. A `?name=value&...` suffix is split
    /// off into query entries.
    pub fn append(&mut self, path: &str) {
        match path.split_once('?') {
            Some((path, query)) => {
                self.url.push_str(path);
                for pair in query.split('&').filter(|p| !p.is_empty()) {
                    match pair.split_once('=') {
                        Some((name, value)) => self.query(name, value),
                        None => self.query(pair, ""),
                    }
                }
            }
            None => self.url.push_str(path),
        }
    }

    /// Inserts literal text into the URL at `position`. Targets use
    /// `insert(0, base_url)` to prefix the path; a full-URL-override
    /// argument does the same before resolution.
    pub fn insert(&mut self, position: usize, value: &str) {
        self.url.insert_str(position, value);
    }

    /// Appends a query entry. The same name may appear multiple times;
    /// order is preserved.
    pub fn query(&mut self, name: &str, value: &str) {
        self.queries.push((name.to_string(), value.to_string()));
    }

    /// Appends a header entry. The same name may appear multiple times;
    /// order is preserved.
    pub fn header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    /// Sets the literal request body, as an encoder would.
    pub fn set_body(&mut self, body: &str) {
        self.body = Some(body.to_string());
    }

    /// Sets the placeholder-bearing body template declared on the method.
    pub fn set_body_template(&mut self, template: &str) {
        self.body_template = Some(template.to_string());
    }

    /// Substitutes every `{name}` occurrence against `variables`, returning
    /// a new template. Placeholders without a bound variable are left
    /// intact, never dropped.
    pub fn resolve(&self, variables: &HashMap<String, String>) -> RequestTemplate {
        let mut resolved = self.clone();
        resolved.url = expand(&self.url, variables, true);
        resolved.queries = self
            .queries
            .iter()
            .map(|(name, value)| (name.clone(), expand(value, variables, true)))
            .collect();
        resolved.headers = self
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), expand(value, variables, false)))
            .collect();
        if let Some(template) = &self.body_template {
            let expanded = expand(template, variables, false);
            resolved.body = Some(
                percent_decode_str(&expanded)
                    .decode_utf8_lossy()
                    .into_owned(),
            );
        }
        resolved
    }

    /// Finalizes into an immutable [`Request`], assembling the query string.
    pub fn into_request(self) -> Result<Request, Error> {
        let method = self.method.ok_or_else(|| Error::Contract {
            method: self.method_key.clone(),
            reason: "no HTTP method set".to_string(),
        })?;
        let mut url = self.url;
        if !self.queries.is_empty() {
            url.push('?');
            let joined = self
                .queries
                .iter()
                .map(|(name, value)| {
                    if value.is_empty() {
                        name.clone()
                    } else {
                        format!("{name}={value}")
                    }
                })
                .collect::<Vec<_>>()
                .join("&");
            url.push_str(&joined);
        }
        Ok(Request {
            method_key: self.method_key,
            method,
            url,
            headers: self.headers,
            body: self.body,
        })
    }
}

/// Replaces each `{name}` with its bound value. Only the substituted value
/// is encoded; surrounding literal text and unresolved placeholders pass
/// through untouched.
fn expand(input: &str, variables: &HashMap<String, String>, encode: bool) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open..];
        match after.find('}') {
            Some(close) => {
                let name = &after[1..close];
                match variables.get(name) {
                    Some(value) if encode => {
                        out.push_str(&utf8_percent_encode(value, URL_ENCODE).to_string());
                    }
                    Some(value) => out.push_str(value),
                    None => out.push_str(&after[..=close]),
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(after);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}
