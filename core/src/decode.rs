//! Decoders: strategies turning a response body into a typed value.
//!
//! # Design
//! The trait's provided `decode` handles everything shape-independent —
//! absent bodies, the no-content shape, body materialization and its I/O
//! error wrapping — then hands the text to `decode_text`. Implementations
//! therefore never manage the body resource themselves. [`RegexDecoder`]
//! covers the closed shape set the pattern hint supports; [`TextDecoder`]
//! is the trivial pass-through used as the fallback for void and
//! raw-response methods.

use std::collections::HashMap;

use regex::{Captures, Regex, RegexBuilder};

use crate::contract::ReturnShape;
use crate::error::Error;
use crate::http::{Request, Response};

/// Group order used when a regex hint does not select groups explicitly.
const DEFAULT_GROUPS: [usize; 3] = [1, 2, 3];

/// A decoded method result, one variant per declared return shape.
#[derive(Debug)]
pub enum Decoded {
    /// Absent value: void methods, or a scalar pattern that did not match.
    None,
    Text(String),
    List(Vec<String>),
    Map(HashMap<String, String>),
    MultiMap(Vec<(String, String)>),
    Table(HashMap<(String, String), String>),
    Uri(String),
    Raw(Response),
}

impl Decoded {
    pub fn is_none(&self) -> bool {
        matches!(self, Decoded::None)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Decoded::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_uri(&self) -> Option<&str> {
        match self {
            Decoded::Uri(uri) => Some(uri),
            _ => None,
        }
    }

    pub fn into_list(self) -> Option<Vec<String>> {
        match self {
            Decoded::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn into_map(self) -> Option<HashMap<String, String>> {
        match self {
            Decoded::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn into_multimap(self) -> Option<Vec<(String, String)>> {
        match self {
            Decoded::MultiMap(pairs) => Some(pairs),
            _ => None,
        }
    }

    pub fn into_table(self) -> Option<HashMap<(String, String), String>> {
        match self {
            Decoded::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn into_response(self) -> Option<Response> {
        match self {
            Decoded::Raw(response) => Some(response),
            _ => None,
        }
    }
}

/// Converts a response body into a [`Decoded`] value.
pub trait Decoder: Send + Sync {
    /// Decodes `response` into the declared shape.
    ///
    /// The default takes care of the body resource: an absent body decodes
    /// to [`Decoded::None`], a no-content shape closes the body unread, and
    /// I/O failures while reading are wrapped with the request context.
    fn decode(
        &self,
        request: &Request,
        response: Response,
        shape: ReturnShape,
    ) -> Result<Decoded, Error> {
        if shape == ReturnShape::None {
            if let Some(body) = response.body {
                let _ = body.close();
            }
            return Ok(Decoded::None);
        }
        let Some(body) = response.body else {
            return Ok(Decoded::None);
        };
        let text = body.text().map_err(|e| Error::Reading {
            method: request.method.as_str().to_string(),
            url: request.url.clone(),
            cause: e.to_string(),
        })?;
        self.decode_text(request, &text, shape)
    }

    /// Converts the materialized body text into the declared shape.
    fn decode_text(
        &self,
        request: &Request,
        text: &str,
        shape: ReturnShape,
    ) -> Result<Decoded, Error>;
}

/// Returns the response body text unmodified.
pub struct TextDecoder;

impl Decoder for TextDecoder {
    fn decode_text(&self, _: &Request, text: &str, _: ReturnShape) -> Result<Decoded, Error> {
        Ok(Decoded::Text(text.to_string()))
    }
}

/// Decodes by running a pattern over the body and assembling capture
/// groups into the declared shape.
pub struct RegexDecoder {
    pattern: Regex,
    groups: Vec<usize>,
    shape: ReturnShape,
}

impl RegexDecoder {
    /// Compiles `pattern` (dot matches newline, as body text spans lines)
    /// and validates it against the shape it must produce.
    pub fn new(pattern: &str, groups: &[usize], shape: ReturnShape) -> Result<Self, Error> {
        if !shape.regex_supported() {
            return Err(Error::Decode(format!(
                "a regex decoder cannot produce a {shape} return shape"
            )));
        }
        let groups = if groups.is_empty() {
            DEFAULT_GROUPS.to_vec()
        } else {
            groups.to_vec()
        };
        let required = match shape {
            ReturnShape::Map | ReturnShape::MultiMap => 2,
            ReturnShape::Table => 3,
            _ => 1,
        };
        if groups.len() < required {
            return Err(Error::Decode(format!(
                "a {shape} shape needs {required} group indices, got {}",
                groups.len()
            )));
        }
        let pattern = RegexBuilder::new(pattern)
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| Error::Decode(format!("invalid pattern: {e}")))?;
        Ok(Self {
            pattern,
            groups,
            shape,
        })
    }
}

impl Decoder for RegexDecoder {
    fn decode_text(&self, _: &Request, text: &str, _: ReturnShape) -> Result<Decoded, Error> {
        match self.shape {
            ReturnShape::Scalar => Ok(self
                .pattern
                .captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| Decoded::Text(m.as_str().to_string()))
                .unwrap_or(Decoded::None)),
            ReturnShape::List => {
                let mut list = Vec::new();
                for caps in self.pattern.captures_iter(text) {
                    let group_count = caps.len() - 1;
                    for &group in self.groups.iter().take(group_count) {
                        if let Some(m) = caps.get(group) {
                            list.push(m.as_str().to_string());
                        }
                    }
                }
                Ok(Decoded::List(list))
            }
            ReturnShape::Map => {
                let mut map = HashMap::new();
                for caps in self.pattern.captures_iter(text) {
                    map.insert(
                        group_text(&caps, self.groups[0])?,
                        group_text(&caps, self.groups[1])?,
                    );
                }
                Ok(Decoded::Map(map))
            }
            ReturnShape::MultiMap => {
                let mut pairs = Vec::new();
                for caps in self.pattern.captures_iter(text) {
                    pairs.push((
                        group_text(&caps, self.groups[0])?,
                        group_text(&caps, self.groups[1])?,
                    ));
                }
                Ok(Decoded::MultiMap(pairs))
            }
            ReturnShape::Table => {
                let mut table = HashMap::new();
                for caps in self.pattern.captures_iter(text) {
                    table.insert(
                        (
                            group_text(&caps, self.groups[0])?,
                            group_text(&caps, self.groups[1])?,
                        ),
                        group_text(&caps, self.groups[2])?,
                    );
                }
                Ok(Decoded::Table(table))
            }
            shape => Err(Error::Decode(format!(
                "a regex decoder cannot produce a {shape} return shape"
            ))),
        }
    }
}

fn group_text(caps: &Captures<'_>, group: usize) -> Result<String, Error> {
    caps.get(group)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::Decode(format!("capture group {group} did not participate in match")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Body, Method};

    fn request() -> Request {
        Request {
            method_key: "Iam#arn()".to_string(),
            method: Method::Get,
            url: "https://iam.amazonaws.com/".to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    fn response(body: &str) -> Response {
        Response {
            status: 200,
            reason: "OK".to_string(),
            headers: Vec::new(),
            body: Some(Body::from(body)),
        }
    }

    #[test]
    fn scalar_returns_first_group_of_first_match() {
        let decoder = RegexDecoder::new("<Arn>([^<]+)</Arn>", &[], ReturnShape::Scalar).unwrap();
        let decoded = decoder
            .decode(
                &request(),
                response("<User><Arn>arn:aws:api::123:root</Arn></User>"),
                ReturnShape::Scalar,
            )
            .unwrap();
        assert_eq!(decoded.as_text(), Some("arn:aws:api::123:root"));
    }

    #[test]
    fn scalar_without_match_is_absent_not_an_error() {
        let decoder = RegexDecoder::new("<Arn>([^<]+)</Arn>", &[], ReturnShape::Scalar).unwrap();
        let decoded = decoder
            .decode(&request(), response("<ResponseMetadata/>"), ReturnShape::Scalar)
            .unwrap();
        assert!(decoded.is_none());
    }

    #[test]
    fn list_preserves_match_order() {
        let decoder = RegexDecoder::new("/REST/Zone/([^/]+)/", &[], ReturnShape::List).unwrap();
        let body = r#"{"data": ["/REST/Zone/zone1.denominator.io/", "/REST/Zone/zone2.denominator.io/"]}"#;
        let decoded = decoder
            .decode(&request(), response(body), ReturnShape::List)
            .unwrap();
        assert_eq!(
            decoded.into_list().unwrap(),
            vec!["zone1.denominator.io", "zone2.denominator.io"]
        );
    }

    #[test]
    fn list_without_matches_is_empty_not_an_error() {
        let decoder = RegexDecoder::new("/REST/Zone/([^/]+)/", &[], ReturnShape::List).unwrap();
        let decoded = decoder
            .decode(&request(), response(r#"{"data": []}"#), ReturnShape::List)
            .unwrap();
        assert_eq!(decoded.into_list().unwrap(), Vec::<String>::new());
    }

    #[test]
    fn map_keeps_the_last_duplicate_key() {
        let decoder =
            RegexDecoder::new("zoneName=\"([^\"]+)\" zoneId=\"([^\"]+)\"", &[], ReturnShape::Map)
                .unwrap();
        let body = "zoneName=\"a\" zoneId=\"1\" zoneName=\"a\" zoneId=\"2\"";
        let map = decoder
            .decode(&request(), response(body), ReturnShape::Map)
            .unwrap()
            .into_map()
            .unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["a"], "2");
    }

    #[test]
    fn multimap_preserves_duplicate_keys_in_order() {
        let decoder = RegexDecoder::new(
            "<Id>([^<]+)</Id>\\s*<Name>([^<]+)</Name>",
            &[2, 1],
            ReturnShape::MultiMap,
        )
        .unwrap();
        let body = "<Id>Z1</Id> <Name>a.io.</Name> <Id>Z2</Id> <Name>a.io.</Name>";
        let pairs = decoder
            .decode(&request(), response(body), ReturnShape::MultiMap)
            .unwrap()
            .into_multimap()
            .unwrap();
        assert_eq!(
            pairs,
            vec![
                ("a.io.".to_string(), "Z1".to_string()),
                ("a.io.".to_string(), "Z2".to_string()),
            ]
        );
    }

    #[test]
    fn table_reorders_groups_and_collapses_duplicates() {
        let decoder = RegexDecoder::new(
            "Type=\"([0-9]+)\" DName=\"([^\"]+)\" Guid=\"([0-9A-F]+)\"",
            &[3, 2, 1],
            ReturnShape::Table,
        )
        .unwrap();
        let body = concat!(
            "Type=\"1\" DName=\"a.io.\" Guid=\"AB\" ",
            "Type=\"28\" DName=\"b.io.\" Guid=\"CD\" ",
            "Type=\"2\" DName=\"a.io.\" Guid=\"AB\"",
        );
        let table = decoder
            .decode(&request(), response(body), ReturnShape::Table)
            .unwrap()
            .into_table()
            .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[&("AB".to_string(), "a.io.".to_string())], "2");
        assert_eq!(table[&("CD".to_string(), "b.io.".to_string())], "28");
    }

    #[test]
    fn pattern_spans_lines() {
        let decoder = RegexDecoder::new("<Id>(.+?)</Id>", &[], ReturnShape::Scalar).unwrap();
        let decoded = decoder
            .decode(&request(), response("<Id>Z1\nPA6</Id>"), ReturnShape::Scalar)
            .unwrap();
        assert_eq!(decoded.as_text(), Some("Z1\nPA6"));
    }

    #[test]
    fn absent_body_decodes_to_absent_value() {
        let decoder = RegexDecoder::new("<Arn>([^<]+)</Arn>", &[], ReturnShape::Scalar).unwrap();
        let empty = Response {
            status: 200,
            reason: "OK".to_string(),
            headers: Vec::new(),
            body: None,
        };
        assert!(decoder
            .decode(&request(), empty, ReturnShape::Scalar)
            .unwrap()
            .is_none());
    }

    #[test]
    fn unsupported_shape_is_rejected_at_construction() {
        assert!(RegexDecoder::new("(x)", &[], ReturnShape::Raw).is_err());
    }

    #[test]
    fn table_shape_requires_three_groups() {
        assert!(RegexDecoder::new("(x)", &[1], ReturnShape::Table).is_err());
    }

    #[test]
    fn invalid_pattern_is_rejected_at_construction() {
        assert!(RegexDecoder::new("(unclosed", &[], ReturnShape::Scalar).is_err());
    }

    #[test]
    fn text_decoder_passes_the_body_through() {
        let decoded = TextDecoder
            .decode(&request(), response("raw payload"), ReturnShape::Scalar)
            .unwrap();
        assert_eq!(decoded.as_text(), Some("raw payload"));
    }
}
