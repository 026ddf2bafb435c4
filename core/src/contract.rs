//! Declarative API contracts and their parsed per-method metadata.
//!
//! # Design
//! An [`Api`] is a statically registered table of method signatures built
//! with a fluent builder — the declarative equivalent of annotating an
//! interface. [`parse_and_validate`] runs once at binding time and turns
//! each signature into an immutable [`MethodMetadata`]: the stable method
//! key, the declared return shape, parameter-position roles, and a
//! pre-built [`RequestTemplate`] skeleton. Every validation failure here is
//! a contract error; a malformed declaration can never survive into a bound
//! client.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::Error;
use crate::http::Method;
use crate::template::RequestTemplate;

/// Shape of a decoded method result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnShape {
    /// No result; the response body is discarded.
    None,
    /// A single string (first regex match, or whatever the decoder yields).
    Scalar,
    /// Ordered list of strings.
    List,
    /// String-to-string mapping; duplicate keys keep the last value.
    Map,
    /// String-to-string mapping preserving duplicate keys in order.
    MultiMap,
    /// Three-column table keyed by (row, column); duplicates keep the last
    /// value.
    Table,
    /// A URI, extracted from the body or a `Location` header.
    Uri,
    /// The raw HTTP response, body unread.
    Raw,
}

impl ReturnShape {
    /// Shapes a regex decode pattern may produce.
    pub fn regex_supported(&self) -> bool {
        matches!(
            self,
            ReturnShape::Scalar
                | ReturnShape::List
                | ReturnShape::Map
                | ReturnShape::MultiMap
                | ReturnShape::Table
        )
    }
}

impl fmt::Display for ReturnShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReturnShape::None => "none",
            ReturnShape::Scalar => "scalar",
            ReturnShape::List => "list",
            ReturnShape::Map => "map",
            ReturnShape::MultiMap => "multimap",
            ReturnShape::Table => "table",
            ReturnShape::Uri => "uri",
            ReturnShape::Raw => "raw response",
        };
        f.write_str(name)
    }
}

/// Role of a declared parameter in the outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamRole {
    /// Substitutes a `{name}` placeholder in the path or body template.
    Path(String),
    /// Substitutes a `{name}` query placeholder appended to the template.
    Query(String),
    /// Substitutes a `{name}` header placeholder appended to the template.
    Header(String),
    /// A form field, handed to the form encoder.
    Form(String),
    /// Supplies the full base URL for this call, overriding the target's.
    Url,
    /// The raw request body, handed to the body encoder.
    Body,
}

/// A declared method parameter: its type name (part of the method key) and
/// one or more roles. A single argument may fill several placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSig {
    type_name: String,
    roles: Vec<ParamRole>,
}

impl ParamSig {
    pub fn path(name: &str) -> Self {
        Self::with_role(ParamRole::Path(name.to_string()), "String")
    }

    pub fn query(name: &str) -> Self {
        Self::with_role(ParamRole::Query(name.to_string()), "String")
    }

    pub fn header(name: &str) -> Self {
        Self::with_role(ParamRole::Header(name.to_string()), "String")
    }

    pub fn form(name: &str) -> Self {
        Self::with_role(ParamRole::Form(name.to_string()), "String")
    }

    pub fn url() -> Self {
        Self::with_role(ParamRole::Url, "Uri")
    }

    pub fn body() -> Self {
        Self::with_role(ParamRole::Body, "String")
    }

    /// Overrides the type name recorded in the method key.
    pub fn typed(mut self, type_name: &str) -> Self {
        self.type_name = type_name.to_string();
        self
    }

    /// Adds a second path placeholder filled by the same argument.
    pub fn and_path(mut self, name: &str) -> Self {
        self.roles.push(ParamRole::Path(name.to_string()));
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn roles(&self) -> &[ParamRole] {
        &self.roles
    }

    fn with_role(role: ParamRole, type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            roles: vec![role],
        }
    }
}

/// A declared API method: verb, path, hints, return shape, and parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSig {
    name: String,
    verbs: Vec<Method>,
    path: Option<String>,
    body_template: Option<String>,
    produces: Option<String>,
    consumes: Option<String>,
    decode_pattern: Option<String>,
    decode_groups: Vec<usize>,
    returns: ReturnShape,
    params: Vec<ParamSig>,
}

impl MethodSig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            verbs: Vec::new(),
            path: None,
            body_template: None,
            produces: None,
            consumes: None,
            decode_pattern: None,
            decode_groups: vec![1, 2, 3],
            returns: ReturnShape::None,
            params: Vec::new(),
        }
    }

    pub fn get(self) -> Self {
        self.verb(Method::Get)
    }

    pub fn post(self) -> Self {
        self.verb(Method::Post)
    }

    pub fn put(self) -> Self {
        self.verb(Method::Put)
    }

    pub fn delete(self) -> Self {
        self.verb(Method::Delete)
    }

    pub fn head(self) -> Self {
        self.verb(Method::Head)
    }

    pub fn patch(self) -> Self {
        self.verb(Method::Patch)
    }

    /// Records a verb marker. Declaring more than one is representable so
    /// the parser can reject it.
    pub fn verb(mut self, method: Method) -> Self {
        self.verbs.push(method);
        self
    }

    pub fn path(mut self, path: &str) -> Self {
        self.path = Some(path.to_string());
        self
    }

    /// Placeholder-bearing body template. Literal braces are written
    /// `%7B` / `%7D`; the template is percent-decoded after resolution.
    pub fn body_template(mut self, template: &str) -> Self {
        self.body_template = Some(template.to_string());
        self
    }

    /// Content type sent with the request (`Content-Type`).
    pub fn produces(mut self, content_type: &str) -> Self {
        self.produces = Some(content_type.to_string());
        self
    }

    /// Content type expected in the response (`Accept`).
    pub fn consumes(mut self, content_type: &str) -> Self {
        self.consumes = Some(content_type.to_string());
        self
    }

    /// Regex decode hint with the default group order `[1, 2, 3]`.
    pub fn regex(mut self, pattern: &str) -> Self {
        self.decode_pattern = Some(pattern.to_string());
        self
    }

    /// Regex decode hint selecting capture groups in an explicit order.
    pub fn regex_groups(mut self, pattern: &str, groups: &[usize]) -> Self {
        self.decode_pattern = Some(pattern.to_string());
        self.decode_groups = groups.to_vec();
        self
    }

    pub fn returns(mut self, shape: ReturnShape) -> Self {
        self.returns = shape;
        self
    }

    pub fn param(mut self, param: ParamSig) -> Self {
        self.params.push(param);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A named set of declared methods — the unit handed to `Binder::bind`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Api {
    name: String,
    methods: Vec<MethodSig>,
}

impl Api {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            methods: Vec::new(),
        }
    }

    pub fn method(mut self, sig: MethodSig) -> Self {
        self.methods.push(sig);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn methods(&self) -> &[MethodSig] {
        &self.methods
    }
}

/// Builds the stable method key `Type#method(ParamType,...)` from a static
/// signature. The key is the sole identity used for configuration lookup.
pub fn method_key(type_name: &str, method: &str, param_types: &[&str]) -> String {
    format!("{type_name}#{method}({})", param_types.join(","))
}

/// Class portion of a method key: everything before `#`.
pub fn class_key(method_or_class: &str) -> &str {
    match method_or_class.find('#') {
        Some(at) => &method_or_class[..at],
        None => method_or_class,
    }
}

/// Immutable per-method descriptor produced by [`parse_and_validate`].
///
/// Owned by the parse step and shared read-only by every handler bound to
/// the method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodMetadata {
    method_key: String,
    return_shape: ReturnShape,
    url_index: Option<usize>,
    body_index: Option<usize>,
    form_params: Vec<String>,
    index_to_name: BTreeMap<usize, Vec<String>>,
    decode_pattern: Option<String>,
    decode_groups: Vec<usize>,
    template: RequestTemplate,
    param_count: usize,
}

impl MethodMetadata {
    pub fn method_key(&self) -> &str {
        &self.method_key
    }

    pub fn return_shape(&self) -> ReturnShape {
        self.return_shape
    }

    /// Argument position supplying a full override URL, if declared.
    pub fn url_index(&self) -> Option<usize> {
        self.url_index
    }

    /// Argument position supplying the raw body, if declared.
    pub fn body_index(&self) -> Option<usize> {
        self.body_index
    }

    /// Form field names, in declaration order.
    pub fn form_params(&self) -> &[String] {
        &self.form_params
    }

    /// Argument position to placeholder names.
    pub fn index_to_name(&self) -> &BTreeMap<usize, Vec<String>> {
        &self.index_to_name
    }

    pub fn decode_pattern(&self) -> Option<&str> {
        self.decode_pattern.as_deref()
    }

    pub fn decode_groups(&self) -> &[usize] {
        &self.decode_groups
    }

    /// The pre-built request skeleton; copied before every resolution.
    pub fn template(&self) -> &RequestTemplate {
        &self.template
    }

    pub fn param_count(&self) -> usize {
        self.param_count
    }
}

/// Parses every declared method of `api`, failing fast on the first
/// malformed declaration.
pub fn parse_and_validate(api: &Api) -> Result<Vec<MethodMetadata>, Error> {
    api.methods()
        .iter()
        .map(|sig| parse_method(api.name(), sig))
        .collect()
}

fn parse_method(type_name: &str, sig: &MethodSig) -> Result<MethodMetadata, Error> {
    let param_types: Vec<&str> = sig.params.iter().map(|p| p.type_name()).collect();
    let key = method_key(type_name, &sig.name, &param_types);
    let contract_error = |reason: String| Error::Contract {
        method: key.clone(),
        reason,
    };

    let mut template = RequestTemplate::new();
    template.set_method_key(&key);

    match sig.verbs.as_slice() {
        [verb] => template.set_method(*verb),
        [] => return Err(contract_error("not annotated with an HTTP method".to_string())),
        [first, second, ..] => {
            return Err(contract_error(format!(
                "multiple HTTP methods: {first} and {second}"
            )))
        }
    }

    if let Some(pattern) = &sig.decode_pattern {
        if !pattern.contains('(') {
            return Err(contract_error(format!(
                "decode pattern requires a capture group, found: {pattern}"
            )));
        }
        if !sig.returns.regex_supported() {
            return Err(contract_error(format!(
                "decode pattern cannot produce a {} return shape",
                sig.returns
            )));
        }
    }

    if let Some(body) = &sig.body_template {
        template.set_body_template(body);
    }
    if let Some(path) = &sig.path {
        template.append(path);
    }
    if let Some(content_type) = &sig.produces {
        template.header("Content-Type", content_type);
    }
    if let Some(content_type) = &sig.consumes {
        template.header("Accept", content_type);
    }

    let mut url_index = None;
    let mut body_index = None;
    let mut form_params = Vec::new();
    let mut index_to_name: BTreeMap<usize, Vec<String>> = BTreeMap::new();

    for (index, param) in sig.params.iter().enumerate() {
        for role in param.roles() {
            match role {
                ParamRole::Path(name) => {
                    index_to_name.entry(index).or_default().push(name.clone());
                }
                ParamRole::Query(name) => {
                    template.query(name, &format!("{{{name}}}"));
                    index_to_name.entry(index).or_default().push(name.clone());
                }
                ParamRole::Header(name) => {
                    template.header(name, &format!("{{{name}}}"));
                    index_to_name.entry(index).or_default().push(name.clone());
                }
                ParamRole::Form(name) => {
                    if body_index.is_some() {
                        return Err(contract_error(
                            "form parameters cannot be combined with a body parameter"
                                .to_string(),
                        ));
                    }
                    form_params.push(name.clone());
                    index_to_name.entry(index).or_default().push(name.clone());
                }
                ParamRole::Url => url_index = Some(index),
                ParamRole::Body => {
                    if !form_params.is_empty() {
                        return Err(contract_error(
                            "a body parameter cannot be combined with form parameters"
                                .to_string(),
                        ));
                    }
                    if body_index.is_some() {
                        return Err(contract_error("too many body parameters".to_string()));
                    }
                    body_index = Some(index);
                }
            }
        }
    }

    Ok(MethodMetadata {
        method_key: key,
        return_shape: sig.returns,
        url_index,
        body_index,
        form_params,
        index_to_name,
        decode_pattern: sig.decode_pattern.clone(),
        decode_groups: sig.decode_groups.clone(),
        template,
        param_count: sig.params.len(),
    })
}
