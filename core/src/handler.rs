//! Per-method call pipeline: arguments to template to request to decoded
//! value.
//!
//! # Design
//! One `MethodHandler` is built per declared method at binding time and
//! shared across calls; the only mutable state per call is the freshly
//! resolved template copy and the resulting request/response. A call
//! performs at most one network execution — transport failures, non-2xx
//! statuses, and decode failures are classified and raised immediately,
//! never retried.

use std::collections::HashMap;
use std::sync::Arc;

use crate::client::Client;
use crate::contract::{MethodMetadata, ReturnShape};
use crate::decode::{Decoded, Decoder};
use crate::encode::{BodyEncoder, FormEncoder};
use crate::error::Error;
use crate::http::{Request, Response};
use crate::target::Target;
use crate::template::RequestTemplate;
use crate::wire::Wire;

/// A call argument. Named substitutions use the argument's string form;
/// `None` marks an absent value, which leaves its placeholders unresolved
/// and is rejected for required body/URL positions.
#[derive(Debug, Clone)]
pub enum Arg {
    Str(String),
    Json(serde_json::Value),
    None,
}

impl Arg {
    /// Builds a JSON argument from any serializable value.
    pub fn json_of<T: serde::Serialize>(value: &T) -> Result<Arg, Error> {
        serde_json::to_value(value)
            .map(Arg::Json)
            .map_err(|e| Error::Encode(e.to_string()))
    }

    /// String form used for placeholder substitution.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Arg::Str(text) => Some(text.clone()),
            Arg::Json(value) => Some(value.to_string()),
            Arg::None => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Arg::None)
    }
}

impl From<&str> for Arg {
    fn from(text: &str) -> Self {
        Arg::Str(text.to_string())
    }
}

impl From<String> for Arg {
    fn from(text: String) -> Self {
        Arg::Str(text)
    }
}

impl From<serde_json::Value> for Arg {
    fn from(value: serde_json::Value) -> Self {
        Arg::Json(value)
    }
}

/// How call arguments become a resolved template. Selected at binding time;
/// the three paths are mutually exclusive by contract validation.
pub(crate) enum TemplateStrategy {
    Plain,
    Form(Arc<dyn FormEncoder>),
    Body(Arc<dyn BodyEncoder>),
}

/// Executes calls for one declared method.
pub struct MethodHandler {
    target: Arc<dyn Target>,
    client: Arc<dyn Client>,
    wire: Arc<dyn Wire>,
    metadata: Arc<MethodMetadata>,
    strategy: TemplateStrategy,
    decoder: Arc<dyn Decoder>,
}

impl MethodHandler {
    pub(crate) fn new(
        target: Arc<dyn Target>,
        client: Arc<dyn Client>,
        wire: Arc<dyn Wire>,
        metadata: Arc<MethodMetadata>,
        strategy: TemplateStrategy,
        decoder: Arc<dyn Decoder>,
    ) -> Self {
        Self {
            target,
            client,
            wire,
            metadata,
            strategy,
            decoder,
        }
    }

    /// Runs the full pipeline for one call.
    pub fn invoke(&self, args: &[Arg]) -> Result<Decoded, Error> {
        let template = self.build_template(args)?;
        self.execute_and_decode(template)
    }

    fn build_template(&self, args: &[Arg]) -> Result<RequestTemplate, Error> {
        let md = &self.metadata;
        if args.len() != md.param_count() {
            return Err(Error::Argument(format!(
                "{} takes {} arguments, got {}",
                md.method_key(),
                md.param_count(),
                args.len()
            )));
        }

        let mut template = md.template().clone();

        if let Some(index) = md.url_index() {
            let url = args[index]
                .as_text()
                .ok_or_else(|| Error::Argument(format!("URL argument {index} was absent")))?;
            template.insert(0, &url);
        }

        let mut variables: HashMap<String, String> = HashMap::new();
        for (index, names) in md.index_to_name() {
            // absent arguments are skipped; their placeholders stay as-is
            if let Some(value) = args[*index].as_text() {
                for name in names {
                    variables.insert(name.clone(), value.clone());
                }
            }
        }

        match &self.strategy {
            TemplateStrategy::Plain => {}
            TemplateStrategy::Form(encoder) => {
                let form: Vec<(String, String)> = md
                    .form_params()
                    .iter()
                    .filter_map(|name| variables.get(name).map(|v| (name.clone(), v.clone())))
                    .collect();
                encoder.encode_form(&form, &mut template)?;
            }
            TemplateStrategy::Body(encoder) => {
                let index = md.body_index().ok_or_else(|| Error::Contract {
                    method: md.method_key().to_string(),
                    reason: "body strategy without a body parameter".to_string(),
                })?;
                if args[index].is_none() {
                    return Err(Error::Argument(format!(
                        "body argument {index} was absent"
                    )));
                }
                encoder.encode_body(&args[index], &mut template)?;
            }
        }

        Ok(template.resolve(&variables))
    }

    fn execute_and_decode(&self, template: RequestTemplate) -> Result<Decoded, Error> {
        let request = self.target.apply(template)?;

        if self.wire.enabled() {
            self.wire.wire_request(&request);
        }

        let mut response = self.client.execute(&request).map_err(|e| Error::Execution {
            method: request.method.as_str().to_string(),
            url: request.url.clone(),
            cause: e.to_string(),
        })?;

        if self.wire.enabled() {
            response = self
                .wire
                .wire_and_rebuffer_response(response)
                .map_err(|e| Error::Reading {
                    method: request.method.as_str().to_string(),
                    url: request.url.clone(),
                    cause: e.to_string(),
                })?;
        }

        if (200..300).contains(&response.status) {
            match self.metadata.return_shape() {
                ReturnShape::Raw => Ok(Decoded::Raw(response)),
                ReturnShape::Uri if response.body.is_none() => {
                    match response.first_header("Location") {
                        Some(location) => Ok(Decoded::Uri(location.to_string())),
                        None => self
                            .decoder
                            .decode(&request, response, ReturnShape::Uri),
                    }
                }
                shape => self.decoder.decode(&request, response, shape),
            }
        } else if self.metadata.return_shape() == ReturnShape::Uri
            && (300..400).contains(&response.status)
            && response.body.is_none()
        {
            // a redirect answering a URI-shaped method is the answer itself
            match response.first_header("Location") {
                Some(location) => Ok(Decoded::Uri(location.to_string())),
                None => Err(status_error(&request, response)),
            }
        } else {
            Err(status_error(&request, response))
        }
    }
}

/// Builds the status error for a non-2xx response, attaching the body text
/// best-effort. A failure while reading the body is swallowed so it never
/// masks the status failure itself.
fn status_error(request: &Request, response: Response) -> Error {
    let content = response
        .body
        .and_then(|body| body.text().ok())
        .filter(|text| !text.is_empty());
    Error::Status {
        status: response.status,
        method: request.method.as_str().to_string(),
        url: request.url.clone(),
        content,
    }
}
