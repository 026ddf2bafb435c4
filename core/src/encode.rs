//! Encoders: strategies writing call arguments into a request template.
//!
//! Both traits run once per call, before placeholder resolution, and mutate
//! the template in place — setting its body, headers, or query fields.
//! Provider clients register their own implementations through the
//! [`Overrides`](crate::config::Overrides) registry; the built-ins cover
//! the common JSON-body and URL-encoded-form cases.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::Error;
use crate::handler::Arg;
use crate::template::RequestTemplate;

/// Characters kept verbatim in `application/x-www-form-urlencoded` pairs.
const FORM_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Writes a raw body argument into the template.
pub trait BodyEncoder: Send + Sync {
    fn encode_body(&self, body: &Arg, template: &mut RequestTemplate) -> Result<(), Error>;
}

/// Writes the form-parameter subset of the call's variables into the
/// template. Entries arrive in declaration order.
pub trait FormEncoder: Send + Sync {
    fn encode_form(
        &self,
        form: &[(String, String)],
        template: &mut RequestTemplate,
    ) -> Result<(), Error>;
}

/// Serializes the body argument as JSON and tags the content type.
pub struct JsonBodyEncoder;

impl BodyEncoder for JsonBodyEncoder {
    fn encode_body(&self, body: &Arg, template: &mut RequestTemplate) -> Result<(), Error> {
        let text = match body {
            Arg::Json(value) => {
                serde_json::to_string(value).map_err(|e| Error::Encode(e.to_string()))?
            }
            Arg::Str(text) => text.clone(),
            Arg::None => return Err(Error::Encode("body argument was absent".to_string())),
        };
        template.set_body(&text);
        template.header("Content-Type", "application/json");
        Ok(())
    }
}

/// Renders form fields as an `application/x-www-form-urlencoded` body.
pub struct FormUrlEncoder;

impl FormEncoder for FormUrlEncoder {
    fn encode_form(
        &self,
        form: &[(String, String)],
        template: &mut RequestTemplate,
    ) -> Result<(), Error> {
        let body = form
            .iter()
            .map(|(name, value)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(name, FORM_ENCODE),
                    utf8_percent_encode(value, FORM_ENCODE)
                )
            })
            .collect::<Vec<_>>()
            .join("&");
        template.set_body(&body);
        template.header("Content-Type", "application/x-www-form-urlencoded");
        Ok(())
    }
}
