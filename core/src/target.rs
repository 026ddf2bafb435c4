//! Targets: binding an API to a base URL and a request-finalization step.
//!
//! A target is consulted once per call, right before the transport, and may
//! mutate the resolved template — prefix the base URL, stamp auth headers,
//! wrap the body — before sealing it into an immutable [`Request`].
//! Implementations must not cache what they compute per call (a rotating
//! token, a request signature); caching belongs in whatever collaborator
//! supplies those values.

use crate::error::Error;
use crate::http::Request;
use crate::template::RequestTemplate;

/// Identity of a bound API plus its per-call finalization hook.
pub trait Target: Send + Sync {
    /// Name of the API type this target binds, as used in method keys.
    fn type_name(&self) -> &str;

    /// Logical name of the target (a provider name, an environment).
    fn name(&self) -> &str;

    /// Base URL prefixed onto every request.
    fn url(&self) -> &str;

    /// Finalizes a resolved template into an immutable request.
    ///
    /// The default prepends [`Target::url`] and seals the template.
    /// Implementations that sign or authenticate override this, mutate the
    /// template, and finish with `template.into_request()`.
    fn apply(&self, mut template: RequestTemplate) -> Result<Request, Error> {
        template.insert(0, self.url());
        template.into_request()
    }
}

/// A target with fixed identity and no finalization beyond the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticTarget {
    type_name: String,
    name: String,
    url: String,
}

impl StaticTarget {
    /// Target whose logical name is its URL.
    pub fn new(type_name: &str, url: &str) -> Self {
        Self::named(type_name, url, url)
    }

    pub fn named(type_name: &str, name: &str, url: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

impl Target for StaticTarget {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn url(&self) -> &str {
        &self.url
    }
}
