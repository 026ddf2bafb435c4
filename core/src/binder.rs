//! Binding: turning a declared API into a callable client object.
//!
//! # Design
//! `Binder` replaces dependency-injection wiring with an explicit builder:
//! transport, wire, and decoder/encoder overrides are plain fields with
//! plain defaults. `bind` runs the contract parser once, resolves each
//! method's decoder and template strategy up front, and produces a
//! [`BoundClient`] whose handlers are immutable and shared. Callers are
//! expected to bind once and cache the result.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::client::{Client, UreqClient};
use crate::config::{missing, Overrides};
use crate::contract::{self, Api, ReturnShape};
use crate::decode::{Decoded, Decoder, RegexDecoder, TextDecoder};
use crate::encode::{BodyEncoder, FormEncoder};
use crate::error::Error;
use crate::handler::{Arg, MethodHandler, TemplateStrategy};
use crate::target::Target;
use crate::wire::{NoOpWire, Wire};

/// Builder assembling bound clients from declared APIs.
pub struct Binder {
    client: Arc<dyn Client>,
    wire: Arc<dyn Wire>,
    overrides: Overrides,
}

impl Binder {
    /// A binder with the default blocking transport and logging disabled.
    pub fn new() -> Self {
        Self {
            client: Arc::new(UreqClient::new()),
            wire: Arc::new(NoOpWire),
            overrides: Overrides::new(),
        }
    }

    /// Replaces the transport.
    pub fn client(mut self, client: impl Client + 'static) -> Self {
        self.client = Arc::new(client);
        self
    }

    /// Attaches a wire observer to every bound method.
    pub fn wire(mut self, wire: impl Wire + 'static) -> Self {
        self.wire = Arc::new(wire);
        self
    }

    /// Registers a decoder under a class or method key.
    pub fn decoder(mut self, key: &str, decoder: impl Decoder + 'static) -> Self {
        self.overrides = self.overrides.decoder(key, decoder);
        self
    }

    /// Registers a body encoder under a class or method key.
    pub fn body_encoder(mut self, key: &str, encoder: impl BodyEncoder + 'static) -> Self {
        self.overrides = self.overrides.body_encoder(key, encoder);
        self
    }

    /// Registers a form encoder under a class or method key.
    pub fn form_encoder(mut self, key: &str, encoder: impl FormEncoder + 'static) -> Self {
        self.overrides = self.overrides.form_encoder(key, encoder);
        self
    }

    /// Parses `api`, resolves per-method configuration, and returns the
    /// callable client. Fails fast: no partial client is ever returned.
    pub fn bind(&self, api: &Api, target: impl Target + 'static) -> Result<BoundClient, Error> {
        let target: Arc<dyn Target> = Arc::new(target);
        let mut handlers = BTreeMap::new();

        for metadata in contract::parse_and_validate(api)? {
            let key = metadata.method_key().to_string();

            let decoder: Arc<dyn Decoder> =
                if let Some(decoder) = self.overrides.find_decoder(&key) {
                    decoder
                } else if let Some(pattern) = metadata.decode_pattern() {
                    let decoder = RegexDecoder::new(
                        pattern,
                        metadata.decode_groups(),
                        metadata.return_shape(),
                    )
                    .map_err(|e| Error::Contract {
                        method: key.clone(),
                        reason: e.to_string(),
                    })?;
                    Arc::new(decoder)
                } else if matches!(
                    metadata.return_shape(),
                    ReturnShape::None | ReturnShape::Raw
                ) {
                    Arc::new(TextDecoder)
                } else {
                    return Err(missing(&key, "decoder"));
                };

            let strategy = if !metadata.form_params().is_empty()
                && metadata.template().body_template().is_none()
            {
                TemplateStrategy::Form(self.overrides.require_form_encoder(&key)?)
            } else if metadata.body_index().is_some() {
                TemplateStrategy::Body(self.overrides.require_body_encoder(&key)?)
            } else {
                TemplateStrategy::Plain
            };

            let handler = MethodHandler::new(
                target.clone(),
                self.client.clone(),
                self.wire.clone(),
                Arc::new(metadata),
                strategy,
                decoder,
            );
            handlers.insert(key, handler);
        }

        Ok(BoundClient { target, handlers })
    }
}

impl Default for Binder {
    fn default() -> Self {
        Self::new()
    }
}

/// The generated client: one handler per declared method, dispatched by
/// method key or unambiguous bare name.
pub struct BoundClient {
    target: Arc<dyn Target>,
    handlers: BTreeMap<String, MethodHandler>,
}

impl BoundClient {
    /// Invokes a bound method.
    ///
    /// `method` is either a full method key (`Zones#list(String)`) or a bare
    /// method name; a bare name shared by overloads must be disambiguated
    /// with the full key.
    pub fn call(&self, method: &str, args: &[Arg]) -> Result<Decoded, Error> {
        if let Some(handler) = self.handlers.get(method) {
            return handler.invoke(args);
        }
        let mut by_name = self
            .handlers
            .iter()
            .filter(|(key, _)| bare_name(key.as_str()) == Some(method));
        match (by_name.next(), by_name.next()) {
            (Some((_, handler)), None) => handler.invoke(args),
            (Some((first, _)), Some((second, _))) => Err(Error::Argument(format!(
                "method name {method} is ambiguous on {}; use a full key such as {first} or {second}",
                self.target.type_name()
            ))),
            _ => Err(Error::Argument(format!(
                "no method named {method} declared on {}",
                self.target.type_name()
            ))),
        }
    }

    /// Keys of every bound method, in sorted order.
    pub fn method_keys(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn target_name(&self) -> &str {
        self.target.name()
    }

    pub fn target_url(&self) -> &str {
        self.target.url()
    }
}

/// Identity, not transport: two bound clients are equal when they point at
/// the same target.
impl PartialEq for BoundClient {
    fn eq(&self, other: &Self) -> bool {
        self.target.type_name() == other.target.type_name()
            && self.target.name() == other.target.name()
            && self.target.url() == other.target.url()
    }
}

impl fmt::Display for BoundClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.target.name(), self.target.url())
    }
}

impl fmt::Debug for BoundClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundClient")
            .field("target_type", &self.target.type_name())
            .field("target_name", &self.target.name())
            .field("target_url", &self.target.url())
            .field("methods", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The `name` portion of `Type#name(Params)`.
fn bare_name(method_key: &str) -> Option<&str> {
    let after_hash = method_key.split_once('#')?.1;
    Some(after_hash.split_once('(').map_or(after_hash, |(n, _)| n))
}
