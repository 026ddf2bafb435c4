//! Keyed decoder/encoder overrides with class-level fallback.
//!
//! # Design
//! Entries are keyed either by a class key (`Route53`) or a method key
//! (`Route53#zones(String)`). Lookup is method-key-first: an exact method
//! match always beats a class match. Resolution happens once per method at
//! binding time, never per call.

use std::sync::Arc;

use crate::contract::class_key;
use crate::decode::Decoder;
use crate::encode::{BodyEncoder, FormEncoder};
use crate::error::Error;

/// Registered decoder and encoder bindings consulted by `Binder::bind`.
#[derive(Default)]
pub struct Overrides {
    decoders: Vec<(String, Arc<dyn Decoder>)>,
    body_encoders: Vec<(String, Arc<dyn BodyEncoder>)>,
    form_encoders: Vec<(String, Arc<dyn FormEncoder>)>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a decoder under a class or method key.
    pub fn decoder(mut self, key: &str, decoder: impl Decoder + 'static) -> Self {
        self.decoders.push((key.to_string(), Arc::new(decoder)));
        self
    }

    /// Registers a body encoder under a class or method key.
    pub fn body_encoder(mut self, key: &str, encoder: impl BodyEncoder + 'static) -> Self {
        self.body_encoders.push((key.to_string(), Arc::new(encoder)));
        self
    }

    /// Registers a form encoder under a class or method key.
    pub fn form_encoder(mut self, key: &str, encoder: impl FormEncoder + 'static) -> Self {
        self.form_encoders.push((key.to_string(), Arc::new(encoder)));
        self
    }

    pub(crate) fn find_decoder(&self, method_key: &str) -> Option<Arc<dyn Decoder>> {
        for_method_or_class(&self.decoders, method_key)
    }

    pub(crate) fn require_body_encoder(
        &self,
        method_key: &str,
    ) -> Result<Arc<dyn BodyEncoder>, Error> {
        for_method_or_class(&self.body_encoders, method_key)
            .ok_or_else(|| missing(method_key, "body encoder"))
    }

    pub(crate) fn require_form_encoder(
        &self,
        method_key: &str,
    ) -> Result<Arc<dyn FormEncoder>, Error> {
        for_method_or_class(&self.form_encoders, method_key)
            .ok_or_else(|| missing(method_key, "form encoder"))
    }
}

pub(crate) fn missing(method_key: &str, component: &'static str) -> Error {
    Error::MissingConfig {
        method_key: method_key.to_string(),
        class_key: class_key(method_key).to_string(),
        component,
    }
}

/// Exact method-key match wins; otherwise the class-key entry, if any.
fn for_method_or_class<T: Clone>(entries: &[(String, T)], method_key: &str) -> Option<T> {
    let class = class_key(method_key);
    let mut class_match = None;
    for (key, value) in entries {
        if key == method_key {
            return Some(value.clone());
        }
        if key == class {
            class_match = Some(value.clone());
        }
    }
    class_match
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<(String, &'static str)> {
        vec![
            ("Route53".to_string(), "class"),
            ("Route53#zones(String)".to_string(), "method"),
        ]
    }

    #[test]
    fn method_key_beats_class_key() {
        assert_eq!(
            for_method_or_class(&entries(), "Route53#zones(String)"),
            Some("method")
        );
    }

    #[test]
    fn class_key_is_the_fallback() {
        assert_eq!(
            for_method_or_class(&entries(), "Route53#create(String)"),
            Some("class")
        );
    }

    #[test]
    fn unmatched_key_resolves_to_nothing() {
        assert_eq!(for_method_or_class(&entries(), "DynEct#zones(String)"), None);
    }

    #[test]
    fn missing_error_names_both_keys() {
        let err = missing("DynEct#zones(String)", "decoder");
        let message = err.to_string();
        assert!(message.contains("DynEct#zones(String)"));
        assert!(message.contains("or DynEct"));
        assert!(message.contains("decoder"));
    }
}
