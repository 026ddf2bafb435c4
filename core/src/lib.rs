//! Declarative HTTP-client binding core.
//!
//! # Overview
//! An API surface is declared once as a table of method signatures — verb,
//! path template, parameter roles, response shape — and bound into a
//! callable client object. Each call builds a request from a parameterized
//! template, runs it through a finalizing target and a blocking transport,
//! and decodes the response into a typed value.
//!
//! # Design
//! - Contracts are parsed and validated once, at binding time; a malformed
//!   declaration never produces a partial client.
//! - Parsed metadata, template skeletons, and configuration are immutable
//!   and shared; per-call state is a fresh template copy, so concurrent
//!   calls are safe wherever the transport is.
//! - Decoders, encoders, the transport, and the wire logger are pluggable;
//!   overrides resolve method-key-first with class-key fallback.
//! - No retries, pooling, or caching anywhere in the pipeline — a call is
//!   exactly one network execution, and resilience belongs to the
//!   transport or the caller.
//!
//! ```no_run
//! use declient_core::{Api, Arg, Binder, MethodSig, ParamSig, ReturnShape, StaticTarget};
//!
//! let api = Api::new("DynEct").method(
//!     MethodSig::new("zones")
//!         .get()
//!         .path("/Zone")
//!         .regex("/REST/Zone/([^/]+)/")
//!         .returns(ReturnShape::List)
//!         .param(ParamSig::header("Auth-Token")),
//! );
//! let client = Binder::new()
//!     .bind(&api, StaticTarget::new("DynEct", "https://api.dynect.net/REST"))
//!     .unwrap();
//! let zones = client.call("zones", &[Arg::from("TOKEN")]).unwrap();
//! ```

pub mod binder;
pub mod client;
pub mod config;
pub mod contract;
pub mod decode;
pub mod encode;
pub mod error;
pub mod handler;
pub mod http;
pub mod target;
pub mod template;
pub mod wire;

pub use binder::{Binder, BoundClient};
pub use client::{Client, UreqClient};
pub use config::Overrides;
pub use contract::{
    class_key, method_key, parse_and_validate, Api, MethodMetadata, MethodSig, ParamRole,
    ParamSig, ReturnShape,
};
pub use decode::{Decoded, Decoder, RegexDecoder, TextDecoder};
pub use encode::{BodyEncoder, FormEncoder, FormUrlEncoder, JsonBodyEncoder};
pub use error::Error;
pub use handler::{Arg, MethodHandler};
pub use http::{Body, BodyReader, Method, Request, Response};
pub use target::{StaticTarget, Target};
pub use template::RequestTemplate;
pub use wire::{ErrorWire, LogWire, NoOpWire, Wire};
