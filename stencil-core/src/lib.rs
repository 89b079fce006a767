//! # Stencil Core
//!
//! `stencil-core` is the library powering the Stencil client. It decodes Protobuf payloads
//! at runtime without compile-time knowledge of the schema: descriptor sets are downloaded
//! from a remote registry, cached in memory and kept fresh in the background.
//!
//! ## Key Components
//!
//! * **[`Client`]:** The main entry point. It owns one [`Store`] per registry URL and offers
//!   lookups (`get_descriptor`) and decoding (`parse`) by qualified message name.
//! * **[`Registry`]:** An immutable, validated view over a descriptor set: a name index plus
//!   an extension aware [`TypeResolver`].
//! * **[`RefreshStrategy`]:** How a store fetches new schemas, either by downloading the whole
//!   descriptor set every time or by asking the registry for its latest version first.
//! * **[`Transport`]:** The HTTP seam. [`HttpTransport`] is the `reqwest` based default.
//!
//! ## Background refresh
//!
//! When `auto_refresh` is enabled each store spawns a tokio task that wakes up every
//! `refresh_interval`. A tick only downloads when the store was read since the previous tick,
//! so idle clients don't poll the registry.
//!
//! ## Re-exports
//!
//! This crate re-exports `prost` and `prost-reflect` to ensure that consumers
//! use compatible versions of these underlying dependencies.
pub mod client;
pub mod logger;
pub mod refresh;
pub mod registry;
pub mod store;
pub mod transport;

pub use client::{
    Client, ClientError, NotFound, Options, ParseError, RefreshError, SerializeError, UrlLoadError,
};
pub use logger::{Logger, TracingLogger};
pub use refresh::{LoadError, RefreshStrategy};
pub use registry::{Registry, RegistryError, TypeResolver};
pub use store::Store;
pub use transport::{HttpOptions, HttpTransport, Transport, TransportError};

// Re-exports
pub use prost;
pub use prost_reflect;
