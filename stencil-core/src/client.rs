//! # Stencil Client
//!
//! This module implements the façade applications use to decode Protobuf payloads dynamically.
//!
//! A [`Client`] owns one [`Store`] per registry URL. Lookups walk the stores in the order the
//! URLs were given and use the first registry that knows the requested name.
//!
//! ## Construction
//!
//! Construction downloads every URL once, concurrently. The policy is strict: if any URL fails
//! to load, no client is returned and the error lists every failing URL. When `auto_refresh` is
//! enabled the background schedulers are only started once every store loaded successfully.
//!
//! ## Example
//!
//! ```rust,no_run
//! use stencil_core::{Client, Options};
//! use std::time::Duration;
//!
//! # async fn run(bytes: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let options = Options::default().with_auto_refresh(Duration::from_secs(600));
//! let client = Client::new("http://localhost:8080/v1beta1/namespaces/ns/schemas/s", options).await?;
//!
//! let message = client.parse("com.example.Booking", &bytes)?;
//! println!("{message:?}");
//!
//! client.close();
//! # Ok(())
//! # }
//! ```
pub mod options;

pub use options::{DEFAULT_REFRESH_INTERVAL, MAX_REFRESH_INTERVAL, Options};

use crate::{
    refresh::LoadError,
    registry::Registry,
    store::Store,
    transport::{HttpTransport, Transport, TransportError},
};
use futures_util::future::join_all;
use prost::Message;
use prost_reflect::{DynamicMessage, ExtensionDescriptor, MessageDescriptor};
use std::{collections::BTreeSet, sync::Arc};

/// Returned when no configured registry knows the requested name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Message '{0}' not found")]
pub struct NotFound(pub String);

/// A load failure tied to the URL it happened on.
#[derive(Debug, thiserror::Error)]
#[error("'{url}': {source}")]
pub struct UrlLoadError {
    pub url: String,
    #[source]
    pub source: LoadError,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("At least one registry URL is required")]
    NoUrls,
    #[error("Failed to build the HTTP transport: '{0}'")]
    Transport(#[from] TransportError),
    #[error("Failed to load descriptors from {}", describe_failures(.0))]
    InitialLoad(Vec<UrlLoadError>),
}

impl ClientError {
    /// The per URL failures behind an `InitialLoad` error.
    pub fn load_failures(&self) -> &[UrlLoadError] {
        match self {
            ClientError::InitialLoad(failures) => failures,
            _ => &[],
        }
    }
}

/// Manual refresh failures, one per failing URL.
#[derive(Debug, thiserror::Error)]
#[error("Failed to refresh descriptors from {}", describe_failures(.0))]
pub struct RefreshError(pub Vec<UrlLoadError>);

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    NotFound(#[from] NotFound),
    #[error("Failed to decode Protobuf bytes: '{0}'")]
    Decode(#[from] prost::DecodeError),
    #[error(transparent)]
    Refresh(#[from] RefreshError),
}

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error(transparent)]
    NotFound(#[from] NotFound),
    #[error("JSON structure does not match Protobuf schema: '{0}'")]
    InvalidData(#[from] serde_json::Error),
    #[error(transparent)]
    Refresh(#[from] RefreshError),
}

fn describe_failures(failures: &[UrlLoadError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Decodes Protobuf payloads using descriptors downloaded from one or more registries.
///
/// The generic parameter `T` is the transport shared by every store.
pub struct Client<T = HttpTransport> {
    stores: Vec<Store<T>>,
    options: Options,
}

impl<T> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("stores", &self.stores)
            .field("options", &self.options)
            .finish()
    }
}

impl Client<HttpTransport> {
    /// Creates a client backed by a single registry URL.
    ///
    /// # Returns
    ///
    /// * `Ok(Client)` - The client, with the descriptors of `url` loaded.
    /// * `Err(ClientError)` - If the transport can't be built or the first download fails.
    pub async fn new(url: impl Into<String>, options: Options) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(&options.http)?;
        Self::with_transport(url, options, transport).await
    }

    /// Creates a client backed by several registry URLs.
    ///
    /// Lookups try the URLs in the given order. Construction fails if any URL fails to load.
    pub async fn new_multi_url<I, S>(urls: I, options: Options) -> Result<Self, ClientError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let transport = HttpTransport::new(&options.http)?;
        Self::with_transport_multi_url(urls, options, transport).await
    }
}

impl<T: Transport> Client<T> {
    /// Same as [`Client::new`] with a custom [`Transport`].
    pub async fn with_transport(
        url: impl Into<String>,
        options: Options,
        transport: T,
    ) -> Result<Self, ClientError> {
        Self::with_transport_multi_url([url.into()], options, transport).await
    }

    /// Same as [`Client::new_multi_url`] with a custom [`Transport`].
    pub async fn with_transport_multi_url<I, S>(
        urls: I,
        options: Options,
        transport: T,
    ) -> Result<Self, ClientError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let urls: Vec<String> = urls.into_iter().map(Into::into).collect();
        if urls.is_empty() {
            return Err(ClientError::NoUrls);
        }

        let transport = Arc::new(transport);
        let strategy = options.refresh_strategy;

        let results = join_all(urls.into_iter().map(|url| {
            let transport = Arc::clone(&transport);
            let logger = Arc::clone(&options.logger);
            async move {
                Store::open(url.clone(), transport, strategy, logger)
                    .await
                    .map_err(|source| UrlLoadError { url, source })
            }
        }))
        .await;

        let mut stores = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(store) => stores.push(store),
                Err(failure) => failures.push(failure),
            }
        }

        if !failures.is_empty() {
            return Err(ClientError::InitialLoad(failures));
        }

        if options.auto_refresh {
            let interval = options.effective_refresh_interval();
            for store in &stores {
                store.start_scheduler(interval);
            }
        }

        Ok(Self { stores, options })
    }

    /// Looks up the descriptor of a message by its qualified name.
    ///
    /// # Returns
    ///
    /// * `Ok(MessageDescriptor)` - The descriptor from the first registry knowing `name`.
    /// * `Err(NotFound)` - If no registry knows `name`.
    pub fn get_descriptor(&self, name: &str) -> Result<MessageDescriptor, NotFound> {
        self.lookup(name).map(|(_, descriptor)| descriptor)
    }

    /// Lists the extensions of the message `name` registered in the registry that defines it,
    /// sorted by field number.
    pub fn get_extensions(&self, name: &str) -> Result<Vec<ExtensionDescriptor>, NotFound> {
        let (registry, descriptor) = self.lookup(name)?;
        let mut extensions: Vec<ExtensionDescriptor> = registry
            .resolver()
            .extensions_of(descriptor.full_name())
            .cloned()
            .collect();
        extensions.sort_by_key(ExtensionDescriptor::number);
        Ok(extensions)
    }

    /// Decodes `bytes` as the message `name`.
    ///
    /// Extensions known to the registry are decoded as typed fields.
    pub fn parse(&self, name: &str, bytes: &[u8]) -> Result<DynamicMessage, ParseError> {
        let (registry, descriptor) = self.lookup(name)?;
        Ok(registry.decode(&descriptor, bytes)?)
    }

    /// Like [`Client::parse`], but when the decoded message carries unknown fields the
    /// registries are refreshed and the bytes are decoded again.
    pub async fn parse_with_refresh(
        &self,
        name: &str,
        bytes: &[u8],
    ) -> Result<DynamicMessage, ParseError> {
        let message = self.parse(name, bytes)?;
        if message.unknown_fields().next().is_none() {
            return Ok(message);
        }

        self.refresh().await?;
        self.parse(name, bytes)
    }

    /// Encodes a JSON value (Protobuf JSON mapping) as the message `name`.
    pub fn serialize(&self, name: &str, value: serde_json::Value) -> Result<Vec<u8>, SerializeError> {
        let (_, descriptor) = self.lookup(name)?;
        let message = DynamicMessage::deserialize(descriptor, value)?;
        Ok(message.encode_to_vec())
    }

    /// Like [`Client::serialize`], but a missing name or a JSON value not matching the schema
    /// triggers a refresh and a second attempt.
    pub async fn serialize_with_refresh(
        &self,
        name: &str,
        value: serde_json::Value,
    ) -> Result<Vec<u8>, SerializeError> {
        match self.serialize(name, value.clone()) {
            Err(SerializeError::NotFound(_) | SerializeError::InvalidData(_)) => {
                self.refresh().await?;
                self.serialize(name, value)
            }
            result => result,
        }
    }

    /// Reloads every store now. Failures of all URLs are reported together.
    pub async fn refresh(&self) -> Result<(), RefreshError> {
        let results = join_all(self.stores.iter().map(|store| async move {
            store.refresh().await.map_err(|source| UrlLoadError {
                url: store.url().to_string(),
                source,
            })
        }))
        .await;

        let failures: Vec<UrlLoadError> = results.into_iter().filter_map(Result::err).collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(RefreshError(failures))
        }
    }
}

impl<T> Client<T> {
    /// Every qualified name known by at least one store, sorted.
    pub fn message_names(&self) -> Vec<String> {
        let names: BTreeSet<String> = self
            .stores
            .iter()
            .filter_map(Store::registry)
            .flat_map(|registry| registry.names().map(str::to_string).collect::<Vec<_>>())
            .collect();
        names.into_iter().collect()
    }

    pub fn stores(&self) -> &[Store<T>] {
        &self.stores
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Stops the background refresh of every store.
    pub fn close(&self) {
        for store in &self.stores {
            store.close();
        }
    }

    fn lookup(&self, name: &str) -> Result<(Registry, MessageDescriptor), NotFound> {
        for store in &self.stores {
            let Some(registry) = store.registry() else {
                continue;
            };
            if let Some(descriptor) = registry.get(name).cloned() {
                return Ok((registry, descriptor));
            }
        }
        Err(NotFound(name.to_string()))
    }
}

impl<T> Drop for Client<T> {
    fn drop(&mut self) {
        self.close();
    }
}
