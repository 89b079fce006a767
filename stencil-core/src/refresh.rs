//! # Refresh Strategies
//!
//! A refresh strategy decides how a [`Store`](crate::Store) downloads a new [`Registry`].
//!
//! * **[`RefreshStrategy::LongPolling`]** (default): every load downloads the whole descriptor
//!   set from the store URL. Nothing is remembered between loads.
//! * **[`RefreshStrategy::VersionBased`]**: every load first asks `{url}/versions` for the
//!   versions the registry knows about. Only when the highest advertised version is newer than
//!   the last one loaded is `{url}/versions/{version}` downloaded.
//!
//! Strategies are stateless. The last loaded version lives in the store, next to the registry
//! it belongs to, so it is never shared between URLs.
use crate::{
    registry::{Registry, RegistryError},
    transport::{Transport, TransportError},
};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("Invalid versions document from '{url}': '{source}'")]
    InvalidVersions {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("No versions available at '{0}'")]
    NoVersionsAvailable(String),
    /// The registry has no version newer than the one already loaded.
    ///
    /// Stores treat this as "nothing to do", it is never surfaced as a failure.
    #[error("Schema already up to date (version {0})")]
    AlreadyUpToDate(i64),
}

/// Selects how stores fetch new descriptor sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshStrategy {
    /// Download the full descriptor set on every refresh.
    #[default]
    LongPolling,
    /// Download a descriptor set only when the registry advertises a newer version.
    VersionBased,
}

/// A registry together with the version it was loaded from.
///
/// Long polling loads always carry version `0`.
#[derive(Debug, Clone)]
pub(crate) struct Loaded {
    pub(crate) version: i64,
    pub(crate) registry: Registry,
}

#[derive(Debug, Deserialize)]
struct Versions {
    versions: Vec<i64>,
}

impl RefreshStrategy {
    /// Runs one load against `url`.
    ///
    /// `current_version` is the version the store has committed. The version based strategy
    /// returns `AlreadyUpToDate` when the registry advertises nothing newer.
    pub(crate) async fn load<T: Transport>(
        self,
        transport: &T,
        url: &str,
        current_version: i64,
    ) -> Result<Loaded, LoadError> {
        match self {
            RefreshStrategy::LongPolling => Ok(Loaded {
                version: 0,
                registry: load_registry(transport, url).await?,
            }),
            RefreshStrategy::VersionBased => {
                let versions_url = format!("{}/versions", url.trim_end_matches('/'));
                let body = transport.get(&versions_url).await?;

                let Versions { versions } =
                    serde_json::from_slice(&body).map_err(|source| LoadError::InvalidVersions {
                        url: versions_url.clone(),
                        source,
                    })?;

                let max_version = versions
                    .into_iter()
                    .max()
                    .ok_or_else(|| LoadError::NoVersionsAvailable(versions_url.clone()))?;

                if max_version <= current_version {
                    return Err(LoadError::AlreadyUpToDate(current_version));
                }

                let registry =
                    load_registry(transport, &format!("{versions_url}/{max_version}")).await?;

                Ok(Loaded {
                    version: max_version,
                    registry,
                })
            }
        }
    }
}

async fn load_registry<T: Transport>(transport: &T, url: &str) -> Result<Registry, LoadError> {
    let bytes = transport.get(url).await?;
    Ok(Registry::from_bytes(&bytes)?)
}
