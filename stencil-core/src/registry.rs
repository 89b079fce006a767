//! # Descriptor Registry
//!
//! A [`Registry`] is the validated, immutable view over one downloaded descriptor set.
//!
//! Building one goes through the following steps:
//!
//! 1. The raw bytes are decoded into a `FileDescriptorSet`.
//! 2. The set is checked to be **self-contained**: every file imported (transitively) by any file
//!    of the set must be part of the set. Registries built from `protoc` output without
//!    `--include_imports` are rejected here, so clients fail fast at construction time rather than
//!    on the first lookup.
//! 3. The files are linked into a `prost_reflect::DescriptorPool`.
//! 4. Every message, nested ones included, is indexed by its qualified name.
//! 5. Every extension, wherever it is declared, is registered in the [`TypeResolver`].
//!
//! ## Qualified names
//!
//! Messages are looked up by the name their generated Java class would have: when a file
//! declares the `java_package` option, the proto package prefix of the message full name is
//! replaced by that package. Otherwise the plain proto full name is used.
mod resolver;

pub use resolver::TypeResolver;

use prost::Message;
use prost_reflect::{DescriptorError, DescriptorPool, DynamicMessage, MessageDescriptor};
use prost_types::{FileDescriptorProto, FileDescriptorSet};
use std::{
    collections::{BTreeSet, HashMap, HashSet},
    sync::Arc,
};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Invalid file descriptor set: '{0}'")]
    InvalidDescriptorSet(String),
    #[error("File descriptor set is not fully contained, missing imports: {missing:?}")]
    IncompleteDescriptorSet { missing: Vec<String> },
}

impl From<prost::DecodeError> for RegistryError {
    fn from(err: prost::DecodeError) -> Self {
        RegistryError::InvalidDescriptorSet(err.to_string())
    }
}

impl From<DescriptorError> for RegistryError {
    fn from(err: DescriptorError) -> Self {
        RegistryError::InvalidDescriptorSet(err.to_string())
    }
}

/// A name index and an extension resolver built from a self-contained descriptor set.
///
/// Cloning a registry is cheap, all the internals are shared.
#[derive(Debug, Clone)]
pub struct Registry {
    pool: DescriptorPool,
    messages: Arc<HashMap<String, MessageDescriptor>>,
    resolver: TypeResolver,
}

impl Registry {
    /// Builds a registry from the binary encoding of a `FileDescriptorSet`.
    ///
    /// # Returns
    ///
    /// * `Ok(Registry)` - The registry.
    /// * `Err(RegistryError::InvalidDescriptorSet)` - If the bytes can't be decoded or linked.
    /// * `Err(RegistryError::IncompleteDescriptorSet)` - If an imported file is missing.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RegistryError> {
        let set = FileDescriptorSet::decode(bytes)?;
        Self::from_file_descriptor_set(set)
    }

    /// Builds a registry from an already decoded `FileDescriptorSet`.
    pub fn from_file_descriptor_set(set: FileDescriptorSet) -> Result<Self, RegistryError> {
        check_self_contained(&set.file)?;

        let java_packages: HashMap<String, String> = set
            .file
            .iter()
            .filter_map(|file| {
                let java_package = file.options.as_ref()?.java_package.clone()?;
                Some((file.name().to_string(), java_package))
            })
            .collect();

        let pool = DescriptorPool::from_file_descriptor_set(set)?;

        let mut messages = HashMap::new();
        for file in pool.files() {
            let java_package = java_packages.get(file.name()).map(String::as_str);
            let mut pending: Vec<MessageDescriptor> = file.messages().collect();

            while let Some(message) = pending.pop() {
                pending.extend(message.child_messages());
                messages.insert(qualified_name(&message, java_package), message);
            }
        }

        let resolver = TypeResolver::from_pool(&pool);

        Ok(Self {
            pool,
            messages: Arc::new(messages),
            resolver,
        })
    }

    /// Looks up a message by its qualified name.
    pub fn get(&self, qualified_name: &str) -> Option<&MessageDescriptor> {
        self.messages.get(qualified_name)
    }

    /// Returns every qualified name known by this registry, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }

    /// Number of indexed messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn resolver(&self) -> &TypeResolver {
        &self.resolver
    }

    pub fn descriptor_pool(&self) -> &DescriptorPool {
        &self.pool
    }

    /// Decodes `bytes` as an instance of `descriptor`.
    ///
    /// Decoding runs against the registry's pool, which holds every extension the
    /// [`TypeResolver`] indexes. Extension fields are decoded as typed extension values, only
    /// fields unknown to the whole descriptor set end up as unknown fields.
    pub fn decode(
        &self,
        descriptor: &MessageDescriptor,
        bytes: &[u8],
    ) -> Result<DynamicMessage, prost::DecodeError> {
        let mut message = DynamicMessage::new(descriptor.clone());
        message.merge(bytes)?;
        Ok(message)
    }
}

/// Computes the key a message is indexed under.
fn qualified_name(message: &MessageDescriptor, java_package: Option<&str>) -> String {
    let full_name = message.full_name();

    match java_package.filter(|p| !p.is_empty()) {
        None => full_name.to_string(),
        Some(java_package) => {
            let package = message.package_name();
            if package.is_empty() {
                return format!("{java_package}.{full_name}");
            }
            match full_name.strip_prefix(package) {
                Some(rest) => format!("{java_package}{rest}"),
                None => full_name.to_string(),
            }
        }
    }
}

/// Walks the import graph of every file and reports the files that are not part of the set.
fn check_self_contained(files: &[FileDescriptorProto]) -> Result<(), RegistryError> {
    let by_name: HashMap<&str, &FileDescriptorProto> =
        files.iter().map(|f| (f.name(), f)).collect();

    let mut visited: HashSet<&str> = HashSet::new();
    let mut missing: BTreeSet<String> = BTreeSet::new();
    let mut pending: Vec<&str> = by_name.keys().copied().collect();

    while let Some(name) = pending.pop() {
        if !visited.insert(name) {
            continue;
        }
        match by_name.get(name) {
            Some(file) => pending.extend(file.dependency.iter().map(String::as_str)),
            None => {
                missing.insert(name.to_string());
            }
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(RegistryError::IncompleteDescriptorSet {
            missing: missing.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost_types::FileOptions;

    fn file(name: &str, dependencies: &[&str]) -> FileDescriptorProto {
        FileDescriptorProto {
            name: Some(name.to_string()),
            dependency: dependencies.iter().map(|d| d.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn self_contained_sets_pass() {
        let files = vec![file("a.proto", &["b.proto"]), file("b.proto", &[])];
        assert!(check_self_contained(&files).is_ok());
    }

    #[test]
    fn import_cycles_between_files_terminate() {
        let files = vec![file("a.proto", &["b.proto"]), file("b.proto", &["a.proto"])];
        assert!(check_self_contained(&files).is_ok());
    }

    #[test]
    fn missing_imports_are_reported_sorted() {
        let files = vec![
            file("a.proto", &["z.proto", "b.proto"]),
            file("b.proto", &["c.proto"]),
        ];

        match check_self_contained(&files) {
            Err(RegistryError::IncompleteDescriptorSet { missing }) => {
                assert_eq!(missing, vec!["c.proto".to_string(), "z.proto".to_string()]);
            }
            other => panic!("Expected IncompleteDescriptorSet, got {other:?}"),
        }
    }

    #[test]
    fn garbage_bytes_are_an_invalid_descriptor_set() {
        let err = Registry::from_bytes(b"invalid").unwrap_err();
        assert!(matches!(err, RegistryError::InvalidDescriptorSet(_)));
    }

    #[test]
    fn qualified_names_use_java_package() {
        let set = FileDescriptorSet {
            file: vec![FileDescriptorProto {
                name: Some("a.proto".to_string()),
                package: Some("pkg.a".to_string()),
                message_type: vec![prost_types::DescriptorProto {
                    name: Some("Outer".to_string()),
                    nested_type: vec![prost_types::DescriptorProto {
                        name: Some("Inner".to_string()),
                        ..Default::default()
                    }],
                    ..Default::default()
                }],
                options: Some(FileOptions {
                    java_package: Some("com.example.a".to_string()),
                    ..Default::default()
                }),
                syntax: Some("proto3".to_string()),
                ..Default::default()
            }],
        };

        let registry = Registry::from_file_descriptor_set(set).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.get("com.example.a.Outer").is_some());
        assert_eq!(
            registry.get("com.example.a.Outer.Inner").unwrap().full_name(),
            "pkg.a.Outer.Inner"
        );
        assert!(registry.get("pkg.a.Outer").is_none());
    }

    #[test]
    fn qualified_names_without_package() {
        let set = FileDescriptorSet {
            file: vec![FileDescriptorProto {
                name: Some("root.proto".to_string()),
                message_type: vec![prost_types::DescriptorProto {
                    name: Some("Root".to_string()),
                    ..Default::default()
                }],
                options: Some(FileOptions {
                    java_package: Some("com.example".to_string()),
                    ..Default::default()
                }),
                syntax: Some("proto3".to_string()),
                ..Default::default()
            }],
        };

        let registry = Registry::from_file_descriptor_set(set).unwrap();

        assert!(registry.get("com.example.Root").is_some());
    }
}
