use prost_reflect::{DescriptorPool, ExtensionDescriptor, MessageDescriptor};
use std::{collections::HashMap, sync::Arc};

/// Index of every extension declared in a descriptor set.
///
/// Extensions can be declared at file level or inside any message, at any nesting depth.
/// All of them are registered here and can be queried by extendee and number, or by name.
///
/// The resolver is built from the same pool [`Registry::decode`](super::Registry::decode)
/// decodes with, so every extension it knows is decoded as a typed field.
#[derive(Debug, Clone, Default)]
pub struct TypeResolver {
    by_extendee: Arc<HashMap<String, HashMap<u32, ExtensionDescriptor>>>,
    by_name: Arc<HashMap<String, ExtensionDescriptor>>,
}

impl TypeResolver {
    pub(crate) fn from_pool(pool: &DescriptorPool) -> Self {
        let mut extensions: Vec<ExtensionDescriptor> = Vec::new();

        for file in pool.files() {
            extensions.extend(file.extensions());
            for message in file.messages() {
                collect_nested_extensions(&message, &mut extensions);
            }
        }

        let mut by_extendee: HashMap<String, HashMap<u32, ExtensionDescriptor>> = HashMap::new();
        let mut by_name = HashMap::with_capacity(extensions.len());

        for extension in extensions {
            by_extendee
                .entry(extension.containing_message().full_name().to_string())
                .or_default()
                .insert(extension.number(), extension.clone());
            by_name.insert(extension.full_name().to_string(), extension);
        }

        Self {
            by_extendee: Arc::new(by_extendee),
            by_name: Arc::new(by_name),
        }
    }

    /// Finds the extension of `extendee` (a proto full name) registered under field `number`.
    pub fn find_extension_by_number(
        &self,
        extendee: &str,
        number: u32,
    ) -> Option<&ExtensionDescriptor> {
        self.by_extendee.get(extendee)?.get(&number)
    }

    /// Finds an extension by its own full name (e.g. `my.package.Holder.my_extension`).
    pub fn find_extension_by_name(&self, full_name: &str) -> Option<&ExtensionDescriptor> {
        self.by_name.get(full_name)
    }

    /// Returns every registered extension of the message `extendee`.
    pub fn extensions_of(&self, extendee: &str) -> impl Iterator<Item = &ExtensionDescriptor> {
        self.by_extendee
            .get(extendee)
            .into_iter()
            .flat_map(|extensions| extensions.values())
    }

    /// Total number of registered extensions.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

fn collect_nested_extensions(message: &MessageDescriptor, out: &mut Vec<ExtensionDescriptor>) {
    out.extend(message.child_extensions());
    for child in message.child_messages() {
        collect_nested_extensions(&child, out);
    }
}
