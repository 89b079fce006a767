//! # Stencil Fixtures
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide descriptor set payloads for
//! integration testing `stencil-core` and the `stencil` CLI.
//! It is not intended for production use.
//!
//! The schemas are built in code rather than compiled with `protoc`, they are equivalent to:
//!
//! ```proto
//! // stencil/one.proto
//! syntax = "proto2";
//! package test.stencil;
//! option java_package = "com.example.stencil";
//!
//! message One {
//!   optional int64 field_one = 1;
//!   optional Nested nested = 2;
//!   optional int64 field_two = 3; // updated schema only
//!   message Nested { optional string label = 1; }
//!   extensions 100 to 199;
//! }
//!
//! // stencil/extensions.proto
//! syntax = "proto2";
//! package test.stencil.ext;
//! import "stencil/one.proto";
//!
//! extend test.stencil.One { optional string note = 100; }
//! message Holder {
//!   extend test.stencil.One { optional int64 count = 101; }
//!   message Inner {
//!     extend test.stencil.One { optional int64 depth = 102; }
//!   }
//! }
//!
//! // other/two.proto
//! syntax = "proto3";
//! package test.other;
//! message Two { string name = 1; }
//! ```
use prost::Message;
use prost_types::{
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet, FileOptions,
    descriptor_proto::ExtensionRange,
    field_descriptor_proto::{Label, Type},
};

/// Qualified name of `test.stencil.One` (its file declares a `java_package`).
pub const ONE: &str = "com.example.stencil.One";
/// Qualified name of `test.stencil.One.Nested`.
pub const ONE_NESTED: &str = "com.example.stencil.One.Nested";
/// Qualified name of `test.stencil.ext.Holder` (no `java_package`).
pub const HOLDER: &str = "test.stencil.ext.Holder";
/// Qualified name of `test.other.Two`.
pub const TWO: &str = "test.other.Two";

pub const NOTE_EXTENSION: &str = "test.stencil.ext.note";
pub const COUNT_EXTENSION: &str = "test.stencil.ext.Holder.count";
pub const DEPTH_EXTENSION: &str = "test.stencil.ext.Holder.Inner.depth";

/// The self-contained descriptor set: `one.proto` and `extensions.proto`.
pub fn descriptor_set() -> FileDescriptorSet {
    FileDescriptorSet {
        file: vec![one_file(false), extensions_file()],
    }
}

pub fn descriptor_set_bytes() -> Vec<u8> {
    descriptor_set().encode_to_vec()
}

/// Same as [`descriptor_set_bytes`], with `field_two` added to `One`.
pub fn updated_descriptor_set_bytes() -> Vec<u8> {
    FileDescriptorSet {
        file: vec![one_file(true), extensions_file()],
    }
    .encode_to_vec()
}

/// `extensions.proto` alone, without the `one.proto` file it imports.
pub fn incomplete_descriptor_set_bytes() -> Vec<u8> {
    FileDescriptorSet {
        file: vec![extensions_file()],
    }
    .encode_to_vec()
}

/// An unrelated, self-contained descriptor set holding `test.other.Two`.
pub fn other_descriptor_set_bytes() -> Vec<u8> {
    FileDescriptorSet {
        file: vec![FileDescriptorProto {
            name: Some("other/two.proto".to_string()),
            package: Some("test.other".to_string()),
            message_type: vec![DescriptorProto {
                name: Some("Two".to_string()),
                field: vec![field("name", 1, Type::String)],
                ..Default::default()
            }],
            syntax: Some("proto3".to_string()),
            ..Default::default()
        }],
    }
    .encode_to_vec()
}

fn one_file(updated: bool) -> FileDescriptorProto {
    let mut fields = vec![
        field("field_one", 1, Type::Int64),
        FieldDescriptorProto {
            type_name: Some(".test.stencil.One.Nested".to_string()),
            ..field("nested", 2, Type::Message)
        },
    ];
    if updated {
        fields.push(field("field_two", 3, Type::Int64));
    }

    FileDescriptorProto {
        name: Some("stencil/one.proto".to_string()),
        package: Some("test.stencil".to_string()),
        message_type: vec![DescriptorProto {
            name: Some("One".to_string()),
            field: fields,
            nested_type: vec![DescriptorProto {
                name: Some("Nested".to_string()),
                field: vec![field("label", 1, Type::String)],
                ..Default::default()
            }],
            extension_range: vec![ExtensionRange {
                start: Some(100),
                end: Some(200),
                options: None,
            }],
            ..Default::default()
        }],
        options: Some(FileOptions {
            java_package: Some("com.example.stencil".to_string()),
            ..Default::default()
        }),
        syntax: Some("proto2".to_string()),
        ..Default::default()
    }
}

fn extensions_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("stencil/extensions.proto".to_string()),
        package: Some("test.stencil.ext".to_string()),
        dependency: vec!["stencil/one.proto".to_string()],
        extension: vec![extension("note", 100, Type::String)],
        message_type: vec![DescriptorProto {
            name: Some("Holder".to_string()),
            extension: vec![extension("count", 101, Type::Int64)],
            nested_type: vec![DescriptorProto {
                name: Some("Inner".to_string()),
                extension: vec![extension("depth", 102, Type::Int64)],
                ..Default::default()
            }],
            ..Default::default()
        }],
        syntax: Some("proto2".to_string()),
        ..Default::default()
    }
}

fn field(name: &str, number: i32, kind: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(kind as i32),
        ..Default::default()
    }
}

fn extension(name: &str, number: i32, kind: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        extendee: Some(".test.stencil.One".to_string()),
        ..field(name, number, kind)
    }
}
