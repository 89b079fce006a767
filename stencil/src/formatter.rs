use colored::*;
use stencil_core::{
    ClientError, NotFound, ParseError, SerializeError,
    prost_reflect::{ExtensionDescriptor, Kind, MessageDescriptor},
};
use std::fmt::Display;

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

pub struct MessageList(pub Vec<String>);

pub struct GenericError<T: Display>(pub &'static str, pub T);

/// A message and the extensions registered for it, as rendered by `describe`.
pub struct MessageSchema(pub MessageDescriptor, pub Vec<ExtensionDescriptor>);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(f, "{}", self.0)?;
        Ok(())
    }
}

impl From<serde_json::Value> for FormattedString {
    fn from(value: serde_json::Value) -> Self {
        FormattedString(serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()))
    }
}

impl From<ClientError> for FormattedString {
    fn from(err: ClientError) -> Self {
        FormattedString(format!("{}\n\n'{}'", "Registry Error:".red().bold(), err))
    }
}

impl From<NotFound> for FormattedString {
    fn from(err: NotFound) -> Self {
        FormattedString(format!(
            "{}\n\n'{}'",
            "Message Lookup Failed:".red().bold(),
            err
        ))
    }
}

impl From<ParseError> for FormattedString {
    fn from(err: ParseError) -> Self {
        FormattedString(format!("{}\n\n'{}'", "Parse Failed:".red().bold(), err))
    }
}

impl From<SerializeError> for FormattedString {
    fn from(err: SerializeError) -> Self {
        FormattedString(format!("{}\n\n'{}'", "Encode Failed:".red().bold(), err))
    }
}

impl From<std::io::Error> for FormattedString {
    fn from(err: std::io::Error) -> Self {
        FormattedString(format!(
            "{}\n\n'{}'",
            "Failed to read file:".red().bold(),
            err
        ))
    }
}

impl<T: Display> From<GenericError<T>> for FormattedString {
    fn from(GenericError(msg, err): GenericError<T>) -> Self {
        FormattedString(format!("{}:\n\n'{}'", msg.red().bold(), err))
    }
}

impl From<MessageList> for FormattedString {
    fn from(MessageList(messages): MessageList) -> Self {
        if messages.is_empty() {
            return FormattedString("No messages found.".yellow().to_string());
        }

        let mut out = String::new();
        out.push_str("Available Messages:\n");
        for msg in messages {
            out.push_str(&format!("  - {}\n", msg.green()));
        }
        FormattedString(out.trim_end().to_string())
    }
}

impl From<MessageSchema> for FormattedString {
    fn from(MessageSchema(message, extensions): MessageSchema) -> Self {
        let mut out = String::new();
        out.push_str(&format!(
            "{} {} {{\n",
            "message".cyan(),
            message.full_name().green()
        ));

        for field in message.fields() {
            let label = if field.is_list() {
                format!("{} ", "repeated".cyan())
            } else {
                "".to_string()
            };

            let type_name = kind_name(&field.kind());

            if field.is_map() {
                out.push_str(&format!(
                    "  // map entry: {} {} = {};\n",
                    type_name,
                    field.name(),
                    field.number()
                ));
            } else {
                out.push_str(&format!(
                    "  {}{}{} {} = {};\n",
                    label,
                    type_name,
                    " ".normal(), // Reset color
                    field.name(),
                    field.number()
                ));
            }
        }

        for extension in extensions {
            out.push_str(&format!(
                "  {} {} {} = {};\n",
                "extend".cyan(),
                kind_name(&extension.kind()),
                extension.full_name(),
                extension.number().to_string().purple()
            ));
        }

        out.push('}');
        FormattedString(out)
    }
}

fn kind_name(kind: &Kind) -> ColoredString {
    match kind {
        Kind::Double => "double".yellow(),
        Kind::Float => "float".yellow(),
        Kind::Int32 => "int32".yellow(),
        Kind::Int64 => "int64".yellow(),
        Kind::Uint32 => "uint32".yellow(),
        Kind::Uint64 => "uint64".yellow(),
        Kind::Sint32 => "sint32".yellow(),
        Kind::Sint64 => "sint64".yellow(),
        Kind::Fixed32 => "fixed32".yellow(),
        Kind::Fixed64 => "fixed64".yellow(),
        Kind::Sfixed32 => "sfixed32".yellow(),
        Kind::Sfixed64 => "sfixed64".yellow(),
        Kind::Bool => "bool".yellow(),
        Kind::String => "string".yellow(),
        Kind::Bytes => "bytes".yellow(),
        Kind::Message(m) => m.full_name().yellow(),
        Kind::Enum(e) => e.full_name().yellow(),
    }
}
