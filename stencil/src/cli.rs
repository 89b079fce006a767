//! # CLI
//!
//! This module defines the command-line interface of `stencil` using `clap`.
//!
//! It is responsible for parsing user input and performing validation (e.g., ensuring headers are `key:value`).
use clap::{Args, Parser, Subcommand};
use std::{path::PathBuf, time::Duration};

#[derive(Parser)]
#[command(name = "stencil", version, about = "Decode Protobuf payloads using a remote schema registry")]
pub struct Cli {
    #[command(flatten)]
    pub registry: RegistryArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args)]
pub struct RegistryArgs {
    /// Registry URL serving a descriptor set (repeat for several registries)
    #[arg(short, long = "url", required = true)]
    pub urls: Vec<String>,

    /// Extra header sent to the registry
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Request timeout in seconds
    #[arg(long, value_parser = parse_timeout, default_value = "10")]
    pub timeout: Duration,

    /// Load the latest version advertised by `{url}/versions` instead of `{url}`
    #[arg(long)]
    pub version_based: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List every message available in the registries
    List,

    /// Describe a message (fields and registered extensions)
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// stencil --url http://localhost:8080/schemas/s describe com.example.Booking
    /// ```
    Describe {
        /// Qualified message name (e.g. com.example.Booking)
        message: String,
    },

    /// Decode a binary payload and print it as JSON
    Parse {
        /// Qualified message name (e.g. com.example.Booking)
        message: String,
        /// Path to the binary payload, read from stdin when omitted
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Encode a JSON body into a binary payload
    Encode {
        /// Qualified message name (e.g. com.example.Booking)
        message: String,
        /// JSON body (Protobuf JSON mapping)
        #[arg(long, value_parser = parse_body)]
        body: serde_json::Value,
        /// Where to write the payload, stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    s.split_once(':')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| "Format must be 'key:value'".to_string())
}

fn parse_body(value: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(value).map_err(|e| format!("Invalid JSON: {e}"))
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    value
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| format!("Invalid timeout '{value}': {e}"))
}
