//! # Stencil CLI Entry Point
//!
//! The main executable for the Stencil tool. This file drives the application lifecycle:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`] and installs the log subscriber.
//! 2. **Loading**: Downloads the descriptor sets of every registry URL via `stencil_core`.
//! 3. **Execution**: Looks up, decodes or encodes the requested message.
//! 4. **Presentation**: Formats and prints the resulting data or error to standard output/error.

mod cli;
mod formatter;

use clap::Parser;
use cli::{Cli, Commands, RegistryArgs};
use formatter::{FormattedString, GenericError, MessageList, MessageSchema};
use std::{
    io::{Read, Write},
    path::PathBuf,
    process,
};
use stencil_core::{Client, Options, RefreshStrategy};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let client = connect_or_exit(args.registry).await;

    match args.command {
        Commands::List => println!("{}", FormattedString::from(MessageList(client.message_names()))),
        Commands::Describe { message } => describe_message(&client, &message),
        Commands::Parse { message, file } => parse_message(&client, &message, file),
        Commands::Encode { message, body, out } => encode_message(&client, &message, body, out),
    }

    client.close();
}

async fn connect_or_exit(args: RegistryArgs) -> Client {
    let strategy = if args.version_based {
        RefreshStrategy::VersionBased
    } else {
        RefreshStrategy::LongPolling
    };

    let mut options = Options::default()
        .with_timeout(args.timeout)
        .with_refresh_strategy(strategy);
    for (key, value) in args.headers {
        options = options.with_header(key, value);
    }

    match Client::new_multi_url(args.urls, options).await {
        Ok(client) => client,
        Err(err) => {
            eprintln!("{}", FormattedString::from(err));
            process::exit(1);
        }
    }
}

fn describe_message(client: &Client, message: &str) {
    let described = client.get_descriptor(message).and_then(|descriptor| {
        client
            .get_extensions(message)
            .map(|extensions| MessageSchema(descriptor, extensions))
    });

    match described {
        Ok(schema) => println!("{}", FormattedString::from(schema)),
        Err(err) => {
            eprintln!("{}", FormattedString::from(err));
            process::exit(1);
        }
    }
}

fn parse_message(client: &Client, message: &str, file: Option<PathBuf>) {
    let bytes = match read_payload(file) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("{}", FormattedString::from(err));
            process::exit(1);
        }
    };

    let decoded = match client.parse(message, &bytes) {
        Ok(decoded) => decoded,
        Err(err) => {
            eprintln!("{}", FormattedString::from(err));
            process::exit(1);
        }
    };

    match serde_json::to_value(&decoded) {
        Ok(value) => println!("{}", FormattedString::from(value)),
        Err(err) => {
            eprintln!(
                "{}",
                FormattedString::from(GenericError("Failed to map message to JSON", err))
            );
            process::exit(1);
        }
    }
}

fn encode_message(
    client: &Client,
    message: &str,
    body: serde_json::Value,
    out: Option<PathBuf>,
) {
    let bytes = match client.serialize(message, body) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("{}", FormattedString::from(err));
            process::exit(1);
        }
    };

    let written = match out {
        Some(path) => std::fs::write(path, &bytes),
        None => std::io::stdout().write_all(&bytes),
    };

    if let Err(err) = written {
        eprintln!(
            "{}",
            FormattedString::from(GenericError("Failed to write payload", err))
        );
        process::exit(1);
    }
}

fn read_payload(file: Option<PathBuf>) -> std::io::Result<Vec<u8>> {
    match file {
        Some(path) => std::fs::read(path),
        None => {
            let mut bytes = Vec::new();
            std::io::stdin().read_to_end(&mut bytes)?;
            Ok(bytes)
        }
    }
}
