// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # idlcodec CLI
//!
//! Ad-hoc OMG IDL / ROS 2 IDL schema inspection and CDR round-trip
//! smoke-testing.
//!
//! ## Usage
//!
//! ```sh
//! # Print the flattened message view for an IDL file
//! idlcodec schema msg/Point.idl
//!
//! # Encode a JSON value against a root type
//! idlcodec encode msg/Point.idl --root Point '{"x": 1, "y": 2}'
//!
//! # Decode hex bytes against a root type
//! idlcodec decode msg/Point.idl --root Point 0001000001000000...
//! ```

mod cmd;
mod common;

use std::process;

use clap::{Parser, Subcommand};
use cmd::{DecodeCmd, EncodeCmd, SchemaCmd};
use common::Result;

/// idlcodec - OMG IDL / ROS 2 IDL schema parser and CDR message codec.
#[derive(Parser, Clone)]
#[command(name = "idlcodec")]
#[command(about = "OMG IDL / ROS 2 IDL schema parser and CDR message codec", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "ArcheBase")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Clone)]
enum Commands {
    /// Parse + resolve an IDL file, print its flattened message view
    Schema(SchemaCmd),

    /// Encode a JSON value against a root type
    Encode(EncodeCmd),

    /// Decode hex bytes against a root type
    Decode(DecodeCmd),
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Schema(cmd) => cmd.run(),
        Commands::Encode(cmd) => cmd.run(),
        Commands::Decode(cmd) => cmd.run(),
    }
}

fn main() {
    let result = run();

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
