// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Encode command - turn a JSON-shaped value into CDR bytes.

use std::path::PathBuf;

use clap::Args;
use idlcodec::core::DecodedMessage;
use idlcodec::encoding::cdr::MessageWriter;

use crate::common::{load_schema, parse_kind, Result};

/// Encode a JSON value against a root type, printing hex-encoded bytes.
#[derive(Args, Clone, Debug)]
pub struct EncodeCmd {
    /// IDL source file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Root type name to encode against
    #[arg(long)]
    root: String,

    /// Encapsulation kind (e.g. cdr_le, pl_cdr2_le)
    #[arg(long, default_value = "cdr_le")]
    kind: String,

    /// JSON-shaped value to encode
    value: String,
}

impl EncodeCmd {
    pub fn run(self) -> Result<()> {
        let schema = load_schema(&self.input)?;
        let kind = parse_kind(&self.kind)?;
        let writer = MessageWriter::new(&schema, kind)?;

        let value: DecodedMessage = serde_json::from_str(&self.value)
            .map_err(|e| anyhow::anyhow!("invalid JSON value: {e}"))?;

        let bytes = writer.write_message(&self.root, &value)?;
        println!("{}", hex::encode(bytes));
        Ok(())
    }
}
