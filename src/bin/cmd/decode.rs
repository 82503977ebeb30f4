// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Decode command - turn CDR bytes back into a JSON-shaped value.

use std::path::PathBuf;

use clap::Args;
use idlcodec::encoding::cdr::MessageReader;

use crate::common::{load_schema, Result};

/// Decode hex-encoded bytes against a root type, printing the value as JSON.
#[derive(Args, Clone, Debug)]
pub struct DecodeCmd {
    /// IDL source file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Root type name to decode against
    #[arg(long)]
    root: String,

    /// Hex-encoded CDR bytes
    bytes: String,
}

impl DecodeCmd {
    pub fn run(self) -> Result<()> {
        let schema = load_schema(&self.input)?;

        let bytes = hex::decode(self.bytes.trim())
            .map_err(|e| anyhow::anyhow!("invalid hex input: {e}"))?;
        // The buffer's own header carries the encapsulation kind that matters
        // for alignment/framing; build the reader against the matching kind
        // for delimiter/member-header framing flags.
        let kind = idlcodec::EncapsulationKind::from_byte(
            *bytes.get(1).ok_or_else(|| anyhow::anyhow!("input too short for a CDR header"))?,
        )?;
        let reader = MessageReader::new(&schema, kind)?;

        let value = reader.read_message(&self.root, &bytes)?;
        println!("{}", serde_json::to_string_pretty(&value)?);
        Ok(())
    }
}
