// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Schema command - parse, resolve, and print the flattened message view.

use std::path::PathBuf;

use clap::Args;
use idlcodec::schema::build_view;

use crate::common::{load_schema, Result};

/// Parse and resolve an IDL file, printing its flattened message view.
#[derive(Args, Clone, Debug)]
pub struct SchemaCmd {
    /// IDL source file
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

impl SchemaCmd {
    pub fn run(self) -> Result<()> {
        let schema = load_schema(&self.input)?;
        let view = build_view(&schema)?;
        println!("{}", serde_json::to_string_pretty(&view)?);
        Ok(())
    }
}
