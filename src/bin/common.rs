// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for CLI commands.

use std::path::Path;

use idlcodec::schema::Schema;

pub use anyhow::Result as CliResult;
pub type Result<T = ()> = CliResult<T>;

/// Read and parse+resolve an IDL file.
pub fn load_schema(path: &Path) -> Result<Schema> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    Ok(idlcodec::parse_and_resolve(&source)?)
}

/// Parse an `idlcodec` encapsulation kind name (`cdr_le`, `pl_cdr2_be`, ...).
pub fn parse_kind(name: &str) -> Result<idlcodec::EncapsulationKind> {
    use idlcodec::EncapsulationKind::*;
    Ok(match name.to_ascii_lowercase().as_str() {
        "cdr_be" => CdrBe,
        "cdr_le" => CdrLe,
        "pl_cdr_be" => PlCdrBe,
        "pl_cdr_le" => PlCdrLe,
        "cdr2_be" => Cdr2Be,
        "cdr2_le" => Cdr2Le,
        "pl_cdr2_be" => PlCdr2Be,
        "pl_cdr2_le" => PlCdr2Le,
        "delimited_cdr2_be" => DelimitedCdr2Be,
        "delimited_cdr2_le" => DelimitedCdr2Le,
        "rtps_cdr2_be" => RtpsCdr2Be,
        "rtps_cdr2_le" => RtpsCdr2Le,
        other => return Err(anyhow::anyhow!("unknown encapsulation kind '{other}'")),
    })
}
