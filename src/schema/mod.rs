// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! IDL schema parsing, resolution, and the flat schema view.
//!
//! Pipeline: [`parser::parse_idl`] produces a [`ast::Schema`]; splice in
//! [`builtin_types::builtin_definitions`] for well-known `Time`/`Duration`
//! references; [`resolver::resolve`] resolves scoped names, typedef chains,
//! and constants in place; [`view::build_view`] flattens the result into a
//! message-oriented [`view::MessageDefinition`] list.

pub mod ast;
pub mod builtin_types;
pub mod parser;
pub mod resolver;
pub mod view;

pub use ast::{Definition, Field, PrimitiveType, Schema};
pub use resolver::resolve;
pub use view::{build_view, MessageDefinition};

/// Parse `source` and resolve it in one call, splicing in the built-in
/// `builtin_interfaces::msg::{Time,Duration}` definitions first so schemas
/// that reference them without declaring them still resolve.
pub fn parse_and_resolve(source: &str) -> crate::core::Result<Schema> {
    let mut schema = parser::parse_idl(source)?;
    let mut defs = builtin_types::builtin_definitions();
    defs.append(&mut schema.definitions);
    schema.definitions = defs;
    resolver::resolve(&mut schema)?;
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_resolve_splices_builtins() {
        let schema = parse_and_resolve(
            "module pkg { struct Header { builtin_interfaces::msg::Time stamp; }; };",
        )
        .unwrap();
        let view = build_view(&schema).unwrap();
        assert!(view.iter().any(|d| d.name == "builtin_interfaces/msg/Time"));
        let header = view.iter().find(|d| d.name == "pkg/Header").unwrap();
        assert!(header.definitions[0].is_complex);
    }
}
