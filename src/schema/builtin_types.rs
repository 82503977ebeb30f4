// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Predefined `builtin_interfaces` message types.
//!
//! These are pre-registered before a user schema resolves, since IDL schemas
//! commonly reference `builtin_interfaces::msg::Time`/`Duration` (for
//! example as the type of a `Header.stamp` field) without declaring them.
//! Both keep their source field name `nanosec`; the `nanosec` -> `nsec`
//! rename named in spec.md §4.3 happens only in the flat schema view
//! ([`crate::schema::view`]), not here.

use crate::schema::ast::{Definition, Field, Module, Struct};
use std::collections::HashMap;

fn time_like_struct(name: &str) -> Struct {
    Struct {
        name: name.to_string(),
        fields: vec![
            Field::new("sec", "int32"),
            Field::new("nanosec", "uint32"),
        ],
        annotations: HashMap::new(),
    }
}

/// `builtin_interfaces::msg::{Time,Duration}` nested inside their module
/// path, ready to splice into a parsed schema's top-level definitions.
pub fn builtin_definitions() -> Vec<Definition> {
    let msg_module = Module {
        name: "msg".to_string(),
        definitions: vec![
            Definition::Struct(time_like_struct("Time")),
            Definition::Struct(time_like_struct("Duration")),
        ],
        annotations: HashMap::new(),
    };
    vec![Definition::Module(Module {
        name: "builtin_interfaces".to_string(),
        definitions: vec![Definition::Module(msg_module)],
        annotations: HashMap::new(),
    })]
}

/// The fully-qualified names of the builtin struct types, for callers that
/// want to special-case their presentation (such as the `nsec` rename).
pub const BUILTIN_TIME: &str = "builtin_interfaces::msg::Time";
pub const BUILTIN_DURATION: &str = "builtin_interfaces::msg::Duration";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_definitions_nest_time_and_duration() {
        let defs = builtin_definitions();
        assert_eq!(defs.len(), 1);
        let Definition::Module(root) = &defs[0] else {
            panic!("expected module");
        };
        assert_eq!(root.name, "builtin_interfaces");
        let Definition::Module(msg) = &root.definitions[0] else {
            panic!("expected nested module");
        };
        assert_eq!(msg.definitions.len(), 2);
    }
}
