// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Flat, message-oriented schema view exported from a resolved AST.
//!
//! [`build_view`] walks a resolved [`Schema`](crate::schema::ast::Schema) and
//! projects it into an ordered list of [`MessageDefinition`]s: one per
//! `Struct`, one per `Enum` (its enumerators as constant fields), one per
//! `Union` (a synthetic discriminator field followed by its case fields),
//! and one per module whose immediate children include top-level
//! `Constant`s. Names in this view are `/`-separated; the internal AST uses
//! `::`. Multi-dimensional arrays are rejected here (the internal AST
//! permits them, this view does not).

use crate::core::{CodecError, Result};
use crate::schema::ast::{AnnotationValue, Definition, Schema};
use crate::schema::builtin_types::{BUILTIN_DURATION, BUILTIN_TIME};
use serde::{Deserialize, Serialize};

/// Synthetic field name carrying a decoded union's discriminator value.
pub const UNION_DISCRIMINATOR_PROPERTY_KEY: &str = "$discriminator";

/// One field row of a [`MessageDefinition`].
///
/// Equality is overridden to compare exactly the tuple spec.md §4.8 names;
/// see [`FieldView::eq`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldView {
    pub type_name: String,
    pub name: String,
    pub is_complex: bool,
    pub enum_type: Option<String>,
    pub is_array: bool,
    pub is_sequence: bool,
    pub array_length: Option<usize>,
    pub array_upper_bound: Option<usize>,
    pub upper_bound: Option<usize>,
    pub is_constant: bool,
    pub value: Option<AnnotationValue>,
    pub default_value: Option<AnnotationValue>,
}

impl PartialEq for FieldView {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name
            && self.name == other.name
            && self.is_complex == other.is_complex
            && self.enum_type == other.enum_type
            && self.is_array == other.is_array
            && self.array_length == other.array_length
            && self.array_upper_bound == other.array_upper_bound
            && self.upper_bound == other.upper_bound
            && self.is_constant == other.is_constant
            && self.value == other.value
            && self.default_value == other.default_value
    }
}

/// One exported record: a struct, an enum's constants, a union's
/// discriminator-plus-cases, or a module's top-level constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDefinition {
    pub name: String,
    pub definitions: Vec<FieldView>,
}

impl PartialEq for MessageDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.definitions == other.definitions
    }
}

fn join_path(scope: &[String], name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", scope.join("/"), name)
    }
}

fn ast_path_to_export_path(ast_name: &str) -> String {
    ast_name.replace("::", "/")
}

fn is_enum_typed(type_name: &str, enums: &std::collections::HashSet<String>) -> bool {
    enums.contains(type_name)
}

fn is_struct_or_union(
    type_name: &str,
    structs_and_unions: &std::collections::HashSet<String>,
) -> bool {
    structs_and_unions.contains(type_name)
}

struct TypeTables {
    enums: std::collections::HashSet<String>,
    complex: std::collections::HashSet<String>,
}

fn collect_type_tables(defs: &[Definition], scope: &[String], tables: &mut TypeTables) {
    for def in defs {
        match def {
            Definition::Enum(e) => {
                tables.enums.insert(join_scope_cc(scope, &e.name));
            }
            Definition::Struct(s) => {
                tables.complex.insert(join_scope_cc(scope, &s.name));
            }
            Definition::Union(u) => {
                tables.complex.insert(join_scope_cc(scope, &u.name));
            }
            Definition::Module(m) => {
                let mut inner = scope.to_vec();
                inner.push(m.name.clone());
                collect_type_tables(&m.definitions, &inner, tables);
            }
            Definition::Typedef(_) | Definition::Constant(_) => {}
        }
    }
}

fn join_scope_cc(scope: &[String], name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", scope.join("::"), name)
    }
}

/// Build a field view from a resolved AST field, given the enclosing
/// message's export name (for the Time/Duration `nsec` rename) and the
/// enum/complex-type lookup tables built from the whole schema.
fn field_view(
    field: &crate::schema::ast::Field,
    owner_export_name: &str,
    tables: &TypeTables,
) -> Result<FieldView> {
    if field.array_lengths.len() > 1 {
        return Err(CodecError::multi_dimensional_array_export(
            field.name.clone(),
            field.type_name.clone(),
        ));
    }

    let is_complex = is_struct_or_union(&field.type_name, &tables.complex);
    let enum_type = if is_enum_typed(&field.type_name, &tables.enums) {
        Some(ast_path_to_export_path(&field.type_name))
    } else {
        None
    };
    let type_name = if enum_type.is_some() {
        "uint32".to_string()
    } else if is_complex {
        ast_path_to_export_path(&field.type_name)
    } else {
        field.type_name.clone()
    };

    let mut name = field.name.clone();
    if (owner_export_name == BUILTIN_TIME.replace("::", "/")
        || owner_export_name == BUILTIN_DURATION.replace("::", "/"))
        && name == "nanosec"
    {
        name = "nsec".to_string();
    }

    let array_length = field.array_lengths.first().copied();

    Ok(FieldView {
        type_name,
        name,
        is_complex,
        enum_type,
        is_array: field.is_sequence || !field.array_lengths.is_empty(),
        is_sequence: field.is_sequence,
        array_length,
        array_upper_bound: field.sequence_bound,
        upper_bound: field.string_upper_bound,
        is_constant: field.is_constant,
        value: field.value.clone(),
        default_value: field.default_annotation().cloned(),
    })
}

/// Flatten `schema` (already run through [`crate::schema::resolver::resolve`])
/// into its exported [`MessageDefinition`] list.
pub fn build_view(schema: &Schema) -> Result<Vec<MessageDefinition>> {
    let mut tables = TypeTables {
        enums: std::collections::HashSet::new(),
        complex: std::collections::HashSet::new(),
    };
    collect_type_tables(&schema.definitions, &[], &mut tables);

    let mut out = Vec::new();
    walk(&schema.definitions, &[], &tables, &mut out)?;
    Ok(out)
}

fn walk(
    defs: &[Definition],
    scope: &[String],
    tables: &TypeTables,
    out: &mut Vec<MessageDefinition>,
) -> Result<()> {
    let mut module_constants: Vec<FieldView> = Vec::new();

    for def in defs {
        match def {
            Definition::Struct(s) => {
                let export_name = join_path(scope, &s.name);
                let mut fields = Vec::with_capacity(s.fields.len());
                for f in &s.fields {
                    fields.push(field_view(f, &export_name, tables)?);
                }
                out.push(MessageDefinition {
                    name: export_name,
                    definitions: fields,
                });
            }
            Definition::Enum(e) => {
                let export_name = join_path(scope, &e.name);
                let fields = e
                    .enumerators
                    .iter()
                    .map(|c| FieldView {
                        type_name: "uint32".to_string(),
                        name: c.name.clone(),
                        is_complex: false,
                        enum_type: None,
                        is_array: false,
                        is_sequence: false,
                        array_length: None,
                        array_upper_bound: None,
                        upper_bound: None,
                        is_constant: true,
                        value: Some(c.value.clone()),
                        default_value: None,
                    })
                    .collect();
                out.push(MessageDefinition {
                    name: export_name,
                    definitions: fields,
                });
            }
            Definition::Union(u) => {
                let export_name = join_path(scope, &u.name);
                let mut fields = Vec::with_capacity(u.cases.len() + 1);
                fields.push(FieldView {
                    type_name: u.switch_type.clone(),
                    name: UNION_DISCRIMINATOR_PROPERTY_KEY.to_string(),
                    is_complex: false,
                    enum_type: if is_enum_typed(&u.switch_type, &tables.enums) {
                        Some(ast_path_to_export_path(&u.switch_type))
                    } else {
                        None
                    },
                    is_array: false,
                    is_sequence: false,
                    array_length: None,
                    array_upper_bound: None,
                    upper_bound: None,
                    is_constant: false,
                    value: None,
                    default_value: None,
                });
                for case in &u.cases {
                    fields.push(field_view(&case.field, &export_name, tables)?);
                }
                out.push(MessageDefinition {
                    name: export_name,
                    definitions: fields,
                });
            }
            Definition::Constant(c) => {
                module_constants.push(FieldView {
                    type_name: c.type_name.clone(),
                    name: c.name.clone(),
                    is_complex: false,
                    enum_type: None,
                    is_array: false,
                    is_sequence: false,
                    array_length: None,
                    array_upper_bound: None,
                    upper_bound: None,
                    is_constant: true,
                    value: Some(c.value.clone()),
                    default_value: None,
                });
            }
            Definition::Module(m) => {
                let mut inner = scope.to_vec();
                inner.push(m.name.clone());
                walk(&m.definitions, &inner, tables, out)?;
            }
            Definition::Typedef(_) => {}
        }
    }

    if !module_constants.is_empty() {
        let export_name = join_path(scope, "constants");
        out.push(MessageDefinition {
            name: export_name,
            definitions: module_constants,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ast::{Definition, Field, Module, Schema, Struct};
    use crate::schema::builtin_types::builtin_definitions;
    use crate::schema::resolver::resolve;
    use std::collections::HashMap as Map;

    #[test]
    fn builtin_time_renames_nanosec_to_nsec() {
        let mut schema = Schema {
            definitions: builtin_definitions(),
        };
        resolve(&mut schema).unwrap();
        let view = build_view(&schema).unwrap();
        let time_def = view
            .iter()
            .find(|d| d.name == "builtin_interfaces/msg/Time")
            .expect("Time definition present");
        assert_eq!(time_def.definitions[0].name, "sec");
        assert_eq!(time_def.definitions[1].name, "nsec");
    }

    #[test]
    fn struct_reference_marked_complex() {
        let mut schema = Schema {
            definitions: vec![
                Definition::Struct(Struct {
                    name: "Point".to_string(),
                    fields: vec![Field::new("x", "double")],
                    annotations: Map::new(),
                }),
                Definition::Struct(Struct {
                    name: "Line".to_string(),
                    fields: vec![Field::new("p", "Point")],
                    annotations: Map::new(),
                }),
            ],
        };
        resolve(&mut schema).unwrap();
        let view = build_view(&schema).unwrap();
        let line = view.iter().find(|d| d.name == "Line").unwrap();
        assert!(line.definitions[0].is_complex);
        assert_eq!(line.definitions[0].type_name, "Point");
    }

    #[test]
    fn multi_dimensional_array_rejected() {
        let mut field = Field::new("grid", "int32");
        field.array_lengths = vec![2, 3];
        let schema = Schema {
            definitions: vec![Definition::Struct(Struct {
                name: "Grid".to_string(),
                fields: vec![field],
                annotations: Map::new(),
            })],
        };
        assert!(build_view(&schema).is_err());
    }

    #[test]
    fn nested_module_path_uses_slash_separator() {
        let mut schema = Schema {
            definitions: vec![Definition::Module(Module {
                name: "pkg".to_string(),
                definitions: vec![Definition::Module(Module {
                    name: "msg".to_string(),
                    definitions: vec![Definition::Struct(Struct {
                        name: "Foo".to_string(),
                        fields: vec![Field::new("x", "int32")],
                        annotations: Map::new(),
                    })],
                    annotations: Map::new(),
                })],
                annotations: Map::new(),
            })],
        };
        resolve(&mut schema).unwrap();
        let view = build_view(&schema).unwrap();
        assert_eq!(view[0].name, "pkg/msg/Foo");
    }
}
