// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Two-pass name resolution over a parsed [`Schema`](crate::schema::ast::Schema).
//!
//! Pass 1 walks every definition and records the fully-qualified name of
//! every `Struct`/`Union`/`Enum`/`Typedef`. Pass 2 walks every `Field` (and
//! every `Union::switch_type`) and, where the type is not already a
//! primitive or an absolute/qualified name, resolves it by walking the
//! enclosing scope stack from innermost to outermost, stopping at the first
//! match. Typedef chains are followed transparently, composing array
//! dimensions and sequence flags along the way. Constants are evaluated in
//! declaration order as pass 2 descends into each module.

use crate::core::{CodecError, Result};
use crate::schema::ast::{AnnotationValue, Definition, Field, Schema, Typedef, Union};
use std::collections::HashMap;

fn join_scope(scope: &[String], name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", scope.join("::"), name)
    }
}

/// Resolve `schema` in place: rewrite field/switch types to fully-qualified
/// names where possible, follow typedef chains, and evaluate constant
/// expressions. Returns the evaluated constant table (fully-qualified name
/// -> value), useful to callers building the flat schema view.
pub fn resolve(schema: &mut Schema) -> Result<HashMap<String, AnnotationValue>> {
    tracing::debug!(definitions = schema.definitions.len(), "resolver: pass 1 (name index)");
    let mut index = NameIndex::default();
    index.collect(&schema.definitions, &[]);

    tracing::debug!("resolver: pass 2 (rewrite + constant eval)");
    let mut constants = HashMap::new();
    rewrite_definitions(&mut schema.definitions, &[], &index, &mut constants)?;
    tracing::debug!(constants = constants.len(), "resolver: done");
    Ok(constants)
}

/// Pass-1 output: every named type's fully-qualified name, and every
/// typedef's target (by fully-qualified name) for chain-following.
#[derive(Default)]
struct NameIndex {
    struct_names: std::collections::HashSet<String>,
    typedefs: HashMap<String, Typedef>,
}

impl NameIndex {
    fn collect(&mut self, defs: &[Definition], scope: &[String]) {
        for def in defs {
            match def {
                Definition::Struct(s) => {
                    self.struct_names.insert(join_scope(scope, &s.name));
                }
                Definition::Union(u) => {
                    self.struct_names.insert(join_scope(scope, &u.name));
                }
                Definition::Enum(e) => {
                    self.struct_names.insert(join_scope(scope, &e.name));
                }
                Definition::Typedef(t) => {
                    self.typedefs
                        .insert(join_scope(scope, &t.name), t.clone());
                }
                Definition::Module(m) => {
                    let mut inner = scope.to_vec();
                    inner.push(m.name.clone());
                    self.collect(&m.definitions, &inner);
                }
                Definition::Constant(_) => {}
            }
        }
    }

    /// Look up an unqualified or partially-qualified `name` from `scope`,
    /// trying the longest prefix of `scope` first (spec.md §3's "longest
    /// prefix of S" rule / invariant 6 in §8).
    fn resolve_named_type(&self, name: &str, scope: &[String]) -> Option<String> {
        for i in (0..=scope.len()).rev() {
            let candidate = join_scope(&scope[..i], name);
            if self.struct_names.contains(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    fn lookup_typedef(&self, name: &str, scope: &[String]) -> Option<&Typedef> {
        for i in (0..=scope.len()).rev() {
            let candidate = join_scope(&scope[..i], name);
            if let Some(td) = self.typedefs.get(&candidate) {
                return Some(td);
            }
        }
        None
    }
}

/// Follow the typedef chain starting at `field.type_name`, composing array
/// dimensions (outer dimensions precede the typedef's own) and sequence
/// flags, stopping at the first non-typedef type. Cycles are detected via a
/// visited set and reported as `CodecError::TypedefCycle`.
fn follow_typedef_chain(field: &mut Field, index: &NameIndex, scope: &[String]) -> Result<()> {
    let mut visited = std::collections::HashSet::new();
    loop {
        let Some(td) = index.lookup_typedef(&field.type_name, scope) else {
            break;
        };
        if !visited.insert(td.name.clone()) {
            return Err(CodecError::typedef_cycle(td.name.clone()));
        }
        let mut composed: Vec<usize> = field.array_lengths.drain(..).collect();
        composed.extend(td.array_lengths.clone());
        field.array_lengths = composed;
        if !field.is_sequence {
            field.is_sequence = td.is_sequence;
        }
        if field.sequence_bound.is_none() {
            field.sequence_bound = td.sequence_bound;
        }
        field.type_name = td.type_name.clone();
    }
    Ok(())
}

/// Follow the typedef chain for a bare type name (no array/sequence state
/// to compose, unlike [`follow_typedef_chain`]) — used for union switch
/// types, which cannot themselves be arrays or sequences.
fn follow_typedef_chain_for_name(
    type_name: &mut String,
    index: &NameIndex,
    scope: &[String],
) -> Result<()> {
    let mut visited = std::collections::HashSet::new();
    while let Some(td) = index.lookup_typedef(type_name, scope) {
        if !visited.insert(td.name.clone()) {
            return Err(CodecError::typedef_cycle(td.name.clone()));
        }
        *type_name = td.type_name.clone();
    }
    Ok(())
}

/// Rewrite a single type-name string in place (shared by field types and
/// union switch types): absolute (`::`-prefixed) names are stripped of
/// their leading separator and accepted as-is; primitives are left alone;
/// everything else is looked up via [`NameIndex::resolve_named_type`] and
/// left unresolved (deferred to the codec) if lookup fails.
fn rewrite_type_name(type_name: &mut String, index: &NameIndex, scope: &[String]) {
    if crate::schema::ast::PrimitiveType::normalize(type_name).is_some() {
        return;
    }
    if let Some(stripped) = type_name.strip_prefix("::") {
        *type_name = stripped.to_string();
        return;
    }
    if type_name.contains("::") {
        // Already partially qualified by the author; trust it as-is.
        return;
    }
    if let Some(resolved) = index.resolve_named_type(type_name, scope) {
        *type_name = resolved;
    }
}

fn rewrite_field(field: &mut Field, index: &NameIndex, scope: &[String]) -> Result<()> {
    follow_typedef_chain(field, index, scope)?;
    rewrite_type_name(&mut field.type_name, index, scope);
    Ok(())
}

fn rewrite_union(
    u: &mut Union,
    index: &NameIndex,
    scope: &[String],
    constants: &HashMap<String, AnnotationValue>,
) -> Result<()> {
    follow_typedef_chain_for_name(&mut u.switch_type, index, scope)?;
    rewrite_type_name(&mut u.switch_type, index, scope);
    for case in &mut u.cases {
        rewrite_field(&mut case.field, index, scope)?;
        for label in &mut case.labels {
            *label = evaluate_constant(label, constants, scope)?;
        }
    }
    Ok(())
}

fn rewrite_definitions(
    defs: &mut [Definition],
    scope: &[String],
    index: &NameIndex,
    constants: &mut HashMap<String, AnnotationValue>,
) -> Result<()> {
    for def in defs.iter_mut() {
        match def {
            Definition::Struct(s) => {
                for f in &mut s.fields {
                    rewrite_field(f, index, scope)?;
                }
            }
            Definition::Union(u) => rewrite_union(u, index, scope, constants)?,
            Definition::Enum(e) => {
                let mut next = 0i64;
                for enumerator in &mut e.enumerators {
                    let value = match &enumerator.value {
                        AnnotationValue::Int(n) => *n,
                        other => evaluate_constant(other, constants, scope)
                            .ok()
                            .and_then(|v| v.as_i64())
                            .unwrap_or(next),
                    };
                    enumerator.value = AnnotationValue::Int(value);
                    next = value + 1;
                    constants.insert(
                        join_scope(scope, &format!("{}::{}", e.name, enumerator.name)),
                        enumerator.value.clone(),
                    );
                    // Enumerators are also visible unqualified in the scope
                    // enclosing the enum itself, matching `case SPHERE:`
                    // union labels that don't spell out `ST::SPHERE`.
                    constants.insert(join_scope(scope, &enumerator.name), enumerator.value.clone());
                }
            }
            Definition::Typedef(_) => {}
            Definition::Constant(c) => {
                let value = evaluate_constant(&c.value, constants, scope)?;
                c.value = value.clone();
                constants.insert(join_scope(scope, &c.name), value);
            }
            Definition::Module(m) => {
                let mut inner = scope.to_vec();
                inner.push(m.name.clone());
                rewrite_definitions(&mut m.definitions, &inner, index, constants)?;
            }
        }
    }
    Ok(())
}

/// Evaluate a constant expression: a literal, a reference to a previously
/// evaluated constant (unscoped or `Enum::Enumerator`), a sum/difference
/// deferred by the AST builder (`AnnotationValue::Expr`), or (string-typed)
/// concatenation already folded at parse time. Identifier references are
/// resolved against the running constant table via the same
/// innermost-to-outermost scope walk as type names.
fn evaluate_constant(
    value: &AnnotationValue,
    constants: &HashMap<String, AnnotationValue>,
    scope: &[String],
) -> Result<AnnotationValue> {
    match value {
        AnnotationValue::Identifier(name) => {
            for i in (0..=scope.len()).rev() {
                let candidate = join_scope(&scope[..i], name);
                if let Some(v) = constants.get(&candidate) {
                    return Ok(v.clone());
                }
            }
            if let Some(v) = constants.get(name) {
                return Ok(v.clone());
            }
            Err(CodecError::unknown_identifier(
                name.clone(),
                scope.join("::"),
            ))
        }
        AnnotationValue::Expr(lhs, op, rhs) => {
            let lhs = evaluate_constant(lhs, constants, scope)?;
            let rhs = evaluate_constant(rhs, constants, scope)?;
            apply_op(lhs, op, rhs)
        }
        other => Ok(other.clone()),
    }
}

/// Combine two already-evaluated constant values with `op` (`"+"` or
/// `"-"`); string concatenation only supports `+`.
fn apply_op(lhs: AnnotationValue, op: &str, rhs: AnnotationValue) -> Result<AnnotationValue> {
    match (lhs, rhs) {
        (AnnotationValue::Int(a), AnnotationValue::Int(b)) => {
            Ok(AnnotationValue::Int(if op == "+" { a + b } else { a - b }))
        }
        (AnnotationValue::Float(a), AnnotationValue::Float(b)) => {
            Ok(AnnotationValue::Float(if op == "+" { a + b } else { a - b }))
        }
        (AnnotationValue::String(a), AnnotationValue::String(b)) if op == "+" => {
            Ok(AnnotationValue::String(format!("{a}{b}")))
        }
        (lhs, rhs) => Err(CodecError::parse(
            "idl",
            format!("cannot apply operator {op} to {lhs:?} and {rhs:?}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ast::{Constant, Enum, Module, Struct};
    use std::collections::HashMap as Map;

    fn module(name: &str, defs: Vec<Definition>) -> Definition {
        Definition::Module(Module {
            name: name.to_string(),
            definitions: defs,
            annotations: Map::new(),
        })
    }

    fn strukt(name: &str, fields: Vec<Field>) -> Definition {
        Definition::Struct(Struct {
            name: name.to_string(),
            fields,
            annotations: Map::new(),
        })
    }

    #[test]
    fn resolves_unqualified_sibling_reference() {
        let mut schema = Schema {
            definitions: vec![module(
                "pkg",
                vec![
                    strukt("Point", vec![Field::new("x", "double")]),
                    strukt("Line", vec![Field::new("p", "Point")]),
                ],
            )],
        };
        resolve(&mut schema).unwrap();
        let Definition::Module(m) = &schema.definitions[0] else {
            panic!()
        };
        let Definition::Struct(line) = &m.definitions[1] else {
            panic!()
        };
        assert_eq!(line.fields[0].type_name, "pkg::Point");
        // `double` normalized to the canonical spelling during AST build,
        // unaffected by resolution.
    }

    #[test]
    fn longest_prefix_scope_wins() {
        // A::Point exists and top-level Point exists; from inside A::B,
        // A::Point should win over the top-level one.
        let mut schema = Schema {
            definitions: vec![
                strukt("Point", vec![Field::new("x", "double")]),
                module(
                    "A",
                    vec![
                        strukt("Point", vec![Field::new("x", "double")]),
                        module(
                            "B",
                            vec![strukt("Uses", vec![Field::new("p", "Point")])],
                        ),
                    ],
                ),
            ],
        };
        resolve(&mut schema).unwrap();
        let Definition::Module(a) = &schema.definitions[1] else {
            panic!()
        };
        let Definition::Module(b) = &a.definitions[1] else {
            panic!()
        };
        let Definition::Struct(uses) = &b.definitions[0] else {
            panic!()
        };
        assert_eq!(uses.fields[0].type_name, "A::Point");
    }

    #[test]
    fn typedef_chain_composes_array_dims() {
        let mut schema = Schema {
            definitions: vec![
                Definition::Typedef(crate::schema::ast::Typedef {
                    name: "Vec3".to_string(),
                    type_name: "double".to_string(),
                    array_lengths: vec![3],
                    is_sequence: false,
                    sequence_bound: None,
                    annotations: Map::new(),
                }),
                strukt("Triangle", vec![Field::new("vertices", "Vec3")]),
            ],
        };
        resolve(&mut schema).unwrap();
        let Definition::Struct(tri) = &schema.definitions[1] else {
            panic!()
        };
        assert_eq!(tri.fields[0].type_name, "double");
        assert_eq!(tri.fields[0].array_lengths, vec![3]);
    }

    #[test]
    fn typedef_chain_composes_array_dims_field_before_typedef() {
        // typedef double Vec3[3]; struct S { Vec3 rows[4]; };
        // Field dims precede the typedef's own: rows is [4][3], not [3][4].
        let mut schema = Schema {
            definitions: vec![
                Definition::Typedef(crate::schema::ast::Typedef {
                    name: "Vec3".to_string(),
                    type_name: "double".to_string(),
                    array_lengths: vec![3],
                    is_sequence: false,
                    sequence_bound: None,
                    annotations: Map::new(),
                }),
                strukt("S", vec![{
                    let mut f = Field::new("rows", "Vec3");
                    f.array_lengths = vec![4];
                    f
                }]),
            ],
        };
        resolve(&mut schema).unwrap();
        let Definition::Struct(s) = &schema.definitions[1] else {
            panic!()
        };
        assert_eq!(s.fields[0].type_name, "double");
        assert_eq!(s.fields[0].array_lengths, vec![4, 3]);
    }

    #[test]
    fn union_switch_type_follows_typedef_chain() {
        use crate::schema::ast::{Union, UnionCase};
        let mut schema = Schema {
            definitions: vec![
                Definition::Typedef(crate::schema::ast::Typedef {
                    name: "MyDisc".to_string(),
                    type_name: "int32".to_string(),
                    array_lengths: vec![],
                    is_sequence: false,
                    sequence_bound: None,
                    annotations: Map::new(),
                }),
                Definition::Union(Union {
                    name: "U".to_string(),
                    switch_type: "MyDisc".to_string(),
                    cases: vec![UnionCase {
                        labels: vec![AnnotationValue::Int(0)],
                        is_default: false,
                        field: Field::new("x", "double"),
                    }],
                    annotations: Map::new(),
                }),
            ],
        };
        resolve(&mut schema).unwrap();
        let Definition::Union(u) = &schema.definitions[1] else {
            panic!()
        };
        assert_eq!(u.switch_type, "int32");
    }

    #[test]
    fn enum_values_auto_increment() {
        let mut schema = Schema {
            definitions: vec![Definition::Enum(Enum {
                name: "Color".to_string(),
                enumerators: vec![
                    Constant {
                        name: "RED".to_string(),
                        type_name: "uint32".to_string(),
                        value: AnnotationValue::Identifier(String::new()),
                        annotations: Map::new(),
                    },
                    Constant {
                        name: "GREEN".to_string(),
                        type_name: "uint32".to_string(),
                        value: AnnotationValue::Identifier(String::new()),
                        annotations: Map::new(),
                    },
                ],
                annotations: Map::new(),
            })],
        };
        let constants = resolve(&mut schema).unwrap();
        assert_eq!(constants.get("Color::RED"), Some(&AnnotationValue::Int(0)));
        assert_eq!(
            constants.get("Color::GREEN"),
            Some(&AnnotationValue::Int(1))
        );
    }

    #[test]
    fn constant_expression_sum_resolves_prior_constant() {
        let mut schema = Schema {
            definitions: vec![
                Definition::Constant(Constant {
                    name: "A".to_string(),
                    type_name: "int32".to_string(),
                    value: AnnotationValue::Int(1),
                    annotations: Map::new(),
                }),
                Definition::Constant(Constant {
                    name: "B".to_string(),
                    type_name: "int32".to_string(),
                    value: AnnotationValue::Identifier("A".to_string()),
                    annotations: Map::new(),
                }),
            ],
        };
        let constants = resolve(&mut schema).unwrap();
        assert_eq!(constants.get("A"), Some(&AnnotationValue::Int(1)));
        assert_eq!(constants.get("B"), Some(&AnnotationValue::Int(1)));
    }

    #[test]
    fn constant_expression_adds_identifier_and_literal() {
        let mut schema = Schema {
            definitions: vec![
                Definition::Constant(Constant {
                    name: "A".to_string(),
                    type_name: "int32".to_string(),
                    value: AnnotationValue::Int(1),
                    annotations: Map::new(),
                }),
                Definition::Constant(Constant {
                    name: "B".to_string(),
                    type_name: "int32".to_string(),
                    value: AnnotationValue::Expr(
                        Box::new(AnnotationValue::Identifier("A".to_string())),
                        "+".to_string(),
                        Box::new(AnnotationValue::Int(1)),
                    ),
                    annotations: Map::new(),
                }),
            ],
        };
        let constants = resolve(&mut schema).unwrap();
        assert_eq!(constants.get("A"), Some(&AnnotationValue::Int(1)));
        assert_eq!(constants.get("B"), Some(&AnnotationValue::Int(2)));
    }

    #[test]
    fn union_case_labels_resolve_enumerator_references() {
        use crate::schema::ast::{Union, UnionCase};
        let mut schema = Schema {
            definitions: vec![
                Definition::Enum(Enum {
                    name: "ST".to_string(),
                    enumerators: vec![
                        Constant {
                            name: "SPHERE".to_string(),
                            type_name: "uint32".to_string(),
                            value: AnnotationValue::Identifier(String::new()),
                            annotations: Map::new(),
                        },
                        Constant {
                            name: "BOX".to_string(),
                            type_name: "uint32".to_string(),
                            value: AnnotationValue::Identifier(String::new()),
                            annotations: Map::new(),
                        },
                    ],
                    annotations: Map::new(),
                }),
                Definition::Union(Union {
                    name: "Shape".to_string(),
                    switch_type: "ST".to_string(),
                    cases: vec![UnionCase {
                        labels: vec![AnnotationValue::Identifier("SPHERE".to_string())],
                        is_default: false,
                        field: Field::new("radius", "double"),
                    }],
                    annotations: Map::new(),
                }),
            ],
        };
        resolve(&mut schema).unwrap();
        let Definition::Union(shape) = &schema.definitions[1] else {
            panic!()
        };
        assert_eq!(shape.cases[0].labels[0], AnnotationValue::Int(0));
    }

    #[test]
    fn unknown_identifier_is_an_error() {
        let mut schema = Schema {
            definitions: vec![Definition::Constant(Constant {
                name: "B".to_string(),
                type_name: "int32".to_string(),
                value: AnnotationValue::Identifier("NoSuchConst".to_string()),
                annotations: Map::new(),
            })],
        };
        assert!(resolve(&mut schema).is_err());
    }
}
