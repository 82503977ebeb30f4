// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Deserialization info cache: precomputed, shared field plans for every
//! struct/union reachable from a resolved schema.
//!
//! Plans are built once per `(schema, encapsulation_kind)` pair and stored in
//! an arena keyed by fully-qualified type name. A field referencing a
//! complex type keeps only that type's name ([`FieldKind::Struct`] /
//! [`FieldKind::Union`]); the writer/reader look the plan up in the arena at
//! use time instead of the field plan owning it directly, so cyclic schema
//! graphs (a struct that contains itself, directly or through a sequence)
//! never require unbounded recursion to build.

use crate::core::{CodecError, CodecValue, DecodedMessage, Result};
use crate::schema::ast::{AnnotationValue, Definition, Field, PrimitiveType, Schema, Struct, Union};
use crate::encoding::cdr::kind::EncapsulationKind;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// How a field's declared type resolves for wire purposes. Enum-typed
/// fields resolve to `Primitive(UInt32)`, matching the flat schema view's
/// `enumType` treatment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Primitive(PrimitiveType),
    Struct(String),
    Union(String),
}

#[derive(Debug, Clone)]
pub struct FieldPlan {
    pub name: String,
    pub kind: FieldKind,
    pub array_lengths: Vec<usize>,
    pub is_sequence: bool,
    pub sequence_bound: Option<usize>,
    pub string_upper_bound: Option<usize>,
    pub is_constant: bool,
    pub constant_value: Option<AnnotationValue>,
    pub default_value: Option<AnnotationValue>,
    /// Member id used by the XCDR2 parameter-list framing; meaningless
    /// outside that mode. 0 for constant fields, which are never framed.
    pub pid: u32,
}

impl FieldPlan {
    pub fn is_array(&self) -> bool {
        !self.array_lengths.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct StructPlan {
    pub name: String,
    pub fields: Vec<FieldPlan>,
    pub uses_delimiter_header: bool,
    pub uses_member_header: bool,
}

#[derive(Debug, Clone)]
pub struct UnionCasePlan {
    pub labels: Vec<i64>,
    pub is_default: bool,
    pub field: FieldPlan,
}

#[derive(Debug, Clone)]
pub struct UnionPlan {
    pub name: String,
    pub switch_kind: FieldKind,
    pub cases: Vec<UnionCasePlan>,
    pub uses_delimiter_header: bool,
    pub uses_member_header: bool,
}

impl UnionPlan {
    /// The case matching `discriminator`, falling back to the default arm.
    pub fn case_for(&self, discriminator: i64) -> Option<&UnionCasePlan> {
        self.cases
            .iter()
            .find(|c| !c.is_default && c.labels.contains(&discriminator))
            .or_else(|| self.cases.iter().find(|c| c.is_default))
    }
}

pub struct DeserializationInfoCache {
    structs: HashMap<String, Arc<StructPlan>>,
    unions: HashMap<String, Arc<UnionPlan>>,
}

impl DeserializationInfoCache {
    pub fn build(schema: &Schema, kind: EncapsulationKind) -> Result<Self> {
        let mut enums = HashSet::new();
        let mut structs_by_name: HashMap<String, &Struct> = HashMap::new();
        let mut unions_by_name: HashMap<String, &Union> = HashMap::new();
        collect(
            &schema.definitions,
            &[],
            &mut enums,
            &mut structs_by_name,
            &mut unions_by_name,
        );

        let mut structs = HashMap::with_capacity(structs_by_name.len());
        for (name, s) in &structs_by_name {
            let plan = build_struct_plan(name, s, &enums, &structs_by_name, &unions_by_name, kind)?;
            structs.insert(name.clone(), Arc::new(plan));
        }

        let mut unions = HashMap::with_capacity(unions_by_name.len());
        for (name, u) in &unions_by_name {
            let plan = build_union_plan(name, u, &enums, &structs_by_name, &unions_by_name, kind)?;
            unions.insert(name.clone(), Arc::new(plan));
        }

        Ok(Self { structs, unions })
    }

    pub fn get_struct(&self, name: &str) -> Option<&Arc<StructPlan>> {
        self.structs.get(name)
    }

    pub fn get_union(&self, name: &str) -> Option<&Arc<UnionPlan>> {
        self.unions.get(name)
    }

    /// Resolve `root_name` to its struct plan, the only shape a writer/reader
    /// can be constructed against.
    pub fn resolve_root(&self, root_name: &str) -> Result<Arc<StructPlan>> {
        self.structs
            .get(root_name)
            .cloned()
            .ok_or_else(|| CodecError::unknown_root_definition(root_name))
    }

    /// The default-valued map for `plan`: constants materialized with their
    /// declared value, every other field defaulted per spec.md §4.5.
    pub fn default_for_plan(&self, plan: &StructPlan) -> DecodedMessage {
        let mut msg = DecodedMessage::with_capacity(plan.fields.len());
        for field in &plan.fields {
            if field.is_constant {
                if let Some(v) = &field.constant_value {
                    msg.insert(field.name.clone(), typed_annotation_value(&field.kind, v));
                }
                continue;
            }
            msg.insert(field.name.clone(), self.default_for_field(field));
        }
        msg
    }

    pub fn default_for_field(&self, field: &FieldPlan) -> CodecValue {
        if let Some(default) = &field.default_value {
            return typed_annotation_value(&field.kind, default);
        }
        if field.is_array() || field.is_sequence {
            return CodecValue::Array(Vec::new());
        }
        self.zero_value_for_kind(&field.kind)
    }

    /// The default value for a single array/sequence element of `field`,
    /// ignoring its own array-ness. Used to pad a short input array out to
    /// its schema-declared fixed length.
    pub fn default_element(&self, field: &FieldPlan) -> CodecValue {
        self.zero_value_for_kind(&field.kind)
    }

    pub(crate) fn zero_value_for_kind(&self, kind: &FieldKind) -> CodecValue {
        match kind {
            FieldKind::Primitive(p) => zero_primitive(*p),
            FieldKind::Struct(name) => self
                .structs
                .get(name)
                .map(|plan| CodecValue::Struct(self.default_for_plan(plan)))
                .unwrap_or(CodecValue::Null),
            FieldKind::Union(name) => self
                .unions
                .get(name)
                .map(|plan| CodecValue::Struct(self.default_for_union(plan)))
                .unwrap_or(CodecValue::Null),
        }
    }

    fn default_for_union(&self, plan: &UnionPlan) -> DecodedMessage {
        let mut msg = DecodedMessage::new();
        msg.insert(
            crate::schema::view::UNION_DISCRIMINATOR_PROPERTY_KEY,
            self.zero_value_for_kind(&plan.switch_kind),
        );
        msg
    }
}

fn zero_primitive(p: PrimitiveType) -> CodecValue {
    match p {
        PrimitiveType::Bool => CodecValue::Bool(false),
        PrimitiveType::Int8 => CodecValue::Int8(0),
        PrimitiveType::UInt8 => CodecValue::UInt8(0),
        PrimitiveType::Int16 => CodecValue::Int16(0),
        PrimitiveType::UInt16 => CodecValue::UInt16(0),
        PrimitiveType::Int32 => CodecValue::Int32(0),
        PrimitiveType::UInt32 => CodecValue::UInt32(0),
        PrimitiveType::Int64 => CodecValue::Int64(0),
        PrimitiveType::UInt64 => CodecValue::UInt64(0),
        PrimitiveType::Float32 => CodecValue::Float32(0.0),
        PrimitiveType::Float64 => CodecValue::Float64(0.0),
        PrimitiveType::String | PrimitiveType::WString => CodecValue::String(String::new()),
    }
}

fn annotation_as_f64(value: &AnnotationValue) -> Option<f64> {
    match value {
        AnnotationValue::Float(f) => Some(*f),
        _ => value.as_i64().map(|n| n as f64),
    }
}

/// Convert a constant or `@default(...)` annotation value into the
/// correctly-typed [`CodecValue`] for `kind`. Complex kinds have no literal
/// representation and fall back to `Null`; annotations never target them.
fn typed_annotation_value(kind: &FieldKind, value: &AnnotationValue) -> CodecValue {
    let FieldKind::Primitive(p) = kind else {
        return CodecValue::Null;
    };
    match p {
        PrimitiveType::Bool => CodecValue::Bool(match value {
            AnnotationValue::Bool(b) => *b,
            other => other.as_i64().unwrap_or(0) != 0,
        }),
        PrimitiveType::Int8 => CodecValue::Int8(value.as_i64().unwrap_or(0) as i8),
        PrimitiveType::UInt8 => CodecValue::UInt8(value.as_i64().unwrap_or(0) as u8),
        PrimitiveType::Int16 => CodecValue::Int16(value.as_i64().unwrap_or(0) as i16),
        PrimitiveType::UInt16 => CodecValue::UInt16(value.as_i64().unwrap_or(0) as u16),
        PrimitiveType::Int32 => CodecValue::Int32(value.as_i64().unwrap_or(0) as i32),
        PrimitiveType::UInt32 => CodecValue::UInt32(value.as_i64().unwrap_or(0) as u32),
        PrimitiveType::Int64 => CodecValue::Int64(value.as_i64().unwrap_or(0)),
        PrimitiveType::UInt64 => CodecValue::UInt64(value.as_i64().unwrap_or(0) as u64),
        PrimitiveType::Float32 => CodecValue::Float32(annotation_as_f64(value).unwrap_or(0.0) as f32),
        PrimitiveType::Float64 => CodecValue::Float64(annotation_as_f64(value).unwrap_or(0.0)),
        PrimitiveType::String | PrimitiveType::WString => {
            CodecValue::String(value.as_str().unwrap_or("").to_string())
        }
    }
}

fn join_scope(scope: &[String], name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", scope.join("::"), name)
    }
}

fn collect<'a>(
    defs: &'a [Definition],
    scope: &[String],
    enums: &mut HashSet<String>,
    structs: &mut HashMap<String, &'a Struct>,
    unions: &mut HashMap<String, &'a Union>,
) {
    for def in defs {
        match def {
            Definition::Enum(e) => {
                enums.insert(join_scope(scope, &e.name));
            }
            Definition::Struct(s) => {
                structs.insert(join_scope(scope, &s.name), s);
            }
            Definition::Union(u) => {
                unions.insert(join_scope(scope, &u.name), u);
            }
            Definition::Module(m) => {
                let mut inner = scope.to_vec();
                inner.push(m.name.clone());
                collect(&m.definitions, &inner, enums, structs, unions);
            }
            Definition::Typedef(_) | Definition::Constant(_) => {}
        }
    }
}

fn classify_field_kind(
    field_name: &str,
    type_name: &str,
    enums: &HashSet<String>,
    structs: &HashMap<String, &Struct>,
    unions: &HashMap<String, &Union>,
) -> Result<FieldKind> {
    if let Some(p) = PrimitiveType::from_canonical_name(type_name) {
        return Ok(FieldKind::Primitive(p));
    }
    if enums.contains(type_name) {
        return Ok(FieldKind::Primitive(PrimitiveType::UInt32));
    }
    if structs.contains_key(type_name) {
        return Ok(FieldKind::Struct(type_name.to_string()));
    }
    if unions.contains_key(type_name) {
        return Ok(FieldKind::Union(type_name.to_string()));
    }
    Err(CodecError::unrecognized_field_type(field_name, type_name))
}

fn build_field_plan(
    field: &Field,
    next_pid: &mut u32,
    enums: &HashSet<String>,
    structs: &HashMap<String, &Struct>,
    unions: &HashMap<String, &Union>,
) -> Result<FieldPlan> {
    let kind = classify_field_kind(&field.name, &field.type_name, enums, structs, unions)?;
    let pid = if field.is_constant {
        0
    } else {
        let assigned = field.explicit_id().unwrap_or(*next_pid);
        *next_pid += 1;
        assigned
    };
    Ok(FieldPlan {
        name: field.name.clone(),
        kind,
        array_lengths: field.array_lengths.clone(),
        is_sequence: field.is_sequence,
        sequence_bound: field.sequence_bound,
        string_upper_bound: field.string_upper_bound,
        is_constant: field.is_constant,
        constant_value: if field.is_constant {
            field.value.clone()
        } else {
            None
        },
        default_value: field.default_annotation().cloned(),
        pid,
    })
}

fn build_struct_plan(
    name: &str,
    s: &Struct,
    enums: &HashSet<String>,
    structs: &HashMap<String, &Struct>,
    unions: &HashMap<String, &Union>,
    kind: EncapsulationKind,
) -> Result<StructPlan> {
    let mut next_pid = 1u32;
    let mut fields = Vec::with_capacity(s.fields.len());
    for f in &s.fields {
        fields.push(build_field_plan(f, &mut next_pid, enums, structs, unions)?);
    }
    Ok(StructPlan {
        name: name.to_string(),
        fields,
        uses_delimiter_header: kind.uses_delimiter_header(),
        uses_member_header: kind.uses_member_header(),
    })
}

fn build_union_plan(
    name: &str,
    u: &Union,
    enums: &HashSet<String>,
    structs: &HashMap<String, &Struct>,
    unions: &HashMap<String, &Union>,
    kind: EncapsulationKind,
) -> Result<UnionPlan> {
    let switch_kind = classify_field_kind(name, &u.switch_type, enums, structs, unions)?;
    // PID 1 is reserved for the discriminator in parameter-list framing.
    let mut next_pid = 2u32;
    let mut cases = Vec::with_capacity(u.cases.len());
    for case in &u.cases {
        let field = build_field_plan(&case.field, &mut next_pid, enums, structs, unions)?;
        let labels = case
            .labels
            .iter()
            .map(|l| {
                l.as_i64().ok_or_else(|| {
                    CodecError::invariant_violation(format!(
                        "union '{name}' case label did not resolve to an integer: {l:?}"
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        cases.push(UnionCasePlan {
            labels,
            is_default: case.is_default,
            field,
        });
    }
    Ok(UnionPlan {
        name: name.to_string(),
        switch_kind,
        cases,
        uses_delimiter_header: kind.uses_delimiter_header(),
        uses_member_header: kind.uses_member_header(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_and_resolve;

    #[test]
    fn builds_plan_with_sequential_pids() {
        let schema = parse_and_resolve("struct A { int32 num; uint8 flag; };").unwrap();
        let cache = DeserializationInfoCache::build(&schema, EncapsulationKind::PlCdr2Le).unwrap();
        let plan = cache.resolve_root("A").unwrap();
        assert_eq!(plan.fields[0].pid, 1);
        assert_eq!(plan.fields[1].pid, 2);
    }

    #[test]
    fn explicit_id_overrides_auto_pid() {
        let schema = parse_and_resolve(
            "struct A { @id(5) int32 num; uint8 flag; };",
        )
        .unwrap();
        let cache = DeserializationInfoCache::build(&schema, EncapsulationKind::PlCdr2Le).unwrap();
        let plan = cache.resolve_root("A").unwrap();
        assert_eq!(plan.fields[0].pid, 5);
        assert_eq!(plan.fields[1].pid, 2);
    }

    #[test]
    fn constant_field_is_flagged_and_excluded_from_pid_sequence() {
        let schema = parse_and_resolve(
            "struct A { const int32 CONST = 5; int32 num; };",
        )
        .unwrap();
        let cache = DeserializationInfoCache::build(&schema, EncapsulationKind::CdrLe).unwrap();
        let plan = cache.resolve_root("A").unwrap();
        assert!(plan.fields[0].is_constant);
        assert_eq!(plan.fields[0].pid, 0);
        assert_eq!(plan.fields[1].pid, 1);
    }

    #[test]
    fn default_for_plan_materializes_constants_and_zeroes_fields() {
        let schema = parse_and_resolve(
            "struct A { const int32 CONST = 5; int32 num; };",
        )
        .unwrap();
        let cache = DeserializationInfoCache::build(&schema, EncapsulationKind::CdrLe).unwrap();
        let plan = cache.resolve_root("A").unwrap();
        let default = cache.default_for_plan(&plan);
        assert_eq!(default.get("CONST"), Some(&CodecValue::Int32(5)));
        assert_eq!(default.get("num"), Some(&CodecValue::Int32(0)));
    }

    #[test]
    fn unrecognized_type_is_an_error() {
        let schema = parse_and_resolve("struct A { Nope x; };").unwrap();
        assert!(DeserializationInfoCache::build(&schema, EncapsulationKind::CdrLe).is_err());
    }
}
