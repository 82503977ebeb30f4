// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Typed AST produced by the grammar/AST-builder stage and mutated in place
//! by the resolver.
//!
//! Node shapes follow the data model: a [`Field`] carries its declared type
//! as a string tag (primitive or scoped name) rather than a resolved
//! pointer, so that resolution can rewrite it in place without restructuring
//! the tree; [`Struct`]/[`Union`]/[`Enum`]/[`Typedef`] each own exactly one
//! fully-qualified name once nested inside their enclosing [`Module`]s.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Canonical, normalized primitive type tags.
///
/// IDL source spellings (`short`, `long long`, `unsigned short`, `double`,
/// `long double`, `float`, `octet`/`byte`, `char`/`wchar`, `boolean`) are
/// normalized to this set during AST construction; see
/// [`PrimitiveType::normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Bool,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    String,
    WString,
}

impl PrimitiveType {
    /// Normalize a raw IDL base-type spelling to its canonical tag, per the
    /// exact table in spec.md §4.1. Returns `None` if `spelling` is not a
    /// recognized IDL base type.
    pub fn normalize(spelling: &str) -> Option<Self> {
        Some(match spelling {
            "boolean" => PrimitiveType::Bool,
            "int8" => PrimitiveType::Int8,
            "octet" | "byte" | "uint8" | "char" => PrimitiveType::UInt8,
            "short" | "int16" => PrimitiveType::Int16,
            "unsigned short" | "uint16" | "wchar" => PrimitiveType::UInt16,
            "long" | "int32" => PrimitiveType::Int32,
            "unsigned long" | "uint32" => PrimitiveType::UInt32,
            "long long" | "int64" => PrimitiveType::Int64,
            "unsigned long long" | "uint64" => PrimitiveType::UInt64,
            "float" => PrimitiveType::Float32,
            "double" | "long double" => PrimitiveType::Float64,
            "string" => PrimitiveType::String,
            "wstring" => PrimitiveType::WString,
            _ => return None,
        })
    }

    /// Canonical spelling, used both for re-serialization and as the `type`
    /// string stored on resolved [`Field`]s.
    pub fn canonical_name(&self) -> &'static str {
        match self {
            PrimitiveType::Bool => "bool",
            PrimitiveType::Int8 => "int8",
            PrimitiveType::UInt8 => "uint8",
            PrimitiveType::Int16 => "int16",
            PrimitiveType::UInt16 => "uint16",
            PrimitiveType::Int32 => "int32",
            PrimitiveType::UInt32 => "uint32",
            PrimitiveType::Int64 => "int64",
            PrimitiveType::UInt64 => "uint64",
            PrimitiveType::Float32 => "float32",
            PrimitiveType::Float64 => "float64",
            PrimitiveType::String => "string",
            PrimitiveType::WString => "wstring",
        }
    }

    pub fn from_canonical_name(name: &str) -> Option<Self> {
        Some(match name {
            "bool" => PrimitiveType::Bool,
            "int8" => PrimitiveType::Int8,
            "uint8" => PrimitiveType::UInt8,
            "int16" => PrimitiveType::Int16,
            "uint16" => PrimitiveType::UInt16,
            "int32" => PrimitiveType::Int32,
            "uint32" => PrimitiveType::UInt32,
            "int64" => PrimitiveType::Int64,
            "uint64" => PrimitiveType::UInt64,
            "float32" => PrimitiveType::Float32,
            "float64" => PrimitiveType::Float64,
            "string" => PrimitiveType::String,
            "wstring" => PrimitiveType::WString,
            _ => return None,
        })
    }

    /// Alignment/width in bytes of a single element on the wire. Strings
    /// report the alignment of their length prefix (4); their body is
    /// unaligned byte data.
    pub fn alignment(&self) -> usize {
        match self {
            PrimitiveType::Bool | PrimitiveType::Int8 | PrimitiveType::UInt8 => 1,
            PrimitiveType::Int16 | PrimitiveType::UInt16 => 2,
            PrimitiveType::Int32 | PrimitiveType::UInt32 | PrimitiveType::Float32 => 4,
            PrimitiveType::Int64 | PrimitiveType::UInt64 | PrimitiveType::Float64 => 8,
            PrimitiveType::String | PrimitiveType::WString => 4,
        }
    }

    /// Fixed element width in bytes, for types with one (not `string`/
    /// `wstring`, which are variable-length).
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            PrimitiveType::String | PrimitiveType::WString => None,
            other => Some(other.alignment()),
        }
    }
}

/// An annotation attached to a definition or field: `@Name`,
/// `@Name(positional)`, or `@Name(k1=v1, k2=v2, ...)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Annotation {
    NoParams,
    ConstParam(AnnotationValue),
    NamedParams(HashMap<String, AnnotationValue>),
}

/// A literal value carried by an annotation or constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnnotationValue {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Identifier(String),
    /// A sum/difference that couldn't be folded at parse time because one
    /// side is an identifier; carried through to constant evaluation, which
    /// resolves both sides against the running constant table before
    /// combining them.
    Expr(Box<AnnotationValue>, String, Box<AnnotationValue>),
}

impl AnnotationValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AnnotationValue::Int(v) => Some(*v),
            AnnotationValue::Bool(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnnotationValue::String(v) => Some(v),
            _ => None,
        }
    }
}

/// A struct/union field, an enumerator, or a typedef target.
///
/// `type_name` starts out as whatever the grammar captured (a primitive tag
/// or an unqualified/partially-qualified scoped name) and is rewritten to a
/// fully-qualified name by the resolver when it denotes a named type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub type_name: String,
    /// Array dimensions in declaration order, outermost first. Empty if
    /// not an array. More than one entry means a multi-dimensional array
    /// (permitted in the AST; rejected when flattening to the export view).
    pub array_lengths: Vec<usize>,
    pub is_sequence: bool,
    pub sequence_bound: Option<usize>,
    pub string_upper_bound: Option<usize>,
    pub is_constant: bool,
    pub value: Option<AnnotationValue>,
    pub annotations: HashMap<String, Annotation>,
}

impl Field {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Field {
            name: name.into(),
            type_name: type_name.into(),
            array_lengths: Vec::new(),
            is_sequence: false,
            sequence_bound: None,
            string_upper_bound: None,
            is_constant: false,
            value: None,
            annotations: HashMap::new(),
        }
    }

    pub fn is_array(&self) -> bool {
        !self.array_lengths.is_empty()
    }

    /// The `@id(N)` override, if present.
    pub fn explicit_id(&self) -> Option<u32> {
        match self.annotations.get("id") {
            Some(Annotation::ConstParam(v)) => v.as_i64().map(|n| n as u32),
            _ => None,
        }
    }

    /// The `@default(...)` value, if present.
    pub fn default_annotation(&self) -> Option<&AnnotationValue> {
        match self.annotations.get("default") {
            Some(Annotation::ConstParam(v)) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Struct {
    pub name: String,
    pub fields: Vec<Field>,
    pub annotations: HashMap<String, Annotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constant {
    pub name: String,
    pub type_name: String,
    pub value: AnnotationValue,
    pub annotations: HashMap<String, Annotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enum {
    pub name: String,
    pub enumerators: Vec<Constant>,
    pub annotations: HashMap<String, Annotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Typedef {
    pub name: String,
    pub type_name: String,
    pub array_lengths: Vec<usize>,
    pub is_sequence: bool,
    pub sequence_bound: Option<usize>,
    pub annotations: HashMap<String, Annotation>,
}

/// One `case label(s) -> field` arm of a union, or the `default` arm when
/// `labels` is empty and `is_default` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionCase {
    pub labels: Vec<AnnotationValue>,
    pub is_default: bool,
    pub field: Field,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Union {
    pub name: String,
    pub switch_type: String,
    pub cases: Vec<UnionCase>,
    pub annotations: HashMap<String, Annotation>,
}

impl Union {
    pub fn default_case(&self) -> Option<&UnionCase> {
        self.cases.iter().find(|c| c.is_default)
    }

    pub fn non_default_cases(&self) -> impl Iterator<Item = &UnionCase> {
        self.cases.iter().filter(|c| !c.is_default)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub definitions: Vec<Definition>,
    pub annotations: HashMap<String, Annotation>,
}

/// One member of a `Module`'s heterogeneous, ordered definition list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Definition {
    Module(Module),
    Struct(Struct),
    Enum(Enum),
    Typedef(Typedef),
    Union(Union),
    Constant(Constant),
}

impl Definition {
    pub fn name(&self) -> &str {
        match self {
            Definition::Module(m) => &m.name,
            Definition::Struct(s) => &s.name,
            Definition::Enum(e) => &e.name,
            Definition::Typedef(t) => &t.name,
            Definition::Union(u) => &u.name,
            Definition::Constant(c) => &c.name,
        }
    }
}

/// A parsed and (once the resolver has run) fully resolved compilation
/// unit: the top-level, unnamed scope's list of definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Schema {
    pub definitions: Vec<Definition>,
}

impl Schema {
    pub fn new() -> Self {
        Schema::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_primitive_spellings() {
        assert_eq!(PrimitiveType::normalize("short"), Some(PrimitiveType::Int16));
        assert_eq!(
            PrimitiveType::normalize("unsigned short"),
            Some(PrimitiveType::UInt16)
        );
        assert_eq!(PrimitiveType::normalize("long"), Some(PrimitiveType::Int32));
        assert_eq!(
            PrimitiveType::normalize("unsigned long"),
            Some(PrimitiveType::UInt32)
        );
        assert_eq!(
            PrimitiveType::normalize("long long"),
            Some(PrimitiveType::Int64)
        );
        assert_eq!(
            PrimitiveType::normalize("unsigned long long"),
            Some(PrimitiveType::UInt64)
        );
        assert_eq!(PrimitiveType::normalize("float"), Some(PrimitiveType::Float32));
        assert_eq!(PrimitiveType::normalize("double"), Some(PrimitiveType::Float64));
        assert_eq!(
            PrimitiveType::normalize("long double"),
            Some(PrimitiveType::Float64)
        );
        assert_eq!(PrimitiveType::normalize("octet"), Some(PrimitiveType::UInt8));
        assert_eq!(PrimitiveType::normalize("byte"), Some(PrimitiveType::UInt8));
        assert_eq!(PrimitiveType::normalize("char"), Some(PrimitiveType::UInt8));
        assert_eq!(PrimitiveType::normalize("wchar"), Some(PrimitiveType::UInt16));
        assert_eq!(PrimitiveType::normalize("boolean"), Some(PrimitiveType::Bool));
        assert_eq!(PrimitiveType::normalize("not_a_type"), None);
    }

    #[test]
    fn alignment_matches_width() {
        assert_eq!(PrimitiveType::Int64.alignment(), 8);
        assert_eq!(PrimitiveType::Int16.alignment(), 2);
        assert_eq!(PrimitiveType::Bool.alignment(), 1);
    }

    #[test]
    fn field_array_detection() {
        let mut f = Field::new("data", "uint8");
        assert!(!f.is_array());
        f.array_lengths.push(4);
        assert!(f.is_array());
    }
}
