// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for idlcodec.
//!
//! Covers every stage of the pipeline: IDL parsing, name resolution, flat
//! schema export, and CDR (de)serialization.

use std::fmt;

/// Errors that can occur while parsing, resolving, or (de)serializing
/// against an IDL schema.
#[derive(Debug, Clone)]
pub enum CodecError {
    /// Source IDL text violates the grammar.
    Parse {
        /// What was being parsed.
        context: String,
        /// Error message.
        message: String,
    },

    /// A scoped name or constant expression did not resolve against the
    /// module tree.
    UnknownIdentifier {
        /// The unresolved identifier.
        name: String,
        /// The scope it was looked up from.
        scope: String,
    },

    /// A typedef or constant expression chain self-references.
    TypedefCycle {
        /// The name at which the cycle was detected.
        name: String,
    },

    /// A multi-dimensional array was found while building the flat schema
    /// view, which only exposes a single dimension.
    MultiDimensionalArrayExport {
        /// Field carrying the array.
        field_name: String,
        /// Owning type name.
        type_name: String,
    },

    /// A reader/writer was constructed against a root type name absent
    /// from the schema.
    UnknownRootDefinition {
        /// The requested root type name.
        root_name: String,
    },

    /// A field references a type that is neither a primitive nor a known
    /// struct/union.
    UnrecognizedFieldType {
        /// Field carrying the reference.
        field_name: String,
        /// The unrecognized type name.
        type_name: String,
    },

    /// A string or sequence exceeded its declared bound.
    BoundsViolation {
        /// Field carrying the bound.
        field_name: String,
        /// The declared bound.
        limit: usize,
        /// The actual length encountered.
        actual: usize,
    },

    /// The reader ran past the end of the input buffer mid-value.
    BufferTooShort {
        /// Requested bytes.
        requested: usize,
        /// Available bytes.
        available: usize,
        /// Cursor position when the error occurred.
        cursor_pos: usize,
    },

    /// A parameter-list sentinel was missing or malformed.
    UnexpectedSentinel {
        /// Cursor position when the error occurred.
        cursor_pos: usize,
    },

    /// An alignment computation produced an inconsistent offset.
    AlignmentError {
        /// Expected alignment width.
        expected: usize,
        /// Actual offset observed.
        actual: usize,
    },

    /// A feature named in the schema is not implemented.
    Unsupported {
        /// What is not supported.
        feature: String,
    },

    /// An internal invariant was violated; indicates a bug in this crate.
    InvariantViolation {
        /// Description of the violated invariant.
        invariant: String,
    },

    /// Catch-all for I/O-adjacent failures surfaced through `From`.
    Other(String),
}

impl CodecError {
    pub fn parse(context: impl Into<String>, message: impl Into<String>) -> Self {
        CodecError::Parse {
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn unknown_identifier(name: impl Into<String>, scope: impl Into<String>) -> Self {
        CodecError::UnknownIdentifier {
            name: name.into(),
            scope: scope.into(),
        }
    }

    pub fn typedef_cycle(name: impl Into<String>) -> Self {
        CodecError::TypedefCycle { name: name.into() }
    }

    pub fn multi_dimensional_array_export(
        field_name: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        CodecError::MultiDimensionalArrayExport {
            field_name: field_name.into(),
            type_name: type_name.into(),
        }
    }

    pub fn unknown_root_definition(root_name: impl Into<String>) -> Self {
        CodecError::UnknownRootDefinition {
            root_name: root_name.into(),
        }
    }

    pub fn unrecognized_field_type(
        field_name: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        CodecError::UnrecognizedFieldType {
            field_name: field_name.into(),
            type_name: type_name.into(),
        }
    }

    pub fn bounds_violation(field_name: impl Into<String>, limit: usize, actual: usize) -> Self {
        CodecError::BoundsViolation {
            field_name: field_name.into(),
            limit,
            actual,
        }
    }

    pub fn buffer_too_short(requested: usize, available: usize, cursor_pos: usize) -> Self {
        CodecError::BufferTooShort {
            requested,
            available,
            cursor_pos,
        }
    }

    pub fn unexpected_sentinel(cursor_pos: usize) -> Self {
        CodecError::UnexpectedSentinel { cursor_pos }
    }

    pub fn alignment_error(expected: usize, actual: usize) -> Self {
        CodecError::AlignmentError { expected, actual }
    }

    pub fn unsupported(feature: impl Into<String>) -> Self {
        CodecError::Unsupported {
            feature: feature.into(),
        }
    }

    pub fn invariant_violation(invariant: impl Into<String>) -> Self {
        CodecError::InvariantViolation {
            invariant: invariant.into(),
        }
    }

    /// Structured `(key, value)` pairs for attaching to a `tracing` event.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            CodecError::Parse { context, message } => vec![
                ("kind", "parse".into()),
                ("context", context.clone()),
                ("message", message.clone()),
            ],
            CodecError::UnknownIdentifier { name, scope } => vec![
                ("kind", "unknown_identifier".into()),
                ("name", name.clone()),
                ("scope", scope.clone()),
            ],
            CodecError::TypedefCycle { name } => {
                vec![("kind", "typedef_cycle".into()), ("name", name.clone())]
            }
            CodecError::MultiDimensionalArrayExport {
                field_name,
                type_name,
            } => vec![
                ("kind", "multi_dimensional_array_export".into()),
                ("field_name", field_name.clone()),
                ("type_name", type_name.clone()),
            ],
            CodecError::UnknownRootDefinition { root_name } => vec![
                ("kind", "unknown_root_definition".into()),
                ("root_name", root_name.clone()),
            ],
            CodecError::UnrecognizedFieldType {
                field_name,
                type_name,
            } => vec![
                ("kind", "unrecognized_field_type".into()),
                ("field_name", field_name.clone()),
                ("type_name", type_name.clone()),
            ],
            CodecError::BoundsViolation {
                field_name,
                limit,
                actual,
            } => vec![
                ("kind", "bounds_violation".into()),
                ("field_name", field_name.clone()),
                ("limit", limit.to_string()),
                ("actual", actual.to_string()),
            ],
            CodecError::BufferTooShort {
                requested,
                available,
                cursor_pos,
            } => vec![
                ("kind", "buffer_too_short".into()),
                ("requested", requested.to_string()),
                ("available", available.to_string()),
                ("cursor_pos", cursor_pos.to_string()),
            ],
            CodecError::UnexpectedSentinel { cursor_pos } => vec![
                ("kind", "unexpected_sentinel".into()),
                ("cursor_pos", cursor_pos.to_string()),
            ],
            CodecError::AlignmentError { expected, actual } => vec![
                ("kind", "alignment_error".into()),
                ("expected", expected.to_string()),
                ("actual", actual.to_string()),
            ],
            CodecError::Unsupported { feature } => {
                vec![("kind", "unsupported".into()), ("feature", feature.clone())]
            }
            CodecError::InvariantViolation { invariant } => vec![
                ("kind", "invariant_violation".into()),
                ("invariant", invariant.clone()),
            ],
            CodecError::Other(message) => {
                vec![("kind", "other".into()), ("message", message.clone())]
            }
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Parse { context, message } => {
                write!(f, "parse error in {context}: {message}")
            }
            CodecError::UnknownIdentifier { name, scope } => {
                write!(f, "unknown identifier '{name}' at scope '{scope}'")
            }
            CodecError::TypedefCycle { name } => {
                write!(f, "typedef or constant chain cycles back to '{name}'")
            }
            CodecError::MultiDimensionalArrayExport {
                field_name,
                type_name,
            } => write!(
                f,
                "field '{field_name}' of type '{type_name}' is a multi-dimensional array, \
                 which cannot appear in the flat schema view"
            ),
            CodecError::UnknownRootDefinition { root_name } => {
                write!(f, "root definition '{root_name}' not found in schema")
            }
            CodecError::UnrecognizedFieldType {
                field_name,
                type_name,
            } => write!(
                f,
                "field '{field_name}' references unrecognized type '{type_name}'"
            ),
            CodecError::BoundsViolation {
                field_name,
                limit,
                actual,
            } => write!(
                f,
                "field '{field_name}' exceeds its bound of {limit} (got {actual})"
            ),
            CodecError::BufferTooShort {
                requested,
                available,
                cursor_pos,
            } => write!(
                f,
                "buffer too short at offset {cursor_pos}: requested {requested} bytes, {available} available"
            ),
            CodecError::UnexpectedSentinel { cursor_pos } => {
                write!(f, "expected parameter-list sentinel at offset {cursor_pos}")
            }
            CodecError::AlignmentError { expected, actual } => write!(
                f,
                "alignment error: expected offset aligned to {expected}, got {actual}"
            ),
            CodecError::Unsupported { feature } => write!(f, "unsupported: {feature}"),
            CodecError::InvariantViolation { invariant } => {
                write!(f, "invariant violation: {invariant}")
            }
            CodecError::Other(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for CodecError {}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        CodecError::Other(err.to_string())
    }
}

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, CodecError>;
