// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! `MessageWriter`: sizes and encodes a [`DecodedMessage`] against a
//! resolved schema's precomputed field plans.
//!
//! `calculate_byte_size` and `write_message` run the exact same recursive
//! traversal, once over a [`CdrSizeCounter`] and once over a [`CdrWriter`],
//! via the shared [`Sink`] trait — there is only one encoding walk in this
//! module, not two independently maintained ones.

use super::cache::{DeserializationInfoCache, FieldKind, FieldPlan, StructPlan, UnionPlan};
use super::headers::{
    begin_delimiter_header, begin_member_header, end_delimiter_header, end_member_header,
    write_sentinel_header,
};
use super::kind::EncapsulationKind;
use super::sink::{self, CdrSizeCounter, CdrWriter, Sink};
use crate::core::{CodecError, CodecValue, DecodedMessage, Result};
use crate::schema::ast::{PrimitiveType, Schema};
use crate::schema::view::UNION_DISCRIMINATOR_PROPERTY_KEY;
use std::sync::Arc;

pub struct MessageWriter {
    cache: DeserializationInfoCache,
    kind: EncapsulationKind,
}

impl MessageWriter {
    pub fn new(schema: &Schema, kind: EncapsulationKind) -> Result<Self> {
        if kind.is_legacy_parameter_list() {
            return Err(CodecError::unsupported(
                "XCDR1 parameter-list encapsulation (PL_CDR_BE/PL_CDR_LE) is not implemented",
            ));
        }
        let cache = DeserializationInfoCache::build(schema, kind)?;
        Ok(Self { cache, kind })
    }

    /// The exact byte length `write_message` would produce, computed without
    /// allocating the message itself.
    pub fn calculate_byte_size(&self, root_name: &str, value: &DecodedMessage) -> Result<usize> {
        let plan = self.cache.resolve_root(root_name)?;
        let mut counter = CdrSizeCounter::new(self.kind);
        self.write_struct(&mut counter, &plan, value)?;
        Ok(counter.size())
    }

    pub fn write_message(&self, root_name: &str, value: &DecodedMessage) -> Result<Vec<u8>> {
        let plan = self.cache.resolve_root(root_name)?;
        let mut writer = CdrWriter::new(self.kind);
        self.write_struct(&mut writer, &plan, value)?;
        let bytes = writer.finish();
        tracing::debug!(root = root_name, bytes = bytes.len(), "encoded message");
        Ok(bytes)
    }

    fn write_struct<S: Sink>(&self, sink: &mut S, plan: &StructPlan, value: &DecodedMessage) -> Result<()> {
        if plan.uses_delimiter_header {
            let pos = begin_delimiter_header(sink);
            self.write_struct_body(sink, plan, value)?;
            end_delimiter_header(sink, pos);
        } else {
            self.write_struct_body(sink, plan, value)?;
        }
        Ok(())
    }

    fn write_struct_body<S: Sink>(&self, sink: &mut S, plan: &StructPlan, value: &DecodedMessage) -> Result<()> {
        for field in &plan.fields {
            if field.is_constant {
                continue;
            }
            let field_value = value
                .get(&field.name)
                .cloned()
                .unwrap_or_else(|| self.cache.default_for_field(field));
            if plan.uses_member_header {
                let size_pos = begin_member_header(sink, field.pid, false);
                self.write_field(sink, field, &field_value)?;
                end_member_header(sink, size_pos);
            } else {
                self.write_field(sink, field, &field_value)?;
            }
        }
        if plan.uses_member_header {
            write_sentinel_header(sink);
        }
        Ok(())
    }

    fn write_union<S: Sink>(&self, sink: &mut S, plan: &UnionPlan, value: &DecodedMessage) -> Result<()> {
        if plan.uses_delimiter_header {
            let pos = begin_delimiter_header(sink);
            self.write_union_body(sink, plan, value)?;
            end_delimiter_header(sink, pos);
        } else {
            self.write_union_body(sink, plan, value)?;
        }
        Ok(())
    }

    fn write_union_body<S: Sink>(&self, sink: &mut S, plan: &UnionPlan, value: &DecodedMessage) -> Result<()> {
        let disc_value = value
            .get(UNION_DISCRIMINATOR_PROPERTY_KEY)
            .cloned()
            .unwrap_or_else(|| self.cache.zero_value_for_kind(&plan.switch_kind));
        let discriminator = disc_value.as_i64().ok_or_else(|| {
            CodecError::invariant_violation(format!(
                "union '{}' discriminator value is not integral",
                plan.name
            ))
        })?;
        let switch_type = primitive_of(&plan.switch_kind, &plan.name)?;

        if plan.uses_member_header {
            let size_pos = begin_member_header(sink, 1, false);
            write_primitive(sink, switch_type, &disc_value);
            end_member_header(sink, size_pos);
        } else {
            write_primitive(sink, switch_type, &disc_value);
        }

        if let Some(case) = plan.case_for(discriminator) {
            let field_value = value
                .get(&case.field.name)
                .cloned()
                .unwrap_or_else(|| self.cache.default_for_field(&case.field));
            if plan.uses_member_header {
                let size_pos = begin_member_header(sink, case.field.pid, false);
                self.write_field(sink, &case.field, &field_value)?;
                end_member_header(sink, size_pos);
            } else {
                self.write_field(sink, &case.field, &field_value)?;
            }
        }

        if plan.uses_member_header {
            write_sentinel_header(sink);
        }
        Ok(())
    }

    fn write_field<S: Sink>(&self, sink: &mut S, field: &FieldPlan, value: &CodecValue) -> Result<()> {
        if field.is_sequence {
            let items = value.as_array().unwrap_or(&[]);
            if let Some(bound) = field.sequence_bound {
                if items.len() > bound {
                    return Err(CodecError::bounds_violation(field.name.clone(), bound, items.len()));
                }
            }
            sink::write_u32(sink, items.len() as u32);
            for item in items {
                self.write_element(sink, field, item)?;
            }
            return Ok(());
        }
        if field.is_array() {
            return self.write_array_dim(sink, field, &field.array_lengths, value);
        }
        self.write_element(sink, field, value)
    }

    /// Fixed arrays are written back-to-back with no length prefix, in
    /// row-major order for multiple dimensions.
    fn write_array_dim<S: Sink>(
        &self,
        sink: &mut S,
        field: &FieldPlan,
        dims: &[usize],
        value: &CodecValue,
    ) -> Result<()> {
        let (&len, rest) = dims
            .split_first()
            .expect("write_array_dim called with empty dimension list");
        let items = value.as_array().unwrap_or(&[]);
        for i in 0..len {
            match items.get(i) {
                Some(item) if rest.is_empty() => self.write_element(sink, field, item)?,
                Some(item) => self.write_array_dim(sink, field, rest, item)?,
                None if rest.is_empty() => {
                    let default = self.cache.default_element(field);
                    self.write_element(sink, field, &default)?;
                }
                None => self.write_array_dim(sink, field, rest, &CodecValue::Array(Vec::new()))?,
            }
        }
        Ok(())
    }

    fn write_element<S: Sink>(&self, sink: &mut S, field: &FieldPlan, value: &CodecValue) -> Result<()> {
        match &field.kind {
            FieldKind::Primitive(p) => {
                if matches!(p, PrimitiveType::String | PrimitiveType::WString) {
                    let s = value.as_str().unwrap_or("");
                    if let Some(bound) = field.string_upper_bound {
                        let len = s.chars().count();
                        if len > bound {
                            return Err(CodecError::bounds_violation(field.name.clone(), bound, len));
                        }
                    }
                }
                write_primitive(sink, *p, value);
                Ok(())
            }
            FieldKind::Struct(name) => {
                let plan = self.struct_plan(name, &field.name)?;
                let nested = value
                    .as_struct()
                    .cloned()
                    .unwrap_or_else(|| self.cache.default_for_plan(&plan));
                self.write_struct(sink, &plan, &nested)
            }
            FieldKind::Union(name) => {
                let plan = self.union_plan(name, &field.name)?;
                let nested = value.as_struct().cloned().unwrap_or_default();
                self.write_union(sink, &plan, &nested)
            }
        }
    }

    fn struct_plan(&self, name: &str, field_name: &str) -> Result<Arc<StructPlan>> {
        self.cache
            .get_struct(name)
            .cloned()
            .ok_or_else(|| CodecError::unrecognized_field_type(field_name, name))
    }

    fn union_plan(&self, name: &str, field_name: &str) -> Result<Arc<UnionPlan>> {
        self.cache
            .get_union(name)
            .cloned()
            .ok_or_else(|| CodecError::unrecognized_field_type(field_name, name))
    }
}

fn primitive_of(kind: &FieldKind, context: &str) -> Result<PrimitiveType> {
    match kind {
        FieldKind::Primitive(p) => Ok(*p),
        _ => Err(CodecError::invariant_violation(format!(
            "'{context}' switch type did not resolve to a primitive"
        ))),
    }
}

fn write_primitive<S: Sink>(sink: &mut S, p: PrimitiveType, value: &CodecValue) {
    match p {
        PrimitiveType::Bool => {
            let b = match value {
                CodecValue::Bool(b) => *b,
                other => other.as_i64().unwrap_or(0) != 0,
            };
            sink::write_bool(sink, b);
        }
        PrimitiveType::Int8 => sink::write_i8(sink, value.as_i64().unwrap_or(0) as i8),
        PrimitiveType::UInt8 => sink::write_u8(sink, value.as_i64().unwrap_or(0) as u8),
        PrimitiveType::Int16 => sink::write_i16(sink, value.as_i64().unwrap_or(0) as i16),
        PrimitiveType::UInt16 => sink::write_u16(sink, value.as_i64().unwrap_or(0) as u16),
        PrimitiveType::Int32 => sink::write_i32(sink, value.as_i64().unwrap_or(0) as i32),
        PrimitiveType::UInt32 => sink::write_u32(sink, value.as_i64().unwrap_or(0) as u32),
        PrimitiveType::Int64 => sink::write_i64(sink, value.as_i64().unwrap_or(0)),
        PrimitiveType::UInt64 => sink::write_u64(sink, value.as_u64().unwrap_or(0)),
        PrimitiveType::Float32 => sink::write_f32(sink, value.as_f64().unwrap_or(0.0) as f32),
        PrimitiveType::Float64 => sink::write_f64(sink, value.as_f64().unwrap_or(0.0)),
        PrimitiveType::String => sink::write_string(sink, value.as_str().unwrap_or("")),
        PrimitiveType::WString => sink::write_wstring(sink, value.as_str().unwrap_or("")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_and_resolve;

    fn message(fields: Vec<(&str, CodecValue)>) -> DecodedMessage {
        fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn legacy_parameter_list_kinds_are_rejected() {
        let schema = parse_and_resolve("struct A { int32 num; };").unwrap();
        assert!(MessageWriter::new(&schema, EncapsulationKind::PlCdrBe).is_err());
        assert!(MessageWriter::new(&schema, EncapsulationKind::PlCdrLe).is_err());
    }

    #[test]
    fn s1_primitive_struct() {
        let schema = parse_and_resolve("struct A { int32 num; uint8 flag; };").unwrap();
        let writer = MessageWriter::new(&schema, EncapsulationKind::CdrLe).unwrap();
        let value = message(vec![("num", CodecValue::Int32(5)), ("flag", CodecValue::UInt8(7))]);
        let bytes = writer.write_message("A", &value).unwrap();
        assert_eq!(bytes, vec![0x00, 0x01, 0x00, 0x00, 5, 0, 0, 0, 7]);
        assert_eq!(writer.calculate_byte_size("A", &value).unwrap(), bytes.len());
    }

    #[test]
    fn s2_fixed_array() {
        let schema = parse_and_resolve("struct A { uint8 data[4]; };").unwrap();
        let writer = MessageWriter::new(&schema, EncapsulationKind::CdrLe).unwrap();
        let value = message(vec![(
            "data",
            CodecValue::Array(vec![
                CodecValue::UInt8(1),
                CodecValue::UInt8(2),
                CodecValue::UInt8(3),
                CodecValue::UInt8(4),
            ]),
        )]);
        let bytes = writer.write_message("A", &value).unwrap();
        assert_eq!(bytes, vec![0x00, 0x01, 0x00, 0x00, 1, 2, 3, 4]);
    }

    #[test]
    fn s3_bounded_string_ok() {
        let schema = parse_and_resolve("struct A { string<5> name; };").unwrap();
        let writer = MessageWriter::new(&schema, EncapsulationKind::CdrLe).unwrap();
        let value = message(vec![("name", CodecValue::String("hello".to_string()))]);
        let bytes = writer.write_message("A", &value).unwrap();
        assert_eq!(
            bytes,
            vec![0x00, 0x01, 0x00, 0x00, 6, 0, 0, 0, b'h', b'e', b'l', b'l', b'o', 0]
        );
    }

    #[test]
    fn s4_bounded_string_overflow_fails_size_and_write() {
        let schema = parse_and_resolve("struct A { string<5> name; };").unwrap();
        let writer = MessageWriter::new(&schema, EncapsulationKind::CdrLe).unwrap();
        let value = message(vec![("name", CodecValue::String("toolong".to_string()))]);
        assert!(writer.calculate_byte_size("A", &value).is_err());
        assert!(writer.write_message("A", &value).is_err());
    }

    #[test]
    fn s5_sequence() {
        let schema = parse_and_resolve("struct A { sequence<int32> items; };").unwrap();
        let writer = MessageWriter::new(&schema, EncapsulationKind::CdrLe).unwrap();
        let value = message(vec![(
            "items",
            CodecValue::Array(vec![CodecValue::Int32(7)]),
        )]);
        let bytes = writer.write_message("A", &value).unwrap();
        assert_eq!(
            bytes,
            vec![0x00, 0x01, 0x00, 0x00, 1, 0, 0, 0, 7, 0, 0, 0]
        );
    }

    #[test]
    fn sequence_bound_violation_fails_before_writing() {
        let schema = parse_and_resolve("struct A { sequence<int32, 2> items; };").unwrap();
        let writer = MessageWriter::new(&schema, EncapsulationKind::CdrLe).unwrap();
        let value = message(vec![(
            "items",
            CodecValue::Array(vec![CodecValue::Int32(1), CodecValue::Int32(2), CodecValue::Int32(3)]),
        )]);
        assert!(writer.write_message("A", &value).is_err());
    }

    #[test]
    fn nested_struct_is_written_recursively() {
        let schema = parse_and_resolve(
            "struct Point { int32 x; int32 y; }; struct Line { Point start; Point end; };",
        )
        .unwrap();
        let writer = MessageWriter::new(&schema, EncapsulationKind::CdrLe).unwrap();
        let point = |x: i32, y: i32| {
            CodecValue::Struct(message(vec![("x", CodecValue::Int32(x)), ("y", CodecValue::Int32(y))]))
        };
        let value = message(vec![("start", point(1, 2)), ("end", point(3, 4))]);
        let bytes = writer.write_message("Line", &value).unwrap();
        assert_eq!(
            bytes,
            vec![0x00, 0x01, 0x00, 0x00, 1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 4, 0, 0, 0]
        );
    }

    #[test]
    fn union_picks_matching_case_and_writes_discriminator_plus_value() {
        let schema = parse_and_resolve(
            "union Shape switch (long) { case 0: double radius; case 1: double side; };",
        )
        .unwrap();
        let writer = MessageWriter::new(&schema, EncapsulationKind::CdrLe).unwrap();
        let value = message(vec![
            (UNION_DISCRIMINATOR_PROPERTY_KEY, CodecValue::Int32(1)),
            ("side", CodecValue::Float64(2.5)),
        ]);
        let bytes = writer.write_message("Shape", &value).unwrap();
        // discriminator (4 bytes) + 4 bytes padding to align the double + 8 byte double.
        assert_eq!(bytes.len(), 4 + 4 + 4 + 8);
        assert_eq!(&bytes[4..8], &1i32.to_le_bytes());
        assert_eq!(&bytes[12..20], &2.5f64.to_le_bytes());
    }

    #[test]
    fn pl_cdr2_frames_struct_with_delimiter_and_member_headers() {
        let schema = parse_and_resolve("struct A { int32 num; };").unwrap();
        let writer = MessageWriter::new(&schema, EncapsulationKind::PlCdr2Le).unwrap();
        let value = message(vec![("num", CodecValue::Int32(9))]);
        let bytes = writer.write_message("A", &value).unwrap();
        // header(4) + dheader(4) + member header(4) + value(4) + sentinel(4)
        assert_eq!(bytes.len(), 20);
        assert_eq!(writer.calculate_byte_size("A", &value).unwrap(), bytes.len());
    }
}
