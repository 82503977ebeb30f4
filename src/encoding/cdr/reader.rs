// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! `MessageReader`: decodes CDR bytes into a [`DecodedMessage`] against a
//! resolved schema's precomputed field plans.
//!
//! Mirrors [`super::writer::MessageWriter`]'s traversal but over
//! [`CdrCursor`] instead of a [`super::sink::Sink`]: classic-CDR structs
//! read every field in declaration order; parameter-list structs read a
//! delimiter header, then member headers until the sentinel, dispatching
//! each by PID and skipping unknown ones by their declared size.

use super::cache::{DeserializationInfoCache, FieldKind, FieldPlan, StructPlan, UnionPlan};
use super::cursor::CdrCursor;
use super::headers::{read_delimiter_header, read_member_header};
use super::kind::EncapsulationKind;
use crate::core::{CodecError, CodecValue, DecodedMessage, Result};
use crate::schema::ast::{PrimitiveType, Schema};
use crate::schema::view::UNION_DISCRIMINATOR_PROPERTY_KEY;

pub struct MessageReader {
    cache: DeserializationInfoCache,
}

impl MessageReader {
    pub fn new(schema: &Schema, kind: EncapsulationKind) -> Result<Self> {
        if kind.is_legacy_parameter_list() {
            return Err(CodecError::unsupported(
                "XCDR1 parameter-list encapsulation (PL_CDR_BE/PL_CDR_LE) is not implemented",
            ));
        }
        let cache = DeserializationInfoCache::build(schema, kind)?;
        Ok(Self { cache })
    }

    /// Decode `bytes` against `root_name`. The encapsulation kind is taken
    /// from the buffer's own header (byte 1), not the one the cache was
    /// built with — the cache's plans only need `uses_delimiter_header` /
    /// `uses_member_header` to be consistent with whatever the buffer
    /// actually carries, which the caller is responsible for matching to
    /// the kind it built the reader with.
    pub fn read_message(&self, root_name: &str, bytes: &[u8]) -> Result<DecodedMessage> {
        tracing::debug!(root = root_name, bytes = bytes.len(), "decoding message");
        let plan = self.cache.resolve_root(root_name)?;
        let mut cursor = CdrCursor::new(bytes)?;
        self.read_struct(&mut cursor, &plan)
    }

    fn read_struct(&self, cursor: &mut CdrCursor, plan: &StructPlan) -> Result<DecodedMessage> {
        let mut msg = self.cache.default_for_plan(plan);
        let end = if plan.uses_delimiter_header {
            let len = read_delimiter_header(cursor)?;
            Some(cursor.position() + len as usize)
        } else {
            None
        };

        if plan.uses_member_header {
            loop {
                match read_member_header(cursor)? {
                    None => break,
                    Some(header) => match plan.fields.iter().find(|f| f.pid == header.member_id) {
                        Some(field) => {
                            let value = self.read_field(cursor, field)?;
                            msg.insert(field.name.clone(), value);
                        }
                        None => cursor.skip(header.object_size as usize)?,
                    },
                }
            }
            if let Some(end) = end {
                cursor.seek(end)?;
            }
        } else {
            for field in &plan.fields {
                if field.is_constant {
                    continue;
                }
                let value = self.read_field(cursor, field)?;
                msg.insert(field.name.clone(), value);
            }
            if let Some(end) = end {
                if cursor.position() < end {
                    cursor.seek(end)?;
                }
            }
        }
        Ok(msg)
    }

    fn read_union(&self, cursor: &mut CdrCursor, plan: &UnionPlan) -> Result<DecodedMessage> {
        let switch_type = primitive_of(&plan.switch_kind, &plan.name)?;
        let mut msg = DecodedMessage::new();
        let end = if plan.uses_delimiter_header {
            let len = read_delimiter_header(cursor)?;
            Some(cursor.position() + len as usize)
        } else {
            None
        };

        if plan.uses_member_header {
            let mut discriminator: Option<i64> = None;
            loop {
                match read_member_header(cursor)? {
                    None => break,
                    Some(header) if header.member_id == 1 => {
                        let value = read_primitive(cursor, switch_type)?;
                        discriminator = value.as_i64();
                        msg.insert(UNION_DISCRIMINATOR_PROPERTY_KEY, value);
                    }
                    Some(header) => match discriminator.and_then(|d| plan.case_for(d)) {
                        Some(case) => {
                            let value = self.read_field(cursor, &case.field)?;
                            msg.insert(case.field.name.clone(), value);
                        }
                        None => cursor.skip(header.object_size as usize)?,
                    },
                }
            }
            if let Some(end) = end {
                cursor.seek(end)?;
            }
        } else {
            let disc_value = read_primitive(cursor, switch_type)?;
            let discriminator = disc_value.as_i64();
            msg.insert(UNION_DISCRIMINATOR_PROPERTY_KEY, disc_value);
            if let Some(case) = discriminator.and_then(|d| plan.case_for(d)) {
                let value = self.read_field(cursor, &case.field)?;
                msg.insert(case.field.name.clone(), value);
            }
            if let Some(end) = end {
                if cursor.position() < end {
                    cursor.seek(end)?;
                }
            }
        }
        Ok(msg)
    }

    fn read_field(&self, cursor: &mut CdrCursor, field: &FieldPlan) -> Result<CodecValue> {
        if field.is_array() {
            return self.read_array_dim(cursor, field, &field.array_lengths);
        }
        if field.is_sequence {
            let len = cursor.read_u32()? as usize;
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(self.read_element(cursor, field)?);
            }
            return Ok(CodecValue::Array(items));
        }
        self.read_element(cursor, field)
    }

    fn read_array_dim(&self, cursor: &mut CdrCursor, field: &FieldPlan, dims: &[usize]) -> Result<CodecValue> {
        let (&len, rest) = dims
            .split_first()
            .expect("read_array_dim called with empty dimension list");
        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            if rest.is_empty() {
                items.push(self.read_element(cursor, field)?);
            } else {
                items.push(self.read_array_dim(cursor, field, rest)?);
            }
        }
        Ok(CodecValue::Array(items))
    }

    fn read_element(&self, cursor: &mut CdrCursor, field: &FieldPlan) -> Result<CodecValue> {
        match &field.kind {
            FieldKind::Primitive(p) => {
                let value = read_primitive(cursor, *p)?;
                if matches!(p, PrimitiveType::String | PrimitiveType::WString) {
                    if let Some(bound) = field.string_upper_bound {
                        let len = value.as_str().map(|s| s.chars().count()).unwrap_or(0);
                        if len > bound {
                            return Err(CodecError::bounds_violation(field.name.clone(), bound, len));
                        }
                    }
                }
                Ok(value)
            }
            FieldKind::Struct(name) => {
                let plan = self
                    .cache
                    .get_struct(name)
                    .cloned()
                    .ok_or_else(|| CodecError::unrecognized_field_type(&field.name, name))?;
                Ok(CodecValue::Struct(self.read_struct(cursor, &plan)?))
            }
            FieldKind::Union(name) => {
                let plan = self
                    .cache
                    .get_union(name)
                    .cloned()
                    .ok_or_else(|| CodecError::unrecognized_field_type(&field.name, name))?;
                Ok(CodecValue::Struct(self.read_union(cursor, &plan)?))
            }
        }
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

fn read_primitive(cursor: &mut CdrCursor, p: PrimitiveType) -> Result<CodecValue> {
    Ok(match p {
        PrimitiveType::Bool => CodecValue::Bool(cursor.read_bool()?),
        PrimitiveType::Int8 => CodecValue::Int8(cursor.read_i8()?),
        PrimitiveType::UInt8 => CodecValue::UInt8(cursor.read_u8()?),
        PrimitiveType::Int16 => CodecValue::Int16(cursor.read_i16()?),
        PrimitiveType::UInt16 => CodecValue::UInt16(cursor.read_u16()?),
        PrimitiveType::Int32 => CodecValue::Int32(cursor.read_i32()?),
        PrimitiveType::UInt32 => CodecValue::UInt32(cursor.read_u32()?),
        PrimitiveType::Int64 => CodecValue::Int64(cursor.read_i64()?),
        PrimitiveType::UInt64 => CodecValue::UInt64(cursor.read_u64()?),
        PrimitiveType::Float32 => CodecValue::Float32(cursor.read_f32()?),
        PrimitiveType::Float64 => CodecValue::Float64(cursor.read_f64()?),
        PrimitiveType::String => CodecValue::String(cursor.read_string()?),
        PrimitiveType::WString => CodecValue::String(cursor.read_wstring()?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::cdr::writer::MessageWriter;
    use crate::schema::parse_and_resolve;

    fn message(fields: Vec<(&str, CodecValue)>) -> DecodedMessage {
        fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn legacy_parameter_list_kinds_are_rejected() {
        let schema = parse_and_resolve("struct A { int32 num; };").unwrap();
        assert!(MessageReader::new(&schema, EncapsulationKind::PlCdrBe).is_err());
        assert!(MessageReader::new(&schema, EncapsulationKind::PlCdrLe).is_err());
    }

    #[test]
    fn round_trips_primitive_struct() {
        let schema = parse_and_resolve("struct A { int32 num; uint8 flag; };").unwrap();
        let writer = MessageWriter::new(&schema, EncapsulationKind::CdrLe).unwrap();
        let reader = MessageReader::new(&schema, EncapsulationKind::CdrLe).unwrap();
        let value = message(vec![("num", CodecValue::Int32(5)), ("flag", CodecValue::UInt8(7))]);
        let bytes = writer.write_message("A", &value).unwrap();
        let decoded = reader.read_message("A", &bytes).unwrap();
        assert_eq!(decoded.get("num"), Some(&CodecValue::Int32(5)));
        assert_eq!(decoded.get("flag"), Some(&CodecValue::UInt8(7)));
    }

    #[test]
    fn round_trips_bounded_string_and_enforces_bound_on_decode() {
        let lenient = parse_and_resolve("struct A { string name; };").unwrap();
        let strict = parse_and_resolve("struct A { string<3> name; };").unwrap();
        let writer = MessageWriter::new(&lenient, EncapsulationKind::CdrLe).unwrap();
        let value = message(vec![("name", CodecValue::String("toolong".to_string()))]);
        let bytes = writer.write_message("A", &value).unwrap();

        let reader = MessageReader::new(&strict, EncapsulationKind::CdrLe).unwrap();
        assert!(reader.read_message("A", &bytes).is_err());
    }

    #[test]
    fn round_trips_big_endian() {
        let schema = parse_and_resolve("struct A { int32 num; };").unwrap();
        let writer = MessageWriter::new(&schema, EncapsulationKind::CdrBe).unwrap();
        let reader = MessageReader::new(&schema, EncapsulationKind::CdrBe).unwrap();
        let value = message(vec![("num", CodecValue::Int32(-5))]);
        let bytes = writer.write_message("A", &value).unwrap();
        let decoded = reader.read_message("A", &bytes).unwrap();
        assert_eq!(decoded.get("num"), Some(&CodecValue::Int32(-5)));
    }

    #[test]
    fn round_trips_pl_cdr2_with_unknown_field_skipped() {
        let writer_schema = parse_and_resolve("struct A { int32 num; uint8 extra; };").unwrap();
        let reader_schema = parse_and_resolve("struct A { int32 num; };").unwrap();
        let writer = MessageWriter::new(&writer_schema, EncapsulationKind::PlCdr2Le).unwrap();
        let reader = MessageReader::new(&reader_schema, EncapsulationKind::PlCdr2Le).unwrap();
        let value = message(vec![("num", CodecValue::Int32(42)), ("extra", CodecValue::UInt8(9))]);
        let bytes = writer.write_message("A", &value).unwrap();
        let decoded = reader.read_message("A", &bytes).unwrap();
        assert_eq!(decoded.get("num"), Some(&CodecValue::Int32(42)));
        assert!(decoded.get("extra").is_none());
    }

    #[test]
    fn constants_are_materialized_even_though_absent_from_wire() {
        let schema = parse_and_resolve("struct A { const int32 KIND = 5; int32 num; };").unwrap();
        let writer = MessageWriter::new(&schema, EncapsulationKind::CdrLe).unwrap();
        let reader = MessageReader::new(&schema, EncapsulationKind::CdrLe).unwrap();
        let value = message(vec![("num", CodecValue::Int32(1))]);
        let bytes = writer.write_message("A", &value).unwrap();
        let decoded = reader.read_message("A", &bytes).unwrap();
        assert_eq!(decoded.get("KIND"), Some(&CodecValue::Int32(5)));
    }

    #[test]
    fn union_round_trips_matching_case() {
        let schema = parse_and_resolve(
            "union Shape switch (long) { case 0: double radius; case 1: double side; };",
        )
        .unwrap();
        let writer = MessageWriter::new(&schema, EncapsulationKind::CdrLe).unwrap();
        let reader = MessageReader::new(&schema, EncapsulationKind::CdrLe).unwrap();
        let value = message(vec![
            (UNION_DISCRIMINATOR_PROPERTY_KEY, CodecValue::Int32(1)),
            ("side", CodecValue::Float64(3.0)),
        ]);
        let bytes = writer.write_message("Shape", &value).unwrap();
        let decoded = reader.read_message("Shape", &bytes).unwrap();
        assert_eq!(decoded.get(UNION_DISCRIMINATOR_PROPERTY_KEY), Some(&CodecValue::Int32(1)));
        assert_eq!(decoded.get("side"), Some(&CodecValue::Float64(3.0)));
        assert!(decoded.get("radius").is_none());
    }

    #[test]
    fn multidimensional_array_round_trips_row_major() {
        let schema = parse_and_resolve("struct A { uint8 grid[2][2]; };").unwrap();
        let writer = MessageWriter::new(&schema, EncapsulationKind::CdrLe).unwrap();
        let reader = MessageReader::new(&schema, EncapsulationKind::CdrLe).unwrap();
        let value = message(vec![(
            "grid",
            CodecValue::Array(vec![
                CodecValue::Array(vec![CodecValue::UInt8(1), CodecValue::UInt8(2)]),
                CodecValue::Array(vec![CodecValue::UInt8(3), CodecValue::UInt8(4)]),
            ]),
        )]);
        let bytes = writer.write_message("A", &value).unwrap();
        assert_eq!(&bytes[4..], &[1, 2, 3, 4]);
        let decoded = reader.read_message("A", &bytes).unwrap();
        assert_eq!(
            decoded.get("grid"),
            Some(&CodecValue::Array(vec![
                CodecValue::Array(vec![CodecValue::UInt8(1), CodecValue::UInt8(2)]),
                CodecValue::Array(vec![CodecValue::UInt8(3), CodecValue::UInt8(4)]),
            ]))
        );
    }
}
