// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! The write-side counterpart of [`super::cursor::CdrCursor`]: a growing byte
//! buffer ([`CdrWriter`]) and a byte-counting dry run ([`CdrSizeCounter`])
//! that share one `Sink` trait, so the struct/union/array traversal in
//! [`super::writer`] is written once and run twice — first to size a message,
//! then to actually encode it. Alignment uses the same fixed origin as the
//! cursor: `(position - 4) % width`, never reset for nested aggregates.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use super::cursor::CDR_HEADER_SIZE;
use super::kind::EncapsulationKind;

/// A place primitives can be written to, abstracting over "really write the
/// bytes" ([`CdrWriter`]) and "just count how many bytes this would take"
/// ([`CdrSizeCounter`]).
pub trait Sink {
    fn position(&self) -> usize;
    fn little_endian(&self) -> bool;
    fn align(&mut self, width: usize);
    fn put_u8(&mut self, value: u8);
    fn put_bytes(&mut self, bytes: &[u8]);
    /// Overwrite the `u16` at `pos` (already written) in place. Used to back
    /// -patch a member header's inline size once its field body is known.
    /// A no-op on [`CdrSizeCounter`], which never materializes bytes.
    fn patch_u16(&mut self, pos: usize, value: u16);
    /// Overwrite the `u32` at `pos` (already written) in place. Used to
    /// back-patch a delimiter header's body length.
    fn patch_u32(&mut self, pos: usize, value: u32);
}

/// Accumulates real encoded bytes, starting with the 4-byte encapsulation
/// header.
pub struct CdrWriter {
    buffer: Vec<u8>,
    little_endian: bool,
}

impl CdrWriter {
    pub fn new(kind: EncapsulationKind) -> Self {
        let mut buffer = Vec::with_capacity(64);
        buffer.extend_from_slice(&[0x00, kind.to_byte(), 0x00, 0x00]);
        Self {
            buffer,
            little_endian: kind.is_little_endian(),
        }
    }

    pub fn finish(self) -> Vec<u8> {
        self.buffer
    }
}

impl Sink for CdrWriter {
    fn position(&self) -> usize {
        self.buffer.len()
    }

    fn little_endian(&self) -> bool {
        self.little_endian
    }

    fn align(&mut self, width: usize) {
        let misalignment = (self.buffer.len() - CDR_HEADER_SIZE) % width;
        if misalignment > 0 {
            self.buffer.resize(self.buffer.len() + (width - misalignment), 0);
        }
    }

    fn put_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    fn put_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    fn patch_u16(&mut self, pos: usize, value: u16) {
        if self.little_endian {
            LittleEndian::write_u16(&mut self.buffer[pos..pos + 2], value);
        } else {
            BigEndian::write_u16(&mut self.buffer[pos..pos + 2], value);
        }
    }

    fn patch_u32(&mut self, pos: usize, value: u32) {
        if self.little_endian {
            LittleEndian::write_u32(&mut self.buffer[pos..pos + 4], value);
        } else {
            BigEndian::write_u32(&mut self.buffer[pos..pos + 4], value);
        }
    }
}

/// Tracks only the position a [`CdrWriter`] would reach, without allocating
/// or copying any bytes. Used to compute `calculate_byte_size` and to
/// pre-size nested bodies for delimiter headers before they are written.
pub struct CdrSizeCounter {
    position: usize,
    little_endian: bool,
}

impl CdrSizeCounter {
    pub fn new(kind: EncapsulationKind) -> Self {
        Self {
            position: CDR_HEADER_SIZE,
            little_endian: kind.is_little_endian(),
        }
    }

    pub fn size(&self) -> usize {
        self.position
    }
}

impl Sink for CdrSizeCounter {
    fn position(&self) -> usize {
        self.position
    }

    fn little_endian(&self) -> bool {
        self.little_endian
    }

    fn align(&mut self, width: usize) {
        let misalignment = (self.position - CDR_HEADER_SIZE) % width;
        if misalignment > 0 {
            self.position += width - misalignment;
        }
    }

    fn put_u8(&mut self, _value: u8) {
        self.position += 1;
    }

    fn put_bytes(&mut self, bytes: &[u8]) {
        self.position += bytes.len();
    }

    fn patch_u16(&mut self, _pos: usize, _value: u16) {}

    fn patch_u32(&mut self, _pos: usize, _value: u32) {}
}

pub fn write_u8<S: Sink>(sink: &mut S, value: u8) {
    sink.put_u8(value);
}

pub fn write_i8<S: Sink>(sink: &mut S, value: i8) {
    sink.put_u8(value as u8);
}

pub fn write_bool<S: Sink>(sink: &mut S, value: bool) {
    sink.put_u8(u8::from(value));
}

fn write_fixed<S: Sink>(sink: &mut S, width: usize, bytes: &[u8]) {
    sink.align(width);
    sink.put_bytes(bytes);
}

pub fn write_u16<S: Sink>(sink: &mut S, value: u16) {
    let mut bytes = [0u8; 2];
    if sink.little_endian() {
        LittleEndian::write_u16(&mut bytes, value);
    } else {
        BigEndian::write_u16(&mut bytes, value);
    }
    write_fixed(sink, 2, &bytes);
}

pub fn write_i16<S: Sink>(sink: &mut S, value: i16) {
    write_u16(sink, value as u16);
}

pub fn write_u32<S: Sink>(sink: &mut S, value: u32) {
    let mut bytes = [0u8; 4];
    if sink.little_endian() {
        LittleEndian::write_u32(&mut bytes, value);
    } else {
        BigEndian::write_u32(&mut bytes, value);
    }
    write_fixed(sink, 4, &bytes);
}

pub fn write_i32<S: Sink>(sink: &mut S, value: i32) {
    write_u32(sink, value as u32);
}

pub fn write_u64<S: Sink>(sink: &mut S, value: u64) {
    let mut bytes = [0u8; 8];
    if sink.little_endian() {
        LittleEndian::write_u64(&mut bytes, value);
    } else {
        BigEndian::write_u64(&mut bytes, value);
    }
    write_fixed(sink, 8, &bytes);
}

pub fn write_i64<S: Sink>(sink: &mut S, value: i64) {
    write_u64(sink, value as u64);
}

pub fn write_f32<S: Sink>(sink: &mut S, value: f32) {
    let mut bytes = [0u8; 4];
    if sink.little_endian() {
        LittleEndian::write_f32(&mut bytes, value);
    } else {
        BigEndian::write_f32(&mut bytes, value);
    }
    write_fixed(sink, 4, &bytes);
}

pub fn write_f64<S: Sink>(sink: &mut S, value: f64) {
    let mut bytes = [0u8; 8];
    if sink.little_endian() {
        LittleEndian::write_f64(&mut bytes, value);
    } else {
        BigEndian::write_f64(&mut bytes, value);
    }
    write_fixed(sink, 8, &bytes);
}

/// Write a CDR `string`: a 4-byte-aligned length (character count including
/// the trailing nul) followed by the UTF-8 bytes and a `0x00` terminator.
pub fn write_string<S: Sink>(sink: &mut S, value: &str) {
    write_u32(sink, value.len() as u32 + 1);
    sink.put_bytes(value.as_bytes());
    sink.put_u8(0);
}

/// Write a CDR `wstring`: a 4-byte-aligned byte length (including a trailing
/// 2-byte nul) followed by UTF-16 code units and a `0x0000` terminator.
pub fn write_wstring<S: Sink>(sink: &mut S, value: &str) {
    let units: Vec<u16> = value.encode_utf16().collect();
    write_u32(sink, units.len() as u32 * 2 + 2);
    for unit in units {
        write_u16(sink, unit);
    }
    write_u16(sink, 0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_and_counter_agree_on_size() {
        let mut writer = CdrWriter::new(EncapsulationKind::CdrLe);
        let mut counter = CdrSizeCounter::new(EncapsulationKind::CdrLe);
        write_u8(&mut writer, 1);
        write_u8(&mut counter, 1);
        write_u32(&mut writer, 42);
        write_u32(&mut counter, 42);
        write_string(&mut writer, "hi");
        write_string(&mut counter, "hi");
        assert_eq!(writer.finish().len(), counter.size());
    }

    #[test]
    fn primitive_alignment_matches_fixed_origin() {
        let mut writer = CdrWriter::new(EncapsulationKind::CdrLe);
        write_u8(&mut writer, 1);
        write_u32(&mut writer, 42);
        let bytes = writer.finish();
        assert_eq!(bytes, vec![0x00, 0x01, 0x00, 0x00, 1, 0, 0, 0, 42, 0, 0, 0]);
    }

    #[test]
    fn string_encoding_matches_length_plus_nul() {
        let mut writer = CdrWriter::new(EncapsulationKind::CdrLe);
        write_string(&mut writer, "hi");
        assert_eq!(
            writer.finish(),
            vec![0x00, 0x01, 0x00, 0x00, 3, 0, 0, 0, b'h', b'i', 0]
        );
    }
}
