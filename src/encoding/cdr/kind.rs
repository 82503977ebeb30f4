// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! The CDR encapsulation kind carried in byte 1 of the 4-byte header.

use crate::core::{CodecError, Result};

/// Wire-format/endianness tag occupying byte 1 of the encapsulation header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncapsulationKind {
    CdrBe,
    CdrLe,
    PlCdrBe,
    PlCdrLe,
    Cdr2Be,
    Cdr2Le,
    PlCdr2Be,
    PlCdr2Le,
    DelimitedCdr2Be,
    DelimitedCdr2Le,
    RtpsCdr2Be,
    RtpsCdr2Le,
}

impl EncapsulationKind {
    pub fn from_byte(byte: u8) -> Result<Self> {
        Ok(match byte {
            0x00 => EncapsulationKind::CdrBe,
            0x01 => EncapsulationKind::CdrLe,
            0x02 => EncapsulationKind::PlCdrBe,
            0x03 => EncapsulationKind::PlCdrLe,
            0x10 => EncapsulationKind::Cdr2Be,
            0x11 => EncapsulationKind::Cdr2Le,
            0x12 => EncapsulationKind::PlCdr2Be,
            0x13 => EncapsulationKind::PlCdr2Le,
            0x14 => EncapsulationKind::DelimitedCdr2Be,
            0x15 => EncapsulationKind::DelimitedCdr2Le,
            0x06 => EncapsulationKind::RtpsCdr2Be,
            0x07 => EncapsulationKind::RtpsCdr2Le,
            other => {
                return Err(CodecError::unsupported(format!(
                    "unknown encapsulation kind byte 0x{other:02x}"
                )))
            }
        })
    }

    pub fn to_byte(self) -> u8 {
        match self {
            EncapsulationKind::CdrBe => 0x00,
            EncapsulationKind::CdrLe => 0x01,
            EncapsulationKind::PlCdrBe => 0x02,
            EncapsulationKind::PlCdrLe => 0x03,
            EncapsulationKind::Cdr2Be => 0x10,
            EncapsulationKind::Cdr2Le => 0x11,
            EncapsulationKind::PlCdr2Be => 0x12,
            EncapsulationKind::PlCdr2Le => 0x13,
            EncapsulationKind::DelimitedCdr2Be => 0x14,
            EncapsulationKind::DelimitedCdr2Le => 0x15,
            EncapsulationKind::RtpsCdr2Be => 0x06,
            EncapsulationKind::RtpsCdr2Le => 0x07,
        }
    }

    pub fn is_little_endian(self) -> bool {
        matches!(
            self,
            EncapsulationKind::CdrLe
                | EncapsulationKind::PlCdrLe
                | EncapsulationKind::Cdr2Le
                | EncapsulationKind::PlCdr2Le
                | EncapsulationKind::DelimitedCdr2Le
                | EncapsulationKind::RtpsCdr2Le
        )
    }

    /// Whether each aggregate is framed with a delimiter header giving its
    /// total body length.
    pub fn uses_delimiter_header(self) -> bool {
        matches!(
            self,
            EncapsulationKind::PlCdr2Be
                | EncapsulationKind::PlCdr2Le
                | EncapsulationKind::DelimitedCdr2Be
                | EncapsulationKind::DelimitedCdr2Le
        )
    }

    /// Whether each field is framed with a member (PID) header.
    pub fn uses_member_header(self) -> bool {
        matches!(
            self,
            EncapsulationKind::PlCdrBe
                | EncapsulationKind::PlCdrLe
                | EncapsulationKind::PlCdr2Be
                | EncapsulationKind::PlCdr2Le
        )
    }

    /// XCDR1 parameter-list kinds parse and round-trip as tags (`from_byte`/
    /// `to_byte`), but `MessageWriter::new`/`MessageReader::new` reject them
    /// with `CodecError::Unsupported` — only XCDR2-style delimiter/member
    /// header framing is implemented. Open question (a).
    pub fn is_legacy_parameter_list(self) -> bool {
        matches!(self, EncapsulationKind::PlCdrBe | EncapsulationKind::PlCdrLe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_code() {
        for byte in [
            0x00, 0x01, 0x02, 0x03, 0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x06, 0x07,
        ] {
            let kind = EncapsulationKind::from_byte(byte).unwrap();
            assert_eq!(kind.to_byte(), byte);
        }
    }

    #[test]
    fn unknown_byte_is_unsupported() {
        assert!(EncapsulationKind::from_byte(0xFF).is_err());
    }

    #[test]
    fn pl_cdr2_framing_flags() {
        assert!(EncapsulationKind::PlCdr2Le.uses_delimiter_header());
        assert!(EncapsulationKind::PlCdr2Le.uses_member_header());
        assert!(!EncapsulationKind::Cdr2Le.uses_member_header());
    }
}
