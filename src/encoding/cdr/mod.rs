// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CDR (Common Data Representation) / XCDR2 codec for DDS/ROS 2 messages.
//!
//! - [`kind`] - encapsulation kinds (`CDR_LE`/`CDR_BE`/`PL_CDR2_*`/...) and
//!   their framing properties
//! - [`cursor`] / [`sink`] - the alignment-tracking read and write cursors
//!   primitives are read from and written to
//! - [`headers`] - delimiter and member (PID) header encode/decode
//! - [`cache`] - precomputed per-type field plans ([`DeserializationInfoCache`])
//! - [`writer`] / [`reader`] - [`MessageWriter`] and [`MessageReader`], the
//!   public entry points for turning a [`crate::core::DecodedMessage`] into
//!   bytes and back

pub mod cache;
pub mod cursor;
pub mod headers;
pub mod kind;
pub mod reader;
pub mod sink;
pub mod writer;

pub use cache::{DeserializationInfoCache, FieldKind, FieldPlan, StructPlan, UnionCasePlan, UnionPlan};
pub use cursor::{CdrCursor, CDR_HEADER_SIZE};
pub use kind::EncapsulationKind;
pub use reader::MessageReader;
pub use writer::MessageWriter;
