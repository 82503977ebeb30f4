// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # idlcodec
//!
//! OMG IDL / ROS 2 IDL schema parser and CDR (XCDR2) message codec for
//! DDS/ROS 2 messages.
//!
//! - **[`schema::parse_and_resolve`]** - parse IDL source and resolve it
//!   into a name-complete [`schema::Schema`]
//! - **[`encoding::cdr::MessageWriter`]** - size and encode a
//!   [`core::DecodedMessage`] against a resolved schema
//! - **[`encoding::cdr::MessageReader`]** - decode CDR bytes back into a
//!   [`core::DecodedMessage`]
//!
//! ## Example
//!
//! ```
//! use idlcodec::core::{CodecValue, DecodedMessage};
//! use idlcodec::encoding::cdr::{EncapsulationKind, MessageReader, MessageWriter};
//! use idlcodec::schema::parse_and_resolve;
//!
//! # fn main() -> idlcodec::core::Result<()> {
//! let schema = parse_and_resolve("struct Point { int32 x; int32 y; };")?;
//! let writer = MessageWriter::new(&schema, EncapsulationKind::CdrLe)?;
//! let reader = MessageReader::new(&schema, EncapsulationKind::CdrLe)?;
//!
//! let mut value = DecodedMessage::new();
//! value.insert("x", CodecValue::Int32(1));
//! value.insert("y", CodecValue::Int32(2));
//!
//! let bytes = writer.write_message("Point", &value)?;
//! let decoded = reader.read_message("Point", &bytes)?;
//! assert_eq!(decoded.get("x"), Some(&CodecValue::Int32(1)));
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod encoding;
pub mod schema;

pub use core::{CodecError, CodecValue, DecodedMessage, Result};
pub use encoding::cdr::{EncapsulationKind, MessageReader, MessageWriter};
pub use schema::{parse_and_resolve, Schema};
