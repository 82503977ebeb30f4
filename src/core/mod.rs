// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types shared across schema resolution and CDR (de)serialization.
//!
//! - [`CodecError`] - every failure mode from parsing through decoding
//! - [`CodecValue`] / [`DecodedMessage`] - the dynamic value representation
//!   traded between the writer and reader

pub mod error;
pub mod value;

pub use error::{CodecError, Result};
pub use value::{CodecValue, DecodedMessage};
