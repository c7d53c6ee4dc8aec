//! BACnet/IP wire codecs in pure Rust.
//!
//! `bacflow-core` encodes and decodes the layers of a BACnet/IP datagram:
//! the BVLC link header, the NPDU network header, APDU headers, and the
//! service payloads for property access and device discovery. Decoding is
//! zero-copy over a [`encoding::reader::Reader`]; encoding writes into a
//! caller-provided buffer through [`encoding::writer::Writer`].
//!
//! # Feature flags
//!
//! - **`std`** (default) — enables `std::error::Error` implementations.
//! - **`alloc`** (default) — enables decoders that allocate (RPM acks, constructed values).
//! - **`serde`** — derives `Serialize`/`Deserialize` on core types.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

/// APDU headers and the decoded [`apdu::Apdu`] view.
pub mod apdu;
/// BACnet Virtual Link Control header for BACnet/IP.
pub mod bvlc;
/// Tag system, primitive codecs, and the zero-copy reader/writer.
pub mod encoding;
/// Error types for encoding and decoding operations.
pub mod error;
/// Whole-datagram encode/decode across BVLC, NPDU and APDU.
pub mod frame;
/// NPDU (Network Protocol Data Unit) encoding and decoding.
pub mod npdu;
/// Service request and acknowledgement codecs.
pub mod services;
/// Object identifiers, property identifiers, addresses and data values.
pub mod types;

pub use error::{DecodeError, EncodeError};
