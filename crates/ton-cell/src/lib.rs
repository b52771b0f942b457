//! TON wire-format primitives for the Fiva client.
//!
//! This crate provides:
//! - `addr_std` addresses in raw and user-friendly form
//! - Ordinary cells with representation hashes, a builder and a reader
//! - Bag-of-cells serialization with CRC32-C
//! - The CRC16 / CRC32-C checksums those formats need

pub mod address;
pub mod boc;
pub mod cell;
pub mod checksum;
pub mod error;

pub use address::{Address, FriendlyAddress};
pub use cell::{Cell, CellBuilder, CellSlice, MAX_BITS, MAX_COINS, MAX_REFS};
pub use error::CellError;
