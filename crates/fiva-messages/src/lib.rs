//! Message payloads for the Fiva protocol.
//!
//! This crate provides:
//! - The pinned opcode table shared with the on-chain contracts
//! - TEP-74 jetton transfer and burn envelopes
//! - The closed [`Operation`] enum, one variant per protocol message

pub mod error;
pub mod jetton;
pub mod opcodes;
pub mod operation;

pub use error::MessageError;
pub use jetton::{JettonBurn, JettonTransfer};
pub use operation::Operation;
