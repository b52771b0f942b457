use thiserror::Error;
use ton_cell::CellError;

/// Message encoding errors.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("cell encoding failed: {0}")]
    Cell(#[from] CellError),

    #[error("unexpected opcode: expected 0x{expected:08x}, found 0x{found:08x}")]
    UnexpectedOpcode { expected: u32, found: u32 },

    #[error("malformed message: {0}")]
    Malformed(String),
}
