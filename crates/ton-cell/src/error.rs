use thiserror::Error;

/// TON wire format errors.
#[derive(Debug, Error)]
pub enum CellError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("cell overflow: {0}")]
    Overflow(String),

    #[error("cell underflow: {0}")]
    Underflow(String),

    #[error("invalid bag of cells: {0}")]
    InvalidBoc(String),

    #[error("unsupported: {0}")]
    Unsupported(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_address() {
        let err = CellError::InvalidAddress("bad checksum".into());
        assert_eq!(err.to_string(), "invalid address: bad checksum");
    }

    #[test]
    fn display_overflow() {
        let err = CellError::Overflow("1024 bits".into());
        assert_eq!(err.to_string(), "cell overflow: 1024 bits");
    }

    #[test]
    fn display_underflow() {
        let err = CellError::Underflow("need 32 bits, 8 left".into());
        assert_eq!(err.to_string(), "cell underflow: need 32 bits, 8 left");
    }

    #[test]
    fn display_invalid_boc() {
        let err = CellError::InvalidBoc("bad magic".into());
        assert_eq!(err.to_string(), "invalid bag of cells: bad magic");
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> = Box::new(CellError::Unsupported("exotic".into()));
        assert!(err.to_string().contains("exotic"));
    }
}
