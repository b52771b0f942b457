use fiva_messages::MessageError;
use thiserror::Error;
use ton_cell::CellError;

/// Failures reading contract state over RPC.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Network or node failure; worth retrying.
    #[error("transport error: {0}")]
    Transport(String),

    /// The get-method ran and exited with a non-zero code.
    #[error("get-method {method} failed with exit code {code}")]
    ExitCode { method: String, code: i32 },

    /// The returned stack does not have the expected shape.
    #[error("unexpected result from {method}: {reason}")]
    Decode { method: String, reason: String },
}

impl ProviderError {
    pub fn decode(method: &str, reason: impl Into<String>) -> Self {
        ProviderError::Decode {
            method: method.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failures handing a transaction to the wallet bridge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("wallet is not connected")]
    NotConnected,

    #[error("transaction was rejected by the user")]
    Rejected,

    #[error("wallet bridge error: {0}")]
    Bridge(String),
}

/// Swap pairs refused before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AssetPairError {
    #[error("From and to assets are the same")]
    SameAsset,

    #[error("Swaps between PT and YT assets are not supported")]
    PtYtSwap,
}

/// Top-level error for every client operation.
#[derive(Debug, Error)]
pub enum FivaError {
    #[error("provided connector is not connected")]
    NotConnected,

    #[error("unresolved asset: {0}")]
    UnresolvedAsset(String),

    #[error(transparent)]
    InvalidAssetPair(#[from] AssetPairError),

    #[error(transparent)]
    Remote(#[from] ProviderError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    Encoding(#[from] MessageError),

    #[error(transparent)]
    Cell(#[from] CellError),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}
