//! Client SDK for the Fiva yield-tokenization protocol on TON.
//!
//! This crate provides:
//! - Lazy, memoized resolution of the protocol's contract addresses
//! - Typed get-method views with bounded retries
//! - Underlying / SY unit conversion at the current index
//! - Transaction methods for swaps, mint/redeem, liquidity and interest claims
//! - Fixed-APY and gain analytics from pool quotes
//!
//! Chain access and signing are injected through [`ChainReader`] and
//! [`WalletSender`].

pub mod analytics;
pub mod client;
pub mod config;
pub mod contracts;
pub mod error;
pub mod fees;
pub mod provider;
pub mod resolver;
pub mod retry;
pub mod transaction;
pub mod types;
pub mod units;
pub mod wallet;

pub use client::{FivaClient, TxOptions};
pub use config::ClientConfig;
pub use error::{AssetPairError, FivaError, ProviderError, SubmissionError};
pub use provider::{ChainReader, StackValue};
pub use retry::{Backoff, RetryConfig, RetryObserver, RetryPolicy};
pub use types::{
    AddressKind, Asset, ClaimReceipt, ClaimableInterest, ContractAddresses, FeeEstimate,
    ResolutionState,
};
pub use units::UnitConverter;
pub use wallet::{OutgoingMessage, TransactionRequest, WalletSender};

pub use fiva_messages::opcodes;
pub use ton_cell::Address;
