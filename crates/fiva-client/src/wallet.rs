//! The wallet side: turning built messages into a signable request.
//!
//! The client never holds keys. It hands a [`TransactionRequest`] to a
//! [`WalletSender`] (a TON Connect bridge, a hardware wallet, a test double)
//! which signs and broadcasts it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use ton_cell::{Address, Cell};

use crate::error::{FivaError, SubmissionError};

/// One internal message as built by the client, before rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalMessage {
    pub destination: Address,
    /// Nanotons attached to the message.
    pub value: u128,
    pub body: Cell,
}

impl InternalMessage {
    pub fn new(destination: Address, value: u128, body: Cell) -> Self {
        Self {
            destination,
            value,
            body,
        }
    }

    /// Render for the wallet: friendly destination, decimal nanotons and a
    /// base64 bag-of-cells payload.
    pub fn to_outgoing(&self, bounceable: bool, testnet: bool) -> Result<OutgoingMessage, FivaError> {
        Ok(OutgoingMessage {
            address: self.destination.to_friendly(bounceable, testnet, true),
            amount: self.value.to_string(),
            payload: ton_cell::boc::to_base64(&self.body)?,
        })
    }
}

/// A message in the wallet request format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub address: String,
    pub amount: String,
    pub payload: String,
}

/// Everything a wallet needs to sign one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    /// Unix seconds after which the wallet must refuse to sign.
    pub valid_until: i64,
    pub messages: Vec<OutgoingMessage>,
}

#[async_trait]
pub trait WalletSender: Send + Sync {
    fn is_connected(&self) -> bool;

    /// The connected account, if any.
    fn account(&self) -> Option<Address>;

    /// Sign and broadcast. Returns the wallet's opaque result (usually the
    /// signed external message as base64).
    async fn send_transaction(&self, request: TransactionRequest) -> Result<String, SubmissionError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use ton_cell::CellBuilder;

    #[test]
    fn outgoing_message_rendering() {
        let mut b = CellBuilder::new();
        b.store_uint(0x0f8a_7ea5, 32).unwrap();
        let msg = InternalMessage::new(Address::new(0, [0x11; 32]), 250_000_000, b.build());

        let out = msg.to_outgoing(true, false).unwrap();
        assert_eq!(out.amount, "250000000");
        assert_eq!(Address::parse(&out.address).unwrap(), msg.destination);
        let body = ton_cell::boc::from_base64(&out.payload).unwrap();
        assert_eq!(body.hash(), msg.body.hash());
    }

    #[test]
    fn bounce_and_network_flags_reach_the_address() {
        let msg = InternalMessage::new(Address::new(0, [0x22; 32]), 1, Cell::empty());
        let bounceable = msg.to_outgoing(true, false).unwrap().address;
        let plain = msg.to_outgoing(false, false).unwrap().address;
        let testnet = msg.to_outgoing(true, true).unwrap().address;

        let parsed = Address::parse_friendly(&plain).unwrap();
        assert!(!parsed.bounceable);
        assert!(Address::parse_friendly(&bounceable).unwrap().bounceable);
        assert!(Address::parse_friendly(&testnet).unwrap().test_only);
    }

    #[test]
    fn request_serializes_camel_case() {
        let req = TransactionRequest {
            valid_until: 1_700_000_300,
            messages: vec![],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["validUntil"], 1_700_000_300);
        assert!(json["messages"].as_array().unwrap().is_empty());
    }
}
