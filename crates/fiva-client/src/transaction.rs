//! Assembling built payloads into one wallet request.
//!
//! A request with several messages is signed once and shares one
//! `validUntil`, but each message executes independently on chain. If the
//! second message bounces, the first one is not rolled back.

use fiva_messages::{JettonBurn, JettonTransfer, Operation};
use ton_cell::Address;

use crate::error::FivaError;
use crate::types::FeeEstimate;
use crate::wallet::{InternalMessage, TransactionRequest};

#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    valid_until: i64,
    messages: Vec<InternalMessage>,
}

impl TransactionBuilder {
    pub fn new(valid_until: i64) -> Self {
        Self {
            valid_until,
            messages: Vec::new(),
        }
    }

    pub fn valid_until(&self) -> i64 {
        self.valid_until
    }

    pub fn messages(&self) -> &[InternalMessage] {
        &self.messages
    }

    /// A jetton transfer sent to the user's `wallet`, carrying `fee.value`.
    pub fn transfer(
        &mut self,
        wallet: Address,
        fee: FeeEstimate,
        transfer: JettonTransfer,
    ) -> Result<&mut Self, FivaError> {
        let body = transfer.build()?;
        self.messages.push(InternalMessage::new(wallet, fee.value, body));
        Ok(self)
    }

    /// A jetton burn sent to the user's `wallet`, carrying `fee.value`.
    pub fn burn(
        &mut self,
        wallet: Address,
        fee: FeeEstimate,
        burn: JettonBurn,
    ) -> Result<&mut Self, FivaError> {
        let body = burn.build()?;
        self.messages.push(InternalMessage::new(wallet, fee.value, body));
        Ok(self)
    }

    /// A protocol operation sent directly to `destination`.
    pub fn direct(
        &mut self,
        destination: Address,
        value: u128,
        op: &Operation,
    ) -> Result<&mut Self, FivaError> {
        let body = op.build()?;
        self.messages.push(InternalMessage::new(destination, value, body));
        Ok(self)
    }

    /// Render every message for the wallet.
    pub fn build(self, bounceable: bool, testnet: bool) -> Result<TransactionRequest, FivaError> {
        if self.messages.is_empty() {
            return Err(FivaError::InvalidAmount("transaction has no messages".into()));
        }
        let messages = self
            .messages
            .iter()
            .map(|m| m.to_outgoing(bounceable, testnet))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TransactionRequest {
            valid_until: self.valid_until,
            messages,
        })
    }
}
