//! Read access to contract state.
//!
//! The client only ever calls get-methods: a method name plus positional
//! integer / slice arguments, returning a TVM stack. [`ChainReader`] is that
//! one call; any RPC backend (toncenter, a lite-server proxy, a test double)
//! implements it.

use std::collections::VecDeque;

use alloy_primitives::U256;
use async_trait::async_trait;
use ton_cell::{Address, Cell, CellBuilder, CellError};

use crate::error::ProviderError;

/// One TVM stack entry as exchanged with a get-method.
///
/// Integers are non-negative here; the protocol getters never return
/// negative values, and backends should report one as a decode error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackValue {
    Null,
    Int(U256),
    Cell(Cell),
    Slice(Cell),
}

impl StackValue {
    pub fn int(value: impl Into<u128>) -> Self {
        StackValue::Int(U256::from(value.into()))
    }

    /// A slice holding a single `addr_std`.
    pub fn address(address: &Address) -> Result<Self, CellError> {
        let mut b = CellBuilder::new();
        b.store_address(address)?;
        Ok(StackValue::Slice(b.build()))
    }

    /// A slice holding `addr_none`.
    pub fn address_none() -> Result<Self, CellError> {
        let mut b = CellBuilder::new();
        b.store_address_none()?;
        Ok(StackValue::Slice(b.build()))
    }
}

#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Run get-method `method` on the contract at `address`.
    ///
    /// A non-zero exit code must be reported as [`ProviderError::ExitCode`].
    async fn run_get_method(
        &self,
        address: &Address,
        method: &str,
        args: &[StackValue],
    ) -> Result<Vec<StackValue>, ProviderError>;
}

/// Typed, front-to-back reader over a returned stack.
#[derive(Debug)]
pub struct StackReader {
    method: String,
    items: VecDeque<StackValue>,
}

impl StackReader {
    pub fn new(method: &str, items: Vec<StackValue>) -> Self {
        Self {
            method: method.to_string(),
            items: items.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.items.len()
    }

    fn err(&self, reason: impl Into<String>) -> ProviderError {
        ProviderError::decode(&self.method, reason)
    }

    fn next(&mut self, expected: &str) -> Result<StackValue, ProviderError> {
        self.items
            .pop_front()
            .ok_or_else(|| self.err(format!("stack exhausted, expected {expected}")))
    }

    pub fn read_int(&mut self) -> Result<U256, ProviderError> {
        match self.next("int")? {
            StackValue::Int(v) => Ok(v),
            other => Err(self.err(format!("expected int, got {other:?}"))),
        }
    }

    pub fn read_u128(&mut self) -> Result<u128, ProviderError> {
        let v = self.read_int()?;
        u128::try_from(v).map_err(|_| self.err(format!("{v} does not fit in 128 bits")))
    }

    pub fn read_u64(&mut self) -> Result<u64, ProviderError> {
        let v = self.read_int()?;
        u64::try_from(v).map_err(|_| self.err(format!("{v} does not fit in 64 bits")))
    }

    /// A cell or slice entry as a cell.
    pub fn read_cell(&mut self) -> Result<Cell, ProviderError> {
        match self.next("cell")? {
            StackValue::Cell(c) | StackValue::Slice(c) => Ok(c),
            other => Err(self.err(format!("expected cell, got {other:?}"))),
        }
    }

    /// A slice holding a `MsgAddressInt`; `addr_none` and `null` give `None`.
    pub fn read_address_opt(&mut self) -> Result<Option<Address>, ProviderError> {
        match self.next("address slice")? {
            StackValue::Null => Ok(None),
            StackValue::Cell(c) | StackValue::Slice(c) => c
                .parse()
                .load_address()
                .map_err(|e| self.err(format!("bad address slice: {e}"))),
            other => Err(self.err(format!("expected address slice, got {other:?}"))),
        }
    }

    pub fn read_address(&mut self) -> Result<Address, ProviderError> {
        self.read_address_opt()?
            .ok_or_else(|| self.err("expected address, got addr_none"))
    }
}
