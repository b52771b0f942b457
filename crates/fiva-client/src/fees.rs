//! Per-operation fee quotes.
//!
//! Quotes are read fresh on every call and never cached.

use std::sync::Arc;

use fiva_messages::opcodes;
use ton_cell::Address;
use tracing::debug;

use crate::contracts::{Pool, SyMinter};
use crate::error::FivaError;
use crate::provider::ChainReader;
use crate::retry::RetryPolicy;
use crate::types::FeeEstimate;

pub struct FeeEstimator {
    reader: Arc<dyn ChainReader>,
    retry: RetryPolicy,
}

impl FeeEstimator {
    pub fn new(reader: Arc<dyn ChainReader>, retry: RetryPolicy) -> Self {
        Self { reader, retry }
    }

    /// Quote from the SY minter's `get_gas_estimation(op)`.
    pub async fn estimate_fee(&self, sy_minter: Address, op: u32) -> Result<FeeEstimate, FivaError> {
        let view = SyMinter::new(self.reader.as_ref(), sy_minter);
        let fee = self
            .retry
            .run("get_gas_estimation", move || async move {
                view.gas_estimation(op).await
            })
            .await?;
        debug!(
            "fee for op 0x{:08x}: value={} forward={}",
            op, fee.value, fee.forward_value
        );
        Ok(fee)
    }

    /// Quote from the pool's `get_fee_estimation(op, 0)`.
    pub async fn pool_fee(&self, pool: Address, op: u32) -> Result<FeeEstimate, FivaError> {
        let view = Pool::new(self.reader.as_ref(), pool);
        let fee = self
            .retry
            .run("get_fee_estimation", move || async move {
                view.fee_estimation(op).await
            })
            .await?;
        debug!(
            "pool fee for op 0x{:08x}: value={} forward={}",
            op, fee.value, fee.forward_value
        );
        Ok(fee)
    }

    /// Quote for adding PT-only liquidity, which the pool prices itself.
    pub async fn add_liquidity_fee(&self, pool: Address) -> Result<FeeEstimate, FivaError> {
        self.pool_fee(pool, opcodes::pool::ADD_LIQUIDITY).await
    }
}
