//! Typed views over the protocol contracts' get-methods.
//!
//! Each view is a borrowed reader plus the contract address. Views do no
//! retrying and no caching; callers wrap each call in a [`RetryPolicy`].
//!
//! [`RetryPolicy`]: crate::retry::RetryPolicy

use chrono::{DateTime, Utc};
use ton_cell::Address;

use crate::error::ProviderError;
use crate::provider::{ChainReader, StackReader, StackValue};
use crate::types::{
    ClaimableInterest, FeeEstimate, JettonWalletData, LiquidityOut, MintOut, PoolBalances,
    PoolConfig, PoolCurve, PoolWallets, RedeemOut, SupplyInfo, YtJettonAddresses,
};

async fn call(
    reader: &dyn ChainReader,
    address: &Address,
    method: &str,
    args: &[StackValue],
) -> Result<StackReader, ProviderError> {
    let stack = reader.run_get_method(address, method, args).await?;
    Ok(StackReader::new(method, stack))
}

fn address_arg(method: &str, owner: &Address) -> Result<StackValue, ProviderError> {
    StackValue::address(owner).map_err(|e| ProviderError::decode(method, e.to_string()))
}

// ---------------------------------------------------------------------------
// SY minter
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
pub struct SyMinter<'a> {
    reader: &'a dyn ChainReader,
    address: Address,
}

impl<'a> SyMinter<'a> {
    pub fn new(reader: &'a dyn ChainReader, address: Address) -> Self {
        Self { reader, address }
    }

    pub async fn yt_minter_address(&self) -> Result<Address, ProviderError> {
        call(self.reader, &self.address, "get_yt_minter_address", &[])
            .await?
            .read_address()
    }

    pub async fn pool_address(&self) -> Result<Address, ProviderError> {
        call(self.reader, &self.address, "get_pool_address", &[])
            .await?
            .read_address()
    }

    /// The SY minter's own jetton wallet of the underlying asset.
    pub async fn underlying_wallet_address(&self) -> Result<Address, ProviderError> {
        call(self.reader, &self.address, "get_underlying_address", &[])
            .await?
            .read_address()
    }

    pub async fn wallet_address(&self, owner: &Address) -> Result<Address, ProviderError> {
        let method = "get_wallet_address";
        let args = [address_arg(method, owner)?];
        call(self.reader, &self.address, method, &args)
            .await?
            .read_address()
    }

    pub async fn gas_estimation(&self, op: u32) -> Result<FeeEstimate, ProviderError> {
        let mut r = call(
            self.reader,
            &self.address,
            "get_gas_estimation",
            &[StackValue::int(op)],
        )
        .await?;
        Ok(FeeEstimate {
            value: r.read_u128()?,
            forward_value: r.read_u128()?,
        })
    }

    /// SY-per-underlying index scaled by 10^6; 0 when the minter has no
    /// index getter (non-rebasing underlying).
    pub async fn index(&self) -> Result<u128, ProviderError> {
        match call(self.reader, &self.address, "get_index", &[]).await {
            Ok(mut r) => r.read_u128(),
            Err(ProviderError::ExitCode { .. }) => Ok(0),
            Err(e) => Err(e),
        }
    }

    pub async fn underlying_precision(&self) -> Result<u32, ProviderError> {
        let method = "get_underlying_precision";
        let mut r = call(self.reader, &self.address, method, &[]).await?;
        let v = r.read_u64()?;
        u32::try_from(v).map_err(|_| ProviderError::decode(method, format!("precision {v}")))
    }

    pub async fn max_total_supply(&self) -> Result<SupplyInfo, ProviderError> {
        let mut r = call(self.reader, &self.address, "get_max_total_supply", &[]).await?;
        Ok(SupplyInfo {
            max_total_supply: r.read_u128()?,
            total_supply: r.read_u128()?,
        })
    }
}

// ---------------------------------------------------------------------------
// YT minter
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
pub struct YtMinter<'a> {
    reader: &'a dyn ChainReader,
    address: Address,
}

impl<'a> YtMinter<'a> {
    pub fn new(reader: &'a dyn ChainReader, address: Address) -> Self {
        Self { reader, address }
    }

    pub async fn wallet_address(&self, owner: &Address) -> Result<Address, ProviderError> {
        let method = "get_wallet_address";
        let args = [address_arg(method, owner)?];
        call(self.reader, &self.address, method, &args)
            .await?
            .read_address()
    }

    /// The three addresses are packed into a single cell.
    pub async fn jetton_addresses(&self) -> Result<YtJettonAddresses, ProviderError> {
        let method = "get_jetton_addresses";
        let cell = call(self.reader, &self.address, method, &[])
            .await?
            .read_cell()?;
        let bad = |e: ton_cell::CellError| ProviderError::decode(method, e.to_string());

        let mut s = cell.parse();
        let sy_wallet = s.load_address().map_err(bad)?;
        let pt_minter = s
            .load_address()
            .map_err(bad)?
            .ok_or_else(|| ProviderError::decode(method, "PT minter is addr_none"))?;
        let pt_wallet = s.load_address().map_err(bad)?;

        Ok(YtJettonAddresses {
            sy_wallet,
            pt_minter,
            pt_wallet,
        })
    }

    pub async fn mint_pt_yt_out(&self, sy_amount: u128) -> Result<MintOut, ProviderError> {
        let mut r = call(
            self.reader,
            &self.address,
            "get_mint_yt_pt_out",
            &[StackValue::int(sy_amount)],
        )
        .await?;
        Ok(MintOut {
            yt: r.read_u128()?,
            pt: r.read_u128()?,
        })
    }

    pub async fn claimable_interest(
        &self,
        yt_amount: u128,
        last_collected_index: u128,
        acquired_amount: u128,
    ) -> Result<ClaimableInterest, ProviderError> {
        let args = [
            StackValue::int(yt_amount),
            StackValue::int(last_collected_index),
            StackValue::int(acquired_amount),
        ];
        let mut r = call(self.reader, &self.address, "get_claimable_interest", &args).await?;
        Ok(ClaimableInterest {
            interest: r.read_u128()?,
            protocol_fee: r.read_u128()?,
        })
    }

    pub async fn redeem_sy_out_before_maturity(
        &self,
        yt_amount: u128,
        pt_amount: u128,
    ) -> Result<RedeemOut, ProviderError> {
        let args = [StackValue::int(yt_amount), StackValue::int(pt_amount)];
        let mut r = call(
            self.reader,
            &self.address,
            "get_redeem_sy_out_before_maturity",
            &args,
        )
        .await?;
        Ok(RedeemOut {
            sy: r.read_u128()?,
            max_sy_available: r.read_u128()?,
        })
    }

    pub async fn redeem_sy_out_after_maturity(&self, pt_amount: u128) -> Result<RedeemOut, ProviderError> {
        let mut r = call(
            self.reader,
            &self.address,
            "get_redeem_sy_out_after_maturity",
            &[StackValue::int(pt_amount)],
        )
        .await?;
        Ok(RedeemOut {
            sy: r.read_u128()?,
            max_sy_available: r.read_u128()?,
        })
    }

    /// Maturity as unix seconds.
    pub async fn maturity(&self) -> Result<DateTime<Utc>, ProviderError> {
        let method = "get_maturity";
        let secs = call(self.reader, &self.address, method, &[])
            .await?
            .read_u64()?;
        i64::try_from(secs)
            .ok()
            .and_then(|s| DateTime::from_timestamp(s, 0))
            .ok_or_else(|| ProviderError::decode(method, format!("timestamp {secs} out of range")))
    }
}

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
pub struct Pool<'a> {
    reader: &'a dyn ChainReader,
    address: Address,
}

impl<'a> Pool<'a> {
    pub fn new(reader: &'a dyn ChainReader, address: Address) -> Self {
        Self { reader, address }
    }

    pub async fn lp_wallet_address(&self, owner: &Address) -> Result<Address, ProviderError> {
        let method = "get_wallet_address";
        let args = [address_arg(method, owner)?];
        call(self.reader, &self.address, method, &args)
            .await?
            .read_address()
    }

    pub async fn balances(&self) -> Result<PoolBalances, ProviderError> {
        let mut r = call(self.reader, &self.address, "get_pool_balances", &[]).await?;
        Ok(PoolBalances {
            lp: r.read_u128()?,
            sy: r.read_u128()?,
            pt: r.read_u128()?,
        })
    }

    /// `from` and `to` are the pool's own jetton wallets.
    pub async fn expected_swap_amount_out(
        &self,
        from: &Address,
        to: &Address,
        amount_in: u128,
    ) -> Result<u128, ProviderError> {
        let method = "get_expected_swap_amount_out";
        let args = [
            address_arg(method, from)?,
            address_arg(method, to)?,
            StackValue::int(amount_in),
        ];
        call(self.reader, &self.address, method, &args)
            .await?
            .read_u128()
    }

    pub async fn lp_out(&self, sy_amount: u128, pt_amount: u128) -> Result<u128, ProviderError> {
        let args = [StackValue::int(sy_amount), StackValue::int(pt_amount)];
        call(self.reader, &self.address, "get_lp_out", &args)
            .await?
            .read_u128()
    }

    pub async fn sy_pt_out(&self, lp_amount: u128) -> Result<LiquidityOut, ProviderError> {
        let mut r = call(
            self.reader,
            &self.address,
            "get_sy_pt_out",
            &[StackValue::int(lp_amount)],
        )
        .await?;
        Ok(LiquidityOut {
            sy: r.read_u128()?,
            pt: r.read_u128()?,
        })
    }

    pub async fn fee_estimation(&self, op: u32) -> Result<FeeEstimate, ProviderError> {
        let args = [StackValue::int(op), StackValue::int(0u64)];
        let mut r = call(self.reader, &self.address, "get_fee_estimation", &args).await?;
        Ok(FeeEstimate {
            value: r.read_u128()?,
            forward_value: r.read_u128()?,
        })
    }

    pub async fn version(&self) -> Result<u64, ProviderError> {
        call(self.reader, &self.address, "get_version", &[])
            .await?
            .read_u64()
    }

    /// Older pools omit the trailing SY minter address.
    pub async fn jetton_addresses(&self) -> Result<PoolWallets, ProviderError> {
        let mut r = call(self.reader, &self.address, "get_jetton_addresses", &[]).await?;
        let sy = r.read_address_opt()?;
        let pt = r.read_address_opt()?;
        let yt = r.read_address_opt()?;
        let yt_minter = r.read_address_opt()?;
        let sy_minter = if r.remaining() > 0 {
            r.read_address_opt()?
        } else {
            None
        };
        Ok(PoolWallets {
            sy,
            pt,
            yt,
            yt_minter,
            sy_minter,
        })
    }

    /// The tail after the treasury address depends on the pool curve:
    /// `index expected_index index_updater` or a single amplification
    /// coefficient.
    pub async fn config(&self) -> Result<PoolConfig, ProviderError> {
        let method = "get_pool_config";
        let mut r = call(self.reader, &self.address, method, &[]).await?;
        let owner = r.read_address_opt()?;
        let maintainer = r.read_address_opt()?;
        let protocol_fee = r.read_u128()?;
        let lp_fee = r.read_u128()?;
        let ref_fee = r.read_u128()?;
        let fee_divider = r.read_u128()?;
        let fee_treasury = r.read_address_opt()?;

        let curve = match r.remaining() {
            3 => PoolCurve::Indexed {
                index: r.read_u128()?,
                expected_index: r.read_u128()?,
                index_updater: r.read_address_opt()?,
            },
            1 => PoolCurve::Stable {
                amplification: r.read_u128()?,
            },
            n => {
                return Err(ProviderError::decode(
                    method,
                    format!("unexpected {n} trailing entries"),
                ))
            }
        };

        Ok(PoolConfig {
            owner,
            maintainer,
            protocol_fee,
            lp_fee,
            ref_fee,
            fee_divider,
            fee_treasury,
            curve,
        })
    }
}

// ---------------------------------------------------------------------------
// Jetton master / wallet
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
pub struct JettonMaster<'a> {
    reader: &'a dyn ChainReader,
    address: Address,
}

impl<'a> JettonMaster<'a> {
    pub fn new(reader: &'a dyn ChainReader, address: Address) -> Self {
        Self { reader, address }
    }

    pub async fn wallet_address(&self, owner: &Address) -> Result<Address, ProviderError> {
        let method = "get_wallet_address";
        let args = [address_arg(method, owner)?];
        call(self.reader, &self.address, method, &args)
            .await?
            .read_address()
    }
}

#[derive(Clone, Copy)]
pub struct JettonWallet<'a> {
    reader: &'a dyn ChainReader,
    address: Address,
}

impl<'a> JettonWallet<'a> {
    pub fn new(reader: &'a dyn ChainReader, address: Address) -> Self {
        Self { reader, address }
    }

    pub async fn wallet_data(&self) -> Result<JettonWalletData, ProviderError> {
        let mut r = call(self.reader, &self.address, "get_wallet_data", &[]).await?;
        Ok(JettonWalletData {
            balance: r.read_u128()?,
            owner: r.read_address_opt()?,
            minter: r.read_address_opt()?,
        })
    }

    /// YT wallets only.
    pub async fn last_collected_interest_index(&self) -> Result<u128, ProviderError> {
        call(
            self.reader,
            &self.address,
            "get_last_collected_interest_index",
            &[],
        )
        .await?
        .read_u128()
    }

    /// YT wallets only.
    pub async fn acquired_amount(&self) -> Result<u128, ProviderError> {
        call(self.reader, &self.address, "get_acquired_amount", &[])
            .await?
            .read_u128()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use ton_cell::CellBuilder;

    /// Returns one canned stack and records the call.
    struct Canned {
        stack: Vec<StackValue>,
        calls: Mutex<Vec<(String, Vec<StackValue>)>>,
    }

    impl Canned {
        fn new(stack: Vec<StackValue>) -> Self {
            Self {
                stack,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChainReader for Canned {
        async fn run_get_method(
            &self,
            _address: &Address,
            method: &str,
            args: &[StackValue],
        ) -> Result<Vec<StackValue>, ProviderError> {
            self.calls.lock().push((method.to_string(), args.to_vec()));
            Ok(self.stack.clone())
        }
    }

    struct Exits;

    #[async_trait]
    impl ChainReader for Exits {
        async fn run_get_method(
            &self,
            _address: &Address,
            method: &str,
            _args: &[StackValue],
        ) -> Result<Vec<StackValue>, ProviderError> {
            Err(ProviderError::ExitCode {
                method: method.to_string(),
                code: 11,
            })
        }
    }

    fn a(byte: u8) -> Address {
        Address::new(0, [byte; 32])
    }

    fn slice(byte: u8) -> StackValue {
        StackValue::address(&a(byte)).unwrap()
    }

    #[tokio::test]
    async fn gas_estimation_passes_opcode() {
        let reader = Canned::new(vec![
            StackValue::int(200_000_000u64),
            StackValue::int(150_000_000u64),
        ]);
        let fee = SyMinter::new(&reader, a(1))
            .gas_estimation(0x044eb55a)
            .await
            .unwrap();
        assert_eq!(fee.value, 200_000_000);
        assert_eq!(fee.forward_value, 150_000_000);

        let calls = reader.calls.lock();
        assert_eq!(calls[0].0, "get_gas_estimation");
        assert_eq!(calls[0].1, vec![StackValue::int(0x044eb55au32)]);
    }

    #[tokio::test]
    async fn pool_fee_estimation_sends_trailing_zero() {
        let reader = Canned::new(vec![StackValue::int(1u64), StackValue::int(2u64)]);
        Pool::new(&reader, a(1)).fee_estimation(0x3ebe5431).await.unwrap();
        let calls = reader.calls.lock();
        assert_eq!(calls[0].0, "get_fee_estimation");
        assert_eq!(calls[0].1.len(), 2);
        assert_eq!(calls[0].1[1], StackValue::int(0u64));
    }

    #[tokio::test]
    async fn missing_index_getter_means_zero() {
        assert_eq!(SyMinter::new(&Exits, a(1)).index().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn yt_jetton_addresses_unpacks_cell() {
        let mut b = CellBuilder::new();
        b.store_address(&a(1))
            .unwrap()
            .store_address(&a(2))
            .unwrap()
            .store_address(&a(3))
            .unwrap();
        let reader = Canned::new(vec![StackValue::Cell(b.build())]);

        let addrs = YtMinter::new(&reader, a(9)).jetton_addresses().await.unwrap();
        assert_eq!(addrs.sy_wallet, Some(a(1)));
        assert_eq!(addrs.pt_minter, a(2));
        assert_eq!(addrs.pt_wallet, Some(a(3)));
    }

    #[tokio::test]
    async fn wallet_address_sends_owner_slice() {
        let reader = Canned::new(vec![slice(7)]);
        let wallet = JettonMaster::new(&reader, a(1))
            .wallet_address(&a(5))
            .await
            .unwrap();
        assert_eq!(wallet, a(7));
        assert_eq!(reader.calls.lock()[0].1, vec![slice(5)]);
    }

    #[tokio::test]
    async fn pool_jetton_addresses_with_and_without_sy_minter() {
        let four = Canned::new(vec![slice(1), slice(2), slice(3), slice(4)]);
        let w = Pool::new(&four, a(9)).jetton_addresses().await.unwrap();
        assert_eq!(w.yt, Some(a(3)));
        assert_eq!(w.yt_minter, Some(a(4)));
        assert_eq!(w.sy_minter, None);

        let five = Canned::new(vec![slice(1), slice(2), slice(3), slice(4), slice(5)]);
        let w = Pool::new(&five, a(9)).jetton_addresses().await.unwrap();
        assert_eq!(w.sy_minter, Some(a(5)));
    }

    #[tokio::test]
    async fn pool_config_indexed_and_stable() {
        let head = || {
            vec![
                slice(1),
                slice(2),
                StackValue::int(10u64),
                StackValue::int(20u64),
                StackValue::int(30u64),
                StackValue::int(10_000u64),
                slice(3),
            ]
        };

        let mut indexed = head();
        indexed.extend([
            StackValue::int(1_050_000u64),
            StackValue::int(1_060_000u64),
            slice(4),
        ]);
        let cfg = Pool::new(&Canned::new(indexed), a(9)).config().await.unwrap();
        assert_eq!(cfg.index(), Some(1_050_000));
        assert_eq!(cfg.fee_divider, 10_000);

        let mut stable = head();
        stable.push(StackValue::int(200u64));
        let cfg = Pool::new(&Canned::new(stable), a(9)).config().await.unwrap();
        assert_eq!(cfg.curve, PoolCurve::Stable { amplification: 200 });

        let short = Canned::new(head());
        assert!(Pool::new(&short, a(9)).config().await.is_err());
    }

    #[tokio::test]
    async fn maturity_is_unix_seconds() {
        let reader = Canned::new(vec![StackValue::int(1_767_225_600u64)]);
        let maturity = YtMinter::new(&reader, a(1)).maturity().await.unwrap();
        assert_eq!(maturity.to_rfc3339(), "2026-01-01T00:00:00+00:00");
    }
}
