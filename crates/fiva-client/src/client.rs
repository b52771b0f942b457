//! [`FivaClient`]: the public entry point.
//!
//! Every transaction method follows the same order: resolve the addresses
//! it needs, read a fresh fee quote, build the payload, hand one request to
//! the wallet. Reads are retried; the final submission is not.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use fiva_messages::{opcodes, JettonBurn, JettonTransfer, Operation};
use ton_cell::{Address, Cell};
use tracing::{debug, info, warn};

use crate::analytics;
use crate::config::ClientConfig;
use crate::contracts::{JettonWallet, Pool, SyMinter, YtMinter};
use crate::error::{FivaError, ProviderError, SubmissionError};
use crate::fees::FeeEstimator;
use crate::provider::ChainReader;
use crate::resolver::AddressResolver;
use crate::retry::RetryPolicy;
use crate::transaction::TransactionBuilder;
use crate::types::{
    AddressKind, Asset, ClaimReceipt, ClaimableInterest, ContractAddresses, FeeEstimate,
    LiquidityOut, MintOut, PoolBalances, PoolConfig, PoolWallets, RedeemOut, ResolutionState,
    SupplyInfo,
};
use crate::units::UnitConverter;
use crate::wallet::WalletSender;

/// Per-call overrides for transaction methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxOptions {
    /// Defaults to the current unix time in milliseconds.
    pub query_id: Option<u64>,
    /// Minimum amount out (or LP out for liquidity); zero disables the check.
    pub min_out: u128,
    /// Receiver of the proceeds; defaults to the connected account.
    pub recipient: Option<Address>,
    /// Overrides the configured request lifetime.
    pub ttl_secs: Option<u64>,
}

impl TxOptions {
    pub fn with_query_id(mut self, query_id: u64) -> Self {
        self.query_id = Some(query_id);
        self
    }

    pub fn with_min_out(mut self, min_out: u128) -> Self {
        self.min_out = min_out;
        self
    }

    pub fn with_recipient(mut self, recipient: Address) -> Self {
        self.recipient = Some(recipient);
        self
    }

    pub fn with_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = Some(ttl_secs);
        self
    }
}

/// Options with every default filled in.
#[derive(Debug, Clone, Copy)]
struct Prepared {
    query_id: u64,
    recipient: Address,
    min_out: u128,
    valid_until: i64,
}

fn default_query_id() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}

fn require_positive(amount: u128, what: &str) -> Result<(), FivaError> {
    if amount == 0 {
        return Err(FivaError::InvalidAmount(format!("{what} amount is zero")));
    }
    Ok(())
}

/// Outer jetton transfer carrying a protocol operation as forward payload.
fn envelope(
    p: &Prepared,
    amount: u128,
    destination: Address,
    response: Address,
    fee: FeeEstimate,
    custom_payload: Option<Cell>,
    forward: &Operation,
) -> Result<JettonTransfer, FivaError> {
    Ok(JettonTransfer {
        query_id: p.query_id,
        amount,
        destination,
        response_destination: response,
        custom_payload,
        forward_ton_amount: fee.forward_value,
        forward_payload: Some(forward.build()?),
    })
}

pub struct FivaClient {
    config: ClientConfig,
    reader: Arc<dyn ChainReader>,
    wallet: Arc<dyn WalletSender>,
    retry: RetryPolicy,
    account: Address,
    resolver: AddressResolver,
    fees: FeeEstimator,
}

impl FivaClient {
    /// Fails with [`FivaError::NotConnected`] unless the wallet is connected
    /// and reports an account.
    pub fn new(
        config: ClientConfig,
        reader: Arc<dyn ChainReader>,
        wallet: Arc<dyn WalletSender>,
    ) -> Result<Self, FivaError> {
        let retry = RetryPolicy::new(config.retry);
        Self::with_retry_policy(config, reader, wallet, retry)
    }

    /// Like [`FivaClient::new`] with a caller-supplied retry policy, for
    /// example one with a custom observer.
    pub fn with_retry_policy(
        config: ClientConfig,
        reader: Arc<dyn ChainReader>,
        wallet: Arc<dyn WalletSender>,
        retry: RetryPolicy,
    ) -> Result<Self, FivaError> {
        config.validate()?;
        if !wallet.is_connected() {
            return Err(FivaError::NotConnected);
        }
        let account = wallet.account().ok_or(FivaError::NotConnected)?;

        let resolver =
            AddressResolver::new(reader.clone(), retry.clone(), config.sy_minter, account);
        let fees = FeeEstimator::new(reader.clone(), retry.clone());
        debug!("client for SY minter {} and account {}", config.sy_minter, account);

        Ok(Self {
            config,
            reader,
            wallet,
            retry,
            account,
            resolver,
            fees,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn account(&self) -> Address {
        self.account
    }

    /// Addresses resolved so far.
    pub fn addresses(&self) -> ContractAddresses {
        self.resolver.snapshot()
    }

    pub fn resolution_state(&self, kind: AddressKind) -> ResolutionState {
        self.resolver.state(kind)
    }

    pub async fn resolve(&self, kind: AddressKind) -> Result<Address, FivaError> {
        self.resolver.resolve(kind).await
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn read<T, F, Fut>(&self, label: &str, op: F) -> Result<T, FivaError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        Ok(self.retry.run(label, op).await?)
    }

    fn sy(&self) -> SyMinter<'_> {
        SyMinter::new(self.reader.as_ref(), self.config.sy_minter)
    }

    async fn yt(&self) -> Result<YtMinter<'_>, FivaError> {
        Ok(YtMinter::new(
            self.reader.as_ref(),
            self.resolver.yt_minter().await?,
        ))
    }

    async fn pool(&self) -> Result<Pool<'_>, FivaError> {
        Ok(Pool::new(self.reader.as_ref(), self.resolver.pool().await?))
    }

    fn prepare(&self, opts: &TxOptions) -> Prepared {
        let ttl = opts.ttl_secs.unwrap_or(self.config.ttl_secs);
        let ttl = i64::try_from(ttl).unwrap_or(i64::MAX);
        Prepared {
            query_id: opts.query_id.unwrap_or_else(default_query_id),
            recipient: opts.recipient.unwrap_or(self.account),
            min_out: opts.min_out,
            valid_until: Utc::now().timestamp().saturating_add(ttl),
        }
    }

    async fn submit(&self, action: &str, tx: TransactionBuilder) -> Result<String, FivaError> {
        if !self.wallet.is_connected() {
            return Err(SubmissionError::NotConnected.into());
        }
        let count = tx.messages().len();
        let valid_until = tx.valid_until();
        let request = tx.build(self.config.bounceable, self.config.testnet)?;

        info!(
            "{}: submitting {} message(s), valid until {}",
            action, count, valid_until
        );
        match self.wallet.send_transaction(request).await {
            Ok(result) => Ok(result),
            Err(e) => {
                warn!("{} submission failed: {}", action, e);
                Err(e.into())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Read-only getters
    // -----------------------------------------------------------------------

    /// SY minter fee quote for `op`.
    pub async fn get_fees_estimation(&self, op: u32) -> Result<FeeEstimate, FivaError> {
        self.fees.estimate_fee(self.config.sy_minter, op).await
    }

    pub async fn get_pool_balances(&self) -> Result<PoolBalances, FivaError> {
        let pool = self.pool().await?;
        self.read("get_pool_balances", move || async move { pool.balances().await })
            .await
    }

    pub async fn get_expected_lp_out(
        &self,
        sy_amount: u128,
        pt_amount: u128,
    ) -> Result<u128, FivaError> {
        let pool = self.pool().await?;
        self.read("get_lp_out", move || async move {
            pool.lp_out(sy_amount, pt_amount).await
        })
        .await
    }

    pub async fn get_sy_pt_out(&self, lp_amount: u128) -> Result<LiquidityOut, FivaError> {
        let pool = self.pool().await?;
        self.read("get_sy_pt_out", move || async move {
            pool.sy_pt_out(lp_amount).await
        })
        .await
    }

    pub async fn get_max_total_supply(&self) -> Result<SupplyInfo, FivaError> {
        let sy = self.sy();
        self.read("get_max_total_supply", move || async move {
            sy.max_total_supply().await
        })
        .await
    }

    /// SY minter index; 0 for a non-rebasing underlying.
    pub async fn get_index(&self) -> Result<u128, FivaError> {
        let sy = self.sy();
        self.read("get_index", move || async move { sy.index().await })
            .await
    }

    pub async fn get_pool_config(&self) -> Result<PoolConfig, FivaError> {
        let pool = self.pool().await?;
        self.read("get_pool_config", move || async move { pool.config().await })
            .await
    }

    pub async fn get_pool_version(&self) -> Result<u64, FivaError> {
        let pool = self.pool().await?;
        self.read("get_version", move || async move { pool.version().await })
            .await
    }

    pub async fn get_underlying_precision(&self) -> Result<u32, FivaError> {
        let sy = self.sy();
        self.read("get_underlying_precision", move || async move {
            sy.underlying_precision().await
        })
        .await
    }

    /// Converter for the current index snapshot.
    pub async fn unit_converter(&self) -> Result<UnitConverter, FivaError> {
        let precision = self.get_underlying_precision().await?;
        let index = self.get_index().await?;
        UnitConverter::new(precision, index)
    }

    pub async fn get_mint_pt_yt_out(&self, sy_amount: u128) -> Result<MintOut, FivaError> {
        let yt = self.yt().await?;
        self.read("get_mint_yt_pt_out", move || async move {
            yt.mint_pt_yt_out(sy_amount).await
        })
        .await
    }

    /// Interest the connected account could claim now.
    pub async fn get_claimable_interest(&self) -> Result<ClaimableInterest, FivaError> {
        let wallet = JettonWallet::new(self.reader.as_ref(), self.resolver.user_yt_wallet().await?);
        let yt = self.yt().await?;

        let balance = self
            .read("get_wallet_data", move || async move {
                wallet.wallet_data().await
            })
            .await?
            .balance;
        let last_index = self
            .read("get_last_collected_interest_index", move || async move {
                wallet.last_collected_interest_index().await
            })
            .await?;
        let acquired = self
            .read("get_acquired_amount", move || async move {
                wallet.acquired_amount().await
            })
            .await?;

        self.read("get_claimable_interest", move || async move {
            yt.claimable_interest(balance, last_index, acquired)
                .await
        })
        .await
    }

    pub async fn get_redeem_sy_out_before_maturity(
        &self,
        yt_amount: u128,
        pt_amount: u128,
    ) -> Result<RedeemOut, FivaError> {
        let yt = self.yt().await?;
        self.read("get_redeem_sy_out_before_maturity", move || async move {
            yt.redeem_sy_out_before_maturity(yt_amount, pt_amount).await
        })
        .await
    }

    pub async fn get_redeem_sy_out_after_maturity(
        &self,
        pt_amount: u128,
    ) -> Result<RedeemOut, FivaError> {
        let yt = self.yt().await?;
        self.read("get_redeem_sy_out_after_maturity", move || async move {
            yt.redeem_sy_out_after_maturity(pt_amount).await
        })
        .await
    }

    pub async fn get_maturity_date(&self) -> Result<DateTime<Utc>, FivaError> {
        let yt = self.yt().await?;
        self.read("get_maturity", move || async move { yt.maturity().await })
            .await
    }

    pub async fn get_pool_wallet_addresses(&self) -> Result<PoolWallets, FivaError> {
        self.resolver.pool_wallets().await
    }

    /// Quote a swap. Underlying amounts are converted to and from SY at the
    /// current index; PT and YT amounts pass through unchanged.
    pub async fn get_expected_swap_amount_out(
        &self,
        from: Asset,
        to: Asset,
        amount_in: u128,
    ) -> Result<u128, FivaError> {
        Asset::validate_swap(from, to)?;

        let wallets = self.resolver.pool_wallets().await?;
        let from_wallet = wallets.for_asset(from)?;
        let to_wallet = wallets.for_asset(to)?;
        let pool = self.pool().await?;

        let converter = if from == Asset::Underlying || to == Asset::Underlying {
            Some(self.unit_converter().await?)
        } else {
            None
        };
        let sy_in = match (from, converter) {
            (Asset::Underlying, Some(c)) => c.underlying_to_sy(amount_in)?,
            _ => amount_in,
        };

        let out = self
            .read("get_expected_swap_amount_out", move || async move {
                pool.expected_swap_amount_out(&from_wallet, &to_wallet, sy_in)
                    .await
            })
            .await?;

        match (to, converter) {
            (Asset::Underlying, Some(c)) => c.sy_to_underlying(out),
            _ => Ok(out),
        }
    }

    /// PT received per underlying unit when swapping `underlying_in` into
    /// PT. The pool is quoted in SY; the ratio is taken against the
    /// underlying amount so the index cancels out.
    async fn pt_per_underlying(
        &self,
        converter: UnitConverter,
        underlying_in: u128,
    ) -> Result<f64, FivaError> {
        let sy_in = converter.underlying_to_sy(underlying_in)?;
        let wallets = self.resolver.pool_wallets().await?;
        let sy_wallet = wallets.for_asset(Asset::Underlying)?;
        let pt_wallet = wallets.for_asset(Asset::Pt)?;
        let pool = self.pool().await?;
        let pt_out = self
            .read("get_expected_swap_amount_out", move || async move {
                pool.expected_swap_amount_out(&sy_wallet, &pt_wallet, sy_in)
                    .await
            })
            .await?;
        Ok(analytics::pt_per_underlying(
            pt_out,
            underlying_in,
            converter.underlying_decimals(),
        ))
    }

    /// Annualised fixed APY in percent, from a one-unit PT quote. Zero once
    /// the market has matured.
    pub async fn get_fixed_apy(&self) -> Result<f64, FivaError> {
        let days = analytics::days_until(self.get_maturity_date().await?, Utc::now());
        if days <= 0.0 {
            return Ok(0.0);
        }
        let converter = self.unit_converter().await?;
        let one_unit = 10u128.pow(converter.underlying_decimals());
        let ratio = self.pt_per_underlying(converter, one_unit).await?;
        Ok(analytics::fixed_apy(ratio, days))
    }

    /// Percent gained at maturity by swapping `underlying_amount` into PT.
    pub async fn get_gain(&self, underlying_amount: u128) -> Result<f64, FivaError> {
        require_positive(underlying_amount, "underlying")?;
        let converter = self.unit_converter().await?;
        let ratio = self.pt_per_underlying(converter, underlying_amount).await?;
        Ok(analytics::gain_percent(ratio))
    }

    // -----------------------------------------------------------------------
    // Swaps
    // -----------------------------------------------------------------------

    async fn wrap_and_swap(
        &self,
        action: &str,
        amount: u128,
        opts: TxOptions,
        op: u32,
        forward: fn(Address, u128) -> Operation,
    ) -> Result<String, FivaError> {
        require_positive(amount, "swap")?;
        let p = self.prepare(&opts);
        let wallet = self.resolver.user_underlying_wallet().await?;
        let fee = self.fees.estimate_fee(self.config.sy_minter, op).await?;

        let transfer = envelope(
            &p,
            amount,
            self.config.sy_minter,
            self.account,
            fee,
            None,
            &forward(p.recipient, p.min_out),
        )?;
        let mut tx = TransactionBuilder::new(p.valid_until);
        tx.transfer(wallet, fee, transfer)?;
        self.submit(action, tx).await
    }

    pub async fn swap_underlying_for_pt(
        &self,
        amount: u128,
        opts: TxOptions,
    ) -> Result<String, FivaError> {
        self.wrap_and_swap(
            "swap_underlying_for_pt",
            amount,
            opts,
            opcodes::sy::WRAP_AND_SWAP_SY_FOR_PT,
            |receiver, min_out| Operation::WrapAndSwapToPt { receiver, min_out },
        )
        .await
    }

    pub async fn swap_underlying_for_yt(
        &self,
        amount: u128,
        opts: TxOptions,
    ) -> Result<String, FivaError> {
        self.wrap_and_swap(
            "swap_underlying_for_yt",
            amount,
            opts,
            opcodes::sy::WRAP_AND_SWAP_SY_FOR_YT,
            |receiver, min_out| Operation::WrapAndSwapToYt { receiver, min_out },
        )
        .await
    }

    /// `opts.min_out` is in underlying units; the pool checks it in SY.
    async fn swap_to_underlying(
        &self,
        action: &str,
        from: Asset,
        amount: u128,
        opts: TxOptions,
    ) -> Result<String, FivaError> {
        require_positive(amount, "swap")?;
        let p = self.prepare(&opts);
        let pool = self.resolver.pool().await?;
        let wallet = match from {
            Asset::Pt => self.resolver.user_pt_wallet().await?,
            _ => self.resolver.user_yt_wallet().await?,
        };
        let min_sy_out = if p.min_out > 0 {
            self.unit_converter().await?.underlying_to_sy(p.min_out)?
        } else {
            0
        };

        let (op, forward) = match from {
            Asset::Pt => (
                opcodes::sy::SWAP_PT_FOR_SY_AND_UNWRAP,
                Operation::SwapPtToUnderlying {
                    query_id: p.query_id,
                    receiver: p.recipient,
                    min_out: min_sy_out,
                },
            ),
            _ => (
                opcodes::sy::SWAP_YT_FOR_SY_AND_UNWRAP,
                Operation::SwapYtToUnderlying {
                    query_id: p.query_id,
                    receiver: p.recipient,
                    min_out: min_sy_out,
                },
            ),
        };
        let fee = self.fees.estimate_fee(self.config.sy_minter, op).await?;

        let transfer = envelope(&p, amount, pool, self.account, fee, None, &forward)?;
        let mut tx = TransactionBuilder::new(p.valid_until);
        tx.transfer(wallet, fee, transfer)?;
        self.submit(action, tx).await
    }

    pub async fn swap_pt_for_underlying(
        &self,
        amount: u128,
        opts: TxOptions,
    ) -> Result<String, FivaError> {
        self.swap_to_underlying("swap_pt_for_underlying", Asset::Pt, amount, opts)
            .await
    }

    pub async fn swap_yt_for_underlying(
        &self,
        amount: u128,
        opts: TxOptions,
    ) -> Result<String, FivaError> {
        self.swap_to_underlying("swap_yt_for_underlying", Asset::Yt, amount, opts)
            .await
    }

    // -----------------------------------------------------------------------
    // Mint and redeem
    // -----------------------------------------------------------------------

    pub async fn mint_pt_and_yt(&self, amount: u128, opts: TxOptions) -> Result<String, FivaError> {
        require_positive(amount, "mint")?;
        let p = self.prepare(&opts);
        let wallet = self.resolver.user_underlying_wallet().await?;
        let fee = self
            .fees
            .estimate_fee(self.config.sy_minter, opcodes::sy::WRAP_AND_MINT_PT_YT)
            .await?;

        let transfer = envelope(
            &p,
            amount,
            self.config.sy_minter,
            self.account,
            fee,
            Some(Cell::empty()),
            &Operation::WrapAndMintPtYt {
                receiver: p.recipient,
            },
        )?;
        let mut tx = TransactionBuilder::new(p.valid_until);
        tx.transfer(wallet, fee, transfer)?;
        self.submit("mint_pt_and_yt", tx).await
    }

    /// Redeem PT or YT held in `from` before maturity. Excess is returned to
    /// the recipient.
    async fn redeem_one(
        &self,
        action: &str,
        from: Asset,
        amount: u128,
        opts: TxOptions,
        after_maturity: bool,
    ) -> Result<String, FivaError> {
        require_positive(amount, "redeem")?;
        let p = self.prepare(&opts);
        let yt_minter = self.resolver.yt_minter().await?;
        let wallet = match from {
            Asset::Yt => self.resolver.user_yt_wallet().await?,
            _ => self.resolver.user_pt_wallet().await?,
        };

        let (op, forward) = if after_maturity {
            (
                opcodes::sy::REDEEM_AFTER_MATURITY_AND_UNWRAP,
                Operation::RedeemAfterMaturity {
                    query_id: p.query_id,
                    response: p.recipient,
                },
            )
        } else {
            (
                opcodes::sy::REDEEM_AND_UNWRAP,
                Operation::Redeem {
                    query_id: p.query_id,
                    response: p.recipient,
                },
            )
        };
        let fee = self.fees.estimate_fee(self.config.sy_minter, op).await?;

        let transfer = envelope(&p, amount, yt_minter, p.recipient, fee, None, &forward)?;
        let mut tx = TransactionBuilder::new(p.valid_until);
        tx.transfer(wallet, fee, transfer)?;
        self.submit(action, tx).await
    }

    pub async fn redeem_pt(&self, pt_amount: u128, opts: TxOptions) -> Result<String, FivaError> {
        self.redeem_one("redeem_pt", Asset::Pt, pt_amount, opts, false)
            .await
    }

    pub async fn redeem_yt(&self, yt_amount: u128, opts: TxOptions) -> Result<String, FivaError> {
        self.redeem_one("redeem_yt", Asset::Yt, yt_amount, opts, false)
            .await
    }

    pub async fn redeem_after_maturity(
        &self,
        pt_amount: u128,
        opts: TxOptions,
    ) -> Result<String, FivaError> {
        self.redeem_one("redeem_after_maturity", Asset::Pt, pt_amount, opts, true)
            .await
    }

    /// Redeem PT and YT in one request: two independent transfers to the YT
    /// minter. Not atomic on chain.
    pub async fn redeem_batch(
        &self,
        pt_amount: u128,
        yt_amount: u128,
        opts: TxOptions,
    ) -> Result<String, FivaError> {
        require_positive(pt_amount, "PT")?;
        require_positive(yt_amount, "YT")?;
        let p = self.prepare(&opts);
        let yt_minter = self.resolver.yt_minter().await?;
        let pt_wallet = self.resolver.user_pt_wallet().await?;
        let yt_wallet = self.resolver.user_yt_wallet().await?;
        let fee = self
            .fees
            .estimate_fee(self.config.sy_minter, opcodes::sy::REDEEM_AND_UNWRAP)
            .await?;

        let forward = Operation::Redeem {
            query_id: p.query_id,
            response: p.recipient,
        };
        let mut tx = TransactionBuilder::new(p.valid_until);
        tx.transfer(
            pt_wallet,
            fee,
            envelope(&p, pt_amount, yt_minter, self.account, fee, None, &forward)?,
        )?
        .transfer(
            yt_wallet,
            fee,
            envelope(&p, yt_amount, yt_minter, self.account, fee, None, &forward)?,
        )?;
        self.submit("redeem_batch", tx).await
    }

    // -----------------------------------------------------------------------
    // Liquidity
    // -----------------------------------------------------------------------

    /// `opts.min_out` is the minimum LP out.
    pub async fn add_asset_liquidity(
        &self,
        amount: u128,
        opts: TxOptions,
    ) -> Result<String, FivaError> {
        require_positive(amount, "underlying")?;
        let p = self.prepare(&opts);
        let wallet = self.resolver.user_underlying_wallet().await?;
        let fee = self
            .fees
            .estimate_fee(self.config.sy_minter, opcodes::sy::WRAP_AND_ADD_LIQUIDITY)
            .await?;

        let transfer = envelope(
            &p,
            amount,
            self.config.sy_minter,
            self.account,
            fee,
            None,
            &Operation::WrapAndAddLiquidity {
                receiver: p.recipient,
                min_lp_out: p.min_out,
            },
        )?;
        let mut tx = TransactionBuilder::new(p.valid_until);
        tx.transfer(wallet, fee, transfer)?;
        self.submit("add_asset_liquidity", tx).await
    }

    /// `opts.min_out` is the minimum LP out.
    pub async fn add_pt_liquidity(
        &self,
        pt_amount: u128,
        opts: TxOptions,
    ) -> Result<String, FivaError> {
        require_positive(pt_amount, "PT")?;
        let p = self.prepare(&opts);
        let pool = self.resolver.pool().await?;
        let wallet = self.resolver.user_pt_wallet().await?;
        let fee = self.fees.add_liquidity_fee(pool).await?;

        let transfer = envelope(
            &p,
            pt_amount,
            pool,
            self.account,
            fee,
            None,
            &Operation::AddLiquidity {
                query_id: p.query_id,
                receiver: p.recipient,
                min_lp_out: p.min_out,
            },
        )?;
        let mut tx = TransactionBuilder::new(p.valid_until);
        tx.transfer(wallet, fee, transfer)?;
        self.submit("add_pt_liquidity", tx).await
    }

    /// Add underlying and PT liquidity in one request. The two transfers
    /// are independent on chain; `opts.min_out` applies to each.
    pub async fn add_liquidity_batch(
        &self,
        underlying_amount: u128,
        pt_amount: u128,
        opts: TxOptions,
    ) -> Result<String, FivaError> {
        require_positive(underlying_amount, "underlying")?;
        require_positive(pt_amount, "PT")?;
        let p = self.prepare(&opts);
        let underlying_wallet = self.resolver.user_underlying_wallet().await?;
        let pt_wallet = self.resolver.user_pt_wallet().await?;
        let pool = self.resolver.pool().await?;

        let asset_fee = self
            .fees
            .estimate_fee(self.config.sy_minter, opcodes::sy::WRAP_AND_ADD_LIQUIDITY)
            .await?;
        let pt_fee = self.fees.add_liquidity_fee(pool).await?;

        let mut tx = TransactionBuilder::new(p.valid_until);
        tx.transfer(
            underlying_wallet,
            asset_fee,
            envelope(
                &p,
                underlying_amount,
                self.config.sy_minter,
                self.account,
                asset_fee,
                None,
                &Operation::WrapAndAddLiquidity {
                    receiver: p.recipient,
                    min_lp_out: p.min_out,
                },
            )?,
        )?
        .transfer(
            pt_wallet,
            pt_fee,
            envelope(
                &p,
                pt_amount,
                pool,
                self.account,
                pt_fee,
                None,
                &Operation::AddLiquidity {
                    query_id: p.query_id,
                    receiver: p.recipient,
                    min_lp_out: p.min_out,
                },
            )?,
        )?;
        self.submit("add_liquidity_batch", tx).await
    }

    /// Burn LP for SY and PT, unwrapped to the connected account.
    pub async fn redeem_liquidity(
        &self,
        lp_amount: u128,
        opts: TxOptions,
    ) -> Result<String, FivaError> {
        require_positive(lp_amount, "LP")?;
        let p = self.prepare(&opts);
        let lp_wallet = self.resolver.user_lp_wallet().await?;
        let fee = self
            .fees
            .estimate_fee(self.config.sy_minter, opcodes::sy::REDEEM_AND_UNWRAP)
            .await?;

        let mut tx = TransactionBuilder::new(p.valid_until);
        tx.burn(
            lp_wallet,
            fee,
            JettonBurn {
                query_id: p.query_id,
                amount: lp_amount,
                response_destination: self.account,
                custom_payload: Some(Operation::RedeemLp.build()?),
            },
        )?;
        self.submit("redeem_liquidity", tx).await
    }

    // -----------------------------------------------------------------------
    // Interest
    // -----------------------------------------------------------------------

    /// Claim accrued YT interest, unwrapped to underlying for the recipient.
    ///
    /// The claimable amount is read first and returned for display only.
    pub async fn claim_interest(&self, opts: TxOptions) -> Result<ClaimReceipt, FivaError> {
        let p = self.prepare(&opts);
        let yt_wallet = self.resolver.user_yt_wallet().await?;
        let estimated = self.get_claimable_interest().await?;
        info!(
            "claim_interest: {} claimable, {} protocol fee",
            estimated.interest, estimated.protocol_fee
        );
        let fee = self
            .fees
            .estimate_fee(self.config.sy_minter, opcodes::sy::CLAIM_INTEREST_AND_UNWRAP)
            .await?;

        let mut tx = TransactionBuilder::new(p.valid_until);
        tx.direct(
            yt_wallet,
            fee.value,
            &Operation::ClaimInterestAndUnwrap {
                query_id: p.query_id,
                recipient: p.recipient,
            },
        )?;
        let result = self.submit("claim_interest", tx).await?;
        Ok(ClaimReceipt { estimated, result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_builder() {
        let r = Address::new(0, [9; 32]);
        let opts = TxOptions::default()
            .with_query_id(42)
            .with_min_out(1_000)
            .with_recipient(r)
            .with_ttl_secs(60);
        assert_eq!(opts.query_id, Some(42));
        assert_eq!(opts.min_out, 1_000);
        assert_eq!(opts.recipient, Some(r));
        assert_eq!(opts.ttl_secs, Some(60));
    }

    #[test]
    fn default_query_id_is_wall_clock_millis() {
        let before = u64::try_from(Utc::now().timestamp_millis()).unwrap();
        let id = default_query_id();
        let after = u64::try_from(Utc::now().timestamp_millis()).unwrap();
        assert!(before <= id && id <= after);
    }

    #[test]
    fn zero_amount_is_rejected() {
        let err = require_positive(0, "swap").unwrap_err();
        assert_eq!(err.to_string(), "invalid amount: swap amount is zero");
        assert!(require_positive(1, "swap").is_ok());
    }

    #[test]
    fn envelope_uses_forward_fee_and_payload() {
        let p = Prepared {
            query_id: 5,
            recipient: Address::new(0, [1; 32]),
            min_out: 0,
            valid_until: 0,
        };
        let fee = FeeEstimate {
            value: 10,
            forward_value: 7,
        };
        let fwd = Operation::WrapAndMintPtYt {
            receiver: p.recipient,
        };
        let t = envelope(
            &p,
            100,
            Address::new(0, [2; 32]),
            Address::new(0, [3; 32]),
            fee,
            None,
            &fwd,
        )
        .unwrap();
        assert_eq!(t.query_id, 5);
        assert_eq!(t.forward_ton_amount, 7);
        assert_eq!(t.forward_payload, Some(fwd.build().unwrap()));
    }
}
