//! Lazy, memoized resolution of the contract-address graph.
//!
//! Only the SY minter is known up front. Everything else is discovered on
//! first use, one retry-wrapped get-method per edge:
//!
//! ```text
//! SY minter ─┬─ get_yt_minter_address ──> YT minter ── get_jetton_addresses ──> PT minter
//!            ├─ get_pool_address ───────> pool ─────── get_jetton_addresses ──> pool wallets
//!            └─ get_underlying_address ─> SY's underlying wallet ── get_wallet_data ──> underlying minter
//!
//! user wallets: <minter or pool>.get_wallet_address(account)
//! ```
//!
//! Each slot is written at most once. Concurrent first requests for the same
//! slot share a single in-flight resolution; a failed resolution leaves the
//! slot empty so the next call starts over.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;
use ton_cell::Address;
use tracing::debug;

use crate::contracts::{JettonMaster, JettonWallet, Pool, SyMinter, YtMinter};
use crate::error::{FivaError, ProviderError};
use crate::provider::ChainReader;
use crate::retry::RetryPolicy;
use crate::types::{AddressKind, ContractAddresses, PoolWallets, ResolutionState};

/// One write-once slot with an observable state.
struct Slot<T> {
    state: Mutex<ResolutionState>,
    value: OnceCell<T>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            state: Mutex::new(ResolutionState::Unresolved),
            value: OnceCell::new(),
        }
    }
}

/// Marks a slot `Resolving` for the lifetime of one attempt. An attempt
/// dropped before finishing puts the slot back to `Unresolved`.
struct InFlight<'a> {
    state: &'a Mutex<ResolutionState>,
    finished: bool,
}

impl<'a> InFlight<'a> {
    fn start(state: &'a Mutex<ResolutionState>) -> Self {
        *state.lock() = ResolutionState::Resolving;
        Self {
            state,
            finished: false,
        }
    }

    fn finish(&mut self, outcome: ResolutionState) {
        *self.state.lock() = outcome;
        self.finished = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            *self.state.lock() = ResolutionState::Unresolved;
        }
    }
}

impl<T: Clone> Slot<T> {
    fn state(&self) -> ResolutionState {
        *self.state.lock()
    }

    fn get(&self) -> Option<T> {
        self.value.get().cloned()
    }

    async fn get_or_resolve<F, Fut>(&self, kind: AddressKind, resolve: F) -> Result<T, FivaError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FivaError>>,
    {
        let value = self
            .value
            .get_or_try_init(|| async {
                let mut guard = InFlight::start(&self.state);
                debug!("resolving {}", kind.display_name());
                match resolve().await {
                    Ok(v) => {
                        guard.finish(ResolutionState::Resolved);
                        Ok(v)
                    }
                    Err(e) => {
                        debug!("resolving {} failed: {}", kind.display_name(), e);
                        guard.finish(ResolutionState::Failed);
                        Err(e)
                    }
                }
            })
            .await?;
        Ok(value.clone())
    }
}

/// Resolves and caches every address the client needs for one SY market and
/// one user account.
pub struct AddressResolver {
    reader: Arc<dyn ChainReader>,
    retry: RetryPolicy,
    sy_minter: Address,
    account: Address,

    yt_minter: Slot<Address>,
    pt_minter: Slot<Address>,
    pool: Slot<Address>,
    pool_wallets: Slot<PoolWallets>,
    underlying_minter: Slot<Address>,
    user_underlying_wallet: Slot<Address>,
    user_sy_wallet: Slot<Address>,
    user_pt_wallet: Slot<Address>,
    user_yt_wallet: Slot<Address>,
    user_lp_wallet: Slot<Address>,
}

impl AddressResolver {
    pub fn new(
        reader: Arc<dyn ChainReader>,
        retry: RetryPolicy,
        sy_minter: Address,
        account: Address,
    ) -> Self {
        Self {
            reader,
            retry,
            sy_minter,
            account,
            yt_minter: Slot::default(),
            pt_minter: Slot::default(),
            pool: Slot::default(),
            pool_wallets: Slot::default(),
            underlying_minter: Slot::default(),
            user_underlying_wallet: Slot::default(),
            user_sy_wallet: Slot::default(),
            user_pt_wallet: Slot::default(),
            user_yt_wallet: Slot::default(),
            user_lp_wallet: Slot::default(),
        }
    }

    pub fn sy_minter(&self) -> Address {
        self.sy_minter
    }

    pub fn account(&self) -> Address {
        self.account
    }

    fn reader(&self) -> &dyn ChainReader {
        self.reader.as_ref()
    }

    async fn read<T, F, Fut>(&self, label: &str, op: F) -> Result<T, FivaError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        Ok(self.retry.run(label, op).await?)
    }

    pub async fn yt_minter(&self) -> Result<Address, FivaError> {
        self.yt_minter
            .get_or_resolve(AddressKind::YtMinter, || async {
                let sy = SyMinter::new(self.reader(), self.sy_minter);
                self.read("get_yt_minter_address", move || async move {
                    sy.yt_minter_address().await
                })
                .await
            })
            .await
    }

    pub async fn pt_minter(&self) -> Result<Address, FivaError> {
        self.pt_minter
            .get_or_resolve(AddressKind::PtMinter, || async {
                let yt = YtMinter::new(self.reader(), self.yt_minter().await?);
                let addrs = self
                    .read("get_jetton_addresses", move || async move {
                        yt.jetton_addresses().await
                    })
                    .await?;
                Ok(addrs.pt_minter)
            })
            .await
    }

    pub async fn pool(&self) -> Result<Address, FivaError> {
        self.pool
            .get_or_resolve(AddressKind::Pool, || async {
                let sy = SyMinter::new(self.reader(), self.sy_minter);
                self.read("get_pool_address", move || async move {
                    sy.pool_address().await
                })
                .await
            })
            .await
    }

    /// All pool-side wallets, fetched together.
    pub async fn pool_wallets(&self) -> Result<PoolWallets, FivaError> {
        self.pool_wallets
            .get_or_resolve(AddressKind::PoolSyWallet, || async {
                let pool = Pool::new(self.reader(), self.pool().await?);
                self.read("get_jetton_addresses", move || async move {
                    pool.jetton_addresses().await
                })
                .await
            })
            .await
    }

    pub async fn underlying_minter(&self) -> Result<Address, FivaError> {
        self.underlying_minter
            .get_or_resolve(AddressKind::UnderlyingMinter, || async {
                let sy = SyMinter::new(self.reader(), self.sy_minter);
                let sy_wallet = self
                    .read("get_underlying_address", move || async move {
                        sy.underlying_wallet_address().await
                    })
                    .await?;
                let wallet = JettonWallet::new(self.reader(), sy_wallet);
                let data = self
                    .read("get_wallet_data", move || async move {
                        wallet.wallet_data().await
                    })
                    .await?;
                data.minter.ok_or_else(|| {
                    FivaError::UnresolvedAsset(AddressKind::UnderlyingMinter.display_name().into())
                })
            })
            .await
    }

    pub async fn user_underlying_wallet(&self) -> Result<Address, FivaError> {
        self.user_underlying_wallet
            .get_or_resolve(AddressKind::UserUnderlyingWallet, || async {
                let minter = JettonMaster::new(self.reader(), self.underlying_minter().await?);
                let account = self.account;
                self.read("get_wallet_address", move || async move {
                    minter.wallet_address(&account).await
                })
                .await
            })
            .await
    }

    pub async fn user_sy_wallet(&self) -> Result<Address, FivaError> {
        self.user_sy_wallet
            .get_or_resolve(AddressKind::UserSyWallet, || async {
                let sy = SyMinter::new(self.reader(), self.sy_minter);
                let account = self.account;
                self.read("get_wallet_address", move || async move {
                    sy.wallet_address(&account).await
                })
                .await
            })
            .await
    }

    pub async fn user_pt_wallet(&self) -> Result<Address, FivaError> {
        self.user_pt_wallet
            .get_or_resolve(AddressKind::UserPtWallet, || async {
                let minter = JettonMaster::new(self.reader(), self.pt_minter().await?);
                let account = self.account;
                self.read("get_wallet_address", move || async move {
                    minter.wallet_address(&account).await
                })
                .await
            })
            .await
    }

    pub async fn user_yt_wallet(&self) -> Result<Address, FivaError> {
        self.user_yt_wallet
            .get_or_resolve(AddressKind::UserYtWallet, || async {
                let yt = YtMinter::new(self.reader(), self.yt_minter().await?);
                let account = self.account;
                self.read("get_wallet_address", move || async move {
                    yt.wallet_address(&account).await
                })
                .await
            })
            .await
    }

    pub async fn user_lp_wallet(&self) -> Result<Address, FivaError> {
        self.user_lp_wallet
            .get_or_resolve(AddressKind::UserLpWallet, || async {
                let pool = Pool::new(self.reader(), self.pool().await?);
                let account = self.account;
                self.read("get_wallet_address", move || async move {
                    pool.lp_wallet_address(&account).await
                })
                .await
            })
            .await
    }

    /// Resolve any address by kind. Pool wallets reported as `addr_none`
    /// fail with [`FivaError::UnresolvedAsset`].
    pub async fn resolve(&self, kind: AddressKind) -> Result<Address, FivaError> {
        let unresolved = || FivaError::UnresolvedAsset(kind.display_name().to_string());
        match kind {
            AddressKind::YtMinter => self.yt_minter().await,
            AddressKind::PtMinter => self.pt_minter().await,
            AddressKind::Pool => self.pool().await,
            AddressKind::PoolSyWallet => self.pool_wallets().await?.sy.ok_or_else(unresolved),
            AddressKind::PoolPtWallet => self.pool_wallets().await?.pt.ok_or_else(unresolved),
            AddressKind::PoolYtWallet => self.pool_wallets().await?.yt.ok_or_else(unresolved),
            AddressKind::UnderlyingMinter => self.underlying_minter().await,
            AddressKind::UserUnderlyingWallet => self.user_underlying_wallet().await,
            AddressKind::UserSyWallet => self.user_sy_wallet().await,
            AddressKind::UserPtWallet => self.user_pt_wallet().await,
            AddressKind::UserYtWallet => self.user_yt_wallet().await,
            AddressKind::UserLpWallet => self.user_lp_wallet().await,
        }
    }

    /// Current state of the slot behind `kind`. The three pool wallets share
    /// one slot.
    pub fn state(&self, kind: AddressKind) -> ResolutionState {
        match kind {
            AddressKind::YtMinter => self.yt_minter.state(),
            AddressKind::PtMinter => self.pt_minter.state(),
            AddressKind::Pool => self.pool.state(),
            AddressKind::PoolSyWallet | AddressKind::PoolPtWallet | AddressKind::PoolYtWallet => {
                self.pool_wallets.state()
            }
            AddressKind::UnderlyingMinter => self.underlying_minter.state(),
            AddressKind::UserUnderlyingWallet => self.user_underlying_wallet.state(),
            AddressKind::UserSyWallet => self.user_sy_wallet.state(),
            AddressKind::UserPtWallet => self.user_pt_wallet.state(),
            AddressKind::UserYtWallet => self.user_yt_wallet.state(),
            AddressKind::UserLpWallet => self.user_lp_wallet.state(),
        }
    }

    /// Everything resolved so far. Never triggers a network call.
    pub fn snapshot(&self) -> ContractAddresses {
        let pool_wallets = self.pool_wallets.get();
        ContractAddresses {
            sy_minter: Some(self.sy_minter),
            underlying_minter: self.underlying_minter.get(),
            yt_minter: self.yt_minter.get(),
            pt_minter: self.pt_minter.get(),
            pool: self.pool.get(),
            user_underlying_wallet: self.user_underlying_wallet.get(),
            user_sy_wallet: self.user_sy_wallet.get(),
            user_pt_wallet: self.user_pt_wallet.get(),
            user_yt_wallet: self.user_yt_wallet.get(),
            user_lp_wallet: self.user_lp_wallet.get(),
            pool_sy_wallet: pool_wallets.and_then(|w| w.sy),
            pool_pt_wallet: pool_wallets.and_then(|w| w.pt),
            pool_yt_wallet: pool_wallets.and_then(|w| w.yt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StackValue;
    use crate::retry::{Backoff, RetryConfig};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn a(byte: u8) -> Address {
        Address::new(0, [byte; 32])
    }

    /// Answers `(contract, method)` from a table, counting calls and
    /// optionally failing the first `failures` calls of every method.
    struct Graph {
        answers: HashMap<(Address, &'static str), Vec<StackValue>>,
        calls: Mutex<HashMap<&'static str, u32>>,
        failures: AtomicU32,
        delay: Duration,
    }

    impl Graph {
        fn new() -> Self {
            let slice = |b| StackValue::address(&a(b)).unwrap();
            let mut answers = HashMap::new();
            answers.insert((a(1), "get_yt_minter_address"), vec![slice(2)]);
            answers.insert((a(1), "get_pool_address"), vec![slice(4)]);
            let mut packed = ton_cell::CellBuilder::new();
            packed
                .store_address(&a(10))
                .unwrap()
                .store_address(&a(3))
                .unwrap()
                .store_address(&a(11))
                .unwrap();
            answers.insert(
                (a(2), "get_jetton_addresses"),
                vec![StackValue::Cell(packed.build())],
            );
            answers.insert(
                (a(4), "get_jetton_addresses"),
                vec![
                    slice(20),
                    slice(21),
                    StackValue::address_none().unwrap(),
                    slice(2),
                ],
            );
            Self {
                answers,
                calls: Mutex::new(HashMap::new()),
                failures: AtomicU32::new(0),
                delay: Duration::ZERO,
            }
        }

        fn calls(&self, method: &str) -> u32 {
            self.calls.lock().get(method).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl ChainReader for Graph {
        async fn run_get_method(
            &self,
            address: &Address,
            method: &str,
            _args: &[StackValue],
        ) -> Result<Vec<StackValue>, ProviderError> {
            let (key, answer) = self
                .answers
                .iter()
                .find(|((addr, m), _)| addr == address && *m == method)
                .map(|((_, m), v)| (*m, v.clone()))
                .ok_or_else(|| ProviderError::ExitCode {
                    method: method.to_string(),
                    code: 11,
                })?;
            *self.calls.lock().entry(key).or_insert(0) += 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(ProviderError::Transport("node unavailable".into()));
            }
            Ok(answer)
        }
    }

    fn resolver(graph: Arc<Graph>, attempts: u32) -> AddressResolver {
        let retry = RetryPolicy::new(RetryConfig {
            max_attempts: attempts,
            backoff: Backoff::Fixed { delay_ms: 10 },
        });
        AddressResolver::new(graph, retry, a(1), a(99))
    }

    #[tokio::test]
    async fn pt_minter_resolves_transitively() {
        let graph = Arc::new(Graph::new());
        let r = resolver(graph.clone(), 1);

        assert_eq!(r.pt_minter().await.unwrap(), a(3));
        assert_eq!(r.state(AddressKind::YtMinter), ResolutionState::Resolved);
        assert_eq!(r.state(AddressKind::PtMinter), ResolutionState::Resolved);
        assert_eq!(r.snapshot().yt_minter, Some(a(2)));
    }

    #[tokio::test]
    async fn resolution_is_memoized() {
        let graph = Arc::new(Graph::new());
        let r = resolver(graph.clone(), 1);

        for _ in 0..3 {
            r.pt_minter().await.unwrap();
            r.yt_minter().await.unwrap();
        }
        assert_eq!(graph.calls("get_yt_minter_address"), 1);
        assert_eq!(graph.calls("get_jetton_addresses"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_first_requests_share_one_call() {
        let mut graph = Graph::new();
        graph.delay = Duration::from_millis(50);
        let graph = Arc::new(graph);
        let r = resolver(graph.clone(), 1);

        let (x, y, z) = tokio::join!(r.yt_minter(), r.yt_minter(), r.yt_minter());
        assert_eq!(x.unwrap(), a(2));
        assert_eq!(y.unwrap(), a(2));
        assert_eq!(z.unwrap(), a(2));
        assert_eq!(graph.calls("get_yt_minter_address"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_resolution_resets_state() {
        let mut graph = Graph::new();
        graph.delay = Duration::from_millis(50);
        let graph = Arc::new(graph);
        let r = resolver(graph.clone(), 1);

        let cut_short = tokio::time::timeout(Duration::from_millis(10), r.yt_minter()).await;
        assert!(cut_short.is_err());
        assert_eq!(r.state(AddressKind::YtMinter), ResolutionState::Unresolved);
        assert_eq!(r.snapshot().yt_minter, None);

        assert_eq!(r.yt_minter().await.unwrap(), a(2));
        assert_eq!(r.state(AddressKind::YtMinter), ResolutionState::Resolved);
    }

    #[tokio::test]
    async fn failure_leaves_slot_unset() {
        let graph = Arc::new(Graph::new());
        graph.failures.store(1, Ordering::SeqCst);
        let r = resolver(graph.clone(), 1);

        let err = r.pool().await.unwrap_err();
        assert_eq!(err.to_string(), "transport error: node unavailable");
        assert_eq!(r.state(AddressKind::Pool), ResolutionState::Failed);
        assert_eq!(r.snapshot().pool, None);

        assert_eq!(r.pool().await.unwrap(), a(4));
        assert_eq!(r.state(AddressKind::Pool), ResolutionState::Resolved);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried_inside_one_step() {
        let graph = Arc::new(Graph::new());
        graph.failures.store(2, Ordering::SeqCst);
        let r = resolver(graph.clone(), 3);

        assert_eq!(r.pool().await.unwrap(), a(4));
        assert_eq!(graph.calls("get_pool_address"), 3);
    }

    #[tokio::test]
    async fn addr_none_pool_wallet_is_unresolved_asset() {
        let graph = Arc::new(Graph::new());
        let r = resolver(graph, 1);

        assert_eq!(r.resolve(AddressKind::PoolSyWallet).await.unwrap(), a(20));
        assert_eq!(r.resolve(AddressKind::PoolPtWallet).await.unwrap(), a(21));
        let err = r.resolve(AddressKind::PoolYtWallet).await.unwrap_err();
        assert!(matches!(err, FivaError::UnresolvedAsset(_)));
        assert_eq!(r.state(AddressKind::PoolYtWallet), ResolutionState::Resolved);
    }

    #[tokio::test]
    async fn untouched_slots_stay_unresolved() {
        let r = resolver(Arc::new(Graph::new()), 1);
        for kind in AddressKind::ALL {
            assert_eq!(r.state(kind), ResolutionState::Unresolved);
        }
        let snap = r.snapshot();
        assert_eq!(snap.sy_minter, Some(a(1)));
        assert_eq!(snap.pool, None);
    }
}
