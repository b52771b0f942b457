use serde::{Deserialize, Serialize};
use ton_cell::Address;

use crate::error::{AssetPairError, FivaError};

/// Assets a user can hold and trade. SY is internal to the protocol and
/// never appears at the API surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    Underlying,
    Pt,
    Yt,
}

impl Asset {
    /// Display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Asset::Underlying => "underlying",
            Asset::Pt => "PT",
            Asset::Yt => "YT",
        }
    }

    /// Reject pairs the pool cannot quote.
    pub fn validate_swap(from: Asset, to: Asset) -> Result<(), AssetPairError> {
        if from == to {
            return Err(AssetPairError::SameAsset);
        }
        if matches!((from, to), (Asset::Pt, Asset::Yt) | (Asset::Yt, Asset::Pt)) {
            return Err(AssetPairError::PtYtSwap);
        }
        Ok(())
    }
}

/// Every contract address the client may need, keyed for resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressKind {
    YtMinter,
    PtMinter,
    Pool,
    PoolSyWallet,
    PoolPtWallet,
    PoolYtWallet,
    UnderlyingMinter,
    UserUnderlyingWallet,
    UserSyWallet,
    UserPtWallet,
    UserYtWallet,
    UserLpWallet,
}

impl AddressKind {
    pub const ALL: [AddressKind; 12] = [
        AddressKind::YtMinter,
        AddressKind::PtMinter,
        AddressKind::Pool,
        AddressKind::PoolSyWallet,
        AddressKind::PoolPtWallet,
        AddressKind::PoolYtWallet,
        AddressKind::UnderlyingMinter,
        AddressKind::UserUnderlyingWallet,
        AddressKind::UserSyWallet,
        AddressKind::UserPtWallet,
        AddressKind::UserYtWallet,
        AddressKind::UserLpWallet,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            AddressKind::YtMinter => "YT minter",
            AddressKind::PtMinter => "PT minter",
            AddressKind::Pool => "pool",
            AddressKind::PoolSyWallet => "pool SY wallet",
            AddressKind::PoolPtWallet => "pool PT wallet",
            AddressKind::PoolYtWallet => "pool YT wallet",
            AddressKind::UnderlyingMinter => "underlying minter",
            AddressKind::UserUnderlyingWallet => "user underlying wallet",
            AddressKind::UserSyWallet => "user SY wallet",
            AddressKind::UserPtWallet => "user PT wallet",
            AddressKind::UserYtWallet => "user YT wallet",
            AddressKind::UserLpWallet => "user LP wallet",
        }
    }
}

/// Lifecycle of one memoized address slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResolutionState {
    #[default]
    Unresolved,
    Resolving,
    Resolved,
    /// The last attempt failed; the next call tries again.
    Failed,
}

/// Snapshot of the contract-address graph rooted at the SY minter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAddresses {
    pub sy_minter: Option<Address>,
    pub underlying_minter: Option<Address>,
    pub yt_minter: Option<Address>,
    pub pt_minter: Option<Address>,
    pub pool: Option<Address>,
    pub user_underlying_wallet: Option<Address>,
    pub user_sy_wallet: Option<Address>,
    pub user_pt_wallet: Option<Address>,
    pub user_yt_wallet: Option<Address>,
    pub user_lp_wallet: Option<Address>,
    pub pool_sy_wallet: Option<Address>,
    pub pool_pt_wallet: Option<Address>,
    pub pool_yt_wallet: Option<Address>,
}

/// The pool's own jetton wallets plus the minters it reports.
///
/// Any of these may be `addr_none` on a pool that is not fully initialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolWallets {
    pub sy: Option<Address>,
    pub pt: Option<Address>,
    pub yt: Option<Address>,
    pub yt_minter: Option<Address>,
    pub sy_minter: Option<Address>,
}

impl PoolWallets {
    /// The pool wallet that receives `asset`; underlying maps to SY.
    pub fn for_asset(&self, asset: Asset) -> Result<Address, FivaError> {
        let (slot, kind) = match asset {
            Asset::Underlying => (self.sy, AddressKind::PoolSyWallet),
            Asset::Pt => (self.pt, AddressKind::PoolPtWallet),
            Asset::Yt => (self.yt, AddressKind::PoolYtWallet),
        };
        slot.ok_or_else(|| FivaError::UnresolvedAsset(kind.display_name().to_string()))
    }
}

/// Fee quote for one operation, in nanotons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeEstimate {
    /// Attached to the outgoing message.
    pub value: u128,
    /// Forwarded with the jetton notification.
    pub forward_value: u128,
}

/// Curve-specific tail of the pool configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "curve", rename_all = "camelCase")]
pub enum PoolCurve {
    /// Index-tracking pool.
    #[serde(rename_all = "camelCase")]
    Indexed {
        index: u128,
        expected_index: u128,
        index_updater: Option<Address>,
    },
    /// Curve-stable pool.
    #[serde(rename_all = "camelCase")]
    Stable { amplification: u128 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolConfig {
    pub owner: Option<Address>,
    pub maintainer: Option<Address>,
    pub protocol_fee: u128,
    pub lp_fee: u128,
    pub ref_fee: u128,
    pub fee_divider: u128,
    pub fee_treasury: Option<Address>,
    pub curve: PoolCurve,
}

impl PoolConfig {
    pub fn index(&self) -> Option<u128> {
        match self.curve {
            PoolCurve::Indexed { index, .. } => Some(index),
            PoolCurve::Stable { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolBalances {
    pub lp: u128,
    pub sy: u128,
    pub pt: u128,
}

/// PT and YT minted for an SY amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintOut {
    pub yt: u128,
    pub pt: u128,
}

/// SY and PT received for burning LP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityOut {
    pub sy: u128,
    pub pt: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimableInterest {
    pub interest: u128,
    pub protocol_fee: u128,
}

/// Outcome of a claim: the interest read just before submitting, for
/// display, and the wallet's result. The contract settles the real amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimReceipt {
    pub estimated: ClaimableInterest,
    pub result: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemOut {
    pub sy: u128,
    pub max_sy_available: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyInfo {
    pub max_total_supply: u128,
    pub total_supply: u128,
}

/// Addresses reported by the YT minter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YtJettonAddresses {
    pub sy_wallet: Option<Address>,
    pub pt_minter: Address,
    pub pt_wallet: Option<Address>,
}

/// Result of a jetton wallet's `get_wallet_data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JettonWalletData {
    pub balance: u128,
    pub owner: Option<Address>,
    pub minter: Option<Address>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_valid_pair_passes() {
        let valid = [
            (Asset::Underlying, Asset::Pt),
            (Asset::Underlying, Asset::Yt),
            (Asset::Pt, Asset::Underlying),
            (Asset::Yt, Asset::Underlying),
        ];
        for (from, to) in valid {
            assert!(Asset::validate_swap(from, to).is_ok(), "{from:?} -> {to:?}");
        }
    }

    #[test]
    fn same_asset_is_rejected() {
        for asset in [Asset::Underlying, Asset::Pt, Asset::Yt] {
            assert_eq!(
                Asset::validate_swap(asset, asset),
                Err(AssetPairError::SameAsset)
            );
        }
    }

    #[test]
    fn pt_yt_is_rejected_both_ways() {
        assert_eq!(
            Asset::validate_swap(Asset::Pt, Asset::Yt),
            Err(AssetPairError::PtYtSwap)
        );
        assert_eq!(
            Asset::validate_swap(Asset::Yt, Asset::Pt),
            Err(AssetPairError::PtYtSwap)
        );
    }

    #[test]
    fn pool_wallet_mapping() {
        let wallets = PoolWallets {
            sy: Some(Address::new(0, [1; 32])),
            pt: Some(Address::new(0, [2; 32])),
            yt: Some(Address::new(0, [3; 32])),
            yt_minter: None,
            sy_minter: None,
        };
        assert_eq!(wallets.for_asset(Asset::Underlying).unwrap().hash, [1; 32]);
        assert_eq!(wallets.for_asset(Asset::Pt).unwrap().hash, [2; 32]);
        assert_eq!(wallets.for_asset(Asset::Yt).unwrap().hash, [3; 32]);
    }

    #[test]
    fn missing_pool_wallet_is_unresolved_asset() {
        let wallets = PoolWallets {
            sy: Some(Address::new(0, [1; 32])),
            pt: Some(Address::new(0, [2; 32])),
            yt: None,
            yt_minter: None,
            sy_minter: None,
        };
        let err = wallets.for_asset(Asset::Yt).unwrap_err();
        assert_eq!(err.to_string(), "unresolved asset: pool YT wallet");
    }

    #[test]
    fn fee_estimate_serializes_camel_case() {
        let fee = FeeEstimate {
            value: 200_000_000,
            forward_value: 150_000_000,
        };
        let json = serde_json::to_value(fee).unwrap();
        assert_eq!(json["forwardValue"], 150_000_000);
    }

    #[test]
    fn pool_config_index_accessor() {
        let mut cfg = PoolConfig {
            owner: None,
            maintainer: None,
            protocol_fee: 1,
            lp_fee: 2,
            ref_fee: 3,
            fee_divider: 10_000,
            fee_treasury: None,
            curve: PoolCurve::Indexed {
                index: 1_050_000,
                expected_index: 1_051_000,
                index_updater: None,
            },
        };
        assert_eq!(cfg.index(), Some(1_050_000));
        cfg.curve = PoolCurve::Stable { amplification: 100 };
        assert_eq!(cfg.index(), None);
    }

    #[test]
    fn default_state_is_unresolved() {
        assert_eq!(ResolutionState::default(), ResolutionState::Unresolved);
    }
}
