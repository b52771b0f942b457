//! Opcode table shared with the on-chain contracts.
//!
//! Protocol opcodes are the CRC32 (IEEE) of the operation name. The values
//! are pinned here rather than computed at runtime so that a rename on either
//! side shows up as a failing test instead of a silently rejected message.
//! Jetton opcodes come from TEP-74 and are not name hashes.

/// TEP-74 jetton wallet operations.
pub mod jetton {
    pub const TRANSFER: u32 = 0x0f8a_7ea5;
    pub const BURN: u32 = 0x595f_07bc;
}

/// Operations handled by the SY minter and the contracts it forwards to.
pub mod sy {
    pub const WRAP_AND_SWAP_SY_FOR_PT: u32 = 0x044e_b55a;
    pub const WRAP_AND_SWAP_SY_FOR_YT: u32 = 0xd58c_0e13;
    pub const SWAP_PT_FOR_SY_AND_UNWRAP: u32 = 0x939f_693c;
    pub const SWAP_YT_FOR_SY_AND_UNWRAP: u32 = 0x6b23_84c8;
    pub const WRAP_AND_MINT_PT_YT: u32 = 0xd718_5fb9;
    pub const REDEEM_AND_UNWRAP: u32 = 0x6f0f_4bed;
    pub const REDEEM_AFTER_MATURITY_AND_UNWRAP: u32 = 0x8bab_2bf9;
    pub const WRAP_AND_ADD_LIQUIDITY: u32 = 0xdfb4_4719;
    pub const ADD_LIQUIDITY: u32 = 0x3ebe_5431;
    pub const REDEEM_LP_AND_UNWRAP: u32 = 0x382e_8e35;
    pub const CLAIM_INTEREST_AND_UNWRAP: u32 = 0x0fa9_6fb0;
}

/// Operations handled by the pool.
pub mod pool {
    pub const ADD_LIQUIDITY: u32 = 0x3ebe_5431;
    pub const REDEEM_LP: u32 = 0xe1a4_4cc4;
}

/// Every name-derived opcode with the name it is derived from.
pub const NAMED: &[(&str, u32)] = &[
    ("wrap_and_swap_sy_for_pt", sy::WRAP_AND_SWAP_SY_FOR_PT),
    ("wrap_and_swap_sy_for_yt", sy::WRAP_AND_SWAP_SY_FOR_YT),
    ("swap_pt_for_sy_and_unwrap", sy::SWAP_PT_FOR_SY_AND_UNWRAP),
    ("swap_yt_for_sy_and_unwrap", sy::SWAP_YT_FOR_SY_AND_UNWRAP),
    ("wrap_and_mint_pt_yt", sy::WRAP_AND_MINT_PT_YT),
    ("redeem_and_unwrap", sy::REDEEM_AND_UNWRAP),
    (
        "redeem_after_maturity_and_unwrap",
        sy::REDEEM_AFTER_MATURITY_AND_UNWRAP,
    ),
    ("wrap_and_add_liquidity", sy::WRAP_AND_ADD_LIQUIDITY),
    ("add_liquidity", sy::ADD_LIQUIDITY),
    ("redeem_lp_and_unwrap", sy::REDEEM_LP_AND_UNWRAP),
    ("claim_interest_and_unwrap", sy::CLAIM_INTEREST_AND_UNWRAP),
    ("add_liquidity", pool::ADD_LIQUIDITY),
    ("redeem_lp", pool::REDEEM_LP),
];

/// Look up a name-derived opcode.
pub fn by_name(name: &str) -> Option<u32> {
    NAMED.iter().find(|(n, _)| *n == name).map(|(_, op)| *op)
}
