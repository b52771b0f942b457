//! Protocol operation payloads.
//!
//! Each variant is one message body understood by the SY minter, the YT
//! minter, the pool or a YT wallet. The body is always the 32-bit opcode
//! followed by the variant's fields in declaration order.

use ton_cell::{Address, Cell, CellBuilder};

use crate::error::MessageError;
use crate::jetton::{JettonBurn, JettonTransfer};
use crate::opcodes::{pool, sy};

/// Every message the client knows how to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Jetton transfer envelope.
    Transfer(JettonTransfer),
    /// Jetton burn envelope.
    Burn(JettonBurn),
    /// Forward payload to the SY minter: wrap underlying, swap SY for PT.
    WrapAndSwapToPt { receiver: Address, min_out: u128 },
    /// Forward payload to the SY minter: wrap underlying, swap SY for YT.
    WrapAndSwapToYt { receiver: Address, min_out: u128 },
    /// Forward payload to the pool: swap PT for SY, unwrap to underlying.
    SwapPtToUnderlying {
        query_id: u64,
        receiver: Address,
        min_out: u128,
    },
    /// Forward payload to the pool: swap YT for SY, unwrap to underlying.
    SwapYtToUnderlying {
        query_id: u64,
        receiver: Address,
        min_out: u128,
    },
    /// Forward payload to the SY minter: wrap underlying, mint PT and YT.
    WrapAndMintPtYt { receiver: Address },
    /// Forward payload to the SY minter: wrap underlying, add liquidity.
    WrapAndAddLiquidity { receiver: Address, min_lp_out: u128 },
    /// Forward payload to the pool: add PT liquidity.
    AddLiquidity {
        query_id: u64,
        receiver: Address,
        min_lp_out: u128,
    },
    /// Forward payload to the YT minter: redeem PT/YT before maturity.
    Redeem { query_id: u64, response: Address },
    /// Forward payload to the YT minter: redeem PT after maturity.
    RedeemAfterMaturity { query_id: u64, response: Address },
    /// Direct message to the user's YT wallet.
    ClaimInterestAndUnwrap { query_id: u64, recipient: Address },
    /// Burn custom payload for the LP wallet.
    RedeemLp,
}

impl Operation {
    pub fn opcode(&self) -> u32 {
        match self {
            Operation::Transfer(_) => crate::opcodes::jetton::TRANSFER,
            Operation::Burn(_) => crate::opcodes::jetton::BURN,
            Operation::WrapAndSwapToPt { .. } => sy::WRAP_AND_SWAP_SY_FOR_PT,
            Operation::WrapAndSwapToYt { .. } => sy::WRAP_AND_SWAP_SY_FOR_YT,
            Operation::SwapPtToUnderlying { .. } => sy::SWAP_PT_FOR_SY_AND_UNWRAP,
            Operation::SwapYtToUnderlying { .. } => sy::SWAP_YT_FOR_SY_AND_UNWRAP,
            Operation::WrapAndMintPtYt { .. } => sy::WRAP_AND_MINT_PT_YT,
            Operation::WrapAndAddLiquidity { .. } => sy::WRAP_AND_ADD_LIQUIDITY,
            Operation::AddLiquidity { .. } => pool::ADD_LIQUIDITY,
            Operation::Redeem { .. } => sy::REDEEM_AND_UNWRAP,
            Operation::RedeemAfterMaturity { .. } => sy::REDEEM_AFTER_MATURITY_AND_UNWRAP,
            Operation::ClaimInterestAndUnwrap { .. } => sy::CLAIM_INTEREST_AND_UNWRAP,
            Operation::RedeemLp => pool::REDEEM_LP,
        }
    }

    pub fn build(&self) -> Result<Cell, MessageError> {
        let mut b = CellBuilder::new();
        match self {
            Operation::Transfer(t) => return t.build(),
            Operation::Burn(burn) => return burn.build(),
            Operation::WrapAndSwapToPt { receiver, min_out }
            | Operation::WrapAndSwapToYt { receiver, min_out } => {
                b.store_uint(self.opcode() as u64, 32)?
                    .store_address(receiver)?
                    .store_coins(*min_out)?;
            }
            Operation::SwapPtToUnderlying {
                query_id,
                receiver,
                min_out,
            }
            | Operation::SwapYtToUnderlying {
                query_id,
                receiver,
                min_out,
            } => {
                b.store_uint(self.opcode() as u64, 32)?
                    .store_uint(*query_id, 64)?
                    .store_address(receiver)?
                    .store_coins(*min_out)?;
            }
            Operation::WrapAndMintPtYt { receiver } => {
                b.store_uint(self.opcode() as u64, 32)?
                    .store_address(receiver)?;
            }
            Operation::WrapAndAddLiquidity {
                receiver,
                min_lp_out,
            } => {
                b.store_uint(self.opcode() as u64, 32)?
                    .store_address(receiver)?
                    .store_coins(*min_lp_out)?;
            }
            Operation::AddLiquidity {
                query_id,
                receiver,
                min_lp_out,
            } => {
                // trailing flag: pool accepts single-sided PT deposits
                b.store_uint(self.opcode() as u64, 32)?
                    .store_uint(*query_id, 64)?
                    .store_address(receiver)?
                    .store_coins(*min_lp_out)?
                    .store_uint(1, 1)?;
            }
            Operation::Redeem { query_id, response }
            | Operation::RedeemAfterMaturity { query_id, response } => {
                b.store_uint(self.opcode() as u64, 32)?
                    .store_uint(*query_id, 64)?
                    .store_address(response)?
                    .store_coins(0)?;
            }
            Operation::ClaimInterestAndUnwrap {
                query_id,
                recipient,
            } => {
                b.store_uint(self.opcode() as u64, 32)?
                    .store_uint(*query_id, 64)?
                    .store_address(recipient)?;
            }
            Operation::RedeemLp => {
                b.store_uint(self.opcode() as u64, 32)?;
            }
        }
        Ok(b.build())
    }

    /// Build and serialize as a base64 bag of cells.
    pub fn to_boc_base64(&self) -> Result<String, MessageError> {
        Ok(ton_cell::boc::to_base64(&self.build()?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OP_BITS: usize = 32;
    const QID_BITS: usize = 64;
    const ADDR_BITS: usize = 267;

    fn receiver() -> Address {
        Address::parse("EQDi9blCcyT-k8iMpFMYY0t7mHVyiCB50ZsRgyUECJDuGvIl").unwrap()
    }

    fn leading_op(cell: &Cell) -> u32 {
        cell.parse().load_uint(32).unwrap() as u32
    }

    #[test]
    fn wrap_and_swap_to_pt_layout() {
        let op = Operation::WrapAndSwapToPt {
            receiver: receiver(),
            min_out: 0,
        };
        let cell = op.build().unwrap();
        assert_eq!(leading_op(&cell), 0x044eb55a);
        assert_eq!(cell.bit_len(), OP_BITS + ADDR_BITS + 4);

        let mut s = cell.parse();
        s.skip_bits(32).unwrap();
        assert_eq!(s.load_address().unwrap(), Some(receiver()));
        assert_eq!(s.load_coins().unwrap(), 0);
        s.end_parse().unwrap();
    }

    #[test]
    fn wrap_and_swap_to_yt_uses_its_own_opcode() {
        let op = Operation::WrapAndSwapToYt {
            receiver: receiver(),
            min_out: 1_000,
        };
        let cell = op.build().unwrap();
        assert_eq!(leading_op(&cell), 0xd58c0e13);
        assert_eq!(cell.bit_len(), OP_BITS + ADDR_BITS + 4 + 16);
    }

    #[test]
    fn swap_to_underlying_carries_query_id() {
        for (op, code) in [
            (
                Operation::SwapPtToUnderlying {
                    query_id: 42,
                    receiver: receiver(),
                    min_out: 5,
                },
                0x939f693c,
            ),
            (
                Operation::SwapYtToUnderlying {
                    query_id: 42,
                    receiver: receiver(),
                    min_out: 5,
                },
                0x6b2384c8,
            ),
        ] {
            let cell = op.build().unwrap();
            let mut s = cell.parse();
            assert_eq!(s.load_uint(32).unwrap() as u32, code);
            assert_eq!(s.load_uint(64).unwrap(), 42);
            assert_eq!(s.load_address().unwrap(), Some(receiver()));
            assert_eq!(s.load_coins().unwrap(), 5);
            s.end_parse().unwrap();
        }
    }

    #[test]
    fn mint_is_opcode_and_receiver() {
        let cell = Operation::WrapAndMintPtYt {
            receiver: receiver(),
        }
        .build()
        .unwrap();
        assert_eq!(leading_op(&cell), 0xd7185fb9);
        assert_eq!(cell.bit_len(), OP_BITS + ADDR_BITS);
    }

    #[test]
    fn add_liquidity_ends_with_flag_bit() {
        let cell = Operation::AddLiquidity {
            query_id: 1,
            receiver: receiver(),
            min_lp_out: 0,
        }
        .build()
        .unwrap();
        assert_eq!(leading_op(&cell), 0x3ebe5431);
        assert_eq!(cell.bit_len(), OP_BITS + QID_BITS + ADDR_BITS + 4 + 1);

        let mut s = cell.parse();
        s.skip_bits(OP_BITS + QID_BITS + ADDR_BITS + 4).unwrap();
        assert!(s.load_bit().unwrap());
    }

    #[test]
    fn wrap_and_add_liquidity_has_no_query_id() {
        let cell = Operation::WrapAndAddLiquidity {
            receiver: receiver(),
            min_lp_out: 0,
        }
        .build()
        .unwrap();
        assert_eq!(leading_op(&cell), 0xdfb44719);
        assert_eq!(cell.bit_len(), OP_BITS + ADDR_BITS + 4);
    }

    #[test]
    fn redeem_variants_end_with_zero_coins() {
        for (op, code) in [
            (
                Operation::Redeem {
                    query_id: 9,
                    response: receiver(),
                },
                0x6f0f4bed,
            ),
            (
                Operation::RedeemAfterMaturity {
                    query_id: 9,
                    response: receiver(),
                },
                0x8bab2bf9,
            ),
        ] {
            let cell = op.build().unwrap();
            assert_eq!(cell.bit_len(), OP_BITS + QID_BITS + ADDR_BITS + 4);
            let mut s = cell.parse();
            assert_eq!(s.load_uint(32).unwrap() as u32, code);
            assert_eq!(s.load_uint(64).unwrap(), 9);
            assert_eq!(s.load_address().unwrap(), Some(receiver()));
            assert_eq!(s.load_coins().unwrap(), 0);
        }
    }

    #[test]
    fn claim_interest_layout() {
        let cell = Operation::ClaimInterestAndUnwrap {
            query_id: 3,
            recipient: receiver(),
        }
        .build()
        .unwrap();
        assert_eq!(leading_op(&cell), 0x0fa96fb0);
        assert_eq!(cell.bit_len(), OP_BITS + QID_BITS + ADDR_BITS);
        assert!(cell.refs().is_empty());
    }

    #[test]
    fn redeem_lp_is_bare_opcode() {
        let cell = Operation::RedeemLp.build().unwrap();
        assert_eq!(cell.bit_len(), 32);
        assert_eq!(cell.data(), &[0xe1, 0xa4, 0x4c, 0xc4]);
    }

    #[test]
    fn opcode_matches_encoded_prefix() {
        let ops = [
            Operation::WrapAndSwapToPt {
                receiver: receiver(),
                min_out: 0,
            },
            Operation::WrapAndMintPtYt {
                receiver: receiver(),
            },
            Operation::RedeemLp,
            Operation::Burn(JettonBurn {
                query_id: 0,
                amount: 1,
                response_destination: receiver(),
                custom_payload: None,
            }),
        ];
        for op in ops {
            assert_eq!(leading_op(&op.build().unwrap()), op.opcode());
        }
    }

    #[test]
    fn coins_overflow_surfaces_as_error() {
        let op = Operation::WrapAndSwapToPt {
            receiver: receiver(),
            min_out: u128::MAX,
        };
        assert!(matches!(op.build(), Err(MessageError::Cell(_))));
    }

    #[test]
    fn boc_base64_decodes_to_same_cell() {
        let op = Operation::RedeemLp;
        let b64 = op.to_boc_base64().unwrap();
        let cell = ton_cell::boc::from_base64(&b64).unwrap();
        assert_eq!(cell, op.build().unwrap());
    }
}
