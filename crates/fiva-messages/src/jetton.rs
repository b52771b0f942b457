//! TEP-74 jetton wallet envelopes.
//!
//! Every protocol action except interest claims travels as a jetton
//! `transfer` (or `burn`) sent to the user's own jetton wallet; the protocol
//! operation rides inside as the forward payload or custom payload.

use ton_cell::{Address, Cell, CellBuilder};

use crate::error::MessageError;
use crate::opcodes::jetton;

/// `transfer#0f8a7ea5 query_id:uint64 amount:Coins destination:MsgAddress
/// response_destination:MsgAddress custom_payload:(Maybe ^Cell)
/// forward_ton_amount:Coins forward_payload:(Maybe ^Cell)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JettonTransfer {
    pub query_id: u64,
    pub amount: u128,
    pub destination: Address,
    pub response_destination: Address,
    pub custom_payload: Option<Cell>,
    pub forward_ton_amount: u128,
    pub forward_payload: Option<Cell>,
}

impl JettonTransfer {
    pub fn build(&self) -> Result<Cell, MessageError> {
        let mut b = CellBuilder::new();
        b.store_uint(jetton::TRANSFER as u64, 32)?
            .store_uint(self.query_id, 64)?
            .store_coins(self.amount)?
            .store_address(&self.destination)?
            .store_address(&self.response_destination)?
            .store_maybe_ref(self.custom_payload.clone())?
            .store_coins(self.forward_ton_amount)?
            .store_maybe_ref(self.forward_payload.clone())?;
        Ok(b.build())
    }

    /// Decode a transfer body. Used to inspect payloads before they are
    /// handed to a wallet.
    pub fn parse(cell: &Cell) -> Result<Self, MessageError> {
        let mut s = cell.parse();
        let op = s.load_uint(32)? as u32;
        if op != jetton::TRANSFER {
            return Err(MessageError::UnexpectedOpcode {
                expected: jetton::TRANSFER,
                found: op,
            });
        }
        let query_id = s.load_uint(64)?;
        let amount = s.load_coins()?;
        let destination = s
            .load_address()?
            .ok_or_else(|| MessageError::Malformed("transfer without destination".into()))?;
        let response_destination = s.load_address()?.ok_or_else(|| {
            MessageError::Malformed("transfer without response destination".into())
        })?;
        let custom_payload = s.load_maybe_ref()?.cloned();
        let forward_ton_amount = s.load_coins()?;
        let forward_payload = s.load_maybe_ref()?.cloned();
        s.end_parse()?;

        Ok(Self {
            query_id,
            amount,
            destination,
            response_destination,
            custom_payload,
            forward_ton_amount,
            forward_payload,
        })
    }
}

/// `burn#595f07bc query_id:uint64 amount:Coins
/// response_destination:MsgAddress custom_payload:(Maybe ^Cell)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JettonBurn {
    pub query_id: u64,
    pub amount: u128,
    pub response_destination: Address,
    pub custom_payload: Option<Cell>,
}

impl JettonBurn {
    pub fn build(&self) -> Result<Cell, MessageError> {
        let mut b = CellBuilder::new();
        b.store_uint(jetton::BURN as u64, 32)?
            .store_uint(self.query_id, 64)?
            .store_coins(self.amount)?
            .store_address(&self.response_destination)?
            .store_maybe_ref(self.custom_payload.clone())?;
        Ok(b.build())
    }

    pub fn parse(cell: &Cell) -> Result<Self, MessageError> {
        let mut s = cell.parse();
        let op = s.load_uint(32)? as u32;
        if op != jetton::BURN {
            return Err(MessageError::UnexpectedOpcode {
                expected: jetton::BURN,
                found: op,
            });
        }
        let query_id = s.load_uint(64)?;
        let amount = s.load_coins()?;
        let response_destination = s
            .load_address()?
            .ok_or_else(|| MessageError::Malformed("burn without response destination".into()))?;
        let custom_payload = s.load_maybe_ref()?.cloned();
        s.end_parse()?;

        Ok(Self {
            query_id,
            amount,
            response_destination,
            custom_payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::new(0, [byte; 32])
    }

    fn sample_transfer() -> JettonTransfer {
        let mut fwd = CellBuilder::new();
        fwd.store_uint(0x1234, 32).unwrap();
        JettonTransfer {
            query_id: 7,
            amount: 1_000_000_000,
            destination: addr(1),
            response_destination: addr(2),
            custom_payload: None,
            forward_ton_amount: 0,
            forward_payload: Some(fwd.build()),
        }
    }

    #[test]
    fn transfer_bit_layout() {
        let cell = sample_transfer().build().unwrap();
        // op + query_id + coins(1e9) + 2 addresses + maybe + coins(0) + maybe
        assert_eq!(cell.bit_len(), 32 + 64 + 36 + 267 + 267 + 1 + 4 + 1);
        assert_eq!(cell.refs().len(), 1);
        assert_eq!(&cell.data()[..4], &[0x0f, 0x8a, 0x7e, 0xa5]);
        assert_eq!(&cell.data()[4..12], &7u64.to_be_bytes());
    }

    #[test]
    fn transfer_parses_back() {
        let transfer = sample_transfer();
        let parsed = JettonTransfer::parse(&transfer.build().unwrap()).unwrap();
        assert_eq!(parsed, transfer);
    }

    #[test]
    fn transfer_with_custom_payload_has_two_refs() {
        let mut t = sample_transfer();
        t.custom_payload = Some(Cell::empty());
        let cell = t.build().unwrap();
        assert_eq!(cell.refs().len(), 2);
        assert_eq!(cell.refs()[0], Cell::empty());
    }

    #[test]
    fn burn_bit_layout() {
        let burn = JettonBurn {
            query_id: 0,
            amount: 500,
            response_destination: addr(3),
            custom_payload: None,
        };
        let cell = burn.build().unwrap();
        // coins(500) = 4 + 16 bits
        assert_eq!(cell.bit_len(), 32 + 64 + 20 + 267 + 1);
        assert_eq!(&cell.data()[..4], &[0x59, 0x5f, 0x07, 0xbc]);
        assert_eq!(JettonBurn::parse(&cell).unwrap(), burn);
    }

    #[test]
    fn parse_rejects_wrong_opcode() {
        let cell = sample_transfer().build().unwrap();
        let err = JettonBurn::parse(&cell).unwrap_err();
        assert!(matches!(
            err,
            MessageError::UnexpectedOpcode {
                expected: 0x595f07bc,
                found: 0x0f8a7ea5
            }
        ));
    }
}
