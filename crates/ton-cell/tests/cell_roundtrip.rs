//! Property tests over the public builder / slice / BOC API.

use proptest::prelude::*;
use ton_cell::{boc, Address, Cell, CellBuilder, MAX_COINS};

fn arb_address() -> impl Strategy<Value = Address> {
    (prop_oneof![Just(0i8), Just(-1i8)], any::<[u8; 32]>())
        .prop_map(|(wc, hash)| Address::new(wc, hash))
}

proptest! {
    #[test]
    fn coins_read_back_exactly(amount in 0u128..=MAX_COINS) {
        let mut b = CellBuilder::new();
        b.store_coins(amount).unwrap();
        let cell = b.build();
        let mut s = cell.parse();
        prop_assert_eq!(s.load_coins().unwrap(), amount);
        prop_assert!(s.end_parse().is_ok());
    }

    #[test]
    fn mixed_fields_read_back_in_order(
        op in any::<u32>(),
        query_id in any::<u64>(),
        amount in 0u128..=MAX_COINS,
        to in arb_address(),
        flag in any::<bool>(),
    ) {
        let mut b = CellBuilder::new();
        b.store_uint(op as u64, 32).unwrap()
            .store_uint(query_id, 64).unwrap()
            .store_coins(amount).unwrap()
            .store_address(&to).unwrap()
            .store_bit(flag).unwrap();
        let cell = b.build();

        let mut s = cell.parse();
        prop_assert_eq!(s.load_uint(32).unwrap(), op as u64);
        prop_assert_eq!(s.load_uint(64).unwrap(), query_id);
        prop_assert_eq!(s.load_coins().unwrap(), amount);
        prop_assert_eq!(s.load_address().unwrap(), Some(to));
        prop_assert_eq!(s.load_bit().unwrap(), flag);
        prop_assert!(s.end_parse().is_ok());
    }

    #[test]
    fn boc_preserves_hash(
        bytes in proptest::collection::vec(any::<u8>(), 0..100),
        extra_bits in 0usize..8,
        with_child in any::<bool>(),
    ) {
        let mut b = CellBuilder::new();
        b.store_bytes(&bytes).unwrap();
        b.store_uint(0, extra_bits).unwrap();
        if with_child {
            let mut child = CellBuilder::new();
            child.store_bytes(&bytes).unwrap();
            b.store_ref(child.build()).unwrap();
        }
        let cell = b.build();

        let decoded = boc::from_base64(&boc::to_base64(&cell).unwrap()).unwrap();
        prop_assert_eq!(decoded.hash(), cell.hash());
        prop_assert_eq!(decoded.bit_len(), cell.bit_len());
    }

    #[test]
    fn friendly_form_parses_back(addr in arb_address(), bounceable in any::<bool>(), test_only in any::<bool>()) {
        let s = addr.to_friendly(bounceable, test_only, true);
        let parsed = Address::parse_friendly(&s).unwrap();
        prop_assert_eq!(parsed.address, addr);
        prop_assert_eq!(parsed.bounceable, bounceable);
        prop_assert_eq!(parsed.test_only, test_only);
    }
}

#[test]
fn address_cell_of_known_contract() {
    let addr: Address = "EQDi9blCcyT-k8iMpFMYY0t7mHVyiCB50ZsRgyUECJDuGvIl".parse().unwrap();
    let mut b = CellBuilder::new();
    b.store_address(&addr).unwrap();
    let cell = b.build();
    let bag = boc::serialize(&cell).unwrap();
    assert_eq!(&bag[..4], &[0xb5, 0xee, 0x9c, 0x72]);
    assert_eq!(boc::deserialize(&bag).unwrap(), cell);
    assert_ne!(cell, Cell::empty());
}
