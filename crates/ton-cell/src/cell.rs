//! Ordinary TON cells: a builder, an immutable cell with its representation
//! hash, and a read cursor.
//!
//! A cell holds up to 1023 data bits and up to 4 references to other cells.
//! Its representation hash is
//!
//! ```text
//! SHA-256( d1 | d2 | padded_data | depth(ref_0..ref_n) | hash(ref_0..ref_n) )
//! ```
//!
//! where `d1 = refs_count` (ordinary cell, level 0), `d2 = ceil(bits/8) +
//! floor(bits/8)`, the padded data has a single `1` bit appended when the
//! bit length is not byte aligned, and depths are 2-byte big-endian.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::address::Address;
use crate::error::CellError;

pub const MAX_BITS: usize = 1023;
pub const MAX_REFS: usize = 4;

/// Largest value representable as `Coins` (VarUInteger 16 → at most 15 bytes).
pub const MAX_COINS: u128 = (1u128 << 120) - 1;

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// An immutable ordinary cell.
#[derive(Clone, PartialEq, Eq)]
pub struct Cell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Cell>,
    hash: [u8; 32],
    depth: u16,
}

impl Cell {
    /// Build a cell from raw parts. Bits past `bit_len` in the last byte are
    /// cleared.
    pub fn new(mut data: Vec<u8>, bit_len: usize, refs: Vec<Cell>) -> Result<Self, CellError> {
        if bit_len > MAX_BITS {
            return Err(CellError::Overflow(format!(
                "{bit_len} bits exceeds the {MAX_BITS}-bit limit"
            )));
        }
        if refs.len() > MAX_REFS {
            return Err(CellError::Overflow(format!(
                "{} refs exceeds the {MAX_REFS}-ref limit",
                refs.len()
            )));
        }
        let byte_len = bit_len.div_ceil(8);
        if data.len() < byte_len {
            return Err(CellError::Underflow(format!(
                "{bit_len} bits need {byte_len} bytes, got {}",
                data.len()
            )));
        }
        data.truncate(byte_len);
        if bit_len % 8 != 0 {
            let keep = 0xFFu8 << (8 - bit_len % 8);
            if let Some(last) = data.last_mut() {
                *last &= keep;
            }
        }

        let depth = refs
            .iter()
            .map(|r| r.depth + 1)
            .max()
            .unwrap_or(0);

        let mut cell = Cell {
            data,
            bit_len,
            refs,
            hash: [0u8; 32],
            depth,
        };
        cell.hash = cell.compute_hash();
        Ok(cell)
    }

    /// The cell with no bits and no refs.
    pub fn empty() -> Self {
        CellBuilder::new().build()
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Data bytes; trailing bits of the last byte past `bit_len` are zero.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn refs(&self) -> &[Cell] {
        &self.refs
    }

    pub fn hash(&self) -> [u8; 32] {
        self.hash
    }

    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// Start reading this cell from the beginning.
    pub fn parse(&self) -> CellSlice<'_> {
        CellSlice {
            cell: self,
            bit_pos: 0,
            ref_pos: 0,
        }
    }

    /// The two descriptor bytes `d1`, `d2`.
    pub(crate) fn descriptors(&self) -> [u8; 2] {
        let d1 = self.refs.len() as u8;
        let d2 = (self.bit_len / 8 + self.bit_len.div_ceil(8)) as u8;
        [d1, d2]
    }

    /// Data with the completion tag appended for non-aligned lengths.
    pub(crate) fn padded_data(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        let rem = self.bit_len % 8;
        if rem != 0 {
            if let Some(last) = out.last_mut() {
                *last |= 0x80 >> rem;
            }
        }
        out
    }

    fn compute_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.descriptors());
        hasher.update(self.padded_data());
        for r in &self.refs {
            hasher.update(r.depth.to_be_bytes());
        }
        for r in &self.refs {
            hasher.update(r.hash);
        }
        hasher.finalize().into()
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::empty()
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("bits", &self.bit_len)
            .field("data", &hex::encode(&self.data))
            .field("refs", &self.refs)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Append-only bit writer producing a [`Cell`].
///
/// Every `store_*` method checks capacity and returns `&mut Self`, so calls
/// chain with `?`:
///
/// ```
/// # use ton_cell::CellBuilder;
/// # fn main() -> Result<(), ton_cell::CellError> {
/// let mut b = CellBuilder::new();
/// b.store_uint(0x0f8a7ea5, 32)?.store_uint(0, 64)?.store_coins(1_000)?;
/// let cell = b.build();
/// assert_eq!(cell.bit_len(), 32 + 64 + 4 + 16);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Cell>,
}

impl CellBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn remaining_bits(&self) -> usize {
        MAX_BITS - self.bit_len
    }

    pub fn remaining_refs(&self) -> usize {
        MAX_REFS - self.refs.len()
    }

    fn ensure_bits(&self, bits: usize) -> Result<(), CellError> {
        if bits > self.remaining_bits() {
            return Err(CellError::Overflow(format!(
                "need {bits} bits, {} left",
                self.remaining_bits()
            )));
        }
        Ok(())
    }

    fn push_bit(&mut self, bit: bool) {
        if self.bit_len % 8 == 0 {
            self.data.push(0);
        }
        if bit {
            let idx = self.bit_len / 8;
            self.data[idx] |= 0x80 >> (self.bit_len % 8);
        }
        self.bit_len += 1;
    }

    pub fn store_bit(&mut self, bit: bool) -> Result<&mut Self, CellError> {
        self.ensure_bits(1)?;
        self.push_bit(bit);
        Ok(self)
    }

    /// Store the low `bits` bits of `value`, most significant first.
    pub fn store_u128(&mut self, value: u128, bits: usize) -> Result<&mut Self, CellError> {
        if bits > 128 {
            return Err(CellError::Overflow(format!(
                "cannot store {bits}-bit integer"
            )));
        }
        if bits < 128 && value >> bits != 0 {
            return Err(CellError::Overflow(format!(
                "value {value} does not fit in {bits} bits"
            )));
        }
        self.ensure_bits(bits)?;
        for i in (0..bits).rev() {
            self.push_bit((value >> i) & 1 == 1);
        }
        Ok(self)
    }

    pub fn store_uint(&mut self, value: u64, bits: usize) -> Result<&mut Self, CellError> {
        if bits > 64 {
            return Err(CellError::Overflow(format!(
                "store_uint supports at most 64 bits, got {bits}"
            )));
        }
        self.store_u128(value as u128, bits)
    }

    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self, CellError> {
        self.ensure_bits(bytes.len() * 8)?;
        for &b in bytes {
            for i in (0..8).rev() {
                self.push_bit((b >> i) & 1 == 1);
            }
        }
        Ok(self)
    }

    /// `Coins` (VarUInteger 16): 4-bit byte length, then big-endian bytes.
    pub fn store_coins(&mut self, amount: u128) -> Result<&mut Self, CellError> {
        if amount > MAX_COINS {
            return Err(CellError::Overflow(format!(
                "coins amount {amount} exceeds 2^120 - 1"
            )));
        }
        let byte_len = (128 - amount.leading_zeros() as usize).div_ceil(8);
        self.ensure_bits(4 + byte_len * 8)?;
        self.store_u128(byte_len as u128, 4)?;
        self.store_u128(amount, byte_len * 8)
    }

    /// `addr_std$10 anycast:nothing workchain:int8 hash:bits256`.
    pub fn store_address(&mut self, address: &Address) -> Result<&mut Self, CellError> {
        self.ensure_bits(267)?;
        self.store_u128(0b10, 2)?;
        self.store_bit(false)?;
        self.store_u128(address.workchain as u8 as u128, 8)?;
        self.store_bytes(&address.hash)
    }

    /// `addr_none$00`.
    pub fn store_address_none(&mut self) -> Result<&mut Self, CellError> {
        self.store_u128(0, 2)
    }

    pub fn store_maybe_address(&mut self, address: Option<&Address>) -> Result<&mut Self, CellError> {
        match address {
            Some(a) => self.store_address(a),
            None => self.store_address_none(),
        }
    }

    pub fn store_ref(&mut self, cell: Cell) -> Result<&mut Self, CellError> {
        if self.refs.len() >= MAX_REFS {
            return Err(CellError::Overflow(format!(
                "cell already holds {MAX_REFS} refs"
            )));
        }
        self.refs.push(cell);
        Ok(self)
    }

    /// `Maybe ^Cell`: a presence bit, then the ref if present.
    pub fn store_maybe_ref(&mut self, cell: Option<Cell>) -> Result<&mut Self, CellError> {
        match cell {
            Some(c) => {
                if self.refs.len() >= MAX_REFS {
                    return Err(CellError::Overflow(format!(
                        "cell already holds {MAX_REFS} refs"
                    )));
                }
                self.store_bit(true)?;
                self.store_ref(c)
            }
            None => self.store_bit(false),
        }
    }

    pub fn build(self) -> Cell {
        let depth = self.refs.iter().map(|r| r.depth + 1).max().unwrap_or(0);
        let mut cell = Cell {
            data: self.data,
            bit_len: self.bit_len,
            refs: self.refs,
            hash: [0u8; 32],
            depth,
        };
        cell.hash = cell.compute_hash();
        cell
    }
}

// ---------------------------------------------------------------------------
// Slice
// ---------------------------------------------------------------------------

/// Read cursor over a [`Cell`].
#[derive(Debug, Clone)]
pub struct CellSlice<'a> {
    cell: &'a Cell,
    bit_pos: usize,
    ref_pos: usize,
}

impl<'a> CellSlice<'a> {
    pub fn remaining_bits(&self) -> usize {
        self.cell.bit_len - self.bit_pos
    }

    pub fn remaining_refs(&self) -> usize {
        self.cell.refs.len() - self.ref_pos
    }

    fn ensure_bits(&self, bits: usize) -> Result<(), CellError> {
        if bits > self.remaining_bits() {
            return Err(CellError::Underflow(format!(
                "need {bits} bits, {} left",
                self.remaining_bits()
            )));
        }
        Ok(())
    }

    fn read_bit(&mut self) -> bool {
        let byte = self.cell.data[self.bit_pos / 8];
        let bit = (byte >> (7 - self.bit_pos % 8)) & 1 == 1;
        self.bit_pos += 1;
        bit
    }

    pub fn load_bit(&mut self) -> Result<bool, CellError> {
        self.ensure_bits(1)?;
        Ok(self.read_bit())
    }

    pub fn load_u128(&mut self, bits: usize) -> Result<u128, CellError> {
        if bits > 128 {
            return Err(CellError::Underflow(format!(
                "cannot load {bits}-bit integer"
            )));
        }
        self.ensure_bits(bits)?;
        let mut value = 0u128;
        for _ in 0..bits {
            value = (value << 1) | self.read_bit() as u128;
        }
        Ok(value)
    }

    pub fn load_uint(&mut self, bits: usize) -> Result<u64, CellError> {
        if bits > 64 {
            return Err(CellError::Underflow(format!(
                "load_uint supports at most 64 bits, got {bits}"
            )));
        }
        Ok(self.load_u128(bits)? as u64)
    }

    pub fn load_bytes(&mut self, len: usize) -> Result<Vec<u8>, CellError> {
        self.ensure_bits(len * 8)?;
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(self.load_u128(8)? as u8);
        }
        Ok(out)
    }

    pub fn skip_bits(&mut self, bits: usize) -> Result<(), CellError> {
        self.ensure_bits(bits)?;
        self.bit_pos += bits;
        Ok(())
    }

    pub fn load_coins(&mut self) -> Result<u128, CellError> {
        let byte_len = self.load_u128(4)? as usize;
        self.load_u128(byte_len * 8)
    }

    /// Load `MsgAddressInt`; `addr_none` yields `None`.
    pub fn load_address(&mut self) -> Result<Option<Address>, CellError> {
        match self.load_u128(2)? {
            0b00 => Ok(None),
            0b10 => {
                if self.load_bit()? {
                    return Err(CellError::Unsupported("anycast addresses".into()));
                }
                let workchain = self.load_u128(8)? as u8 as i8;
                let bytes = self.load_bytes(32)?;
                let mut hash = [0u8; 32];
                hash.copy_from_slice(&bytes);
                Ok(Some(Address { workchain, hash }))
            }
            0b01 => Err(CellError::Unsupported("external addresses".into())),
            _ => Err(CellError::Unsupported("addr_var addresses".into())),
        }
    }

    pub fn load_ref(&mut self) -> Result<&'a Cell, CellError> {
        if self.remaining_refs() == 0 {
            return Err(CellError::Underflow("no refs left".into()));
        }
        let cell = &self.cell.refs[self.ref_pos];
        self.ref_pos += 1;
        Ok(cell)
    }

    pub fn load_maybe_ref(&mut self) -> Result<Option<&'a Cell>, CellError> {
        if self.load_bit()? {
            self.load_ref().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Fails unless every bit and ref has been consumed.
    pub fn end_parse(&self) -> Result<(), CellError> {
        if self.remaining_bits() != 0 || self.remaining_refs() != 0 {
            return Err(CellError::Overflow(format!(
                "{} bits and {} refs left unread",
                self.remaining_bits(),
                self.remaining_refs()
            )));
        }
        Ok(())
    }
}
