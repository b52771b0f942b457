//! Bag-of-cells (BOC) serialization.
//!
//! Wallet bridges and RPC nodes exchange cells as a serialized bag:
//!
//! ```text
//! magic              0xb5ee9c72                      4 bytes
//! flags | size_bytes has_idx:1 has_crc32c:1 has_cache_bits:1 flags:2 size:3
//! offset_bytes                                       1 byte
//! cells              size_bytes
//! roots              size_bytes
//! absent             size_bytes
//! total_cells_size   offset_bytes
//! root_list          size_bytes * roots
//! index              offset_bytes * cells            (if has_idx)
//! cell_data          d1 d2 padded_data ref_index*    (per cell)
//! crc32c             4 bytes LE                      (if has_crc32c)
//! ```
//!
//! Cells are written in the same order the reference TON libraries use so
//! that payloads are byte-identical: reverse post-order of a depth-first walk
//! that visits refs last-to-first, with duplicate subtrees written once.

use std::collections::{HashMap, HashSet};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::cell::Cell;
use crate::checksum::crc32c;
use crate::error::CellError;

const BOC_MAGIC: [u8; 4] = [0xb5, 0xee, 0x9c, 0x72];

/// Serialize a single-root bag with a CRC32-C trailer.
pub fn serialize(root: &Cell) -> Result<Vec<u8>, CellError> {
    let order = topological_order(root);

    let mut index: HashMap<[u8; 32], usize> = HashMap::with_capacity(order.len());
    for (i, cell) in order.iter().enumerate() {
        index.insert(cell.hash(), i);
    }

    let cells_num = order.len();
    let size_bytes = byte_width(cells_num as u64);

    let mut cell_data = Vec::new();
    for cell in &order {
        cell_data.extend_from_slice(&cell.descriptors());
        cell_data.extend_from_slice(&cell.padded_data());
        for r in cell.refs() {
            let idx = index.get(&r.hash()).copied().ok_or_else(|| {
                CellError::InvalidBoc("ref missing from topological order".into())
            })?;
            write_uint(&mut cell_data, idx as u64, size_bytes);
        }
    }

    let total_size = cell_data.len();
    let offset_bytes = byte_width(total_size as u64);

    let mut out = Vec::with_capacity(16 + total_size);
    out.extend_from_slice(&BOC_MAGIC);
    // has_idx = 0, has_crc32c = 1, has_cache_bits = 0, flags = 0
    out.push(0x40 | size_bytes as u8);
    out.push(offset_bytes as u8);
    write_uint(&mut out, cells_num as u64, size_bytes);
    write_uint(&mut out, 1, size_bytes);
    write_uint(&mut out, 0, size_bytes);
    write_uint(&mut out, total_size as u64, offset_bytes);
    write_uint(&mut out, 0, size_bytes);
    out.extend_from_slice(&cell_data);

    let crc = crc32c(&out);
    out.extend_from_slice(&crc.to_le_bytes());
    Ok(out)
}

/// Parse a bag and return its first root. Only ordinary cells are supported.
pub fn deserialize(bytes: &[u8]) -> Result<Cell, CellError> {
    let mut reader = ByteReader::new(bytes);

    if reader.take(4)? != BOC_MAGIC {
        return Err(CellError::InvalidBoc("unknown magic".into()));
    }

    let flags = reader.byte()?;
    let has_idx = flags & 0x80 != 0;
    let has_crc32c = flags & 0x40 != 0;
    let size_bytes = (flags & 0x07) as usize;
    if size_bytes == 0 || size_bytes > 4 {
        return Err(CellError::InvalidBoc(format!(
            "invalid ref size {size_bytes}"
        )));
    }
    let offset_bytes = reader.byte()? as usize;
    if offset_bytes == 0 || offset_bytes > 8 {
        return Err(CellError::InvalidBoc(format!(
            "invalid offset size {offset_bytes}"
        )));
    }

    if has_crc32c {
        if bytes.len() < 4 {
            return Err(CellError::InvalidBoc("truncated crc".into()));
        }
        let (body, trailer) = bytes.split_at(bytes.len() - 4);
        let expected = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        if crc32c(body) != expected {
            return Err(CellError::InvalidBoc("crc32c mismatch".into()));
        }
    }

    let cells_num = reader.uint(size_bytes)? as usize;
    let roots_num = reader.uint(size_bytes)? as usize;
    let _absent = reader.uint(size_bytes)?;
    let _total_size = reader.uint(offset_bytes)?;

    if roots_num == 0 {
        return Err(CellError::InvalidBoc("bag has no roots".into()));
    }
    // Every cell takes at least its two descriptor bytes, every root index
    // `size_bytes`. Counts beyond that cannot be backed by the input.
    let available = reader.remaining();
    if roots_num > cells_num
        || cells_num > available / 2
        || roots_num > available / size_bytes
    {
        return Err(CellError::InvalidBoc(format!(
            "{cells_num} cells and {roots_num} roots do not fit in {available} bytes"
        )));
    }
    let mut roots = Vec::with_capacity(roots_num);
    for _ in 0..roots_num {
        roots.push(reader.uint(size_bytes)? as usize);
    }
    if has_idx {
        reader.take(cells_num * offset_bytes)?;
    }

    struct RawCell {
        data: Vec<u8>,
        bit_len: usize,
        refs: Vec<usize>,
    }

    let mut raw = Vec::with_capacity(cells_num);
    for i in 0..cells_num {
        let d1 = reader.byte()?;
        let d2 = reader.byte()?;
        if d1 & 0x08 != 0 {
            return Err(CellError::Unsupported("exotic cells".into()));
        }
        if d1 >> 5 != 0 {
            return Err(CellError::Unsupported("cells with non-zero level".into()));
        }
        let refs_num = (d1 & 0x07) as usize;
        let data_len = (d2 as usize).div_ceil(2);
        let mut data = reader.take(data_len)?.to_vec();

        let bit_len = if d2 % 2 == 1 {
            let last = data
                .last_mut()
                .ok_or_else(|| CellError::InvalidBoc("padded cell without data".into()))?;
            if *last == 0 {
                return Err(CellError::InvalidBoc("missing completion tag".into()));
            }
            let tag_pos = last.trailing_zeros() as usize;
            *last &= !(1u8 << tag_pos);
            data_len * 8 - tag_pos - 1
        } else {
            data_len * 8
        };

        let mut refs = Vec::with_capacity(refs_num);
        for _ in 0..refs_num {
            let r = reader.uint(size_bytes)? as usize;
            if r <= i || r >= cells_num {
                return Err(CellError::InvalidBoc(format!(
                    "cell {i} has invalid ref {r}"
                )));
            }
            refs.push(r);
        }
        raw.push(RawCell {
            data,
            bit_len,
            refs,
        });
    }

    // Refs always point forward, so build from the back.
    let mut built: Vec<Option<Cell>> = vec![None; cells_num];
    for i in (0..cells_num).rev() {
        let entry = &raw[i];
        let mut refs = Vec::with_capacity(entry.refs.len());
        for &r in &entry.refs {
            let child = built[r]
                .clone()
                .ok_or_else(|| CellError::InvalidBoc(format!("ref {r} not built")))?;
            refs.push(child);
        }
        built[i] = Some(Cell::new(entry.data.clone(), entry.bit_len, refs)?);
    }

    let root_idx = roots[0];
    built
        .get(root_idx)
        .cloned()
        .flatten()
        .ok_or_else(|| CellError::InvalidBoc(format!("root index {root_idx} out of range")))
}

/// Serialize and encode as standard base64, the form wallet bridges expect.
pub fn to_base64(root: &Cell) -> Result<String, CellError> {
    Ok(STANDARD.encode(serialize(root)?))
}

/// Decode a standard base64 bag and return its root.
pub fn from_base64(s: &str) -> Result<Cell, CellError> {
    let bytes = STANDARD
        .decode(s.trim())
        .map_err(|e| CellError::InvalidBoc(format!("base64 decode failed: {e}")))?;
    deserialize(&bytes)
}

fn topological_order(root: &Cell) -> Vec<&Cell> {
    fn visit<'a>(cell: &'a Cell, done: &mut HashSet<[u8; 32]>, sorted: &mut Vec<&'a Cell>) {
        if done.contains(&cell.hash()) {
            return;
        }
        for r in cell.refs().iter().rev() {
            visit(r, done, sorted);
        }
        sorted.push(cell);
        done.insert(cell.hash());
    }

    let mut done = HashSet::new();
    let mut sorted = Vec::new();
    visit(root, &mut done, &mut sorted);
    sorted.reverse();
    sorted
}

/// Minimal number of bytes to hold `value` (at least one).
fn byte_width(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(8).max(1)
}

fn write_uint(out: &mut Vec<u8>, value: u64, width: usize) {
    let bytes = value.to_be_bytes();
    out.extend_from_slice(&bytes[8 - width..]);
}

struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CellError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| CellError::InvalidBoc("unexpected end of data".into()))?;
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn byte(&mut self) -> Result<u8, CellError> {
        Ok(self.take(1)?[0])
    }

    fn uint(&mut self, width: usize) -> Result<u64, CellError> {
        let mut value = 0u64;
        for &b in self.take(width)? {
            value = (value << 8) | b as u64;
        }
        Ok(value)
    }
}
