// EBML variable-size integer (VINT) codec
//
// The number of leading zero bits in the first byte gives the total width:
// 1xxx xxxx               -> 1 byte, 7 value bits
// 01xx xxxx  xxxx xxxx    -> 2 bytes, 14 value bits
// ...down to 8 bytes with 56 value bits. The single marker bit is not part
// of the value. A first byte of 0x00 would put the marker past the eighth
// byte, which EBML does not allow.

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};

/// Decoded variable-size integer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarInt {
    /// Total encoded width including the marker byte, 1..=8
    pub width: usize,
    /// Value with the marker bit stripped
    pub value: u64,
}

/// Read a VINT and strip the marker bit (EBML element sizes)
pub fn read_value(cursor: &mut ByteCursor<'_>) -> Result<VarInt> {
    let b0 = cursor.read_u8()?;
    if b0 == 0 {
        return Err(Error::format(
            "VINT marker bit not found within the first byte",
        ));
    }
    let leading = b0.leading_zeros() as usize; // 0..=7
    let width = leading + 1;

    let mut value = (b0 ^ (1 << (7 - leading))) as u64;
    for _ in 1..width {
        value = (value << 8) | cursor.read_u8()? as u64;
    }

    Ok(VarInt { width, value })
}

/// Read a VINT as its raw encoded bytes, marker bit left in place.
///
/// EBML element IDs are matched with their marker bits included, so ID
/// reads must not strip them.
pub fn read_raw(cursor: &mut ByteCursor<'_>) -> Result<Vec<u8>> {
    let b0 = cursor.read_u8()?;
    if b0 == 0 {
        return Err(Error::format(
            "VINT marker bit not found within the first byte",
        ));
    }
    let width = b0.leading_zeros() as usize + 1;
    let mut bytes = Vec::with_capacity(width);
    bytes.push(b0);
    bytes.extend_from_slice(cursor.read(width - 1)?);
    Ok(bytes)
}

/// Minimal-width encoding of `value`; the inverse of `read_value`.
///
/// Values of 2^56 and above do not fit the 8-byte VINT limit.
pub fn encode(value: u64) -> Vec<u8> {
    debug_assert!(
        value < 1u64 << 56,
        "value {:#x} exceeds the 56-bit VINT value range",
        value
    );
    let mut width = 1;
    while width < 8 && value >= 1u64 << (7 * width) {
        width += 1;
    }
    let mut out = vec![0u8; width];
    let mut v = value;
    for byte in out.iter_mut().rev() {
        *byte = (v & 0xFF) as u8;
        v >>= 8;
    }
    out[0] |= 1 << (8 - width);
    out
}
