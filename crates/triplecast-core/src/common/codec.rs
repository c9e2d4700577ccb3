//! Fixed-width big-endian codec for arbitrary-precision values.
//!
//! Encoding is strict: a value must fit in [`VALUE_WIDTH`] bytes
//! (256 bits) and is left zero-padded to exactly that width. Decoding
//! is lenient: any buffer length is interpreted as an unsigned
//! big-endian integer, including the empty buffer (zero). The
//! asymmetry is part of the wire contract - clients may submit results
//! narrower than the full width and must still be understood.

use crate::error::{Error, Result};
use crate::types::VALUE_WIDTH;
use num_bigint::BigUint;

/// Encodes `value` into exactly [`VALUE_WIDTH`] big-endian bytes.
///
/// # Errors
///
/// Returns [`Error::EncodingOverflow`] if the magnitude needs more than
/// [`VALUE_WIDTH`] bytes.
pub fn encode(value: &BigUint) -> Result<[u8; VALUE_WIDTH]> {
    let be = value.to_bytes_be();
    // `to_bytes_be` yields `[0]` for zero, so `be` is never empty.
    if be.len() > VALUE_WIDTH {
        return Err(Error::EncodingOverflow { bits: value.bits() });
    }

    let mut buf = [0u8; VALUE_WIDTH];
    buf[VALUE_WIDTH - be.len()..].copy_from_slice(&be);
    Ok(buf)
}

/// Decodes an unsigned big-endian integer from a buffer of any length.
///
/// Never fails: an empty buffer decodes to zero and oversized buffers
/// are accepted as-is.
pub fn decode(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn val(n: u64) -> BigUint {
        BigUint::from(n)
    }

    #[test]
    fn encode_pads_to_full_width() {
        let buf = encode(&val(1)).unwrap();
        assert_eq!(buf.len(), VALUE_WIDTH);
        assert_eq!(buf[VALUE_WIDTH - 1], 1);
        assert!(buf[..VALUE_WIDTH - 1].iter().all(|&b| b == 0));
    }

    #[test]
    fn encode_zero_is_all_zero_bytes() {
        assert_eq!(encode(&val(0)).unwrap(), [0u8; VALUE_WIDTH]);
    }

    #[test]
    fn encode_accepts_exactly_256_bits() {
        let max = (BigUint::from(1u8) << 256usize) - 1u8;
        let buf = encode(&max).unwrap();
        assert!(buf.iter().all(|&b| b == 0xff));
    }

    #[test]
    fn encode_rejects_257_bits() {
        let too_wide = BigUint::from(1u8) << 256usize;
        match encode(&too_wide) {
            Err(Error::EncodingOverflow { bits }) => assert_eq!(bits, 257),
            other => panic!("expected overflow, got {other:?}"),
        }
    }

    #[test]
    fn decode_round_trips_encode() {
        for n in [0u64, 1, 255, 256, u64::MAX] {
            let v = val(n);
            assert_eq!(decode(&encode(&v).unwrap()), v);
        }
    }

    #[test]
    fn encode_round_trips_padded_decode() {
        // Any buffer of at most VALUE_WIDTH bytes re-encodes to its
        // zero-padded form.
        let short = [0x12u8, 0x34, 0x56];
        let v = decode(&short);
        let buf = encode(&v).unwrap();
        assert_eq!(&buf[VALUE_WIDTH - 3..], &short);
        assert!(buf[..VALUE_WIDTH - 3].iter().all(|&b| b == 0));
    }

    #[test]
    fn decode_is_lenient_about_length() {
        assert_eq!(decode(&[]), val(0));
        assert_eq!(decode(&[0, 0, 7]), val(7));
        // Longer than the wire width: leading zeros keep the value
        // decodable even though it could never be re-encoded verbatim.
        let mut long = vec![0u8; 40];
        long[39] = 9;
        assert_eq!(decode(&long), val(9));
    }
}
