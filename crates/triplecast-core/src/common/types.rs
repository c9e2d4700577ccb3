//! Wire-width constant and the triple domain type shared by client and
//! server.

use num_bigint::BigUint;

/// The number of bytes occupied by a single encoded value on the wire.
///
/// Every `scalar`/`x`/`y` element in a batch is exactly this wide,
/// big-endian, left zero-padded. Used for buffer allocation and for the
/// 256-bit load-time bound on dataset values.
pub const VALUE_WIDTH: usize = 32;

/// One unit of distributable data.
///
/// Values are non-negative arbitrary-precision integers, immutable once
/// loaded. A value wider than [`VALUE_WIDTH`] bytes cannot be encoded
/// and is rejected when the dataset is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    pub scalar: BigUint,
    pub x: BigUint,
    pub y: BigUint,
}

impl Triple {
    pub fn new(scalar: BigUint, x: BigUint, y: BigUint) -> Self {
        Self { scalar, x, y }
    }
}
