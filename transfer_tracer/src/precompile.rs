//! Precompiled contracts the tracer has to recognise, and the calldata layout
//! of the native transfer precompile.

use std::ops::{Range, RangeInclusive};

use alloy::primitives::{address, Address, U256};
use thiserror::Error;

use crate::transfer::{Transfer, TransferKind};
use crate::word::{address_from_be_word, WORD_SIZE};

/// The native transfer precompile.
pub const TRANSFER_PRECOMPILE: Address = address!("00000000000000000000000000000000000000fd");

/// `from`, `to` and `value`, one word each.
pub const TRANSFER_INPUT_LEN: usize = 3 * WORD_SIZE;

/// Errors from reading the transfer precompile's input out of memory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("transfer precompile input is {len} bytes, expected at least {}", TRANSFER_INPUT_LEN)]
    ShortInput { len: usize },
    #[error("memory offset or length {0} does not fit in a machine word")]
    OffsetOverflow(U256),
    #[error("memory read {range:?} is out of bounds for memory of {size} bytes")]
    MemoryOutOfBounds { range: Range<usize>, size: usize },
    #[error("malformed memory word: {0}")]
    MalformedMemory(String),
}

/// The set of addresses that execute native code instead of bytecode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Precompiles {
    transfer: Address,
    ranges: Vec<RangeInclusive<Address>>,
}

impl Default for Precompiles {
    fn default() -> Self {
        Self::new(TRANSFER_PRECOMPILE)
    }
}

impl Precompiles {
    /// The Ethereum precompiles (up to and including KZG point evaluation)
    /// plus Celo's native ones, which are allocated downwards from `0xfd`.
    pub fn new(transfer: Address) -> Self {
        Self {
            transfer,
            ranges: vec![
                address!("0000000000000000000000000000000000000001")
                    ..=address!("000000000000000000000000000000000000000a"),
                address!("00000000000000000000000000000000000000e6")
                    ..=address!("00000000000000000000000000000000000000fd"),
            ],
        }
    }

    pub fn is_precompile(&self, addr: Address) -> bool {
        addr == self.transfer || self.ranges.iter().any(|range| range.contains(&addr))
    }

    pub fn is_transfer(&self, addr: Address) -> bool {
        addr == self.transfer
    }
}

/// Decode the input of a call to the transfer precompile.
///
/// ```text
/// [ 0, 32)  from, right-aligned
/// [32, 64)  to, right-aligned
/// [64, 96)  value, big-endian
/// ```
///
/// Anything past the third word is ignored.
pub fn decode_transfer_input(input: &[u8]) -> Result<Transfer, DecodeError> {
    if input.len() < TRANSFER_INPUT_LEN {
        return Err(DecodeError::ShortInput { len: input.len() });
    }
    let (from, rest) = input.split_at(WORD_SIZE);
    let (to, rest) = rest.split_at(WORD_SIZE);
    Ok(Transfer {
        kind: TransferKind::Precompile,
        from: address_from_be_word(from),
        to: address_from_be_word(to),
        value: U256::from_be_slice(&rest[..WORD_SIZE]),
    })
}
