//! Conversions between 256-bit EVM stack words and the narrower values the
//! tracer cares about.
//!
//! All arithmetic is unsigned 256-bit. Addresses are 160 bits wide and live in
//! the low 20 bytes of a big-endian stack word; the high 12 bytes are ignored
//! on the way in.

use alloy::primitives::{Address, U256};

/// Size of an EVM word in bytes.
pub const WORD_SIZE: usize = 32;

/// Size of an address in bytes.
pub const ADDRESS_SIZE: usize = 20;

const ADDRESS_OFFSET: usize = WORD_SIZE - ADDRESS_SIZE;

/// Truncate a stack word to the address in its low 160 bits.
pub fn address_from_word(word: U256) -> Address {
    let bytes = word.to_be_bytes::<WORD_SIZE>();
    Address::from_slice(&bytes[ADDRESS_OFFSET..])
}

/// Read an address right-aligned in a 32-byte big-endian word.
///
/// # Panics
/// If `word` is not exactly [`WORD_SIZE`] bytes long.
pub fn address_from_be_word(word: &[u8]) -> Address {
    assert_eq!(word.len(), WORD_SIZE, "expected a full word");
    Address::from_slice(&word[ADDRESS_OFFSET..])
}

/// Convert a stack word used as a memory offset or length into a `usize`.
///
/// Returns [`None`] if the word does not fit, which for a real trace means the
/// access could never have succeeded.
pub fn word_to_usize(word: U256) -> Option<usize> {
    if word > U256::from(usize::MAX) {
        return None;
    }
    Some(word.to::<usize>())
}
