use std::ops::Range;

use alloy::primitives::{Address, U256};

use crate::precompile::DecodeError;

/// A single executed opcode, as seen by a tracer.
///
/// This is the only view of the virtual machine the extractor needs. A host
/// (a live node, or a replay of recorded struct logs) implements it once per
/// step, and the extractor never holds on to it past that step.
pub trait StepEvent {
    /// The opcode mnemonic, e.g. `CALL`.
    fn op(&self) -> &str;

    /// The execution error raised by this step, if any.
    fn error(&self) -> Option<&str>;

    /// The stack word `depth` slots below the top, where `0` is the top.
    fn peek(&self, depth: usize) -> Option<U256>;

    /// A byte range of the frame's working memory.
    fn memory_slice(&self, range: Range<usize>) -> Result<&[u8], DecodeError>;

    /// The contract whose frame is executing this step, if the host knows it.
    fn contract_address(&self) -> Option<Address>;
}

impl<T: StepEvent + ?Sized> StepEvent for &T {
    fn op(&self) -> &str {
        (**self).op()
    }

    fn error(&self) -> Option<&str> {
        (**self).error()
    }

    fn peek(&self, depth: usize) -> Option<U256> {
        (**self).peek(depth)
    }

    fn memory_slice(&self, range: Range<usize>) -> Result<&[u8], DecodeError> {
        (**self).memory_slice(range)
    }

    fn contract_address(&self) -> Option<Address> {
        (**self).contract_address()
    }
}
