//! Recover the native-currency transfers made by a transaction from its
//! execution trace.
//!
//! A plain `eth_getTransactionByHash` only tells you about the value the
//! transaction itself carried. Contracts can move value further with `CALL`
//! and `CALLCODE`, and on Celo through the transfer precompile, whose effect
//! shows up nowhere except in the precompile's calldata.
//!
//! This library replays a trace one opcode at a time:
//! - [`on_step`] is fed every executed opcode (a [`StepEvent`]) in order,
//! - [`on_result`] is called once with the top-level [`CallContext`] and
//!   produces the [`TraceResult`].
//!
//! [`structlog::replay`] drives both over a geth struct-log trace.
//!
//! # Ordering
//! The final list is, in order:
//! 1. the transaction's own transfer, if any,
//! 2. nested call transfers, most recent first,
//! 3. precompile transfers, in execution order.
//!
//! # Reverts
//! A `REVERT` or an execution error anywhere in the trace empties the list.
//! This is deliberately coarser than EVM semantics, where a revert only undoes
//! its own frame and the frames below it.

#![deny(rustdoc::broken_intra_doc_links)]
#![warn(missing_debug_implementations)]

mod context;
mod extractor;
mod precompile;
mod result;
mod step;
pub mod structlog;
mod transfer;
pub mod word;

pub use context::{CallContext, CallType};
pub use extractor::{on_fault, on_step, ExtractionState, StepError};
pub use precompile::{
    decode_transfer_input, DecodeError, Precompiles, TRANSFER_INPUT_LEN, TRANSFER_PRECOMPILE,
};
pub use result::{on_result, TraceResult};
pub use step::StepEvent;
pub use transfer::{Transfer, TransferKind, ValidationError, WireTransfer};

/// Run [`on_step`] over every step, then [`on_result`].
pub fn extract<S: StepEvent>(
    ctx: &CallContext,
    steps: impl IntoIterator<Item = S>,
    precompiles: &Precompiles,
) -> Result<TraceResult, StepError> {
    let mut state = ExtractionState::new();
    for step in steps {
        on_step(&mut state, &step, precompiles)?;
    }
    Ok(on_result(ctx, state))
}
