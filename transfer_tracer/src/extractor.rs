//! Per-step transfer extraction.
//!
//! The extractor is driven once per executed opcode, in execution order, and
//! accumulates into an [`ExtractionState`] that the caller owns. It never
//! suspends and never looks at a step twice.

use std::collections::VecDeque;

use alloy::primitives::U256;
use log::{debug, trace};
use thiserror::Error;

use crate::context::CallType;
use crate::precompile::{decode_transfer_input, DecodeError, Precompiles};
use crate::step::StepEvent;
use crate::transfer::{Transfer, TransferKind};
use crate::word::{address_from_word, word_to_usize};

// Operand positions of CALL and CALLCODE, counted from the top of the stack:
// gas, address, value, argsOffset, argsSize, retOffset, retSize.
const TARGET: usize = 1;
const VALUE: usize = 2;
const ARGS_OFFSET: usize = 3;
const ARGS_SIZE: usize = 4;

/// Errors that abort extraction for the whole trace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    #[error("{op} expected an operand at stack depth {depth}")]
    StackUnderflow { op: String, depth: usize },
    #[error("value-bearing {op} from a frame whose address is unknown")]
    UnknownCaller { op: String },
    #[error("struct log depth jumped from {from} to {to}")]
    DepthJump { from: usize, to: usize },
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Everything the extractor remembers between steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionState {
    reverted: bool,
    transfers: VecDeque<Transfer>,
}

impl ExtractionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set once the trace has seen a revert or an execution error. Never
    /// cleared.
    pub fn reverted(&self) -> bool {
        self.reverted
    }

    /// Transfers recorded so far, nested ones most recent first, followed by
    /// precompile transfers in execution order.
    pub fn transfers(&self) -> impl Iterator<Item = &Transfer> {
        self.transfers.iter()
    }

    pub(crate) fn prepend(&mut self, transfer: Transfer) {
        self.transfers.push_front(transfer);
    }

    pub(crate) fn into_transfers(self) -> VecDeque<Transfer> {
        self.transfers
    }
}

/// Mark the trace as reverted.
pub fn on_fault(state: &mut ExtractionState) {
    if !state.reverted {
        debug!("trace reverted, recorded transfers will be discarded");
    }
    state.reverted = true;
}

/// Feed one executed opcode to the extractor.
pub fn on_step<S: StepEvent>(
    state: &mut ExtractionState,
    step: &S,
    precompiles: &Precompiles,
) -> Result<(), StepError> {
    if step.error().is_some() {
        on_fault(state);
        return Ok(());
    }
    match step.op() {
        "REVERT" => on_fault(state),
        op => {
            if let Ok(kind @ (CallType::Call | CallType::CallCode | CallType::DelegateCall)) =
                op.parse::<CallType>()
            {
                on_call(state, step, kind, precompiles)?;
            }
        }
    }
    Ok(())
}

fn on_call<S: StepEvent>(
    state: &mut ExtractionState,
    step: &S,
    kind: CallType,
    precompiles: &Precompiles,
) -> Result<(), StepError> {
    // delegated frames run on the caller's balance, nothing moves
    if !kind.carries_value() {
        return Ok(());
    }

    let to = address_from_word(operand(step, TARGET)?);
    if !precompiles.is_precompile(to) {
        let value = operand(step, VALUE)?;
        if value > U256::ZERO {
            let from = step.contract_address().ok_or_else(|| StepError::UnknownCaller {
                op: step.op().to_owned(),
            })?;
            trace!("nested transfer of {value} from {from} to {to}");
            state.prepend(Transfer {
                kind: TransferKind::Nested,
                from,
                to,
                value,
            });
        }
    } else if precompiles.is_transfer(to) {
        let transfer = transfer_precompile_call(step)?;
        trace!(
            "precompile transfer of {} from {} to {}",
            transfer.value,
            transfer.from,
            transfer.to
        );
        state.transfers.push_back(transfer);
    }
    Ok(())
}

fn transfer_precompile_call<S: StepEvent>(step: &S) -> Result<Transfer, StepError> {
    let offset = operand(step, ARGS_OFFSET)?;
    let len = operand(step, ARGS_SIZE)?;
    let offset = word_to_usize(offset).ok_or(DecodeError::OffsetOverflow(offset))?;
    let len = word_to_usize(len).ok_or(DecodeError::OffsetOverflow(len))?;
    let end = offset
        .checked_add(len)
        .ok_or(DecodeError::OffsetOverflow(U256::from(offset) + U256::from(len)))?;
    let input = step.memory_slice(offset..end)?;
    Ok(decode_transfer_input(input)?)
}

fn operand<S: StepEvent>(step: &S, depth: usize) -> Result<U256, StepError> {
    step.peek(depth).ok_or_else(|| StepError::StackUnderflow {
        op: step.op().to_owned(),
        depth,
    })
}
