//! Replay of geth's default struct-logger output through the extractor.
//!
//! A struct log carries the opcode, stack and memory of each step, but not
//! the address of the executing contract. We rebuild that by watching
//! `depth`: a step one level deeper than its predecessor runs in the frame the
//! predecessor opened, and a shallower one has returned to an enclosing frame.
//!
//! Memory must be enabled on the node for transfer precompile calls to
//! decode.

use std::cell::OnceCell;
use std::ops::Range;

use alloy::primitives::{Address, U256};
use alloy::rpc::types::trace::geth::StructLog;
use log::trace;

use crate::context::{CallContext, CallType};
use crate::extractor::{on_step, ExtractionState, StepError};
use crate::precompile::{DecodeError, Precompiles};
use crate::result::{on_result, TraceResult};
use crate::step::StepEvent;
use crate::word::{address_from_word, word_to_usize, WORD_SIZE};

/// One struct log together with the frame it executes in.
#[derive(Debug)]
pub struct StructLogStep<'a> {
    log: &'a StructLog,
    contract: Option<Address>,
    memory: OnceCell<Result<Vec<u8>, DecodeError>>,
}

impl<'a> StructLogStep<'a> {
    pub fn new(log: &'a StructLog, contract: Option<Address>) -> Self {
        Self {
            log,
            contract,
            memory: OnceCell::new(),
        }
    }

    fn memory(&self) -> Result<&[u8], DecodeError> {
        self.memory
            .get_or_init(|| decode_memory(self.log.memory.as_deref().unwrap_or_default()))
            .as_deref()
            .map_err(|e| e.clone())
    }

    /// The frame this step opens if the next step is one level deeper.
    ///
    /// `None` if the opcode opens no frame, `Some(None)` if it does but the
    /// frame's address can't be known from the trace alone.
    fn opened_frame(&self) -> Option<Option<Address>> {
        let frame = match self.op().parse::<CallType>().ok()? {
            CallType::Call | CallType::StaticCall => self.peek(1).map(address_from_word),
            CallType::CallCode | CallType::DelegateCall => self.contract,
            CallType::Create2 => self.create2_address(),
            // the address depends on the sender's nonce
            CallType::Create => None,
            CallType::SelfDestruct => return None,
        };
        Some(frame)
    }

    fn create2_address(&self) -> Option<Address> {
        let sender = self.contract?;
        let offset = word_to_usize(self.peek(1)?)?;
        let size = word_to_usize(self.peek(2)?)?;
        let salt = self.peek(3)?;
        let init_code = self.memory_slice(offset..offset.checked_add(size)?).ok()?;
        Some(sender.create2_from_code(salt.to_be_bytes::<WORD_SIZE>(), init_code))
    }
}

impl StepEvent for StructLogStep<'_> {
    fn op(&self) -> &str {
        &self.log.op
    }

    fn error(&self) -> Option<&str> {
        self.log.error.as_deref()
    }

    fn peek(&self, depth: usize) -> Option<U256> {
        // struct logs list the stack bottom first
        self.log.stack.as_ref()?.iter().rev().nth(depth).copied()
    }

    fn memory_slice(&self, range: Range<usize>) -> Result<&[u8], DecodeError> {
        let memory = self.memory()?;
        memory
            .get(range.clone())
            .ok_or(DecodeError::MemoryOutOfBounds {
                range,
                size: memory.len(),
            })
    }

    fn contract_address(&self) -> Option<Address> {
        self.contract
    }
}

/// Memory is reported as a list of 32-byte words in hex, without a prefix.
fn decode_memory(words: &[String]) -> Result<Vec<u8>, DecodeError> {
    let mut memory = Vec::with_capacity(words.len() * WORD_SIZE);
    for word in words {
        let bytes = hex::decode(word.strip_prefix("0x").unwrap_or(word))
            .map_err(|e| DecodeError::MalformedMemory(format!("{word}: {e}")))?;
        if bytes.len() != WORD_SIZE {
            return Err(DecodeError::MalformedMemory(format!(
                "{word}: expected {WORD_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        memory.extend_from_slice(&bytes);
    }
    Ok(memory)
}

/// Run the extractor over a whole struct-log trace.
///
/// `ctx.to` is taken as the address of the outermost frame, so for a contract
/// creation it must already hold the created address.
pub fn replay(
    ctx: &CallContext,
    struct_logs: &[StructLog],
    precompiles: &Precompiles,
) -> Result<TraceResult, StepError> {
    let mut state = ExtractionState::new();
    // one entry per active depth, outermost first
    let mut frames = vec![Some(ctx.to)];
    let mut opened = None;

    for log in struct_logs {
        let depth = usize::try_from(log.depth).unwrap_or(usize::MAX);
        if depth == frames.len() + 1 {
            frames.push(opened.take().flatten());
        } else if depth > frames.len() {
            return Err(StepError::DepthJump {
                from: frames.len(),
                to: depth,
            });
        } else {
            frames.truncate(depth.max(1));
        }

        let contract = frames.last().copied().flatten();
        let step = StructLogStep::new(log, contract);
        on_step(&mut state, &step, precompiles)?;

        opened = step.opened_frame();
        if opened == Some(None) {
            trace!("{} at pc {} opens a frame with no known address", log.op, log.pc);
        }
    }

    Ok(on_result(ctx, state))
}
