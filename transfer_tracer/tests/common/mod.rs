#![allow(dead_code)]

use std::ops::Range;
use std::time::Duration;

use alloy::primitives::{address, Address, Bytes, U256};
use transfer_tracer::{CallContext, CallType, DecodeError, StepEvent, TRANSFER_PRECOMPILE};

pub const SENDER: Address = address!("5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e5e");
pub const ENTRY: Address = address!("e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0");

/// A hand-built step.
#[derive(Debug, Clone, Default)]
pub struct MockStep {
    pub op: String,
    pub error: Option<String>,
    /// Top of the stack first.
    pub stack: Vec<U256>,
    pub memory: Vec<u8>,
    pub contract: Option<Address>,
}

impl StepEvent for MockStep {
    fn op(&self) -> &str {
        &self.op
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn peek(&self, depth: usize) -> Option<U256> {
        self.stack.get(depth).copied()
    }

    fn memory_slice(&self, range: Range<usize>) -> Result<&[u8], DecodeError> {
        self.memory
            .get(range.clone())
            .ok_or(DecodeError::MemoryOutOfBounds {
                range,
                size: self.memory.len(),
            })
    }

    fn contract_address(&self) -> Option<Address> {
        self.contract
    }
}

impl MockStep {
    pub fn with_op(self, name: &str) -> Self {
        Self {
            op: name.to_owned(),
            ..self
        }
    }
}

pub fn op(name: &str) -> MockStep {
    MockStep {
        op: name.to_owned(),
        contract: Some(ENTRY),
        ..Default::default()
    }
}

pub fn failing(name: &str) -> MockStep {
    MockStep {
        error: Some("out of gas".to_owned()),
        ..op(name)
    }
}

/// A `CALL`-shaped step (`CALL`, `CALLCODE`, `DELEGATECALL` all work, the
/// value slot is filled in regardless).
pub fn call(name: &str, caller: Address, to: Address, value: u64) -> MockStep {
    MockStep {
        contract: Some(caller),
        stack: [
            U256::from(100_000),
            U256::from_be_slice(to.as_slice()),
            U256::from(value),
            U256::ZERO,
            U256::ZERO,
            U256::ZERO,
            U256::ZERO,
        ]
        .into(),
        ..op(name)
    }
}

/// A `CALL` to the transfer precompile with its input at memory offset
/// `0x80`.
pub fn precompile_call(from: Address, to: Address, value: u64) -> MockStep {
    let input = [
        word(from.as_slice()),
        word(to.as_slice()),
        U256::from(value).to_be_bytes::<32>(),
    ]
    .concat();
    precompile_call_with_input(&input)
}

pub fn precompile_call_with_input(input: &[u8]) -> MockStep {
    let offset = 0x80;
    let mut memory = vec![0u8; offset];
    memory.extend_from_slice(input);
    MockStep {
        stack: [
            U256::from(100_000),
            U256::from_be_slice(TRANSFER_PRECOMPILE.as_slice()),
            U256::ZERO,
            U256::from(offset),
            U256::from(input.len()),
            U256::ZERO,
            U256::ZERO,
        ]
        .into(),
        memory,
        ..call("CALL", ENTRY, TRANSFER_PRECOMPILE, 0)
    }
}

pub fn word(tail: &[u8]) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[32 - tail.len()..].copy_from_slice(tail);
    word
}

pub fn ctx(kind: CallType, value: u64) -> CallContext {
    CallContext {
        kind,
        from: SENDER,
        to: ENTRY,
        value: U256::from(value),
        gas: U256::from(1_000_000),
        gas_used: U256::from(50_000),
        input: Bytes::new(),
        output: Bytes::new(),
        block: 1,
        time: Duration::from_millis(3),
    }
}
