use std::time::Duration;

use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The kind of a call frame, spelled the way the EVM names the opcode that
/// opens it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum CallType {
    Call,
    CallCode,
    DelegateCall,
    StaticCall,
    Create,
    Create2,
    SelfDestruct,
}

impl CallType {
    /// Whether value can move with a frame of this kind.
    ///
    /// Delegated and static calls never carry value of their own.
    pub fn carries_value(self) -> bool {
        !matches!(self, Self::DelegateCall | Self::StaticCall)
    }
}

/// The top-level frame of a traced transaction, known once the trace is
/// complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    pub kind: CallType,
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub gas: U256,
    pub gas_used: U256,
    pub input: Bytes,
    pub output: Bytes,
    pub block: u64,
    /// Wall-clock time the trace took to produce.
    pub time: Duration,
}
