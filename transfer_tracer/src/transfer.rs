use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a transfer was observed.
///
/// The serialized labels are the ones the node-side tracer emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferKind {
    /// The transaction itself carried value.
    #[serde(rename = "cGLD transfer")]
    Direct,
    /// A value-bearing `CALL` or `CALLCODE` made during execution.
    #[serde(rename = "cGLD nested transfer")]
    Nested,
    /// A call to the transfer precompile.
    #[serde(rename = "cGLD transfer precompile")]
    Precompile,
}

/// A single movement of native currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "WireTransfer")]
pub struct Transfer {
    #[serde(rename = "type")]
    pub kind: TransferKind,
    pub from: Address,
    pub to: Address,
    pub value: U256,
}

/// A transfer as it arrives off the wire, before the required fields are
/// checked.
///
/// Every field is optional here so that an absent or `null` field is reported
/// by name instead of being defaulted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTransfer {
    #[serde(rename = "type")]
    pub kind: Option<TransferKind>,
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub value: Option<U256>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field '{0}' for Transfer")]
    MissingField(&'static str),
}

impl TryFrom<WireTransfer> for Transfer {
    type Error = ValidationError;

    fn try_from(wire: WireTransfer) -> Result<Self, Self::Error> {
        let WireTransfer {
            kind,
            from,
            to,
            value,
        } = wire;
        Ok(Self {
            kind: kind.ok_or(ValidationError::MissingField("type"))?,
            from: from.ok_or(ValidationError::MissingField("from"))?,
            to: to.ok_or(ValidationError::MissingField("to"))?,
            value: value.ok_or(ValidationError::MissingField("value"))?,
        })
    }
}
