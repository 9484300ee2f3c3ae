use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::context::{CallContext, CallType};
use crate::extractor::ExtractionState;
use crate::transfer::{Transfer, TransferKind, ValidationError, WireTransfer};

/// The tracer's output for one transaction.
///
/// Same shape as geth's `callTracer` frame, minus the nested `calls` and
/// plus `block` and `transfers`. Producers emit `TraceResult<Transfer>`;
/// consumers decode `TraceResult<WireTransfer>` and [`validate`] it.
///
/// [`validate`]: TraceResult::validate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceResult<T = Transfer> {
    #[serde(rename = "type")]
    pub kind: CallType,
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub gas: U256,
    pub gas_used: U256,
    pub input: Bytes,
    pub output: Bytes,
    pub block: u64,
    pub time: String,
    pub transfers: Vec<T>,
}

impl TraceResult<WireTransfer> {
    /// Check every transfer for its required fields.
    pub fn validate(self) -> Result<TraceResult<Transfer>, ValidationError> {
        let transfers = self
            .transfers
            .into_iter()
            .map(Transfer::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TraceResult {
            kind: self.kind,
            from: self.from,
            to: self.to,
            value: self.value,
            gas: self.gas,
            gas_used: self.gas_used,
            input: self.input,
            output: self.output,
            block: self.block,
            time: self.time,
            transfers,
        })
    }
}

/// Close out a trace.
///
/// A revert anywhere in the trace discards every recorded transfer. Otherwise
/// a value-bearing top-level `CALL` is put ahead of everything recorded during
/// execution.
pub fn on_result(ctx: &CallContext, state: ExtractionState) -> TraceResult {
    let transfers = if state.reverted() {
        Vec::new()
    } else {
        let mut state = state;
        if ctx.kind == CallType::Call && ctx.value > U256::ZERO {
            state.prepend(Transfer {
                kind: TransferKind::Direct,
                from: ctx.from,
                to: ctx.to,
                value: ctx.value,
            });
        }
        state.into_transfers().into()
    };

    TraceResult {
        kind: ctx.kind,
        from: ctx.from,
        to: ctx.to,
        value: ctx.value,
        gas: ctx.gas,
        gas_used: ctx.gas_used,
        input: ctx.input.clone(),
        output: ctx.output.clone(),
        block: ctx.block,
        time: format!("{:?}", ctx.time),
        transfers,
    }
}
