//! Local replay: fetch the default struct-logger trace and run the transfer
//! tracer over it here instead of on the node.

use std::time::Instant;

use alloy::primitives::{TxHash, U256};
use alloy::providers::Provider;
use alloy::rpc::types::trace::geth::{
    DefaultFrame, GethDebugTracingOptions, GethDefaultTracingOptions,
};
use alloy::transports::Transport;
use tracing::debug;
use transfer_tracer::{structlog, CallContext, CallType, Precompiles, TraceResult};

use crate::TransfersError;

/// Stack for call operands, memory for the transfer precompile's input.
/// Storage is never needed.
///
/// Newer geth leaves memory out unless `enableMemory` is set, older geth only
/// reads `disableMemory`, so both are sent.
fn structlog_tracing_options(timeout: &str) -> GethDebugTracingOptions {
    GethDebugTracingOptions {
        config: GethDefaultTracingOptions {
            disable_stack: Some(false),
            enable_memory: Some(true),
            disable_memory: Some(false),
            disable_storage: Some(true),
            ..GethDefaultTracingOptions::default()
        },
        tracer: None,
        timeout: Some(timeout.to_owned()),
        ..GethDebugTracingOptions::default()
    }
}

pub(crate) async fn replay_transaction<ProviderT, TransportT>(
    provider: &ProviderT,
    tx_hash: TxHash,
    precompiles: &Precompiles,
    timeout: &str,
) -> Result<TraceResult, TransfersError>
where
    ProviderT: Provider<TransportT>,
    TransportT: Transport + Clone,
{
    let tx = provider
        .get_transaction_by_hash(tx_hash)
        .await?
        .ok_or(TransfersError::TransactionNotFound(tx_hash))?;
    let receipt = provider
        .get_transaction_receipt(tx_hash)
        .await?
        .ok_or(TransfersError::ReceiptNotFound(tx_hash))?;

    let started = Instant::now();
    let compat::Compat(frame) = provider
        .raw_request::<_, compat::Compat>(
            "debug_traceTransaction".into(),
            (tx_hash, structlog_tracing_options(timeout)),
        )
        .await?;
    debug!(
        "retrieved {} struct logs for {tx_hash}",
        frame.struct_logs.len()
    );

    let (kind, to) = match tx.to {
        Some(to) => (CallType::Call, to),
        None => (
            CallType::Create,
            receipt
                .contract_address
                .ok_or(TransfersError::MissingContractAddress(tx_hash))?,
        ),
    };
    let DefaultFrame {
        return_value,
        struct_logs,
        ..
    } = frame;
    let ctx = CallContext {
        kind,
        from: tx.from,
        to,
        value: tx.value,
        gas: U256::from(tx.gas),
        gas_used: U256::from(receipt.gas_used),
        input: tx.input,
        output: return_value,
        block: tx.block_number.unwrap_or_default(),
        time: started.elapsed(),
    };

    Ok(structlog::replay(&ctx, &struct_logs, precompiles)?)
}

/// The `error` field of a struct log is a `string` in geth but an `object` in
/// erigon, which alloy's [`DefaultFrame`] doesn't accept.
mod compat {
    use std::{collections::BTreeMap, fmt, iter};

    use alloy::primitives::{Bytes, B256, U256};
    use alloy::rpc::types::trace::geth::{DefaultFrame, StructLog};
    use serde::{de::SeqAccess, Deserialize, Deserializer};

    #[derive(Debug, Deserialize)]
    pub struct Compat(#[serde(with = "_DefaultFrame")] pub DefaultFrame);

    /// An empty object still means the step failed.
    fn error<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Error {
            String(String),
            Object(serde_json::Map<String, serde_json::Value>),
        }
        Ok(match Option::<Error>::deserialize(d)? {
            None => None,
            Some(Error::String(it)) => Some(it),
            Some(Error::Object(map)) if map.is_empty() => Some(String::new()),
            Some(Error::Object(map)) => Some(serde_json::Value::Object(map).to_string()),
        })
    }

    #[derive(Deserialize)]
    #[serde(remote = "DefaultFrame", rename_all = "camelCase")]
    struct _DefaultFrame {
        failed: bool,
        gas: u64,
        return_value: Bytes,
        #[serde(deserialize_with = "vec_structlog")]
        struct_logs: Vec<StructLog>,
    }

    fn vec_structlog<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<StructLog>, D::Error> {
        struct Visitor;
        impl<'de> serde::de::Visitor<'de> for Visitor {
            type Value = Vec<StructLog>;
            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an array of `StructLog`")
            }
            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                #[derive(Deserialize)]
                struct With(#[serde(with = "_StructLog")] StructLog);
                iter::from_fn(|| seq.next_element().transpose())
                    .map(|it| it.map(|With(it)| it))
                    .collect()
            }
        }

        d.deserialize_seq(Visitor)
    }

    #[derive(Deserialize)]
    #[serde(remote = "StructLog", rename_all = "camelCase")]
    struct _StructLog {
        pc: u64,
        op: String,
        gas: u64,
        gas_cost: u64,
        depth: u64,
        #[serde(default, deserialize_with = "error")]
        error: Option<String>,
        stack: Option<Vec<U256>>,
        return_data: Option<Bytes>,
        memory: Option<Vec<String>>,
        #[serde(rename = "memSize")]
        memory_size: Option<u64>,
        storage: Option<BTreeMap<B256, B256>>,
        #[serde(rename = "refund")]
        refund_counter: Option<u64>,
    }

}
