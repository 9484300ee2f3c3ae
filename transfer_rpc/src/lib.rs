//! Ask a node for the native-currency transfers of a transaction.
//!
//! In [`TraceMode::JsTracer`] the transfer tracer is shipped to the node as a
//! JavaScript payload for `debug_traceTransaction`. In
//! [`TraceMode::StructLogs`] the node's default struct logs are fetched and
//! replayed here, for nodes that don't run JavaScript tracers.

use std::time::Duration;

use alloy::primitives::{Address, TxHash};
use alloy::providers::Provider;
use alloy::transports::{Transport, TransportError};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use ::tracing::{debug, info};
use transfer_tracer::{StepError, TraceResult, Transfer, ValidationError, WireTransfer};

pub mod config;
mod structlogs;
pub mod tracing;

pub use config::{TraceMode, TracerConfig};

const PRECOMPILE_PLACEHOLDER: &str = "__TRANSFER_PRECOMPILE__";

/// The JavaScript tracer, with `precompile` as the transfer precompile.
pub fn transfer_tracer_js(precompile: Address) -> String {
    include_str!("transfer_tracer.js").replace(
        PRECOMPILE_PLACEHOLDER,
        &format!("0x{}", hex::encode(precompile)),
    )
}

#[derive(Debug, thiserror::Error)]
pub enum TransfersError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("malformed trace result: {0}")]
    Validation(#[from] ValidationError),
    #[error("cannot replay trace: {0}")]
    Replay(#[from] StepError),
    #[error("transaction {0} not found")]
    TransactionNotFound(TxHash),
    #[error("receipt for transaction {0} not found")]
    ReceiptNotFound(TxHash),
    #[error("receipt for contract creation {0} has no contract address")]
    MissingContractAddress(TxHash),
    #[error("cancelled")]
    Cancelled,
    #[error("trace timed out after {0:?}")]
    Timeout(Duration),
}

/// Trace `tx_hash` and return its transfers in tracer order.
///
/// Gives up with [`TransfersError::Timeout`] after
/// [`TracerConfig::timeout`], or with [`TransfersError::Cancelled`] as soon as
/// `cancel` fires.
pub async fn transaction_transfers<ProviderT, TransportT>(
    provider: &ProviderT,
    tx_hash: TxHash,
    config: &TracerConfig,
    cancel: &CancellationToken,
) -> Result<Vec<Transfer>, TransfersError>
where
    ProviderT: Provider<TransportT>,
    TransportT: Transport + Clone,
{
    let timeout = config.timeout();
    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(TransfersError::Cancelled),
        res = tokio::time::timeout(timeout, trace_transaction(provider, tx_hash, config)) => {
            res.map_err(|_| TransfersError::Timeout(timeout))??
        }
    };
    info!(
        "transaction {tx_hash} made {} transfers in block {}",
        result.transfers.len(),
        result.block
    );
    Ok(result.transfers)
}

/// The full trace result for `tx_hash`, without cancellation or a local
/// timeout. The node is still told to stop after [`TracerConfig::timeout`].
pub async fn trace_transaction<ProviderT, TransportT>(
    provider: &ProviderT,
    tx_hash: TxHash,
    config: &TracerConfig,
) -> Result<TraceResult, TransfersError>
where
    ProviderT: Provider<TransportT>,
    TransportT: Transport + Clone,
{
    let node_timeout = format!("{}s", config.trace_timeout);
    debug!("tracing {tx_hash} with {:?}", config.trace_mode);
    match config.trace_mode {
        TraceMode::JsTracer => {
            let result = provider
                .raw_request::<_, TraceResult<WireTransfer>>(
                    "debug_traceTransaction".into(),
                    (
                        tx_hash,
                        json!({
                            "tracer": transfer_tracer_js(config.transfer_precompile),
                            "timeout": node_timeout,
                        }),
                    ),
                )
                .await?;
            Ok(result.validate()?)
        }
        TraceMode::StructLogs => {
            structlogs::replay_transaction(
                provider,
                tx_hash,
                &config.precompiles(),
                &node_timeout,
            )
            .await
        }
    }
}
