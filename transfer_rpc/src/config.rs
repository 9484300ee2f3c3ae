use std::time::Duration;

use alloy::primitives::Address;
use clap::{Args, ValueEnum};
use transfer_tracer::{Precompiles, TRANSFER_PRECOMPILE};

const HELP_HEADING: &str = "Transfer tracer options";

/// How the trace is produced.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TraceMode {
    /// Run the transfer tracer on the node.
    #[default]
    JsTracer,
    /// Fetch the node's struct logs and run the tracer locally.
    StructLogs,
}

/// Options for tracing transfers, to be flattened into a host's CLI.
#[derive(Args, Clone, Debug, PartialEq, Eq)]
pub struct TracerConfig {
    /// Address of the native transfer precompile.
    #[arg(long, env = "TRANSFER_TRACER_PRECOMPILE", help_heading = HELP_HEADING, default_value_t = TRANSFER_PRECOMPILE)]
    pub transfer_precompile: Address,
    /// Give up on a trace after this many seconds. Applies on the node as
    /// well as locally.
    #[arg(long, env = "TRANSFER_TRACER_TIMEOUT", help_heading = HELP_HEADING, default_value_t = 30)]
    pub trace_timeout: u64,
    /// Where the tracer runs.
    #[arg(long, env = "TRANSFER_TRACER_MODE", help_heading = HELP_HEADING, value_enum, default_value_t = TraceMode::JsTracer)]
    pub trace_mode: TraceMode,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            transfer_precompile: TRANSFER_PRECOMPILE,
            trace_timeout: 30,
            trace_mode: TraceMode::default(),
        }
    }
}

impl TracerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.trace_timeout)
    }

    pub fn precompiles(&self) -> Precompiles {
        Precompiles::new(self.transfer_precompile)
    }
}
