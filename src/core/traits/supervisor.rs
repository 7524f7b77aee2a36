use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::{
    domain::{ExecutionOutcome, Invocation, OutputSink},
    errors::EngineError,
};

/// Runs one process to completion, to its deadline, or until cancelled.
///
/// Implementations must start the child as the leader of a fresh process
/// group and, whenever they stop waiting on it early, kill the whole group
/// before returning. A returned outcome means no process from that
/// invocation is still running.
#[mockall::automock]
#[async_trait::async_trait]
pub trait ProcessSupervisor: std::fmt::Debug + Send + Sync {
    async fn run_once(
        &self,
        invocation: &Invocation,
        stdin: &str,
        sink: &OutputSink,
        deadline: Duration,
        cancel: CancellationToken,
    ) -> Result<ExecutionOutcome, EngineError>;
}
