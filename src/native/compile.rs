use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::{
    domain::{ExitKind, Invocation, OutputSink},
    errors::PrepareError,
    traits::supervisor::ProcessSupervisor,
};

/// How strictly a compiler's output is judged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strictness {
    /// Only a non-zero exit fails the build.
    ExitCode,
    /// Any diagnostic on stderr fails it too.
    ExitCodeAndStderr,
}

/// Runs a compiler under the supervisor and maps its outcome onto
/// `PrepareError`. Spawn failures stay hard errors.
pub async fn run_compiler(
    supervisor: &dyn ProcessSupervisor,
    invocation: &Invocation,
    time_limit: Duration,
    strictness: Strictness,
) -> Result<(), PrepareError> {
    tracing::debug!("Start compiling: {:?}", invocation);
    let outcome = supervisor
        .run_once(
            invocation,
            "",
            &OutputSink::Capture,
            time_limit,
            CancellationToken::new(),
        )
        .await?;
    tracing::debug!("Compilation result: {:?}", outcome.exit);

    if outcome.exit == ExitKind::TimedOut {
        return Err(PrepareError::CompilationTimedOut);
    }

    let stderr_fails = strictness == Strictness::ExitCodeAndStderr && !outcome.stderr.is_empty();
    if !outcome.exit.is_success() || stderr_fails {
        let mut msg = outcome.stderr_lossy();
        if msg.is_empty() {
            msg = format!("compiler ended with {:?}", outcome.exit);
        }
        return Err(PrepareError::CompilationFailed { msg });
    }

    Ok(())
}
