use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicIsize, Ordering};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::core::{
    domain::{ExecutionOutcome, Invocation, OutputSink, TestCase},
    errors::EngineError,
    traits::supervisor::ProcessSupervisor,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HarnessOutcome {
    /// Every test case exited cleanly.
    Completed,
    /// The test case at `last_attempted_index` did not.
    Failed(ExecutionOutcome),
    /// The overall deadline fired before the worker finished.
    DeadlineExpired,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HarnessReport {
    pub last_attempted_index: isize,
    pub outcome: HarnessOutcome,
}

/// Runs test cases in order, one fresh process each, and stops at the first
/// one that does not exit cleanly.
#[derive(Clone, Debug)]
pub struct TestHarness {
    supervisor: Arc<dyn ProcessSupervisor>,
    case_limit: Duration,
    overall_limit: Duration,
}

impl TestHarness {
    pub fn new(
        supervisor: Arc<dyn ProcessSupervisor>,
        case_limit: Duration,
        overall_limit: Duration,
    ) -> Self {
        TestHarness {
            supervisor,
            case_limit,
            overall_limit,
        }
    }

    /// Races the per-case loop against the overall deadline. When the
    /// deadline wins, the in-flight process group is killed and the worker
    /// has finished before this returns.
    #[tracing::instrument(skip_all, fields(program = %invocation.program.display(), cases = test_cases.len()))]
    pub async fn execute(
        &self,
        invocation: &Invocation,
        test_cases: &[TestCase],
        output_path: &Path,
    ) -> Result<HarnessReport, EngineError> {
        let progress = Arc::new(AtomicIsize::new(-1));
        let cancel = CancellationToken::new();
        let (done_tx, mut done_rx) = oneshot::channel();

        let worker = Worker {
            supervisor: self.supervisor.clone(),
            invocation: invocation.clone(),
            test_cases: test_cases.to_vec(),
            sink: OutputSink::AppendTo(output_path.to_path_buf()),
            case_limit: self.case_limit,
            budget_end: Instant::now() + self.overall_limit,
            progress: progress.clone(),
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(async move {
            let _ = done_tx.send(worker.run().await);
        });

        let finished = tokio::select! {
            result = &mut done_rx => Some(result),
            _ = tokio::time::sleep(self.overall_limit) => None,
        };

        if finished.is_none() {
            tracing::warn!("Overall deadline of {:?} expired, cancelling worker", self.overall_limit);
            cancel.cancel();
        }

        handle
            .await
            .map_err(|e| EngineError::Worker(e.to_string()))?;

        match finished {
            Some(Ok(result)) => result,
            Some(Err(_)) => Err(EngineError::Worker("worker dropped its result".to_string())),
            None => {
                if let Ok(Err(e)) = done_rx.try_recv() {
                    return Err(e);
                }
                Ok(HarnessReport {
                    last_attempted_index: progress.load(Ordering::SeqCst),
                    outcome: HarnessOutcome::DeadlineExpired,
                })
            }
        }
    }
}

struct Worker {
    supervisor: Arc<dyn ProcessSupervisor>,
    invocation: Invocation,
    test_cases: Vec<TestCase>,
    sink: OutputSink,
    case_limit: Duration,
    budget_end: Instant,
    progress: Arc<AtomicIsize>,
    cancel: CancellationToken,
}

impl Worker {
    async fn run(self) -> Result<HarnessReport, EngineError> {
        for (index, test_case) in self.test_cases.iter().enumerate() {
            let remaining = self.budget_end.saturating_duration_since(Instant::now());
            if self.cancel.is_cancelled() || remaining.is_zero() {
                return Ok(HarnessReport {
                    last_attempted_index: index as isize - 1,
                    outcome: HarnessOutcome::DeadlineExpired,
                });
            }

            self.progress.store(index as isize, Ordering::SeqCst);
            let deadline = self.case_limit.min(remaining);
            tracing::debug!("Running test case {} with deadline {:?}", index, deadline);

            let outcome = self
                .supervisor
                .run_once(
                    &self.invocation,
                    test_case.stdin(),
                    &self.sink,
                    deadline,
                    self.cancel.child_token(),
                )
                .await?;

            if !outcome.exit.is_success() {
                tracing::info!("Test case {} ended with {:?}", index, outcome.exit);
                return Ok(HarnessReport {
                    last_attempted_index: index as isize,
                    outcome: HarnessOutcome::Failed(outcome),
                });
            }
        }

        Ok(HarnessReport {
            last_attempted_index: self.test_cases.len() as isize - 1,
            outcome: HarnessOutcome::Completed,
        })
    }
}
