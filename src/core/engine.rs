use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    config::EngineConfig,
    core::{
        comparator::compare_files,
        domain::{Judgement, Language, Submission, TestCase},
        errors::{EngineError, PrepareError},
        harness::{HarnessOutcome, TestHarness},
        traits::{runner::LanguageRunner, supervisor::ProcessSupervisor},
        verdict::{Observation, classify},
        workspace::Workspace,
    },
};

/// Judges one submission at a time per call; calls may run concurrently
/// because each gets its own workspace.
#[derive(Clone, Debug)]
pub struct Engine {
    config: EngineConfig,
    runners: HashMap<Language, Arc<dyn LanguageRunner>>,
    harness: TestHarness,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        supervisor: Arc<dyn ProcessSupervisor>,
        runners: Vec<Arc<dyn LanguageRunner>>,
    ) -> Self {
        let harness = TestHarness::new(supervisor, config.time_limit, config.time_limit);
        let runners = runners
            .into_iter()
            .map(|runner| (runner.language(), runner))
            .collect();
        Engine {
            config,
            runners,
            harness,
        }
    }

    /// Judges in a fresh workspace under the configured root.
    pub async fn judge(
        &self,
        submission: &Submission,
        test_cases: &[TestCase],
    ) -> Result<Judgement, EngineError> {
        let mut workspace = Workspace::create(&self.config.workspace_root).await?;
        if self.config.keep_workspaces {
            workspace = workspace.keep();
        }
        self.judge_in(&workspace, submission, test_cases).await
    }

    /// Judges in a workspace the caller picked. The caller must not hand the
    /// same workspace to two concurrent calls.
    #[tracing::instrument(
        skip_all,
        fields(workspace = %workspace.id(), language = ?submission.language, cases = test_cases.len())
    )]
    pub async fn judge_in(
        &self,
        workspace: &Workspace,
        submission: &Submission,
        test_cases: &[TestCase],
    ) -> Result<Judgement, EngineError> {
        let runner = self
            .runners
            .get(&submission.language)
            .ok_or(EngineError::UnsupportedLanguage(submission.language))?;

        workspace.reset_actual_output().await?;
        workspace.write_expected_output(test_cases).await?;

        let artifact = match runner.prepare(&submission.source, workspace).await {
            Ok(artifact) => artifact,
            Err(PrepareError::Engine(e)) => return Err(e),
            Err(e) => {
                tracing::info!("Rejected at compile step: {}", e);
                return Ok(Judgement {
                    last_attempted_index: -1,
                    verdict: classify(&Observation::CompileFailed)?,
                    mismatch_line: None,
                });
            }
        };

        let invocation = runner.invocation(&artifact, workspace);
        let report = self
            .harness
            .execute(&invocation, test_cases, &workspace.actual_output_path())
            .await?;

        let mut mismatch_line = None;
        let verdict = match &report.outcome {
            HarnessOutcome::Completed if report.last_attempted_index < 0 => {
                classify(&Observation::NothingAttempted)?
            }
            HarnessOutcome::Completed => {
                let comparison = compare_files(
                    &workspace.actual_output_path(),
                    &workspace.expected_output_path(),
                )
                .await?;
                if !comparison.is_equal {
                    mismatch_line = Some(comparison.line);
                }
                classify(&Observation::Compared(comparison))?
            }
            HarnessOutcome::Failed(outcome) => classify(&Observation::AbnormalExit(outcome))?,
            HarnessOutcome::DeadlineExpired => classify(&Observation::DeadlineExpired)?,
        };

        tracing::info!(
            "Judged: {} after test case {}",
            verdict,
            report.last_attempted_index
        );
        Ok(Judgement {
            last_attempted_index: report.last_attempted_index,
            verdict,
            mismatch_line,
        })
    }
}
