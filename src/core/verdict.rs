use crate::{
    constants::OUT_OF_MEMORY_MARKERS,
    core::{
        comparator::Comparison,
        domain::{ExecutionOutcome, ExitKind, Verdict},
        errors::EngineError,
    },
};

/// Everything the classifier needs to know about how a run ended.
#[derive(Clone, Debug)]
pub enum Observation<'a> {
    CompileFailed,
    NothingAttempted,
    DeadlineExpired,
    AbnormalExit(&'a ExecutionOutcome),
    Compared(Comparison),
}

pub fn classify(observation: &Observation<'_>) -> Result<Verdict, EngineError> {
    let verdict = match observation {
        Observation::CompileFailed => Verdict::CompileError,
        Observation::NothingAttempted => return Err(EngineError::NoTestCases),
        Observation::DeadlineExpired => Verdict::TimeExceeded,
        Observation::AbnormalExit(outcome) => classify_exit(outcome),
        Observation::Compared(Comparison { is_equal: true, .. }) => Verdict::Correct,
        Observation::Compared(Comparison { is_equal: false, .. }) => Verdict::Wrong,
    };
    Ok(verdict)
}

fn classify_exit(outcome: &ExecutionOutcome) -> Verdict {
    match outcome.exit {
        ExitKind::TimedOut => Verdict::TimeExceeded,
        ExitKind::Signaled(libc::SIGXCPU) => Verdict::TimeExceeded,
        // SIGKILL here was not sent by the supervisor, so it came from the
        // kernel's OOM killer or a memory cgroup.
        ExitKind::Signaled(libc::SIGKILL) => Verdict::MemoryExceeded,
        _ if reports_out_of_memory(&outcome.stderr) => Verdict::MemoryExceeded,
        // Crashes such as SIGSEGV, SIGBUS, SIGFPE and SIGXFSZ end up here.
        _ => Verdict::RuntimeError,
    }
}

fn reports_out_of_memory(stderr: &[u8]) -> bool {
    let stderr = String::from_utf8_lossy(stderr);
    OUT_OF_MEMORY_MARKERS
        .iter()
        .any(|marker| stderr.contains(marker))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn outcome(exit: ExitKind, stderr: &str) -> ExecutionOutcome {
        ExecutionOutcome {
            exit,
            stdout: Vec::new(),
            stderr: stderr.as_bytes().to_vec(),
            elapsed: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_decision_table() {
        let cases = [
            (Observation::CompileFailed, Verdict::CompileError),
            (Observation::DeadlineExpired, Verdict::TimeExceeded),
            (
                Observation::Compared(Comparison {
                    line: 4,
                    is_equal: true,
                }),
                Verdict::Correct,
            ),
            (
                Observation::Compared(Comparison {
                    line: 1,
                    is_equal: false,
                }),
                Verdict::Wrong,
            ),
        ];

        for (observation, expected) in cases {
            assert_eq!(classify(&observation).unwrap(), expected, "{observation:?}");
        }
    }

    #[test]
    fn test_nothing_attempted_is_a_hard_error() {
        assert!(matches!(
            classify(&Observation::NothingAttempted),
            Err(EngineError::NoTestCases)
        ));
    }

    #[test]
    fn test_abnormal_exits() {
        let cases = [
            (outcome(ExitKind::TimedOut, ""), Verdict::TimeExceeded),
            (outcome(ExitKind::Signaled(libc::SIGXCPU), ""), Verdict::TimeExceeded),
            (outcome(ExitKind::Signaled(libc::SIGSEGV), ""), Verdict::RuntimeError),
            (outcome(ExitKind::Signaled(libc::SIGBUS), ""), Verdict::RuntimeError),
            (outcome(ExitKind::Signaled(libc::SIGXFSZ), ""), Verdict::RuntimeError),
            (outcome(ExitKind::Signaled(libc::SIGKILL), ""), Verdict::MemoryExceeded),
            (outcome(ExitKind::Signaled(libc::SIGFPE), ""), Verdict::RuntimeError),
            (outcome(ExitKind::Exited(1), "Traceback ..."), Verdict::RuntimeError),
            (
                outcome(
                    ExitKind::Exited(1),
                    "Exception in thread \"main\" java.lang.OutOfMemoryError: Java heap space",
                ),
                Verdict::MemoryExceeded,
            ),
            (
                outcome(
                    ExitKind::Signaled(libc::SIGABRT),
                    "terminate called after throwing an instance of 'std::bad_alloc'",
                ),
                Verdict::MemoryExceeded,
            ),
        ];

        for (outcome, expected) in cases {
            assert_eq!(
                classify(&Observation::AbnormalExit(&outcome)).unwrap(),
                expected,
                "{outcome:?}"
            );
        }
    }
}
