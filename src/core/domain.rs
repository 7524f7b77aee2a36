use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::OUTPUT_SIZE_LIMIT_BYTES;
use crate::core::errors::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Cpp,
    Java,
    Python,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Submission {
    pub language: Language,
    pub source: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: Option<String>,
    pub expected_output: Option<String>,
}

impl TestCase {
    pub fn new(input: Option<&str>, expected_output: Option<&str>) -> Self {
        TestCase {
            input: input.map(str::to_string),
            expected_output: expected_output.map(str::to_string),
        }
    }

    pub fn stdin(&self) -> &str {
        self.input.as_deref().unwrap_or_default()
    }
}

/// One judging request as it arrives from outside the engine.
#[derive(Clone, Debug, Deserialize)]
pub struct Job {
    #[serde(flatten)]
    pub submission: Submission,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

/// What `prepare` left on disk: a binary, a class file or a script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
}

/// A fully resolved command line. The harness and the supervisor only ever
/// see this, never the language that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub work_dir: PathBuf,
    pub limits: ResourceLimits,
}

impl Invocation {
    pub fn new<P: Into<PathBuf>, W: Into<PathBuf>>(program: P, work_dir: W) -> Self {
        Invocation {
            program: program.into(),
            args: Vec::new(),
            work_dir: work_dir.into(),
            limits: ResourceLimits::default(),
        }
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// OS-level ceilings applied to the child between fork and exec.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResourceLimits {
    pub address_space_bytes: Option<u64>,
    pub cpu_seconds: Option<u64>,
    /// Largest file the child may write, and the most stdout kept per run.
    pub file_size_bytes: Option<u64>,
}

impl ResourceLimits {
    /// CPU time is the wall-clock limit rounded up plus one second, so the
    /// supervisor's deadline normally fires first.
    pub fn for_run(time_limit: Duration, address_space_bytes: Option<u64>) -> Self {
        ResourceLimits {
            address_space_bytes,
            cpu_seconds: Some(time_limit.as_secs_f64().ceil() as u64 + 1),
            file_size_bytes: Some(OUTPUT_SIZE_LIMIT_BYTES),
        }
    }
}

/// Where the supervisor sends the child's stdout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputSink {
    /// Keep it in memory and return it in the outcome.
    Capture,
    /// Append to a file as it is produced.
    AppendTo(PathBuf),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitKind {
    Exited(i32),
    Signaled(i32),
    TimedOut,
}

impl ExitKind {
    pub fn is_success(&self) -> bool {
        matches!(self, ExitKind::Exited(0))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub exit: ExitKind,
    /// Empty when stdout went to an `OutputSink::AppendTo` file.
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub elapsed: Duration,
}

impl ExecutionOutcome {
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Correct,
    Wrong,
    CompileError,
    TimeExceeded,
    MemoryExceeded,
    RuntimeError,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Correct => "CORRECT",
            Verdict::Wrong => "WRONG",
            Verdict::CompileError => "COMPILE_ERROR",
            Verdict::TimeExceeded => "TIME_EXCEEDED",
            Verdict::MemoryExceeded => "MEMORY_EXCEEDED",
            Verdict::RuntimeError => "RUNTIME_ERROR",
        };
        f.write_str(s)
    }
}

/// Successful completion of a judging run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Judgement {
    /// Index of the last test case attempted, `-1` if none was.
    pub last_attempted_index: isize,
    pub verdict: Verdict,
    /// 1-based line of the first output mismatch, for `Wrong`.
    pub mismatch_line: Option<usize>,
}

/// What the engine hands back across its boundary: a verdict or a hard
/// error, never both.
#[derive(Clone, Debug, Serialize)]
pub struct RunResult {
    pub last_attempted_index: isize,
    pub verdict: Option<Verdict>,
    pub mismatch_line: Option<usize>,
    pub hard_error: Option<String>,
    pub judged_at: chrono::DateTime<chrono::Utc>,
}

impl From<Result<Judgement, EngineError>> for RunResult {
    fn from(result: Result<Judgement, EngineError>) -> Self {
        let judged_at = chrono::Utc::now();
        match result {
            Ok(judgement) => RunResult {
                last_attempted_index: judgement.last_attempted_index,
                verdict: Some(judgement.verdict),
                mismatch_line: judgement.mismatch_line,
                hard_error: None,
                judged_at,
            },
            Err(err) => RunResult {
                last_attempted_index: -1,
                verdict: None,
                mismatch_line: None,
                hard_error: Some(err.to_string()),
                judged_at,
            },
        }
    }
}
