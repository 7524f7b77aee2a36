use std::path::PathBuf;

use crate::core::domain::Language;

/// Failures of the engine itself, as opposed to failures of the judged code.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("workspace I/O failed on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for child process: {source}")]
    Wait {
        #[source]
        source: std::io::Error,
    },

    #[error("no runner registered for {0:?}")]
    UnsupportedLanguage(Language),

    #[error("no test cases could be attempted")]
    NoTestCases,

    #[error("test harness worker did not finish: {0}")]
    Worker(String),
}

impl EngineError {
    pub fn io<P: Into<PathBuf>>(path: P) -> impl FnOnce(std::io::Error) -> EngineError {
        let path = path.into();
        move |source| EngineError::Io { path, source }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PrepareError {
    #[error("compilation failed:\n{msg}")]
    CompilationFailed { msg: String },

    #[error("compilation exceeded its time limit")]
    CompilationTimedOut,

    #[error(transparent)]
    Engine(#[from] EngineError),
}
