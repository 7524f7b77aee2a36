use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{DEFAULT_COMPILE_TIME_LIMIT, DEFAULT_MEMORY_LIMIT_BYTES, DEFAULT_TIME_LIMIT};

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Parent of every per-job workspace directory.
    pub workspace_root: PathBuf,
    pub gnucpp_path: PathBuf,
    pub javac_path: PathBuf,
    pub java_path: PathBuf,
    pub python_path: PathBuf,
    /// Applies to each test case and to the run as a whole.
    pub time_limit: Duration,
    pub compile_time_limit: Duration,
    pub memory_limit_bytes: u64,
    pub keep_workspaces: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            workspace_root: std::env::temp_dir().join("coderunner"),
            gnucpp_path: "g++".into(),
            javac_path: "javac".into(),
            java_path: "java".into(),
            python_path: "python3".into(),
            time_limit: DEFAULT_TIME_LIMIT,
            compile_time_limit: DEFAULT_COMPILE_TIME_LIMIT,
            memory_limit_bytes: DEFAULT_MEMORY_LIMIT_BYTES,
            keep_workspaces: false,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = EngineConfig::default();
        let path = |key: &str, default: PathBuf| lookup(key).map(PathBuf::from).unwrap_or(default);
        let millis = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(default)
        };

        EngineConfig {
            workspace_root: path("JUDGE_WORKSPACE_ROOT", defaults.workspace_root),
            gnucpp_path: path("GNUCPP_PATH", defaults.gnucpp_path),
            javac_path: path("JAVAC_PATH", defaults.javac_path),
            java_path: path("JAVA_PATH", defaults.java_path),
            python_path: path("PYTHON_PATH", defaults.python_path),
            time_limit: millis("JUDGE_TIME_LIMIT_MS", defaults.time_limit),
            compile_time_limit: millis("JUDGE_COMPILE_TIME_LIMIT_MS", defaults.compile_time_limit),
            memory_limit_bytes: lookup("JUDGE_MEMORY_LIMIT_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.memory_limit_bytes),
            keep_workspaces: lookup("JUDGE_KEEP_WORKSPACES")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.keep_workspaces),
        }
    }
}
