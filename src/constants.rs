use std::time::Duration;

pub const CPP_SOURCE_FILE: &str = "solution.cpp";
pub const CPP_EXECUTABLE_FILE: &str = "a.out";
pub const JAVA_SOURCE_FILE: &str = "Solution.java";
pub const JAVA_MAIN_CLASS: &str = "Solution";
pub const PYTHON_SOURCE_FILE: &str = "solution.py";

pub const ACTUAL_OUTPUT_FILE: &str = "output.txt";
pub const EXPECTED_OUTPUT_FILE: &str = "expected_output.txt";

pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(2);
pub const DEFAULT_COMPILE_TIME_LIMIT: Duration = Duration::from_secs(10);
pub const DEFAULT_MEMORY_LIMIT_BYTES: u64 = 256 * 1024 * 1024;

/// How long to keep draining pipes after the child is gone.
pub const PIPE_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Ceiling on files a judged program writes, its stdout included.
pub const OUTPUT_SIZE_LIMIT_BYTES: u64 = 64 * 1024 * 1024;

/// Bytes of stderr kept per process; the rest is read and dropped.
pub const STDERR_CAPTURE_LIMIT: usize = 64 * 1024;

/// Markers runtimes print on stderr when an allocation fails.
pub const OUT_OF_MEMORY_MARKERS: &[&str] = &[
    "std::bad_alloc",
    "java.lang.OutOfMemoryError",
    "MemoryError",
];
