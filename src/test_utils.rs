use std::path::{Path, PathBuf};
use std::time::Duration;

use uuid::Uuid;

/// A `/tmp/coderunner_{uuid}` directory removed with all of its contents on
/// drop. Nothing is created until a test asks for it.
pub struct TempRoot {
    path: PathBuf,
}

impl TempRoot {
    pub fn new() -> Self {
        TempRoot {
            path: PathBuf::from(format!("/tmp/coderunner_{}", Uuid::new_v4())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempRoot {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// True if the binary can be started at all. Toolchain tests skip otherwise.
pub fn tool_available<P: AsRef<Path>>(program: P, version_flag: &str) -> bool {
    let available = std::process::Command::new(program.as_ref())
        .arg(version_flag)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok();
    if !available {
        println!("Skipping: {} is not installed", program.as_ref().display());
    }
    available
}

/// A pid counts as gone once it has no /proc entry or is a zombie.
pub fn process_alive(pid: i32) -> bool {
    let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    let state = stat
        .rsplit_once(')')
        .and_then(|(_, rest)| rest.trim_start().chars().next());
    !matches!(state, Some('Z') | Some('X') | None)
}

pub async fn wait_until_gone(pid: i32) -> bool {
    for _ in 0..50 {
        if !process_alive(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
