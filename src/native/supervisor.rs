use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{
    constants::{PIPE_DRAIN_TIMEOUT, STDERR_CAPTURE_LIMIT},
    core::{
        domain::{ExecutionOutcome, ExitKind, Invocation, OutputSink},
        errors::EngineError,
        traits::supervisor::ProcessSupervisor,
    },
    native::limits,
};

/// Spawns children directly with fork/exec, each as the leader of its own
/// process group, and kills the whole group whenever it stops waiting early.
#[derive(Clone, Debug, Default)]
pub struct NativeSupervisor;

impl NativeSupervisor {
    pub fn new() -> Self {
        NativeSupervisor
    }
}

#[async_trait]
impl ProcessSupervisor for NativeSupervisor {
    #[tracing::instrument(skip(self, stdin, cancel), fields(program = %invocation.program.display()))]
    async fn run_once(
        &self,
        invocation: &Invocation,
        stdin: &str,
        sink: &OutputSink,
        deadline: Duration,
        cancel: CancellationToken,
    ) -> Result<ExecutionOutcome, EngineError> {
        let output_file = match sink {
            OutputSink::Capture => None,
            OutputSink::AppendTo(path) => Some(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await
                    .map_err(EngineError::io(path))?,
            ),
        };

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .current_dir(&invocation.work_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        let resource_limits = invocation.limits;
        unsafe {
            cmd.pre_exec(move || limits::apply_in_child(resource_limits));
        }

        let started = Instant::now();
        let mut child = cmd.spawn().map_err(|source| EngineError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;
        let pgid = child.id().map(|id| id as i32);
        tracing::debug!("Spawned process group {:?}", pgid);

        let input = stdin.as_bytes().to_vec();
        let stdin_pipe = child.stdin.take();
        let feeder = tokio::spawn(async move {
            let Some(mut pipe) = stdin_pipe else {
                return;
            };
            // The child may exit without reading its input.
            if let Err(e) = pipe.write_all(&input).await {
                tracing::debug!("Stopped writing stdin: {}", e);
            }
        });
        let mut stdout_task = tokio::spawn(drain_stdout(
            child.stdout.take(),
            output_file,
            invocation.limits.file_size_bytes,
        ));
        let mut stderr_task = tokio::spawn(read_capped(child.stderr.take(), STDERR_CAPTURE_LIMIT));

        let status = tokio::select! {
            status = child.wait() => Some(status),
            _ = tokio::time::sleep(deadline) => None,
            _ = cancel.cancelled() => None,
        };

        let exit = match status {
            Some(status) => {
                let status = status.map_err(|source| EngineError::Wait { source })?;
                // The leader is gone; anything it forked must not outlive it.
                if let Some(pgid) = pgid {
                    match limits::kill_group(pgid) {
                        Ok(()) => tracing::debug!("Killed leftover processes in group {}", pgid),
                        Err(e) => tracing::debug!("No leftovers in group {}: {}", pgid, e),
                    }
                }
                exit_kind(status)
            }
            None => {
                terminate(&mut child, pgid);
                child
                    .wait()
                    .await
                    .map_err(|source| EngineError::Wait { source })?;
                ExitKind::TimedOut
            }
        };
        let elapsed = started.elapsed();
        feeder.abort();

        let stdout = match (finish_drain(&mut stdout_task, "stdout").await, sink) {
            (Ok(bytes), _) => bytes,
            // Judging truncated output would turn a disk failure into a verdict.
            (Err(e), OutputSink::AppendTo(path)) => return Err(EngineError::io(path)(e)),
            (Err(e), OutputSink::Capture) => {
                tracing::warn!("Failed to drain stdout: {}", e);
                Vec::new()
            }
        };
        let stderr = finish_drain(&mut stderr_task, "stderr")
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to drain stderr: {}", e);
                Vec::new()
            });

        tracing::debug!("Process finished with {:?} after {:?}", exit, elapsed);
        Ok(ExecutionOutcome {
            exit,
            stdout,
            stderr,
            elapsed,
        })
    }
}

fn terminate(child: &mut tokio::process::Child, pgid: Option<i32>) {
    let killed = match pgid {
        Some(pgid) => limits::kill_group(pgid),
        None => Err(io::Error::from(io::ErrorKind::NotFound)),
    };
    if let Err(e) = killed {
        tracing::warn!("Failed to kill process group {:?}: {}", pgid, e);
        if let Err(e) = child.start_kill() {
            tracing::warn!("Failed to kill child: {}", e);
        }
    }
}

fn exit_kind(status: ExitStatus) -> ExitKind {
    use std::os::unix::process::ExitStatusExt;

    match (status.code(), status.signal()) {
        (Some(code), _) => ExitKind::Exited(code),
        (None, Some(signal)) => ExitKind::Signaled(signal),
        (None, None) => ExitKind::Exited(-1),
    }
}

/// Copies stdout into the sink file as it arrives, or buffers it when there
/// is no file. At most `limit` bytes reach the file; the rest is read and
/// dropped so the child never blocks on a full pipe.
async fn drain_stdout<R>(stdout: Option<R>, file: Option<File>, limit: Option<u64>) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let Some(mut stdout) = stdout else {
        return Ok(Vec::new());
    };
    match file {
        Some(mut file) => {
            let limit = limit.unwrap_or(u64::MAX);
            let copied = tokio::io::copy(&mut (&mut stdout).take(limit), &mut file).await?;
            file.flush().await?;
            if copied == limit {
                tracing::debug!("Stdout reached {} bytes, discarding the rest", limit);
                tokio::io::copy(&mut stdout, &mut tokio::io::sink()).await?;
            }
            Ok(Vec::new())
        }
        None => {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).await?;
            Ok(buf)
        }
    }
}

/// Reads to EOF but keeps at most `limit` bytes, so a noisy child can
/// neither block on a full pipe nor grow our memory.
async fn read_capped<R>(pipe: Option<R>, limit: usize) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let Some(mut pipe) = pipe else {
        return Ok(Vec::new());
    };
    let mut kept = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = pipe.read(&mut chunk).await?;
        if n == 0 {
            return Ok(kept);
        }
        let room = limit.saturating_sub(kept.len());
        kept.extend_from_slice(&chunk[..n.min(room)]);
    }
}

/// Waits briefly for a drain task. Only an I/O error from the task itself is
/// returned; a pipe held open by a stray descendant is abandoned.
async fn finish_drain(task: &mut JoinHandle<io::Result<Vec<u8>>>, name: &str) -> io::Result<Vec<u8>> {
    match tokio::time::timeout(PIPE_DRAIN_TIMEOUT, &mut *task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            tracing::warn!("{} drain task failed: {}", name, e);
            Ok(Vec::new())
        }
        Err(_) => {
            tracing::warn!("{} still open after the process exited, giving up", name);
            task.abort();
            Ok(Vec::new())
        }
    }
}
