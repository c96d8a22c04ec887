//! Classifier command builder and runner.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{ClassifierError, ClassifierResult};
use crate::invocation::Invocation;

/// Builder for classifier invocations.
///
/// The staged image path is always appended as the final argument.
#[derive(Debug, Clone)]
pub struct ClassifierCommand {
    /// Executable name or path
    program: String,
    /// Arguments placed before the image path
    args: Vec<String>,
    /// Working directory for the process
    current_dir: Option<PathBuf>,
}

impl ClassifierCommand {
    /// Create a new classifier command.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Add a leading argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple leading arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Build the full argument list for one image.
    pub fn build_args(&self, input: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.args.iter().map(OsString::from).collect();
        args.push(input.as_os_str().to_os_string());
        args
    }

    /// Render the command line for logs.
    pub fn display(&self, input: &Path) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.push(input.display().to_string());
        parts.join(" ")
    }
}

/// Runner for classifier commands with output capture and timeout.
#[derive(Debug, Clone, Default)]
pub struct ClassifierRunner {
    /// Upper bound on spawn-to-exit time
    timeout: Option<Duration>,
}

impl ClassifierRunner {
    /// Create a new runner without a timeout.
    pub fn new() -> Self {
        Self { timeout: None }
    }

    /// Set timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run the classifier on one staged image and capture its output.
    ///
    /// Returns `Ok` whenever the process exits, whatever its status; the
    /// completion policy lives in [`Invocation::into_result`]. The child is
    /// killed if the timeout fires or if this future is dropped.
    pub async fn run(&self, cmd: &ClassifierCommand, input: &Path) -> ClassifierResult<Invocation> {
        if !input.exists() {
            return Err(ClassifierError::ScratchMissing(input.to_path_buf()));
        }

        debug!("Running classifier: {}", cmd.display(input));
        let start = Instant::now();

        let mut command = Command::new(&cmd.program);
        command
            .args(cmd.build_args(input))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(ref dir) = cmd.current_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ClassifierError::ProgramNotFound(cmd.program.clone()),
            _ => ClassifierError::Spawn(e),
        })?;

        // Both pipes are drained concurrently so a chatty stderr cannot
        // block the process on a full stdout pipe (or vice versa).
        let mut stdout_task = spawn_collector(child.stdout.take());
        let mut stderr_task = spawn_collector(child.stderr.take());

        let completion = async {
            let status = child.wait().await?;
            let stdout = join_collector(&mut stdout_task).await?;
            let stderr = join_collector(&mut stderr_task).await?;
            Ok::<_, ClassifierError>((status, stdout, stderr))
        };

        let waited = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, completion)
                .await
                .map_err(|_| timeout),
            None => Ok(completion.await),
        };

        let (status, stdout, stderr) = match waited {
            Ok(outcome) => outcome?,
            Err(timeout) => {
                warn!("Classifier timed out after {:?}, killing process", timeout);
                let _ = child.kill().await;
                stdout_task.abort();
                stderr_task.abort();
                return Err(ClassifierError::Timeout(timeout));
            }
        };
        let invocation = Invocation {
            input: input.to_path_buf(),
            stdout,
            stderr,
            exit_code: status.code(),
            elapsed: start.elapsed(),
        };

        info!(
            exit_code = ?invocation.exit_code,
            elapsed_ms = invocation.elapsed.as_millis() as u64,
            stdout_bytes = invocation.stdout.len(),
            stderr_bytes = invocation.stderr.len(),
            "Classifier exited"
        );

        Ok(invocation)
    }
}

fn spawn_collector<R>(pipe: Option<R>) -> JoinHandle<std::io::Result<Vec<u8>>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf).await?;
        }
        Ok(buf)
    })
}

async fn join_collector(
    task: &mut JoinHandle<std::io::Result<Vec<u8>>>,
) -> ClassifierResult<String> {
    let bytes = task
        .await
        .map_err(|e| ClassifierError::Io(std::io::Error::other(e)))??;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Check that the classifier program can be resolved.
pub fn check_program(program: &str) -> ClassifierResult<PathBuf> {
    which::which(program).map_err(|_| ClassifierError::ProgramNotFound(program.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    use crate::invocation::OutputMode;

    fn sh(script: &str) -> ClassifierCommand {
        ClassifierCommand::new("/bin/sh").arg("-c").arg(script).arg("classifier")
    }

    fn staged(dir: &tempfile::TempDir, name: &str, body: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_command_builder_appends_input_last() {
        let cmd = ClassifierCommand::new("python").arg("ai-service/app.py");
        let args = cmd.build_args(Path::new("uploads/1.jpg"));
        assert_eq!(args, vec![OsString::from("ai-service/app.py"), OsString::from("uploads/1.jpg")]);
        assert_eq!(cmd.display(Path::new("uploads/1.jpg")), "python ai-service/app.py uploads/1.jpg");
    }

    #[tokio::test]
    async fn test_captures_stdout_and_path_argument() {
        let dir = tempfile::tempdir().unwrap();
        let input = staged(&dir, "leaf.jpg", b"jpeg");

        let invocation = assert_ok!(
            ClassifierRunner::new()
                .run(&sh(r#"printf '{"file":"%s"}' "$(basename "$1")""#), &input)
                .await
        );
        assert_eq!(invocation.exit_code, Some(0));
        assert_eq!(invocation.stdout, r#"{"file":"leaf.jpg"}"#);
        assert!(invocation.stderr.is_empty());
        assert_eq!(assert_ok!(invocation.into_result(OutputMode::Passthrough)), r#"{"file":"leaf.jpg"}"#);
    }

    #[tokio::test]
    async fn test_captures_stderr_and_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let input = staged(&dir, "leaf.png", b"png");

        let invocation = assert_ok!(
            ClassifierRunner::new()
                .run(&sh("echo out; printf 'model missing' >&2; exit 3"), &input)
                .await
        );
        assert_eq!(invocation.exit_code, Some(3));
        assert_eq!(invocation.stdout, "out\n");
        assert_eq!(invocation.stderr, "model missing");
        assert!(!invocation.succeeded());
    }

    #[tokio::test]
    async fn test_large_output_on_both_streams() {
        let dir = tempfile::tempdir().unwrap();
        let input = staged(&dir, "leaf.jpg", b"jpeg");

        // Well past a pipe buffer on each stream
        let script = "i=0; while [ $i -lt 20000 ]; do echo xxxxxxxx; echo yyyyyyyy >&2; i=$((i+1)); done";
        let invocation = assert_ok!(
            ClassifierRunner::new()
                .with_timeout(Duration::from_secs(30))
                .run(&sh(script), &input)
                .await
        );
        assert_eq!(invocation.stdout.len(), 20000 * 9);
        assert_eq!(invocation.stderr.len(), 20000 * 9);
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let dir = tempfile::tempdir().unwrap();
        let input = staged(&dir, "leaf.jpg", b"jpeg");

        let start = Instant::now();
        let err = assert_err!(
            ClassifierRunner::new()
                .with_timeout(Duration::from_millis(200))
                .run(&sh("exec sleep 10"), &input)
                .await
        );
        assert!(matches!(err, ClassifierError::Timeout(_)));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let input = staged(&dir, "leaf.jpg", b"jpeg");

        let err = assert_err!(
            ClassifierRunner::new()
                .run(&ClassifierCommand::new("rootly-no-such-classifier"), &input)
                .await
        );
        assert!(matches!(err, ClassifierError::ProgramNotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_input() {
        let err = assert_err!(
            ClassifierRunner::new()
                .run(&sh("cat \"$1\""), Path::new("/nonexistent/rootly/leaf.jpg"))
                .await
        );
        assert!(matches!(err, ClassifierError::ScratchMissing(_)));
    }

    #[test]
    fn test_check_program() {
        assert!(check_program("sh").is_ok());
        assert!(check_program("rootly-no-such-classifier").is_err());
    }
}
