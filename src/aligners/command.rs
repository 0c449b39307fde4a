// command.rs - External aligner invoked as a child process with a deadline

use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::traits::ExternalAligner;
use crate::error::{PhyloError, Result};

/// Placeholder replaced by the input FASTA path in argument templates
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// How often a running child is polled for exit
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Longest stderr excerpt carried in error messages
const STDERR_EXCERPT: usize = 300;

/// Aligner run as `program args...`, reading FASTA stdout
#[derive(Debug, Clone)]
pub struct CommandAligner {
    name: String,
    description: String,
    program: PathBuf,
    args: Vec<String>,
}

impl CommandAligner {
    /// Argument templates may contain `{input}`; without it the path is appended
    pub fn new(name: &str, program: impl Into<PathBuf>, args: &[&str], description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// User-supplied executable taking the FASTA path as its only argument
    pub fn custom(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let name = program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.display().to_string());
        Self {
            name,
            description: "Custom aligner executable".to_string(),
            program,
            args: vec![INPUT_PLACEHOLDER.to_string()],
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Concrete argument list for one input file
    pub fn arguments_for(&self, input: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|a| a.replace(INPUT_PLACEHOLDER, &input))
            .collect();
        if !self.args.iter().any(|a| a.contains(INPUT_PLACEHOLDER)) {
            args.push(input.into_owned());
        }
        args
    }

    fn unavailable(&self, reason: impl Into<String>) -> PhyloError {
        PhyloError::ExternalToolUnavailable {
            tool: self.name.clone(),
            reason: reason.into(),
        }
    }
}

/// Read a pipe to the end on a helper thread
fn drain<R: Read + Send + 'static>(mut reader: R) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = reader.read_to_end(&mut buffer);
        let _ = tx.send(buffer);
    });
    rx
}

/// Pipe contents, or `None` if the pipe is still open at `deadline`
fn collect(pipe: Option<Receiver<Vec<u8>>>, deadline: Instant) -> Option<Vec<u8>> {
    match pipe {
        None => Some(Vec::new()),
        Some(rx) => rx
            .recv_timeout(deadline.saturating_duration_since(Instant::now()))
            .ok(),
    }
}

/// Kill the child and, on Unix, every process in its group
fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
        // SAFETY: plain syscall; the child was spawned as leader of group `pgid`
        unsafe {
            libc::killpg(pgid, libc::SIGKILL);
        }
    }
    let _ = child.kill();
}

/// Wait for the child until `deadline`; `None` means it was killed
fn wait_with_deadline(child: &mut Child, deadline: Instant) -> std::io::Result<Option<std::process::ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            kill_tree(child);
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

impl CommandAligner {
    fn timed_out(&self, timeout: Duration) -> PhyloError {
        warn!(tool = %self.name, ?timeout, "external aligner timed out");
        PhyloError::ExternalToolTimeout {
            tool: self.name.clone(),
            timeout,
        }
    }
}

impl ExternalAligner for CommandAligner {
    fn run(&self, input: &Path, timeout: Duration) -> Result<String> {
        let args = self.arguments_for(input);
        debug!(tool = %self.name, program = %self.program.display(), ?args, "spawning external aligner");

        let mut command = Command::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // Own process group, so wrapper scripts and their workers die together
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|e| match e.kind() {
            ErrorKind::NotFound => self.unavailable(format!("executable '{}' not found", self.program.display())),
            ErrorKind::PermissionDenied => {
                self.unavailable(format!("executable '{}' is not runnable", self.program.display()))
            }
            _ => self.unavailable(format!("failed to start: {}", e)),
        })?;

        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let deadline = Instant::now() + timeout;
        let status = wait_with_deadline(&mut child, deadline)
            .map_err(|e| self.unavailable(format!("failed while waiting: {}", e)))?;
        let Some(status) = status else {
            return Err(self.timed_out(timeout));
        };

        // Background processes left by the tool would keep the pipes open
        kill_tree(&mut child);
        let (Some(stdout), Some(stderr)) = (collect(stdout, deadline), collect(stderr, deadline)) else {
            return Err(self.timed_out(timeout));
        };

        if !status.success() {
            let message: String = String::from_utf8_lossy(&stderr).trim().chars().take(STDERR_EXCERPT).collect();
            return Err(self.unavailable(format!("exited with {}: {}", status, message)));
        }

        let text = String::from_utf8(stdout).map_err(|_| self.unavailable("output is not valid UTF-8"))?;
        if text.trim().is_empty() {
            return Err(self.unavailable("produced no output"));
        }
        Ok(text)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arguments_for_placeholder() {
        let aligner = CommandAligner::new("clustalo", "clustalo", &["-i", "{input}", "--outfmt=fasta"], "");
        let args = aligner.arguments_for(Path::new("/tmp/in.fasta"));
        assert_eq!(args, vec!["-i", "/tmp/in.fasta", "--outfmt=fasta"]);

        let aligner = CommandAligner::new("mafft", "mafft", &["--auto"], "");
        let args = aligner.arguments_for(Path::new("/tmp/in.fasta"));
        assert_eq!(args, vec!["--auto", "/tmp/in.fasta"]);
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let aligner = CommandAligner::custom("/nonexistent/definitely-not-an-aligner");
        let err = aligner.run(Path::new("/tmp/in.fasta"), Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, PhyloError::ExternalToolUnavailable { .. }));
        assert!(err.is_recoverable());
        assert_eq!(aligner.name(), "definitely-not-an-aligner");
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::fs;

        /// Scripts run through `/bin/sh` so tests never exec a file still open for writing
        fn script(dir: &Path, name: &str, body: &str) -> CommandAligner {
            let path = dir.join(name);
            fs::write(&path, format!("{}\n", body)).unwrap();
            let path = path.to_string_lossy().into_owned();
            CommandAligner::new(name, "/bin/sh", &[path.as_str(), "{input}"], "test script")
        }

        #[test]
        fn test_stdout_is_returned() {
            let dir = tempfile::tempdir().unwrap();
            let tool = script(dir.path(), "echo_aligner", "cat \"$1\"");
            let input = dir.path().join("in.fasta");
            fs::write(&input, ">a\nAC-GT\n>b\nACCGT\n").unwrap();

            let output = tool.run(&input, Duration::from_secs(5)).unwrap();
            assert!(output.contains(">b"));
        }

        #[test]
        fn test_nonzero_exit_is_unavailable() {
            let dir = tempfile::tempdir().unwrap();
            let tool = script(dir.path(), "failing_aligner", "echo boom >&2; exit 3");
            let err = tool.run(Path::new("/tmp/in.fasta"), Duration::from_secs(5)).unwrap_err();
            match err {
                PhyloError::ExternalToolUnavailable { reason, .. } => assert!(reason.contains("boom")),
                other => panic!("unexpected error: {:?}", other),
            }
        }

        #[test]
        fn test_empty_output_is_unavailable() {
            let dir = tempfile::tempdir().unwrap();
            let tool = script(dir.path(), "silent_aligner", "exit 0");
            let err = tool.run(Path::new("/tmp/in.fasta"), Duration::from_secs(5)).unwrap_err();
            assert!(matches!(err, PhyloError::ExternalToolUnavailable { .. }));
        }

        #[test]
        fn test_slow_tool_times_out() {
            let dir = tempfile::tempdir().unwrap();
            let tool = script(dir.path(), "slow_aligner", "exec sleep 5");
            let start = Instant::now();
            let err = tool.run(Path::new("/tmp/in.fasta"), Duration::from_millis(200)).unwrap_err();
            assert!(matches!(err, PhyloError::ExternalToolTimeout { .. }));
            assert!(start.elapsed() < Duration::from_secs(4));
        }

        #[test]
        fn test_background_children_do_not_extend_the_call() {
            let dir = tempfile::tempdir().unwrap();
            let tool = script(dir.path(), "forking_aligner", "sleep 6 &\necho '>a'\necho ACGT\nexit 0");
            let start = Instant::now();
            let output = tool.run(Path::new("/tmp/in.fasta"), Duration::from_secs(3)).unwrap();
            assert!(output.contains("ACGT"));
            assert!(start.elapsed() < Duration::from_secs(2));
        }

        #[cfg(target_os = "linux")]
        #[test]
        fn test_timeout_kills_descendants() {
            let dir = tempfile::tempdir().unwrap();
            let pid_file = dir.path().join("worker.pid");
            let body = format!("sleep 30 &\necho $! > '{}'\nwait", pid_file.display());
            let tool = script(dir.path(), "wrapper_aligner", &body);

            let err = tool.run(Path::new("/tmp/in.fasta"), Duration::from_millis(500)).unwrap_err();
            assert!(matches!(err, PhyloError::ExternalToolTimeout { .. }));

            let pid = fs::read_to_string(&pid_file).unwrap().trim().to_string();
            let running = || {
                // Zombies awaiting reaping count as gone
                fs::read_to_string(format!("/proc/{}/stat", pid))
                    .map(|stat| stat.rsplit(") ").next().map_or(false, |rest| !rest.starts_with('Z')))
                    .unwrap_or(false)
            };
            let start = Instant::now();
            while running() && start.elapsed() < Duration::from_secs(3) {
                thread::sleep(Duration::from_millis(50));
            }
            assert!(!running(), "worker {} outlived the timeout", pid);
        }
    }
}
