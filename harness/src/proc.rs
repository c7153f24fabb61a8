use crate::error::{self, Error, Result};
use log::{debug, trace};
use snafu::ResultExt;
use std::ffi::{OsStr, OsString};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// How long to wait between `try_wait` checks on a deadlined child.
const REAP_INTERVAL: Duration = Duration::from_millis(50);

/// Captured output of a finished external command.
#[derive(Debug, Clone)]
pub struct CmdOutput {
    pub stdout: String,
    pub stderr: String,
}

/// The external CLIs the harness drives, and how to drive them.
///
/// By default `helm` and `kubectl` are found via `$PATH`. Tests point these at
/// stub executables instead of a real cluster.
#[derive(Debug, Clone)]
pub struct Tools {
    helm: PathBuf,
    kubectl: PathBuf,
    work_dir: Option<PathBuf>,
    deadline: Option<Duration>,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            helm: PathBuf::from("helm"),
            kubectl: PathBuf::from("kubectl"),
            work_dir: None,
            deadline: None,
        }
    }
}

impl Tools {
    pub fn new() -> Self {
        Self::default()
    }

    /// The path or name of the `helm` binary.
    pub fn helm_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.helm = path.into();
        self
    }

    /// The path or name of the `kubectl` binary.
    pub fn kubectl_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.kubectl = path.into();
        self
    }

    /// The working directory for spawned commands, e.g. the charts checkout.
    pub fn work_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// A hard deadline for each spawned command. On expiry the child is
    /// killed and the invocation fails with [`Error::Timeout`], so a hung
    /// `--wait` cannot orphan processes.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Runs the deployment-lifecycle tool with the given arguments.
    pub fn helm<I, S>(&self, args: I) -> Result<CmdOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.run(&self.helm, args)
    }

    /// Runs the cluster-query tool with the given arguments.
    pub fn kubectl<I, S>(&self, args: I) -> Result<CmdOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.run(&self.kubectl, args)
    }

    fn run<I, S>(&self, program: &Path, args: I) -> Result<CmdOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<OsString> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();
        let what = invocation_name(program, &args);
        debug!("Running '{}'", what);

        let mut command = Command::new(program);
        command.args(&args);
        if let Some(dir) = &self.work_dir {
            command.current_dir(dir);
        }

        let (status, stdout, stderr) = match self.deadline {
            None => {
                let output = command
                    .output()
                    .context(error::ProcessSnafu { what: what.clone() })?;
                (output.status, output.stdout, output.stderr)
            }
            Some(deadline) => run_with_deadline(command, deadline, &what)?,
        };

        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        let stderr = String::from_utf8_lossy(&stderr).into_owned();
        trace!("'{}' stdout:\n{}", what, stdout);
        trace!("'{}' stderr:\n{}", what, stderr);

        if !status.success() {
            return error::CommandFailedSnafu {
                what,
                exit: status.code().unwrap_or(1),
                stdout,
                stderr,
            }
            .fail();
        }
        Ok(CmdOutput { stdout, stderr })
    }
}

/// Spawns the command with piped output, kills it if it outlives `deadline`,
/// and returns its status and both output streams. The streams are drained on
/// reader threads so a chatty child cannot deadlock on a full pipe.
fn run_with_deadline(
    mut command: Command,
    deadline: Duration,
    what: &str,
) -> Result<(ExitStatus, Vec<u8>, Vec<u8>)> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = command.spawn().context(error::ProcessSnafu { what })?;
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let stdout_reader = thread::spawn(move || drain(stdout));
    let stderr_reader = thread::spawn(move || drain(stderr));

    let start = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait().context(error::ProcessSnafu { what })? {
            break Some(status);
        }
        if start.elapsed() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            break None;
        }
        thread::sleep(REAP_INTERVAL);
    };

    let stdout = stdout_reader.join().unwrap_or_default();
    let stderr = stderr_reader.join().unwrap_or_default();
    match status {
        Some(status) => Ok((status, stdout, stderr)),
        None => error::TimeoutSnafu {
            what: format!("'{}' to exit", what),
            timeout: deadline,
        }
        .fail(),
    }
}

fn drain<R: Read>(reader: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        let _ = reader.read_to_end(&mut buf);
    }
    buf
}

/// A short human-readable name for an invocation, e.g. `helm install`.
fn invocation_name(program: &Path, args: &[OsString]) -> String {
    let program = program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.to_string_lossy().into_owned());
    match args.first() {
        Some(verb) => format!("{} {}", program, verb.to_string_lossy()),
        None => program,
    }
}
