//! Child process transport.
//!
//! Spawns a program, speaks line-delimited JSON over its stdin/stdout, and
//! routes its stderr to a [`StderrSink`]. The process lives until
//! [`LineTransport::close`] is called or the transport is dropped; no caller
//! scope other than that controls it.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWrite, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::Mutex as TokioMutex;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::error::{TransportError, TransportResult};
use crate::lines::{DEFAULT_MAX_LINE_LENGTH, LineIo};
use crate::traits::LineTransport;

/// Where the child's standard error goes.
#[derive(Default)]
pub enum StderrSink {
    /// Share the parent's stderr
    #[default]
    Inherit,
    /// Discard it
    Discard,
    /// Emit each line as a `debug!` event
    Log,
    /// Copy it into the given writer
    Writer(Box<dyn AsyncWrite + Send + Unpin>),
}

impl fmt::Debug for StderrSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inherit => f.write_str("Inherit"),
            Self::Discard => f.write_str("Discard"),
            Self::Log => f.write_str("Log"),
            Self::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}

/// Configuration for [`ProcessTransport`]
#[derive(Debug)]
pub struct ProcessConfig {
    /// Program to execute
    pub program: String,

    /// Arguments to pass to the program
    pub args: Vec<String>,

    /// Working directory for the process
    pub working_directory: Option<PathBuf>,

    /// Extra environment variables
    pub environment: Vec<(String, String)>,

    /// Standard error destination
    pub stderr: StderrSink,

    /// How long `close` waits for the process to exit after the kill signal
    pub shutdown_timeout: Duration,

    /// Maximum line length in bytes
    pub max_line_length: usize,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            program: String::new(),
            args: Vec::new(),
            working_directory: None,
            environment: Vec::new(),
            stderr: StderrSink::default(),
            shutdown_timeout: Duration::from_secs(5),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

impl ProcessConfig {
    /// Configuration for `program` with default settings
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Set the argument list
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the working directory
    #[must_use]
    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    /// Add an environment variable
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.push((key.into(), value.into()));
        self
    }

    /// Set the stderr destination
    #[must_use]
    pub fn with_stderr(mut self, stderr: StderrSink) -> Self {
        self.stderr = stderr;
        self
    }

    /// Set the shutdown timeout
    #[must_use]
    pub fn with_shutdown_timeout(mut self, shutdown_timeout: Duration) -> Self {
        self.shutdown_timeout = shutdown_timeout;
        self
    }

    /// Set the maximum line length
    #[must_use]
    pub fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }
}

/// Line transport over a spawned child's stdio.
#[derive(Debug)]
pub struct ProcessTransport {
    program: String,
    pid: Option<u32>,
    io: LineIo,
    child: TokioMutex<Option<Child>>,
    shutdown_timeout: Duration,
}

impl ProcessTransport {
    /// Spawn the configured program.
    ///
    /// Must be called inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// [`TransportError::ConfigurationError`] for an empty program,
    /// [`TransportError::SpawnFailed`] when the OS refuses to start it.
    pub fn spawn(config: ProcessConfig) -> TransportResult<Self> {
        if config.program.is_empty() {
            return Err(TransportError::ConfigurationError(
                "program path is empty".to_string(),
            ));
        }

        info!(program = %config.program, args = ?config.args, "starting child process");

        let stderr_stdio = match config.stderr {
            StderrSink::Inherit => Stdio::inherit(),
            StderrSink::Discard => Stdio::null(),
            StderrSink::Log | StderrSink::Writer(_) => Stdio::piped(),
        };

        let mut cmd = Command::new(&config.program);
        cmd.args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(stderr_stdio)
            .kill_on_drop(true);

        if let Some(ref dir) = config.working_directory {
            cmd.current_dir(dir);
        }
        for (key, value) in &config.environment {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|e| {
            error!(program = %config.program, error = %e, "failed to spawn child process");
            TransportError::SpawnFailed(format!("{}: {e}", config.program))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransportError::SpawnFailed("failed to get stdin handle".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TransportError::SpawnFailed("failed to get stdout handle".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            forward_stderr(stderr, config.stderr);
        }

        let pid = child.id();
        debug!(pid = ?pid, "child process started");

        Ok(Self {
            program: config.program,
            pid,
            io: LineIo::new(Box::new(stdout), Box::new(stdin), config.max_line_length),
            child: TokioMutex::new(Some(child)),
            shutdown_timeout: config.shutdown_timeout,
        })
    }

    /// OS process id, if the process was still running at spawn time
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// True until the process has been reaped by `close`
    pub async fn is_running(&self) -> bool {
        let mut guard = self.child.lock().await;
        match guard.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }
}

fn forward_stderr(stderr: ChildStderr, sink: StderrSink) {
    match sink {
        StderrSink::Log => {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("child process stderr: {}", line);
                }
                debug!("stderr reader task completed");
            });
        }
        StderrSink::Writer(mut writer) => {
            tokio::spawn(async move {
                let mut stderr = stderr;
                if let Err(e) = tokio::io::copy(&mut stderr, &mut writer).await {
                    debug!(error = %e, "stderr forwarding stopped");
                }
            });
        }
        StderrSink::Inherit | StderrSink::Discard => {}
    }
}

#[async_trait]
impl LineTransport for ProcessTransport {
    async fn read_line(&self) -> TransportResult<String> {
        self.io.read_line().await
    }

    async fn write_line(&self, line: &str) -> TransportResult<()> {
        self.io.write_line(line).await
    }

    async fn close(&self) -> TransportResult<()> {
        if !self.io.is_closed() {
            info!(program = %self.program, "stopping child process");
        }
        self.io.close().await?;

        // Held until the child is reaped so a concurrent close waits for it.
        let mut guard = self.child.lock().await;
        let Some(mut child) = guard.take() else {
            return Ok(());
        };
        if let Err(e) = child.start_kill() {
            warn!("failed to send kill signal to child process: {}", e);
        }
        match timeout(self.shutdown_timeout, child.wait()).await {
            Ok(Ok(status)) => debug!(%status, "child process exited"),
            Ok(Err(e)) => error!("failed to wait for child process exit: {}", e),
            Err(_) => {
                warn!("child process shutdown timed out, forcing kill");
                if let Err(e) = child.kill().await {
                    error!("failed to force kill child process: {}", e);
                }
            }
        }
        Ok(())
    }
}
