//! Connection, thread and turn options.
//!
//! The any-typed fields (`approval_policy`, `sandbox`, `effort`, ...) take a
//! [`serde_json::Value`] so callers can pass either one of the
//! [`option_values`](crate::option_values) strings or a structured policy
//! object. A JSON `null` is treated the same as leaving the field unset.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use codex_client::{ClientConfig, ServerRequestHandler};
use codex_protocol::types::{
    ClientInfo, ThreadResumeParams, ThreadStartParams, TurnStartParams, UserInput,
};
use codex_protocol::{JsonError, normalize_field};
use codex_transport::{LineTransport, ProcessConfig, StderrSink};
use serde_json::{Map, Value};
use tracing::Span;

/// Default bound on the initialize handshake
pub const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(30);

/// How [`Codex::connect`](crate::Codex::connect) reaches the app-server.
#[derive(Debug)]
pub struct Options {
    /// Use this transport instead of spawning a process
    pub transport: Option<Arc<dyn LineTransport>>,
    /// How to launch the app-server when no transport is given
    pub spawn: SpawnOptions,
    /// Identity sent with `initialize`; a default identity is used when unset
    pub client_info: Option<ClientInfo>,
    /// Answers approval requests from the app-server
    pub approval_handler: Option<Arc<dyn ServerRequestHandler>>,
    /// Bound on `initialize` plus `initialized`; `None` waits indefinitely
    pub init_timeout: Option<Duration>,
    /// Client core settings
    pub client: ClientConfig,
    /// Span the client's events are recorded under
    pub span: Span,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            transport: None,
            spawn: SpawnOptions::default(),
            client_info: None,
            approval_handler: None,
            init_timeout: Some(DEFAULT_INIT_TIMEOUT),
            client: ClientConfig::default(),
            span: Span::none(),
        }
    }
}

impl Options {
    /// Talk over `transport` instead of spawning the app-server
    #[must_use]
    pub fn with_transport<T: LineTransport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Set the spawn options
    #[must_use]
    pub fn with_spawn(mut self, spawn: SpawnOptions) -> Self {
        self.spawn = spawn;
        self
    }

    /// Set the client identity
    #[must_use]
    pub fn with_client_info(mut self, info: ClientInfo) -> Self {
        self.client_info = Some(info);
        self
    }

    /// Install an approval handler
    #[must_use]
    pub fn with_approval_handler(mut self, handler: Arc<dyn ServerRequestHandler>) -> Self {
        self.approval_handler = Some(handler);
        self
    }

    /// Set or clear the initialize bound
    #[must_use]
    pub fn with_init_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.init_timeout = timeout;
        self
    }

    /// Set the client core configuration
    #[must_use]
    pub fn with_client_config(mut self, config: ClientConfig) -> Self {
        self.client = config;
        self
    }

    /// Record client events under `span`
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

/// Launch settings for `codex app-server`.
#[derive(Debug)]
pub struct SpawnOptions {
    /// Path to the codex binary
    pub codex_path: String,
    /// Each entry is passed as `--config <entry>`
    pub config_overrides: Vec<String>,
    /// Appended after the overrides
    pub extra_args: Vec<String>,
    /// Working directory of the child
    pub working_directory: Option<PathBuf>,
    /// Where the child's stderr goes
    pub stderr: StderrSink,
}

impl Default for SpawnOptions {
    fn default() -> Self {
        Self {
            codex_path: "codex".to_string(),
            config_overrides: Vec::new(),
            extra_args: Vec::new(),
            working_directory: None,
            stderr: StderrSink::Inherit,
        }
    }
}

impl SpawnOptions {
    /// Use the codex binary at `path`
    #[must_use]
    pub fn with_codex_path(mut self, path: impl Into<String>) -> Self {
        self.codex_path = path.into();
        self
    }

    /// Add a `--config key=value` override
    #[must_use]
    pub fn with_config_override(mut self, override_: impl Into<String>) -> Self {
        self.config_overrides.push(override_.into());
        self
    }

    /// Append a raw argument
    #[must_use]
    pub fn with_extra_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Route the child's stderr
    #[must_use]
    pub fn with_stderr(mut self, stderr: StderrSink) -> Self {
        self.stderr = stderr;
        self
    }

    /// `app-server`, the overrides, then the extra arguments.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["app-server".to_string()];
        for override_ in &self.config_overrides {
            args.push("--config".to_string());
            args.push(override_.clone());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// The process configuration `Codex::connect` would spawn with.
    pub fn into_process_config(self) -> ProcessConfig {
        let args = self.args();
        let path = if self.codex_path.is_empty() {
            "codex".to_string()
        } else {
            self.codex_path
        };
        let mut config = ProcessConfig::new(path)
            .with_args(args)
            .with_stderr(self.stderr);
        if let Some(dir) = self.working_directory {
            config = config.with_working_directory(dir);
        }
        config
    }
}

/// Options for `thread/start`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreadStartOptions {
    /// Model override
    pub model: Option<String>,
    /// Working directory for the thread
    pub cwd: Option<String>,
    /// Sent as `approvalPolicy`
    pub approval_policy: Option<Value>,
    /// Sent as `sandbox`
    pub sandbox: Option<Value>,
    /// Config overrides
    pub config: Option<Map<String, Value>>,
    /// Replaces the built-in instructions
    pub base_instructions: Option<String>,
    /// Extra developer instructions
    pub developer_instructions: Option<String>,
    /// Ask the server for raw model events
    pub experimental_raw_events: bool,
}

impl ThreadStartOptions {
    /// Set the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the working directory
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Set the approval policy
    #[must_use]
    pub fn with_approval_policy(mut self, policy: impl Into<Value>) -> Self {
        self.approval_policy = Some(policy.into());
        self
    }

    /// Set the sandbox
    #[must_use]
    pub fn with_sandbox(mut self, sandbox: impl Into<Value>) -> Self {
        self.sandbox = Some(sandbox.into());
        self
    }

    /// Build the wire params.
    ///
    /// # Errors
    ///
    /// An option value that cannot be serialized, labelled with its wire name.
    pub fn to_params(&self) -> Result<ThreadStartParams, JsonError> {
        Ok(ThreadStartParams {
            model: non_empty(&self.model),
            cwd: non_empty(&self.cwd),
            approval_policy: normalize_field("approvalPolicy", self.approval_policy.as_ref())?,
            sandbox: normalize_field("sandbox", self.sandbox.as_ref())?,
            config: self.config.clone(),
            base_instructions: non_empty(&self.base_instructions),
            developer_instructions: non_empty(&self.developer_instructions),
            experimental_raw_events: self.experimental_raw_events,
        })
    }
}

/// Options for `thread/resume`.
///
/// The app-server resumes from `history` first, then `path`, then `thread_id`.
/// `history` and `path` are unstable server APIs; prefer `thread_id`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreadResumeOptions {
    /// Persisted thread to resume
    pub thread_id: String,
    /// In-memory history entries
    pub history: Vec<Value>,
    /// Rollout file to resume from
    pub path: Option<String>,
    /// Model override
    pub model: Option<String>,
    /// Model provider override
    pub model_provider: Option<String>,
    /// Working directory
    pub cwd: Option<String>,
    /// Sent as `approvalPolicy`
    pub approval_policy: Option<Value>,
    /// Sent as `sandbox`
    pub sandbox: Option<Value>,
    /// Config overrides
    pub config: Option<Map<String, Value>>,
    /// Replaces the built-in instructions
    pub base_instructions: Option<String>,
    /// Extra developer instructions
    pub developer_instructions: Option<String>,
}

impl ThreadResumeOptions {
    /// Resume the persisted thread `id`
    pub fn thread(id: impl Into<String>) -> Self {
        Self {
            thread_id: id.into(),
            ..Self::default()
        }
    }

    /// Build the wire params. `null` history entries are kept as `null`.
    ///
    /// # Errors
    ///
    /// An option value that cannot be serialized, labelled with its wire name.
    pub fn to_params(&self) -> Result<ThreadResumeParams, JsonError> {
        let history = if self.history.is_empty() {
            None
        } else {
            let entries = self
                .history
                .iter()
                .map(|entry| normalize_field("history", Some(entry)))
                .collect::<Result<Vec<_>, _>>()?;
            Some(entries)
        };

        Ok(ThreadResumeParams {
            thread_id: self.thread_id.clone(),
            history,
            path: non_empty(&self.path),
            model: non_empty(&self.model),
            model_provider: non_empty(&self.model_provider),
            cwd: non_empty(&self.cwd),
            approval_policy: normalize_field("approvalPolicy", self.approval_policy.as_ref())?,
            sandbox: normalize_field("sandbox", self.sandbox.as_ref())?,
            config: self.config.clone(),
            base_instructions: non_empty(&self.base_instructions),
            developer_instructions: non_empty(&self.developer_instructions),
        })
    }
}

/// Per-turn overrides for `turn/start`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnOptions {
    /// Working directory
    pub cwd: Option<String>,
    /// Sent as `approvalPolicy`
    pub approval_policy: Option<Value>,
    /// Sent as `sandboxPolicy`
    pub sandbox_policy: Option<Value>,
    /// Model override
    pub model: Option<String>,
    /// Reasoning effort
    pub effort: Option<Value>,
    /// Reasoning summary mode
    pub summary: Option<Value>,
    /// JSON schema the final message must satisfy
    pub output_schema: Option<Value>,
    /// Collaboration mode
    pub collaboration_mode: Option<Value>,
}

impl TurnOptions {
    /// Constrain the final response to `schema`
    #[must_use]
    pub fn with_output_schema(mut self, schema: Value) -> Self {
        self.output_schema = Some(schema);
        self
    }

    /// Set the reasoning effort
    #[must_use]
    pub fn with_effort(mut self, effort: impl Into<Value>) -> Self {
        self.effort = Some(effort.into());
        self
    }
}

/// Build `turn/start` params for `thread_id`.
///
/// # Errors
///
/// An option value that cannot be serialized, labelled with its wire name.
pub fn build_turn_params(
    thread_id: &str,
    input: Vec<UserInput>,
    options: Option<&TurnOptions>,
) -> Result<TurnStartParams, JsonError> {
    let mut params = TurnStartParams {
        thread_id: thread_id.to_string(),
        input,
        ..TurnStartParams::default()
    };
    let Some(opts) = options else {
        return Ok(params);
    };

    params.cwd = non_empty(&opts.cwd);
    params.approval_policy = normalize_field("approvalPolicy", opts.approval_policy.as_ref())?;
    params.sandbox_policy = normalize_field("sandboxPolicy", opts.sandbox_policy.as_ref())?;
    params.model = non_empty(&opts.model);
    params.effort = normalize_field("effort", opts.effort.as_ref())?;
    params.summary = normalize_field("summary", opts.summary.as_ref())?;
    params.output_schema = normalize_field("outputSchema", opts.output_schema.as_ref())?;
    params.collaboration_mode =
        normalize_field("collaborationMode", opts.collaboration_mode.as_ref())?;
    Ok(params)
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|s| !s.is_empty()).cloned()
}
