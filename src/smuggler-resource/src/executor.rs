//! Runs a command definition as a child process and captures what it did.

use crate::environment::Environment;
use smuggler_core::CommandDefinition;
use std::borrow::Cow;
use std::io::{Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;

/// Exit status recorded when the process could not be started at all.
pub const SPAWN_FAILURE_STATUS: i32 = -1;

/// Outcome of a single [`execute`] call.
#[derive(Debug, Default)]
pub struct ExecutionResult {
    /// The definition that was run; `None` when nothing was spawned.
    pub command: Option<CommandDefinition>,
    /// Stdout and stderr, interleaved in the order the child wrote them.
    pub combined_output: Vec<u8>,
    pub exit_status: i32,
    /// Why the process could not be started or waited on.
    pub spawn_error: Option<std::io::Error>,
}

impl ExecutionResult {
    /// The no-op result for an undefined command.
    pub fn skipped() -> Self {
        Self::default()
    }

    pub fn success(&self) -> bool {
        self.exit_status == 0 && self.spawn_error.is_none()
    }

    pub fn was_spawned(&self) -> bool {
        self.command.is_some()
    }

    pub fn output_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.combined_output)
    }

    /// One-line description of a failed run.
    pub fn failure_summary(&self) -> String {
        let name = self
            .command
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or_default();
        match &self.spawn_error {
            Some(err) => format!("command '{name}' could not be run: {err}"),
            None => format!("command '{name}' exited with status {}", self.exit_status),
        }
    }
}

/// Runs `definition` with exactly `env` as its environment.
///
/// An undefined definition spawns nothing and succeeds. Failure to start the
/// process is reported through the result, never as a panic or `Err`.
pub fn execute(
    definition: &CommandDefinition,
    env: &Environment,
    stdin: Option<&[u8]>,
) -> ExecutionResult {
    if !definition.is_defined() {
        tracing::debug!("No command defined, nothing to run");
        return ExecutionResult::skipped();
    }

    tracing::info!(command = %definition.name, "Running '{}'", definition.describe());
    for (key, value) in env.resolved() {
        let key = key.to_string_lossy();
        if key.starts_with(crate::environment::ENV_PREFIX) {
            tracing::debug!("  {key}={}", value.to_string_lossy());
        }
    }

    match run_child(definition, env, stdin) {
        Ok((status, combined_output)) => {
            let exit_status = exit_code(status);
            let result = ExecutionResult {
                command: Some(definition.clone()),
                combined_output,
                exit_status,
                spawn_error: None,
            };
            if result.success() {
                tracing::info!(command = %definition.name, "Command succeeded");
            } else {
                tracing::warn!(command = %definition.name, exit_status, "Command failed");
            }
            tracing::debug!("Output:\n{}", result.output_lossy());
            result
        }
        Err(err) => {
            tracing::error!(command = %definition.name, error = %err, "Command could not be run");
            ExecutionResult {
                command: Some(definition.clone()),
                combined_output: Vec::new(),
                exit_status: SPAWN_FAILURE_STATUS,
                spawn_error: Some(err),
            }
        }
    }
}

fn run_child(
    definition: &CommandDefinition,
    env: &Environment,
    stdin: Option<&[u8]>,
) -> std::io::Result<(ExitStatus, Vec<u8>)> {
    // Both streams write into one pipe so their relative order survives.
    let (mut reader, writer) = std::io::pipe()?;
    let stderr_writer = writer.try_clone()?;

    let mut cmd = Command::new(&definition.path);
    cmd.args(&definition.args)
        .env_clear()
        .envs(env.resolved())
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(writer)
        .stderr(stderr_writer);

    let mut child = cmd.spawn()?;
    // The command still owns the parent's write ends; EOF needs them closed.
    drop(cmd);

    let child_stdin = child.stdin.take();
    let read_result = thread::scope(|scope| {
        if let (Some(mut pipe), Some(payload)) = (child_stdin, stdin) {
            scope.spawn(move || {
                if let Err(err) = pipe.write_all(payload) {
                    tracing::debug!(error = %err, "Command did not read its stdin");
                }
            });
        }
        let mut output = Vec::new();
        reader.read_to_end(&mut output).map(|_| output)
    });

    let status = child.wait()?;
    Ok((status, read_result?))
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    SPAWN_FAILURE_STATUS
}
