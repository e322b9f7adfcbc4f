//! Drives one request from command lookup to response.

use crate::environment::EnvironmentBuilder;
use crate::executor::{execute, ExecutionResult};
use crate::output::{read_metadata, read_version, read_versions, OutputError};
use crate::request::ResourceRequest;
use crate::response::ResourceResponse;
use smuggler_core::{CommandDefinition, Config, Verb, APP_NAME};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("failed to create scratch directory: {0}")]
    ScratchDirectory(std::io::Error),
    #[error("failed to encode request for command stdin: {0}")]
    EncodeRequest(serde_json::Error),
    #[error("{}", .0.failure_summary())]
    CommandFailed(Box<ExecutionResult>),
    #[error(transparent)]
    Output(#[from] OutputError),
}

impl ResourceError {
    /// The execution behind a command failure, for diagnostics.
    pub fn execution(&self) -> Option<&ExecutionResult> {
        match self {
            ResourceError::CommandFailed(execution) => Some(&**execution),
            _ => None,
        }
    }
}

/// A completed run: the response plus the execution that produced it.
#[derive(Debug)]
pub struct RunOutcome {
    pub response: ResourceResponse,
    pub execution: ExecutionResult,
}

/// Runs requests, falling back to the local config for undefined verbs.
#[derive(Debug, Clone)]
pub struct Runner {
    fallback_commands: Vec<CommandDefinition>,
    default_params: BTreeMap<String, String>,
    inherit_env: bool,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    /// A runner with no fallback commands that passes the process environment on.
    pub fn new() -> Self {
        Self {
            fallback_commands: Vec::new(),
            default_params: BTreeMap::new(),
            inherit_env: true,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            fallback_commands: config.commands.clone(),
            default_params: config.param_values(),
            inherit_env: true,
        }
    }

    /// Whether the child also sees this process's environment.
    pub fn inherit_env(mut self, inherit: bool) -> Self {
        self.inherit_env = inherit;
        self
    }

    /// The request's definition for its verb, else the local config's.
    pub fn resolve_command(&self, request: &ResourceRequest) -> Option<CommandDefinition> {
        request
            .command()
            .or_else(|| {
                smuggler_core::command::find_command(&self.fallback_commands, request.verb.name())
                    .filter(|command| command.is_defined())
            })
            .cloned()
    }

    /// Runs the request's verb. `dir` is the destination (`in`) or sources
    /// (`out`) directory handed over by the pipeline.
    pub fn run(
        &self,
        request: &ResourceRequest,
        dir: Option<&Path>,
    ) -> Result<RunOutcome, ResourceError> {
        let verb = request.verb;
        let Some(command) = self.resolve_command(request) else {
            tracing::info!(%verb, "No command defined for verb, returning empty response");
            return Ok(RunOutcome {
                response: ResourceResponse::default(),
                execution: ExecutionResult::skipped(),
            });
        };

        let scratch = tempfile::Builder::new()
            .prefix(&format!("{APP_NAME}-run"))
            .tempdir()
            .map_err(ResourceError::ScratchDirectory)?;
        tracing::debug!(path = %scratch.path().display(), "Created scratch directory");

        let mut env = EnvironmentBuilder::new(verb, scratch.path())
            .command_name(command.name.as_str())
            .version(request.version.as_ref())
            .data_dir(dir)
            .params(&self.default_params)
            .params(&request.merged_params());
        if self.inherit_env {
            env = env.inherit_process_env();
        }
        let env = env.build();

        let stdin = request
            .stdin_payload()
            .map_err(ResourceError::EncodeRequest)?;
        let execution = execute(&command, &env, Some(&stdin));
        if !execution.success() {
            return Err(ResourceError::CommandFailed(Box::new(execution)));
        }

        let response = match verb {
            Verb::Check => ResourceResponse::checked(read_versions(scratch.path())?),
            // The fetched version is always the one that was requested.
            Verb::In => {
                ResourceResponse::versioned(request.version.clone(), read_metadata(scratch.path())?)
            }
            Verb::Out => ResourceResponse::versioned(
                read_version(scratch.path())?,
                read_metadata(scratch.path())?,
            ),
        };
        tracing::info!(
            %verb,
            versions = response.versions.len(),
            metadata = response.metadata.len(),
            "Parsed command output"
        );

        Ok(RunOutcome {
            response,
            execution,
        })
    }
}
