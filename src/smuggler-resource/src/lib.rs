//! Pipeline resource engine that delegates every verb to a user command.
//!
//! This crate provides:
//! - The request model and extraction of free-form "extra" parameters
//! - Construction of the child environment
//! - Execution of the configured command with combined output capture
//! - Parsing of the files the command leaves behind into a response
//!
//! # Command Contract
//!
//! A command sees its parameters as `SMUGGLER_<key>` environment variables,
//! the request JSON on stdin, and a private directory in
//! `$SMUGGLER_OUTPUT_DIR` where it may write:
//!
//! ```text
//! versions   check: one version per line, oldest first
//! version    out:   the version that was published
//! metadata   in/out: name=value lines
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use smuggler_resource::{ResourceRequest, Runner};
//! use smuggler_core::Verb;
//!
//! let request = ResourceRequest::from_json(Verb::Check, &stdin)?;
//! let outcome = Runner::new().run(&request, None)?;
//! println!("{}", outcome.response.to_protocol_json(Verb::Check)?);
//! ```

pub mod environment;
pub mod executor;
pub mod extract;
pub mod output;
pub mod request;
pub mod response;
mod runner;

pub use environment::{Environment, EnvironmentBuilder, ENV_PREFIX};
pub use executor::{execute, ExecutionResult, SPAWN_FAILURE_STATUS};
pub use extract::{extract_extra_params, Schema};
pub use output::{read_metadata, read_version, read_versions, OutputError};
pub use request::{RequestError, ResourceRequest, SourceConfig, VerbParams};
pub use response::ResourceResponse;
pub use runner::{ResourceError, RunOutcome, Runner};
