use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use smuggler_core::{init_logging, Config, Verb, APP_NAME};
use smuggler_resource::{ResourceError, ResourceRequest, Runner};
use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Exit status for failures that originate in smuggler rather than the command.
const WRAPPER_FAILURE_STATUS: u8 = 1;

#[derive(Debug, Parser)]
#[command(
    name = "smuggler",
    version,
    about = "Pipeline resource that runs your own check/in/out commands"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
enum Command {
    /// Discover new versions
    Check,
    /// Fetch the requested version into DIR
    In { dir: PathBuf },
    /// Publish a version from DIR
    Out { dir: PathBuf },
}

impl Command {
    fn verb(&self) -> Verb {
        match self {
            Command::Check => Verb::Check,
            Command::In { .. } => Verb::In,
            Command::Out { .. } => Verb::Out,
        }
    }

    fn dir(&self) -> Option<&Path> {
        match self {
            Command::Check => None,
            Command::In { dir } | Command::Out { dir } => Some(dir),
        }
    }
}

/// Installed as `check`, `in` and `out`, the verb comes from the program name.
fn multi_call_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut args: Vec<OsString> = args.into_iter().collect();
    let invoked_as = args
        .first()
        .and_then(|arg0| Path::new(arg0).file_name())
        .and_then(|name| name.to_str())
        .filter(|name| name.parse::<Verb>().is_ok())
        .map(OsString::from);

    if let Some(verb) = invoked_as {
        args[0] = verb;
        args.insert(0, OsString::from(APP_NAME));
    }
    args
}

fn main() -> ExitCode {
    let cli = Cli::parse_from(multi_call_args(std::env::args_os()));

    let config = match load_config() {
        Ok(config) => config,
        Err(err) => return fatal("loading config", &err),
    };
    let _logging = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(err) => {
            let context = format!("opening log '{}'", config.logging.file.display());
            return fatal(&context, &anyhow::Error::new(err));
        }
    };

    let verb = cli.command.verb();
    tracing::info!(%verb, "Handling request");
    match run(&cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%verb, "{err:#}");
            eprintln!("error {err:#}");
            ExitCode::from(exit_status(&err))
        }
    }
}

fn load_config() -> Result<Config> {
    let mut config = match Config::default_path() {
        Some(path) => Config::load_or_default(&path)?,
        None => Config::default(),
    };
    config.apply_env_overrides(|name| std::env::var(name).ok())?;
    Ok(config)
}

fn run(command: &Command, config: &Config) -> Result<()> {
    let verb = command.verb();

    let mut payload = String::new();
    io::stdin()
        .read_to_string(&mut payload)
        .context("reading request from stdin")?;
    let request =
        ResourceRequest::from_json(verb, &payload).context("reading request from stdin")?;

    let outcome = match Runner::from_config(config).run(&request, command.dir()) {
        Ok(outcome) => outcome,
        Err(err) => {
            if let Some(execution) = err.execution() {
                echo_output(&execution.combined_output);
            }
            return Err(err).context("running command");
        }
    };
    echo_output(&outcome.execution.combined_output);

    let response = outcome
        .response
        .to_protocol_json(verb)
        .context("encoding response")?;
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, &response).context("writing response to stdout")?;
    writeln!(stdout).context("writing response to stdout")?;
    Ok(())
}

/// The command's own output goes to stderr; stdout is reserved for the response.
fn echo_output(output: &[u8]) {
    let mut stderr = io::stderr().lock();
    let _ = stderr.write_all(output);
    let _ = stderr.flush();
}

/// The command's exit status when it failed on its own, otherwise 1.
fn exit_status(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<ResourceError>()
        .and_then(ResourceError::execution)
        .and_then(|execution| u8::try_from(execution.exit_status).ok())
        .filter(|status| *status != 0)
        .unwrap_or(WRAPPER_FAILURE_STATUS)
}

fn fatal(context: &str, err: &anyhow::Error) -> ExitCode {
    eprintln!("error {context}: {err:#}");
    ExitCode::from(WRAPPER_FAILURE_STATUS)
}
