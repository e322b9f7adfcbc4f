//! Reads the files a command leaves in its scratch directory.
//!
//! Parsing is lenient: a missing file is an empty result, blank lines are
//! dropped, surrounding whitespace is ignored and invalid UTF-8 is replaced.

use smuggler_core::{MetadataPair, Version};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const VERSIONS_FILE: &str = "versions";
pub const VERSION_FILE: &str = "version";
pub const METADATA_FILE: &str = "metadata";

const TRIMMED: &[char] = &[' ', '\t', '\r'];

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to read command output {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Versions listed one per line in `versions`, oldest first.
pub fn read_versions(dir: &Path) -> Result<Vec<Version>, OutputError> {
    let lines = read_trimmed_lines(&dir.join(VERSIONS_FILE))?;
    Ok(lines.into_iter().map(Version::new).collect())
}

/// The first non-blank line of `version`.
pub fn read_version(dir: &Path) -> Result<Option<Version>, OutputError> {
    let lines = read_trimmed_lines(&dir.join(VERSION_FILE))?;
    Ok(lines.into_iter().next().map(Version::new))
}

/// `name=value` lines from `metadata`, in file order.
pub fn read_metadata(dir: &Path) -> Result<Vec<MetadataPair>, OutputError> {
    let lines = read_trimmed_lines(&dir.join(METADATA_FILE))?;
    Ok(lines.iter().map(|line| parse_metadata_line(line)).collect())
}

/// Splits on the first `=`. A line without one is a name with an empty value.
pub fn parse_metadata_line(line: &str) -> MetadataPair {
    match line.split_once('=') {
        Some((name, value)) => MetadataPair::new(name.trim_matches(TRIMMED), value.trim_matches(TRIMMED)),
        None => MetadataPair::new(line.trim_matches(TRIMMED), ""),
    }
}

/// Non-blank lines of `content`, trimmed, in order.
pub fn trimmed_lines(content: &str) -> Vec<String> {
    content
        .split('\n')
        .map(|line| line.trim_matches(TRIMMED))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Undecodable bytes become U+FFFD rather than failing the request.
fn read_trimmed_lines(path: &Path) -> Result<Vec<String>, OutputError> {
    match fs::read(path) {
        Ok(bytes) => Ok(trimmed_lines(&String::from_utf8_lossy(&bytes))),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::debug!("No {} written by command", path.display());
            Ok(Vec::new())
        }
        Err(source) => Err(OutputError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}
