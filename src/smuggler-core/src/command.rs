use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The executable bound to one verb.
///
/// A definition whose `name` is empty is "undefined": running it is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandDefinition {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_defined(&self) -> bool {
        !self.name.is_empty()
    }

    /// `path arg1 arg2 ...`, for log lines.
    pub fn describe(&self) -> String {
        let mut parts = vec![self.path.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// First definition whose name matches, scanning in declaration order.
pub fn find_command<'a>(
    commands: &'a [CommandDefinition],
    name: &str,
) -> Option<&'a CommandDefinition> {
    commands.iter().find(|command| command.name == name)
}
