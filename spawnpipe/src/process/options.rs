//! Command line and spawn configuration.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use crate::error::{Result, SpawnError};

/// Default minimum free capacity kept in each capture buffer.
///
/// Tuning knob only. Any value of at least one byte produces the same
/// captured output, larger values just mean fewer reads.
pub const DEFAULT_MIN_SLACK: usize = 4096;

/// Default shell used to interpret the command line.
pub const DEFAULT_SHELL: &str = "sh";

/// A validated shell command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec(String);

impl CommandSpec {
    /// Validate and wrap a command line.
    ///
    /// Rejects blank strings and strings with an interior NUL, which no
    /// `exec` argument can carry.
    ///
    /// # Errors
    ///
    /// [`SpawnError::InvalidCommand`] for either of those cases.
    pub fn new(command: impl Into<String>) -> Result<Self> {
        let command = command.into();
        if command.trim().is_empty() {
            return Err(SpawnError::InvalidCommand {
                reason: "command must not be empty",
            });
        }
        if command.contains('\0') {
            return Err(SpawnError::InvalidCommand {
                reason: "command must not contain NUL bytes",
            });
        }
        Ok(Self(command))
    }

    /// The command line as given.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for CommandSpec {
    type Error = SpawnError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<String> for CommandSpec {
    type Error = SpawnError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

/// Configuration options for a spawn.
#[derive(Debug, Clone)]
pub struct SpawnOptions {
    /// Shell that receives the command line as `-c <command>`.
    pub shell: PathBuf,

    /// Minimum free capacity kept in each capture buffer.
    pub min_slack: usize,

    /// Working directory for the child.
    pub working_dir: Option<PathBuf>,

    /// Environment variables to set (merged with current env).
    pub env: HashMap<String, String>,

    /// Whether to clear the environment before adding env vars.
    pub env_clear: bool,
}

impl Default for SpawnOptions {
    fn default() -> Self {
        Self {
            shell: PathBuf::from(DEFAULT_SHELL),
            min_slack: DEFAULT_MIN_SLACK,
            working_dir: None,
            env: HashMap::new(),
            env_clear: false,
        }
    }
}

impl SpawnOptions {
    /// Options with the default shell and slack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different shell.
    #[must_use]
    pub fn shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Set the minimum buffer slack. Zero is raised to one.
    #[must_use]
    pub fn min_slack(mut self, bytes: usize) -> Self {
        self.min_slack = bytes.max(1);
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set an environment variable.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set multiple environment variables.
    #[must_use]
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in vars {
            self.env.insert(k.into(), v.into());
        }
        self
    }

    /// Clear the environment before setting variables.
    #[must_use]
    pub const fn env_clear(mut self) -> Self {
        self.env_clear = true;
        self
    }

    /// Slack actually applied to buffers, never zero.
    pub(crate) fn effective_slack(&self) -> usize {
        self.min_slack.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_spec_rejects_blank() {
        assert!(matches!(
            CommandSpec::new(""),
            Err(SpawnError::InvalidCommand { .. })
        ));
        assert!(matches!(
            CommandSpec::new("  \t\n"),
            Err(SpawnError::InvalidCommand { .. })
        ));
    }

    #[test]
    fn test_command_spec_rejects_nul() {
        let err = CommandSpec::new("echo a\0b").unwrap_err();
        assert!(err.to_string().contains("NUL"));
    }

    #[test]
    fn test_command_spec_keeps_text_verbatim() {
        let spec = CommandSpec::try_from("  echo 'hi'  ").unwrap();
        assert_eq!(spec.as_str(), "  echo 'hi'  ");
        assert_eq!(spec.to_string(), "  echo 'hi'  ");
    }

    #[test]
    fn test_options_defaults() {
        let options = SpawnOptions::new();
        assert_eq!(options.shell, PathBuf::from("sh"));
        assert_eq!(options.min_slack, DEFAULT_MIN_SLACK);
        assert!(options.working_dir.is_none());
        assert!(options.env.is_empty());
        assert!(!options.env_clear);
    }

    #[test]
    fn test_options_builder() {
        let options = SpawnOptions::new()
            .shell("/bin/bash")
            .min_slack(0)
            .working_dir("/tmp")
            .env("A", "1")
            .envs([("B", "2"), ("C", "3")])
            .env_clear();

        assert_eq!(options.shell, PathBuf::from("/bin/bash"));
        assert_eq!(options.min_slack, 1);
        assert_eq!(options.working_dir, Some(PathBuf::from("/tmp")));
        assert_eq!(options.env.len(), 3);
        assert!(options.env_clear);
    }
}
