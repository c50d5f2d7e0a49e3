//! Argument-vector commands and the execution boundary
//!
//! Commands are never built as shell strings. A [`CommandSpec`] is a program
//! plus an explicit argument list; [`CommandRunner`] is the seam where it
//! meets the operating system, so tests can swap in a recording double.

use crate::error::Result;
use crate::types::CommandOutput;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A program and its arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Create a command with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Full argument vector, program first
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }

    /// Check if any part of the argv equals `needle`
    pub fn mentions(&self, needle: &str) -> bool {
        self.argv().contains(&needle)
    }
}

impl fmt::Display for CommandSpec {
    /// Shell-like preview. Only for display; nothing ever parses it back.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.argv().into_iter().map(quote).collect();
        write!(f, "{}", rendered.join(" "))
    }
}

fn quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@%+,{}".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Executes commands on the host
///
/// Implementations run the command to completion and capture its output.
/// A non-zero exit is an `Ok` with `success == false`; `Err` is reserved for
/// commands that could not be started.
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &CommandSpec) -> Result<CommandOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_argv() {
        let cmd = CommandSpec::new("sudo").args(["dnf", "install", "-y"]).arg("httpd");
        assert_eq!(cmd.argv(), vec!["sudo", "dnf", "install", "-y", "httpd"]);
        assert!(cmd.mentions("httpd"));
        assert!(!cmd.mentions("http"));
    }

    #[test]
    fn test_display_plain_words() {
        let cmd = CommandSpec::new("sudo").args(["chown", "-R", "ec2-user:apache", "/var/www"]);
        assert_eq!(cmd.to_string(), "sudo chown -R ec2-user:apache /var/www");
    }

    #[test]
    fn test_display_quotes_shell_metacharacters() {
        let cmd = CommandSpec::new("find").args(["/var/www", "-exec", "chmod", "2775", "{}", ";"]);
        assert_eq!(cmd.to_string(), "find /var/www -exec chmod 2775 {} ';'");

        let cmd = CommandSpec::new("echo").arg("it's here").arg("");
        assert_eq!(cmd.to_string(), r"echo 'it'\''s here' ''");
    }
}
