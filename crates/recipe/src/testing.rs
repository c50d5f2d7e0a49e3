//! Test doubles for the host boundary.
//!
//! [`ScriptedRunner`] records every command it is asked to run and fails the
//! ones that match configured words. [`StaticMetadata`] answers metadata
//! queries with a canned response.

use crate::command::{CommandRunner, CommandSpec};
use crate::context::MetadataSource;
use crate::error::{Error, Result};
use crate::types::CommandOutput;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Command runner that never touches the host
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    invocations: Mutex<Vec<CommandSpec>>,
    failing: Vec<String>,
    unspawnable: Vec<String>,
    stdout: String,
}

impl ScriptedRunner {
    /// Create a runner where every command succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands mentioning `word` exit with status 1
    pub fn fail_on(mut self, word: impl Into<String>) -> Self {
        self.failing.push(word.into());
        self
    }

    /// Commands mentioning `word` cannot be started
    pub fn missing(mut self, word: impl Into<String>) -> Self {
        self.unspawnable.push(word.into());
        self
    }

    /// Stdout returned by successful commands
    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    /// Every command received so far, in order
    pub fn invocations(&self) -> Vec<CommandSpec> {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Check if any received command mentions `word`
    pub fn ran(&self, word: &str) -> bool {
        self.invocations().iter().any(|c| c.mentions(word))
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command.clone());

        if self.unspawnable.iter().any(|w| command.mentions(w)) {
            return Err(Error::spawn(
                command.to_string(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
            ));
        }
        if self.failing.iter().any(|w| command.mentions(w)) {
            return Ok(CommandOutput::failed(1, format!("simulated failure: {command}")));
        }
        Ok(CommandOutput::ok(self.stdout.clone()))
    }
}

#[derive(Debug, Clone)]
enum Canned {
    Address(String),
    Empty,
    Timeout(Duration),
    Status(u16),
}

/// Metadata source with a fixed answer
#[derive(Debug)]
pub struct StaticMetadata {
    answer: Canned,
    queries: Mutex<usize>,
}

impl StaticMetadata {
    fn with(answer: Canned) -> Self {
        Self {
            answer,
            queries: Mutex::new(0),
        }
    }

    pub fn address(ip: impl Into<String>) -> Self {
        Self::with(Canned::Address(ip.into()))
    }

    pub fn empty() -> Self {
        Self::with(Canned::Empty)
    }

    pub fn timeout() -> Self {
        Self::with(Canned::Timeout(Duration::from_secs(5)))
    }

    pub fn status(code: u16) -> Self {
        Self::with(Canned::Status(code))
    }

    /// Number of times the source was queried
    pub fn queries(&self) -> usize {
        *self.queries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MetadataSource for StaticMetadata {
    fn public_ipv4(&self) -> Result<Option<String>> {
        *self.queries.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        match &self.answer {
            Canned::Address(ip) => Ok(Some(ip.clone())),
            Canned::Empty => Ok(None),
            Canned::Timeout(after) => Err(Error::Timeout { after: *after }),
            Canned::Status(code) => Err(Error::metadata(format!("HTTP {code}"), Some(*code))),
        }
    }
}
