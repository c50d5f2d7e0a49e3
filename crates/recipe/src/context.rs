//! Host context and provider traits
//!
//! These traits keep the run loop free of any concrete process, HTTP or
//! terminal implementation.

use crate::command::CommandRunner;
use crate::error::{Error, Result};
use crate::step::{Invocation, Step};
use crate::types::{CommandOutput, Mode, RunReport, StepRecord};
use std::fmt;

/// Source of instance metadata (public address)
pub trait MetadataSource: Send + Sync {
    /// Fetch the public IPv4 address.
    ///
    /// `Ok(None)` means the endpoint answered with an empty body.
    fn public_ipv4(&self) -> Result<Option<String>>;
}

/// Severity of a free-form message emitted during a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for NoteLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Receives progress events during a run
///
/// Implement this trait to render the run (console, transcript, ...).
pub trait Reporter {
    /// Called once before the first step
    fn run_started(&mut self, mode: Mode, steps: &[Step]);

    /// Called when a step begins, in both modes
    fn step_started(&mut self, step: &Step, mode: Mode);

    /// Called right before a command is executed (apply only)
    fn command_started(&mut self, step: &Step, invocation: &Invocation);

    /// Called when a command ran to completion, successfully or not
    fn command_finished(&mut self, invocation: &Invocation, output: &CommandOutput);

    /// Called when a command could not be started
    fn command_failed(&mut self, invocation: &Invocation, error: &Error);

    /// Called for messages produced by non-command steps
    fn note(&mut self, level: NoteLevel, message: &str);

    /// Called when a step has an outcome
    fn step_finished(&mut self, step: &Step, record: &StepRecord);

    /// Called once with the final report
    fn run_finished(&mut self, report: &RunReport);
}

/// No-op reporter
pub struct NoReport;

impl Reporter for NoReport {
    fn run_started(&mut self, _mode: Mode, _steps: &[Step]) {}
    fn step_started(&mut self, _step: &Step, _mode: Mode) {}
    fn command_started(&mut self, _step: &Step, _invocation: &Invocation) {}
    fn command_finished(&mut self, _invocation: &Invocation, _output: &CommandOutput) {}
    fn command_failed(&mut self, _invocation: &Invocation, _error: &Error) {}
    fn note(&mut self, _level: NoteLevel, _message: &str) {}
    fn step_finished(&mut self, _step: &Step, _record: &StepRecord) {}
    fn run_finished(&mut self, _report: &RunReport) {}
}

/// Reporter that records every event as a plain line of text
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Transcript {
    lines: Vec<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Check if any recorded line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }

    fn push(&mut self, line: String) {
        self.lines.push(line);
    }
}

impl Reporter for Transcript {
    fn run_started(&mut self, mode: Mode, steps: &[Step]) {
        self.push(format!("run {mode} ({} steps)", steps.len()));
    }

    fn step_started(&mut self, step: &Step, mode: Mode) {
        self.push(format!("step {} [{mode}]: {}", step.name, step.description));
        if let Some(text) = step.command_text() {
            self.push(format!("  command: {text}"));
        }
        if mode.is_dry_run() {
            for invocation in step.sub_invocations() {
                self.push(format!(
                    "  {}: {}",
                    invocation.description, invocation.command
                ));
            }
        }
    }

    fn command_started(&mut self, _step: &Step, invocation: &Invocation) {
        self.push(format!("  exec: {}", invocation.command));
    }

    fn command_finished(&mut self, invocation: &Invocation, output: &CommandOutput) {
        let status = if output.success { "ok" } else { "failed" };
        self.push(format!("  {status}: {}", invocation.command));
    }

    fn command_failed(&mut self, invocation: &Invocation, error: &Error) {
        self.push(format!("  error: {}: {error}", invocation.command));
    }

    fn note(&mut self, level: NoteLevel, message: &str) {
        self.push(format!("  {level}: {message}"));
    }

    fn step_finished(&mut self, step: &Step, record: &StepRecord) {
        self.push(format!("done {}: {:?}", step.name, record.outcome));
    }

    fn run_finished(&mut self, report: &RunReport) {
        self.push(format!("finished: {:?}", report.state));
    }
}

/// Host collaborators passed to a run
pub struct HostContext<'a> {
    pub runner: &'a dyn CommandRunner,
    pub metadata: &'a dyn MetadataSource,
}

impl<'a> HostContext<'a> {
    pub fn new(runner: &'a dyn CommandRunner, metadata: &'a dyn MetadataSource) -> Self {
        Self { runner, metadata }
    }
}
