//! Core types for recipe execution

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::process::Output;

/// Execution mode, fixed for the lifetime of a run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Describe every step without performing it
    #[default]
    DryRun,
    /// Perform real, host-mutating actions
    Apply,
}

impl Mode {
    /// Map the single `--apply` flag onto a mode. No flag means dry run.
    pub fn from_apply_flag(apply: bool) -> Self {
        if apply { Self::Apply } else { Self::DryRun }
    }

    /// Check if this is a dry run
    pub fn is_dry_run(self) -> bool {
        matches!(self, Self::DryRun)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DryRun => write!(f, "dry-run"),
            Self::Apply => write!(f, "apply"),
        }
    }
}

/// Whether a step looks at the host or changes it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Introspect,
    Mutate,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Introspect => write!(f, "introspect"),
            Self::Mutate => write!(f, "mutate"),
        }
    }
}

/// What a failure of a step means for the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Failure is reported and the run continues
    Advisory,
    /// Failure is reported and the run halts
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Advisory => write!(f, "advisory"),
            Self::Fatal => write!(f, "fatal"),
        }
    }
}

/// Captured result of one external command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub success: bool,
    /// Exit code (None if terminated by signal)
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

impl CommandOutput {
    /// A successful result with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed result with the given exit code and stderr
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Lifecycle of a run: `Pending -> Running -> {Completed, Failed}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    Pending,
    Running,
    Completed,
    /// Halted by a fatal step
    Failed { step: String },
}

impl RunState {
    /// Check if the run reached a final state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed { .. })
    }
}

/// Outcome of a single step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Dry run: the step was described, nothing was executed
    Previewed,
    Succeeded,
    /// The step hit a problem that does not affect the run
    Advisory { message: String },
    Failed { reason: String },
}

impl StepOutcome {
    /// Check if the outcome lets the run continue
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// One command as it was run (or attempted) during a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub command: String,
    /// None when the command could not be started
    pub output: Option<CommandOutput>,
}

/// A step taken during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,
    pub outcome: StepOutcome,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandRecord>,
}

/// Everything a run did, returned by value from the run call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub mode: Mode,
    pub state: RunState,
    /// Steps already executed, in order
    pub steps: Vec<StepRecord>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
    /// Create a pending report
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            state: RunState::Pending,
            steps: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Overall success: the run completed without a fatal failure
    pub fn succeeded(&self) -> bool {
        self.state == RunState::Completed
    }

    /// Name of the step that halted the run, if any
    pub fn failed_step(&self) -> Option<&str> {
        match &self.state {
            RunState::Failed { step } => Some(step),
            _ => None,
        }
    }

    /// Names of the steps taken, in order
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    /// Number of advisory warnings raised during the run
    pub fn advisory_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s.outcome, StepOutcome::Advisory { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_apply_flag() {
        assert_eq!(Mode::from_apply_flag(false), Mode::DryRun);
        assert_eq!(Mode::from_apply_flag(true), Mode::Apply);
        assert_eq!(Mode::default(), Mode::DryRun);
        assert!(Mode::DryRun.is_dry_run());
        assert!(!Mode::Apply.is_dry_run());
    }

    #[test]
    fn test_run_state_terminal() {
        assert!(!RunState::Pending.is_terminal());
        assert!(!RunState::Running.is_terminal());
        assert!(RunState::Completed.is_terminal());
        assert!(
            RunState::Failed {
                step: "set-permissions".into()
            }
            .is_terminal()
        );
    }

    #[test]
    fn test_report_failed_step() {
        let mut report = RunReport::new(Mode::Apply);
        assert_eq!(report.state, RunState::Pending);
        assert!(!report.succeeded());
        assert_eq!(report.failed_step(), None);

        report.state = RunState::Failed {
            step: "write-test-page".into(),
        };
        assert_eq!(report.failed_step(), Some("write-test-page"));
        assert!(!report.succeeded());
    }

    #[test]
    fn test_report_serializes_state_tag() {
        let mut report = RunReport::new(Mode::DryRun);
        report.state = RunState::Completed;
        report.steps.push(StepRecord {
            name: "check-system".into(),
            outcome: StepOutcome::Previewed,
            commands: Vec::new(),
        });

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["mode"], "dry_run");
        assert_eq!(json["state"]["state"], "completed");
        assert_eq!(json["steps"][0]["outcome"]["outcome"], "previewed");
        assert!(json["steps"][0].get("commands").is_none());
    }

    #[test]
    fn test_command_output_constructors() {
        let ok = CommandOutput::ok("Complete!");
        assert!(ok.success);
        assert_eq!(ok.exit_code, Some(0));

        let failed = CommandOutput::failed(1, "Error: Unable to find a match: htpd");
        assert!(!failed.success);
        assert_eq!(failed.exit_code, Some(1));
        assert!(failed.stdout.is_empty());
    }
}
