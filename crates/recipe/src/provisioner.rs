//! Run loop - interprets the step table in order

use crate::command::CommandRunner;
use crate::context::{HostContext, MetadataSource, NoteLevel, Reporter};
use crate::error::Error;
use crate::step::{Invocation, Step, StepAction};
use crate::types::{
    CommandRecord, Mode, RunReport, RunState, Severity, StepOutcome, StepRecord,
};
use chrono::Utc;
use log::{debug, error, info, warn};
use std::io;
use std::path::Path;

/// Executes a fixed, ordered list of steps
#[derive(Debug, Clone)]
pub struct Provisioner {
    steps: Vec<Step>,
}

impl Provisioner {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    /// Run every step in order.
    ///
    /// In [`Mode::DryRun`] steps are only reported and the run always
    /// completes. In [`Mode::Apply`] the first failing fatal step halts the
    /// run; advisory steps never do. Nothing is retried.
    pub fn run(&self, mode: Mode, host: &HostContext<'_>, reporter: &mut dyn Reporter) -> RunReport {
        let mut report = RunReport::new(mode);
        report.state = RunState::Running;
        info!("Starting {} run with {} steps", mode, self.steps.len());
        reporter.run_started(mode, &self.steps);

        for step in &self.steps {
            reporter.step_started(step, mode);

            let record = match mode {
                Mode::DryRun => StepRecord {
                    name: step.name.clone(),
                    outcome: StepOutcome::Previewed,
                    commands: Vec::new(),
                },
                Mode::Apply => apply_step(step, host, reporter),
            };

            reporter.step_finished(step, &record);
            let halted = !record.outcome.is_success();
            report.steps.push(record);

            if halted {
                error!("Step {} failed, aborting run", step.name);
                report.state = RunState::Failed {
                    step: step.name.clone(),
                };
                break;
            }
        }

        if report.state == RunState::Running {
            report.state = RunState::Completed;
        }
        report.finished_at = Some(Utc::now());
        info!("Run finished: {:?}", report.state);
        reporter.run_finished(&report);
        report
    }
}

fn apply_step(step: &Step, host: &HostContext<'_>, reporter: &mut dyn Reporter) -> StepRecord {
    info!("Applying step {}", step.name);
    let mut commands = Vec::new();

    let outcome = match &step.action {
        StepAction::CheckRelease { path, marker } => check_release(path, marker, reporter),
        StepAction::Run(invocations) => {
            run_invocations(step, invocations, host.runner, reporter, &mut commands)
        }
        StepAction::WriteFile { path, contents } => write_file(path, contents, reporter),
        StepAction::FetchPublicAddress { .. } => fetch_address(host.metadata, reporter),
    };

    // Advisory steps cannot fail the run, whatever the action reported
    let outcome = match (step.severity(), outcome) {
        (Severity::Advisory, StepOutcome::Failed { reason }) => {
            StepOutcome::Advisory { message: reason }
        }
        (_, outcome) => outcome,
    };

    if let StepOutcome::Advisory { message } = &outcome {
        warn!("Step {}: {}", step.name, message);
    }

    StepRecord {
        name: step.name.clone(),
        outcome,
        commands,
    }
}

fn check_release(path: &Path, marker: &str, reporter: &mut dyn Reporter) -> StepOutcome {
    debug!("Reading release file {}", path.display());

    match std::fs::read_to_string(path) {
        Ok(content) => {
            let release = content.trim();
            reporter.note(NoteLevel::Info, &format!("System: {release}"));

            if release.contains(marker) {
                reporter.note(
                    NoteLevel::Success,
                    &format!("{marker} detected - proceeding with installation"),
                );
                StepOutcome::Succeeded
            } else {
                let message = format!("This script is optimized for {marker}");
                reporter.note(NoteLevel::Warning, &format!("Warning: {message}"));
                StepOutcome::Advisory { message }
            }
        }
        Err(e) => {
            let message = if e.kind() == io::ErrorKind::NotFound {
                "Could not determine system version".to_string()
            } else {
                format!("Could not read {}: {e}", path.display())
            };
            reporter.note(NoteLevel::Warning, &format!("Warning: {message}"));
            StepOutcome::Advisory { message }
        }
    }
}

fn run_invocations(
    step: &Step,
    invocations: &[Invocation],
    runner: &dyn CommandRunner,
    reporter: &mut dyn Reporter,
    commands: &mut Vec<CommandRecord>,
) -> StepOutcome {
    for invocation in invocations {
        debug!("Running {:?}", invocation.command.argv());
        reporter.command_started(step, invocation);

        match runner.run(&invocation.command) {
            Ok(output) => {
                reporter.command_finished(invocation, &output);
                let success = output.success;
                let exit_code = output.exit_code;
                commands.push(CommandRecord {
                    command: invocation.command.to_string(),
                    output: Some(output),
                });

                if !success {
                    let status = exit_code.map_or_else(|| "signal".to_string(), |c| c.to_string());
                    return StepOutcome::Failed {
                        reason: format!("{} exited with status {status}", invocation.command),
                    };
                }
            }
            Err(e) => {
                reporter.command_failed(invocation, &e);
                commands.push(CommandRecord {
                    command: invocation.command.to_string(),
                    output: None,
                });
                return StepOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        }
    }

    StepOutcome::Succeeded
}

fn write_file(path: &Path, contents: &str, reporter: &mut dyn Reporter) -> StepOutcome {
    debug!("Writing {} bytes to {}", contents.len(), path.display());

    match std::fs::write(path, contents) {
        Ok(()) => {
            reporter.note(NoteLevel::Success, "Test page created successfully");
            StepOutcome::Succeeded
        }
        Err(source) => {
            let err = Error::io(path, source);
            reporter.note(NoteLevel::Error, &format!("Error creating test page: {err}"));
            if err.is_permission_denied() {
                reporter.note(NoteLevel::Info, "Writing to the web root needs root privileges");
            }
            StepOutcome::Failed {
                reason: err.to_string(),
            }
        }
    }
}

fn fetch_address(metadata: &dyn MetadataSource, reporter: &mut dyn Reporter) -> StepOutcome {
    match metadata.public_ipv4() {
        Ok(Some(address)) if !address.trim().is_empty() => {
            let address = address.trim();
            reporter.note(NoteLevel::Info, &format!("Public IP: {address}"));
            reporter.note(
                NoteLevel::Info,
                &format!("Test your server at: http://{address}"),
            );
            StepOutcome::Succeeded
        }
        Ok(_) => {
            let message = "Could not retrieve public IP address".to_string();
            reporter.note(NoteLevel::Info, &message);
            StepOutcome::Advisory { message }
        }
        Err(e) => {
            let message = format!("Error getting instance info: {e}");
            reporter.note(NoteLevel::Info, &message);
            StepOutcome::Advisory { message }
        }
    }
}
