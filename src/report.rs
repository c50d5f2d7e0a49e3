//! Console rendering of a run
//!
//! [`ConsoleReporter`] prints the step-by-step log. The closing block is
//! computed by [`closing_lines`] so the wording can be checked without a
//! terminal.

use crate::progress;
use crate::ui;
use colored::Colorize;
use indicatif::ProgressBar;
use recipe::{
    CommandOutput, Error, Invocation, Mode, NoteLevel, Reporter, RunReport, RunState, Step,
    StepRecord,
};
use std::fmt::Display;
use std::io::Write;

pub const TITLE: &str = "Apache Web Server Installation Script";

/// Reporter writing human-readable progress to `out`
pub struct ConsoleReporter<W: Write> {
    out: W,
    spinners: bool,
    unprivileged: bool,
    spinner: Option<ProgressBar>,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            spinners: false,
            unprivileged: false,
            spinner: None,
        }
    }

    /// Show a spinner while each command runs
    pub fn with_spinners(mut self, enabled: bool) -> Self {
        self.spinners = enabled;
        self
    }

    /// Warn at start of an apply run that we are not root
    pub fn unprivileged(mut self, unprivileged: bool) -> Self {
        self.unprivileged = unprivileged;
        self
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: impl Display) {
        if let Err(e) = writeln!(self.out, "{}", text) {
            log::debug!("console write failed: {}", e);
        }
    }

    fn header(&mut self, mode: Mode, description: &str) {
        let tag = match mode {
            Mode::DryRun => "[DRY RUN]".yellow().bold(),
            Mode::Apply => "[EXECUTING]".cyan().bold(),
        };
        self.line(format!("{} {}", tag, description));
    }

    fn command_line(&mut self, text: &str) {
        self.line(format!("  Command: {}", text.dimmed()));
    }

    fn clear_spinner(&mut self) {
        if let Some(pb) = self.spinner.take() {
            progress::finish_clear(&pb);
        }
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn run_started(&mut self, mode: Mode, _steps: &[Step]) {
        for line in ui::banner(TITLE) {
            self.line(line);
        }

        match mode {
            Mode::DryRun => {
                self.line("DRY RUN MODE - No changes will be made".yellow());
                self.line("Use --apply flag to actually perform installation");
            }
            Mode::Apply => {
                self.line("INSTALLATION MODE - Changes will be applied".cyan());
                if self.unprivileged {
                    self.line(format!(
                        "{} This script should be run with sudo privileges",
                        "⚠ Warning:".yellow()
                    ));
                    self.line("Example: sudo hostprep --apply");
                }
            }
        }
        self.line(ui::rule('-'));
    }

    fn step_started(&mut self, step: &Step, mode: Mode) {
        self.header(mode, &step.description);
        if let Some(text) = step.command_text() {
            self.command_line(&text);
        }

        if mode.is_dry_run() {
            for invocation in step.sub_invocations() {
                self.header(mode, &invocation.description);
                self.command_line(&invocation.command.to_string());
            }
        }
    }

    fn command_started(&mut self, step: &Step, invocation: &Invocation) {
        if !step.sub_invocations().is_empty() {
            self.header(Mode::Apply, &invocation.description);
            self.command_line(&invocation.command.to_string());
        }
        if self.spinners {
            self.spinner = Some(progress::spinner(&invocation.command.to_string()));
        }
    }

    fn command_finished(&mut self, _invocation: &Invocation, output: &CommandOutput) {
        self.clear_spinner();
        if output.success {
            self.line(format!("  {} {}", "✓ Success:".green(), output.stdout.trim()));
        } else {
            self.line(format!("  {} {}", "✗ Error:".red(), output.stderr.trim()));
        }
    }

    fn command_failed(&mut self, _invocation: &Invocation, error: &Error) {
        self.clear_spinner();
        self.line(format!("  {} {}", "✗ Error:".red(), error));
    }

    fn note(&mut self, level: NoteLevel, message: &str) {
        let text = match level {
            NoteLevel::Info => format!("  {}", message),
            NoteLevel::Success => format!("  {} {}", "✓".green(), message),
            NoteLevel::Warning => format!("  {} {}", "⚠".yellow(), message),
            NoteLevel::Error => format!("  {} {}", "✗".red(), message),
        };
        self.line(text);
    }

    fn step_finished(&mut self, _step: &Step, record: &StepRecord) {
        if record.outcome.is_success() {
            self.line("");
        }
    }

    fn run_finished(&mut self, report: &RunReport) {
        let lines = closing_lines(report);
        match report.state {
            RunState::Failed { .. } => {
                for line in lines {
                    self.line(line.red().bold());
                }
            }
            _ => {
                self.line(ui::rule('='));
                for (i, line) in lines.into_iter().enumerate() {
                    if i == 0 {
                        self.line(line.green().bold());
                    } else {
                        self.line(line);
                    }
                }
                self.line(ui::rule('='));
            }
        }
    }
}

/// Closing block for a finished run, last line is the final word
pub fn closing_lines(report: &RunReport) -> Vec<String> {
    match (&report.state, report.mode) {
        (RunState::Failed { step }, _) => {
            vec![format!("✗ Installation failed at step: {step}")]
        }
        (_, Mode::DryRun) => vec![
            "DRY RUN COMPLETED".to_string(),
            "Run with --apply to perform actual installation".to_string(),
        ],
        (_, Mode::Apply) => vec![
            "INSTALLATION COMPLETED SUCCESSFULLY!".to_string(),
            "Make sure your EC2 security group allows HTTP traffic on port 80".to_string(),
            "Your Apache web server should now be running".to_string(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apache;
    use crate::config::Config;
    use recipe::testing::{ScriptedRunner, StaticMetadata};
    use recipe::HostContext;

    fn render(mode: Mode, runner: &ScriptedRunner, unprivileged: bool) -> (RunReport, String) {
        colored::control::set_override(false);
        let metadata = StaticMetadata::address("203.0.113.7");
        let host = HostContext::new(runner, &metadata);
        let config = Config {
            release_file: "/nonexistent/system-release".to_string(),
            document_root: "/nonexistent/www/html".to_string(),
            web_root: "/nonexistent/www".to_string(),
            ..Default::default()
        };
        let mut reporter = ConsoleReporter::new(Vec::new()).unprivileged(unprivileged);
        let report = apache::provisioner(&config).run(mode, &host, &mut reporter);
        let text = String::from_utf8(reporter.into_inner()).unwrap();
        (report, text)
    }

    #[test]
    fn test_dry_run_output() {
        let runner = ScriptedRunner::new();
        let (report, text) = render(Mode::DryRun, &runner, true);

        assert!(report.succeeded());
        assert!(text.contains("DRY RUN MODE - No changes will be made"));
        assert!(text.contains("[DRY RUN] Updating system packages\n  Command: sudo dnf update -y"));
        assert!(text.contains("[DRY RUN] Adding ec2-user to apache group"));
        assert!(!text.contains("sudo privileges"));
        assert!(!text.contains("[EXECUTING]"));
        assert_eq!(
            text.lines().rev().nth(1),
            Some("Run with --apply to perform actual installation")
        );
    }

    #[test]
    fn test_apply_failure_output() {
        // The scratch document root does not exist, so the page write fails
        let runner = ScriptedRunner::new().with_stdout("Complete!");
        let (report, text) = render(Mode::Apply, &runner, true);

        assert_eq!(report.failed_step(), Some("write-test-page"));
        assert!(text.contains("⚠ Warning: This script should be run with sudo privileges"));
        assert!(text.contains("[EXECUTING] Setting file permissions"));
        assert!(text.contains("  ✓ Success: Complete!"));
        assert!(text.contains("  ⚠ Warning: Could not determine system version"));
        assert!(text.contains("  ✗ Error creating test page"));
        assert_eq!(
            text.lines().last(),
            Some("✗ Installation failed at step: write-test-page")
        );
    }

    #[test]
    fn test_command_error_output() {
        let runner = ScriptedRunner::new().fail_on("usermod");
        let (report, text) = render(Mode::Apply, &runner, false);

        assert_eq!(report.failed_step(), Some("set-permissions"));
        assert!(text.contains("  ✗ Error: simulated failure: sudo usermod"));
        assert!(!text.contains("[EXECUTING] Changing ownership"));
    }

    #[test]
    fn test_closing_lines() {
        let mut report = RunReport::new(Mode::DryRun);
        report.state = RunState::Completed;
        assert_eq!(
            closing_lines(&report).last().map(String::as_str),
            Some("Run with --apply to perform actual installation")
        );

        let mut report = RunReport::new(Mode::Apply);
        report.state = RunState::Completed;
        assert_eq!(
            closing_lines(&report).last().map(String::as_str),
            Some("Your Apache web server should now be running")
        );

        report.state = RunState::Failed {
            step: "set-permissions".to_string(),
        };
        assert_eq!(
            closing_lines(&report),
            vec!["✗ Installation failed at step: set-permissions"]
        );
    }
}
