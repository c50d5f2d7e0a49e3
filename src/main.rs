mod apache;
mod cli;
mod config;
mod metadata;
mod progress;
mod report;
mod runner;
mod sudo;
mod ui;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::Config;
use metadata::InstanceMetadata;
use recipe::{HostContext, Mode, RunReport};
use report::ConsoleReporter;
use runner::SystemRunner;
use std::fs;
use std::io::{self, IsTerminal};
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    match dispatch(&cli) {
        Ok(code) => code,
        Err(e) => {
            ui::error(&format!("{:#}", e));
            ExitCode::from(2)
        }
    }
}

fn dispatch(cli: &Cli) -> Result<ExitCode> {
    match &cli.command {
        None | Some(Command::Run) => install(cli),
        Some(Command::Steps) => list_steps(cli),
        Some(Command::Config) => {
            let config = Config::load(cli.config.as_deref())?;
            print!("{}", config.to_toml()?);
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "hostprep", &mut io::stdout());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn install(cli: &Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref())?;
    let mode = Mode::from_apply_flag(cli.apply);
    if !mode.is_dry_run() {
        preflight(&config);
    }

    let provisioner = apache::provisioner(&config);
    let runner = SystemRunner;
    let metadata = InstanceMetadata::from_config(&config.metadata);
    let host = HostContext::new(&runner, &metadata);

    let report = {
        let mut reporter = ConsoleReporter::new(io::stdout().lock())
            .with_spinners(!cli.quiet && io::stderr().is_terminal())
            .unprivileged(!sudo::is_root());
        provisioner.run(mode, &host, &mut reporter)
    };

    if let Some(path) = &cli.report {
        write_report(&report, path)?;
        if !cli.quiet {
            ui::info(&format!("Report written to {}", path.display()));
        }
    }

    Ok(if report.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Warn about tools the recipe needs but the host lacks
fn preflight(config: &Config) {
    let mut tools = vec![config.package_manager.as_str(), "systemctl", "find"];
    if config.use_sudo {
        tools.push("sudo");
    }

    for tool in tools {
        if !runner::command_exists(tool) {
            log::warn!("{} not found in PATH", tool);
            ui::warn(&format!("{} not found in PATH, its steps will fail", tool));
        }
    }
}

fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Could not serialize run report")?;
    fs::write(path, json).with_context(|| format!("Could not write report to {}", path.display()))
}

fn list_steps(cli: &Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref())?;
    let steps = apache::build_steps(&config);

    ui::header(report::TITLE);
    for (i, step) in steps.iter().enumerate() {
        println!();
        println!("{}", ui::step(i + 1, steps.len(), &step.name));
        ui::kv("description", &step.description);
        ui::kv("kind", &format!("{}, {}", step.kind, step.severity()));
        if let Some(text) = step.command_text() {
            ui::kv("command", &text);
        }
        for invocation in step.sub_invocations() {
            ui::dim(&format!("{}: {}", invocation.description, invocation.command));
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipe::RunState;
    use tempfile::TempDir;

    #[test]
    fn test_write_report_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        let mut report = RunReport::new(Mode::DryRun);
        report.state = RunState::Completed;

        write_report(&report, &path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["mode"], "dry_run");
        assert_eq!(json["state"]["state"], "completed");
    }

    #[test]
    fn test_write_report_to_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let report = RunReport::new(Mode::Apply);
        let err = write_report(&report, &dir.path().join("nope").join("r.json")).unwrap_err();
        assert!(err.to_string().contains("Could not write report"));
    }
}
