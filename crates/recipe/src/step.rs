//! Step descriptors
//!
//! A step is data, not behaviour: a name, a description and a tagged
//! [`StepAction`] that the run loop interprets. The step table is built once
//! and never changes while a run is in progress.

use crate::command::CommandSpec;
use crate::types::{Severity, StepKind};
use std::path::PathBuf;

/// One command inside a step, with its own description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub description: String,
    pub command: CommandSpec,
}

impl Invocation {
    pub fn new(description: impl Into<String>, command: CommandSpec) -> Self {
        Self {
            description: description.into(),
            command,
        }
    }
}

/// What a step does when applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    /// Read a release-identifier file and look for a distribution marker
    CheckRelease { path: PathBuf, marker: String },
    /// Run commands in order, stopping at the first failure
    Run(Vec<Invocation>),
    /// Write a static document to disk
    WriteFile { path: PathBuf, contents: String },
    /// Ask the metadata source for the instance's public address
    FetchPublicAddress { source: String },
}

impl StepAction {
    /// Failure policy for this action
    pub fn severity(&self) -> Severity {
        match self {
            Self::CheckRelease { .. } | Self::FetchPublicAddress { .. } => Severity::Advisory,
            Self::Run(_) | Self::WriteFile { .. } => Severity::Fatal,
        }
    }
}

/// A named unit of work in the provisioning sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub name: String,
    pub description: String,
    pub kind: StepKind,
    pub action: StepAction,
}

impl Step {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        kind: StepKind,
        action: StepAction,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            action,
        }
    }

    /// A step that runs a single command described by the step itself
    pub fn command(
        name: impl Into<String>,
        description: impl Into<String>,
        kind: StepKind,
        command: CommandSpec,
    ) -> Self {
        let description = description.into();
        let invocation = Invocation::new(description.clone(), command);
        Self::new(name, description, kind, StepAction::Run(vec![invocation]))
    }

    pub fn severity(&self) -> Severity {
        self.action.severity()
    }

    /// Display text of what the step runs, if it has a single command line
    pub fn command_text(&self) -> Option<String> {
        match &self.action {
            StepAction::CheckRelease { .. } => None,
            StepAction::Run(invocations) => match invocations.as_slice() {
                [single] => Some(single.command.to_string()),
                _ => None,
            },
            StepAction::WriteFile { path, contents } => Some(format!(
                "write {} ({} bytes)",
                path.display(),
                contents.len()
            )),
            StepAction::FetchPublicAddress { source } => Some(format!("GET {source}")),
        }
    }

    /// Sub-commands shown under the step header when there are several
    pub fn sub_invocations(&self) -> &[Invocation] {
        match &self.action {
            StepAction::Run(invocations) if invocations.len() > 1 => invocations,
            _ => &[],
        }
    }

    /// Every command the step would run
    pub fn commands(&self) -> Vec<&CommandSpec> {
        match &self.action {
            StepAction::Run(invocations) => invocations.iter().map(|i| &i.command).collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_by_action() {
        let check = StepAction::CheckRelease {
            path: "/etc/system-release".into(),
            marker: "Amazon Linux".into(),
        };
        assert_eq!(check.severity(), Severity::Advisory);
        assert_eq!(
            StepAction::FetchPublicAddress {
                source: "http://169.254.169.254".into()
            }
            .severity(),
            Severity::Advisory
        );
        assert_eq!(StepAction::Run(Vec::new()).severity(), Severity::Fatal);
        assert_eq!(
            StepAction::WriteFile {
                path: "/tmp/index.html".into(),
                contents: String::new()
            }
            .severity(),
            Severity::Fatal
        );
    }

    #[test]
    fn test_command_text_single_and_multi() {
        let single = Step::command(
            "start-service",
            "Starting Apache web server",
            StepKind::Mutate,
            CommandSpec::new("systemctl").args(["start", "httpd"]),
        );
        assert_eq!(single.command_text().as_deref(), Some("systemctl start httpd"));
        assert!(single.sub_invocations().is_empty());

        let multi = Step::new(
            "set-permissions",
            "Setting web directory permissions",
            StepKind::Mutate,
            StepAction::Run(vec![
                Invocation::new("a", CommandSpec::new("chmod").args(["2775", "/var/www"])),
                Invocation::new("b", CommandSpec::new("chown").args(["-R", "u:g", "/var/www"])),
            ]),
        );
        assert_eq!(multi.command_text(), None);
        assert_eq!(multi.sub_invocations().len(), 2);
        assert_eq!(multi.commands().len(), 2);
    }

    #[test]
    fn test_command_text_for_file_and_fetch() {
        let write = Step::new(
            "write-test-page",
            "Creating test HTML page",
            StepKind::Mutate,
            StepAction::WriteFile {
                path: "/var/www/html/index.html".into(),
                contents: "<html></html>".into(),
            },
        );
        assert_eq!(
            write.command_text().as_deref(),
            Some("write /var/www/html/index.html (13 bytes)")
        );
        assert!(write.commands().is_empty());

        let check = Step::new(
            "check-system",
            "Checking system version",
            StepKind::Introspect,
            StepAction::CheckRelease {
                path: "/etc/system-release".into(),
                marker: "Amazon Linux".into(),
            },
        );
        assert_eq!(check.command_text(), None);
    }
}
