//! # Recipe
//!
//! Ordered, run-once provisioning steps with a dry-run/apply toggle.
//!
//! A recipe is a fixed list of [`Step`]s. Each step carries a tagged
//! [`StepAction`] that the [`Provisioner`] interprets uniformly: commands are
//! argument vectors handed to a [`CommandRunner`], the public address comes
//! from a [`MetadataSource`], and progress goes to a [`Reporter`].
//!
//! There is no convergence model, no dependency graph and no rollback. A
//! failed run is restarted from the beginning.
//!
//! ## Example
//!
//! ```
//! use recipe::testing::{ScriptedRunner, StaticMetadata};
//! use recipe::{CommandSpec, HostContext, Mode, Provisioner, Step, StepKind, Transcript};
//!
//! let provisioner = Provisioner::new(vec![Step::command(
//!     "install-package",
//!     "Installing Apache web server (httpd)",
//!     StepKind::Mutate,
//!     CommandSpec::new("dnf").args(["install", "-y", "httpd"]),
//! )]);
//!
//! let runner = ScriptedRunner::new();
//! let metadata = StaticMetadata::empty();
//! let host = HostContext::new(&runner, &metadata);
//!
//! let report = provisioner.run(Mode::DryRun, &host, &mut Transcript::new());
//! assert!(report.succeeded());
//! assert!(runner.invocations().is_empty());
//! ```
//!
//! ## Failure policy
//!
//! Checking the release file and fetching the public address are advisory:
//! problems are reported and the run goes on. Every command and file write is
//! fatal: the first failure halts the run and names the step.

pub mod command;
pub mod context;
pub mod error;
pub mod provisioner;
pub mod step;
pub mod testing;
pub mod types;

// Re-export main types at crate root
pub use command::{CommandRunner, CommandSpec};
pub use context::{HostContext, MetadataSource, NoReport, NoteLevel, Reporter, Transcript};
pub use error::{Error, Result};
pub use provisioner::Provisioner;
pub use step::{Invocation, Step, StepAction};
pub use types::{
    CommandOutput, CommandRecord, Mode, RunReport, RunState, Severity, StepKind, StepOutcome,
    StepRecord,
};
