//! Privilege handling for provisioning commands
//!
//! Privileged commands are prefixed with `sudo` per command, never by
//! re-executing the whole process. When `use_sudo` is off (already root, or a
//! container without sudo) commands run as-is.

use recipe::CommandSpec;

/// Decides how privileged commands are launched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elevation {
    use_sudo: bool,
}

impl Elevation {
    pub fn new(use_sudo: bool) -> Self {
        Self { use_sudo }
    }

    /// Build a command that needs root
    pub fn privileged<I, S>(&self, program: &str, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.use_sudo {
            CommandSpec::new("sudo").arg(program).args(args)
        } else {
            CommandSpec::new(program).args(args)
        }
    }

    /// Argv fragment for a privileged program run by another tool (`find -exec`)
    pub fn exec_prefix(&self, program: &str) -> Vec<String> {
        if self.use_sudo {
            vec!["sudo".to_string(), program.to_string()]
        } else {
            vec![program.to_string()]
        }
    }
}

/// Check if running as root (EUID 0)
pub fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail
    unsafe { libc::geteuid() == 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privileged_with_sudo() {
        let cmd = Elevation::new(true).privileged("systemctl", ["start", "httpd"]);
        assert_eq!(cmd.argv(), vec!["sudo", "systemctl", "start", "httpd"]);
    }

    #[test]
    fn test_privileged_without_sudo() {
        let cmd = Elevation::new(false).privileged("systemctl", ["start", "httpd"]);
        assert_eq!(cmd.argv(), vec!["systemctl", "start", "httpd"]);
    }

    #[test]
    fn test_exec_prefix() {
        assert_eq!(Elevation::new(true).exec_prefix("chmod"), vec!["sudo", "chmod"]);
        assert_eq!(Elevation::new(false).exec_prefix("chmod"), vec!["chmod"]);
    }
}
