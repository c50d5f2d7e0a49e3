use recipe::{CommandOutput, CommandRunner, CommandSpec, Error, Result};
use std::process::{Command, Stdio};

/// Runs commands on this host and captures their output
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
        log::debug!("exec {:?}", command.argv());

        let output = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::spawn(command.to_string(), e))?;

        let output = CommandOutput::from(output);
        log::debug!("{} exited with {:?}", command.program, output.exit_code);
        Ok(output)
    }
}

/// Check if a command exists
pub fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
