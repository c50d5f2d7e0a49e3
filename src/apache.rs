//! The Apache web server recipe
//!
//! Nine steps, always in the same order. Names, users, groups and paths come
//! from [`Config`]; nothing here touches the host.

use crate::config::Config;
use crate::metadata;
use crate::sudo::Elevation;
use recipe::{CommandSpec, Invocation, Provisioner, Step, StepAction, StepKind};

/// Test page written to the document root
pub const TEST_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Apache Test Page</title>
</head>
<body>
    <h1>Apache Web Server is Running!</h1>
    <p>Congratulations! Your Apache web server is successfully installed and running on Amazon Linux 2023.</p>
    <p>Server time: <script>document.write(new Date());</script></p>
</body>
</html>"#;

/// Build the provisioner for `config`
pub fn provisioner(config: &Config) -> Provisioner {
    Provisioner::new(build_steps(config))
}

/// Build the ordered step table
pub fn build_steps(config: &Config) -> Vec<Step> {
    let sudo = Elevation::new(config.use_sudo);
    let pm = config.package_manager.as_str();
    let service = config.service.as_str();

    vec![
        Step::new(
            "check-system",
            "Checking system version",
            StepKind::Introspect,
            StepAction::CheckRelease {
                path: config.release_path(),
                marker: config.expected_distribution.clone(),
            },
        ),
        Step::command(
            "update-packages",
            "Updating system packages",
            StepKind::Mutate,
            sudo.privileged(pm, ["update", "-y"]),
        ),
        Step::command(
            "install-package",
            format!("Installing Apache web server ({})", config.package),
            StepKind::Mutate,
            sudo.privileged(pm, ["install", "-y", config.package.as_str()]),
        ),
        Step::command(
            "start-service",
            "Starting Apache web server",
            StepKind::Mutate,
            sudo.privileged("systemctl", ["start", service]),
        ),
        Step::command(
            "enable-service",
            "Enabling Apache to start on boot",
            StepKind::Mutate,
            sudo.privileged("systemctl", ["enable", service]),
        ),
        Step::new(
            "set-permissions",
            "Setting web directory permissions",
            StepKind::Mutate,
            StepAction::Run(permission_commands(config, sudo)),
        ),
        Step::new(
            "write-test-page",
            "Creating test HTML page",
            StepKind::Mutate,
            StepAction::WriteFile {
                path: config.index_path(),
                contents: TEST_PAGE.to_string(),
            },
        ),
        Step::command(
            "check-status",
            "Checking Apache service status",
            StepKind::Introspect,
            sudo.privileged("systemctl", ["status", service, "--no-pager"]),
        ),
        Step::new(
            "fetch-public-address",
            "Getting instance public IP address",
            StepKind::Introspect,
            StepAction::FetchPublicAddress {
                source: metadata::public_ipv4_url(&config.metadata.endpoint),
            },
        ),
    ]
}

fn permission_commands(config: &Config, sudo: Elevation) -> Vec<Invocation> {
    let web_root = config.web_root.as_str();
    let user = config.web_user.as_str();
    let group = config.web_group.as_str();
    let owner = format!("{user}:{group}");

    let find_chmod = |kind: &str, mode: &str| {
        CommandSpec::new("find")
            .args([web_root, "-type", kind, "-exec"])
            .args(sudo.exec_prefix("chmod"))
            .args([mode, "{}", ";"])
    };

    vec![
        Invocation::new(
            format!("Adding {user} to {group} group"),
            sudo.privileged("usermod", ["-a", "-G", group, user]),
        ),
        Invocation::new(
            format!("Changing ownership of {web_root}"),
            sudo.privileged("chown", ["-R", owner.as_str(), web_root]),
        ),
        Invocation::new(
            format!("Setting permissions on {web_root}"),
            sudo.privileged("chmod", ["2775", web_root]),
        ),
        Invocation::new("Setting directory permissions", find_chmod("d", "2775")),
        Invocation::new("Setting file permissions", find_chmod("f", "0664")),
    ]
}
