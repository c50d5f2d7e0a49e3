use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("hostprep"))
}

/// Get the default config file path
pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

// ============================================================================
// Host Config
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Package providing the web server
    pub package: String,
    /// Service unit name
    pub service: String,
    pub package_manager: String,
    /// Login user granted write access to the web root
    pub web_user: String,
    pub web_group: String,
    pub web_root: String,
    pub document_root: String,
    /// Prefix privileged commands with sudo
    pub use_sudo: bool,
    pub release_file: String,
    /// Marker expected in the release file
    pub expected_distribution: String,
    pub metadata: MetadataConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Request a session token before querying (IMDSv2)
    pub imdsv2: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            package: "httpd".to_string(),
            service: "httpd".to_string(),
            package_manager: "dnf".to_string(),
            web_user: "ec2-user".to_string(),
            web_group: "apache".to_string(),
            web_root: "/var/www".to_string(),
            document_root: "/var/www/html".to_string(),
            use_sudo: true,
            release_file: "/etc/system-release".to_string(),
            expected_distribution: "Amazon Linux".to_string(),
            metadata: MetadataConfig::default(),
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://169.254.169.254".to_string(),
            timeout_secs: 5,
            imdsv2: true,
        }
    }
}

impl MetadataConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load config from an explicit path, the default location, or defaults
    ///
    /// An explicit path must exist. The default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load_from(path)?,
            None => {
                let default_path = default_config_path()?;
                if default_path.exists() {
                    Self::load_from(&default_path)?
                } else {
                    log::debug!("No config at {}, using defaults", default_path.display());
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file
    pub fn load_from(path: &Path) -> Result<Self> {
        log::debug!("Loading config from {}", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Render the effective config as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Could not serialize config")
    }

    pub fn web_root_path(&self) -> PathBuf {
        expand(&self.web_root)
    }

    pub fn document_root_path(&self) -> PathBuf {
        expand(&self.document_root)
    }

    /// Where the test page is written
    pub fn index_path(&self) -> PathBuf {
        self.document_root_path().join("index.html")
    }

    pub fn release_path(&self) -> PathBuf {
        expand(&self.release_file)
    }

    /// Check the config before any step is built
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("package", &self.package),
            ("service", &self.service),
            ("package_manager", &self.package_manager),
            ("web_user", &self.web_user),
            ("web_group", &self.web_group),
        ] {
            validate_name(field, value)?;
        }

        for (field, path) in [
            ("web_root", self.web_root_path()),
            ("document_root", self.document_root_path()),
            ("release_file", self.release_path()),
        ] {
            if !path.is_absolute() {
                bail!("{} must be an absolute path, got '{}'", field, path.display());
            }
        }

        if !self.document_root_path().starts_with(self.web_root_path()) {
            bail!(
                "document_root '{}' must be inside web_root '{}'",
                self.document_root,
                self.web_root
            );
        }

        if self.expected_distribution.trim().is_empty() {
            bail!("expected_distribution must not be empty");
        }

        if self.metadata.timeout_secs == 0 {
            bail!("metadata.timeout_secs must be greater than zero");
        }

        let endpoint = &self.metadata.endpoint;
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            bail!("metadata.endpoint must be an http(s) URL, got '{}'", endpoint);
        }

        Ok(())
    }
}

/// Names end up as single argv entries; keep them word-shaped
fn validate_name(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        bail!("{} must not be empty", field);
    }
    if value.starts_with('-') {
        bail!("{} must not start with '-', got '{}'", field, value);
    }
    if value.chars().any(char::is_whitespace) {
        bail!("{} must not contain whitespace, got '{}'", field, value);
    }
    Ok(())
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.index_path(), PathBuf::from("/var/www/html/index.html"));
        assert_eq!(config.metadata.timeout(), Duration::from_secs(5));
        assert!(config.use_sudo);
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "package = \"nginx\"\nservice = \"nginx\"\n\n[metadata]\ntimeout_secs = 2\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.package, "nginx");
        assert_eq!(config.service, "nginx");
        assert_eq!(config.package_manager, "dnf");
        assert_eq!(config.metadata.timeout_secs, 2);
        assert!(config.metadata.imdsv2);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("Could not read"));
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "pakage = \"httpd\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_toml_roundtrip_of_defaults() {
        let config = Config::default();
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("package = \"httpd\""));
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validate_rejects_bad_names() {
        let config = Config {
            package: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            service: "--now".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            web_user: "ec2 user".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_paths() {
        let config = Config {
            web_root: "var/www".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            document_root: "/srv/html".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must be inside web_root"));
    }

    #[test]
    fn test_validate_rejects_bad_metadata() {
        let mut config = Config::default();
        config.metadata.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.metadata.endpoint = "169.254.169.254".to_string();
        assert!(config.validate().is_err());
    }
}
