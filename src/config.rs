use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub imap_host: Option<String>,
    pub imap_user: Option<String>,
    pub imap_pass: Option<String>,
    pub imap_port: u16,
    pub imap_folder: String,
    pub scan_limit: usize,
    pub classifier: ClassifierKind,
    pub rspamd_url: String,
    pub classifier_command: String,
    pub classifier_timeout_seconds: u64,
    pub log_file: Option<String>,
    pub log_level: Option<String>,
    #[serde(default)]
    pub quiet: bool,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// POST to the rspamd HTTP controller
    Rspamd,
    /// Pipe into a local command, exit status 1 means spam
    Command,
}

impl ClassifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassifierKind::Rspamd => "rspamd",
            ClassifierKind::Command => "command",
        }
    }
}

/// Values given on the command line, applied on top of file and environment
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub limit: Option<usize>,
    pub classifier: Option<ClassifierKind>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

pub const USAGE_HINT: &str = "Set IMAP_HOST, IMAP_USER, IMAP_PASS";

pub const DEFAULT_IMAP_PORT: u16 = 993;
pub const DEFAULT_SCAN_LIMIT: usize = 10;
pub const DEFAULT_RSPAMD_URL: &str = "http://localhost:11333";
pub const DEFAULT_CLASSIFIER_COMMAND: &str = "rspamc";
pub const DEFAULT_CLASSIFIER_TIMEOUT_SECONDS: u64 = 30;

impl AppConfig {
    // Load defaults, then the config file, then environment variables, then CLI flags.
    // Environment keys are unprefixed so that IMAP_HOST maps to `imap_host`.
    pub fn new(path: Option<&str>, overrides: &CliOverrides) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name("config").required(false),
        };

        Self::configure_defaults()?
            .add_source(file)
            .add_source(Environment::default())
            .set_override_option("scan_limit", overrides.limit.map(|n| n as i64))?
            .set_override_option("classifier", overrides.classifier.map(|k| k.as_str()))?
            .build()?
            .try_deserialize()
    }

    fn configure_defaults()
    -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("imap_port", DEFAULT_IMAP_PORT as i64)?
            .set_default("imap_folder", "INBOX")?
            .set_default("scan_limit", DEFAULT_SCAN_LIMIT as i64)?
            .set_default("classifier", ClassifierKind::Rspamd.as_str())?
            .set_default("rspamd_url", DEFAULT_RSPAMD_URL)?
            .set_default("classifier_command", DEFAULT_CLASSIFIER_COMMAND)?
            .set_default(
                "classifier_timeout_seconds",
                DEFAULT_CLASSIFIER_TIMEOUT_SECONDS as i64,
            )
    }

    /// Returns the mailbox credentials, failing if any required value is unset or empty.
    pub fn credentials(&self) -> anyhow::Result<Credentials> {
        let required = [
            ("IMAP_HOST", &self.imap_host),
            ("IMAP_USER", &self.imap_user),
            ("IMAP_PASS", &self.imap_pass),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.as_deref().is_none_or(str::is_empty))
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(anyhow::anyhow!("Missing {}", missing.join(", ")));
        }

        Ok(Credentials {
            host: self.imap_host.clone().unwrap_or_default(),
            port: self.imap_port,
            username: self.imap_user.clone().unwrap_or_default(),
            password: self.imap_pass.clone().unwrap_or_default(),
        })
    }

    pub fn classifier_timeout(&self) -> Duration {
        Duration::from_secs(self.classifier_timeout_seconds)
    }

    /// Splits `classifier_command` into program and arguments
    pub fn classifier_argv(&self) -> anyhow::Result<(String, Vec<String>)> {
        let mut parts = self.classifier_command.split_whitespace().map(String::from);
        let program = parts
            .next()
            .ok_or_else(|| anyhow::anyhow!("classifier_command is empty"))?;
        Ok((program, parts.collect()))
    }
}
