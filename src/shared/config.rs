use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::Deserialize;

use crate::infra::credential::DEFAULT_SERVICE;
use crate::infra::git::StatusFormat;
use crate::shared::dirs;

/// Top-level configuration for gitsync.
#[derive(Debug, Default, Deserialize, JsonSchema, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Git invocation settings.
    #[serde(default)]
    pub git: GitConfig,

    /// Plaintext credential bridge used during a push.
    #[serde(default)]
    pub secret_file: SecretFileConfig,

    /// Durable credential storage.
    #[serde(default)]
    pub credential: CredentialConfig,

    /// Interactive push session settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Commit settings.
    #[serde(default)]
    pub commit: CommitConfig,

    /// Push cycle locking.
    #[serde(default)]
    pub lock: LockConfig,
}

/// Git invocation configuration.
#[derive(Debug, Deserialize, JsonSchema, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GitConfig {
    /// Git executable (default: "git").
    #[serde(default = "default_git_program")]
    #[schemars(default = "default_git_program")]
    pub program: String,

    /// Status output to parse: "human" or "porcelain" (default: "human").
    #[serde(default)]
    pub status_format: StatusFormat,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            program: default_git_program(),
            status_format: StatusFormat::default(),
        }
    }
}

/// Plaintext credential bridge configuration.
#[derive(Debug, Deserialize, JsonSchema, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SecretFileConfig {
    /// Where the token is written for the duration of a push
    /// (default: ~/git_token.txt).
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Environment variable telling the credential manager where the
    /// plaintext store lives (default: "GCM_PLAINTEXT_STORE_PATH").
    #[serde(default = "default_bridge_env_var")]
    #[schemars(default = "default_bridge_env_var")]
    pub env_var: String,

    /// Value written to the repository's `credential.credentialStore`
    /// (default: "plaintext").
    #[serde(default = "default_credential_store")]
    #[schemars(default = "default_credential_store")]
    pub credential_store: String,
}

impl Default for SecretFileConfig {
    fn default() -> Self {
        Self {
            path: None,
            env_var: default_bridge_env_var(),
            credential_store: default_credential_store(),
        }
    }
}

impl SecretFileConfig {
    /// Configured path, or `git_token.txt` in the home directory.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path
            .clone()
            .or_else(|| dirs::home_dir().map(|home| home.join("git_token.txt")))
    }
}

/// Durable credential storage configuration.
#[derive(Debug, Deserialize, JsonSchema, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CredentialConfig {
    /// Keyring service name (default: "git_token").
    #[serde(default = "default_keyring_service")]
    #[schemars(default = "default_keyring_service")]
    pub service: String,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            service: default_keyring_service(),
        }
    }
}

/// Interactive push session configuration.
#[derive(Debug, Deserialize, JsonSchema, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Regex matching the username prompt.
    #[serde(default = "default_username_prompt")]
    #[schemars(default = "default_username_prompt")]
    pub username_prompt: String,

    /// Regex matching the password prompt.
    #[serde(default = "default_password_prompt")]
    #[schemars(default = "default_password_prompt")]
    pub password_prompt: String,

    /// Seconds to wait for each prompt (default: 30).
    #[serde(default = "default_prompt_timeout_secs")]
    #[schemars(default = "default_prompt_timeout_secs")]
    pub prompt_timeout_secs: u64,

    /// Seconds to wait for the push to finish after the last answer.
    /// Unset waits indefinitely.
    #[serde(default)]
    pub exit_timeout_secs: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            username_prompt: default_username_prompt(),
            password_prompt: default_password_prompt(),
            prompt_timeout_secs: default_prompt_timeout_secs(),
            exit_timeout_secs: None,
        }
    }
}

/// Commit configuration.
#[derive(Debug, Deserialize, JsonSchema, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CommitConfig {
    /// Message used when none is given on the command line.
    #[serde(default = "default_commit_message")]
    #[schemars(default = "default_commit_message")]
    pub default_message: String,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            default_message: default_commit_message(),
        }
    }
}

/// Push cycle lock configuration.
#[derive(Debug, Default, Deserialize, JsonSchema, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LockConfig {
    /// Directory holding per-repository lock files
    /// (default: $XDG_CACHE_HOME/gitsync/locks).
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl LockConfig {
    pub fn resolved_dir(&self) -> Option<PathBuf> {
        self.dir
            .clone()
            .or_else(|| dirs::app_cache_dir().map(|cache| cache.join("locks")))
    }
}

fn default_git_program() -> String {
    "git".to_string()
}

fn default_bridge_env_var() -> String {
    "GCM_PLAINTEXT_STORE_PATH".to_string()
}

fn default_credential_store() -> String {
    "plaintext".to_string()
}

fn default_keyring_service() -> String {
    DEFAULT_SERVICE.to_string()
}

fn default_username_prompt() -> String {
    r"(?i)username[^\n]*:\s*$".to_string()
}

fn default_password_prompt() -> String {
    r"(?i)password[^\n]*:\s*$".to_string()
}

fn default_prompt_timeout_secs() -> u64 {
    30
}

fn default_commit_message() -> String {
    "Default commit message (generated by gsync commit).".to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read config file (permission error, etc.)
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// YAML parse error
    #[error("Invalid config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },
}

/// Load configuration from ~/.config/gitsync/config.ya?ml.
/// Returns Config::default() if no config file exists.
pub fn load_config() -> anyhow::Result<Config> {
    let Some(dir) = dirs::app_config_dir() else {
        return Ok(Config::default());
    };
    load_config_from_dir(&dir)
}

/// Load configuration from a specific directory.
/// Searches for config.yaml, then config.yml in the given directory.
pub fn load_config_from_dir(dir: &Path) -> anyhow::Result<Config> {
    for filename in &["config.yaml", "config.yml"] {
        let path = dir.join(filename);
        match std::fs::read_to_string(&path) {
            Ok(content) => return parse_config(&content, &path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(ConfigError::ReadError { path, source: e }.into()),
        }
    }

    Ok(Config::default())
}

fn parse_config(content: &str, path: &Path) -> anyhow::Result<Config> {
    serde_yaml::from_str(content)
        .map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
        .map_err(Into::into)
}

/// Generate JSON Schema for the Config struct.
pub fn generate_schema() -> schemars::Schema {
    schemars::schema_for!(Config)
}
