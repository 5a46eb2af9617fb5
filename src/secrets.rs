use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::auth::Credentials;
use crate::exec::DEFAULT_COMMAND_TIMEOUT_SECS;

pub const SECRETS_PATH_ENV_VAR: &str = "CHAT_CONSOLE_SECRETS_PATH";
pub const DEFAULT_SECRETS_PATH: &str = "secrets.toml";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Error)]
pub enum SecretsError {
    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse secrets file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("secrets file {path} has an empty login field '{field}'")]
    EmptyLoginField { path: PathBuf, field: &'static str },

    #[error("secrets file {path} has executor timeout 0; expected > 0")]
    ZeroTimeout { path: PathBuf },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SecretsFile {
    login: LoginSection,
    executor: Option<ExecutorSection>,
    api: Option<ApiSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LoginSection {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExecutorSection {
    timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ApiSection {
    model: Option<String>,
    base_url: Option<String>,
}

/// Process-start-time configuration resolved from the secrets file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secrets {
    pub credentials: Credentials,
    pub command_timeout_secs: u64,
    pub model: String,
    pub base_url: Option<String>,
}

impl Secrets {
    pub fn load(path: &Path) -> Result<Self, SecretsError> {
        let raw = fs::read_to_string(path).map_err(|source| SecretsError::Io {
            operation: "reading secrets file",
            path: path.to_path_buf(),
            source,
        })?;

        let parsed: SecretsFile =
            toml::from_str(&raw).map_err(|source| SecretsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if parsed.login.username.is_empty() {
            return Err(SecretsError::EmptyLoginField {
                path: path.to_path_buf(),
                field: "username",
            });
        }
        if parsed.login.password.is_empty() {
            return Err(SecretsError::EmptyLoginField {
                path: path.to_path_buf(),
                field: "password",
            });
        }

        let command_timeout_secs = match parsed.executor {
            Some(ExecutorSection { timeout_secs: 0 }) => {
                return Err(SecretsError::ZeroTimeout {
                    path: path.to_path_buf(),
                });
            }
            Some(ExecutorSection { timeout_secs }) => timeout_secs,
            None => DEFAULT_COMMAND_TIMEOUT_SECS,
        };

        let (model, base_url) = match parsed.api {
            Some(api) => (
                api.model
                    .filter(|model| !model.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
                api.base_url.filter(|url| !url.trim().is_empty()),
            ),
            None => (DEFAULT_CHAT_MODEL.to_string(), None),
        };

        Ok(Self {
            credentials: Credentials::new(parsed.login.username, parsed.login.password),
            command_timeout_secs,
            model,
            base_url,
        })
    }

    /// Resolves the secrets path from `CHAT_CONSOLE_SECRETS_PATH`, falling
    /// back to `./secrets.toml`.
    pub fn load_from_env() -> Result<Self, SecretsError> {
        let path = std::env::var(SECRETS_PATH_ENV_VAR)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_SECRETS_PATH.to_string());
        Self::load(Path::new(&path))
    }
}
