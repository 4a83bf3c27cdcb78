//! Deployment settings resolved from the process environment and the `.env` file.

use crate::env::{
    AGENT_PATH, APP_NAME, EnvFile, GOOGLE_API_KEY, GOOGLE_CLOUD_LOCATION, GOOGLE_CLOUD_PROJECT,
    GOOGLE_GENAI_USE_VERTEXAI, SERVICE_NAME,
};
use crate::error::{DeployError, Result};
use std::path::{Path, PathBuf};

/// Cloud Run rejects longer service names.
pub const MAX_SERVICE_NAME_LEN: usize = 63;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    /// May still be filled in from `gcloud config get-value project`.
    pub project: Option<String>,
    pub location: String,
    pub service_name: String,
    pub app_name: String,
    pub agent_path: PathBuf,
    pub use_vertex: bool,
    pub api_key: Option<String>,
}

/// `1`, `true` and `yes` (any case) are true; everything else is false.
pub fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

pub fn validate_service_name(name: &str) -> std::result::Result<(), String> {
    if name.len() > MAX_SERVICE_NAME_LEN {
        return Err(format!("must be at most {MAX_SERVICE_NAME_LEN} characters"));
    }
    if !name.starts_with(|c: char| c.is_ascii_lowercase()) {
        return Err("must start with a lowercase letter".to_string());
    }
    if name.ends_with('-') {
        return Err("must not end with a hyphen".to_string());
    }
    if !name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
        return Err("may only contain lowercase letters, digits and hyphens".to_string());
    }
    Ok(())
}

pub fn validate_app_name(name: &str) -> std::result::Result<(), String> {
    if crate::env::is_valid_key(name) {
        Ok(())
    } else {
        Err("must be an identifier (letters, digits and underscores, not starting with a digit)"
            .to_string())
    }
}

/// Lookup that prefers the process environment and falls back to `file`.
/// Empty values count as unset at every layer.
pub fn layered_lookup<'a>(
    file: Option<&'a EnvFile>,
    process: impl Fn(&str) -> Option<String> + 'a,
) -> impl Fn(&str) -> Option<String> + 'a {
    move |key| {
        process(key)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| file.and_then(|f| f.get(key)).map(str::to_string))
            .filter(|v| !v.trim().is_empty())
    }
}

impl DeployConfig {
    /// Resolves against the real process environment layered over `file`.
    pub fn from_sources(file: Option<&EnvFile>) -> Result<Self> {
        Self::resolve(layered_lookup(file, |key| std::env::var(key).ok()))
    }

    /// Builds and validates a configuration. Every problem is reported at once.
    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut problems = Vec::new();

        let mut require = |key: &str| {
            let value = get(key);
            if value.is_none() {
                problems.push(format!("{key} is not set"));
            }
            value.unwrap_or_default()
        };

        let location = require(GOOGLE_CLOUD_LOCATION);
        let service_name = require(SERVICE_NAME);
        let app_name = require(APP_NAME);
        let agent_path = require(AGENT_PATH);

        let use_vertex = get(GOOGLE_GENAI_USE_VERTEXAI).is_some_and(|v| is_truthy(&v));
        let api_key = get(GOOGLE_API_KEY);
        if !use_vertex && api_key.is_none() {
            problems.push(format!(
                "{GOOGLE_API_KEY} is not set (required unless {GOOGLE_GENAI_USE_VERTEXAI}=TRUE)"
            ));
        }

        if !service_name.is_empty() {
            if let Err(reason) = validate_service_name(&service_name) {
                problems.push(format!("{SERVICE_NAME} `{service_name}` {reason}"));
            }
        }
        if !app_name.is_empty() {
            if let Err(reason) = validate_app_name(&app_name) {
                problems.push(format!("{APP_NAME} `{app_name}` {reason}"));
            }
        }

        if !problems.is_empty() {
            return Err(DeployError::InvalidConfig(problems));
        }

        Ok(Self {
            project: get(GOOGLE_CLOUD_PROJECT),
            location,
            service_name,
            app_name,
            agent_path: PathBuf::from(agent_path),
            use_vertex,
            api_key,
        })
    }

    /// Agent directory as seen from `workdir`.
    pub fn agent_dir(&self, workdir: &Path) -> PathBuf {
        if self.agent_path.is_absolute() {
            self.agent_path.clone()
        } else {
            workdir.join(&self.agent_path)
        }
    }

    pub fn check_agent_dir(&self, workdir: &Path) -> Result<()> {
        let dir = self.agent_dir(workdir);
        if dir.is_dir() {
            Ok(())
        } else {
            Err(DeployError::InvalidConfig(vec![format!(
                "{AGENT_PATH} `{}` is not a directory",
                dir.display()
            )]))
        }
    }
}
