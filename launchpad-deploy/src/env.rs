//! The `.env` file: parsing, editing and the deployment template.
//!
//! The file stays shell-sourceable: `KEY=value` and `export KEY=value` lines,
//! `#` comments and blank lines. Editing keeps comments, order and each
//! entry's `export` flag. Trailing inline comments on value lines are not
//! preserved.

use crate::error::{DeployError, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
pub const GOOGLE_GENAI_USE_VERTEXAI: &str = "GOOGLE_GENAI_USE_VERTEXAI";
pub const GOOGLE_CLOUD_PROJECT: &str = "GOOGLE_CLOUD_PROJECT";
pub const GOOGLE_CLOUD_LOCATION: &str = "GOOGLE_CLOUD_LOCATION";
pub const AGENT_PATH: &str = "AGENT_PATH";
pub const SERVICE_NAME: &str = "SERVICE_NAME";
pub const APP_NAME: &str = "APP_NAME";

pub const KNOWN_KEYS: [&str; 7] = [
    GOOGLE_API_KEY,
    GOOGLE_GENAI_USE_VERTEXAI,
    GOOGLE_CLOUD_PROJECT,
    GOOGLE_CLOUD_LOCATION,
    AGENT_PATH,
    SERVICE_NAME,
    APP_NAME,
];

pub const DEFAULT_LOCATION: &str = "us-central1";
pub const DEFAULT_AGENT_PATH: &str = "./my_agent";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvEntry {
    pub key: String,
    pub value: String,
    pub exported: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvLine {
    Blank,
    /// Full comment line, including the leading `#`.
    Comment(String),
    Entry(EnvEntry),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    lines: Vec<EnvLine>,
}

/// Values substituted into [`EnvFile::template`]. `None` leaves the key empty
/// (or at its default for location and agent path).
#[derive(Debug, Clone, Default)]
pub struct TemplateValues {
    pub api_key: Option<String>,
    pub use_vertex: bool,
    pub project: Option<String>,
    pub location: Option<String>,
    pub agent_path: Option<String>,
    pub service_name: Option<String>,
    pub app_name: Option<String>,
}

pub fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl EnvFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_named("<input>", text)
    }

    /// Parses `text`, naming `origin` in error messages.
    pub fn parse_named(origin: &str, text: &str) -> Result<Self> {
        let mut lines = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = parse_line(raw).map_err(|message| DeployError::EnvParse {
                origin: origin.to_string(),
                line: index + 1,
                message,
            })?;
            lines.push(line);
        }
        Ok(Self { lines })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse_named(&path.display().to_string(), &text)
    }

    /// Like [`EnvFile::load`], but a missing file yields an empty `EnvFile`.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse_named(&path.display().to_string(), &text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn lines(&self) -> &[EnvLine] {
        &self.lines
    }

    pub fn entries(&self) -> impl Iterator<Item = &EnvEntry> {
        self.lines.iter().filter_map(|line| match line {
            EnvLine::Entry(entry) => Some(entry),
            _ => None,
        })
    }

    /// Value of the last occurrence of `key`, as a shell sourcing the file would see it.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries().filter(|e| e.key == key).last().map(|e| e.value.as_str())
    }

    /// Updates the last occurrence of `key` in place, or appends a plain entry.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.upsert(key.into(), value.into(), false);
    }

    /// Like [`EnvFile::set`], but a newly appended entry is written with `export`.
    pub fn set_exported(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.upsert(key.into(), value.into(), true);
    }

    fn upsert(&mut self, key: String, value: String, export_if_new: bool) {
        let existing = self.lines.iter_mut().rev().find_map(|line| match line {
            EnvLine::Entry(entry) if entry.key == key => Some(entry),
            _ => None,
        });
        match existing {
            Some(entry) => entry.value = value,
            None => {
                self.lines.push(EnvLine::Entry(EnvEntry { key, value, exported: export_if_new }))
            }
        }
    }

    pub fn push_comment(&mut self, text: impl AsRef<str>) {
        self.lines.push(EnvLine::Comment(format!("# {}", text.as_ref())));
    }

    pub fn push_blank(&mut self) {
        self.lines.push(EnvLine::Blank);
    }

    pub fn to_map(&self) -> HashMap<String, String> {
        self.entries().map(|e| (e.key.clone(), e.value.clone())).collect()
    }

    pub fn render(&self) -> String {
        self.to_string()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.render())?;
        Ok(())
    }

    /// The canonical deployment template.
    pub fn template(values: &TemplateValues) -> Self {
        let or_empty = |v: &Option<String>| v.clone().unwrap_or_default();

        let mut file = Self::new();
        file.push_comment("Model access");
        file.set(GOOGLE_GENAI_USE_VERTEXAI, if values.use_vertex { "TRUE" } else { "FALSE" });
        file.set(GOOGLE_API_KEY, or_empty(&values.api_key));
        file.set(GOOGLE_CLOUD_PROJECT, or_empty(&values.project));
        file.set(
            GOOGLE_CLOUD_LOCATION,
            values.location.clone().unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
        );
        file.push_blank();
        file.push_comment("Cloud Run deployment");
        file.set_exported(
            AGENT_PATH,
            values.agent_path.clone().unwrap_or_else(|| DEFAULT_AGENT_PATH.to_string()),
        );
        file.set_exported(SERVICE_NAME, or_empty(&values.service_name));
        file.set_exported(APP_NAME, or_empty(&values.app_name));
        file
    }

    /// Writes the template to `path`. An existing file is only replaced when `force` is set.
    pub fn write_template(path: &Path, values: &TemplateValues, force: bool) -> Result<Self> {
        if path.exists() && !force {
            return Err(DeployError::EnvFileExists(path.to_path_buf()));
        }
        let file = Self::template(values);
        file.save(path)?;
        tracing::info!(path = %path.display(), "environment template written");
        Ok(file)
    }
}

impl fmt::Display for EnvFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            match line {
                EnvLine::Blank => writeln!(f)?,
                EnvLine::Comment(text) => writeln!(f, "{text}")?,
                EnvLine::Entry(entry) => {
                    if entry.exported {
                        write!(f, "export ")?;
                    }
                    writeln!(f, "{}={}", entry.key, quote_value(&entry.value))?;
                }
            }
        }
        Ok(())
    }
}

/// Exports the file's variables into the process environment.
/// Variables that are already set keep their current value.
pub fn load_into_process(path: &Path) -> Result<()> {
    dotenvy::from_path(path)?;
    tracing::debug!(path = %path.display(), "environment file loaded");
    Ok(())
}

fn parse_line(raw: &str) -> std::result::Result<EnvLine, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(EnvLine::Blank);
    }
    if trimmed.starts_with('#') {
        return Ok(EnvLine::Comment(trimmed.to_string()));
    }

    let (exported, rest) = match trimmed.strip_prefix("export") {
        Some(rest) if rest.starts_with(char::is_whitespace) => (true, rest.trim_start()),
        _ => (false, trimmed),
    };

    let (key, value) = rest
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=value, found `{trimmed}`"))?;
    let key = key.trim();
    if !is_valid_key(key) {
        return Err(format!("invalid variable name `{key}`"));
    }

    let value = parse_value(value.trim())?;
    Ok(EnvLine::Entry(EnvEntry { key: key.to_string(), value, exported }))
}

fn parse_value(raw: &str) -> std::result::Result<String, String> {
    if let Some(body) = raw.strip_prefix('"') {
        let mut value = String::new();
        let mut chars = body.char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    check_trailing(&body[i + 1..])?;
                    return Ok(value);
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, '"')) => value.push('"'),
                    Some((_, '\\')) => value.push('\\'),
                    Some((_, other)) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => break,
                },
                _ => value.push(c),
            }
        }
        return Err("unterminated double-quoted value".to_string());
    }

    if let Some(body) = raw.strip_prefix('\'') {
        let end = body.find('\'').ok_or_else(|| "unterminated single-quoted value".to_string())?;
        check_trailing(&body[end + 1..])?;
        return Ok(body[..end].to_string());
    }

    // Unquoted: a `#` preceded by whitespace starts a comment.
    let value = match raw.find(" #").or_else(|| raw.find("\t#")) {
        Some(pos) => raw[..pos].trim_end(),
        None => raw,
    };
    Ok(value.to_string())
}

fn check_trailing(rest: &str) -> std::result::Result<(), String> {
    let rest = rest.trim();
    if rest.is_empty() || rest.starts_with('#') {
        Ok(())
    } else {
        Err(format!("unexpected `{rest}` after closing quote"))
    }
}

fn quote_value(value: &str) -> String {
    let needs_quotes = value
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '#' | '"' | '\'' | '\\'));
    if !needs_quotes {
        return value.to_string();
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}
