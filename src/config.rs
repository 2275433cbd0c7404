//! Configuration: endpoint, table names, user filter
//!
//! Values come from `~/.revdash/config.json` (optional) and are overridden by
//! command-line flags or environment variables.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::gateway::Filter;
use crate::types::{Result, RevdashError};

/// Config file name inside the data directory
const CONFIG_FILE: &str = "config.json";

/// Remote table names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub users: String,
    pub packages: String,
    pub email_costs: String,
    pub chat_costs: String,
    pub call_costs: String,
    pub invoices: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            users: "users".into(),
            packages: "manual_charges".into(),
            email_costs: "email_daily_costs".into(),
            chat_costs: "chat_daily_costs".into(),
            call_costs: "call_daily_costs".into(),
            invoices: "Invoices_Pending".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data endpoint URL
    pub endpoint: Option<String>,
    pub tables: TableNames,
    /// Filter applied when listing users (admin exclusion)
    pub user_filter: Filter,
}

impl Default for Config {
    fn default() -> Self {
        let mut user_filter = Filter::new();
        user_filter.insert("is_admin".into(), Value::Bool(false));
        Self {
            endpoint: None,
            tables: TableNames::default(),
            user_filter,
        }
    }
}

impl Config {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map_err(|e| {
            RevdashError::Config(format!("invalid config {}: {}", path.display(), e))
        })
    }

    /// Load from the default location
    pub fn load_default() -> Result<Self> {
        Self::load(&Self::default_path()?)
    }

    /// Default config path (~/.revdash/config.json)
    pub fn default_path() -> Result<PathBuf> {
        Ok(data_dir()?.join(CONFIG_FILE))
    }

    /// Apply a flag/env endpoint on top of the file value
    pub fn with_endpoint(mut self, endpoint: Option<String>) -> Self {
        if let Some(endpoint) = endpoint {
            self.endpoint = Some(endpoint);
        }
        self
    }

    /// Endpoint URL, required for any fetch
    pub fn endpoint(&self) -> Result<&str> {
        match self.endpoint.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(RevdashError::Config(
                "no endpoint configured (use --endpoint or REVDASH_ENDPOINT)".into(),
            )),
        }
    }
}

/// revdash data directory (~/.revdash)
pub fn data_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new()
        .ok_or_else(|| RevdashError::Config("Failed to get home directory".into()))?
        .home_dir()
        .to_path_buf();
    Ok(home.join(".revdash"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.tables.packages, "manual_charges");
        assert_eq!(config.tables.invoices, "Invoices_Pending");
        assert_eq!(config.user_filter.get("is_admin"), Some(&json!(false)));
        assert!(config.endpoint().is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"endpoint": "https://example.test/query", "tables": {"chat_costs": "chats_v2"}}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.endpoint().unwrap(), "https://example.test/query");
        assert_eq!(config.tables.chat_costs, "chats_v2");
        assert_eq!(config.tables.users, "users");
        assert_eq!(config.user_filter.get("is_admin"), Some(&json!(false)));
    }

    #[test]
    fn test_load_invalid_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ endpoint: ").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, RevdashError::Config(_)));
    }

    #[test]
    fn test_endpoint_override() {
        let config = Config {
            endpoint: Some("https://file.test".into()),
            ..Config::default()
        };
        let config = config.with_endpoint(Some("https://flag.test".into()));
        assert_eq!(config.endpoint().unwrap(), "https://flag.test");

        let config = config.with_endpoint(None);
        assert_eq!(config.endpoint().unwrap(), "https://flag.test");
    }

    #[test]
    fn test_blank_endpoint_rejected() {
        let config = Config::default().with_endpoint(Some("  ".into()));
        assert!(config.endpoint().is_err());
    }
}
