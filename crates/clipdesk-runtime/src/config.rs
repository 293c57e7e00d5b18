//! Deployment configuration read from `CLIPDESK_*` environment variables, and
//! the startup health check that gates serving traffic.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

#[cfg(feature = "sheets")]
use clipdesk_ledger::{SheetsConfig, SheetsRowStore};
#[cfg(feature = "sqlite-persistence")]
use clipdesk_ledger::SqliteRowStore;
use clipdesk_ledger::{MemoryRowStore, SharedRowStore};

use super::completion::CompletionMode;
use super::ledger::IdentityKey;
use super::models::{LedgerColumns, StatusMarkers};
use super::session::Credentials;

const ENV_KEYS: [&str; 21] = [
    "CLIPDESK_SERVER_ADDR",
    "CLIPDESK_LEDGER_BACKEND",
    "CLIPDESK_SHEETS_SPREADSHEET_ID",
    "CLIPDESK_SHEETS_WORKSHEET",
    "CLIPDESK_CREDENTIALS_FILE",
    "CLIPDESK_SQLITE_DB",
    "CLIPDESK_SHARED_SECRET",
    "CLIPDESK_INTERPRETER_SECRETS",
    "CLIPDESK_COMPLETION_MODE",
    "CLIPDESK_IDENTITY_KEY",
    "CLIPDESK_COLUMN_FILENAME",
    "CLIPDESK_COLUMN_FILE_ID",
    "CLIPDESK_COLUMN_DURATION",
    "CLIPDESK_COLUMN_TRANSLATION",
    "CLIPDESK_COLUMN_STATUS",
    "CLIPDESK_COLUMN_INTERPRETER",
    "CLIPDESK_STATUS_CLAIMED_PREFIX",
    "CLIPDESK_STATUS_DONE",
    "CLIPDESK_STATIC_PAGE",
    "CLIPDESK_SHEETS_API_BASE",
    "CLIPDESK_SHEETS_TIMEOUT_SECS",
];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("ledger startup health check failed: {0}")]
    HealthCheck(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerBackend {
    Sheets,
    Sqlite,
    /// Process-local ledger, empty at startup. Useful for demos and tests.
    Memory,
}

#[derive(Clone, Debug)]
pub struct DeskConfig {
    pub server_addr: String,
    pub backend: LedgerBackend,
    pub sheets_spreadsheet_id: Option<String>,
    pub sheets_worksheet: String,
    pub sheets_api_base: Option<String>,
    pub sheets_timeout_secs: u64,
    pub credentials_file: PathBuf,
    pub sqlite_db_path: String,
    pub credentials: Credentials,
    pub completion_mode: CompletionMode,
    pub identity_key: IdentityKey,
    pub columns: LedgerColumns,
    pub markers: StatusMarkers,
    pub static_page: PathBuf,
}

impl DeskConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut envs = HashMap::new();
        for key in ENV_KEYS {
            if let Ok(value) = std::env::var(key) {
                envs.insert(key.to_string(), value);
            }
        }
        Self::from_env_map(&envs)
    }

    pub fn from_env_map(envs: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            envs.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let backend = match get_or("CLIPDESK_LEDGER_BACKEND", "sheets")
            .to_ascii_lowercase()
            .as_str()
        {
            "sheets" => LedgerBackend::Sheets,
            "sqlite" => LedgerBackend::Sqlite,
            "memory" => LedgerBackend::Memory,
            other => {
                return Err(invalid_choice("CLIPDESK_LEDGER_BACKEND", other, "sheets, sqlite, memory"));
            }
        };
        let sheets_spreadsheet_id = get("CLIPDESK_SHEETS_SPREADSHEET_ID");
        if backend == LedgerBackend::Sheets && sheets_spreadsheet_id.is_none() {
            return Err(ConfigError::Invalid(
                "CLIPDESK_LEDGER_BACKEND=sheets requires CLIPDESK_SHEETS_SPREADSHEET_ID".to_string(),
            ));
        }
        let sheets_timeout_secs = match get("CLIPDESK_SHEETS_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    ConfigError::Invalid(format!(
                        "invalid CLIPDESK_SHEETS_TIMEOUT_SECS='{}'. expected a positive integer",
                        raw
                    ))
                })?,
            None => 30,
        };

        let completion_mode = match get_or("CLIPDESK_COMPLETION_MODE", "sync")
            .to_ascii_lowercase()
            .as_str()
        {
            "sync" => CompletionMode::Synchronous,
            "background" => CompletionMode::Background,
            other => {
                return Err(invalid_choice("CLIPDESK_COMPLETION_MODE", other, "sync, background"));
            }
        };
        let identity_key = match get_or("CLIPDESK_IDENTITY_KEY", "filename")
            .to_ascii_lowercase()
            .as_str()
        {
            "filename" => IdentityKey::Filename,
            "file_id" => IdentityKey::FileId,
            other => {
                return Err(invalid_choice("CLIPDESK_IDENTITY_KEY", other, "filename, file_id"));
            }
        };

        let credentials = parse_credentials(
            get("CLIPDESK_SHARED_SECRET"),
            get("CLIPDESK_INTERPRETER_SECRETS"),
        )?;

        let defaults = LedgerColumns::default();
        let columns = LedgerColumns {
            filename: get_or("CLIPDESK_COLUMN_FILENAME", &defaults.filename),
            file_id: get_or("CLIPDESK_COLUMN_FILE_ID", &defaults.file_id),
            duration: get_or("CLIPDESK_COLUMN_DURATION", &defaults.duration),
            translation: get_or("CLIPDESK_COLUMN_TRANSLATION", &defaults.translation),
            status: get_or("CLIPDESK_COLUMN_STATUS", &defaults.status),
            interpreter: get_or("CLIPDESK_COLUMN_INTERPRETER", &defaults.interpreter),
        };
        let mut names = columns.required().to_vec();
        names.sort_unstable();
        names.dedup();
        if names.len() != columns.required().len() {
            return Err(ConfigError::Invalid(
                "CLIPDESK_COLUMN_* header names must be distinct".to_string(),
            ));
        }

        let default_markers = StatusMarkers::default();
        let markers = StatusMarkers {
            claimed_prefix: envs
                .get("CLIPDESK_STATUS_CLAIMED_PREFIX")
                .filter(|v| !v.trim().is_empty())
                .cloned()
                .unwrap_or(default_markers.claimed_prefix),
            done: get_or("CLIPDESK_STATUS_DONE", &default_markers.done),
        };
        if markers.done.starts_with(markers.claimed_prefix.trim()) {
            return Err(ConfigError::Invalid(format!(
                "CLIPDESK_STATUS_DONE='{}' must not start with CLIPDESK_STATUS_CLAIMED_PREFIX='{}'",
                markers.done, markers.claimed_prefix
            )));
        }

        Ok(Self {
            server_addr: get_or("CLIPDESK_SERVER_ADDR", "127.0.0.1:8080"),
            backend,
            sheets_spreadsheet_id,
            sheets_worksheet: get_or("CLIPDESK_SHEETS_WORKSHEET", "Sheet1"),
            sheets_api_base: get("CLIPDESK_SHEETS_API_BASE"),
            sheets_timeout_secs,
            credentials_file: PathBuf::from(get_or("CLIPDESK_CREDENTIALS_FILE", "credentials.json")),
            sqlite_db_path: get_or("CLIPDESK_SQLITE_DB", "clipdesk_ledger.db"),
            credentials,
            completion_mode,
            identity_key,
            columns,
            markers,
            static_page: PathBuf::from(get_or("CLIPDESK_STATIC_PAGE", "translator_tool.html")),
        })
    }

    /// Opens the configured ledger backend without touching it.
    pub fn build_store(&self) -> Result<SharedRowStore, ConfigError> {
        match self.backend {
            LedgerBackend::Memory => Ok(Arc::new(MemoryRowStore::new())),
            LedgerBackend::Sqlite => self.sqlite_store(),
            LedgerBackend::Sheets => self.sheets_store(),
        }
    }

    #[cfg(feature = "sqlite-persistence")]
    fn sqlite_store(&self) -> Result<SharedRowStore, ConfigError> {
        let store = SqliteRowStore::new(&self.sqlite_db_path).map_err(|e| {
            ConfigError::HealthCheck(format!(
                "open sqlite ledger CLIPDESK_SQLITE_DB='{}': {}",
                self.sqlite_db_path, e
            ))
        })?;
        Ok(Arc::new(store))
    }

    #[cfg(not(feature = "sqlite-persistence"))]
    fn sqlite_store(&self) -> Result<SharedRowStore, ConfigError> {
        Err(ConfigError::Invalid(
            "CLIPDESK_LEDGER_BACKEND=sqlite requires feature 'sqlite-persistence'".to_string(),
        ))
    }

    #[cfg(feature = "sheets")]
    fn sheets_store(&self) -> Result<SharedRowStore, ConfigError> {
        let spreadsheet_id = self.sheets_spreadsheet_id.clone().ok_or_else(|| {
            ConfigError::Invalid("CLIPDESK_SHEETS_SPREADSHEET_ID is missing".to_string())
        })?;
        let mut sheets = SheetsConfig::new(spreadsheet_id, self.sheets_worksheet.clone());
        if let Some(api_base) = &self.sheets_api_base {
            sheets.api_base = api_base.clone();
        }
        sheets.request_timeout = std::time::Duration::from_secs(self.sheets_timeout_secs);
        let store = SheetsRowStore::from_credentials_file(sheets, &self.credentials_file)
            .map_err(|e| ConfigError::HealthCheck(e.to_string()))?;
        Ok(Arc::new(store))
    }

    #[cfg(not(feature = "sheets"))]
    fn sheets_store(&self) -> Result<SharedRowStore, ConfigError> {
        Err(ConfigError::Invalid(
            "CLIPDESK_LEDGER_BACKEND=sheets requires feature 'sheets'".to_string(),
        ))
    }

    /// Builds the store and proves it is reachable. The process must not
    /// serve traffic when this fails.
    pub async fn startup_health_check(&self) -> Result<SharedRowStore, ConfigError> {
        let store = self.build_store()?;
        store.ping().await.map_err(|e| {
            ConfigError::HealthCheck(format!("{:?} ledger unreachable: {}", self.backend, e))
        })?;
        log::info!("desk_ledger_ready backend={:?}", self.backend);
        Ok(store)
    }
}

fn invalid_choice(key: &str, value: &str, expected: &str) -> ConfigError {
    ConfigError::Invalid(format!(
        "invalid {}='{}'. expected one of: {}",
        key, value, expected
    ))
}

fn parse_credentials(
    shared: Option<String>,
    per_interpreter: Option<String>,
) -> Result<Credentials, ConfigError> {
    match (shared, per_interpreter) {
        (Some(secret), None) => Ok(Credentials::Shared(secret)),
        (None, Some(raw)) => {
            let mut secrets = HashMap::new();
            for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                let (name, secret) = pair
                    .split_once(':')
                    .map(|(n, s)| (n.trim(), s.trim()))
                    .filter(|(n, s)| !n.is_empty() && !s.is_empty())
                    .ok_or_else(|| {
                        ConfigError::Invalid(
                            "CLIPDESK_INTERPRETER_SECRETS entries must look like name:secret"
                                .to_string(),
                        )
                    })?;
                secrets.insert(name.to_string(), secret.to_string());
            }
            if secrets.is_empty() {
                return Err(ConfigError::Invalid(
                    "CLIPDESK_INTERPRETER_SECRETS has no entries".to_string(),
                ));
            }
            Ok(Credentials::PerInterpreter(secrets))
        }
        (Some(_), Some(_)) => Err(ConfigError::Invalid(
            "set only one of CLIPDESK_SHARED_SECRET and CLIPDESK_INTERPRETER_SECRETS".to_string(),
        )),
        (None, None) => Err(ConfigError::Invalid(
            "one of CLIPDESK_SHARED_SECRET or CLIPDESK_INTERPRETER_SECRETS is required".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn invalid_message(err: ConfigError) -> String {
        match err {
            ConfigError::Invalid(msg) => msg,
            other => panic!("expected invalid config, got {:?}", other),
        }
    }

    #[test]
    fn defaults_apply_with_minimal_env() {
        let cfg = DeskConfig::from_env_map(&envs(&[
            ("CLIPDESK_SHEETS_SPREADSHEET_ID", "sheet-1"),
            ("CLIPDESK_SHARED_SECRET", "open"),
        ]))
        .unwrap();
        assert_eq!(cfg.backend, LedgerBackend::Sheets);
        assert_eq!(cfg.server_addr, "127.0.0.1:8080");
        assert_eq!(cfg.sheets_worksheet, "Sheet1");
        assert_eq!(cfg.completion_mode, CompletionMode::Synchronous);
        assert_eq!(cfg.identity_key, IdentityKey::Filename);
        assert_eq!(cfg.columns, LedgerColumns::default());
        assert_eq!(cfg.markers, StatusMarkers::default());
        assert_eq!(cfg.static_page, PathBuf::from("translator_tool.html"));
    }

    #[test]
    fn sheets_backend_requires_spreadsheet_id() {
        let err = DeskConfig::from_env_map(&envs(&[("CLIPDESK_SHARED_SECRET", "open")])).unwrap_err();
        assert!(invalid_message(err).contains("CLIPDESK_SHEETS_SPREADSHEET_ID"));
    }

    #[test]
    fn invalid_enum_values_name_the_key() {
        for (key, value) in [
            ("CLIPDESK_LEDGER_BACKEND", "excel"),
            ("CLIPDESK_COMPLETION_MODE", "eventually"),
            ("CLIPDESK_IDENTITY_KEY", "row"),
        ] {
            let err = DeskConfig::from_env_map(&envs(&[
                ("CLIPDESK_LEDGER_BACKEND", "memory"),
                ("CLIPDESK_SHARED_SECRET", "open"),
                (key, value),
            ]))
            .unwrap_err();
            assert!(invalid_message(err).contains(key));
        }
    }

    #[test]
    fn exactly_one_credential_mode() {
        let both = DeskConfig::from_env_map(&envs(&[
            ("CLIPDESK_LEDGER_BACKEND", "memory"),
            ("CLIPDESK_SHARED_SECRET", "open"),
            ("CLIPDESK_INTERPRETER_SECRETS", "ann:x"),
        ]))
        .unwrap_err();
        assert!(invalid_message(both).contains("only one"));
        let neither =
            DeskConfig::from_env_map(&envs(&[("CLIPDESK_LEDGER_BACKEND", "memory")])).unwrap_err();
        assert!(invalid_message(neither).contains("required"));
    }

    #[test]
    fn per_interpreter_secrets_parse() {
        let cfg = DeskConfig::from_env_map(&envs(&[
            ("CLIPDESK_LEDGER_BACKEND", "memory"),
            ("CLIPDESK_INTERPRETER_SECRETS", "ann: s3cret , bob:hunter2,"),
            ("CLIPDESK_COMPLETION_MODE", "background"),
            ("CLIPDESK_IDENTITY_KEY", "file_id"),
        ]))
        .unwrap();
        match cfg.credentials {
            Credentials::PerInterpreter(map) => {
                assert_eq!(map.get("ann").map(String::as_str), Some("s3cret"));
                assert_eq!(map.get("bob").map(String::as_str), Some("hunter2"));
            }
            other => panic!("expected per-interpreter credentials, got {:?}", other),
        }
        assert_eq!(cfg.completion_mode, CompletionMode::Background);
        assert_eq!(cfg.identity_key, IdentityKey::FileId);

        let err = DeskConfig::from_env_map(&envs(&[
            ("CLIPDESK_LEDGER_BACKEND", "memory"),
            ("CLIPDESK_INTERPRETER_SECRETS", "ann"),
        ]))
        .unwrap_err();
        assert!(invalid_message(err).contains("name:secret"));
    }

    #[test]
    fn custom_columns_and_markers() {
        let cfg = DeskConfig::from_env_map(&envs(&[
            ("CLIPDESK_LEDGER_BACKEND", "memory"),
            ("CLIPDESK_SHARED_SECRET", "open"),
            ("CLIPDESK_COLUMN_STATUS", "state"),
            ("CLIPDESK_STATUS_CLAIMED_PREFIX", "in progress by "),
            ("CLIPDESK_STATUS_DONE", "translated"),
        ]))
        .unwrap();
        assert_eq!(cfg.columns.status, "state");
        assert_eq!(cfg.markers.claimed("ann"), "in progress by ann");
        assert_eq!(cfg.markers.done, "translated");

        let clash = DeskConfig::from_env_map(&envs(&[
            ("CLIPDESK_LEDGER_BACKEND", "memory"),
            ("CLIPDESK_SHARED_SECRET", "open"),
            ("CLIPDESK_STATUS_CLAIMED_PREFIX", "do"),
        ]))
        .unwrap_err();
        assert!(invalid_message(clash).contains("CLIPDESK_STATUS_DONE"));

        let duplicate = DeskConfig::from_env_map(&envs(&[
            ("CLIPDESK_LEDGER_BACKEND", "memory"),
            ("CLIPDESK_SHARED_SECRET", "open"),
            ("CLIPDESK_COLUMN_FILE_ID", "filename"),
        ]))
        .unwrap_err();
        assert!(invalid_message(duplicate).contains("distinct"));
    }

    #[tokio::test]
    async fn memory_backend_passes_health_check() {
        let cfg = DeskConfig::from_env_map(&envs(&[
            ("CLIPDESK_LEDGER_BACKEND", "memory"),
            ("CLIPDESK_SHARED_SECRET", "open"),
        ]))
        .unwrap();
        assert!(cfg.startup_health_check().await.is_ok());
    }

    #[cfg(feature = "sqlite-persistence")]
    #[tokio::test]
    async fn sqlite_backend_health_check_creates_database() {
        let path = std::env::temp_dir().join(format!("clipdesk-config-{}.db", uuid::Uuid::new_v4()));
        let db = path.to_string_lossy().to_string();
        let cfg = DeskConfig::from_env_map(&envs(&[
            ("CLIPDESK_LEDGER_BACKEND", "sqlite"),
            ("CLIPDESK_SHARED_SECRET", "open"),
            ("CLIPDESK_SQLITE_DB", db.as_str()),
        ]))
        .unwrap();
        assert!(cfg.startup_health_check().await.is_ok());
        let _ = std::fs::remove_file(path);
    }

    #[cfg(feature = "sheets")]
    #[tokio::test]
    async fn missing_service_account_file_fails_health_check() {
        let cfg = DeskConfig::from_env_map(&envs(&[
            ("CLIPDESK_SHEETS_SPREADSHEET_ID", "sheet-1"),
            ("CLIPDESK_SHARED_SECRET", "open"),
            ("CLIPDESK_CREDENTIALS_FILE", "/nonexistent/clipdesk/credentials.json"),
        ]))
        .unwrap();
        assert!(matches!(
            cfg.startup_health_check().await,
            Err(ConfigError::HealthCheck(_))
        ));
    }
}
