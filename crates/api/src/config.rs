use std::path::{Path, PathBuf};

use printbroker_core::spooler::SpoolerCommand;
use printbroker_core::uploads::BYTES_PER_MB;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Server configuration.
///
/// Resolved from three layers, later ones winning: built-in defaults, the
/// optional JSON config file, then environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3002`).
    pub port: u16,
    /// Destination passed to the spooler's `-d` flag.
    pub printer_name: String,
    /// Upload size limit in megabytes (default: `50`).
    pub max_upload_mb: f64,
    /// Allowed CORS origins. `*` anywhere in the list allows every origin.
    pub cors_origins: Vec<String>,
    /// Directory holding uploaded documents (default: `uploads`).
    pub upload_dir: PathBuf,
    /// Scratch directory, created at startup and otherwise unused (default: `tmp`).
    pub tmp_dir: PathBuf,
    /// Print submission command (default: `lp`).
    pub submit_command: SpoolerCommand,
    /// Queue status command (default: `lpstat`).
    pub status_command: SpoolerCommand,
    /// Upper bound on a single spooler invocation (default: `60`).
    pub spooler_timeout_secs: u64,
    /// HTTP request timeout in seconds (default: `300`).
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3002,
            printer_name: "YOUR_PRINTER_NAME".into(),
            max_upload_mb: 50.0,
            cors_origins: vec!["*".into()],
            upload_dir: PathBuf::from("uploads"),
            tmp_dir: PathBuf::from("tmp"),
            submit_command: SpoolerCommand::new("lp"),
            status_command: SpoolerCommand::new("lpstat"),
            spooler_timeout_secs: 60,
            request_timeout_secs: 300,
        }
    }
}

/// On-disk configuration. Every key is optional; unknown keys are ignored.
///
/// Each key is read on its own: a value of the wrong type is logged and
/// treated as unset without affecting the other keys.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileConfig {
    #[serde(default, deserialize_with = "lenient")]
    host: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    backend_port: Option<u16>,
    #[serde(default, deserialize_with = "lenient")]
    printer_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    upload: Option<UploadSection>,
    #[serde(default, deserialize_with = "lenient")]
    allow_origins: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    upload_dir: Option<PathBuf>,
    #[serde(default, deserialize_with = "lenient")]
    tmp_dir: Option<PathBuf>,
    #[serde(default, deserialize_with = "lenient")]
    spooler: Option<SpoolerSection>,
}

#[derive(Debug, Default, Deserialize)]
struct UploadSection {
    #[serde(rename = "maxSizeMB", default, deserialize_with = "lenient")]
    max_size_mb: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpoolerSection {
    #[serde(default, deserialize_with = "lenient")]
    submit_command: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    status_command: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    timeout_secs: Option<u64>,
}

/// Deserialize a config value, accepting numeric strings where a number is
/// expected. `null` and values of any other type become `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_value(value))
}

fn coerce_value<T: DeserializeOwned>(value: Value) -> Option<T> {
    if value.is_null() {
        return None;
    }
    if let Ok(parsed) = serde_json::from_value::<T>(value.clone()) {
        return Some(parsed);
    }

    let numeric = match &value {
        Value::String(s) => serde_json::from_str::<Value>(s.trim())
            .ok()
            .filter(Value::is_number),
        _ => None,
    };
    if let Some(parsed) = numeric.and_then(|n| serde_json::from_value::<T>(n).ok()) {
        return Some(parsed);
    }

    tracing::warn!(%value, "Ignoring config value of unexpected type");
    None
}

impl ServerConfig {
    /// Resolve configuration from `CONFIG_PATH` (or `config.json`) and the
    /// process environment.
    ///
    /// | Env Var                | File key                 |
    /// |------------------------|--------------------------|
    /// | `HOST`                 | `host`                   |
    /// | `BACKEND_PORT`         | `backendPort`            |
    /// | `PRINTER_NAME`         | `printerName`            |
    /// | `MAX_UPLOAD_MB`        | `upload.maxSizeMB`       |
    /// | `ALLOW_ORIGINS`        | `allowOrigins`           |
    /// | `UPLOAD_DIR`           | `uploadDir`              |
    /// | `TMP_DIR`              | `tmpDir`                 |
    /// | `LP_COMMAND`           | `spooler.submitCommand`  |
    /// | `LPSTAT_COMMAND`       | `spooler.statusCommand`  |
    /// | `SPOOLER_TIMEOUT_SECS` | `spooler.timeoutSecs`    |
    /// | `REQUEST_TIMEOUT_SECS` | n/a                      |
    pub fn load() -> Self {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        Self::resolve(Path::new(&path), |key| std::env::var(key).ok())
    }

    /// Resolve configuration from an explicit file path and env lookup.
    pub fn resolve(config_path: &Path, env: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(file) = read_file_config(config_path) {
            config.apply_file(file);
        }
        config.apply_env(env);
        config
    }

    /// Upload limit in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        // Float-to-int `as` saturates, so negative or NaN sizes become 0.
        (self.max_upload_mb * BYTES_PER_MB as f64) as u64
    }

    /// Whether the origin list contains the `*` wildcard.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(host) = file.host.filter(|s| !s.is_empty()) {
            self.host = host;
        }
        if let Some(port) = file.backend_port.filter(|p| *p != 0) {
            self.port = port;
        }
        if let Some(printer) = file.printer_name.filter(|s| !s.is_empty()) {
            self.printer_name = printer;
        }
        if let Some(mb) = file.upload.and_then(|u| u.max_size_mb).filter(|mb| *mb > 0.0) {
            self.max_upload_mb = mb;
        }
        if let Some(origins) = file.allow_origins {
            self.cors_origins = origins;
        }
        if let Some(dir) = file.upload_dir {
            self.upload_dir = dir;
        }
        if let Some(dir) = file.tmp_dir {
            self.tmp_dir = dir;
        }
        if let Some(spooler) = file.spooler {
            if let Some(program) = spooler.submit_command.filter(|s| !s.is_empty()) {
                self.submit_command = SpoolerCommand::new(program);
            }
            if let Some(program) = spooler.status_command.filter(|s| !s.is_empty()) {
                self.status_command = SpoolerCommand::new(program);
            }
            if let Some(secs) = spooler.timeout_secs {
                self.spooler_timeout_secs = secs;
            }
        }
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        // Empty values count as unset.
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = var("HOST") {
            self.host = host;
        }
        if let Some(port) = var("BACKEND_PORT").and_then(|v| parse_env("BACKEND_PORT", &v)) {
            self.port = port;
        }
        if let Some(printer) = var("PRINTER_NAME") {
            self.printer_name = printer;
        }
        if let Some(mb) = var("MAX_UPLOAD_MB")
            .and_then(|v| parse_env::<f64>("MAX_UPLOAD_MB", &v))
            .filter(|mb| *mb > 0.0)
        {
            self.max_upload_mb = mb;
        }
        if let Some(origins) = var("ALLOW_ORIGINS") {
            self.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(dir) = var("UPLOAD_DIR") {
            self.upload_dir = PathBuf::from(dir);
        }
        if let Some(dir) = var("TMP_DIR") {
            self.tmp_dir = PathBuf::from(dir);
        }
        if let Some(program) = var("LP_COMMAND") {
            self.submit_command = SpoolerCommand::new(program);
        }
        if let Some(program) = var("LPSTAT_COMMAND") {
            self.status_command = SpoolerCommand::new(program);
        }
        if let Some(secs) =
            var("SPOOLER_TIMEOUT_SECS").and_then(|v| parse_env("SPOOLER_TIMEOUT_SECS", &v))
        {
            self.spooler_timeout_secs = secs;
        }
        if let Some(secs) =
            var("REQUEST_TIMEOUT_SECS").and_then(|v| parse_env("REQUEST_TIMEOUT_SECS", &v))
        {
            self.request_timeout_secs = secs;
        }
    }
}

/// Read the JSON config file. Missing is normal; unreadable or malformed
/// is logged and treated as absent.
fn read_file_config(path: &Path) -> Option<FileConfig> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return None;
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(file) => {
            tracing::info!(path = %path.display(), "Loaded config file");
            Some(file)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to parse config file, using defaults");
            None
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!(key, value, error = %e, "Ignoring unparseable environment variable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn config_file(json: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .expect("create temp file");
        write!(f, "{json}").expect("write config");
        f
    }

    #[test]
    fn defaults_without_file_or_env() {
        let config = ServerConfig::resolve(Path::new("/nonexistent/config.json"), env_of(&[]));

        assert_eq!(config.port, 3002);
        assert_eq!(config.printer_name, "YOUR_PRINTER_NAME");
        assert_eq!(config.max_upload_bytes(), 50 * 1024 * 1024);
        assert_eq!(config.cors_origins, vec!["*".to_string()]);
        assert!(config.allows_any_origin());
        assert_eq!(config.submit_command, SpoolerCommand::new("lp"));
        assert_eq!(config.status_command, SpoolerCommand::new("lpstat"));
    }

    #[test]
    fn file_overrides_defaults() {
        let file = config_file(
            r#"{
                "printerName": "HP_LaserJet",
                "backendPort": 4000,
                "frontendPort": 3003,
                "upload": { "maxSizeMB": 2 },
                "allowOrigins": ["http://localhost:3003"],
                "spooler": { "timeoutSecs": 5 }
            }"#,
        );

        let config = ServerConfig::resolve(file.path(), env_of(&[]));

        assert_eq!(config.printer_name, "HP_LaserJet");
        assert_eq!(config.port, 4000);
        assert_eq!(config.max_upload_bytes(), 2 * 1024 * 1024);
        assert_eq!(config.cors_origins, vec!["http://localhost:3003".to_string()]);
        assert!(!config.allows_any_origin());
        assert_eq!(config.spooler_timeout_secs, 5);
    }

    #[test]
    fn env_overrides_file() {
        let file = config_file(r#"{ "printerName": "FromFile", "backendPort": 4000 }"#);

        let config = ServerConfig::resolve(
            file.path(),
            env_of(&[
                ("PRINTER_NAME", "FromEnv"),
                ("BACKEND_PORT", "5000"),
                ("ALLOW_ORIGINS", "http://a.test, http://b.test,"),
            ]),
        );

        assert_eq!(config.printer_name, "FromEnv");
        assert_eq!(config.port, 5000);
        assert_eq!(
            config.cors_origins,
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let file = config_file("{ this is not json");

        let config = ServerConfig::resolve(file.path(), env_of(&[("PRINTER_NAME", "Env")]));

        assert_eq!(config.port, 3002);
        assert_eq!(config.printer_name, "Env");
    }

    #[test]
    fn unparseable_env_keeps_lower_layer() {
        let file = config_file(r#"{ "backendPort": 4000 }"#);

        let config = ServerConfig::resolve(
            file.path(),
            env_of(&[("BACKEND_PORT", "not-a-port"), ("PRINTER_NAME", "")]),
        );

        assert_eq!(config.port, 4000);
        assert_eq!(config.printer_name, "YOUR_PRINTER_NAME");
    }

    #[test]
    fn upload_section_without_limit_keeps_default() {
        let file = config_file(r#"{ "upload": {} }"#);
        let config = ServerConfig::resolve(file.path(), env_of(&[]));
        assert_eq!(config.max_upload_mb, 50.0);
    }

    #[test]
    fn fractional_megabytes_are_supported() {
        let config = ServerConfig::resolve(
            Path::new("/nonexistent/config.json"),
            env_of(&[("MAX_UPLOAD_MB", "0.5")]),
        );
        assert_eq!(config.max_upload_bytes(), 512 * 1024);
    }

    #[test]
    fn mistyped_key_only_drops_that_key() {
        let file = config_file(
            r#"{
                "printerName": "HP_LaserJet",
                "backendPort": "4000",
                "upload": { "maxSizeMB": "2" },
                "allowOrigins": 5,
                "spooler": { "timeoutSecs": "soon" }
            }"#,
        );

        let config = ServerConfig::resolve(file.path(), env_of(&[]));

        assert_eq!(config.printer_name, "HP_LaserJet");
        assert_eq!(config.port, 4000);
        assert_eq!(config.max_upload_bytes(), 2 * 1024 * 1024);
        assert_eq!(config.cors_origins, vec!["*".to_string()]);
        assert_eq!(config.spooler_timeout_secs, 60);
    }

    #[test]
    fn non_positive_upload_limit_keeps_default() {
        let file = config_file(r#"{ "upload": { "maxSizeMB": 0 } }"#);
        let config = ServerConfig::resolve(file.path(), env_of(&[]));
        assert_eq!(config.max_upload_bytes(), 50 * 1024 * 1024);

        let config = ServerConfig::resolve(
            Path::new("/nonexistent/config.json"),
            env_of(&[("MAX_UPLOAD_MB", "-3")]),
        );
        assert_eq!(config.max_upload_bytes(), 50 * 1024 * 1024);
    }
}
