//! Database pair registry (`db.config.json`) and `db.conf` rendering.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::{self, Bootstrap};
use crate::error::{Error, Result};
use crate::paths;
use crate::utils::{io, validation};

/// Connection parameters for one database instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbConfig {
    pub name: String,
    pub db_name: String,
    pub user: String,
    pub host: String,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// A named local/production database mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbPair {
    pub name: String,
    pub local: DbConfig,
    pub production: DbConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbSettings {
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_statement_timeout")]
    pub statement_timeout: String,
    #[serde(default = "default_idle_transaction_timeout")]
    pub idle_transaction_timeout: String,
    #[serde(default = "default_idle_session_timeout")]
    pub idle_session_timeout: String,
    #[serde(default = "default_master_idle_timeout")]
    pub master_idle_timeout: String,
    #[serde(default = "default_tcp_keepalives_idle")]
    pub tcp_keepalives_idle: u32,
    #[serde(default = "default_tcp_keepalives_interval")]
    pub tcp_keepalives_interval: u32,
    #[serde(default = "default_tcp_keepalives_count")]
    pub tcp_keepalives_count: u32,
    #[serde(default = "default_app_user")]
    pub app_user: String,
    #[serde(default = "default_app_pass")]
    pub app_pass: String,
}

impl Default for DbSettings {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            statement_timeout: default_statement_timeout(),
            idle_transaction_timeout: default_idle_transaction_timeout(),
            idle_session_timeout: default_idle_session_timeout(),
            master_idle_timeout: default_master_idle_timeout(),
            tcp_keepalives_idle: default_tcp_keepalives_idle(),
            tcp_keepalives_interval: default_tcp_keepalives_interval(),
            tcp_keepalives_count: default_tcp_keepalives_count(),
            app_user: default_app_user(),
            app_pass: default_app_pass(),
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_statement_timeout() -> String {
    "15s".to_string()
}

fn default_idle_transaction_timeout() -> String {
    "2min".to_string()
}

fn default_idle_session_timeout() -> String {
    "3min".to_string()
}

fn default_master_idle_timeout() -> String {
    "5min".to_string()
}

fn default_tcp_keepalives_idle() -> u32 {
    60
}

fn default_tcp_keepalives_interval() -> u32 {
    30
}

fn default_tcp_keepalives_count() -> u32 {
    3
}

fn default_app_user() -> String {
    "payload".to_string()
}

fn default_app_pass() -> String {
    "payload".to_string()
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}

/// Contents of `db.config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DbConfigFile {
    /// Key last written to the env file by `db config`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,
    #[serde(default)]
    pub databases: BTreeMap<String, DbPair>,
    #[serde(default)]
    pub settings: DbSettings,
}

impl DbConfigFile {
    /// Built-in registry with default settings.
    pub fn defaults() -> Self {
        Self {
            current: None,
            databases: builtin_pairs(),
            settings: DbSettings::default(),
        }
    }

    /// The pair last selected with `db config`, falling back to the first
    /// key in `databases` for files written before selection was recorded.
    pub fn current_pair(&self) -> Option<(&String, &DbPair)> {
        self.current
            .as_ref()
            .and_then(|key| self.databases.get_key_value(key))
            .or_else(|| self.databases.iter().next())
    }
}

/// Pairs shipped with the tool. Replace or extend them with `db pair set`.
pub fn builtin_pairs() -> BTreeMap<String, DbPair> {
    let mut pairs = BTreeMap::new();
    pairs.insert(
        "example".to_string(),
        DbPair {
            name: "Example".to_string(),
            local: DbConfig {
                name: "Local Example".to_string(),
                db_name: "example".to_string(),
                user: "postgres".to_string(),
                host: "localhost".to_string(),
                port: None,
                password: None,
            },
            production: DbConfig {
                name: "Production Example".to_string(),
                db_name: "example".to_string(),
                user: "postgres".to_string(),
                host: "db.example.com".to_string(),
                port: Some("5432".to_string()),
                password: None,
            },
        },
    );
    pairs
}

/// Load `db.config.json`, creating or repairing it from the built-in registry.
pub fn load(root: &Path) -> Result<DbConfigFile> {
    let path = paths::db_config_json(root);
    let (file, state) = config::load_or_bootstrap(&path, DbConfigFile::defaults)?;

    if state == Bootstrap::Loaded && file.databases.is_empty() {
        crate::log_warning!("db", "No database configurations found in {}", path.display());
        crate::log_info!(
            "db",
            "Run 'next-toolchain db pair set <key> <spec>' to add a database pair"
        );
    }

    Ok(file)
}

pub fn save(root: &Path, file: &DbConfigFile) -> Result<()> {
    config::save(&paths::db_config_json(root), file)
}

/// Pairs available for selection: built-ins overridden by file entries.
pub fn selectable_pairs(file: &DbConfigFile) -> BTreeMap<String, DbPair> {
    let mut pairs = builtin_pairs();
    pairs.extend(file.databases.clone());
    pairs
}

pub fn select_pair(file: &DbConfigFile, key: &str) -> Result<DbPair> {
    let pairs = selectable_pairs(file);
    pairs
        .get(key)
        .cloned()
        .ok_or_else(|| Error::pair_not_found(key, pairs.keys().cloned().collect()))
}

/// Render the environment file read by every database operation.
pub fn render_db_conf(pair: &DbPair, settings: &DbSettings) -> String {
    let mut lines = vec![
        "# Database configuration managed by next-toolchain".to_string(),
        String::new(),
        "# Local database configuration".to_string(),
    ];
    push_target(&mut lines, "LOCAL", &pair.local);

    lines.push(String::new());
    lines.push("# Cloud database configuration".to_string());
    push_target(&mut lines, "CLOUD", &pair.production);

    lines.push(String::new());
    lines.push("# Database settings".to_string());
    lines.push(format!("DB_MAX_CONNECTIONS={}", settings.max_connections));
    lines.push(quoted("DB_STATEMENT_TIMEOUT", &settings.statement_timeout));
    lines.push(quoted(
        "DB_IDLE_TRANSACTION_TIMEOUT",
        &settings.idle_transaction_timeout,
    ));
    lines.push(quoted("DB_IDLE_SESSION_TIMEOUT", &settings.idle_session_timeout));
    lines.push(quoted("DB_MASTER_IDLE_TIMEOUT", &settings.master_idle_timeout));
    lines.push(format!("DB_TCP_KEEPALIVES_IDLE={}", settings.tcp_keepalives_idle));
    lines.push(format!(
        "DB_TCP_KEEPALIVES_INTERVAL={}",
        settings.tcp_keepalives_interval
    ));
    lines.push(format!("DB_TCP_KEEPALIVES_COUNT={}", settings.tcp_keepalives_count));

    lines.push(String::new());
    lines.push("# Application user settings".to_string());
    lines.push(quoted("APP_USER", &settings.app_user));
    lines.push(quoted("APP_PASS", &settings.app_pass));

    let mut content = lines.join("\n");
    content.push('\n');
    content
}

fn push_target(lines: &mut Vec<String>, prefix: &str, db: &DbConfig) {
    lines.push(quoted(&format!("{}_DB_NAME", prefix), &db.db_name));
    lines.push(quoted(&format!("{}_DB_USER", prefix), &db.user));
    lines.push(quoted(&format!("{}_DB_HOST", prefix), &db.host));
    if let Some(port) = db.port.as_deref().filter(|p| !p.is_empty()) {
        lines.push(quoted(&format!("{}_DB_PORT", prefix), port));
    }
    if let Some(password) = db.password.as_deref().filter(|p| !p.is_empty()) {
        lines.push(quoted(&format!("{}_DB_PASS", prefix), password));
    }
}

fn quoted(key: &str, value: &str) -> String {
    format!(
        "{}=\"{}\"",
        key,
        value
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('$', "\\$")
    )
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigureOutcome {
    pub key: String,
    pub pair: DbPair,
    pub settings: DbSettings,
    pub config_path: PathBuf,
    pub env_path: PathBuf,
}

/// Select `key`, merge it into `db.config.json` and render the env file.
///
/// Other pairs on disk are kept; the selected pair overwrites its own key.
pub fn configure(root: &Path, key: &str, env_path: &Path) -> Result<ConfigureOutcome> {
    let mut file = load(root)?;
    let pair = select_pair(&file, key)?;

    file.databases.insert(key.to_string(), pair.clone());
    file.current = Some(key.to_string());
    save(root, &file)?;

    let content = render_db_conf(&pair, &file.settings);
    io::write_file_atomic(env_path, &content, &format!("write {}", env_path.display()))?;

    crate::log_success!("db", "Database configuration updated");
    crate::log_info!("db", "Connected to: {}", pair.name);
    crate::log_info!(
        "db",
        "Local: {} on {}",
        pair.local.db_name,
        pair.local.host
    );
    crate::log_info!(
        "db",
        "Production: {} on {}",
        pair.production.db_name,
        pair.production.host
    );

    Ok(ConfigureOutcome {
        key: key.to_string(),
        pair,
        settings: file.settings,
        config_path: paths::db_config_json(root),
        env_path: env_path.to_path_buf(),
    })
}

/// Add or replace a pair in `db.config.json`.
pub fn set_pair(root: &Path, key: &str, pair: DbPair) -> Result<DbPair> {
    let key = validation::require_non_empty(key, "key", "Pair key cannot be empty")?;
    let mut file = load(root)?;
    file.databases.insert(key.to_string(), pair.clone());
    save(root, &file)?;
    Ok(pair)
}

pub fn remove_pair(root: &Path, key: &str) -> Result<DbPair> {
    let mut file = load(root)?;
    let removed = file.databases.remove(key).ok_or_else(|| {
        Error::pair_not_found(key, file.databases.keys().cloned().collect())
    })?;
    if file.current.as_deref() == Some(key) {
        file.current = None;
    }
    save(root, &file)?;
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn pair(name: &str, host: &str) -> DbPair {
        DbPair {
            name: name.to_string(),
            local: DbConfig {
                name: format!("Local {}", name),
                db_name: "blog".to_string(),
                user: "dev".to_string(),
                host: "localhost".to_string(),
                port: None,
                password: None,
            },
            production: DbConfig {
                name: format!("Production {}", name),
                db_name: "blog".to_string(),
                user: "admin".to_string(),
                host: host.to_string(),
                port: Some("55719".to_string()),
                password: Some("pw".to_string()),
            },
        }
    }

    #[test]
    fn settings_fill_unspecified_fields_with_defaults() {
        let settings: DbSettings =
            serde_json::from_str(r#"{"maxConnections": 25, "appUser": "web"}"#).unwrap();

        assert_eq!(settings.max_connections, 25);
        assert_eq!(settings.app_user, "web");
        assert_eq!(settings.statement_timeout, "15s");
        assert_eq!(settings.tcp_keepalives_interval, 30);
        assert_eq!(settings.app_pass, "payload");
    }

    #[test]
    fn port_accepts_number_or_string() {
        let db: DbConfig = serde_json::from_str(
            r#"{"name": "a", "dbName": "b", "user": "c", "host": "d", "port": 5432}"#,
        )
        .unwrap();
        assert_eq!(db.port.as_deref(), Some("5432"));

        let db: DbConfig = serde_json::from_str(
            r#"{"name": "a", "dbName": "b", "user": "c", "host": "d", "port": "6543"}"#,
        )
        .unwrap();
        assert_eq!(db.port.as_deref(), Some("6543"));
    }

    #[test]
    fn render_omits_absent_port_and_password() {
        let content = render_db_conf(&pair("Blog", "db.example.com"), &DbSettings::default());

        assert!(content.contains("LOCAL_DB_NAME=\"blog\"\n"));
        assert!(!content.contains("LOCAL_DB_PORT"));
        assert!(!content.contains("LOCAL_DB_PASS"));
        assert!(content.contains("CLOUD_DB_PORT=\"55719\"\n"));
        assert!(content.contains("CLOUD_DB_PASS=\"pw\"\n"));
        assert!(content.contains("DB_MAX_CONNECTIONS=10\n"));
        assert!(content.contains("DB_TCP_KEEPALIVES_COUNT=3\n"));
        assert!(content.ends_with("APP_PASS=\"payload\"\n"));
    }

    #[test]
    fn rendered_file_parses_back_into_db_env() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.conf");
        let mut production = pair("Blog", "db.example.com");
        production.production.password = Some("we\"ird".to_string());
        fs::write(&path, render_db_conf(&production, &DbSettings::default())).unwrap();

        let values: BTreeMap<String, String> = dotenvy::from_path_iter(&path)
            .unwrap()
            .map(|item| item.unwrap())
            .collect();

        assert_eq!(values["CLOUD_DB_PASS"], "we\"ird");
        assert_eq!(values["DB_IDLE_SESSION_TIMEOUT"], "3min");
    }

    #[test]
    fn dollar_signs_survive_db_env_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.conf");
        let mut production = pair("Blog", "db.example.com");
        production.production.password = Some("pa$word1".to_string());
        let settings = DbSettings {
            app_pass: "x${HOME}y\\z".to_string(),
            ..DbSettings::default()
        };
        fs::write(&path, render_db_conf(&production, &settings)).unwrap();

        let env = crate::db::DbEnv::load(&path).unwrap();

        assert_eq!(env.cloud().unwrap().password.as_deref(), Some("pa$word1"));
        assert_eq!(env.app_credentials().unwrap().password, "x${HOME}y\\z");
    }

    #[test]
    fn load_bootstraps_missing_file_with_builtin_registry() {
        let dir = TempDir::new().unwrap();

        let file = load(dir.path()).unwrap();

        assert!(file.databases.contains_key("example"));
        assert!(paths::db_config_json(dir.path()).exists());
    }

    #[test]
    fn configure_keeps_other_pairs_and_overwrites_selected() {
        let dir = TempDir::new().unwrap();
        let mut file = DbConfigFile::default();
        file.databases
            .insert("blog".to_string(), pair("Blog", "old.example.com"));
        file.databases
            .insert("shop".to_string(), pair("Shop", "shop.example.com"));
        file.settings.max_connections = 42;
        save(dir.path(), &file).unwrap();

        let env_path = paths::db_conf(dir.path());
        let outcome = configure(dir.path(), "blog", &env_path).unwrap();

        let saved = load(dir.path()).unwrap();
        assert!(saved.databases.contains_key("shop"));
        assert_eq!(saved.settings.max_connections, 42);
        assert_eq!(outcome.pair.production.host, "old.example.com");

        let rendered = fs::read_to_string(&env_path).unwrap();
        assert!(rendered.contains("DB_MAX_CONNECTIONS=42"));
        assert!(rendered.contains("CLOUD_DB_HOST=\"old.example.com\""));
    }

    #[test]
    fn unknown_pair_lists_available_keys() {
        let file = DbConfigFile::default();
        let err = select_pair(&file, "missing").unwrap_err();

        assert_eq!(err.code.as_str(), "db.pair_not_found");
        assert_eq!(err.details["available"][0], "example");
    }

    #[test]
    fn status_follows_last_configured_pair() {
        let dir = TempDir::new().unwrap();
        set_pair(dir.path(), "alpha", pair("Alpha", "a")).unwrap();
        set_pair(dir.path(), "zeta", pair("Zeta", "z")).unwrap();

        configure(dir.path(), "zeta", &paths::db_conf(dir.path())).unwrap();
        let file = load(dir.path()).unwrap();
        let (key, current) = file.current_pair().unwrap();
        assert_eq!(key, "zeta");
        assert_eq!(current.name, "Zeta");

        remove_pair(dir.path(), "zeta").unwrap();
        let file = load(dir.path()).unwrap();
        assert!(file.current.is_none());
        assert_eq!(file.current_pair().unwrap().0, "alpha");
    }

    #[test]
    fn current_pair_defaults_to_first_key() {
        let mut file = DbConfigFile::default();
        file.databases.insert("zeta".to_string(), pair("Zeta", "z"));
        file.databases.insert("alpha".to_string(), pair("Alpha", "a"));

        let (key, current) = file.current_pair().unwrap();
        assert_eq!(key, "alpha");
        assert_eq!(current.name, "Alpha");
    }

    #[test]
    fn remove_pair_reports_missing_key() {
        let dir = TempDir::new().unwrap();
        set_pair(dir.path(), "blog", pair("Blog", "db")).unwrap();

        let removed = remove_pair(dir.path(), "blog").unwrap();
        assert_eq!(removed.name, "Blog");

        let err = remove_pair(dir.path(), "blog").unwrap_err();
        assert_eq!(err.code.as_str(), "db.pair_not_found");
    }
}
