//! Connection parameters and connection-string construction.

use serde::Deserialize;
use serde_json::Value;

use crate::DbError;

/// Parameters used to reach the store.
///
/// Deserializes from camelCase JSON (`dbName`, `readPreference`, …); every
/// field except `dbName` has a default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    /// Logical database name. Also used as the authentication source.
    pub db_name: String,
    pub read_preference: String,
    pub tls: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            scheme: "mongodb".into(),
            host: "127.0.0.1".into(),
            port: 27017,
            db_name: String::new(),
            read_preference: "primary".into(),
            tls: false,
        }
    }
}

impl StoreConfig {
    /// Default parameters targeting the given database.
    pub fn new(db_name: impl Into<String>) -> Self {
        Self {
            db_name: db_name.into(),
            ..Self::default()
        }
    }

    /// Parse a JSON configuration document.
    ///
    /// Accepts either the flat object or an application config whose store
    /// settings live under a `global` key.
    pub fn from_json_str(raw: &str) -> Result<Self, DbError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| DbError::Configuration(format!("invalid config JSON: {e}")))?;

        let section = match value.get("global") {
            Some(global) if global.is_object() => global.clone(),
            _ => value,
        };

        serde_json::from_value(section)
            .map_err(|e| DbError::Configuration(format!("invalid config: {e}")))
    }

    /// Build `scheme://host:port/?authSource=<db>&readPreference=<rp>&ssl=<tls>`.
    ///
    /// # Errors
    /// Returns `DbError::Configuration` when a parameter is missing or would
    /// corrupt the URI.
    pub fn connection_string(&self) -> Result<String, DbError> {
        self.validate()?;
        Ok(format!(
            "{}://{}:{}/?authSource={}&readPreference={}&ssl={}",
            self.scheme, self.host, self.port, self.db_name, self.read_preference, self.tls
        ))
    }

    fn validate(&self) -> Result<(), DbError> {
        require("scheme", &self.scheme, |c| !c.is_ascii_alphanumeric() && c != '+')?;
        require("host", &self.host, |c| {
            c.is_whitespace() || matches!(c, '/' | '\\' | '?' | '#' | '@' | ':')
        })?;
        require("dbName", &self.db_name, |c| {
            c.is_whitespace() || matches!(c, '/' | '\\' | '.' | '"' | '$' | '?')
        })?;
        require("readPreference", &self.read_preference, |c| !c.is_ascii_alphabetic())?;

        if self.port == 0 {
            return Err(DbError::Configuration("port must be non-zero".into()));
        }
        Ok(())
    }
}

fn require(field: &str, value: &str, forbidden: impl Fn(char) -> bool) -> Result<(), DbError> {
    if value.is_empty() {
        return Err(DbError::Configuration(format!("{field} must not be empty")));
    }
    if let Some(c) = value.chars().find(|c| forbidden(*c)) {
        return Err(DbError::Configuration(format!(
            "{field} contains invalid character {c:?}"
        )));
    }
    Ok(())
}
