//! Connection strings and the process-wide registry that holds them.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tiberius::Config as TiberiusConfig;

use crate::error::SqlHelperError;

/// Name of the connection used when a caller does not ask for one.
pub const DEFAULT_CONNECTION: &str = "AdventureConnection";
pub const DATABASE2: &str = "Database2";
pub const DATABASE3: &str = "Database3";

/// Names that must be configured before the registry can be built.
pub const REQUIRED_CONNECTIONS: [&str; 3] = [DEFAULT_CONNECTION, DATABASE2, DATABASE3];

/// One named connection string (ADO.NET syntax).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConnectionDescriptor {
    pub name: String,
    pub connection_string: String,
}

impl ConnectionDescriptor {
    pub fn new(name: impl Into<String>, connection_string: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connection_string: connection_string.into(),
        }
    }

    /// Parse the connection string into a driver configuration.
    ///
    /// # Errors
    ///
    /// Returns `SqlHelperError::ConfigError` if the string is not a valid ADO.NET connection string.
    pub fn tiberius_config(&self) -> Result<TiberiusConfig, SqlHelperError> {
        TiberiusConfig::from_ado_string(&self.connection_string).map_err(|e| {
            SqlHelperError::ConfigError(format!(
                "invalid connection string for `{}`: {e}",
                self.name
            ))
        })
    }
}

// Connection strings carry passwords; keep them out of logs.
impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("name", &self.name)
            .field("connection_string", &"<redacted>")
            .finish()
    }
}

/// Which section of the settings file to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    #[must_use]
    pub fn section(self) -> &'static str {
        match self {
            Environment::Development => "Development",
            Environment::Production => "Production",
        }
    }

    #[must_use]
    pub fn is_development(self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Read-only registry of connection descriptors, built once at startup.
///
/// Construction fails unless every name in [`REQUIRED_CONNECTIONS`] is present.
#[derive(Debug, Clone)]
pub struct SqlConfiguration {
    connections: HashMap<String, ConnectionDescriptor>,
    default_connection: ConnectionDescriptor,
    database2: ConnectionDescriptor,
    database3: ConnectionDescriptor,
}

impl SqlConfiguration {
    /// Build the registry. When a name repeats, the first descriptor wins.
    ///
    /// # Errors
    ///
    /// Returns `SqlHelperError::ConfigError` if a required connection is missing.
    pub fn new(descriptors: Vec<ConnectionDescriptor>) -> Result<Self, SqlHelperError> {
        let mut connections = HashMap::with_capacity(descriptors.len());
        for descriptor in descriptors {
            connections
                .entry(descriptor.name.clone())
                .or_insert(descriptor);
        }

        let required = |name: &str| {
            connections.get(name).cloned().ok_or_else(|| {
                SqlHelperError::ConfigError(format!("missing required connection string `{name}`"))
            })
        };
        let default_connection = required(DEFAULT_CONNECTION)?;
        let database2 = required(DATABASE2)?;
        let database3 = required(DATABASE3)?;

        Ok(Self {
            connections,
            default_connection,
            database2,
            database3,
        })
    }

    /// Load the `<Environment>:ConnectionStrings` section of an appsettings-style JSON document.
    ///
    /// ```rust
    /// use adventure_data::config::{Environment, SqlConfiguration};
    ///
    /// let json = r#"{
    ///   "Development": { "ConnectionStrings": {
    ///     "AdventureConnection": "Server=localhost;Database=AdventureWorks;User Id=sa;Password=x",
    ///     "Database2": "Server=localhost;Database=Two",
    ///     "Database3": "Server=localhost;Database=Three"
    ///   } }
    /// }"#;
    /// let config = SqlConfiguration::from_settings_str(json, Environment::Development).unwrap();
    /// assert_eq!(config.default_connection().name, "AdventureConnection");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `SqlHelperError::ConfigError` if the JSON is malformed, the section is
    /// missing, a value is not a string, or a required connection is absent.
    pub fn from_settings_str(json: &str, environment: Environment) -> Result<Self, SqlHelperError> {
        let settings: JsonValue = serde_json::from_str(json)
            .map_err(|e| SqlHelperError::ConfigError(format!("invalid settings JSON: {e}")))?;

        let section = settings
            .get(environment.section())
            .and_then(|env| env.get("ConnectionStrings"))
            .and_then(JsonValue::as_object)
            .ok_or_else(|| {
                SqlHelperError::ConfigError(format!(
                    "settings have no `{}:ConnectionStrings` section",
                    environment.section()
                ))
            })?;

        let mut descriptors = Vec::with_capacity(section.len());
        for (name, value) in section {
            let connection_string = value.as_str().ok_or_else(|| {
                SqlHelperError::ConfigError(format!("connection string `{name}` must be a string"))
            })?;
            descriptors.push(ConnectionDescriptor::new(name.clone(), connection_string));
        }
        Self::new(descriptors)
    }

    /// Read and load a settings file. See [`from_settings_str`](Self::from_settings_str).
    ///
    /// # Errors
    ///
    /// Returns `SqlHelperError::ConfigError` if the file cannot be read or loaded.
    pub fn from_settings_file(
        path: impl AsRef<Path>,
        environment: Environment,
    ) -> Result<Self, SqlHelperError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            SqlHelperError::ConfigError(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_settings_str(&json, environment)
    }

    #[must_use]
    pub fn default_connection(&self) -> &ConnectionDescriptor {
        &self.default_connection
    }

    #[must_use]
    pub fn connection_string(&self) -> &str {
        &self.default_connection.connection_string
    }

    #[must_use]
    pub fn database2(&self) -> &ConnectionDescriptor {
        &self.database2
    }

    #[must_use]
    pub fn database3(&self) -> &ConnectionDescriptor {
        &self.database3
    }

    /// Look up any configured connection by name.
    ///
    /// # Errors
    ///
    /// Returns `SqlHelperError::ConfigError` if no connection has that name.
    pub fn connection(&self, name: &str) -> Result<&ConnectionDescriptor, SqlHelperError> {
        self.connections.get(name).ok_or_else(|| {
            SqlHelperError::ConfigError(format!("unknown connection string `{name}`"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptors(names: &[&str]) -> Vec<ConnectionDescriptor> {
        names
            .iter()
            .map(|n| ConnectionDescriptor::new(*n, format!("Server=db;Database={n}")))
            .collect()
    }

    #[test]
    fn fails_fast_without_required_names() {
        let err = SqlConfiguration::new(descriptors(&["AdventureConnection", "Database2"]))
            .unwrap_err();
        assert!(err.to_string().contains("Database3"), "{err}");
    }

    #[test]
    fn first_duplicate_wins() {
        let mut list = descriptors(&["AdventureConnection", "Database2", "Database3"]);
        list.push(ConnectionDescriptor::new("Database2", "Server=other"));
        let config = SqlConfiguration::new(list).unwrap();
        assert_eq!(
            config.database2().connection_string,
            "Server=db;Database=Database2"
        );
    }

    #[test]
    fn unknown_lookup_is_a_config_error() {
        let config =
            SqlConfiguration::new(descriptors(&["AdventureConnection", "Database2", "Database3"]))
                .unwrap();
        assert!(config.connection("Database2").is_ok());
        assert_eq!(config.connection("Reporting").unwrap_err().kind(), "config");
    }

    #[test]
    fn reads_only_the_requested_environment() {
        let json = r#"{
            "Development": { "ConnectionStrings": {
                "AdventureConnection": "Server=dev", "Database2": "Server=dev2", "Database3": "Server=dev3"
            } },
            "Production": { "ConnectionStrings": { "AdventureConnection": "Server=prod" } }
        }"#;
        let dev = SqlConfiguration::from_settings_str(json, Environment::Development).unwrap();
        assert_eq!(dev.connection_string(), "Server=dev");
        assert!(SqlConfiguration::from_settings_str(json, Environment::Production).is_err());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let d = ConnectionDescriptor::new("AdventureConnection", "Password=hunter2");
        assert!(!format!("{d:?}").contains("hunter2"));
    }

    #[test]
    fn parses_ado_connection_strings() {
        let d = ConnectionDescriptor::new(
            "AdventureConnection",
            "Server=tcp:localhost,1433;Database=AdventureWorks;User Id=sa;Password=x;TrustServerCertificate=true",
        );
        assert!(d.tiberius_config().is_ok());
    }
}
