//! Promotion settings: a TOML file plus environment overrides.
//!
//! ```toml
//! [source]
//! host = "localhost"
//! port = 9081
//! user = "resAdmin"
//! password = "resAdmin"
//!
//! [destination]
//! host = "localhost"
//! port = 9080
//! user = "rtsAdmin"
//! password = "rtsAdmin"
//!
//! [promotion]
//! stage_dir = "./data"
//! skip_existing_xom = false
//! timeout_secs = 300
//! ```
//!
//! Every endpoint field can be overridden with
//! `RESPROMOTE_{SOURCE,DESTINATION}_{HOST,PORT,USER,PASSWORD}`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{DEFAULT_STAGE_DIR, Endpoint, PromoteError};

/// Prefix of every environment override.
pub const ENV_PREFIX: &str = "RESPROMOTE";

const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Possibly incomplete endpoint settings, before overrides are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EndpointConfig {
    /// Server host.
    pub host: Option<String>,
    /// Server port.
    pub port: Option<u16>,
    /// Basic auth user.
    pub user: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
}

impl EndpointConfig {
    fn apply_env(
        &mut self,
        role: &str,
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<(), PromoteError> {
        let var = |field: &str| lookup(&format!("{ENV_PREFIX}_{role}_{field}"));

        if let Some(host) = var("HOST") {
            self.host = Some(host);
        }
        if let Some(port) = var("PORT") {
            let port = port.trim().parse::<u16>().map_err(|_| {
                PromoteError::Config(format!("{ENV_PREFIX}_{role}_PORT is not a port: '{port}'"))
            })?;
            self.port = Some(port);
        }
        if let Some(user) = var("USER") {
            self.user = Some(user);
        }
        if let Some(password) = var("PASSWORD") {
            self.password = Some(password);
        }
        Ok(())
    }

    /// Build the endpoint; `role` names it in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`PromoteError::Config`] if host, user or password is missing.
    pub fn to_endpoint(&self, role: &str) -> Result<Endpoint, PromoteError> {
        let require = |value: &Option<String>, field: &str| {
            value
                .clone()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| PromoteError::Config(format!("{role} endpoint has no {field}")))
        };
        Ok(Endpoint::new(
            require(&self.host, "host")?,
            self.port,
            require(&self.user, "user")?,
            require(&self.password, "password")?,
        ))
    }
}

/// The `[promotion]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PromotionSettings {
    /// Where fetched archives are written.
    pub stage_dir: PathBuf,
    /// Skip XOMs already present on the destination.
    pub skip_existing_xom: bool,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for PromotionSettings {
    fn default() -> Self {
        Self {
            stage_dir: PathBuf::from(DEFAULT_STAGE_DIR),
            skip_existing_xom: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Complete promotion configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PromoteConfig {
    /// Server promoted from.
    #[serde(default)]
    pub source: EndpointConfig,
    /// Server promoted to.
    #[serde(default)]
    pub destination: EndpointConfig,
    /// Pipeline settings.
    #[serde(default)]
    pub promotion: PromotionSettings,
}

impl PromoteConfig {
    /// Parse a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`PromoteError::Config`] if the document is not valid TOML or
    /// does not match the schema.
    pub fn from_toml(content: &str) -> Result<Self, PromoteError> {
        toml::from_str(content).map_err(|e| PromoteError::Config(e.to_string()))
    }

    /// Load a configuration file. A missing file yields the defaults, so the
    /// environment alone can describe both endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`PromoteError::Storage`] if the file exists but cannot be
    /// read, or [`PromoteError::Config`] if it cannot be parsed.
    pub async fn load(path: &Path) -> Result<Self, PromoteError> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(PromoteError::storage(path, e)),
        };

        Self::from_toml(&content)
            .map_err(|e| PromoteError::Config(format!("{}: {e}", path.display())))
    }

    /// Apply environment overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`PromoteError::Config`] if a port override is not a valid
    /// port number.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), PromoteError> {
        self.source.apply_env("SOURCE", &lookup)?;
        self.destination.apply_env("DESTINATION", &lookup)?;
        Ok(())
    }

    /// Apply overrides from the process environment.
    ///
    /// # Errors
    ///
    /// See [`PromoteConfig::apply_env`].
    pub fn apply_process_env(&mut self) -> Result<(), PromoteError> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// The source endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`PromoteError::Config`] if it is incomplete.
    pub fn source_endpoint(&self) -> Result<Endpoint, PromoteError> {
        self.source.to_endpoint("source")
    }

    /// The destination endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`PromoteError::Config`] if it is incomplete.
    pub fn destination_endpoint(&self) -> Result<Endpoint, PromoteError> {
        self.destination.to_endpoint("destination")
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.promotion.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
        [source]
        host = "localhost"
        port = 9081
        user = "resAdmin"
        password = "resAdmin"

        [destination]
        host = "res-prod.internal"
        user = "rtsAdmin"
        password = "rtsAdmin"

        [promotion]
        skip_existing_xom = true
    "#;

    #[test]
    fn test_parse_sample() {
        let config = PromoteConfig::from_toml(SAMPLE).unwrap();

        let src = config.source_endpoint().unwrap();
        assert_eq!(src.base_url(), "http://localhost:9081/res/apiauth/v1");
        assert_eq!(src.user(), "resAdmin");

        let dst = config.destination_endpoint().unwrap();
        assert_eq!(dst.port(), None);
        assert_eq!(dst.base_url(), "http://res-prod.internal/res/apiauth/v1");

        assert!(config.promotion.skip_existing_xom);
        assert_eq!(config.promotion.stage_dir, PathBuf::from("./data"));
        assert_eq!(config.timeout(), Duration::from_secs(300));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = PromoteConfig::from_toml(SAMPLE).unwrap();
        let env: HashMap<&str, &str> = [
            ("RESPROMOTE_SOURCE_PASSWORD", "from-env"),
            ("RESPROMOTE_DESTINATION_PORT", "9443"),
        ]
        .into_iter()
        .collect();

        config
            .apply_env(|key| env.get(key).map(ToString::to_string))
            .unwrap();

        assert_eq!(config.source_endpoint().unwrap().password(), "from-env");
        assert_eq!(config.destination_endpoint().unwrap().port(), Some(9443));
        assert_eq!(config.source_endpoint().unwrap().host(), "localhost");
    }

    #[test]
    fn test_bad_port_override() {
        let mut config = PromoteConfig::default();
        let err = config
            .apply_env(|key| (key == "RESPROMOTE_SOURCE_PORT").then(|| "http".to_string()))
            .unwrap_err();
        assert!(matches!(err, PromoteError::Config(_)));
    }

    #[test]
    fn test_incomplete_endpoint() {
        let config = PromoteConfig::from_toml(
            r#"
            [source]
            host = "localhost"
            user = "resAdmin"
            "#,
        )
        .unwrap();

        let err = config.source_endpoint().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: source endpoint has no password"
        );
        assert!(config.destination_endpoint().is_err());
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            PromoteConfig::from_toml("[source\nhost = 1"),
            Err(PromoteError::Config(_))
        ));
        assert!(matches!(
            PromoteConfig::from_toml("[source]\nport = \"not-a-number\""),
            Err(PromoteError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_load_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = PromoteConfig::load(&tmp.path().join("respromote.toml"))
            .await
            .unwrap();
        assert_eq!(config, PromoteConfig::default());
    }

    #[tokio::test]
    async fn test_load_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("respromote.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = PromoteConfig::load(&path).await.unwrap();
        assert_eq!(config.source.port, Some(9081));

        std::fs::write(&path, "promotion = 3").unwrap();
        let err = PromoteConfig::load(&path).await.unwrap_err();
        assert!(err.to_string().contains("respromote.toml"));
    }
}
