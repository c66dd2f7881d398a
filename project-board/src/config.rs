use std::str::FromStr;

use serde::Deserialize;
use serde_with::serde_as;
use strum::{Display, EnumString};
use time::Duration;

use crate::services::QueryCacheConfig;

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub workflow: WorkflowSettings,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct ApplicationSettings {
    /// Name stamped into audit fields for changes made by this process.
    pub actor: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            actor: "system".to_string(),
        }
    }
}

#[serde_as]
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct CacheSettings {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub list_ttl_secs: i64,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub project_ttl_secs: i64,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub summary_ttl_secs: i64,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub max_capacity: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            list_ttl_secs: 300,
            project_ttl_secs: 120,
            summary_ttl_secs: 300,
            max_capacity: 1_000,
        }
    }
}

impl CacheSettings {
    pub fn to_cache_config(&self) -> QueryCacheConfig {
        QueryCacheConfig {
            list_ttl: Duration::seconds(self.list_ttl_secs),
            project_ttl: Duration::seconds(self.project_ttl_secs),
            summary_ttl: Duration::seconds(self.summary_ttl_secs),
            max_capacity: self.max_capacity,
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct WorkflowSettings {
    /// Reject status changes that are not in the transition table.
    #[serde(default)]
    pub enforce_transitions: bool,
}

pub fn read_config() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("current directory: {e}")))?;
    let config_directory = base_path.join("config");

    let environment = Environment::from_str(
        std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .as_str(),
    )
    .map_err(|e| config::ConfigError::Message(format!("APP_ENVIRONMENT: {e}")))?;
    let environment_filename = format!("{}.yaml", environment);

    let settings = config::Config::builder()
        .add_source(config::File::from(config_directory.join("base.yaml")).required(false))
        .add_source(
            config::File::from(config_directory.join(environment_filename)).required(false),
        )
        .add_source(
            config::Environment::with_prefix("PROJECT_BOARD")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[derive(Display, Debug, EnumString, PartialEq)]
pub enum Environment {
    #[strum(ascii_case_insensitive, serialize = "local")]
    Local,
    #[strum(ascii_case_insensitive, serialize = "production")]
    Production,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_yaml(yaml: &str) -> Result<Settings, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(yaml, config::FileFormat::Yaml))
            .build()?
            .try_deserialize()
    }

    #[test]
    fn environment_parses_case_insensitively() {
        assert_eq!(Environment::from_str("Production").unwrap(), Environment::Production);
        assert_eq!(Environment::from_str("local").unwrap(), Environment::Local);
        assert!(Environment::from_str("staging").is_err());
    }

    #[test]
    fn base_file_matches_defaults() {
        let settings = from_yaml(include_str!("../config/base.yaml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn numeric_values_may_be_strings() {
        let settings = from_yaml(
            r#"
cache:
  list_ttl_secs: "60"
  project_ttl_secs: "30"
  summary_ttl_secs: "90"
  max_capacity: "10"
workflow:
  enforce_transitions: true
"#,
        )
        .unwrap();

        let cache = settings.cache.to_cache_config();
        assert_eq!(cache.list_ttl, Duration::minutes(1));
        assert_eq!(cache.project_ttl, Duration::seconds(30));
        assert_eq!(cache.max_capacity, 10);
        assert!(settings.workflow.enforce_transitions);
        assert_eq!(settings.application.actor, "system");
    }

    #[test]
    fn default_cache_settings_match_query_cache_defaults() {
        assert_eq!(
            CacheSettings::default().to_cache_config(),
            QueryCacheConfig::default()
        );
    }
}
