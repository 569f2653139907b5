use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::aggregate::AggregateOptions;
use crate::error::ConfigError;
use crate::ingest::DEFAULT_HEADER_ROW;

pub const DEFAULT_CONFIG_FILE: &str = "roadmap.toml";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Resolved settings: defaults, then the TOML file, then environment overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub header_row: usize,
    pub aggregate: AggregateOptions,
    pub log_level: String,
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            header_row: DEFAULT_HEADER_ROW,
            aggregate: AggregateOptions::default(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_json: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    dashboard: Option<TomlDashboard>,
    logging: Option<TomlLogging>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlDashboard {
    header_row: Option<usize>,
    label_max_chars: Option<usize>,
    top_tools_limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlLogging {
    level: Option<String>,
    json: Option<bool>,
}

impl Config {
    /// Loads `path` when given, otherwise `roadmap.toml` in the working directory if present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        let file = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|path| path.exists()),
        };
        if let Some(file) = file {
            config.apply(Self::read(&file)?);
        }

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<TomlConfig, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<TomlConfig, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply(&mut self, toml: TomlConfig) {
        if let Some(dashboard) = toml.dashboard {
            if let Some(header_row) = dashboard.header_row {
                self.header_row = header_row;
            }
            if let Some(label_max_chars) = dashboard.label_max_chars {
                self.aggregate.label_max_chars = label_max_chars;
            }
            if let Some(top_tools_limit) = dashboard.top_tools_limit {
                self.aggregate.top_tools_limit = top_tools_limit;
            }
        }

        if let Some(logging) = toml.logging {
            if let Some(level) = logging.level {
                self.log_level = level;
            }
            if let Some(json) = logging.json {
                self.log_json = json;
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var("ROADMAP_LOG") {
            if !level.trim().is_empty() {
                self.log_level = level;
            }
        }
        if let Ok(json) = env::var("ROADMAP_LOG_JSON") {
            self.log_json = matches!(json.trim(), "1" | "true" | "yes");
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.aggregate.label_max_chars == 0 {
            return Err(ConfigError::Invalid {
                field: "dashboard.label_max_chars",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.aggregate.top_tools_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "dashboard.top_tools_limit",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "logging.level",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    impl Config {
        fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
            let mut config = Config::default();
            config.apply(Self::parse(content, Path::new("<inline>"))?);
            config.validate()?;
            Ok(config)
        }
    }

    #[test]
    fn defaults_match_the_pipeline_export() {
        let config = Config::default();
        assert_eq!(config.header_row, 2);
        assert_eq!(config.aggregate.label_max_chars, 50);
        assert_eq!(config.aggregate.top_tools_limit, 5);
    }

    #[test]
    fn file_values_override_defaults() {
        let config = Config::from_toml_str(
            r#"
            [dashboard]
            label_max_chars = 12
            top_tools_limit = 3

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.header_row, 2);
        assert_eq!(config.aggregate.label_max_chars, 12);
        assert_eq!(config.aggregate.top_tools_limit, 3);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn zero_limits_are_rejected() {
        let err = Config::from_toml_str("[dashboard]\ntop_tools_limit = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "dashboard.top_tools_limit",
                ..
            }
        ));
    }

    #[test]
    fn unknown_keys_fail_to_parse() {
        let err = Config::from_toml_str("[dashboard]\ncolour = \"red\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn explicit_path_must_exist() {
        let err = Config::load(Some(Path::new("/nonexistent/roadmap.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[dashboard]\nheader_row = 0").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.header_row, 0);
    }
}
