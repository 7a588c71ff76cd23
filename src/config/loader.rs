//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::RouterConfig;
use crate::config::validation::{validate_config, ConfigValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ConfigValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<RouterConfig, ConfigError> {
    let config: RouterConfig = toml::from_str(content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RouterConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [settings]
            multi_locale = true

            [[tenants]]
            id = 3
            base_uri = "/shop/"
            locales = [1, 2]
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert!(config.settings.multi_locale);
        assert_eq!(config.tenants[0].base_uri, "/shop/");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_syntax_error_is_parse_error() {
        assert!(matches!(parse_config("[settings"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_semantic_errors_are_collected() {
        let err = parse_config(
            r#"
            [[tenants]]
            id = 1
            locales = []

            [[overrides]]
            route_id = "nope"
            rule = "x"
            "#,
        )
        .unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other}"),
        }
    }
}
