//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
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

/// Parse configuration from TOML text without validating it.
///
/// Callers that layer overrides on top validate the merged result.
pub fn parse_config(content: &str) -> Result<RelayConfig, ConfigError> {
    toml::from_str(content).map_err(ConfigError::Parse)
}

/// Read configuration from a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let config = read_config(path)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, RelayConfig::default());
        assert_eq!(config.upstream.base_url, "https://track.sendfromchina.com");
        assert_eq!(config.upstream.timeout_secs, 10);
    }

    #[test]
    fn test_partial_sections() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "127.0.0.1:8080"

            [upstream]
            timeout_secs = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:8080");
        assert_eq!(config.upstream.timeout_secs, 3);
        assert_eq!(config.upstream.base_url, "https://track.sendfromchina.com");
        assert_eq!(config.static_files.root, "www");
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[upstream]\ntimeout_secs = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("Parse error"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/sfc-relay.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_load_validates() {
        let path = std::env::temp_dir().join(format!("sfc-relay-{}.toml", std::process::id()));
        fs::write(&path, "[upstream]\ntimeout_secs = 0\n").unwrap();

        let err = load_config(&path).unwrap_err();
        let _ = fs::remove_file(&path);

        match err {
            ConfigError::Validation(errors) => assert_eq!(errors, vec![ValidationError::ZeroTimeout]),
            other => panic!("expected validation error, got {}", other),
        }
    }
}
