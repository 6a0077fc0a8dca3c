//! Tests for the logger module

use crate::logger::config::*;

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_default_config_creation() {
        let config = LoggerConfig::default();
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, LogFormat::Full);
        assert!(config.colored);
    }

    #[test]
    fn test_config_validation() {
        let mut config = LoggerConfig::default();
        assert!(config.validate().is_ok());

        config.with_level("loud");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_new_rejects_invalid_level() {
        assert!(LoggerConfig::new("debug", LogFormat::Json, false).is_ok());
        assert!(LoggerConfig::new("verbose", LogFormat::Json, false).is_err());
    }

    #[test]
    fn test_parse_level_case_insensitive() {
        let mut config = LoggerConfig::default();
        config.with_level("DEBUG");
        assert_eq!(config.parse_level().unwrap(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("full".parse::<LogFormat>().unwrap(), LogFormat::Full);
        assert_eq!("Compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_log_format_as_str() {
        assert_eq!(LogFormat::Full.as_str(), "full");
        assert_eq!(LogFormat::Compact.as_str(), "compact");
        assert_eq!(LogFormat::Json.as_str(), "json");
    }

    #[test]
    fn test_builder_methods() {
        let mut config = LoggerConfig::default();
        config.with_format(LogFormat::Json).without_colors();
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.colored);
    }

    #[test]
    fn test_init_logger_rejects_invalid_level() {
        let mut config = LoggerConfig::default();
        config.with_level("loud");

        let err = crate::logger::init_logger(config).unwrap_err();
        assert!(err.to_string().contains("Invalid log level"));
    }
}
