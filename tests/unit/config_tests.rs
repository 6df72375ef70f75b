// Configuration module unit tests

use image_resizer::config::*;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_can_deserialize_minimal_valid_yaml_config() {
    let yaml = r#"
resizer:
  debug: false
"#;
    let config: Config = serde_yaml::from_str(yaml).expect("Failed to deserialize YAML");
    assert!(config.resizer.workers >= 1);
    assert_eq!(config.logging, LoggingConfig::default());
}

#[test]
fn test_quality_is_optional() {
    let config = Config::from_yaml_with_env("resizer:\n  workers: 1\n").unwrap();
    assert_eq!(config.resizer.image_quality, None);
    assert_eq!(config.resizer.transform_settings().quality, None);
}

#[test]
fn test_env_var_substitution_in_nested_keys() {
    std::env::set_var("IMAGE_RESIZER_UNIT_WORKERS", "7");
    std::env::set_var("IMAGE_RESIZER_UNIT_LEVEL", "warn");
    let yaml = r#"
resizer:
  workers: ${IMAGE_RESIZER_UNIT_WORKERS}
logging:
  level: ${IMAGE_RESIZER_UNIT_LEVEL}
"#;
    let config = Config::from_yaml_with_env(yaml).unwrap();
    assert_eq!(config.resizer.workers, 7);
    assert_eq!(config.logging.level, "warn");
}

#[test]
fn test_lowercase_placeholder_is_left_alone() {
    // Only ${UPPER_CASE} names are substituted
    let yaml = "logging:\n  level: \"${lower}\"\n";
    let config = Config::from_yaml_with_env(yaml).unwrap();
    assert_eq!(config.logging.level, "${lower}");
}

#[test]
fn test_unknown_log_format_is_rejected() {
    let err = Config::from_yaml_with_env("logging:\n  format: xml\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_zero_timeout_is_rejected() {
    let config = Config::from_yaml_with_env("resizer:\n  timeout_ms: 0\n").unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("timeout_ms"));
}

#[test]
fn test_config_round_trips_through_file() {
    let config = Config {
        resizer: ResizerConfig {
            image_quality: Some(70),
            workers: 2,
            timeout_ms: Some(1000),
            ..Default::default()
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: LogFormat::Json,
        },
    };

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(serde_yaml::to_string(&config).unwrap().as_bytes())
        .unwrap();

    let loaded = Config::from_file(file.path()).unwrap();
    assert_eq!(loaded, config);
    loaded.validate().unwrap();
}
