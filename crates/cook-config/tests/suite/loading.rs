use cook_config::{ConfigError, CookConfig, LoggingConfig, ResolverConfig};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

#[test]
fn empty_config_uses_defaults() {
    let config = CookConfig::load_from_str("").unwrap();
    assert_eq!(config, CookConfig::default());
    assert_eq!(config.resolver.max_depth, 512);
    assert_eq!(config.resolver.max_solutions, None);
    assert!(!config.resolver.reduce_solutions);
    assert_eq!(config.logging.level, "info");
    assert!(config.logging.stderr);
}

#[test]
fn loads_resolver_and_logging_tables() {
    let text = r#"
        [resolver]
        max_depth = 64
        max_solutions = 3
        reduce_solutions = true

        [logging]
        level = "debug"
        json = true
        stderr = false
    "#;

    let config = CookConfig::load_from_str(text).unwrap();
    assert_eq!(
        config,
        CookConfig {
            resolver: ResolverConfig {
                max_depth: 64,
                max_solutions: Some(3),
                reduce_solutions: true,
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                json: true,
                stderr: false,
            },
        }
    );
}

#[test]
fn zero_max_depth_is_accepted() {
    let config = CookConfig::load_from_str("[resolver]\nmax_depth = 0\n").unwrap();
    assert_eq!(config.resolver.max_depth, 0);
}

#[test]
fn unknown_keys_are_rejected() {
    let err = CookConfig::load_from_str("[resolver]\nexhaustive = true\n").unwrap_err();
    match err {
        ConfigError::Toml(message) => {
            assert!(message.contains("exhaustive"), "message: {message}")
        }
        other => panic!("expected a toml error, got {other:?}"),
    }
}

#[test]
fn load_from_path_reads_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cook.toml");
    std::fs::write(&path, "[resolver]\nmax_solutions = 1\n").unwrap();

    let config = CookConfig::load_from_path(&path).unwrap();
    assert_eq!(config.resolver.max_solutions, Some(1));
}

#[test]
fn missing_file_reports_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.toml");

    let err = CookConfig::load_from_path(&path).unwrap_err();
    match err {
        ConfigError::Io { path: reported, .. } => {
            assert_eq!(reported, path.display().to_string())
        }
        other => panic!("expected io error, got {other:?}"),
    }
}
