use std::fs;
use std::path::PathBuf;

use crowdsettle::error::{ConfigError, Error};
use crowdsettle::infrastructure::config::llm::LlmProvider;
use crowdsettle::infrastructure::config::settings::Config;

fn write_temp_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, contents).expect("write temp config");
    path
}

#[test]
fn example_config_is_valid() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config.example.toml");
    let config = Config::load(&path).expect("example config loads");

    assert_eq!(config.llm.provider, LlmProvider::Anthropic);
    assert_eq!(config.settlement.workers, 5);
    assert_eq!(config.monitor.live_debounce_secs, 90);
}

#[test]
fn config_rejects_zero_page_size() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp_config(
        &dir,
        r#"
[monitor]
page_size = 0
"#,
    );

    match Config::load(&path) {
        Err(Error::Config(ConfigError::InvalidValue {
            field: "page_size",
            ..
        })) => {}
        Err(err) => panic!("Expected invalid page_size error, got {err}"),
        Ok(config) => panic!(
            "Expected zero page size to be rejected, got {}",
            config.monitor.page_size
        ),
    }
}

#[test]
fn config_rejects_shrinking_backoff() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp_config(
        &dir,
        r#"
[settlement]
backoff_multiplier = 0.5
"#,
    );

    match Config::load(&path) {
        Err(Error::Config(ConfigError::InvalidValue {
            field: "backoff_multiplier",
            ..
        })) => {}
        Err(err) => panic!("Expected invalid multiplier error, got {err}"),
        Ok(_) => panic!("Expected backoff_multiplier < 1 to be rejected"),
    }
}

#[test]
fn config_rejects_out_of_range_temperature() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp_config(
        &dir,
        r#"
[llm.anthropic]
temperature = 3.5
"#,
    );

    let result = Config::load(&path);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidValue {
            field: "temperature",
            ..
        }))
    ));
}

#[test]
fn config_rejects_unknown_provider() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp_config(&dir, "[llm]\nprovider = \"gemini\"\n");

    assert!(matches!(
        Config::load(&path),
        Err(Error::Config(ConfigError::Parse(_)))
    ));
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();

    assert!(matches!(
        Config::load(dir.path().join("absent.toml")),
        Err(Error::Config(ConfigError::ReadFile(_)))
    ));
}
