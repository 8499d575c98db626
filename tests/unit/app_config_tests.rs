/*!
 * Tests for app configuration loading and validation
 */

use anyhow::Result;
use scenewright::app_config::{Config, ExtractionProvider, LogLevel};
use scenewright::pipeline::PipelineConfig;
use std::time::Duration;

use crate::common;

#[test]
fn test_fromFile_partialJson_shouldFillDefaults() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        dir.path(),
        "scenewright.json",
        r#"{"extraction": {"provider": "ollama", "common": {"max_attempts": 5}}, "log_level": "debug"}"#,
    )?;

    let config = Config::from_file(&path)?;

    assert_eq!(config.extraction.provider, ExtractionProvider::Ollama);
    assert_eq!(config.extraction.common.max_attempts, 5);
    assert_eq!(config.extraction.common.temperature, 0.0);
    assert_eq!(config.extraction.common.scene_max_output_tokens, 4096);
    assert_eq!(config.validation.min_location_length, 3);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.extraction.get_endpoint(), "http://localhost:11434");
    Ok(())
}

#[test]
fn test_save_thenLoad_shouldPreserveProviderSettings() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("scenewright.json");
    let mut config = Config::default();
    config.extraction.provider = ExtractionProvider::Anthropic;
    config.extraction.active_provider_config_mut().api_key = "sk-test".to_string();

    config.save(&path)?;
    let loaded = Config::from_file(&path)?;

    assert_eq!(loaded.extraction.provider, ExtractionProvider::Anthropic);
    assert_eq!(loaded.extraction.get_api_key(), "sk-test");
    assert!(loaded.validate().is_ok());
    Ok(())
}

#[test]
fn test_validate_anthropicWithoutKey_shouldFail() {
    let mut config = Config::default();
    config.extraction.provider = ExtractionProvider::Anthropic;

    assert!(config.validate().is_err());
}

#[test]
fn test_validate_zeroAttempts_shouldFail() {
    let mut config = Config::default();
    config.extraction.common.max_attempts = 0;

    assert!(config.validate().is_err());
}

#[test]
fn test_pipelineConfig_fromConfig_shouldCarryRetryAndBudgets() {
    let mut config = Config::default();
    config.extraction.common.max_attempts = 4;
    config.extraction.common.retry_backoff_ms = 250;
    config.extraction.common.slugline_max_output_tokens = 2048;

    let pipeline = PipelineConfig::from_config(&config);

    assert_eq!(pipeline.retry.max_attempts, 4);
    assert_eq!(pipeline.retry.base_delay, Duration::from_millis(250));
    assert_eq!(pipeline.slugline_max_output_tokens, 2048);
    assert_eq!(pipeline.scene_max_output_tokens, 4096);
}
