use aria_rs::config::{EngineConfig, GeneratorConfig};
use aria_rs::GenerateOptions;
use pretty_assertions::assert_eq;

#[test]
fn generator_defaults_match_the_documented_constants() {
    let config = GeneratorConfig::default();
    assert_eq!(config.max_words, 12);
    assert_eq!(config.min_words, 3);
    assert_eq!(config.strength_threshold, 0.01);
    assert_eq!(config.randomness, 0.25);
    assert_eq!(config.max_length_chars, 150);
}

#[test]
fn generate_options_default_to_the_standard_length_cap() {
    assert_eq!(GenerateOptions::default().max_length, 150);
}

#[test]
fn generator_builders_reject_degenerate_values() {
    assert!(GeneratorConfig::default().with_max_words(0).is_err());
    assert!(GeneratorConfig::default().with_max_words(2).is_err());
    assert!(GeneratorConfig::default().with_min_words(0).is_err());
    assert!(GeneratorConfig::default().with_min_words(13).is_err());
    assert!(GeneratorConfig::default().with_randomness(1.5).is_err());
    assert!(GeneratorConfig::default().with_randomness(-0.1).is_err());
}

#[test]
fn generator_builders_accept_sane_values() {
    let config = GeneratorConfig::default()
        .with_max_words(20)
        .and_then(|c| c.with_min_words(5))
        .and_then(|c| c.with_randomness(0.5))
        .expect("valid configuration");
    assert_eq!(config.max_words, 20);
    assert_eq!(config.min_words, 5);
    assert_eq!(config.randomness, 0.5);
}

#[test]
fn engine_builders_validate_retry_attempts() {
    assert!(EngineConfig::default().with_retry_attempts(0).is_err());
    let config = EngineConfig::default()
        .with_retry_attempts(5)
        .expect("valid configuration");
    assert_eq!(config.retry_attempts, 5);
    assert!(config.aging_enabled);
    assert!(!config.clone().with_aging(false).aging_enabled);
}
