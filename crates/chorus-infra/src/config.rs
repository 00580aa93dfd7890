//! Configuration loader for Chorus.
//!
//! Reads `config.toml` from the data directory (`~/.chorus/` in production)
//! and deserializes it into [`ChorusConfig`]. Falls back to defaults when the
//! file is missing, malformed, or fails validation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chorus_types::config::{ChorusConfig, MAX_VALIDATION_RETRIES};
use chorus_types::error::ConfigError;

/// Minimum generation timeout in seconds.
const MIN_GENERATION_TIMEOUT_SECS: u64 = 1;

/// Path of the config file inside a data directory.
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`ChorusConfig::default()`].
/// - Unreadable, unparsable or invalid file: logs a warning and returns the
///   default.
/// - Otherwise the parsed config with floors applied.
pub async fn load_config(data_dir: &Path) -> ChorusConfig {
    let path = config_path(data_dir);

    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", path.display());
            return ChorusConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return ChorusConfig::default();
        }
    };

    match parse_config(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to load {}: {err}, using defaults", path.display());
            ChorusConfig::default()
        }
    }
}

/// Parse and validate a TOML document.
pub fn parse_config(content: &str) -> Result<ChorusConfig, ConfigError> {
    let config: ChorusConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    let config = apply_floors(config);
    validate_config(&config)?;
    Ok(config)
}

/// Clamp values that have a hard floor instead of rejecting them.
pub fn apply_floors(mut config: ChorusConfig) -> ChorusConfig {
    config.generation_timeout_secs = config
        .generation_timeout_secs
        .max(MIN_GENERATION_TIMEOUT_SECS);
    config.budget_warning_percent = config.budget_warning_percent.min(100);
    config
}

/// Reject values that cannot be repaired.
pub fn validate_config(config: &ChorusConfig) -> Result<(), ConfigError> {
    check_unit("eligibility_threshold", config.eligibility_threshold)?;
    if config.max_validation_retries > MAX_VALIDATION_RETRIES {
        return Err(ConfigError::InvalidValue {
            field: "max_validation_retries",
            reason: format!(
                "{} exceeds the maximum of {MAX_VALIDATION_RETRIES}",
                config.max_validation_retries
            ),
        });
    }

    let mut seen = HashSet::new();
    for character in &config.characters {
        let id = character.id.trim();
        if id.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "characters.id",
                reason: "must not be empty".to_string(),
            });
        }
        if !seen.insert(id.to_string()) {
            return Err(ConfigError::DuplicateCharacter(id.to_string()));
        }
        if let Some(threshold) = character.engagement_threshold {
            check_unit("characters.engagement_threshold", threshold)?;
        }
    }
    Ok(())
}

fn check_unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!("{value} is outside [0, 1]"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_types::config::CharacterKind;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config, ChorusConfig::default());
    }

    #[tokio::test]
    async fn valid_toml_is_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            config_path(tmp.path()),
            r#"
hourly_call_budget = 40
eligibility_threshold = 0.5
reply_rounds = 2

[[characters]]
id = "ada"
kind = "analyst"
cooldown_minutes = 5

[[characters]]
id = "rex"
kind = "contrarian"
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.hourly_call_budget, 40);
        assert_eq!(config.reply_rounds, 2);
        assert_eq!(config.characters.len(), 2);
        assert_eq!(config.characters[0].kind, CharacterKind::Analyst);
        assert_eq!(config.characters[0].cooldown_minutes, Some(5));
        assert_eq!(config.characters[1].id, "rex");
    }

    #[tokio::test]
    async fn invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(config_path(tmp.path()), "this is not { valid toml !!!")
            .await
            .unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config, ChorusConfig::default());
    }

    #[tokio::test]
    async fn invalid_values_return_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(config_path(tmp.path()), "eligibility_threshold = 3.0")
            .await
            .unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config, ChorusConfig::default());
    }

    #[test]
    fn timeout_floor_is_applied() {
        let config = parse_config("generation_timeout_secs = 0").unwrap();
        assert_eq!(config.generation_timeout_secs, 1);
    }

    #[test]
    fn duplicate_character_ids_are_rejected() {
        let err = parse_config(
            r#"
[[characters]]
id = "ada"
kind = "analyst"

[[characters]]
id = "ada"
kind = "enthusiast"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateCharacter(id) if id == "ada"));
    }

    #[test]
    fn character_threshold_must_be_unit() {
        let err = parse_config(
            r#"
[[characters]]
id = "ada"
kind = "analyst"
engagement_threshold = -0.2
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("characters.engagement_threshold"));
    }

    #[test]
    fn validation_retries_are_bounded() {
        assert_eq!(
            parse_config("max_validation_retries = 5").unwrap().max_validation_retries,
            MAX_VALIDATION_RETRIES
        );
        assert!(matches!(
            parse_config("max_validation_retries = 4294967295"),
            Err(ConfigError::InvalidValue {
                field: "max_validation_retries",
                ..
            })
        ));
    }

    #[test]
    fn unknown_kind_is_a_parse_error() {
        let err = parse_config(
            r#"
[[characters]]
id = "ada"
kind = "poet"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
