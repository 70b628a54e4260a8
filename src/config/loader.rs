//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::ShroudConfig;
use crate::config::secret_string;
use crate::domain::errors::ShroudError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into ShroudConfig
/// 4. Applies environment variable overrides (SHROUD_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - Environment variable substitution fails
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use shroud::config::loader::load_config;
///
/// let config = load_config("shroud.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ShroudConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ShroudError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ShroudError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: ShroudConfig = toml::from_str(&contents)
        .map_err(|e| ShroudError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        ShroudError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched. Every missing variable is reported
/// in a single error.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ShroudError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut lines = Vec::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        lines.push(processed_line);
    }

    if !missing_vars.is_empty() {
        return Err(ShroudError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| ShroudError::Configuration(format!("Invalid {name} value: '{value}'")))
}

/// Applies environment variable overrides using SHROUD_* prefix
///
/// Environment variables follow the pattern: SHROUD_<SECTION>_<KEY>
/// For example: SHROUD_SOURCE_URL, SHROUD_STORAGE_DATABASE_PATH
fn apply_env_overrides(config: &mut ShroudConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("SHROUD_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("SHROUD_APPLICATION_DRY_RUN") {
        config.application.dry_run = parse_env("SHROUD_APPLICATION_DRY_RUN", &val)?;
    }

    // Source overrides
    if let Ok(val) = std::env::var("SHROUD_SOURCE_URL") {
        config.source.url = val;
    }
    if let Ok(val) = std::env::var("SHROUD_SOURCE_GENDER") {
        config.source.gender = Some(val);
    }
    if let Ok(val) = std::env::var("SHROUD_SOURCE_BIRTHDAY_START") {
        config.source.birthday_start = Some(val);
    }
    if let Ok(val) = std::env::var("SHROUD_SOURCE_MAX_RECORDS") {
        config.source.max_records = Some(parse_env("SHROUD_SOURCE_MAX_RECORDS", &val)?);
    }
    if let Ok(val) = std::env::var("SHROUD_SOURCE_CHUNK_SIZE") {
        config.source.chunk_size = Some(parse_env("SHROUD_SOURCE_CHUNK_SIZE", &val)?);
    }
    if let Ok(val) = std::env::var("SHROUD_SOURCE_TIMEOUT_SECONDS") {
        config.source.timeout_seconds = parse_env("SHROUD_SOURCE_TIMEOUT_SECONDS", &val)?;
    }
    if let Ok(val) = std::env::var("SHROUD_SOURCE_RETRY_MAX_RETRIES") {
        config.source.retry.max_retries = parse_env("SHROUD_SOURCE_RETRY_MAX_RETRIES", &val)?;
    }

    // Quality overrides (comma-separated)
    if let Ok(val) = std::env::var("SHROUD_QUALITY_REQUIRED_FIELDS") {
        config.quality.required_fields = val
            .split(',')
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();
    }

    // Storage overrides
    if let Ok(val) = std::env::var("SHROUD_STORAGE_DATABASE_PATH") {
        config.storage.database_path = PathBuf::from(val);
    }
    if let Ok(val) = std::env::var("SHROUD_STORAGE_TOKENLESS_POLICY") {
        config.storage.tokenless_policy = val.parse().map_err(ShroudError::Configuration)?;
    }

    // Key material overrides
    if let Ok(val) = std::env::var("SHROUD_KEYS_PATH") {
        config.keys.path = PathBuf::from(val);
    }
    if let Ok(val) = std::env::var("SHROUD_KEYS_CREATE_IF_MISSING") {
        config.keys.create_if_missing = parse_env("SHROUD_KEYS_CREATE_IF_MISSING", &val)?;
    }

    // Auth overrides
    if let Ok(val) = std::env::var("SHROUD_AUTH_CREDENTIALS_PATH") {
        config.auth.credentials_path = PathBuf::from(val);
    }
    if let Ok(val) = std::env::var("SHROUD_AUTH_ADMIN_KEY") {
        config.auth.admin_key = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("SHROUD_AUTH_DATABASE_KEY") {
        config.auth.database_key = Some(secret_string(val));
    }

    // Anonymization overrides
    config
        .anonymization
        .apply_env_overrides()
        .map_err(|e| ShroudError::Configuration(format!("{e:#}")))?;

    // Logging overrides
    if let Ok(val) = std::env::var("SHROUD_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_env("SHROUD_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Ok(val) = std::env::var("SHROUD_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("SHROUD_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("SHROUD_TEST_LOADER_VAR", "test_value");
        let input = "admin_key = \"${SHROUD_TEST_LOADER_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "admin_key = \"test_value\"");
        std::env::remove_var("SHROUD_TEST_LOADER_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("SHROUD_TEST_MISSING_A");
        std::env::remove_var("SHROUD_TEST_MISSING_B");
        let input = "a = \"${SHROUD_TEST_MISSING_A}\"\nb = \"${SHROUD_TEST_MISSING_B}\"";
        let err = substitute_env_vars(input).unwrap_err().to_string();
        assert!(err.contains("SHROUD_TEST_MISSING_A"));
        assert!(err.contains("SHROUD_TEST_MISSING_B"));
    }

    #[test]
    fn test_substitute_env_vars_skips_comments() {
        std::env::remove_var("SHROUD_TEST_COMMENTED");
        let input = "# key = \"${SHROUD_TEST_COMMENTED}\"";
        assert_eq!(substitute_env_vars(input).unwrap(), input);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(matches!(result, Err(ShroudError::Configuration(_))));
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
log_level = "debug"

[source]
url = "https://fakerapi.it/api/v1/persons"
gender = "female"
birthday_start = "2005-01-01"
max_records = 100
chunk_size = 25

[storage]
database_path = "./data/test.db"
tokenless_policy = "insert_without_dedup"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.source.chunk_size, Some(25));
        assert_eq!(config.quality.required_fields, vec!["email"]);
        assert_eq!(
            config.storage.tokenless_policy,
            crate::adapters::sqlite::TokenlessPolicy::InsertWithoutDedup
        );
    }
}
