//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::CourierConfig;
use super::secret_string;
use crate::domain::errors::CourierError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into CourierConfig
/// 4. Applies environment variable overrides (COURIER_* prefix)
/// 5. Resolves relative project and mapping paths against the file's directory
/// 6. Validates the configuration
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
/// use courier::config::loader::load_config;
///
/// let config = load_config("courier.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<CourierConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(CourierError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        CourierError::Configuration(format!(
            "Failed to read configuration file {}: {e}",
            path.display()
        ))
    })?;

    let mut config = parse_config(&contents)?;

    if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        resolve_relative_paths(&mut config, base);
    }

    config.validate().map_err(|e| {
        CourierError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    tracing::debug!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Parses configuration text: substitution, TOML, environment overrides
///
/// Validation is left to the caller.
pub fn parse_config(contents: &str) -> Result<CourierConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: CourierConfig = toml::from_str(&contents)
        .map_err(|e| CourierError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied verbatim. All missing variables are reported
/// together.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| CourierError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

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
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        lines.push(processed_line);
    }

    if !missing_vars.is_empty() {
        return Err(CourierError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

/// Applies environment variable overrides using COURIER_* prefix
///
/// Environment variables follow the pattern: COURIER_<SECTION>_<KEY>
/// For example: COURIER_EXPORT_API_BASE_URL, COURIER_EXPORT_BACKENDS
fn apply_env_overrides(config: &mut CourierConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("COURIER_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("COURIER_APPLICATION_DRY_RUN") {
        config.application.dry_run = val.parse().unwrap_or(false);
    }

    // Project overrides
    if let Ok(val) = std::env::var("COURIER_PROJECT_DIR") {
        config.project.dir = val.into();
    }
    if let Ok(val) = std::env::var("COURIER_PROJECT_EXPORT_TEMPLATE_ID") {
        config.project.export_template_id = val;
    }
    if let Ok(val) = std::env::var("COURIER_PROJECT_FILTER_USED_TEMPLATES") {
        config.project.filter_used_templates = val.parse().unwrap_or(true);
    }

    // Mapping overrides
    if let Ok(val) = std::env::var("COURIER_MAPPING_TABLE_PATH") {
        config.mapping.table_path = val.into();
    }

    // Export API overrides
    if let Ok(val) = std::env::var("COURIER_EXPORT_API_BASE_URL") {
        config.export_api.base_url = val;
    }
    if let Ok(val) = std::env::var("COURIER_EXPORT_API_TLS_VERIFY") {
        config.export_api.tls_verify = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("COURIER_EXPORT_API_MAX_POLL_ATTEMPTS") {
        if let Ok(attempts) = val.parse() {
            config.export_api.max_poll_attempts = attempts;
        }
    }
    if let Ok(val) = std::env::var("COURIER_EXPORT_API_POLL_BACKOFF_SECONDS") {
        if let Ok(secs) = val.parse() {
            config.export_api.poll_backoff_seconds = secs;
        }
    }

    // Export overrides
    if let Ok(val) = std::env::var("COURIER_EXPORT_BACKENDS") {
        config.export.backends = val
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Ok(val) = std::env::var("COURIER_EXPORT_EXPIRY_DAYS") {
        if let Ok(days) = val.parse() {
            config.export.expiry_days = days;
        }
    }
    if let Ok(val) = std::env::var("COURIER_EXPORT_USERNAME") {
        config.export.username = Some(val);
    }
    if let Ok(val) = std::env::var("COURIER_EXPORT_PASSWORD") {
        config.export.password = Some(secret_string(val));
    }

    // Logging overrides
    if let Ok(val) = std::env::var("COURIER_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("COURIER_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

fn resolve_relative_paths(config: &mut CourierConfig, base: &Path) {
    if config.project.dir.is_relative() {
        config.project.dir = base.join(&config.project.dir);
    }
    if config.mapping.table_path.is_relative() {
        config.mapping.table_path = base.join(&config.mapping.table_path);
    }
}
