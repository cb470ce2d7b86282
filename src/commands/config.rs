use colored::*;
use eyre::{Context, Result};
use std::fs;

use crate::cli::{ConfigAction, OutputFormat};
use crate::config::{Config, LogLevel};

pub fn run(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Show { format } => show(OutputFormat::resolve(format), config),
        ConfigAction::Get { key } => get(&key, config),
        ConfigAction::Set { key, value } => set(&key, &value, config),
    }
}

fn show(format: OutputFormat, config: &Config) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(config)?);
        }
        OutputFormat::Text => {
            println!("{}", "klaviyo-events configuration".bold());
            println!();

            println!("{}:", "api".cyan());
            println!("  base_url: {}", config.api.base_url);
            println!("  revision: {}", config.api.revision);
            println!("  timeout_secs: {}", config.api.timeout_secs);
            println!("  key_env: {}", config.api.key_env);
            println!();

            println!("{}:", "defaults".cyan());
            println!("  currency: {}", config.defaults.currency);
            println!();

            println!("{}: {}", "log_level".cyan(), config.log_level.as_filter());
        }
    }

    Ok(())
}

fn lookup(key: &str, config: &Config) -> Option<String> {
    match key {
        "api.base_url" => Some(config.api.base_url.clone()),
        "api.revision" => Some(config.api.revision.clone()),
        "api.timeout_secs" => Some(config.api.timeout_secs.to_string()),
        "api.key_env" => Some(config.api.key_env.clone()),
        "defaults.currency" => Some(config.defaults.currency.clone()),
        "log_level" | "log-level" => Some(config.log_level.as_filter().to_string()),
        _ => None,
    }
}

fn get(key: &str, config: &Config) -> Result<()> {
    match lookup(key, config) {
        Some(v) => println!("{}", v),
        None => eyre::bail!("Unknown config key: {}", key),
    }

    Ok(())
}

fn apply(key: &str, value: &str, config: &Config) -> Result<Config> {
    let mut new_config = config.clone();

    match key {
        "api.base_url" => new_config.api.base_url = value.to_string(),
        "api.revision" => new_config.api.revision = value.to_string(),
        "api.timeout_secs" => {
            new_config.api.timeout_secs = value.parse().context("Invalid timeout (use whole seconds)")?;
        }
        "api.key_env" => new_config.api.key_env = value.to_string(),
        "defaults.currency" => new_config.defaults.currency = value.to_string(),
        "log_level" | "log-level" => {
            new_config.log_level =
                serde_yaml::from_str::<LogLevel>(value).context("Invalid log level (trace, debug, info, warn, error, off)")?;
        }
        _ => {
            eyre::bail!("Unknown config key: {}", key);
        }
    }

    Ok(new_config)
}

fn set(key: &str, value: &str, config: &Config) -> Result<()> {
    println!("{} Setting {} = {}", "→".blue(), key.cyan(), value.green());

    let new_config = apply(key, value, config)?;

    let config_path = Config::app_dir().join("config.yaml");
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let yaml_str = serde_yaml::to_string(&new_config).context("Failed to serialize config")?;
    fs::write(&config_path, yaml_str).context("Failed to write config file")?;

    println!("  {} Saved to {}", "✓".green(), config_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_keys() {
        let config = Config::default();
        assert_eq!(lookup("api.revision", &config), Some("2024-10-15".to_string()));
        assert_eq!(lookup("log-level", &config), Some("info".to_string()));
        assert_eq!(lookup("api.nope", &config), None);
    }

    #[test]
    fn test_apply_values() {
        let config = Config::default();
        let updated = apply("api.timeout_secs", "5", &config).unwrap();
        assert_eq!(updated.api.timeout_secs, 5);
        let updated = apply("log_level", "debug", &updated).unwrap();
        assert_eq!(updated.log_level, LogLevel::Debug);
        assert_eq!(config.api.timeout_secs, 30);
    }

    #[test]
    fn test_apply_rejects_bad_input() {
        let config = Config::default();
        assert!(apply("api.timeout_secs", "soon", &config).is_err());
        assert!(apply("log_level", "loud", &config).is_err());
        assert!(apply("unknown", "x", &config).is_err());
    }
}
