//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use portal_core::validation::format_limit;
use portal_core::{Config, DeletePolicy};

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{:#}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "max_upload_bytes": config.max_upload_bytes,
                    "delete_policy": config.delete_policy,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:         {}", config.data_dir.display());
            println!(
                "  max_upload_bytes: {} ({})",
                config.max_upload_bytes,
                format_limit(&config.max_upload_bytes)
            );
            println!("  delete_policy:    {}", config.delete_policy);
            println!(
                "  log_file:         {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "max_upload_bytes" => {
            config.max_upload_bytes = value
                .parse()
                .context("Invalid value for max_upload_bytes. Use a number of bytes.")?;
        }
        "delete_policy" => {
            config.delete_policy = value.parse::<DeletePolicy>().map_err(anyhow::Error::msg)?;
        }
        "log_file" => {
            config.log_file = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.into())
            };
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, max_upload_bytes, delete_policy, log_file",
                key
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_known_keys() {
        let mut config = Config::default();

        apply(&mut config, "max_upload_bytes", "1024").unwrap();
        assert_eq!(config.max_upload_bytes, 1024);

        apply(&mut config, "delete_policy", "Cascade").unwrap();
        assert_eq!(config.delete_policy, DeletePolicy::Cascade);

        apply(&mut config, "log_file", "/tmp/portal.log").unwrap();
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/portal.log")));

        apply(&mut config, "log_file", "none").unwrap();
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_apply_rejects_bad_values() {
        let mut config = Config::default();

        assert!(apply(&mut config, "max_upload_bytes", "five").is_err());
        assert!(apply(&mut config, "delete_policy", "shred").is_err());

        let err = apply(&mut config, "sync_url", "x").unwrap_err();
        assert!(err.to_string().contains("Unknown configuration key"));
    }
}
