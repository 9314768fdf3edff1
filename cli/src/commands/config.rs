// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use stratus_core::domain::context::ContextMap;
use stratus_core::domain::project_config::ProjectConfig;

use super::load_config;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,

        /// Print the effective configuration as YAML
        #[arg(long)]
        yaml: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths, yaml } => show(config_override, paths, yaml).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool, as_yaml: bool) -> Result<()> {
    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. STRATUS_CONFIG_PATH: {}",
            std::env::var("STRATUS_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./stratus.yaml");
        println!("  4. ~/.stratus/config.yaml");
        println!("  5. /etc/stratus/config.yaml");
        println!();
    }

    let config = load_config(config_override)?;
    if as_yaml {
        print!("{}", config.to_yaml_string()?);
        return Ok(());
    }

    println!("{}", "Current configuration:".bold());
    println!();
    println!("{}", "Project:".bold());
    println!("  Name: {}", config.project);
    println!("  Bucket: {}", config.provider.bucket.as_deref().unwrap_or("(none)"));
    println!("  Region: {}", config.provider.region.as_deref().unwrap_or("(none)"));
    println!();

    println!("{}", "Contexts:".bold());
    let map = ContextMap::from_config(&config);
    for context in map.contexts() {
        println!("  {}", context.name.bold());
        println!("    Entities: {}", context.entities.len());
        println!("    Events: {}", context.events.join(", "));
        println!("    Endpoints: {}", context.endpoints.len());
        match map.subscriptions(context) {
            Ok(subscriptions) => {
                for subscription in subscriptions {
                    println!(
                        "      - {} ← {}",
                        subscription.event, subscription.source_context
                    );
                }
            }
            Err(e) => println!("    {}", e.to_string().red()),
        }
    }
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = load_config(config_path)?;
    validate_config(&config)?;

    println!("{}", "✓ Configuration is valid".green());
    Ok(())
}

pub fn validate_config(config: &ProjectConfig) -> Result<()> {
    config.validate().context("Configuration validation failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_config() {
        let config = ProjectConfig::from_yaml_str(
            r#"
project: acme
provider: {bucket: artifacts, region: us-east-1}
contexts:
  widgets:
    event_listeners: {WidgetService: [OrderPlaced]}
  orders:
    events: [OrderPlaced]
"#,
        )
        .unwrap();
        validate_config(&config).unwrap();

        let missing = ProjectConfig::from_yaml_str(
            "project: acme\nprovider: {bucket: artifacts, region: us-east-1}\ncontexts: {widgets: {event_listeners: {S: [Nope]}}}\n",
        )
        .unwrap();
        assert!(validate_config(&missing).is_err());
    }
}
