// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Template command
//!
//! Renders every stack document of a deployment without touching any
//! service. Context stacks point at a placeholder code key.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

use stratus_core::application::deployment_orchestrator::render_stacks;
use stratus_core::domain::template::StackDescriptor;

use super::{load_config, TargetArgs};

#[derive(Args, Debug)]
pub struct TemplateArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Write `<stack>.json` files here instead of printing
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,
}

pub async fn execute(args: TemplateArgs, config_override: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_override)?;
    let deployment = args.target.deployment(&config)?;
    let names = deployment.names();

    let stacks = render_stacks(&config, &deployment, |service| {
        format!("{}/pending.zip", names.code_path(service))
    })?;

    match args.output {
        Some(dir) => write_stacks(&stacks, &dir),
        None => {
            for stack in &stacks {
                println!("{}", format!("# {}", stack.name).bold());
                println!("{}", stack.template.to_json_pretty()?);
            }
            Ok(())
        }
    }
}

pub fn write_stacks(stacks: &[StackDescriptor], dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    for stack in stacks {
        let path = dir.join(format!("{}.json", stack.name));
        std::fs::write(&path, stack.template.to_json_pretty()?)
            .with_context(|| format!("Failed to write {:?}", path))?;
        println!("{}", format!("✓ {}", path.display()).green());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratus_core::domain::deployment::Deployment;
    use stratus_core::domain::project_config::ProjectConfig;

    #[test]
    fn test_write_stacks() {
        let config = ProjectConfig::from_yaml_str(
            "project: acme\nprovider: {bucket: artifacts, region: us-east-1}\ncontexts: {widgets: {}}\n",
        )
        .unwrap();
        let deployment = Deployment::new(&config, "dev", "123456789012", &[]).unwrap();
        let stacks = render_stacks(&config, &deployment, |s| format!("pending/{s}.zip")).unwrap();

        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("stacks");
        write_stacks(&stacks, &out).unwrap();

        assert!(out.join("acme-dev.json").exists());
        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.join("acme-dev-widgets.json")).unwrap()).unwrap();
        assert!(doc["Resources"]["AcmeDevWidgetsSync"].is_object());
    }
}
