// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment synthesizer
//!
//! Loads one environment configuration, synthesizes and validates the
//! resource graph and writes the manifest for the provisioning engine.
//!
//! Run with: cargo run --bin synth
//!
//! Environment:
//! - `DEPLOY_ENV`: environment to synthesize (default `dev`)
//! - `CONFIG_DIR`: directory holding `<env>.json` (default `config`)
//! - `OUTPUT`: manifest path (stdout when unset)
//! - `UNIQUENESS_SEED`: bucket name suffix (clock-derived when unset)

use anyhow::{Context, Result};
use proxy_infrastructure::{Deployment, EnvironmentConfig, Manifest, UniquenessSeed};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Configuration for one synthesizer run
#[derive(Debug, Clone)]
struct SynthConfig {
    env: String,
    config_dir: PathBuf,
    output: Option<PathBuf>,
    seed: UniquenessSeed,
}

impl SynthConfig {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let env = std::env::var("DEPLOY_ENV").unwrap_or_else(|_| "dev".to_string());

        let config_dir =
            PathBuf::from(std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string()));

        let output = std::env::var("OUTPUT").ok().map(PathBuf::from);

        let seed = match std::env::var("UNIQUENESS_SEED") {
            Ok(seed) => UniquenessSeed::new(seed).context("UNIQUENESS_SEED is not a valid seed")?,
            Err(_) => UniquenessSeed::from_clock(),
        };

        Ok(Self {
            env,
            config_dir,
            output,
            seed,
        })
    }
}

/// `RUST_LOG` wins when it parses, otherwise everything at info
fn log_filter(rust_log: Option<String>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn main() -> Result<()> {
    // Logs go to stderr so the manifest can be piped from stdout
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok()))
        .init();

    info!("🚀 Starting deployment synthesis");

    let synth = SynthConfig::from_env()?;
    info!("📋 Configuration:");
    info!("  - Environment: {}", synth.env);
    info!("  - Config directory: {}", synth.config_dir.display());
    info!("  - Uniqueness seed: {}", synth.seed.as_str());

    let config = EnvironmentConfig::load(&synth.config_dir, &synth.env)
        .with_context(|| format!("Failed to load configuration for {}", synth.env))?;

    let deployment =
        Deployment::synthesize(&config, &synth.seed).context("Failed to synthesize deployment")?;
    info!(
        "✅ Synthesized {} stacks with {} resources",
        deployment.stacks().count(),
        deployment.resource_count()
    );

    let json = Manifest::from_deployment(&deployment)
        .and_then(|manifest| manifest.to_json_pretty())
        .context("Failed to render manifest")?;

    match &synth.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write manifest to {}", path.display()))?;
            info!("📝 Manifest written to {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}
