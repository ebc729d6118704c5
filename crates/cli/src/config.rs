//! Command-line surface: `clap::Parser` arguments and `RingConfig` loading.

use clap::Parser;
use std::io::Read;
use std::path::PathBuf;

/// Drive a simulated Chord ring from a command script.
#[derive(Parser, Debug)]
#[command(name = "chord", version, about)]
pub struct CliConfig {
    /// Path to a newline-delimited command script; reads stdin if omitted.
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// JSON file overriding the default `RingConfig` (successor_list_len,
    /// tick periods, rpc_timeout). Falls back to `RingConfig::default`.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl CliConfig {
    pub fn load_ring_config(&self) -> anyhow::Result<corelib::RingConfig> {
        match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                Ok(serde_json::from_str(&text)?)
            }
            None => Ok(corelib::RingConfig::default()),
        }
    }

    pub fn read_script(&self) -> anyhow::Result<String> {
        match &self.script {
            Some(path) => Ok(std::fs::read_to_string(path)?),
            None => {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                Ok(buf)
            }
        }
    }
}
