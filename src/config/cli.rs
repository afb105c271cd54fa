use crate::config::toml_config::HarvestConfig;
use crate::domain::model::TemplateKind;
use crate::utils::error::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "wiki-infoboxes")]
#[command(about = "Harvest chemical identifiers from Wikipedia Chembox and Drugbox infoboxes")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the MediaWiki API endpoint
    #[arg(long)]
    pub api_endpoint: Option<String>,

    /// Override the directory holding raw, parsed and archived snapshots
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Only process these templates (chembox, drugbox)
    #[arg(long, value_delimiter = ',')]
    pub template: Vec<TemplateKind>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Download pages not seen before and refresh the parsed snapshots (default)
    Update,
    /// Download every page again, archiving the previous snapshots
    Redownload,
    /// Re-parse the stored raw snapshots without contacting the API
    Reparse,
    /// Fetch one page by title and print its parsed infoboxes
    Inspect {
        /// Page title, e.g. "Caffeine"
        page: String,
    },
}

impl CliConfig {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Update)
    }

    /// File configuration (or defaults) with command line overrides applied.
    pub fn resolve(&self) -> Result<HarvestConfig> {
        let mut config = match &self.config {
            Some(path) => HarvestConfig::from_file(path)?,
            None => HarvestConfig::default(),
        };

        if let Some(endpoint) = &self.api_endpoint {
            config.api.endpoint = endpoint.clone();
        }
        if let Some(data_dir) = &self.data_dir {
            config.storage.data_dir = data_dir.clone();
        }
        config.retain_templates(&self.template);

        Ok(config)
    }
}
