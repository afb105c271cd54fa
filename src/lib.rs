pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::{CliConfig, Command};
pub use crate::config::HarvestConfig;

pub use crate::adapters::{LocalStorage, MediaWikiClient};
pub use crate::core::{
    etl::EtlEngine,
    pipeline::{InfoboxPipeline, RunMode},
    snapshot::SnapshotStore,
};
pub use crate::domain::model::{Infobox, PageRecord, ParsedPageRecord, TemplateKind, TemplateTarget};
pub use crate::utils::error::{InfoboxError, Result};
