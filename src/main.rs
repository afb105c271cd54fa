use anyhow::Context;
use clap::Parser;
use wiki_infoboxes::core::pipeline::inspect_page;
use wiki_infoboxes::core::ConfigProvider;
use wiki_infoboxes::utils::{logger, validation::Validate};
use wiki_infoboxes::{
    CliConfig, Command, EtlEngine, HarvestConfig, InfoboxPipeline, LocalStorage, MediaWikiClient,
    RunMode, SnapshotStore,
};

fn load_config(cli: &CliConfig) -> wiki_infoboxes::Result<HarvestConfig> {
    let config = cli.resolve()?;
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting wiki-infoboxes");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    let client = MediaWikiClient::new(&config).context("building the HTTP client")?;

    let mode = match cli.command() {
        Command::Inspect { page } => {
            let Some(parsed) = inspect_page(&client, &page).await else {
                eprintln!("❌ Could not fetch page '{}' from {}", page, client.endpoint());
                std::process::exit(2);
            };
            let json =
                serde_json::to_string_pretty(&parsed).context("serializing the parsed page")?;
            println!("{}", json);
            return Ok(());
        }
        Command::Update => RunMode::Update,
        Command::Redownload => RunMode::Redownload,
        Command::Reparse => RunMode::Reparse,
    };

    let storage = LocalStorage::new(config.data_dir().to_string());
    let store = SnapshotStore::new(
        storage,
        config.raw_folder(),
        config.parsed_folder(),
        config.archive_folder(),
    );

    for target in config.templates() {
        tracing::info!("📥 Processing {} ({})", target.kind, target.title);

        let pipeline = InfoboxPipeline::new(target.clone(), &store, &client, mode);
        let engine = EtlEngine::new(pipeline);

        match engine.run().await {
            Ok(output_path) => {
                tracing::info!("✅ {} done, parsed data in {}", target.kind, output_path);
            }
            Err(e) => {
                tracing::error!("❌ {} run failed: {}", target.kind, e);
                eprintln!("❌ {}", e.user_friendly_message());
                eprintln!("💡 {}", e.recovery_suggestion());
                std::process::exit(2);
            }
        }
    }

    Ok(())
}
