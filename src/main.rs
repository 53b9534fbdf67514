//! DefectDojo persistence hook binary.

use clap::Parser;
use persistence_defectdojo::config::{log_filter, Cli, Command, HookConfig};
use persistence_defectdojo::{
    import_findings, read_findings_file, FindingStore, JsonFileStore, PersistenceError,
    UploadStore, APP_VERSION,
};

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter(cli.verbose).into()),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("persistence-defectdojo v{}", APP_VERSION);

    if let Err(e) = run(cli.command).await {
        match e.downcast_ref::<PersistenceError>() {
            Some(persistence) => {
                tracing::error!(error = %persistence, "persistence failed");
                eprintln!("error: {}", persistence.report());
            }
            None => eprintln!("error: {e:#}"),
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Import { findings, target } => {
            let store = open_store(&target).await?;
            let parsed = read_findings_file(&findings).await?;
            let count = import_findings(store.as_ref(), &target.scan, parsed).await?;
            println!("Stored {count} findings for scan '{}'", target.scan);
        }
        Command::Show { target } => {
            let store = open_store(&target).await?;
            let findings = store.load_findings(&target.scan).await?;
            println!("{}", serde_json::to_string_pretty(&findings)?);
        }
    }
    Ok(())
}

async fn open_store(target: &HookConfig) -> anyhow::Result<Box<dyn FindingStore>> {
    if let Some(upload_url) = &target.upload_url {
        tracing::info!("Upload URL: {}", upload_url);
        return Ok(Box::new(UploadStore::new(upload_url)?));
    }

    let data_dir = target.expanded_data_dir();
    tracing::info!("Data directory: {}", data_dir.display());
    Ok(Box::new(JsonFileStore::new(data_dir).await?))
}
