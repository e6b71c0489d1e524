use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use chronicler::config::ReconcilerConfig;
use chronicler::domain::ImportType;
use chronicler::infra::geocoding::{GeocodeCache, HttpGeocoder};
use chronicler::logging::init_logging;
use chronicler::pipeline::import::{ImportPipeline, ImportReport};
use chronicler::pipeline::processing::dates::DateInterpreter;
use chronicler::pipeline::storage::InMemoryStore;

#[derive(Parser)]
#[command(name = "chronicler")]
#[command(about = "Fuzzy data reconciliation engine for historical records")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ImportKind {
    Persons,
    Events,
}

impl From<ImportKind> for ImportType {
    fn from(kind: ImportKind) -> Self {
        match kind {
            ImportKind::Persons => ImportType::Persons,
            ImportKind::Events => ImportType::Events,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a bulk import of persons or events from a JSON batch file
    Import {
        /// Path to the batch file (a JSON array of records)
        file: PathBuf,
        /// Kind of records in the batch
        #[arg(long, value_enum)]
        import_type: ImportKind,
        /// Optional batch file imported first to seed the existing-record store
        #[arg(long)]
        existing: Option<PathBuf>,
        /// Optional TOML file overriding similarity/detector thresholds
        #[arg(long)]
        config: Option<PathBuf>,
        /// Enrich accepted places via the external geocoding lookup
        #[arg(long)]
        geocode: bool,
    },
    /// Interpret a single human-entered date string
    CheckDate {
        /// The raw date text, e.g. "c. 1815" or "10.12.1815"
        date: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Import {
            file,
            import_type,
            existing,
            config,
            geocode,
        } => {
            let config = match config {
                Some(path) => ReconcilerConfig::from_file(&path)?,
                None => ReconcilerConfig::default(),
            };
            let import_type: ImportType = import_type.into();

            let store = Arc::new(InMemoryStore::new());
            let mut pipeline = ImportPipeline::new(store.clone(), &config);

            if geocode || config.geocoding.enabled {
                let cache = Arc::new(GeocodeCache::new());
                let geocoder = HttpGeocoder::new(&config.geocoding, cache)?;
                pipeline = pipeline.with_geocoder(Arc::new(geocoder));
            }

            if let Some(existing_file) = existing {
                info!("Seeding store from {}", existing_file.display());
                let seed_payload: serde_json::Value =
                    serde_json::from_str(&std::fs::read_to_string(&existing_file)?)?;
                let seed_report = pipeline.run(&seed_payload, import_type).await?;
                info!(
                    "Seed import finished: {} existing records loaded",
                    seed_report.batch.imported_count
                );
            }

            let payload: serde_json::Value =
                serde_json::from_str(&std::fs::read_to_string(&file)?)?;
            let report = pipeline.run(&payload, import_type).await?;
            print_report(import_type, &report);
        }
        Commands::CheckDate { date } => {
            let parsed = DateInterpreter::new().interpret(&date);
            println!("Raw text:    {:?}", parsed.raw_text);
            match parsed.resolved {
                Some(day) => println!("Resolved:    {day}"),
                None => println!("Resolved:    (none)"),
            }
            println!("Uncertainty: {:?}", parsed.uncertainty);
        }
    }

    Ok(())
}

fn print_report(import_type: ImportType, report: &ImportReport) {
    let batch = &report.batch;
    println!("\n📊 Import Results for {}:", import_type);
    println!("   Batch id: {}", batch.batch_id);
    println!("   Total:    {}", batch.total_records);
    println!("   Imported: {}", batch.imported_count);
    println!("   Skipped:  {}", batch.skipped_count);
    println!("   Errors:   {}", batch.error_count);
    println!("   Status:   {:?}", batch.status);
    println!("   Took:     {} ms", batch.processing_time_ms);

    for (index, matched) in report.skipped_matches() {
        println!(
            "   ~ record {} duplicates {} (confidence {:.2}; {})",
            index, matched.existing_id, matched.confidence, matched.reason
        );
    }
    for error in &batch.error_details {
        println!("   ! record {}: {}", error.index, error.message);
    }
}
