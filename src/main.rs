use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use vietrx_lib::config::{self, AppConfig};
use vietrx_lib::models::TextFragment;
use vietrx_lib::pipeline::advice::AdvicePipeline;
use vietrx_lib::pipeline::linking::DrugDatabase;
use vietrx_lib::scan::ScanService;

#[derive(Parser)]
#[command(name = "vietrx")]
#[command(about = "Identify a medication from label text and give vetted advice", version)]
struct Cli {
    /// Drug database file (overrides VIETRX_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct FragmentInput {
    /// Label text fragment, repeat once per OCR box
    #[arg(long = "text", value_name = "TEXT")]
    texts: Vec<String>,

    /// JSON file holding a list of {"text": ...} fragments
    #[arg(long, value_name = "FILE")]
    fragments: Option<PathBuf>,
}

impl FragmentInput {
    fn load(self) -> anyhow::Result<Vec<TextFragment>> {
        match self.fragments {
            Some(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading fragments from {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("parsing fragments in {}", path.display()))
            }
            None => Ok(self.texts.into_iter().map(TextFragment::new).collect()),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Link fragments to a database record and extract label attributes
    Analyze {
        #[command(flatten)]
        input: FragmentInput,
    },
    /// Analyze, then generate and audit advice
    Advise {
        #[command(flatten)]
        input: FragmentInput,
        /// Confirmed drug name, replaces the suggestion in the advice context
        #[arg(long)]
        name: Option<String>,
        /// Print speech-ready text with markup removed
        #[arg(long)]
        speech: bool,
    },
    /// Show database location and record count
    DbInfo,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut app_config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(db) = cli.db {
        app_config.database_path = db;
    }

    vietrx_lib::init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let database = DrugDatabase::load(&app_config.database_path)
        .with_context(|| format!("loading {}", app_config.database_path.display()))?;

    match cli.command {
        Commands::Analyze { input } => {
            let fragments = input.load()?;
            let result = vietrx_lib::pipeline::linking::analyze_metadata(&fragments, &database);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Advise { input, name, speech } => {
            let fragments = input.load()?;
            let endpoint = app_config
                .build_endpoint()
                .context("cannot create model client")?;
            let pipeline = AdvicePipeline::new(endpoint, app_config.language);
            let service = ScanService::new(Arc::new(database), pipeline);

            let result = service.analyze(&fragments);
            let outcome = service.advise(&result, name.as_deref());
            tracing::info!(stage = ?outcome.stage, "Advice ready");

            if speech {
                println!("{}", outcome.speech_text());
            } else {
                println!("{}", outcome.text);
            }
        }
        Commands::DbInfo => {
            println!("Database: {}", app_config.database_path.display());
            println!("Records: {}", database.len());
        }
    }

    Ok(())
}
