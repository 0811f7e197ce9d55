use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nutrition_core::ai::prompts::load_instruction;
use nutrition_core::image::sniff_mime_type;
use nutrition_core::{
    create_client_from_env, AnalysisError, MealAnalyzer, QueryCounter, SessionConfig,
    UploadedImage,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "nutrition")]
#[command(about = "Meal photo nutrition analyzer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one or more meal photos, sharing a single query budget
    Analyze {
        /// JPEG or PNG images to analyze, in order
        #[arg(long = "image", required = true, num_args = 1..)]
        images: Vec<PathBuf>,
        /// Queries allowed for this run (default: NUTRITION_QUERY_LIMIT or 5)
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Print the instruction sent along with every image
    Prompt,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { images, limit } => {
            analyze(&images, limit).await?;
        }
        Commands::Prompt => {
            let prompt_file = std::env::var_os("NUTRITION_PROMPT_FILE").map(PathBuf::from);
            println!("{}", load_instruction(prompt_file.as_deref())?);
        }
    }

    Ok(())
}

fn load_image(path: &Path) -> Result<UploadedImage> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mime_type = sniff_mime_type(&data).unwrap_or("application/octet-stream");
    Ok(UploadedImage::new(data, mime_type))
}

async fn analyze(images: &[PathBuf], limit: Option<u32>) -> Result<()> {
    let (client, ai_config) =
        create_client_from_env().context("Failed to configure inference client")?;
    let limit = match limit {
        Some(limit) => limit,
        None => SessionConfig::from_env()?.query_limit,
    };

    let analyzer = MealAnalyzer::from_config(client, &ai_config);
    let counter = QueryCounter::new(limit);

    for path in images {
        let image = load_image(path)?;

        match analyzer.analyze(&counter, Some(&image)).await {
            Ok(response) => {
                println!("== {} ({})", path.display(), response.model);
                println!("{}", response.text);
                println!();
            }
            Err(e @ AnalysisError::LimitReached { .. }) => {
                eprintln!("warning: {}", e);
                break;
            }
            Err(e) if e.is_warning() => {
                eprintln!("warning: {}: {}", path.display(), e);
            }
            Err(e) => {
                eprintln!("error: {}: {}", path.display(), e);
            }
        }
    }

    eprintln!("{} of {} queries used", counter.count(), counter.limit());

    Ok(())
}
