//! CLI command definitions for prompt-golf.
//!
//! Authoring and operator commands: validate a single challenge document,
//! list the catalog with filters, and show which categories it covers.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use crate::challenge::{ChallengeCategory, ChallengeLoader};
use crate::error::ChallengeError;
use crate::registry::{ChallengeFilters, ChallengeRegistry};

/// Default challenge source directory.
const DEFAULT_CHALLENGE_DIR: &str = "./challenges";

/// Prompt-engineering training core: challenge validation and catalog tools.
#[derive(Parser)]
#[command(name = "prompt-golf")]
#[command(about = "Challenge catalog tooling for the Prompt Golf training core")]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Validate a single challenge YAML document.
    Validate(ValidateArgs),

    /// List the challenge catalog, optionally filtered.
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show the categories covered by the catalog.
    Categories(CategoriesArgs),
}

/// Arguments for `prompt-golf validate`.
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the challenge YAML file.
    pub file: PathBuf,
}

/// Arguments for `prompt-golf list`.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Challenge source directory.
    #[arg(short, long, default_value = DEFAULT_CHALLENGE_DIR)]
    pub dir: PathBuf,

    /// Only challenges in this category (e.g. summarization, meta-prompting).
    #[arg(short, long)]
    pub category: Option<String>,

    /// Only challenges at this difficulty (1-5).
    #[arg(long)]
    pub difficulty: Option<u8>,

    /// Comma-separated tags; a challenge matches if it carries any of them.
    #[arg(short, long)]
    pub tags: Option<String>,
}

/// Arguments for `prompt-golf categories`.
#[derive(Parser, Debug)]
pub struct CategoriesArgs {
    /// Challenge source directory.
    #[arg(short, long, default_value = DEFAULT_CHALLENGE_DIR)]
    pub dir: PathBuf,
}

/// Parse CLI arguments without running anything.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with pre-parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Validate(args) => run_validate_command(args),
        Commands::List(args) => run_list_command(args).await,
        Commands::Categories(args) => run_categories_command(args).await,
    }
}

fn run_validate_command(args: ValidateArgs) -> anyhow::Result<()> {
    let mut loader = ChallengeLoader::new();
    match loader.load_file(&args.file) {
        Ok(challenge) => {
            println!(
                "OK: {} v{} ({} dimensions, max score {})",
                challenge.id,
                challenge.version,
                challenge.scoring.dimensions.len(),
                challenge.scoring.max_score
            );
            Ok(())
        }
        Err(ChallengeError::Parse { path, message }) => {
            anyhow::bail!("{} is not valid YAML: {}", path, message)
        }
        Err(ChallengeError::Schema(violations)) => {
            eprintln!("Schema violations in {}:", args.file.display());
            for violation in &violations.0 {
                eprintln!("  - {}", violation);
            }
            anyhow::bail!("{} violation(s)", violations.0.len())
        }
        Err(e) => Err(e.into()),
    }
}

async fn run_list_command(args: ListArgs) -> anyhow::Result<()> {
    let filters = build_filters(&args)?;

    let registry = ChallengeRegistry::new(&args.dir);
    registry.initialize().await?;
    info!(count = registry.len(), "Catalog loaded");

    let summaries = registry.summaries(&filters);
    if summaries.is_empty() {
        println!("No challenges match.");
        return Ok(());
    }

    for summary in &summaries {
        println!(
            "{:<24} d{} {:<16} {}",
            summary.id,
            summary.metadata.difficulty,
            summary.metadata.category.to_string(),
            summary.metadata.title
        );
    }
    println!("{} challenge(s)", summaries.len());
    Ok(())
}

async fn run_categories_command(args: CategoriesArgs) -> anyhow::Result<()> {
    let registry = ChallengeRegistry::new(&args.dir);
    registry.initialize().await?;

    for category in registry.get_categories() {
        let count = registry
            .get_all(&ChallengeFilters {
                category: Some(category),
                ..Default::default()
            })
            .len();
        println!("{:<16} {}", category.to_string(), count);
    }
    Ok(())
}

fn build_filters(args: &ListArgs) -> anyhow::Result<ChallengeFilters> {
    let category = match &args.category {
        Some(raw) => Some(
            ChallengeCategory::from_str_opt(raw)
                .ok_or_else(|| anyhow::anyhow!("unknown category '{}'", raw))?,
        ),
        None => None,
    };

    if let Some(difficulty) = args.difficulty {
        if !(1..=5).contains(&difficulty) {
            anyhow::bail!("difficulty must be between 1 and 5");
        }
    }

    let tags = args.tags.as_ref().map(|raw| {
        raw.split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
    });

    Ok(ChallengeFilters {
        category,
        difficulty: args.difficulty,
        tags,
        tenant_id: None,
    })
}
