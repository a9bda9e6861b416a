//! vettest CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "vettest", version, about = "Personnel evaluation scoring engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create starter config and example catalog
    Init,

    /// Validate catalog files
    Validate {
        /// Path to a catalog file (.toml/.json) or directory
        #[arg(long)]
        catalog: PathBuf,
    },

    /// Draw a seeded catalog from a question bank
    Sample {
        /// Question bank file
        #[arg(long)]
        bank: PathBuf,

        /// Sampling seed (random if omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Write the sampled catalog here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Score a completed evaluation
    Score {
        /// Catalog the respondent answered
        #[arg(long)]
        catalog: PathBuf,

        /// Answers file (JSON or TOML map of locator to answer)
        #[arg(long)]
        answers: PathBuf,

        /// Respondent name
        #[arg(long, default_value = "anonymous")]
        name: String,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,

        /// Also write the report as JSON to this path
        #[arg(long)]
        output: Option<PathBuf>,

        /// Persist the result through the configured store
        #[arg(long)]
        save: bool,

        /// Exit code 2 if the verdict is a fail
        #[arg(long)]
        fail_on_reject: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show persisted evaluations
    History {
        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "vettest=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { catalog } => commands::validate::execute(catalog),
        Commands::Sample {
            bank,
            seed,
            output,
            config,
        } => commands::sample::execute(bank, seed, output, config),
        Commands::Score {
            catalog,
            answers,
            name,
            format,
            output,
            save,
            fail_on_reject,
            config,
        } => {
            commands::score::execute(commands::score::ScoreArgs {
                catalog,
                answers,
                name,
                format,
                output,
                save,
                fail_on_reject,
                config,
            })
            .await
        }
        Commands::History { format, config } => commands::history::execute(format, config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
