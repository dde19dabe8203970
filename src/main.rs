use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use blotter::{
    load_source, render_text, run_pipeline, write_article, ClientConfig, PipelineConfig, Provider,
    RunReport, StyleRegistry,
};

#[derive(Parser)]
#[command(name = "blotter")]
#[command(author, version, about = "Police report to outlet-styled short news articles", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write, judge and optionally revise one article per outlet
    Generate {
        /// Police report text file ('-' reads stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// URL of the original report, used for attribution
        #[arg(long)]
        source_url: Option<String>,

        /// Generation service
        #[arg(long, value_enum, default_value = "anthropic")]
        provider: Provider,

        /// Override the API base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Writer model (defaults per provider)
        #[arg(long, env = "ARTICLE_MODEL")]
        writer_model: Option<String>,

        /// Judge model (defaults per provider)
        #[arg(long, env = "JUDGE_MODEL")]
        judge_model: Option<String>,

        /// Skip the single revision round
        #[arg(long)]
        no_revise: bool,

        /// Only run these outlets (repeatable)
        #[arg(long = "outlet")]
        outlets: Vec<String>,

        /// Style profile registry JSON replacing the built-in outlets
        #[arg(long)]
        profiles: Option<PathBuf>,

        /// Directory for article JSON documents
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Write a JSON run report
        #[arg(long)]
        report: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the active style profiles as JSON
    Profiles {
        /// Style profile registry JSON replacing the built-in outlets
        #[arg(long)]
        profiles: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            input,
            source_url,
            provider,
            base_url,
            writer_model,
            judge_model,
            no_revise,
            outlets,
            profiles,
            output_dir,
            report,
            verbose,
        } => {
            setup_logging(verbose);
            let writer_model =
                writer_model.unwrap_or_else(|| provider.default_writer_model().to_string());
            let judge_model =
                judge_model.unwrap_or_else(|| provider.default_judge_model().to_string());
            let config = PipelineConfig::new(writer_model, judge_model).with_revision(!no_revise);

            let mut client = ClientConfig::from_env(provider)?;
            client.base_url = base_url;

            let registry = load_registry(profiles.as_deref(), &outlets)?;

            generate(
                input,
                source_url,
                client,
                config,
                registry,
                output_dir,
                report,
            )
            .await
        }
        Commands::Profiles { profiles } => {
            let registry = load_registry(profiles.as_deref(), &[])?;
            println!("{}", serde_json::to_string_pretty(&registry)?);
            Ok(())
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_registry(path: Option<&std::path::Path>, outlets: &[String]) -> Result<StyleRegistry> {
    let registry = match path {
        Some(path) => StyleRegistry::from_json_file(path)
            .with_context(|| format!("Failed to load style profiles from {:?}", path))?,
        None => StyleRegistry::builtin(),
    };
    if outlets.is_empty() {
        return Ok(registry);
    }
    Ok(registry.select(outlets)?)
}

async fn generate(
    input: PathBuf,
    source_url: Option<String>,
    client: ClientConfig,
    config: PipelineConfig,
    registry: StyleRegistry,
    output_dir: Option<PathBuf>,
    report_path: Option<PathBuf>,
) -> Result<()> {
    info!("Loading police report from {:?}", input);
    let source = load_source(&input, source_url).context("Failed to read police report")?;

    info!(
        "Writer model {}, judge model {}, revision {}",
        config.writer.model,
        config.judge.model,
        if config.revise { "on" } else { "off" }
    );

    let generator = client.into_generator();
    let report = run_pipeline(generator.as_ref(), &config, &registry, &source).await;

    for entry in &report.outlets {
        match &entry.result {
            Ok(done) => {
                if let Some(outlet) = registry.get(&entry.outlet) {
                    println!("{}", render_text(&outlet.profile, &done.article, &done.verdict));
                }
                if let Some(dir) = &output_dir {
                    let path = write_article(dir, &done.article)
                        .with_context(|| format!("Failed to write article for {}", entry.outlet))?;
                    info!("Article written to {:?}", path);
                }
            }
            Err(e) => println!("== {} ==\n\nError: {}\n", entry.outlet, e),
        }
    }

    if let Some(path) = report_path {
        RunReport::from_pipeline(&report, &config.writer.model, &config.judge.model)
            .write_json(&path)
            .context("Failed to write run report")?;
        info!("Run report written to {:?}", path);
    }

    info!(
        "Complete: {} of {} outlets succeeded",
        report.succeeded(),
        report.outlets.len()
    );

    if report.succeeded() == 0 {
        anyhow::bail!("all outlets failed");
    }
    Ok(())
}
