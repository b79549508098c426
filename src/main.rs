//! SyntheSmart CLI - AI powered content summarisation
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::path::{Path, PathBuf};
use synthesmart::source::Source;
use synthesmart::youtube::{fetch_video_details, YouTubeClient};
use synthesmart::{
    export, logging, ui, validate_url, Config, ContentAcquirer, Pipeline, PipelineError,
    SummaryResult,
};
use tracing::warn;

#[derive(Parser)]
#[command(name = "synthesmart")]
#[command(author, version, about = "AI powered summaries of YouTube videos and web pages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    /// Path to a config file (defaults to synthesmart.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarise a YouTube video or web page by URL
    Summarise {
        /// URL to summarise
        url: String,
        /// Show raw extracted text instead of summary
        #[arg(long)]
        raw: bool,
        /// Where to write the summary (defaults to the configured output path)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Do not write the summary to a file
        #[arg(long)]
        no_save: bool,
    },
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    logging::init_logger(cli.verbose, atty::is(atty::Stream::Stderr));

    match cli.command {
        Some(Commands::Completions { shell }) => {
            generate(shell, &mut Cli::command(), "synthesmart", &mut std::io::stdout());
        }
        Some(Commands::Summarise {
            url,
            raw,
            output,
            no_save,
        }) => {
            let config = load_config(cli.config.as_deref())?;

            if raw {
                // Just show raw extracted text
                let url = validate_url(&url)?;
                let acquirer = ContentAcquirer::from_config(&config.fetch)?;
                let documents = acquirer.acquire(&url).await?;
                ui::print_documents(&documents);
            } else {
                let pipeline = Pipeline::from_config(&config)?;
                let path = output.unwrap_or_else(|| config.output_path());
                let save_to = (!no_save).then_some(path.as_path());
                summarise(&pipeline, &config, &url, save_to).await?;
            }
        }
        None => {
            if !atty::is(atty::Stream::Stdin) {
                Cli::command().print_help()?;
                return Ok(());
            }

            let config = load_config(cli.config.as_deref())?;
            let pipeline = Pipeline::from_config(&config)?;
            let path = config.output_path();

            // Keep accepting URLs; a failed request does not end the session
            while let Some(url) = ui::prompt_url()? {
                if let Err(err) = summarise(&pipeline, &config, &url, Some(&path)).await {
                    ui::print_error(&err);
                }
                println!();
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

/// Run the pipeline for one URL, show the result and optionally save it
async fn summarise(
    pipeline: &Pipeline,
    config: &Config,
    url: &str,
    save_to: Option<&Path>,
) -> Result<SummaryResult, PipelineError> {
    let result = pipeline.run_with_progress(url, ui::print_stage).await?;
    println!();

    if let Ok(parsed) = url::Url::parse(&result.url) {
        if let Source::Video(video) = Source::classify(&parsed) {
            let details = match YouTubeClient::new(&config.fetch) {
                Ok(client) => {
                    let length = result.metadata.get("length").map(String::as_str);
                    fetch_video_details(&client, &video, length).await
                }
                Err(err) => {
                    warn!(error = %err, "could not create video client");
                    None
                }
            };
            match details {
                Some(details) => ui::print_video_details(&details),
                None => ui::print_warning("Could not load video details, but transcript is available."),
            }
        }
    }

    ui::print_summary(&result);

    if let Some(path) = save_to {
        match export::write_summary(&result, path) {
            Ok(()) => ui::print_success(&format!("📥 Summary saved to {}", path.display())),
            Err(err) => {
                warn!(error = %err, path = %path.display(), "failed to write summary");
                ui::print_warning(&format!("Could not save summary to {}: {}", path.display(), err));
            }
        }
    }

    Ok(result)
}
