use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use tracing::{Level, debug, warn};
use tracing_subscriber::EnvFilter;

use ape_llm::{Config, GenerateOptions, LlmService, StreamEvent};

/// Chat completion client for standard and OpenRouter LLM backends
#[derive(Parser, Debug)]
#[command(name = "ape-llm")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the models config file (built-in models are used if missing)
    #[arg(short = 'c', long = "config", default_value = "config/models.yaml")]
    config: PathBuf,

    /// Model key to use instead of the configured default
    #[arg(short = 'm', long = "model")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List available models
    Models,

    /// Send a single prompt
    Chat {
        /// User prompt
        prompt: String,

        /// System prompt
        #[arg(short = 's', long = "system")]
        system: Option<String>,

        /// Print deltas as they arrive
        #[arg(long)]
        stream: bool,

        /// Sampling temperature (defaults to the model's)
        #[arg(long)]
        temperature: Option<f32>,

        /// Maximum tokens to generate (defaults to the model's)
        #[arg(long = "max-tokens")]
        max_tokens: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    report_dotenv(&dotenv);

    let cli = Cli::parse();

    let config = Config::load(&cli.config)
        .await
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let mut service = LlmService::from_config(config).context("initializing LLM service")?;

    if let Some(model) = cli.model.as_deref()
        && !service.change_model(model)
    {
        bail!("unknown model: {model}");
    }

    match cli.command {
        Commands::Models => list_models(&service),
        Commands::Chat {
            prompt,
            system,
            stream,
            temperature,
            max_tokens,
        } => {
            let mut messages = Vec::new();
            if let Some(system) = system {
                messages.push(LlmService::format_system_message(system));
            }
            messages.push(LlmService::format_user_message(prompt));

            let options = GenerateOptions {
                temperature,
                max_tokens,
            };
            if stream {
                chat_stream(&service, &messages, &options).await
            } else {
                chat(&service, &messages, &options).await
            }
        }
    }
}

/// Log the outcome of loading `.env`, returning the level it was logged at.
fn report_dotenv(result: &dotenvy::Result<PathBuf>) -> Level {
    match result {
        Ok(path) => {
            debug!(path = %path.display(), "Loaded environment file");
            Level::DEBUG
        }
        Err(e) if e.not_found() => {
            warn!(".env file not found, using process environment");
            Level::WARN
        }
        Err(e) => {
            warn!(error = %e, "Failed to load .env file");
            Level::WARN
        }
    }
}

fn list_models(service: &LlmService) -> Result<()> {
    for model in service.list_available_models() {
        let marker = if model.key == service.current_model() {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {:<20} {:<12} {:<36} {}",
            model.key, model.provider, model.id, model.name
        );
    }
    Ok(())
}

async fn chat(
    service: &LlmService,
    messages: &[ape_llm::Message],
    options: &GenerateOptions,
) -> Result<()> {
    match service.complete(messages, options).await {
        Ok(text) => {
            println!("{text}");
            Ok(())
        }
        Err(e) => bail!(e),
    }
}

async fn chat_stream(
    service: &LlmService,
    messages: &[ape_llm::Message],
    options: &GenerateOptions,
) -> Result<()> {
    let mut stream = service.stream(messages, options).await;
    let mut stdout = std::io::stdout();
    let mut failed = false;

    while let Some(event) = stream.next().await {
        match event {
            StreamEvent::Delta(text) => {
                write!(stdout, "{text}")?;
                stdout.flush()?;
            }
            StreamEvent::Error(text) => {
                eprintln!("{text}");
                failed = true;
            }
            StreamEvent::Done => break,
        }
    }
    println!();

    if failed {
        bail!("streaming generation failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_env_file_is_reported_as_warning() {
        let missing = dotenvy::Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no .env",
        ));
        assert_eq!(report_dotenv(&Err(missing)), Level::WARN);

        let malformed = dotenvy::Error::LineParse("=oops".to_string(), 0);
        assert_eq!(report_dotenv(&Err(malformed)), Level::WARN);
    }

    #[test]
    fn loaded_env_file_is_reported_at_debug() {
        assert_eq!(report_dotenv(&Ok(PathBuf::from(".env"))), Level::DEBUG);
    }
}
