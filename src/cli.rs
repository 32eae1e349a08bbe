use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crypto_agent::agent::{CryptoAgent, is_exit_command, replies};
use crypto_agent::config::{Config, load_config};
use crypto_agent::pricing::{CoinGeckoSource, PriceFetcher};
use crypto_agent::providers::OpenAiCompatibleProvider;

#[derive(Parser)]
#[command(name = "crypto-agent")]
#[command(about = "crypto-agent - cryptocurrency price assistant")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Model to use instead of the configured one
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Path to a JSON config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive conversation (default)
    Chat,
    /// Send a single message and print the reply
    Ask {
        /// The message to send
        message: String,
    },
    /// Display version information
    Version,
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Version => {
            print_version();
            Ok(())
        }
        Commands::Ask { message } => {
            let mut agent = build_agent(cli.model, cli.config)?;
            let reply = agent.process_message(&message).await;
            println!("{}", reply);
            Ok(())
        }
        Commands::Chat => {
            let agent = build_agent(cli.model, cli.config)?;
            run_repl(agent).await
        }
    }
}

fn print_version() {
    println!("crypto-agent {}", env!("CARGO_PKG_VERSION"));
}

/// Loads configuration and wires the provider, price source and agent
fn build_agent(model: Option<String>, config_path: Option<PathBuf>) -> Result<CryptoAgent> {
    let config = load_config(model, config_path).context("Failed to load configuration")?;

    config.validate().context("Invalid configuration")?;

    let summary = config.get_safe_summary();
    tracing::info!(
        model = %summary.model,
        llm_base_url = %summary.llm_base_url,
        pricing_url = %summary.pricing_url,
        "Configuration loaded"
    );

    let provider = OpenAiCompatibleProvider::from_config(&config.llm_config()?)
        .context("Failed to create LLM provider")?;
    let fetcher = build_fetcher(&config)?;

    Ok(CryptoAgent::new(Arc::new(provider), config.model.clone(), fetcher))
}

fn build_fetcher(config: &Config) -> Result<PriceFetcher> {
    let source = CoinGeckoSource::new(&config.pricing_url, config.request_timeout())
        .context("Failed to create pricing client")?;

    Ok(PriceFetcher::with_limits(
        Box::new(source),
        config.cache_ttl(),
        config.rate_limit_max_calls,
        config.rate_limit_window(),
    ))
}

async fn run_repl(agent: CryptoAgent) -> Result<()> {
    run_session(
        agent,
        BufReader::new(tokio::io::stdin()),
        std::io::stdout(),
        tokio::signal::ctrl_c(),
    )
    .await
}

/// Reads lines until `exit`/`quit`, end of input or `shutdown` resolves
///
/// `shutdown` is polled while waiting for input and while a turn is in
/// flight, so an interrupt abandons a stalled LLM or pricing call.
async fn run_session<R, W, S>(mut agent: CryptoAgent, reader: R, mut out: W, shutdown: S) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    S: Future,
{
    tokio::pin!(shutdown);

    writeln!(out, "{}", replies::GREETING)?;
    writeln!(out, "{}", replies::EXIT_HINT)?;

    let mut lines = reader.lines();

    loop {
        write!(out, "You: ")?;
        out.flush().context("Failed to flush stdout")?;

        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read from stdin")?,
            _ = &mut shutdown => {
                writeln!(out)?;
                None
            }
        };

        let Some(line) = line else {
            break;
        };
        let input = line.trim();

        if input.is_empty() {
            continue;
        }
        if is_exit_command(input) {
            break;
        }

        let reply = tokio::select! {
            reply = agent.process_message(input) => reply,
            _ = &mut shutdown => {
                tracing::info!("Interrupted during a turn");
                writeln!(out)?;
                break;
            }
        };
        writeln!(out, "Assistant: {}", reply)?;
    }

    agent.finish();
    writeln!(out, "{}", replies::GOODBYE)?;
    out.flush()?;
    Ok(())
}
