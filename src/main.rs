//! wordswap 命令行入口

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::error;

use wordswap::core::{open_http_proxy, Proxy, ProxyError, ProxyOptions};
use wordswap::env::{generate_env_docs, init_tracing};
use wordswap::utils::url::parse_target_url;

/// Caching reverse proxy that rewrites words and links in a single website
#[derive(Parser)]
#[command(name = "wordswap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the page cache and dictionary files
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Cache freshness window in seconds
    #[arg(long, global = true)]
    ttl: Option<u64>,

    /// Upstream request timeout in seconds
    #[arg(short, long, global = true)]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the rewritten page
    Render {
        url: String,

        /// Proxy entry used in rewritten links
        #[arg(long)]
        proxy_entry: Option<String>,
    },

    /// Print the visible text, one text node per line
    Text { url: String },

    /// Print the ranked word review list
    Words { url: String },

    /// Hide a word from the review list
    Exclude { word: String },

    /// Show a previously excluded word again
    Unexclude { word: String },

    /// Inspect or clean the page cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Document the supported environment variables
    Env,
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Show entry counts and size
    Stats,
    /// Delete entries older than the freshness window
    Purge,
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Proxy(#[from] ProxyError),

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl CliError {
    /// 输入错误返回 2，其余失败返回 1
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Proxy(e) if e.status_code() == 400 => 2,
            _ => 1,
        }
    }
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match run(cli, &mut io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn options(cli: &Cli) -> ProxyOptions {
    let mut options = ProxyOptions::default();

    if let Some(dir) = &cli.data_dir {
        options.data_dir = dir.clone();
    }
    if let Some(ttl) = cli.ttl.filter(|ttl| *ttl > 0) {
        options.cache_ttl = Duration::from_secs(ttl);
    }
    if let Some(timeout) = cli.timeout.filter(|timeout| *timeout > 0) {
        options.fetch_timeout = Duration::from_secs(timeout);
    }

    options
}

fn run<W: Write>(cli: Cli, stdout: &mut W) -> Result<(), CliError> {
    if let Commands::Env = cli.command {
        write!(stdout, "{}", generate_env_docs())?;
        return Ok(());
    }

    let proxy: Proxy = open_http_proxy(options(&cli))?;

    match &cli.command {
        Commands::Render { url, proxy_entry } => {
            let url = parse_target_url(url)?;
            let entry = proxy_entry
                .clone()
                .unwrap_or_else(|| proxy.options().proxy_path.clone());
            let html = proxy.render_page(&url, &entry)?;
            stdout.write_all(&html)?;
        }
        Commands::Text { url } => {
            let url = parse_target_url(url)?;
            writeln!(stdout, "{}", proxy.page_text(&url)?)?;
        }
        Commands::Words { url } => {
            let url = parse_target_url(url)?;
            for row in proxy.review_words(&url)?.words {
                writeln!(
                    stdout,
                    "{}\t{}\t{}",
                    row.frequency,
                    row.word,
                    row.replacement.unwrap_or_default()
                )?;
            }
        }
        Commands::Exclude { word } => {
            proxy.exclude_word(word)?;
            writeln!(stdout, "excluded")?;
        }
        Commands::Unexclude { word } => {
            proxy.unexclude_word(word)?;
            writeln!(stdout, "unexcluded")?;
        }
        Commands::Cache { command } => match command {
            CacheCommands::Stats => {
                let stats = proxy.cache().stats().map_err(ProxyError::from)?;
                writeln!(stdout, "entries: {}", stats.entries)?;
                writeln!(stdout, "fresh: {}", stats.fresh)?;
                writeln!(stdout, "stale: {}", stats.stale)?;
                writeln!(stdout, "bytes: {}", stats.total_bytes)?;
            }
            CacheCommands::Purge => {
                let removed = proxy.cache().purge_stale().map_err(ProxyError::from)?;
                writeln!(stdout, "removed {} stale entries", removed)?;
            }
        },
        Commands::Env => {}
    }

    Ok(())
}
