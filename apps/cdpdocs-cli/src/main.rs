//! cdpdocs - hybrid search over CDP documentation.
//!
//! ```bash
//! cdpdocs ingest docs.jsonl
//! cdpdocs query "how do I add a source" --platform segment
//! cdpdocs get segment 0
//! cdpdocs repl --platform lytics
//! cdpdocs stats
//! ```

mod output;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cdpdocs_core::cache::{MemoryCache, ResponseCache};
use cdpdocs_core::config::Config;
use cdpdocs_core::types::DocumentChunk;
use cdpdocs_hybrid::SearchService;

#[derive(Parser)]
#[command(name = "cdpdocs", version, about = "Hybrid semantic + keyword search over CDP documentation")]
struct Cli {
    /// Directory holding config.toml and config.<env>.toml
    #[arg(long, default_value = ".", env = "CDPDOCS_CONFIG_DIR")]
    config_dir: PathBuf,

    /// Overrides index.data_dir
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index a JSON-lines file of document chunks
    Ingest { file: PathBuf },
    /// Run one hybrid search
    Query {
        text: String,
        #[arg(short, long)]
        platform: String,
        /// Defaults to the configured top_k for the platform
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Fetch one stored chunk by id
    Get { platform: String, id: String },
    /// Interactive search session with cached answers
    Repl {
        #[arg(short, long)]
        platform: String,
    },
    /// Vector count and per-platform document counts
    Stats,
}

impl Command {
    /// Only ingest changes the vector index; everything else leaves the
    /// snapshot on disk untouched.
    fn writes_state(&self) -> bool {
        matches!(self, Command::Ingest { .. })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();

    let config = Config::load_from(&cli.config_dir).context("loading configuration")?;
    let mut settings = config.settings().context("reading settings")?;
    if let Some(dir) = &cli.data_dir {
        settings.index.data_dir = Some(dir.to_string_lossy().to_string());
    }
    let ttl = Duration::from_secs(settings.cache.ttl_secs);
    let cache_capacity = settings.cache.capacity;
    let service = Arc::new(SearchService::from_settings(settings).context("opening search service")?);

    let writes_state = cli.command.writes_state();
    match cli.command {
        Command::Ingest { file } => ingest(&service, &file).await?,
        Command::Query { text, platform, top_k, json } => {
            let top_k = top_k.unwrap_or_else(|| service.settings().search.top_k_for(&platform));
            let results = service.search_top_k(&text, &platform, top_k).await?;
            let rendered = if json { output::format_json(&text, &platform, &results) } else { output::format_human(&text, &results) };
            println!("{rendered}");
        }
        Command::Get { platform, id } => {
            let chunk = service.get_document(&platform, &id)?;
            println!("{}", serde_json::to_string_pretty(&chunk)?);
        }
        Command::Repl { platform } => repl(&service, &platform, MemoryCache::new(cache_capacity), ttl).await?,
        Command::Stats => print_stats(&service)?,
    }
    if writes_state {
        service.shutdown()?;
    }
    Ok(())
}

fn read_chunks(path: &Path) -> Result<Vec<DocumentChunk>> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| serde_json::from_str(line).with_context(|| format!("{}:{}: invalid document chunk", path.display(), n + 1)))
        .collect()
}

async fn ingest(service: &SearchService, path: &Path) -> Result<()> {
    let chunks = read_chunks(path)?;
    info!(file = %path.display(), chunks = chunks.len(), "ingesting");

    let pb = ProgressBar::new(chunks.len() as u64);
    pb.set_style(ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks {msg}")?.progress_chars("#>-"));

    let mut indexed = 0usize;
    for chunk in chunks {
        match service.index_document(chunk).await {
            Ok(_) => indexed += 1,
            Err(e) if e.is_config() => return Err(e.into()),
            Err(e) => {
                pb.suspend(|| warn!(error = %e, "skipping chunk"));
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");

    println!("Indexed {indexed} chunk(s); {} vector(s) total", service.vector_count());
    Ok(())
}

async fn repl(service: &SearchService, platform: &str, cache: MemoryCache, ttl: Duration) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Searching {platform} docs. /help for commands.");
    loop {
        print!("{platform}> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else { break };
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/help" => println!("Type a question, or /stats, /quit."),
            "/stats" => {
                print_stats(service)?;
                println!("cached answers: {}", cache.len());
            }
            question => {
                if let Some(answer) = cache.get_response(question, platform) {
                    println!("{answer}");
                    continue;
                }
                match service.search(question, platform).await {
                    Ok(results) => {
                        let answer = output::format_human(question, &results);
                        cache.store_response(question, platform, &answer, ttl);
                        println!("{answer}");
                    }
                    Err(e) => eprintln!("search failed: {e}"),
                }
            }
        }
    }
    Ok(())
}

fn print_stats(service: &SearchService) -> Result<()> {
    println!("vectors: {}", service.vector_count());
    for platform in service.store().platforms() {
        println!("  {platform}: {} document(s)", service.store().num_docs(&platform)?);
    }
    Ok(())
}
