use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use docsearch_core::config::{expand_path, Config, Settings};
use docsearch_core::data_processor::list_ingest_files;
use docsearch_core::types::{CategoriesResponse, NameCount, SearchResponse};
use docsearch_embed::TieredEmbedder;
use docsearch_hybrid::{DocumentService, SearchRequest, UploadRequest, UploadedFile};
use docsearch_vector::MemoryStore;

const DEFAULT_STORE: &str = ".docsearch/documents.json";
const INGEST_CONCURRENCY: usize = 4;

#[derive(Debug, Parser)]
#[command(name = "docsearch", about = "Index documents and search them by meaning and keywords")]
struct Cli {
    /// Document snapshot file (overrides `store.path`)
    #[arg(long, global = true)]
    store: Option<String>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Index every supported file under a directory
    Ingest(IngestArgs),
    /// Hybrid search; without a query, list documents matching the filters
    Search(SearchArgs),
    /// Document counts per category, team and project
    Categories {
        #[arg(long)]
        json: bool,
    },
    /// Print one document
    Show { id: String },
    /// Print the stored file's path and content type
    File { id: String },
    /// Soft-delete a document
    Delete { id: String },
}

#[derive(Debug, Args)]
struct IngestArgs {
    dir: PathBuf,
    #[arg(long)]
    team: Option<String>,
    #[arg(long)]
    project: Option<String>,
    /// Skip auto-categorization
    #[arg(long)]
    category: Option<String>,
}

#[derive(Debug, Args)]
struct SearchArgs {
    query: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    team: Option<String>,
    #[arg(long)]
    project: Option<String>,
    #[arg(short, long)]
    limit: Option<usize>,
    #[arg(long)]
    json: bool,
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(filter) = EnvFilter::try_from_default_env() {
        filter
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn build_service(settings: &Settings, store_override: Option<&str>) -> anyhow::Result<DocumentService> {
    let store_path = store_override
        .map(str::to_string)
        .or_else(|| settings.store.path.clone())
        .unwrap_or_else(|| DEFAULT_STORE.to_string());
    let store = Arc::new(MemoryStore::open(expand_path(&store_path)).with_context(|| format!("opening store {}", store_path))?);
    let embedder = TieredEmbedder::from_settings(&settings.embedding);
    info!(tiers = ?embedder.tier_names(), store = %store_path, "service ready");
    Ok(DocumentService::new(store, Arc::new(embedder), &settings.search))
}

fn upload_request(path: &Path, args: &IngestArgs) -> anyhow::Result<UploadRequest> {
    let size = std::fs::metadata(path).with_context(|| format!("stat {}", path.display()))?.len();
    let original_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .with_context(|| format!("no file name in {}", path.display()))?;
    Ok(UploadRequest {
        file: UploadedFile { original_name, path: path.to_path_buf(), size },
        team: args.team.clone(),
        project: args.project.clone(),
        category: args.category.clone(),
    })
}

async fn ingest(service: &DocumentService, args: &IngestArgs) -> anyhow::Result<()> {
    let files = list_ingest_files(&args.dir);
    if files.is_empty() {
        warn!(dir = %args.dir.display(), "no supported files found");
        return Ok(());
    }
    info!(files = files.len(), dir = %args.dir.display(), "ingesting");
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );

    let mut uploads = stream::iter(files)
        .map(|path| async move {
            let outcome = match upload_request(&path, args) {
                Ok(req) => service.upload(req).await.map_err(anyhow::Error::from),
                Err(e) => Err(e),
            };
            (path, outcome)
        })
        .buffer_unordered(INGEST_CONCURRENCY);

    let (mut indexed, mut skipped) = (0usize, 0usize);
    while let Some((path, outcome)) = uploads.next().await {
        match outcome {
            Ok(summary) => {
                indexed += 1;
                pb.set_message(format!("{} -> {}", summary.title, summary.category));
            }
            Err(e) => {
                skipped += 1;
                pb.suspend(|| warn!(file = %path.display(), error = %e, "skipped"));
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");
    println!("Indexed {} file(s), skipped {}", indexed, skipped);
    Ok(())
}

fn print_results(resp: &SearchResponse) {
    if !resp.query.is_empty() { println!("query: {}", resp.query); }
    if resp.results.is_empty() {
        println!("no results");
        return;
    }
    for (i, r) in resp.results.iter().enumerate() {
        println!(
            "{:>2}. {:.3} {:<8} {}  [{} | {} | {}]  id={}",
            i + 1,
            r.similarity,
            r.match_type,
            r.title,
            r.category,
            r.team,
            r.project,
            r.id
        );
        println!("    {}", r.preview);
    }
    println!("{} result(s)", resp.total);
}

fn print_counts(title: &str, counts: &[NameCount]) {
    println!("{}:", title);
    for c in counts { println!("  {:<16} {}", c.name, c.count); }
}

fn print_categories(cats: &CategoriesResponse) {
    print_counts("categories", &cats.categories);
    print_counts("teams", &cats.teams);
    print_counts("projects", &cats.projects);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let settings = Config::load()?.settings()?;
    let service = build_service(&settings, cli.store.as_deref())?;

    match cli.command {
        Command::Ingest(args) => ingest(&service, &args).await?,
        Command::Search(args) => {
            let req = SearchRequest {
                query: args.query,
                category: args.category,
                team: args.team,
                project: args.project,
                limit: args.limit,
            };
            let resp = service.search(req).await?;
            if args.json { println!("{}", serde_json::to_string_pretty(&resp)?); } else { print_results(&resp); }
            service.flush_pending().await;
        }
        Command::Categories { json } => {
            let cats = service.get_categories().await?;
            if json { println!("{}", serde_json::to_string_pretty(&cats)?); } else { print_categories(&cats); }
        }
        Command::Show { id } => {
            let doc = service.get_document(&id).await?;
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        Command::File { id } => {
            let file = service.file(&id).await?;
            println!("{}\t{}\t{} bytes", file.path.display(), file.content_type, file.size);
        }
        Command::Delete { id } => {
            service.delete_document(&id).await?;
            println!("Deactivated {}", id);
        }
    }
    Ok(())
}
