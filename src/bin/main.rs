use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tree_cache::config::{self, CONFIG_FILE_NAME, QuerySource, TreeCacheSettings};
use tree_cache::query::MatchRecord;
use tree_cache::{
    DocumentStore, ParseOrchestrator, StructuralQuery, TreeCacheError, TreeCacheResult,
    TreeSitterEngine,
};
use url::Url;

/// Parse Rust files through the incremental tree cache
#[derive(Parser)]
#[command(name = "tree-cache")]
#[command(version)]
#[command(about = "Parse Rust files through the incremental tree cache")]
struct Cli {
    /// Settings file (default: ./tree-cache.toml, then the user config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Maximum number of cached trees
    #[arg(long, global = true)]
    capacity: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the global declarations of each file
    Declarations {
        /// Print matches as JSON
        #[arg(long)]
        json: bool,

        /// Rust source files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(serde::Serialize)]
struct FileDeclarations {
    uri: String,
    declarations: Vec<MatchRecord>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> TreeCacheResult<()> {
    let mut settings = resolve_settings(cli.config.as_deref())?;
    if cli.capacity.is_some() {
        settings.capacity = cli.capacity;
    }

    match cli.command {
        Commands::Declarations { json, files } => declarations(&settings, json, &files).await,
    }
}

/// Explicit file wins; otherwise the project file overrides the user file.
fn resolve_settings(explicit: Option<&Path>) -> TreeCacheResult<TreeCacheSettings> {
    if let Some(path) = explicit {
        let mut settings = config::load_settings(path)?;
        resolve_query_path(&mut settings, path);
        return Ok(settings);
    }

    let user = match config::user_config_path() {
        Some(path) => config::load_optional_settings(&path)?.map(|mut settings| {
            resolve_query_path(&mut settings, &path);
            settings
        }),
        None => None,
    };
    let project_path = Path::new(CONFIG_FILE_NAME);
    let project = config::load_optional_settings(project_path)?;

    Ok(config::merge_settings(user, project).unwrap_or_default())
}

/// Pattern file paths are relative to the settings file that names them.
fn resolve_query_path(settings: &mut TreeCacheSettings, settings_path: &Path) {
    if let Some(QuerySource::Path { path }) = &mut settings.declarations
        && Path::new(path).is_relative()
        && let Some(dir) = settings_path.parent()
    {
        *path = dir.join(&*path).to_string_lossy().into_owned();
    }
}

async fn declarations(
    settings: &TreeCacheSettings,
    json: bool,
    files: &[PathBuf],
) -> TreeCacheResult<()> {
    let engine = TreeSitterEngine::rust()?;
    let query = match &settings.declarations {
        Some(source) => StructuralQuery::from_source(engine.language(), source)?,
        None => StructuralQuery::declarations(engine.language())?,
    };

    let store = Arc::new(DocumentStore::new());
    let orchestrator = ParseOrchestrator::new(engine, store.clone(), settings);

    let mut results = Vec::with_capacity(files.len());
    for file in files {
        let uri = file_uri(file)?;
        if store.get(&uri).is_some() {
            log::debug!(target: "tree_cache::cli", "Skipping repeated {}", uri);
            continue;
        }
        store.open(uri.clone(), 0, std::fs::read_to_string(file)?)?;

        let Some(text) = store.snapshot(&uri).map(|doc| doc.into_text()) else {
            continue;
        };
        let Some(tree) = orchestrator.get_tree_for_uri(&uri).await else {
            log::warn!(target: "tree_cache::cli", "No tree for {}", uri);
            continue;
        };

        let declarations = query
            .execute(tree.root_node(), &text)
            .iter()
            .map(|m| m.to_record())
            .collect();
        results.push(FileDeclarations {
            uri: uri.to_string(),
            declarations,
        });
    }

    if json {
        let output = serde_json::to_string_pretty(&results)
            .map_err(|e| TreeCacheError::internal(e.to_string()))?;
        println!("{}", output);
    } else {
        for file in &results {
            println!("{}", file.uri);
            for m in &file.declarations {
                println!(
                    "  {}:{}\t{}\t{}",
                    m.range.start.line + 1,
                    m.range.start.column + 1,
                    m.capture,
                    m.text
                );
            }
        }
    }

    let stats = orchestrator.stats();
    log::info!(
        target: "tree_cache::cli",
        "Parsed {} files ({} fresh, {} failed)",
        results.len(),
        stats.fresh_parses,
        stats.failures
    );
    Ok(())
}

fn file_uri(path: &Path) -> TreeCacheResult<Url> {
    let absolute = std::path::absolute(path)?;
    Url::from_file_path(&absolute).map_err(|_| {
        TreeCacheError::internal(format!("Not a file path: {}", absolute.display()))
    })
}
