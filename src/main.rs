use clap::{Args, Parser, Subcommand};
use docus_content::config::{self, EngineConfig};
use docus_content::hydration::HydrationSnapshot;
use docus_content::navigation::{self, NavigationBuilder};
use docus_content::{ContentProvider, DocumentStore, QueryParams, SortDirection, ingest, output};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docus-content")]
#[command(about = "Query and navigate a pre-built documentation content set")]
#[command(long_about = "\
Query and navigate a pre-built documentation content set

Documents are JSON produced by a content pipeline: either one file holding
an array of documents, or a directory with one document per *.json file.

Content structure:

  content/
  ├── 0.index.json                 # Home page (path \"/\")
  ├── 1.guide/
  │   ├── 0.index.json             # Describes the guide section
  │   ├── 1.installation.json
  │   └── 2.configuration.json
  └── .drafts/                     # Hidden entries are skipped

Queries run in a fixed order: path scope, --where filter, text ranking or
--sort, --surround, --skip/--limit, then --only/--without projection.

Run 'docus-content gen-config' to generate a documented docus.toml.")]
#[command(version)]
struct Cli {
    /// Content directory or JSON manifest file
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Engine config file (stock defaults when missing)
    #[arg(long, default_value = "docus.toml", global = true)]
    config: PathBuf,

    /// Log more (-v info, -vv debug, -vvv trace); RUST_LOG wins when unset
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest and validate the content source
    Check,
    /// Print one document by key
    Get {
        key: String,
    },
    /// Run a structural query
    Query(QueryArgs),
    /// Ranked full-text search
    Search(SearchArgs),
    /// Print the navigation tree
    Nav(NavArgs),
    /// Write a hydration snapshot of the content
    Snapshot {
        /// Destination file
        #[arg(long)]
        out: PathBuf,
    },
    /// Verify a hydration snapshot by loading it into a fresh store
    Load {
        file: PathBuf,
    },
    /// Print a stock docus.toml with all options documented
    GenConfig,
}

#[derive(Args)]
struct QueryArgs {
    /// Restrict to documents at or below this URL
    #[arg(long)]
    path: Option<String>,
    /// JSON match object, e.g. '{"draft": false}'
    #[arg(long = "where")]
    filter: Option<String>,
    /// Sort key as field[:asc|desc]; repeat for tie-breakers
    #[arg(long = "sort")]
    sort: Vec<String>,
    /// Keep only these fields (key and path always stay)
    #[arg(long)]
    only: Vec<String>,
    /// Drop these fields
    #[arg(long)]
    without: Vec<String>,
    #[arg(long)]
    skip: Option<i64>,
    /// 0 = no limit
    #[arg(long)]
    limit: Option<i64>,
    /// Return the neighbors of this slug or path instead of the matches
    #[arg(long)]
    surround: Option<String>,
    #[arg(long, default_value_t = 1)]
    before: i64,
    #[arg(long, default_value_t = 1)]
    after: i64,
    /// Print records as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SearchArgs {
    text: String,
    /// Also search body text
    #[arg(long)]
    deep: bool,
    #[arg(long)]
    limit: Option<usize>,
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct NavArgs {
    /// Show only the section containing this URL, with previous/next links
    #[arg(long)]
    scope: Option<String>,
    /// Only list documents in this language (default: locales.default_locale)
    #[arg(long)]
    language: Option<String>,
    /// List drafts as regular entries
    #[arg(long)]
    drafts: bool,
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("docus_content=warn")),
        1 => EnvFilter::new("docus_content=info"),
        2 => EnvFilter::new("docus_content=debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Check => {
            let config = config::load_config(&cli.config)?;
            let ingested = ingest::ingest(&cli.source, &config)?;
            output::print_ingest_output(&ingested, &cli.source);
        }
        Command::Get { key } => {
            let (store, _) = open_store(&cli.source, &cli.config)?;
            let document = store.get(&key)?;
            println!("{}", serde_json::to_string_pretty(document.as_ref())?);
        }
        Command::Query(args) => {
            let (store, _) = open_store(&cli.source, &cli.config)?;
            run_query(&store, &args)?;
        }
        Command::Search(args) => {
            let (store, _) = open_store(&cli.source, &cli.config)?;
            let records = store.search(
                &args.text,
                QueryParams {
                    deep: Some(args.deep),
                    limit: args.limit,
                    ..QueryParams::default()
                },
            )?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                output::print_records(&records);
            }
        }
        Command::Nav(args) => {
            let (store, config) = open_store(&cli.source, &cli.config)?;
            let language = config.locales.resolve(args.language.as_deref())?;
            let mut builder =
                NavigationBuilder::from_settings(&config.navigation).language(language);
            if args.drafts {
                builder = builder.include_drafts(true);
            }
            let documents = store.documents();
            let tree = builder.build(documents.iter().map(|d| d.as_ref()));
            let shown = match &args.scope {
                Some(to) => navigation::scope(&tree, to),
                None => tree.as_slice(),
            };
            if args.json {
                println!("{}", serde_json::to_string_pretty(shown)?);
            } else {
                output::print_navigation(shown);
                if let Some(to) = &args.scope {
                    let (prev, next) = navigation::surrounding(&tree, to);
                    println!();
                    output::print_surrounding(prev, next);
                }
            }
        }
        Command::Snapshot { out } => {
            let (store, _) = open_store(&cli.source, &cli.config)?;
            let snapshot = store.serialize();
            std::fs::write(&out, snapshot.to_json())?;
            println!(
                "Wrote {} documents to {}",
                snapshot.document_count(),
                out.display()
            );
        }
        Command::Load { file } => {
            let config = config::load_config(&cli.config)?;
            let snapshot = HydrationSnapshot::from_json(&std::fs::read_to_string(&file)?)?;
            let store = DocumentStore::from_config(&config);
            store.load(&snapshot)?;
            println!("Loaded {} documents from {}", store.len(), file.display());
        }
    }

    Ok(())
}

/// Load config, ingest the source and fill a store with the result.
fn open_store(
    source: &Path,
    config_path: &Path,
) -> Result<(DocumentStore, EngineConfig), Box<dyn std::error::Error>> {
    let config = config::load_config(config_path)?;
    let ingested = ingest::ingest(source, &config)?;
    let store = DocumentStore::from_config(&config);
    store.extend(ingested.documents);
    Ok((store, config))
}

fn run_query(store: &DocumentStore, args: &QueryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut query = match &args.path {
        Some(path) => store.query_path(path),
        None => store.query(),
    };
    if let Some(filter) = &args.filter {
        query.filter(serde_json::from_str(filter)?)?;
    }
    for key in &args.sort {
        let (field, direction) = match key.split_once(':') {
            Some((field, direction)) => (field, direction.parse::<SortDirection>()?),
            None => (key.as_str(), SortDirection::Asc),
        };
        query.sort_by(field, direction)?;
    }
    if !args.only.is_empty() {
        query.only(args.only.clone());
    }
    if !args.without.is_empty() {
        query.without(args.without.clone());
    }
    if let Some(target) = &args.surround {
        query.surround(target, args.before, args.after)?;
    }
    if let Some(skip) = args.skip {
        query.skip(skip)?;
    }
    if let Some(limit) = args.limit {
        query.limit(limit)?;
    }

    let records = query.fetch()?.into_records();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        output::print_records(&records);
    }
    Ok(())
}
