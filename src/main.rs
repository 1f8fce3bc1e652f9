use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use vestige::index::{FileWalker, IndexStore, JsonIndexStore};
use vestige::report::{OutputFormat, write_findings};
use vestige::syntax::{EmptySyntaxProvider, JsonSyntaxProvider, SyntaxProvider};
use vestige::{Driver, Settings};

#[derive(Parser)]
#[command(name = "vestige")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Dead code detection for Swift projects")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a project and report unused declarations
    Scan {
        /// Project roots to discover sources under
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Index store directory (repeatable; overrides config)
        #[arg(long = "index-store")]
        index_stores: Vec<PathBuf>,

        /// Syntax visitor output file (overrides config)
        #[arg(long)]
        syntax: Option<PathBuf>,

        /// Number of worker threads (overrides config)
        #[arg(short, long)]
        threads: Option<usize>,

        /// Retain public and open declarations
        #[arg(long)]
        retain_public: bool,

        /// Retain Objective-C accessible declarations
        #[arg(long)]
        retain_objc_accessible: bool,

        /// Do not report properties that are only assigned
        #[arg(long)]
        retain_assign_only_properties: bool,

        /// Ignore in-source periphery commands
        #[arg(long)]
        ignore_comment_commands: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Create a default vestige.toml in the current directory
    Init {
        /// Overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Print the resolved configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load().context("failed to load configuration")?;
    vestige::logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Scan {
            paths,
            index_stores,
            syntax,
            threads,
            retain_public,
            retain_objc_accessible,
            retain_assign_only_properties,
            ignore_comment_commands,
            format,
        } => {
            if !index_stores.is_empty() {
                settings.scan.index_stores = index_stores;
            }
            if syntax.is_some() {
                settings.scan.syntax = syntax;
            }
            if let Some(threads) = threads {
                settings.scan.threads = threads;
            }
            settings.analysis.retain_public |= retain_public;
            settings.analysis.retain_objc_accessible |= retain_objc_accessible;
            settings.analysis.retain_assign_only_properties |= retain_assign_only_properties;
            settings.analysis.ignore_comment_commands |= ignore_comment_commands;

            if settings.scan.index_stores.is_empty() {
                bail!("no index stores configured; pass --index-store or set scan.index_stores");
            }

            let settings = Arc::new(settings);
            let walker = FileWalker::new(Arc::clone(&settings));
            let mut sources: Vec<PathBuf> = Vec::new();
            for root in &paths {
                sources.extend(walker.walk(root));
            }
            sources.sort();
            sources.dedup();

            let mut stores: Vec<Arc<dyn IndexStore>> = Vec::new();
            for path in &settings.scan.index_stores {
                let store = JsonIndexStore::open(path)
                    .with_context(|| format!("failed to open index store {}", path.display()))?;
                stores.push(Arc::new(store));
            }

            let provider: Box<dyn SyntaxProvider> = match &settings.scan.syntax {
                Some(path) => Box::new(
                    JsonSyntaxProvider::open(path)
                        .with_context(|| format!("failed to open syntax output {}", path.display()))?,
                ),
                None => Box::new(EmptySyntaxProvider),
            };

            let driver = Driver::new(settings);
            let findings = driver.scan(&sources, stores, provider.as_ref())?;

            let stdout = std::io::stdout();
            write_findings(&findings, format, &mut stdout.lock())?;
            if !findings.is_empty() {
                std::process::exit(1);
            }
        }
        Commands::Init { force } => {
            let path = Settings::init_config_file(force)
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            println!("Created configuration at {}", path.display());
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&settings)?);
        }
    }
    Ok(())
}
