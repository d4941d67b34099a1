//! pathmap-resolve: resolve asset paths from the command line.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pathmap_resolver::{
  DefaultContextRegistry, PathmapResolver, PathmapTable, ProcessEnvironment, ResolutionContext,
  Resolver, ResolverConfig,
};

/// Resolve asset paths using search paths and pathmap prefix rewriting
#[derive(Parser)]
#[command(name = "pathmap-resolve")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Asset paths to resolve
  #[arg(required = true)]
  assets: Vec<String>,

  /// Search directory for the bound context (repeatable)
  #[arg(long = "search-path", short = 's')]
  search_paths: Vec<String>,

  /// Pathmap text for the bound context, e.g. "{'$JOB/':'/proj/job42/'}"
  #[arg(long)]
  pathmap: Option<String>,

  /// Combined "search-path-list,pathmap" context string; overrides --search-path and --pathmap
  #[arg(long)]
  context: Option<String>,

  /// Configuration file naming the environment variables to read
  #[arg(long)]
  config: Option<PathBuf>,

  /// Print every resolution decision
  #[arg(short, long)]
  verbose: bool,
}

fn main() -> Result<ExitCode> {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let config = match &cli.config {
    Some(path) => ResolverConfig::from_path(path)
      .with_context(|| format!("failed to read config {}", path.display()))?,
    None => ResolverConfig::discover(&std::env::current_dir()?),
  };

  let registry = DefaultContextRegistry::from_environment(&config, Arc::new(ProcessEnvironment))
    .context("failed to initialise default context")?;
  let resolver = PathmapResolver::from_config(&config, Arc::new(registry));
  let bound = bound_context(&cli, &resolver);

  let mut unresolved = 0usize;
  for asset in &cli.assets {
    match resolver.resolve(asset, bound.as_ref()) {
      Some(resolved) => println!("{asset} -> {resolved}"),
      None => {
        eprintln!("{asset} -> unresolved");
        unresolved += 1;
      }
    }
  }

  Ok(if unresolved == 0 {
    ExitCode::SUCCESS
  } else {
    ExitCode::FAILURE
  })
}

fn bound_context(cli: &Cli, resolver: &PathmapResolver) -> Option<ResolutionContext> {
  if let Some(text) = &cli.context {
    return Some(resolver.create_context_from_string(text));
  }
  if cli.search_paths.is_empty() && cli.pathmap.is_none() {
    return None;
  }
  let pathmap = cli
    .pathmap
    .as_deref()
    .map(PathmapTable::parse)
    .unwrap_or_default();
  Some(ResolutionContext::with_pathmap(&cli.search_paths, pathmap))
}

fn init_tracing(verbose: bool) {
  let filter = if verbose {
    EnvFilter::new("pathmap_resolver=debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .init();
}
