//! `resource-filter`: select resources of a JSON content tree.
//!
//! Usage:
//!   resource-filter [--content <file>] [--root <path>] [--start <path>]
//!                   [--branch <filter>] [--arg name=value]... [--json] '<filter>'
//!
//! The content tree is read from `--content`, or from stdin when it is
//! missing or `-`. Paths of the matching resources are printed one per line,
//! or as a JSON array with `--json`. Set `RUST_LOG` for diagnostics on stderr.

use clap::Parser;
use resource_filter::{
    value, FilterContext, FilterParser, MemoryResource, ParseError, Resource,
    ResourceFilterStream, Value,
};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

/// Select resources of a JSON content tree with a filter expression.
#[derive(Parser, Debug)]
#[command(name = "resource-filter")]
#[command(about = "Select resources of a JSON content tree with a filter expression")]
struct Config {
    /// Filter selecting the printed resources
    filter: String,

    /// JSON content file, `-` for stdin
    #[arg(long, env = "RESOURCE_FILTER_CONTENT")]
    content: Option<PathBuf>,

    /// Path of the content tree's root resource
    #[arg(long, default_value = "/", env = "RESOURCE_FILTER_ROOT")]
    root: String,

    /// Path to start the traversal at (defaults to the root)
    #[arg(long, env = "RESOURCE_FILTER_START")]
    start: Option<String>,

    /// Filter selecting the branches to descend into
    #[arg(long, env = "RESOURCE_FILTER_BRANCH")]
    branch: Option<String>,

    /// Value for a `$name` argument, as name=value (repeatable)
    #[arg(long = "arg", value_parser = parse_argument)]
    arguments: Vec<(String, String)>,

    /// Print a JSON array instead of one path per line
    #[arg(long, env = "RESOURCE_FILTER_JSON")]
    json: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read content: {0}")]
    Io(#[from] io::Error),
    #[error("invalid content: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid filter: {0}")]
    Parse(#[from] ParseError),
    #[error("no resource at {0}")]
    StartNotFound(String),
}

fn parse_argument(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected name=value, got \"{s}\"")),
    }
}

/// Numbers are bound as numbers, everything else as text.
fn argument_value(raw: &str) -> Value {
    value::parse_number(raw).unwrap_or_else(|| Value::Text(raw.to_string()))
}

fn read_content(path: Option<&PathBuf>) -> Result<String, CliError> {
    let mut buf = String::new();
    match path {
        Some(path) if path.as_os_str() != "-" => {
            buf = std::fs::read_to_string(path)?;
        }
        _ => {
            io::stdin().read_to_string(&mut buf)?;
        }
    }
    Ok(buf)
}

fn run(config: &Config) -> Result<Vec<String>, CliError> {
    let text = read_content(config.content.as_ref())?;
    let json: serde_json::Value = serde_json::from_str(&text)?;
    let tree = MemoryResource::from_json(&config.root, &json);

    let start_path = config.start.as_deref().unwrap_or(&config.root);
    let start = tree
        .get_resource(start_path)
        .ok_or_else(|| CliError::StartNotFound(start_path.to_string()))?;
    debug!(start = start.path(), "content loaded");

    // Validate before traversal so that errors point at the filter text.
    FilterParser::parse(&config.filter)?;

    let mut context = FilterContext::new();
    for (name, raw) in &config.arguments {
        context.set_argument(name.as_str(), argument_value(raw));
    }

    let mut stream =
        ResourceFilterStream::with_context(start, context).set_child_selector(&config.filter)?;
    if let Some(branch) = &config.branch {
        stream = stream.set_branch_selector(branch)?;
    }

    let paths: Vec<String> = stream.stream().map(|r| r.path().to_string()).collect();
    info!(matches = paths.len(), "filter finished");
    Ok(paths)
}

fn print(paths: &[String], json: bool) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        let text = serde_json::to_string_pretty(paths)?;
        writeln!(out, "{text}")?;
    } else {
        for path in paths {
            writeln!(out, "{path}")?;
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let config = Config::parse();

    let result = run(&config).and_then(|paths| print(&paths, config.json));
    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
