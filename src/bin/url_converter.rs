//! GitHub URL converter
//!
//! Converts between raw.githubusercontent.com and github.com/.../blob URLs,
//! one at a time or a file of them.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgGroup, Parser};
use schema_uml::urls::{to_cooked_url, to_raw_url};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "url-converter")]
#[command(about = "Convert GitHub URLs between raw and cooked form")]
#[command(group(ArgGroup::new("mode").required(true).args([
    "get_raw", "get_cooked", "get_raw_from_file", "get_cooked_from_file"
])))]
struct Cli {
    /// Print the raw form of a URL
    #[arg(long)]
    get_raw: Option<String>,

    /// Print the cooked form of a URL
    #[arg(long)]
    get_cooked: Option<String>,

    /// Print the raw form of every URL in a file
    #[arg(long)]
    get_raw_from_file: Option<PathBuf>,

    /// Print the cooked form of every URL in a file
    #[arg(long)]
    get_cooked_from_file: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn convert_file(path: &Path, convert: fn(&str) -> schema_uml::Result<String>) -> anyhow::Result<()> {
    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        println!("{}", convert(line)?);
    }
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(url) = cli.get_raw {
        println!("{}", to_raw_url(&url)?);
    } else if let Some(url) = cli.get_cooked {
        println!("{}", to_cooked_url(&url)?);
    } else if let Some(path) = cli.get_raw_from_file {
        convert_file(&path, to_raw_url)?;
    } else if let Some(path) = cli.get_cooked_from_file {
        convert_file(&path, to_cooked_url)?;
    }
    Ok(())
}
