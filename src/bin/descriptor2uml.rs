//! Protobuf descriptor to UML
//!
//! Renders a JSON-encoded FileDescriptorSet as a GraphViz UML diagram with
//! one cluster per .proto file.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use schema_uml::loader;
use schema_uml::{DotRenderer, Resolver, TypeAnnotations, UmlConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "descriptor2uml")]
#[command(about = "Render a protobuf descriptor set (JSON) as a UML diagram")]
struct Cli {
    /// FileDescriptorSet in JSON form
    #[arg(long)]
    descriptor: PathBuf,

    /// Output DOT file (stdout when omitted)
    #[arg(long)]
    dot: Option<PathBuf>,

    /// Also write the resolved graph as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Tab-delimited type comments
    #[arg(long)]
    type_comments: Option<PathBuf>,

    /// Extra config file
    #[arg(long)]
    config: Option<String>,
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

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = UmlConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    // snake_case field names (donor_id) and one cluster per file
    config.resolve.fold_underscores = true;
    config.resolve.group_by_source = true;

    let sources = loader::load_descriptor_set(&cli.descriptor)
        .with_context(|| format!("reading {}", cli.descriptor.display()))?;
    let graph = Resolver::new(config.resolve.clone()).resolve(&sources)?;

    let mut renderer = DotRenderer::new(config.render.clone());
    if let Some(path) = &cli.type_comments {
        let annotations = TypeAnnotations::load(path)
            .with_context(|| format!("reading type comments from {}", path.display()))?;
        renderer = renderer.with_annotations(annotations);
    }

    let dot = renderer.render(&graph);
    match &cli.dot {
        Some(path) => {
            fs::write(path, &dot).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), types = graph.type_count(), edges = graph.edge_count(), "wrote diagram");
        }
        None => print!("{}", dot),
    }

    if let Some(path) = &cli.json {
        fs::write(path, serde_json::to_string_pretty(&graph)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    Ok(())
}
