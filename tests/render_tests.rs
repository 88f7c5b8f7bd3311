//! Diagram rendering from fixture schemas

use std::fs;
use std::path::{Path, PathBuf};

use schema_uml::loader;
use schema_uml::urls::cluster_urls;
use schema_uml::{
    DiagramStyle, DotRenderer, InputConfig, RenderConfig, ResolveOptions, ResolvedGraph, Resolver,
    TypeAnnotations,
};

fn fixtures_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn clustered_graph() -> ResolvedGraph {
    let input = InputConfig {
        cluster_dir: fixtures_path().join("avpr"),
        ..InputConfig::default()
    };
    let sources = loader::load_clusters("common samples", &input).unwrap();
    let options = ResolveOptions {
        group_by_source: true,
        ..ResolveOptions::default()
    };
    Resolver::new(options).resolve(&sources).unwrap()
}

#[test]
fn test_clustered_diagram() {
    let annotations = TypeAnnotations::load(&fixtures_path().join("type_comments.tsv")).unwrap();
    let urls = cluster_urls(&fs::read_to_string(fixtures_path().join("urls.txt")).unwrap()).unwrap();

    let dot = DotRenderer::new(RenderConfig::default())
        .with_annotations(annotations)
        .with_cluster_urls(urls)
        .render(&clustered_graph());

    assert!(dot.contains("subgraph cluster_common_avdl {"));
    assert!(dot.contains("\tURL=\"https://github.com/example/schemas/blob/main/avro/common.avdl\";\n"));
    assert!(dot.contains("\tURL=\"https://github.com/example/schemas/blob/main/avro/samples.avdl\";\n"));
    assert!(dot.contains("\torg_example_common_Donor;\n"));
    assert!(dot.contains("A person who provided biological material"));
    assert!(dot.contains("org_example_samples_Batch:items:w -> org_example_samples_Sample\n"));
    assert!(dot.contains("org_example_samples_Sample:donorId:w -> org_example_common_Donor:id:w\n"));
    assert!(dot.contains("org_example_samples_Batch:sampleIds:w -> org_example_samples_Sample:id:w\n"));
}

#[test]
fn test_long_annotation_wraps() {
    let mut annotations = TypeAnnotations::new();
    annotations.insert(
        "Donor",
        "A person who provided biological material for one or more samples in this study",
    );
    let config = RenderConfig {
        comment_width: 30,
        ..RenderConfig::default()
    };

    let dot = DotRenderer::new(config)
        .with_annotations(annotations)
        .render(&clustered_graph());

    assert!(dot.contains(
        "A person who provided<BR/>biological material for one or<BR/>more samples in this study"
    ));
}

#[test]
fn test_plain_diagram_for_file_list() {
    let sources = loader::load_avpr_files(&[
        fixtures_path().join("avpr/common.avpr"),
        fixtures_path().join("avpr/samples.avpr"),
    ])
    .unwrap();
    let graph = Resolver::default().resolve(&sources).unwrap();
    let renderer = DotRenderer::default();

    assert_eq!(renderer.style_for(&graph), DiagramStyle::Plain);
    let dot = renderer.render(&graph);
    assert!(dot.contains("label=\"{Donor|id : string|name : union&lt;null,string&gt;}\""));
    assert!(dot.contains("org_example_samples_Sample -> org_example_common_Donor\n"));
    assert!(!dot.contains("subgraph"));
}

#[test]
fn test_descriptor_diagram_skips_external_types() {
    let sources = loader::load_descriptor_set(&fixtures_path().join("descriptor_set.json")).unwrap();
    let options = ResolveOptions {
        fold_underscores: true,
        group_by_source: true,
        ..ResolveOptions::default()
    };
    let graph = Resolver::new(options).resolve(&sources).unwrap();
    let dot = DotRenderer::default().render(&graph);

    assert!(dot.contains("subgraph cluster_sample_proto {"));
    assert!(dot.contains("example_v1_Sample:readings:w -> example_v1_Reading\n"));
    assert!(dot.contains("example_v1_Sample:donor_id:w -> example_v1_Donor:id:w\n"));
    // google.protobuf.Timestamp is not part of the set
    assert!(!dot.contains("google_protobuf_Timestamp"));
}

#[test]
fn test_render_is_deterministic() {
    let renderer = DotRenderer::default();
    assert_eq!(renderer.render(&clustered_graph()), renderer.render(&clustered_graph()));
}
