//! Schema Source Loading
//!
//! Turns files on disk into [`SchemaSource`]s for the resolver. Loading
//! always completes (or fails) before resolution starts.

pub mod avpr;
pub mod descriptor;

pub use avpr::parse_protocol;
pub use descriptor::parse_descriptor_set;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::config::InputConfig;
use crate::error::{Result, SchemaError};
use crate::schema::SchemaSource;

/// Load one AVPR file. The source label is the file name.
pub fn load_avpr(path: &Path) -> Result<SchemaSource> {
    let content = fs::read_to_string(path)?;
    let source = parse_protocol(&content, path)?;
    let label = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    debug!(path = %path.display(), entities = source.entities.len(), "loaded protocol");
    Ok(source.with_label(label))
}

/// Load AVPR files in the order given
pub fn load_avpr_files(paths: &[PathBuf]) -> Result<Vec<SchemaSource>> {
    paths.iter().map(|path| load_avpr(path)).collect()
}

/// Load every `*.avpr` file below `dir`, sorted by path
pub fn load_avpr_dir(dir: &Path) -> Result<Vec<SchemaSource>> {
    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "avpr"))
        .collect();
    paths.sort();
    load_avpr_files(&paths)
}

/// Load clusters named in `order` (whitespace separated), in that order.
///
/// Each cluster `name` is read from `<cluster_dir>/<name>.<cluster_extension>`
/// and labelled `<name>.<cluster_label_extension>`. Every cluster must exist.
pub fn load_clusters(order: &str, input: &InputConfig) -> Result<Vec<SchemaSource>> {
    order
        .split_whitespace()
        .map(|name| {
            let path = input
                .cluster_dir
                .join(format!("{}.{}", name, input.cluster_extension));
            let label = format!("{}.{}", name, input.cluster_label_extension);
            if !path.is_file() {
                return Err(SchemaError::MissingSource { label, path });
            }
            let content = fs::read_to_string(&path)?;
            Ok(parse_protocol(&content, &path)?.with_label(label))
        })
        .collect()
}

/// Load a JSON-encoded FileDescriptorSet; one source per file in the set
pub fn load_descriptor_set(path: &Path) -> Result<Vec<SchemaSource>> {
    let content = fs::read_to_string(path)?;
    let sources = parse_descriptor_set(&content, path)?;
    debug!(path = %path.display(), files = sources.len(), "loaded descriptor set");
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PROTOCOL: &str = r#"{"protocol": "P", "namespace": "ns", "types": [
        {"type": "record", "name": "Donor", "fields": [{"name": "id", "type": "string"}]}
    ]}"#;

    #[test]
    fn test_load_clusters_in_order() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("common.avpr"), PROTOCOL).unwrap();
        fs::write(dir.path().join("reads.avpr"), r#"{"protocol": "R", "types": []}"#).unwrap();

        let input = InputConfig {
            cluster_dir: dir.path().to_path_buf(),
            ..InputConfig::default()
        };
        let sources = load_clusters("reads  common", &input).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].label.as_deref(), Some("reads.avdl"));
        assert_eq!(sources[1].label.as_deref(), Some("common.avdl"));
        assert_eq!(sources[1].entities[0].name, "Donor");
    }

    #[test]
    fn test_missing_cluster_is_fatal() {
        let dir = TempDir::new().unwrap();
        let input = InputConfig {
            cluster_dir: dir.path().to_path_buf(),
            ..InputConfig::default()
        };
        let err = load_clusters("absent", &input).unwrap_err();
        match err {
            SchemaError::MissingSource { label, path } => {
                assert_eq!(label, "absent.avdl");
                assert!(path.ends_with("absent.avpr"));
            }
            other => panic!("Expected MissingSource, got {:?}", other),
        }
    }

    #[test]
    fn test_load_avpr_dir_sorted() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/b.avpr"), PROTOCOL).unwrap();
        fs::write(dir.path().join("a.avpr"), PROTOCOL).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let sources = load_avpr_dir(dir.path()).unwrap();
        let labels: Vec<_> = sources.iter().filter_map(|s| s.label.as_deref()).collect();
        assert_eq!(labels, vec!["a.avpr", "b.avpr"]);
    }
}
