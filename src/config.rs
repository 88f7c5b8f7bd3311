//! Configuration management for schema-uml
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schema-uml.toml)
//! - Environment variables (SCHEMA_UML__*)
//!
//! ## Example config file (schema-uml.toml):
//! ```toml
//! [resolve]
//! strip_namespace = false
//! fuzzy_matching = true
//!
//! [input]
//! cluster_dir = "schemas_avpr"
//! cluster_extension = "avpr"
//! cluster_label_extension = "avdl"
//!
//! [render]
//! comment_width = 57
//! style = "auto"
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;
use crate::graph::ResolveOptions;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UmlConfig {
    /// Resolver settings
    #[serde(default)]
    pub resolve: ResolveOptions,

    /// Input settings
    #[serde(default)]
    pub input: InputConfig,

    /// Rendering settings
    #[serde(default)]
    pub render: RenderConfig,
}

/// Where cluster sources live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Directory holding one protocol file per cluster
    #[serde(default = "default_cluster_dir")]
    pub cluster_dir: PathBuf,

    /// Extension of cluster files on disk
    #[serde(default = "default_cluster_extension")]
    pub cluster_extension: String,

    /// Extension used in cluster labels (the IDL the protocol came from)
    #[serde(default = "default_cluster_label_extension")]
    pub cluster_label_extension: String,
}

/// Diagram style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiagramStyle {
    /// Clustered when groupings exist, plain otherwise
    #[default]
    Auto,
    /// Record-shaped nodes, no clusters
    Plain,
    /// HTML table nodes inside per-source clusters
    Clustered,
}

/// Rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Wrap width for type annotations in clustered diagrams
    #[serde(default = "default_comment_width")]
    pub comment_width: usize,

    #[serde(default)]
    pub style: DiagramStyle,
}

// Default value functions
fn default_cluster_dir() -> PathBuf {
    PathBuf::from("schemas_avpr")
}

fn default_cluster_extension() -> String {
    "avpr".to_string()
}

fn default_cluster_label_extension() -> String {
    "avdl".to_string()
}

fn default_comment_width() -> usize {
    57
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            cluster_dir: default_cluster_dir(),
            cluster_extension: default_cluster_extension(),
            cluster_label_extension: default_cluster_label_extension(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            comment_width: default_comment_width(),
            style: DiagramStyle::Auto,
        }
    }
}

impl UmlConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, adding a specific file on top of the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_locations = [
            "schema-uml.toml",
            ".schema-uml.toml",
            "config/schema-uml.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "schema-uml", "schema-uml") {
            let xdg_config = config_dir.config_dir().join("schema-uml.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // SCHEMA_UML__RESOLVE__STRIP_NAMESPACE=true etc.
        builder = builder.add_source(
            Environment::with_prefix("SCHEMA_UML")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
