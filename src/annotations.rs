//! Type annotations
//!
//! Free-text header comments for diagram nodes, keyed by local type name.
//! Loaded from tab-delimited lines (`ExpressionUnits<TAB>FPKM or TPM`) and
//! handed to the renderer untouched.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Local type name -> comment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeAnnotations {
    comments: BTreeMap<String, String>,
}

impl TypeAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse tab-delimited `name<TAB>comment` lines.
    ///
    /// Lines without a tab are skipped; later lines win.
    pub fn parse(content: &str) -> Self {
        let comments = content
            .lines()
            .filter_map(|line| line.split_once('\t'))
            .map(|(name, comment)| (name.to_string(), comment.trim().to_string()))
            .collect();
        Self { comments }
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    pub fn insert(&mut self, name: impl Into<String>, comment: impl Into<String>) {
        self.comments.insert(name.into(), comment.into());
    }

    pub fn get(&self, local_name: &str) -> Option<&str> {
        self.comments.get(local_name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }
}
