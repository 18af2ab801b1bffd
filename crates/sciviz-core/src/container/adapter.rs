//! Uniform "named child → value" view over both container formats.

use std::path::Path;

use serde::Deserialize;

use crate::container::node::{Fields, Node};
use crate::errors::SciVizResult;

/// Prefix of decoder-internal metadata entries (`__header__`, `__globals__`).
const METADATA_PREFIX: &str = "__";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerFormat {
    /// Columnar-struct files: top-level entries are named variables.
    ColumnarStruct,
    /// Hierarchical-group files: top-level entries are datasets and groups.
    HierarchicalGroup,
}

impl ContainerFormat {
    /// Guess the format from a file extension (`.mat` / `.h5`, `.hdf5`).
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "mat" => Some(ContainerFormat::ColumnarStruct),
            "h5" | "hdf5" => Some(ContainerFormat::HierarchicalGroup),
            _ => None,
        }
    }
}

/// A decoded container root.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Container {
    format: ContainerFormat,
    entries: Fields,
}

impl Container {
    pub fn new(format: ContainerFormat, entries: Fields) -> Self {
        Self { format, entries }
    }

    pub fn columnar<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Node)>,
        K: Into<String>,
    {
        Self::new(
            ContainerFormat::ColumnarStruct,
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )
    }

    pub fn hierarchical<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Node)>,
        K: Into<String>,
    {
        Self::new(
            ContainerFormat::HierarchicalGroup,
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )
    }

    pub fn from_json(text: &str) -> SciVizResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: &Path) -> SciVizResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn format(&self) -> ContainerFormat {
        self.format
    }

    /// User-visible entries in declaration order, metadata keys excluded.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Node)> + '_ {
        self.entries
            .iter()
            .filter(|(name, _)| !name.starts_with(METADATA_PREFIX))
            .map(|(name, node)| (name.as_str(), node))
    }

    /// Raw lookup, metadata keys included.
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.entries.get(name)
    }

    pub fn entries_map(&self) -> &Fields {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_skip_metadata_and_keep_order() {
        let container = Container::columnar([
            ("__header__", Node::scalar("MATLAB 5.0 MAT-file")),
            ("zeta", Node::scalar(1i64)),
            ("__version__", Node::scalar("1.0")),
            ("alpha", Node::scalar(2i64)),
        ]);
        let names: Vec<&str> = container.entries().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert!(container.get("__header__").is_some());
    }

    #[test]
    fn test_both_formats_share_the_same_view() {
        let a = Container::columnar([("x", Node::scalar(1i64))]);
        let b = Container::hierarchical([("x", Node::scalar(1i64))]);
        let left: Vec<_> = a.entries().collect();
        let right: Vec<_> = b.entries().collect();
        assert_eq!(left, right);
        assert_ne!(a.format(), b.format());
    }

    #[test]
    fn test_from_json_root() {
        let json = r#"{
            "format": "hierarchical_group",
            "entries": {
                "events": {"kind": "array", "dtype": "float", "shape": [1, 4], "data": [0, 1, 2, 1]}
            }
        }"#;
        let container = Container::from_json(json).unwrap();
        assert_eq!(container.format(), ContainerFormat::HierarchicalGroup);
        assert_eq!(container.entries().count(), 1);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ContainerFormat::from_extension(Path::new("dvs_test.MAT")),
            Some(ContainerFormat::ColumnarStruct)
        );
        assert_eq!(
            ContainerFormat::from_extension(Path::new("dvs_test.h5")),
            Some(ContainerFormat::HierarchicalGroup)
        );
        assert_eq!(ContainerFormat::from_extension(Path::new("notes.txt")), None);
    }
}
