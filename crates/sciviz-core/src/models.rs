//! Shared typed models used across introspection, rendering, and the event tool.

use std::fmt;

use serde::Serialize;

/// Variable name of the single record emitted for a container with nothing
/// to show.
pub const NO_VALID_DATA: &str = "No valid data found";

// ---------------------------------------------------------------------------
// 1. ArtifactRef
// ---------------------------------------------------------------------------

/// Where a persisted chart lives: a publicly resolvable reference plus the
/// local path used later for retention cleanup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArtifactRef {
    #[serde(rename = "file")]
    pub public_ref: String,
    #[serde(rename = "file_path_local")]
    pub local_path: String,
}

// ---------------------------------------------------------------------------
// 2. Stats
// ---------------------------------------------------------------------------

/// Four-scalar summary (population std) over the finite elements of a node.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl Stats {
    /// Axis annotation used under line plots.
    pub fn label(&self) -> String {
        format!(
            "(mean={:.2}, std={:.2}, min={:.2}, max={:.2})",
            self.mean, self.std, self.min, self.max
        )
    }
}

// ---------------------------------------------------------------------------
// 3. ResultRecord
// ---------------------------------------------------------------------------

/// One entry of the output sequence. A record carries either a chart or an
/// inline text value, never both. Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResultRecord {
    variable: String,
    #[serde(flatten)]
    artifact: Option<ArtifactRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<Stats>,
}

impl ResultRecord {
    pub fn chart(variable: impl Into<String>, artifact: ArtifactRef, stats: Option<Stats>) -> Self {
        Self {
            variable: variable.into(),
            artifact: Some(artifact),
            value: None,
            stats,
        }
    }

    pub fn text(variable: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            artifact: None,
            value: Some(value.into()),
            stats: None,
        }
    }

    /// The lone record returned when a container yields nothing at all.
    pub fn no_valid_data() -> Self {
        Self {
            variable: NO_VALID_DATA.to_string(),
            artifact: None,
            value: None,
            stats: None,
        }
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn artifact(&self) -> Option<&ArtifactRef> {
        self.artifact.as_ref()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn stats(&self) -> Option<&Stats> {
        self.stats.as_ref()
    }

    pub fn is_placeholder(&self) -> bool {
        self.artifact.is_none() && self.value.is_some()
    }
}

// ---------------------------------------------------------------------------
// 4. ClassifiedNode
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Scalar,
    Struct,
    Mapping,
    NumericArray,
    ComplexArray,
    ObjectCollection,
    SparseMatrix,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DtypeCategory {
    Integer,
    Float,
    Boolean,
    Textual,
}

impl DtypeCategory {
    pub fn is_numeric(self) -> bool {
        matches!(self, DtypeCategory::Integer | DtypeCategory::Float)
    }

    /// numpy-style dtype name used in placeholder text.
    pub fn dtype_name(self) -> &'static str {
        match self {
            DtypeCategory::Integer => "int64",
            DtypeCategory::Float => "float64",
            DtypeCategory::Boolean => "bool",
            DtypeCategory::Textual => "object",
        }
    }
}

/// Transient summary of a classified node; derived on every visit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ClassifiedNode {
    pub kind: NodeKind,
    /// Rank after collapsing singleton axes; 0 for non-arrays.
    pub rank: usize,
    pub dtype: DtypeCategory,
}

/// Shape rendered as a Python-style tuple, e.g. `(3,)` or `(2, 5, 5)`.
pub struct ShapeDisplay<'a>(pub &'a [usize]);

impl fmt::Display for ShapeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            [] => write!(f, "()"),
            [only] => write!(f, "({only},)"),
            dims => {
                let parts: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
                write!(f, "({})", parts.join(", "))
            }
        }
    }
}
