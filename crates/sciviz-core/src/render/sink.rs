//! Artifact persistence seam.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::errors::{SciVizError, SciVizResult};
use crate::models::ArtifactRef;
use crate::render::chart::Chart;

static UNSAFE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").unwrap());

static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Persists a described chart and says where it ended up.
pub trait ArtifactSink {
    fn persist(&self, chart: &Chart, name: &str) -> SciVizResult<ArtifactRef>;
}

/// Make an artifact base name filesystem- and URL-safe.
pub fn sanitize_name(name: &str) -> String {
    let cleaned = UNSAFE_NAME_RE.replace_all(name.trim(), "_");
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        "artifact".to_string()
    } else {
        cleaned.to_string()
    }
}

/// A fresh 16-hex-char identifier, unique per call within the process and
/// very likely across processes.
pub fn new_request_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let seq = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut hasher = Sha256::new();
    hasher.update(nanos.to_le_bytes());
    hasher.update(std::process::id().to_le_bytes());
    hasher.update(seq.to_le_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}

/// In-memory sink: keeps every persisted chart for inspection.
pub struct MemorySink {
    charts: Mutex<Vec<(String, Chart)>>,
    ignore_collisions: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            charts: Mutex::new(Vec::new()),
            ignore_collisions: false,
        }
    }

    /// A sink that accepts the same name twice (for re-running a traversal).
    pub fn ignoring_collisions() -> Self {
        Self {
            charts: Mutex::new(Vec::new()),
            ignore_collisions: true,
        }
    }

    pub fn len(&self) -> usize {
        self.charts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.lock().is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.charts.lock().iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn chart(&self, name: &str) -> Option<Chart> {
        self.charts
            .lock()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.clone())
    }

    pub fn charts(&self) -> Vec<(String, Chart)> {
        self.charts.lock().clone()
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactSink for MemorySink {
    fn persist(&self, chart: &Chart, name: &str) -> SciVizResult<ArtifactRef> {
        let file = sanitize_name(name);
        let mut charts = self.charts.lock();
        if !self.ignore_collisions && charts.iter().any(|(n, _)| *n == file) {
            return Err(SciVizError::Artifact(format!(
                "artifact {file} already exists"
            )));
        }
        charts.push((file.clone(), chart.clone()));
        Ok(ArtifactRef {
            public_ref: format!("memory://{file}"),
            local_path: file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart() -> Chart {
        Chart::Scatter2d {
            title: "t".into(),
            points: vec![(0.0, 1.0)],
        }
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("s.nested.arr"), "s.nested.arr");
        assert_eq!(sanitize_name("b (slice 0)"), "b_slice_0_");
        assert_eq!(sanitize_name("../etc/passwd"), "_etc_passwd");
        assert_eq!(sanitize_name("  "), "artifact");
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = new_request_id();
        let b = new_request_id();
        assert_eq!(a.len(), 16);
        assert_ne!(a, b);
    }

    #[test]
    fn test_memory_sink_rejects_collisions_by_default() {
        let sink = MemorySink::new();
        sink.persist(&chart(), "x").unwrap();
        assert!(matches!(
            sink.persist(&chart(), "x"),
            Err(SciVizError::Artifact(_))
        ));
        let lenient = MemorySink::ignoring_collisions();
        lenient.persist(&chart(), "x").unwrap();
        lenient.persist(&chart(), "x").unwrap();
        assert_eq!(lenient.len(), 2);
    }
}
