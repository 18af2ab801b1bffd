//! Depth-first traversal of a decoded container.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::container::adapter::Container;
use crate::container::node::Node;
use crate::errors::SciVizResult;
use crate::introspect::classify::{classify, Classified, Composite};
use crate::introspect::dispatch::Dispatcher;
use crate::introspect::governor::Limits;
use crate::models::ResultRecord;
use crate::render::sink::ArtifactSink;

pub struct Walker<'s> {
    dispatcher: Dispatcher<'s>,
    visited: HashSet<String>,
    records: Vec<ResultRecord>,
}

impl<'s> Walker<'s> {
    pub fn new(sink: &'s dyn ArtifactSink, limits: Limits) -> Self {
        Self {
            dispatcher: Dispatcher::new(sink, limits),
            visited: HashSet::new(),
            records: Vec::new(),
        }
    }

    /// Walk one named root value, appending its records in pre-order.
    pub fn walk(&mut self, name: &str, node: &Node) -> SciVizResult<()> {
        self.visit(name, node, 0)
    }

    pub fn finish(self) -> Vec<ResultRecord> {
        self.records
    }

    fn visit(&mut self, path: &str, node: &Node, depth: usize) -> SciVizResult<()> {
        if !self.visited.insert(path.to_string()) {
            warn!("Skipping duplicate path {path}");
            return Ok(());
        }

        let classified = classify(node);
        debug!(path, kind = ?classified.summary().map(|s| s.kind), "visiting node");

        match classified {
            Classified::Composite { kind, fields } => {
                let max_depth = self.dispatcher.limits().max_depth;
                if depth >= max_depth {
                    warn!("{path} nested deeper than {max_depth} levels, truncating");
                    self.records.push(ResultRecord::text(
                        path,
                        format!("{path} nested deeper than {max_depth} levels, truncated"),
                    ));
                    return Ok(());
                }
                let note = match kind {
                    Composite::Struct => format!("{path} is a MATLAB mat_struct (see subfields)"),
                    Composite::Mapping => format!("{path} is a struct/dict, see subfields"),
                };
                self.records.push(ResultRecord::text(path, note));
                for (child, value) in fields {
                    self.visit(&format!("{path}.{child}"), value, depth + 1)?;
                }
                Ok(())
            }
            Classified::Leaf(leaf) => match self.dispatcher.render(path, leaf) {
                Ok(records) => {
                    self.records.extend(records);
                    Ok(())
                }
                // A malformed node is dropped; a failing sink aborts the walk.
                Err(e) if e.is_schema_violation() => {
                    warn!("Dropping {path}: {e}");
                    Ok(())
                }
                Err(e) => Err(e),
            },
            Classified::Unsupported => {
                warn!("Dropping {path}: unsupported value");
                Ok(())
            }
        }
    }
}

/// Visualize every entry of a container, in declaration order.
///
/// Returns a single "No valid data found" record when nothing was produced.
/// Sink failures abort the traversal and are returned as-is.
pub fn analyze_container(
    container: &Container,
    sink: &dyn ArtifactSink,
    limits: Limits,
) -> SciVizResult<Vec<ResultRecord>> {
    let mut walker = Walker::new(sink, limits);
    for (name, node) in container.entries() {
        walker.walk(name, node)?;
    }
    let mut records = walker.finish();
    if records.is_empty() {
        records.push(ResultRecord::no_valid_data());
    }
    info!(
        format = ?container.format(),
        records = records.len(),
        charts = records.iter().filter(|r| r.artifact().is_some()).count(),
        "container analysis complete"
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::node::ElementType;
    use crate::errors::SciVizError;
    use crate::models::{ArtifactRef, NO_VALID_DATA};
    use crate::render::chart::Chart;
    use crate::render::sink::MemorySink;

    struct BrokenSink;

    impl ArtifactSink for BrokenSink {
        fn persist(&self, _chart: &Chart, name: &str) -> SciVizResult<ArtifactRef> {
            Err(SciVizError::Artifact(format!("cannot write {name}")))
        }
    }

    fn variables(records: &[ResultRecord]) -> Vec<&str> {
        records.iter().map(|r| r.variable()).collect()
    }

    fn twenty_five() -> Vec<f64> {
        (0..25).map(|i| i as f64 * 1.5 - 3.0).collect()
    }

    #[test]
    fn test_scalar_then_line_plot() {
        let container = Container::columnar([
            ("a", Node::scalar(42i64)),
            ("b", Node::vector(twenty_five())),
        ]);
        let sink = MemorySink::new();
        let records = analyze_container(&container, &sink, Limits::default()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].variable(), "a");
        assert_eq!(records[0].value(), Some("42"));
        assert!(records[0].artifact().is_none());

        assert_eq!(records[1].variable(), "b");
        assert!(records[1].value().is_none());
        assert_eq!(records[1].artifact().unwrap().local_path, "b");
        let stats = records[1].stats().unwrap();
        assert_eq!(stats.min, -3.0);
        assert_eq!(stats.max, 33.0);
        assert!((stats.mean - 15.0).abs() < 1e-12);
        assert_eq!(sink.chart("b").unwrap().recipe(), "line");
    }

    #[test]
    fn test_nested_structs_are_pre_order_with_dotted_names() {
        let container = Container::columnar([
            (
                "s",
                Node::structure([
                    ("x", Node::scalar(1.5)),
                    ("inner", Node::structure([("y", Node::scalar("hi"))])),
                    ("z", Node::scalar(true)),
                ]),
            ),
            ("after", Node::scalar(0i64)),
        ]);
        let sink = MemorySink::new();
        let records = analyze_container(&container, &sink, Limits::default()).unwrap();
        assert_eq!(
            variables(&records),
            vec!["s", "s.x", "s.inner", "s.inner.y", "s.z", "after"]
        );
        assert_eq!(records[0].value(), Some("s is a MATLAB mat_struct (see subfields)"));
        assert_eq!(records[1].value(), Some("1.5"));
        assert_eq!(records[3].value(), Some("hi"));
        assert_eq!(records[4].value(), Some("True"));
    }

    #[test]
    fn test_groups_use_mapping_placeholder() {
        let container = Container::hierarchical([(
            "grp",
            Node::group([("d", Node::vector(twenty_five()))]),
        )]);
        let sink = MemorySink::new();
        let records = analyze_container(&container, &sink, Limits::default()).unwrap();
        assert_eq!(records[0].value(), Some("grp is a struct/dict, see subfields"));
        assert_eq!(records[1].variable(), "grp.d");
        assert!(sink.chart("grp.d").is_some());
    }

    #[test]
    fn test_empty_container_yields_no_valid_data() {
        let container = Container::columnar(Vec::<(&str, Node)>::new());
        let sink = MemorySink::new();
        let records = analyze_container(&container, &sink, Limits::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].variable(), NO_VALID_DATA);
        assert!(records[0].value().is_none());
        assert!(records[0].artifact().is_none());
    }

    #[test]
    fn test_unsupported_nodes_are_dropped() {
        let container = Container::columnar([
            ("handle", Node::Unsupported),
            ("kept", Node::scalar(3i64)),
        ]);
        let sink = MemorySink::new();
        let records = analyze_container(&container, &sink, Limits::default()).unwrap();
        assert_eq!(variables(&records), vec!["kept"]);

        let only = Container::columnar([("handle", Node::Unsupported)]);
        let records = analyze_container(&only, &sink, Limits::default()).unwrap();
        assert_eq!(variables(&records), vec![NO_VALID_DATA]);
    }

    #[test]
    fn test_metadata_entries_are_skipped() {
        let container = Container::columnar([
            ("__header__", Node::scalar("MATLAB 5.0 MAT-file")),
            ("__version__", Node::scalar("1.0")),
            ("x", Node::scalar(1i64)),
        ]);
        let sink = MemorySink::new();
        let records = analyze_container(&container, &sink, Limits::default()).unwrap();
        assert_eq!(variables(&records), vec!["x"]);
    }

    #[test]
    fn test_sink_failure_aborts_traversal() {
        let container = Container::columnar([
            ("a", Node::scalar(1i64)),
            ("b", Node::vector(twenty_five())),
            ("c", Node::scalar(2i64)),
        ]);
        let err = analyze_container(&container, &BrokenSink, Limits::default()).unwrap_err();
        assert!(matches!(err, SciVizError::Artifact(_)));
    }

    #[test]
    fn test_oversize_is_placeholder_not_error() {
        let container = Container::columnar([("huge", Node::vector(vec![1.0; 1_000_001]))]);
        let records = analyze_container(&container, &BrokenSink, Limits::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].is_placeholder());
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let container = Container::columnar([
            ("a", Node::scalar(42i64)),
            ("b", Node::vector(twenty_five())),
            (
                "s",
                Node::structure([(
                    "grid",
                    Node::array(ElementType::Float, vec![4, 4], (0..16).map(f64::from).collect())
                        .unwrap(),
                )]),
            ),
        ]);
        let sink = MemorySink::ignoring_collisions();
        let first = analyze_container(&container, &sink, Limits::default()).unwrap();
        let second = analyze_container(&container, &sink, Limits::default()).unwrap();
        assert_eq!(variables(&first), variables(&second));
        let stats = |rs: &[ResultRecord]| rs.iter().map(|r| r.stats().copied()).collect::<Vec<_>>();
        assert_eq!(stats(&first), stats(&second));
        assert_eq!(sink.len(), 4);
    }

    #[test]
    fn test_depth_bound_truncates() {
        let mut node = Node::scalar(1i64);
        for _ in 0..4 {
            node = Node::structure([("n", node)]);
        }
        let container = Container::columnar([("deep", node)]);
        let limits = Limits {
            max_depth: 2,
            ..Limits::default()
        };
        let sink = MemorySink::new();
        let records = analyze_container(&container, &sink, limits).unwrap();
        assert_eq!(variables(&records), vec!["deep", "deep.n", "deep.n.n"]);
        assert_eq!(
            records[2].value(),
            Some("deep.n.n nested deeper than 2 levels, truncated")
        );
    }

    #[test]
    fn test_duplicate_dotted_paths_are_skipped() {
        let container = Container::columnar([
            ("s", Node::structure([("x", Node::scalar(1i64))])),
            ("s.x", Node::scalar(2i64)),
        ]);
        let sink = MemorySink::new();
        let records = analyze_container(&container, &sink, Limits::default()).unwrap();
        assert_eq!(variables(&records), vec!["s", "s.x"]);
        assert_eq!(records[1].value(), Some("1"));
    }

    #[test]
    fn test_same_base_name_gets_distinct_artifacts() {
        // "c" and "c_bar" collide once "c" renders categorically.
        let container = Container::columnar([
            ("c", Node::int_vector(vec![1, 1, 2])),
            ("c_bar", Node::vector(twenty_five())),
        ]);
        let sink = MemorySink::new();
        let records = analyze_container(&container, &sink, Limits::default()).unwrap();
        assert_eq!(sink.names(), vec!["c_bar", "c_bar_2"]);
        assert_eq!(records[1].artifact().unwrap().local_path, "c_bar_2");
    }

    #[test]
    fn test_names_equal_after_sanitizing_get_distinct_files() {
        let container = Container::columnar([
            ("a b", Node::vector(twenty_five())),
            ("a_b", Node::vector(twenty_five())),
        ]);

        let sink = MemorySink::new();
        analyze_container(&container, &sink, Limits::default()).unwrap();
        assert_eq!(sink.names(), vec!["a_b", "a_b_2"]);

        let tmp = tempfile::tempdir().unwrap();
        let svg = crate::render::svg::SvgSink::new(tmp.path(), "/static/images");
        let records = analyze_container(&container, &svg, Limits::default()).unwrap();
        assert_eq!(variables(&records), vec!["a b", "a_b"]);
        let first = &records[0].artifact().unwrap().local_path;
        let second = &records[1].artifact().unwrap().local_path;
        assert_ne!(first, second);
        assert!(std::path::Path::new(first).exists());
        assert!(std::path::Path::new(second).exists());
    }
}
