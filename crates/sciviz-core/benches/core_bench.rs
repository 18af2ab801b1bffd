//! Criterion benchmarks for sciviz-core.
//!
//! Everything here runs against a `MemorySink`, so the numbers cover
//! classification, governing, chart construction and the event kernels but
//! not SVG drawing or disk I/O.
//!
//! ## Benchmark groups
//!
//! 1. **classify**: node classification and singleton-axis collapse.
//! 2. **governor**: stride subsampling of large grids.
//! 3. **walker**: full traversal of a synthetic container.
//! 4. **events**: the five-chart event pipeline at several table sizes.
//!
//! ## Running
//!
//! ```sh
//! cargo bench --manifest-path crates/sciviz-core/Cargo.toml
//! # Run only the event group:
//! cargo bench --manifest-path crates/sciviz-core/Cargo.toml -- events
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array2;

// The lib target is called `_sciviz_core` (matching the Python extension
// module name).
use _sciviz_core::container::adapter::Container;
use _sciviz_core::container::node::{ElementType, Node};
use _sciviz_core::events::{Event, EventTable, EventVizTool, Polarity, SensorDim};
use _sciviz_core::introspect::analyze_container;
use _sciviz_core::introspect::classify::classify;
use _sciviz_core::introspect::governor::Limits;
use _sciviz_core::render::sink::MemorySink;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn grid(rows: usize, cols: usize) -> Node {
    let data = (0..rows * cols).map(|i| (i % 997) as f64 * 0.5).collect();
    Node::array(ElementType::Float, vec![rows, cols], data).unwrap()
}

/// A container resembling a typical experiment file: scalars, signals,
/// images, a volume, and a couple of nested structs.
fn synthetic_container(n_signals: usize) -> Container {
    let mut entries = Vec::new();
    entries.push(("__header__".to_string(), Node::scalar("MATLAB 5.0 MAT-file")));
    entries.push(("fs".to_string(), Node::scalar(30_000i64)));
    for i in 0..n_signals {
        let signal: Vec<f64> = (0..4096).map(|t| ((t * (i + 1)) as f64 * 0.01).sin()).collect();
        entries.push((format!("ch{i}"), Node::vector(signal)));
    }
    entries.push(("labels".to_string(), Node::int_vector((0..5000).map(|i| i % 4).collect())));
    entries.push(("image".to_string(), grid(1024, 768)));
    entries.push((
        "volume".to_string(),
        Node::array(ElementType::Float, vec![8, 64, 64], vec![0.25; 8 * 64 * 64]).unwrap(),
    ));
    entries.push((
        "meta".to_string(),
        Node::structure([
            ("subject", Node::scalar("m042")),
            ("positions", grid(2000, 3)),
            ("trial", Node::structure([("onset", Node::vector(vec![0.1, 0.7, 1.3]))])),
        ]),
    ));
    Container::columnar(entries)
}

fn event_table(n: usize) -> EventTable {
    EventTable::from_events((0..n).map(|i| Event {
        t: i as f64 * 1e-4,
        x: (i * 7 % 128) as i64,
        y: (i * 13 % 128) as i64,
        p: if i % 3 == 0 { Polarity::Off } else { Polarity::On },
    }))
}

// ---------------------------------------------------------------------------
// 1. Classification
// ---------------------------------------------------------------------------

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");

    let scalar = Node::scalar(3.5);
    let squeezable =
        Node::array(ElementType::Float, vec![1, 4096, 1], vec![1.0; 4096]).unwrap();
    let nested = Node::structure([("a", Node::scalar(1i64)), ("b", grid(10, 10))]);

    group.bench_function("scalar", |b| b.iter(|| black_box(classify(black_box(&scalar)).summary())));
    group.bench_function("singleton_axes", |b| {
        b.iter(|| black_box(classify(black_box(&squeezable)).summary()))
    });
    group.bench_function("struct", |b| b.iter(|| black_box(classify(black_box(&nested)).summary())));

    group.finish();
}

// ---------------------------------------------------------------------------
// 2. Governor
// ---------------------------------------------------------------------------

fn bench_governor(c: &mut Criterion) {
    let mut group = c.benchmark_group("governor");
    let limits = Limits::default();

    for &side in &[150usize, 1000, 4000] {
        let data = Array2::<f64>::from_shape_fn((side, side / 2), |(r, c)| (r + c) as f64);
        group.bench_with_input(BenchmarkId::new("subsample_owned", side), &data, |b, data| {
            b.iter(|| black_box(limits.subsample(data.view()).to_owned()))
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// 3. Walker
// ---------------------------------------------------------------------------

fn bench_walker(c: &mut Criterion) {
    let mut group = c.benchmark_group("walker");
    group.sample_size(20);

    for &n in &[4usize, 32] {
        let container = synthetic_container(n);
        group.bench_with_input(BenchmarkId::new("analyze_container", n), &container, |b, root| {
            b.iter(|| {
                let sink = MemorySink::ignoring_collisions();
                black_box(analyze_container(root, &sink, Limits::default()).unwrap())
            })
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// 4. Event pipeline
// ---------------------------------------------------------------------------

fn bench_events(c: &mut Criterion) {
    let mut group = c.benchmark_group("events");
    group.sample_size(20);

    for &n in &[1_000usize, 20_000] {
        let tool = EventVizTool::new("bench.h5", event_table(n), SensorDim::FLAT_DEFAULT).unwrap();
        group.bench_with_input(BenchmarkId::new("run", n), &tool, |b, tool| {
            b.iter(|| {
                let sink = MemorySink::ignoring_collisions();
                black_box(tool.run(&sink).unwrap())
            })
        });
        group.bench_with_input(BenchmarkId::new("on_off_hexbin", n), &tool, |b, tool| {
            b.iter(|| black_box(tool.on_off_map_chart()))
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Register all benchmark groups
// ---------------------------------------------------------------------------

criterion_group!(benches, bench_classify, bench_governor, bench_walker, bench_events);
criterion_main!(benches);
