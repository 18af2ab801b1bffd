pub mod chart;
pub mod palette;
pub mod sink;
pub mod svg;

pub use chart::Chart;
pub use sink::{ArtifactSink, MemorySink};
pub use svg::SvgSink;
