pub mod analysis;
pub mod loader;
pub mod table;
pub mod tool;

pub use loader::{load_events, EventSchema, LoadedEvents};
pub use table::{Event, EventTable, Polarity, SensorDim};
pub use tool::EventVizTool;

use crate::container::adapter::Container;
use crate::errors::SciVizResult;
use crate::models::ResultRecord;
use crate::render::sink::ArtifactSink;

/// Load an event recording from a container and render all five charts.
pub fn visualize_events(
    name: &str,
    container: &Container,
    schema: EventSchema,
    sink: &dyn ArtifactSink,
) -> SciVizResult<Vec<ResultRecord>> {
    let loaded = load_events(name, container, schema)?;
    EventVizTool::from_loaded(loaded)?.run(sink)
}
