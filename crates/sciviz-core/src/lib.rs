//! sciviz core library: automatic visualization of decoded scientific data
//! containers and event-camera recordings.
//!
//! A decoded container is walked depth-first; every leaf is classified,
//! passed through the size governor and turned into either a chart
//! (persisted through an [`render::ArtifactSink`]) or a textual placeholder.
//! Event recordings go through a fixed five-chart pipeline instead. The crate
//! can be built as a Python extension module (`_sciviz_core`, feature
//! `python`) and also ships the `sciviz` command-line driver.

pub mod config;
pub mod container;
pub mod errors;
pub mod events;
pub mod introspect;
pub mod models;
pub mod render;

#[cfg(feature = "python")]
mod python;

use crate::config::SciVizConfig;
use crate::container::adapter::Container;
use crate::errors::SciVizResult;
use crate::events::EventSchema;
use crate::models::ResultRecord;
use crate::render::svg::SvgSink;

/// Analyze a JSON-encoded container, writing SVG artifacts as configured.
pub fn analyze_container_json(
    container_json: &str,
    config: &SciVizConfig,
) -> SciVizResult<Vec<ResultRecord>> {
    let container = Container::from_json(container_json)?;
    let sink = SvgSink::from_config(config);
    introspect::analyze_container(&container, &sink, config.limits)
}

/// Run the event pipeline over a JSON-encoded container. Without an explicit
/// schema the container format decides.
pub fn visualize_events_json(
    name: &str,
    container_json: &str,
    schema: Option<EventSchema>,
    config: &SciVizConfig,
) -> SciVizResult<Vec<ResultRecord>> {
    let container = Container::from_json(container_json)?;
    let schema = schema.unwrap_or_else(|| EventSchema::for_format(container.format()));
    let sink = SvgSink::from_config(config);
    events::visualize_events(name, &container, schema, &sink)
}

#[cfg(feature = "python")]
use pyo3::prelude::*;

// ---------------------------------------------------------------------------
// Top-level Python module: _sciviz_core
// ---------------------------------------------------------------------------

#[cfg(feature = "python")]
#[pymodule]
fn _sciviz_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // -- Governor limits ----------------------------------------------------
    m.add("MAX_ELEMENTS", introspect::governor::MAX_ELEMENTS)?;
    m.add("MAX_DIM", introspect::governor::MAX_DIM)?;
    m.add("MAX_SLICES", introspect::governor::MAX_SLICES)?;
    m.add("MAX_TRAVERSAL_DEPTH", introspect::governor::MAX_TRAVERSAL_DEPTH)?;
    m.add("NO_VALID_DATA", models::NO_VALID_DATA)?;

    // -- Entry points -------------------------------------------------------
    m.add_function(wrap_pyfunction!(python::analyze_container, m)?)?;
    m.add_function(wrap_pyfunction!(python::visualize_events, m)?)?;
    m.add_function(wrap_pyfunction!(python::sanitize_name, m)?)?;

    Ok(())
}
