//! Python-exposed entry points. Results cross the boundary as JSON and are
//! decoded with the `json` module, so callers receive plain lists of dicts.

use pyo3::prelude::*;

use crate::config::SciVizConfig;
use crate::events::EventSchema;
use crate::models::ResultRecord;

fn config_with(output_dir: Option<&str>, public_base: Option<&str>) -> SciVizConfig {
    let mut config = SciVizConfig::from_env();
    if let Some(dir) = output_dir {
        config.output_dir = dir.into();
    }
    if let Some(base) = public_base {
        config.public_base = base.to_string();
    }
    config
}

fn records_to_py(py: Python<'_>, records: &[ResultRecord]) -> PyResult<PyObject> {
    let json_str = serde_json::to_string(records)
        .map_err(|e| pyo3::exceptions::PyRuntimeError::new_err(e.to_string()))?;
    let json_module = py.import("json")?;
    json_module
        .call_method1("loads", (json_str,))
        .map(|o| o.into())
}

#[pyfunction]
#[pyo3(signature = (container_json, output_dir=None, public_base=None))]
pub fn analyze_container(
    py: Python<'_>,
    container_json: &str,
    output_dir: Option<&str>,
    public_base: Option<&str>,
) -> PyResult<PyObject> {
    let config = config_with(output_dir, public_base);
    let records = py.allow_threads(|| crate::analyze_container_json(container_json, &config))?;
    records_to_py(py, &records)
}

#[pyfunction]
#[pyo3(signature = (name, container_json, schema=None, output_dir=None, public_base=None))]
pub fn visualize_events(
    py: Python<'_>,
    name: &str,
    container_json: &str,
    schema: Option<&str>,
    output_dir: Option<&str>,
    public_base: Option<&str>,
) -> PyResult<PyObject> {
    let schema = schema.map(str::parse::<EventSchema>).transpose()?;
    let config = config_with(output_dir, public_base);
    let records = py.allow_threads(|| {
        crate::visualize_events_json(name, container_json, schema, &config)
    })?;
    records_to_py(py, &records)
}

#[pyfunction]
pub fn sanitize_name(name: &str) -> String {
    crate::render::sink::sanitize_name(name)
}
