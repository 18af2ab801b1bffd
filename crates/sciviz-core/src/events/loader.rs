//! Event loading from decoded containers.

use std::path::Path;
use std::str::FromStr;

use ndarray::Axis;
use tracing::debug;

use crate::container::adapter::{Container, ContainerFormat};
use crate::container::node::{Fields, Node, Scalar};
use crate::errors::{SciVizError, SciVizResult};
use crate::events::table::{EventTable, SensorDim};
use crate::models::ShapeDisplay;

/// Microseconds per second; flat tables store timestamps in µs.
const FLAT_TIME_SCALE: f64 = 1e6;

/// Which of the two supported event layouts a container uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventSchema {
    /// `TD` struct with `x`, `y`, `p`, `ts` plus `xMax`/`yMax` scalars.
    Struct,
    /// `events` dataset of shape (N, 4): `[t_us, x, y, p]`, 128x128 sensor.
    FlatTable,
}

impl EventSchema {
    pub fn for_format(format: ContainerFormat) -> Self {
        match format {
            ContainerFormat::ColumnarStruct => EventSchema::Struct,
            ContainerFormat::HierarchicalGroup => EventSchema::FlatTable,
        }
    }

    pub fn from_extension(path: &Path) -> Option<Self> {
        ContainerFormat::from_extension(path).map(Self::for_format)
    }
}

impl FromStr for EventSchema {
    type Err = SciVizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "struct" | "mat" => Ok(EventSchema::Struct),
            "flat" | "table" | "h5" => Ok(EventSchema::FlatTable),
            other => Err(SciVizError::InvalidValue(format!(
                "unknown event schema: {other}"
            ))),
        }
    }
}

/// A loaded event recording.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedEvents {
    pub name: String,
    pub table: EventTable,
    pub sensor: SensorDim,
}

fn require<'a>(fields: &'a Fields, key: &str) -> SciVizResult<&'a Node> {
    fields
        .get(key)
        .ok_or_else(|| SciVizError::MissingKey(key.to_string()))
}

fn require_any<'a>(fields: &'a Fields, keys: &[&str]) -> SciVizResult<&'a Node> {
    keys.iter()
        .find_map(|k| fields.get(*k))
        .ok_or_else(|| SciVizError::MissingKey(keys.join("|")))
}

/// Flattened numeric contents of an array or numeric scalar.
fn numbers(key: &str, node: &Node) -> SciVizResult<Vec<f64>> {
    match node {
        Node::Array(array) => Ok(array.data().iter().copied().collect()),
        Node::Scalar { value } => match value {
            Scalar::Int(v) => Ok(vec![*v as f64]),
            Scalar::Float(v) => Ok(vec![*v]),
            Scalar::Bool(v) => Ok(vec![if *v { 1.0 } else { 0.0 }]),
            Scalar::Text(_) => Err(SciVizError::InvalidValue(format!("{key} is not numeric"))),
        },
        _ => Err(SciVizError::InvalidValue(format!("{key} is not numeric"))),
    }
}

fn dimension(fields: &Fields, key: &str) -> SciVizResult<usize> {
    let values = numbers(key, require(fields, key)?)?;
    let first = values
        .first()
        .copied()
        .ok_or_else(|| SciVizError::InvalidValue(format!("{key} is empty")))?;
    SensorDim::parse_dim(key, first)
}

fn load_struct(container: &Container) -> SciVizResult<(EventTable, SensorDim)> {
    let root = container.entries_map();
    let td = require(root, "TD")?
        .children()
        .ok_or_else(|| SciVizError::InvalidValue("TD is not a struct".into()))?;

    let x = numbers("x", require(td, "x")?)?;
    let y = numbers("y", require(td, "y")?)?;
    let p = numbers("p", require_any(td, &["p", "polarity"])?)?;
    let t = numbers("ts", require_any(td, &["ts", "t", "time"])?)?;
    let sensor = SensorDim::checked(dimension(root, "xMax")?, dimension(root, "yMax")?)?;

    Ok((EventTable::from_columns(t, &x, &y, &p)?, sensor))
}

fn load_flat(container: &Container) -> SciVizResult<(EventTable, SensorDim)> {
    let node = require(container.entries_map(), "events")?;
    let Node::Array(array) = node else {
        return Err(SciVizError::InvalidValue("events is not a numeric array".into()));
    };
    let data = array.data();
    if data.ndim() != 2 || data.len_of(Axis(1)) != 4 {
        return Err(SciVizError::InvalidValue(format!(
            "events must have shape (N, 4), got {}",
            ShapeDisplay(data.shape())
        )));
    }
    let column = |i: usize| -> Vec<f64> { data.index_axis(Axis(1), i).iter().copied().collect() };
    let t: Vec<f64> = column(0).into_iter().map(|us| us / FLAT_TIME_SCALE).collect();
    let table = EventTable::from_columns(t, &column(1), &column(2), &column(3))?;
    Ok((table, SensorDim::FLAT_DEFAULT))
}

/// Extract an event table from a decoded container.
///
/// Fails with `MissingKey` when a required entry is absent and with
/// `InvalidValue` when one is present but unusable.
pub fn load_events(
    name: &str,
    container: &Container,
    schema: EventSchema,
) -> SciVizResult<LoadedEvents> {
    let (table, sensor) = match schema {
        EventSchema::Struct => load_struct(container)?,
        EventSchema::FlatTable => load_flat(container)?,
    };
    debug!(
        name,
        events = table.len(),
        x_max = sensor.x_max,
        y_max = sensor.y_max,
        "loaded event table"
    );
    Ok(LoadedEvents {
        name: name.to_string(),
        table,
        sensor,
    })
}
