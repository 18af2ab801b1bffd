//! Event tables and sensor geometry.

use crate::errors::{SciVizError, SciVizResult};
use crate::introspect::governor::MAX_SENSOR_PIXELS;

/// Event polarity after normalization; raw OFF may be encoded as 0 or -1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Polarity {
    Off,
    On,
}

impl Polarity {
    pub fn from_raw(raw: f64) -> SciVizResult<Self> {
        if raw == 1.0 {
            Ok(Polarity::On)
        } else if raw == 0.0 || raw == -1.0 {
            Ok(Polarity::Off)
        } else {
            Err(SciVizError::InvalidValue(format!(
                "polarity must be -1, 0 or 1, got {raw}"
            )))
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Polarity::Off => 0.0,
            Polarity::On => 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Event {
    pub t: f64,
    pub x: i64,
    pub y: i64,
    pub p: Polarity,
}

/// Sensor extent in pixels; valid coordinates are `0..x_max` by `0..y_max`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SensorDim {
    pub x_max: usize,
    pub y_max: usize,
}

impl SensorDim {
    pub const FLAT_DEFAULT: SensorDim = SensorDim {
        x_max: 128,
        y_max: 128,
    };

    pub fn new(x_max: usize, y_max: usize) -> Self {
        Self { x_max, y_max }
    }

    /// Like `new`, but rejects sensors too large to hold an intensity grid.
    pub fn checked(x_max: usize, y_max: usize) -> SciVizResult<Self> {
        match x_max.checked_mul(y_max) {
            Some(pixels) if pixels <= MAX_SENSOR_PIXELS => Ok(Self::new(x_max, y_max)),
            _ => Err(SciVizError::InvalidValue(format!(
                "sensor {x_max}x{y_max} exceeds {MAX_SENSOR_PIXELS} pixels"
            ))),
        }
    }

    /// Parse one decoded dimension value (truncated toward zero).
    pub fn parse_dim(key: &str, raw: f64) -> SciVizResult<usize> {
        if !raw.is_finite() || raw < 1.0 {
            return Err(SciVizError::InvalidValue(format!(
                "{key} must be a positive number, got {raw}"
            )));
        }
        Ok(raw.trunc() as usize)
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as u64) < self.x_max as u64 && (y as u64) < self.y_max as u64
    }
}

/// Column-oriented event table with polarity normalized to {Off, On}.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventTable {
    t: Vec<f64>,
    x: Vec<i64>,
    y: Vec<i64>,
    p: Vec<Polarity>,
}

fn pixel(column: &str, raw: f64) -> SciVizResult<i64> {
    if !raw.is_finite() || raw.fract() != 0.0 {
        return Err(SciVizError::InvalidValue(format!(
            "{column} coordinate must be an integer, got {raw}"
        )));
    }
    Ok(raw as i64)
}

impl EventTable {
    /// Build a table from raw decoded columns. Columns must have equal length,
    /// coordinates must be integral and polarity one of -1, 0, 1.
    pub fn from_columns(t: Vec<f64>, x: &[f64], y: &[f64], p: &[f64]) -> SciVizResult<Self> {
        let n = t.len();
        if x.len() != n || y.len() != n || p.len() != n {
            return Err(SciVizError::InvalidValue(format!(
                "event columns differ in length: t={n}, x={}, y={}, p={}",
                x.len(),
                y.len(),
                p.len()
            )));
        }
        Ok(Self {
            t,
            x: x.iter().map(|v| pixel("x", *v)).collect::<SciVizResult<_>>()?,
            y: y.iter().map(|v| pixel("y", *v)).collect::<SciVizResult<_>>()?,
            p: p.iter().map(|v| Polarity::from_raw(*v)).collect::<SciVizResult<_>>()?,
        })
    }

    pub fn from_events<I: IntoIterator<Item = Event>>(events: I) -> Self {
        let mut table = Self::default();
        for e in events {
            table.t.push(e.t);
            table.x.push(e.x);
            table.y.push(e.y);
            table.p.push(e.p);
        }
        table
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.t
    }

    pub fn polarities(&self) -> &[Polarity] {
        &self.p
    }

    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        (0..self.len()).map(move |i| Event {
            t: self.t[i],
            x: self.x[i],
            y: self.y[i],
            p: self.p[i],
        })
    }

    pub fn count(&self, polarity: Polarity) -> usize {
        self.p.iter().filter(|p| **p == polarity).count()
    }

    /// Times of the events with the given polarity.
    pub fn times_where(&self, polarity: Polarity) -> Vec<f64> {
        self.iter().filter(|e| e.p == polarity).map(|e| e.t).collect()
    }

    /// Coordinates of the events with the given polarity.
    pub fn coords_where(&self, polarity: Polarity) -> Vec<(f64, f64)> {
        self.iter()
            .filter(|e| e.p == polarity)
            .map(|e| (e.x as f64, e.y as f64))
            .collect()
    }
}
