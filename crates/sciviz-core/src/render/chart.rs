//! Backend-agnostic chart descriptions produced by the rendering recipes.

use ndarray::Array2;

use crate::render::palette::{Palette, Rgb};

#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub label: String,
    pub values: Vec<f64>,
    pub color: Rgb,
    pub dashed: bool,
}

/// A curve over explicit x positions, drawn filled down to zero.
#[derive(Clone, Debug, PartialEq)]
pub struct Curve {
    pub label: String,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub color: Rgb,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HexCell {
    pub center: (f64, f64),
    pub count: usize,
}

/// Hexagonal binning result; only non-empty cells are kept.
#[derive(Clone, Debug, PartialEq)]
pub struct Hexbin {
    /// Horizontal and vertical lattice spacing.
    pub spacing: (f64, f64),
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub cells: Vec<HexCell>,
}

impl Hexbin {
    pub fn total(&self) -> usize {
        self.cells.iter().map(|c| c.count).sum()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HexPanel {
    pub title: String,
    pub bins: Hexbin,
    pub palette: Palette,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BarPanel {
    pub title: String,
    pub labels: Vec<String>,
    pub heights: Vec<f64>,
    pub colors: Vec<Rgb>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Chart {
    /// Categorical bars, one per label.
    Bar(BarPanel),
    /// Binned counts over numeric edges (`edges.len() == counts.len() + 1`).
    Histogram {
        title: String,
        edges: Vec<f64>,
        counts: Vec<usize>,
    },
    /// One or more series drawn over their index.
    Line {
        title: String,
        x_label: Option<String>,
        series: Vec<Series>,
    },
    Scatter2d {
        title: String,
        points: Vec<(f64, f64)>,
    },
    Scatter3d {
        title: String,
        points: Vec<(f64, f64, f64)>,
    },
    /// Grid drawn with row 0 at the top.
    Heatmap {
        title: String,
        grid: Array2<f64>,
        palette: Palette,
        x_label: Option<String>,
        y_label: Option<String>,
    },
    Density {
        title: String,
        curves: Vec<Curve>,
    },
    HexPanels(Vec<HexPanel>),
    BarPanels(Vec<BarPanel>),
}

impl Chart {
    pub fn title(&self) -> &str {
        match self {
            Chart::Bar(panel) => &panel.title,
            Chart::Histogram { title, .. }
            | Chart::Line { title, .. }
            | Chart::Scatter2d { title, .. }
            | Chart::Scatter3d { title, .. }
            | Chart::Heatmap { title, .. }
            | Chart::Density { title, .. } => title,
            Chart::HexPanels(panels) => panels.first().map(|p| p.title.as_str()).unwrap_or(""),
            Chart::BarPanels(panels) => panels.first().map(|p| p.title.as_str()).unwrap_or(""),
        }
    }

    /// Short recipe name, used in logs and assertions.
    pub fn recipe(&self) -> &'static str {
        match self {
            Chart::Bar(_) => "bar",
            Chart::Histogram { .. } => "histogram",
            Chart::Line { .. } => "line",
            Chart::Scatter2d { .. } => "scatter2d",
            Chart::Scatter3d { .. } => "scatter3d",
            Chart::Heatmap { .. } => "heatmap",
            Chart::Density { .. } => "density",
            Chart::HexPanels(_) => "hexbin",
            Chart::BarPanels(_) => "bar_panels",
        }
    }
}
