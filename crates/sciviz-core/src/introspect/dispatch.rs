//! Rendering dispatcher: picks one recipe per classified leaf, persists the
//! chart through the sink, and builds the result record.

use std::collections::HashSet;

use ndarray::{ArrayViewD, Axis, Ix2};
use tracing::debug;

use crate::container::node::{format_float, SparseMatrix};
use crate::errors::{SciVizError, SciVizResult};
use crate::introspect::classify::Leaf;
use crate::introspect::governor::{Admission, Limits, MAX_RENDER_RANK};
use crate::introspect::stats::{summarize, value_counts};
use crate::models::{ArtifactRef, DtypeCategory, ResultRecord, ShapeDisplay, Stats};
use crate::render::chart::{BarPanel, Chart, Series};
use crate::render::palette::{Palette, BLUE, ORANGE, SKY_BLUE};
use crate::render::sink::{sanitize_name, ArtifactSink};

/// Below this many distinct values a rank-1 array is treated as categorical.
pub const CATEGORICAL_MAX_DISTINCT: usize = 20;

pub struct Dispatcher<'s> {
    sink: &'s dyn ArtifactSink,
    limits: Limits,
    used_names: HashSet<String>,
}

impl<'s> Dispatcher<'s> {
    pub fn new(sink: &'s dyn ArtifactSink, limits: Limits) -> Self {
        Self {
            sink,
            limits,
            used_names: HashSet::new(),
        }
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Artifact file stems are unique within one traversal. Names are
    /// compared after sanitizing, since that is what the sink writes.
    fn unique_name(&mut self, base: &str) -> String {
        let stem = sanitize_name(base);
        if self.used_names.insert(stem.clone()) {
            return stem;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{stem}_{n}");
            if self.used_names.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }

    fn persist(&mut self, chart: Chart, base: &str) -> SciVizResult<ArtifactRef> {
        let name = self.unique_name(base);
        debug!(name = %name, recipe = chart.recipe(), "rendering chart");
        self.sink.persist(&chart, &name)
    }

    /// Render one leaf. Placeholders come back as text records; every chart
    /// is persisted before this returns.
    pub fn render(&mut self, path: &str, leaf: Leaf<'_>) -> SciVizResult<Vec<ResultRecord>> {
        match leaf {
            Leaf::Scalar(value) => Ok(vec![ResultRecord::text(path, value.to_string())]),
            Leaf::Complex { re, im } => self.render_complex(path, re, im),
            Leaf::Numeric { data, dtype } => self.render_numeric(path, data, dtype),
            Leaf::Text(data) => Ok(vec![non_numeric(path, data.shape(), "str")]),
            Leaf::Objects { shape, len } => Ok(vec![objects_placeholder(path, &shape, len)]),
            Leaf::Sparse(matrix) => self.render_sparse(path, matrix),
        }
    }

    fn render_complex(
        &mut self,
        path: &str,
        re: ArrayViewD<'_, f64>,
        im: ArrayViewD<'_, f64>,
    ) -> SciVizResult<Vec<ResultRecord>> {
        if self.limits.admit(re.len()) == Admission::Oversize {
            return Ok(vec![oversize(path, re.shape())]);
        }
        let variable = format!("{path} (Complex)");
        let chart = Chart::Line {
            title: variable.clone(),
            x_label: None,
            series: vec![
                Series {
                    label: "Real Part".into(),
                    values: re.iter().copied().collect(),
                    color: BLUE,
                    dashed: false,
                },
                Series {
                    label: "Imag Part".into(),
                    values: im.iter().copied().collect(),
                    color: ORANGE,
                    dashed: true,
                },
            ],
        };
        let artifact = self.persist(chart, &format!("{path}_complex"))?;
        Ok(vec![ResultRecord::chart(variable, artifact, None)])
    }

    fn render_numeric(
        &mut self,
        path: &str,
        data: ArrayViewD<'_, f64>,
        dtype: DtypeCategory,
    ) -> SciVizResult<Vec<ResultRecord>> {
        if self.limits.admit(data.len()) == Admission::Oversize {
            return Ok(vec![oversize(path, data.shape())]);
        }
        if data.ndim() > MAX_RENDER_RANK {
            return Ok(vec![high_rank(path, data.shape())]);
        }
        if !dtype.is_numeric() {
            return Ok(vec![non_numeric(path, data.shape(), dtype.dtype_name())]);
        }
        if data.is_empty() {
            return Ok(vec![ResultRecord::text(
                path,
                format!("{path} is empty (shape={})", ShapeDisplay(data.shape())),
            )]);
        }

        match data.ndim() {
            1 => self.render_vector(path, data, dtype).map(|r| vec![r]),
            2 => {
                let grid = data
                    .into_dimensionality::<Ix2>()
                    .map_err(|e| SciVizError::InvalidValue(e.to_string()))?;
                self.render_grid(path, grid).map(|r| vec![r])
            }
            _ => self.render_slices(path, data),
        }
    }

    fn render_vector(
        &mut self,
        path: &str,
        data: ArrayViewD<'_, f64>,
        dtype: DtypeCategory,
    ) -> SciVizResult<ResultRecord> {
        let counts = value_counts(data.iter());
        if counts.len() < CATEGORICAL_MAX_DISTINCT && counts.len() < data.len() {
            let chart = Chart::Bar(BarPanel {
                title: format!("{path} - Bar Chart (Categorical)"),
                labels: counts
                    .iter()
                    .map(|(v, _)| category_label(*v, dtype))
                    .collect(),
                heights: counts.iter().map(|(_, n)| *n as f64).collect(),
                colors: vec![SKY_BLUE],
            });
            let artifact = self.persist(chart, &format!("{path}_bar"))?;
            return Ok(ResultRecord::chart(path, artifact, None));
        }

        let stats = summarize(data.iter());
        let chart = Chart::Line {
            title: format!("{path} - 1D Plot"),
            x_label: stats.as_ref().map(Stats::label),
            series: vec![Series {
                label: path.to_string(),
                values: data.iter().copied().collect(),
                color: BLUE,
                dashed: false,
            }],
        };
        let artifact = self.persist(chart, path)?;
        Ok(ResultRecord::chart(path, artifact, stats))
    }

    fn render_grid(
        &mut self,
        path: &str,
        grid: ndarray::ArrayView2<'_, f64>,
    ) -> SciVizResult<ResultRecord> {
        // Stats always describe the full array, not the decimated view.
        let stats = summarize(grid.iter());
        let (rows, cols) = grid.dim();
        let shown = self.limits.subsample(grid);

        let chart = if (cols == 2 || cols == 3) && rows > 1 {
            if cols == 2 {
                Chart::Scatter2d {
                    title: format!("{path} - 2D Scatter"),
                    points: shown.outer_iter().map(|row| (row[0], row[1])).collect(),
                }
            } else {
                Chart::Scatter3d {
                    title: format!("{path} - 3D Scatter"),
                    points: shown
                        .outer_iter()
                        .map(|row| (row[0], row[1], row[2]))
                        .collect(),
                }
            }
        } else {
            Chart::Heatmap {
                title: format!("{path} - 2D Heatmap"),
                grid: shown.to_owned(),
                palette: Palette::Viridis,
                x_label: None,
                y_label: None,
            }
        };
        let artifact = self.persist(chart, path)?;
        Ok(ResultRecord::chart(path, artifact, stats))
    }

    fn render_slices(
        &mut self,
        path: &str,
        data: ArrayViewD<'_, f64>,
    ) -> SciVizResult<Vec<ResultRecord>> {
        let depth = self.limits.slice_count(data.len_of(Axis(0)));
        let mut records = Vec::with_capacity(depth);
        for i in 0..depth {
            let slice = data
                .index_axis(Axis(0), i)
                .into_dimensionality::<Ix2>()
                .map_err(|e| SciVizError::InvalidValue(e.to_string()))?;
            let variable = format!("{path} (slice {i})");
            let chart = Chart::Heatmap {
                title: variable.clone(),
                grid: self.limits.subsample(slice).to_owned(),
                palette: Palette::Viridis,
                x_label: None,
                y_label: None,
            };
            let artifact = self.persist(chart, &format!("{path}_slice_{i}"))?;
            records.push(ResultRecord::chart(variable, artifact, None));
        }
        Ok(records)
    }

    fn render_sparse(
        &mut self,
        path: &str,
        matrix: &SparseMatrix,
    ) -> SciVizResult<Vec<ResultRecord>> {
        let (rows, cols) = matrix.shape();
        if self.limits.admit(rows.saturating_mul(cols)) == Admission::Oversize {
            return Ok(vec![oversize(path, &[rows, cols])]);
        }
        let dense = matrix.to_dense();
        let chart = Chart::Heatmap {
            title: format!("{path} - Sparse Heatmap"),
            grid: self.limits.subsample(dense.view()).to_owned(),
            palette: Palette::Viridis,
            x_label: None,
            y_label: None,
        };
        let artifact = self.persist(chart, path)?;
        Ok(vec![ResultRecord::chart(path, artifact, None)])
    }
}

fn category_label(value: f64, dtype: DtypeCategory) -> String {
    match dtype {
        DtypeCategory::Integer if value.is_finite() => format!("{}", value as i64),
        _ => format_float(value),
    }
}

fn oversize(path: &str, shape: &[usize]) -> ResultRecord {
    ResultRecord::text(
        path,
        format!("{path} too large: {}. Skipping.", ShapeDisplay(shape)),
    )
}

fn high_rank(path: &str, shape: &[usize]) -> ResultRecord {
    ResultRecord::text(
        path,
        format!(
            "{path} has {} dimensions (shape={}). Skipping.",
            shape.len(),
            ShapeDisplay(shape)
        ),
    )
}

fn non_numeric(path: &str, shape: &[usize], dtype: &str) -> ResultRecord {
    if shape.len() > MAX_RENDER_RANK {
        return high_rank(path, shape);
    }
    ResultRecord::text(
        path,
        format!("{path} is {}D but not numeric (dtype={dtype})", shape.len()),
    )
}

fn objects_placeholder(path: &str, shape: &[usize], len: usize) -> ResultRecord {
    match shape.len() {
        0 | 1 => ResultRecord::text(
            path,
            format!("{path} is an object/Cell array of length {len}"),
        ),
        2 => ResultRecord::text(
            path,
            format!("{path} is a 2D object array (cell array?). Skipping."),
        ),
        _ => non_numeric(path, shape, "object"),
    }
}
