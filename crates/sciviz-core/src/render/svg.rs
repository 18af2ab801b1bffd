//! SVG rendering through plotters, plus the filesystem-backed sink.

use std::error::Error;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::debug;

use crate::config::SciVizConfig;
use crate::errors::{SciVizError, SciVizResult};
use crate::models::ArtifactRef;
use crate::render::chart::{BarPanel, Chart, Curve, HexPanel, Series};
use crate::render::palette::{Palette, Rgb, BLUE, SKY_BLUE};
use crate::render::sink::{new_request_id, sanitize_name, ArtifactSink};

type DrawResult<T> = Result<T, Box<dyn Error>>;
type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

const SIZE: (u32, u32) = (800, 600);
const WIDE: (u32, u32) = (1200, 480);
const CAPTION_FONT: (&str, u32) = ("sans-serif", 20);

fn rgb(c: Rgb) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

fn bounds<I: IntoIterator<Item = f64>>(values: I) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo.is_finite() && hi.is_finite() {
        (lo, hi)
    } else {
        (0.0, 1.0)
    }
}

fn padded((lo, hi): (f64, f64)) -> Range<f64> {
    if hi > lo {
        let pad = (hi - lo) * 0.05;
        (lo - pad)..(hi + pad)
    } else {
        (lo - 0.5)..(hi + 0.5)
    }
}

/// Render one chart into an SVG file. The drawing area lives only for the
/// duration of this call.
pub fn draw_chart(chart: &Chart, path: &Path) -> DrawResult<()> {
    let size = match chart {
        Chart::HexPanels(_) | Chart::BarPanels(_) => WIDE,
        _ => SIZE,
    };
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    match chart {
        Chart::Bar(panel) => draw_bars(&root, panel)?,
        Chart::Histogram {
            title,
            edges,
            counts,
        } => draw_histogram(&root, title, edges, counts)?,
        Chart::Line {
            title,
            x_label,
            series,
        } => draw_lines(&root, title, x_label.as_deref(), series)?,
        Chart::Scatter2d { title, points } => draw_scatter2d(&root, title, points)?,
        Chart::Scatter3d { title, points } => draw_scatter3d(&root, title, points)?,
        Chart::Heatmap {
            title,
            grid,
            palette,
            x_label,
            y_label,
        } => draw_heatmap(&root, title, grid, *palette, x_label.as_deref(), y_label.as_deref())?,
        Chart::Density { title, curves } => draw_density(&root, title, curves)?,
        Chart::HexPanels(panels) => {
            let areas = root.split_evenly((1, panels.len().max(1)));
            for (area, panel) in areas.iter().zip(panels) {
                draw_hexbin(area, panel)?;
            }
        }
        Chart::BarPanels(panels) => {
            let areas = root.split_evenly((1, panels.len().max(1)));
            for (area, panel) in areas.iter().zip(panels) {
                draw_bars(area, panel)?;
            }
        }
    }

    root.present()?;
    Ok(())
}

fn draw_bars(area: &Area<'_>, panel: &BarPanel) -> DrawResult<()> {
    let n = panel.heights.len().max(1);
    let top = panel
        .heights
        .iter()
        .copied()
        .filter(|h| h.is_finite())
        .fold(0.0, f64::max)
        .max(1.0)
        * 1.1;
    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, CAPTION_FONT)
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..top)?;

    let labels = &panel.labels;
    let label_at = |x: &f64| {
        let i = x.round();
        if (x - i).abs() < 1e-6 && i >= 0.0 {
            labels.get(i as usize).cloned().unwrap_or_default()
        } else {
            String::new()
        }
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&label_at)
        .y_desc("Count")
        .draw()?;

    chart.draw_series(panel.heights.iter().enumerate().map(|(i, &h)| {
        let color = panel
            .colors
            .get(i)
            .or(panel.colors.first())
            .copied()
            .unwrap_or(SKY_BLUE);
        Rectangle::new([(i as f64 - 0.4, 0.0), (i as f64 + 0.4, h)], rgb(color).filled())
    }))?;
    Ok(())
}

fn draw_histogram(area: &Area<'_>, title: &str, edges: &[f64], counts: &[usize]) -> DrawResult<()> {
    let lo = edges.first().copied().unwrap_or(0.0);
    let hi = edges.last().copied().unwrap_or(1.0);
    let top = counts.iter().copied().max().unwrap_or(0).max(1) as f64 * 1.1;
    let mut chart = ChartBuilder::on(area)
        .caption(title, CAPTION_FONT)
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .build_cartesian_2d(padded((lo, hi)), 0f64..top)?;
    chart.configure_mesh().y_desc("Count").draw()?;

    let bars: Vec<[(f64, f64); 2]> = counts
        .iter()
        .zip(edges.windows(2))
        .map(|(&c, w)| [(w[0], 0.0), (w[1], c as f64)])
        .collect();
    chart.draw_series(
        bars.iter()
            .map(|corners| Rectangle::new(*corners, rgb(BLUE).mix(0.7).filled())),
    )?;
    chart.draw_series(
        bars.iter()
            .map(|corners| Rectangle::new(*corners, BLACK.stroke_width(1))),
    )?;
    Ok(())
}

fn draw_lines(
    area: &Area<'_>,
    title: &str,
    x_label: Option<&str>,
    series: &[Series],
) -> DrawResult<()> {
    let n = series.iter().map(|s| s.values.len()).max().unwrap_or(0).max(2);
    let y = bounds(series.iter().flat_map(|s| s.values.iter().copied()));
    let mut chart = ChartBuilder::on(area)
        .caption(title, CAPTION_FONT)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..(n - 1) as f64, padded(y))?;
    {
        let mut mesh = chart.configure_mesh();
        if let Some(label) = x_label {
            mesh.x_desc(label);
        }
        mesh.draw()?;
    }

    for s in series {
        let color = rgb(s.color);
        let points: Vec<(f64, f64)> = s
            .values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, &v)| (i as f64, v))
            .collect();
        let anno = if s.dashed {
            chart.draw_series(
                points
                    .windows(2)
                    .step_by(2)
                    .map(|w| PathElement::new(vec![w[0], w[1]], color.stroke_width(2))),
            )?
        } else {
            chart.draw_series(LineSeries::new(points, color.stroke_width(2)))?
        };
        anno.label(s.label.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    if series.len() > 1 {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }
    Ok(())
}

fn draw_scatter2d(area: &Area<'_>, title: &str, points: &[(f64, f64)]) -> DrawResult<()> {
    let x = bounds(points.iter().map(|p| p.0));
    let y = bounds(points.iter().map(|p| p.1));
    let mut chart = ChartBuilder::on(area)
        .caption(title, CAPTION_FONT)
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .build_cartesian_2d(padded(x), padded(y))?;
    chart.configure_mesh().draw()?;
    chart.draw_series(
        points
            .iter()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .map(|&(x, y)| Circle::new((x, y), 3, rgb(BLUE).mix(0.7).filled())),
    )?;
    Ok(())
}

fn draw_scatter3d(area: &Area<'_>, title: &str, points: &[(f64, f64, f64)]) -> DrawResult<()> {
    let x = bounds(points.iter().map(|p| p.0));
    let y = bounds(points.iter().map(|p| p.1));
    let z = bounds(points.iter().map(|p| p.2));
    let mut chart = ChartBuilder::on(area)
        .caption(title, CAPTION_FONT)
        .margin(20)
        .build_cartesian_3d(padded(x), padded(y), padded(z))?;
    chart.configure_axes().draw()?;
    chart.draw_series(
        points
            .iter()
            .filter(|(x, y, z)| x.is_finite() && y.is_finite() && z.is_finite())
            .map(|&(x, y, z)| Circle::new((x, y, z), 3, rgb(BLUE).mix(0.7).filled())),
    )?;
    Ok(())
}

fn draw_heatmap(
    area: &Area<'_>,
    title: &str,
    grid: &Array2<f64>,
    palette: Palette,
    x_label: Option<&str>,
    y_label: Option<&str>,
) -> DrawResult<()> {
    let (rows, cols) = grid.dim();
    let (lo, hi) = bounds(grid.iter().copied());
    let height = rows.max(1) as f64;
    let mut chart = ChartBuilder::on(area)
        .caption(title, CAPTION_FONT)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..cols.max(1) as f64, 0f64..height)?;

    // Row 0 is drawn at the top.
    let row_label = |y: &f64| format!("{}", (height - y).round());
    {
        let mut mesh = chart.configure_mesh();
        mesh.disable_mesh().y_label_formatter(&row_label);
        if let Some(label) = x_label {
            mesh.x_desc(label);
        }
        if let Some(label) = y_label {
            mesh.y_desc(label);
        }
        mesh.draw()?;
    }

    chart.draw_series(grid.indexed_iter().map(|((r, c), &v)| {
        let top = height - r as f64;
        Rectangle::new(
            [(c as f64, top - 1.0), (c as f64 + 1.0, top)],
            rgb(palette.map(v, lo, hi)).filled(),
        )
    }))?;
    Ok(())
}

fn draw_density(area: &Area<'_>, title: &str, curves: &[Curve]) -> DrawResult<()> {
    let x = bounds(curves.iter().flat_map(|c| c.xs.iter().copied()));
    let top = curves
        .iter()
        .flat_map(|c| c.ys.iter().copied())
        .filter(|v| v.is_finite())
        .fold(0.0, f64::max);
    let top = if top > 0.0 { top * 1.1 } else { 1.0 };
    let mut chart = ChartBuilder::on(area)
        .caption(title, CAPTION_FONT)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(padded(x), 0f64..top)?;
    chart
        .configure_mesh()
        .x_desc("Time")
        .y_desc("Density")
        .draw()?;

    for curve in curves.iter().filter(|c| !c.xs.is_empty()) {
        let color = rgb(curve.color);
        let points: Vec<(f64, f64)> = curve.xs.iter().copied().zip(curve.ys.iter().copied()).collect();
        chart
            .draw_series(AreaSeries::new(points, 0.0, color.mix(0.3)).border_style(color))?
            .label(curve.label.clone())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.filled()));
    }
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

fn hexagon(center: (f64, f64), spacing: (f64, f64)) -> Vec<(f64, f64)> {
    let (cx, cy) = center;
    let (hx, hy) = (spacing.0 * 0.5, spacing.1 / 3.0);
    vec![
        (cx + hx, cy - hy * 0.5),
        (cx + hx, cy + hy * 0.5),
        (cx, cy + hy),
        (cx - hx, cy + hy * 0.5),
        (cx - hx, cy - hy * 0.5),
        (cx, cy - hy),
    ]
}

fn draw_hexbin(area: &Area<'_>, panel: &HexPanel) -> DrawResult<()> {
    let bins = &panel.bins;
    let pad = (bins.spacing.0, bins.spacing.1);
    let x = (bins.x_range.0 - pad.0)..(bins.x_range.1 + pad.0);
    let y = (bins.y_range.0 - pad.1)..(bins.y_range.1 + pad.1);
    let max_count = bins.cells.iter().map(|c| c.count).max().unwrap_or(1) as f64;
    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, CAPTION_FONT)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x, y)?;
    chart
        .configure_mesh()
        .x_desc("X Coordinate")
        .y_desc("Y Coordinate")
        .draw()?;
    chart.draw_series(bins.cells.iter().map(|cell| {
        let color = panel.palette.map(cell.count as f64, 0.0, max_count);
        Polygon::new(hexagon(cell.center, bins.spacing), rgb(color).filled())
    }))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Filesystem sink
// ---------------------------------------------------------------------------

/// Writes `<root>/<request id>/<name>.svg` and hands back the public and
/// local locations.
pub struct SvgSink {
    root: PathBuf,
    public_base: String,
    scope: Option<String>,
}

impl SvgSink {
    /// Flat sink: every artifact lands directly under `root`.
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into(),
            scope: None,
        }
    }

    /// Sink whose artifacts live in a fresh per-request directory.
    pub fn request_scoped(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into(),
            scope: Some(new_request_id()),
        }
    }

    pub fn from_config(config: &SciVizConfig) -> Self {
        if config.request_scoped {
            Self::request_scoped(&config.output_dir, config.public_base.clone())
        } else {
            Self::new(&config.output_dir, config.public_base.clone())
        }
    }

    pub fn directory(&self) -> PathBuf {
        match &self.scope {
            Some(id) => self.root.join(id),
            None => self.root.clone(),
        }
    }

    fn public_ref(&self, file: &str) -> String {
        let base = self.public_base.trim_end_matches('/');
        match &self.scope {
            Some(id) => format!("{base}/{id}/{file}"),
            None => format!("{base}/{file}"),
        }
    }
}

impl ArtifactSink for SvgSink {
    fn persist(&self, chart: &Chart, name: &str) -> SciVizResult<ArtifactRef> {
        let dir = self.directory();
        fs::create_dir_all(&dir)?;
        let file = format!("{}.svg", sanitize_name(name));
        let local = dir.join(&file);
        draw_chart(chart, &local).map_err(|e| SciVizError::Render(format!("{file}: {e}")))?;
        debug!(file = %local.display(), recipe = chart.recipe(), "persisted artifact");
        Ok(ArtifactRef {
            public_ref: self.public_ref(&file),
            local_path: local.to_string_lossy().into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::chart::{HexCell, Hexbin};
    use crate::render::palette::{ORANGE, RED};

    fn sample_charts() -> Vec<Chart> {
        vec![
            Chart::Line {
                title: "z (Complex)".into(),
                x_label: Some("(mean=0.00, std=0.00, min=0.00, max=0.00)".into()),
                series: vec![
                    Series {
                        label: "Real Part".into(),
                        values: vec![1.0, 3.0, 5.0],
                        color: BLUE,
                        dashed: false,
                    },
                    Series {
                        label: "Imag Part".into(),
                        values: vec![2.0, 4.0, 6.0],
                        color: ORANGE,
                        dashed: true,
                    },
                ],
            },
            Chart::Heatmap {
                title: "m - 2D Heatmap".into(),
                grid: Array2::from_shape_fn((4, 6), |(r, c)| (r * c) as f64),
                palette: Palette::Viridis,
                x_label: None,
                y_label: None,
            },
            Chart::Histogram {
                title: "hist".into(),
                edges: vec![0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0],
                counts: vec![3, 0, 5],
            },
            Chart::HexPanels(vec![HexPanel {
                title: "ON".into(),
                bins: Hexbin {
                    spacing: (0.2, 0.3),
                    x_range: (0.0, 1.0),
                    y_range: (0.0, 1.0),
                    cells: vec![HexCell {
                        center: (0.5, 0.5),
                        count: 4,
                    }],
                },
                palette: Palette::Blues,
            }]),
            Chart::BarPanels(vec![BarPanel {
                title: "Pixel (0,0)".into(),
                labels: vec!["p=0".into(), "p=1".into()],
                heights: vec![1.0, 3.0],
                colors: vec![RED, BLUE],
            }]),
        ]
    }

    #[test]
    fn test_svg_sink_writes_files_under_request_dir() {
        let dir = tempfile::tempdir().unwrap();
        let sink = SvgSink::request_scoped(dir.path(), "/static/images/");
        for (i, chart) in sample_charts().iter().enumerate() {
            let artifact = sink.persist(chart, &format!("chart {i}")).unwrap();
            let local = PathBuf::from(&artifact.local_path);
            assert!(local.exists(), "missing {}", local.display());
            assert!(local.starts_with(sink.directory()));
            assert!(artifact.public_ref.starts_with("/static/images/"));
            assert!(artifact.public_ref.ends_with(&format!("chart_{i}.svg")));
            let body = fs::read_to_string(&local).unwrap();
            assert!(body.contains("<svg"));
        }
    }

    #[test]
    fn test_flat_sink_public_ref() {
        let dir = tempfile::tempdir().unwrap();
        let sink = SvgSink::new(dir.path(), "https://example.org/static/images");
        let chart = Chart::Scatter2d {
            title: "p - 2D Scatter".into(),
            points: vec![(0.0, 1.0), (1.0, 2.0)],
        };
        let artifact = sink.persist(&chart, "p").unwrap();
        assert_eq!(artifact.public_ref, "https://example.org/static/images/p.svg");
        assert_eq!(PathBuf::from(&artifact.local_path), dir.path().join("p.svg"));
    }
}
