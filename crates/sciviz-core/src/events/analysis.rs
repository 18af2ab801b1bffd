//! Numeric kernels behind the event charts.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use ndarray::Array2;

use crate::events::table::{EventTable, Polarity, SensorDim};
use crate::render::chart::{HexCell, Hexbin};

pub const POLARITY_BINS: usize = 3;
pub const KDE_GRID_POINTS: usize = 200;
/// Bandwidths added on each side of the sample range.
pub const KDE_CUT: f64 = 3.0;
/// Hexagons across the x range.
pub const HEX_GRIDSIZE: usize = 50;
/// Value of one net event in the intensity map.
pub const INTENSITY_SCALE: f64 = 255.0;

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let mut iter = values.iter().copied().filter(|v| v.is_finite());
    let first = iter.next()?;
    Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// Equal-width histogram over `[min, max]`; the last bin is closed.
/// A degenerate range is widened by 0.5 on each side.
pub fn histogram(values: &[f64], bins: usize) -> (Vec<f64>, Vec<usize>) {
    let bins = bins.max(1);
    let (mut lo, mut hi) = min_max(values).unwrap_or((0.0, 1.0));
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();

    let mut counts = vec![0usize; bins];
    for &v in values.iter().filter(|v| v.is_finite()) {
        let idx = (((v - lo) / (hi - lo)) * bins as f64).floor() as usize;
        counts[idx.min(bins - 1)] += 1;
    }
    (edges, counts)
}

// ---------------------------------------------------------------------------
// Kernel density
// ---------------------------------------------------------------------------

fn sample_std(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (n - 1.0)).sqrt()
}

/// Gaussian KDE with Scott's bandwidth, evaluated on an even grid spanning
/// `KDE_CUT` bandwidths past the data. Returns empty vectors when the sample
/// has fewer than two points or no spread.
pub fn gaussian_kde(samples: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let finite: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.len() < 2 {
        return (Vec::new(), Vec::new());
    }
    let std = sample_std(&finite);
    if std == 0.0 || !std.is_finite() {
        return (Vec::new(), Vec::new());
    }
    let n = finite.len() as f64;
    let h = n.powf(-0.2) * std;
    let (lo, hi) = match min_max(&finite) {
        Some(range) => range,
        None => return (Vec::new(), Vec::new()),
    };
    let (start, end) = (lo - KDE_CUT * h, hi + KDE_CUT * h);
    let step = (end - start) / (KDE_GRID_POINTS - 1) as f64;
    let norm = 1.0 / (n * h * (2.0 * PI).sqrt());

    let xs: Vec<f64> = (0..KDE_GRID_POINTS).map(|i| start + step * i as f64).collect();
    let ys = xs
        .iter()
        .map(|x| {
            norm * finite
                .iter()
                .map(|xi| (-0.5 * ((x - xi) / h).powi(2)).exp())
                .sum::<f64>()
        })
        .collect();
    (xs, ys)
}

// ---------------------------------------------------------------------------
// Hexagonal binning
// ---------------------------------------------------------------------------

/// Widen an empty or zero-width interval by 10%.
fn nonsingular(lo: f64, hi: f64) -> (f64, f64) {
    const EXPANDER: f64 = 0.1;
    if hi - lo > f64::EPSILON * lo.abs().max(hi.abs()) {
        return (lo, hi);
    }
    if lo == 0.0 && hi == 0.0 {
        (-EXPANDER, EXPANDER)
    } else {
        (lo - EXPANDER * lo.abs(), hi + EXPANDER * hi.abs())
    }
}

/// Hexagonal binning on two offset rectangular lattices; `gridsize`
/// hexagons span x, `gridsize / sqrt(3)` span y. Only occupied cells are
/// returned, in lattice order.
pub fn hexbin(points: &[(f64, f64)], gridsize: usize) -> Hexbin {
    let nx = gridsize.max(1);
    let ny = ((nx as f64) / 3f64.sqrt()).floor().max(1.0) as usize;

    let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.1).collect();
    let (xmin, xmax) = min_max(&xs).unwrap_or((0.0, 0.0));
    let (ymin, ymax) = min_max(&ys).unwrap_or((0.0, 0.0));
    let (mut xmin, mut xmax) = nonsingular(xmin, xmax);
    let (ymin, ymax) = nonsingular(ymin, ymax);
    let padding = 1e-9 * (xmax - xmin);
    xmin -= padding;
    xmax += padding;

    let sx = (xmax - xmin) / nx as f64;
    let sy = (ymax - ymin) / ny as f64;

    // Lattice 1 has (nx+1)*(ny+1) centres on integer positions, lattice 2
    // has nx*ny centres offset by half a cell.
    let mut lattice1 = vec![0usize; (nx + 1) * (ny + 1)];
    let mut lattice2 = vec![0usize; nx * ny];

    for &(px, py) in points {
        if !px.is_finite() || !py.is_finite() {
            continue;
        }
        let x = (px - xmin) / sx;
        let y = (py - ymin) / sy;
        let (ix1, iy1) = (x.round(), y.round());
        let (ix2, iy2) = (x.floor(), y.floor());
        let d1 = (x - ix1).powi(2) + 3.0 * (y - iy1).powi(2);
        let d2 = (x - ix2 - 0.5).powi(2) + 3.0 * (y - iy2 - 0.5).powi(2);

        if d1 < d2 {
            if ix1 >= 0.0 && iy1 >= 0.0 && (ix1 as usize) <= nx && (iy1 as usize) <= ny {
                lattice1[ix1 as usize * (ny + 1) + iy1 as usize] += 1;
            }
        } else if ix2 >= 0.0 && iy2 >= 0.0 && (ix2 as usize) < nx && (iy2 as usize) < ny {
            lattice2[ix2 as usize * ny + iy2 as usize] += 1;
        }
    }

    let mut cells = Vec::new();
    for i in 0..=nx {
        for j in 0..=ny {
            let count = lattice1[i * (ny + 1) + j];
            if count > 0 {
                cells.push(HexCell {
                    center: (xmin + sx * i as f64, ymin + sy * j as f64),
                    count,
                });
            }
        }
    }
    for i in 0..nx {
        for j in 0..ny {
            let count = lattice2[i * ny + j];
            if count > 0 {
                cells.push(HexCell {
                    center: (xmin + sx * (i as f64 + 0.5), ymin + sy * (j as f64 + 0.5)),
                    count,
                });
            }
        }
    }

    Hexbin {
        spacing: (sx, sy),
        x_range: (xmin, xmax),
        y_range: (ymin, ymax),
        cells,
    }
}

// ---------------------------------------------------------------------------
// Per-pixel polarity counts
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PixelCounts {
    pub off: usize,
    pub on: usize,
}

impl PixelCounts {
    pub fn total(&self) -> usize {
        self.off + self.on
    }

    pub fn net(&self) -> f64 {
        self.on as f64 - self.off as f64
    }
}

/// Event counts per pixel, keyed and ordered by `(x, y)`.
pub fn pixel_counts(table: &EventTable) -> BTreeMap<(i64, i64), PixelCounts> {
    let mut counts: BTreeMap<(i64, i64), PixelCounts> = BTreeMap::new();
    for event in table.iter() {
        let entry = counts.entry((event.x, event.y)).or_default();
        match event.p {
            Polarity::On => entry.on += 1,
            Polarity::Off => entry.off += 1,
        }
    }
    counts
}

/// Busiest and quietest pixels. Ties go to the first pixel in `(x, y)`
/// order. `None` for an empty table.
pub fn extreme_pixels(
    counts: &BTreeMap<(i64, i64), PixelCounts>,
) -> Option<((i64, i64), (i64, i64))> {
    let mut iter = counts.iter();
    let (first, c) = iter.next()?;
    let (mut max, mut min) = ((*first, c.total()), (*first, c.total()));
    for (pixel, c) in iter {
        let total = c.total();
        if total > max.1 {
            max = (*pixel, total);
        }
        if total < min.1 {
            min = (*pixel, total);
        }
    }
    Some((max.0, min.0))
}

// ---------------------------------------------------------------------------
// Intensity map
// ---------------------------------------------------------------------------

/// `x_max` by `y_max` grid of `255 * (on - off)`; out-of-bounds pixels are
/// dropped.
pub fn intensity_grid(
    counts: &BTreeMap<(i64, i64), PixelCounts>,
    sensor: SensorDim,
) -> Array2<f64> {
    let mut grid = Array2::<f64>::zeros((sensor.x_max, sensor.y_max));
    for (&(x, y), c) in counts {
        if sensor.contains(x, y) {
            grid[[x as usize, y as usize]] = INTENSITY_SCALE * c.net();
        }
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::table::Event;

    fn event(x: i64, y: i64, p: Polarity) -> Event {
        Event { t: 0.0, x, y, p }
    }

    #[test]
    fn test_histogram_polarity_bins() {
        let (edges, counts) = histogram(&[0.0, 1.0, 1.0, 0.0, 1.0], POLARITY_BINS);
        assert_eq!(edges.len(), 4);
        assert_eq!(edges[0], 0.0);
        assert_eq!(edges[3], 1.0);
        assert_eq!(counts, vec![2, 0, 3]);
    }

    #[test]
    fn test_histogram_degenerate_range() {
        let (edges, counts) = histogram(&[1.0, 1.0, 1.0, 1.0], POLARITY_BINS);
        assert_eq!(edges[0], 0.5);
        assert_eq!(edges[3], 1.5);
        assert_eq!(counts, vec![0, 4, 0]);
    }

    #[test]
    fn test_kde_integrates_to_one() {
        let samples: Vec<f64> = (0..50).map(|i| (i as f64 * 0.37).sin()).collect();
        let (xs, ys) = gaussian_kde(&samples);
        assert_eq!(xs.len(), KDE_GRID_POINTS);
        let step = xs[1] - xs[0];
        let area: f64 = ys.iter().sum::<f64>() * step;
        assert!((area - 1.0).abs() < 0.01, "area={area}");
    }

    #[test]
    fn test_kde_degenerate_samples_are_empty() {
        assert!(gaussian_kde(&[1.0]).0.is_empty());
        assert!(gaussian_kde(&[2.0, 2.0, 2.0]).0.is_empty());
        assert!(gaussian_kde(&[]).1.is_empty());
    }

    #[test]
    fn test_hexbin_single_location() {
        let bins = hexbin(&[(0.0, 0.0); 4], HEX_GRIDSIZE);
        assert_eq!(bins.cells.len(), 1);
        assert_eq!(bins.cells[0].count, 4);
        let (cx, cy) = bins.cells[0].center;
        assert!(cx.abs() < 1e-9 && cy.abs() < 1e-9);
    }

    #[test]
    fn test_hexbin_counts_every_point() {
        let points: Vec<(f64, f64)> = (0..500)
            .map(|i| ((i % 37) as f64, (i % 23) as f64 * 2.0))
            .collect();
        let bins = hexbin(&points, HEX_GRIDSIZE);
        assert_eq!(bins.total(), 500);
        assert!(bins.cells.iter().all(|c| c.count >= 1));
    }

    #[test]
    fn test_extreme_pixels_tie_break() {
        let table = EventTable::from_events([
            event(2, 0, Polarity::On),
            event(1, 5, Polarity::On),
            event(1, 5, Polarity::Off),
            event(0, 9, Polarity::On),
            event(0, 9, Polarity::On),
            event(3, 3, Polarity::Off),
        ]);
        let counts = pixel_counts(&table);
        let keys: Vec<_> = counts.keys().copied().collect();
        assert_eq!(keys, vec![(0, 9), (1, 5), (2, 0), (3, 3)]);
        // (0,9) and (1,5) both have 2; (2,0) and (3,3) both have 1.
        assert_eq!(extreme_pixels(&counts), Some(((0, 9), (2, 0))));
        assert_eq!(extreme_pixels(&BTreeMap::new()), None);
    }

    #[test]
    fn test_intensity_grid_drops_out_of_bounds() {
        let table = EventTable::from_events([
            event(0, 0, Polarity::On),
            event(0, 0, Polarity::On),
            event(1, 0, Polarity::Off),
            event(5, 5, Polarity::On),
        ]);
        let grid = intensity_grid(&pixel_counts(&table), SensorDim::new(2, 1));
        assert_eq!(grid.dim(), (2, 1));
        assert_eq!(grid[[0, 0]], 510.0);
        assert_eq!(grid[[1, 0]], -255.0);
    }
}
