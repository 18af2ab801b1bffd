//! Size guardrails: element ceilings, per-axis stride subsampling, and
//! traversal bounds.

use ndarray::{s, ArrayView2};

/// Arrays with more elements than this are skipped with a placeholder.
pub const MAX_ELEMENTS: usize = 1_000_000;
/// Per-axis ceiling for rendered rank-2 grids.
pub const MAX_DIM: usize = 200;
/// Leading-axis slices rendered for rank-3 arrays.
pub const MAX_SLICES: usize = 5;
/// Highest rank that gets a chart at all.
pub const MAX_RENDER_RANK: usize = 3;
/// Struct/group nesting bound for the walker.
pub const MAX_TRAVERSAL_DEPTH: usize = 32;
/// Largest sensor (xMax * yMax) an intensity grid is built for.
pub const MAX_SENSOR_PIXELS: usize = 4096 * 4096;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    pub max_elements: usize,
    pub max_dim: usize,
    pub max_slices: usize,
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_elements: MAX_ELEMENTS,
            max_dim: MAX_DIM,
            max_slices: MAX_SLICES,
            max_depth: MAX_TRAVERSAL_DEPTH,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    Render,
    Oversize,
}

impl Limits {
    pub fn admit(&self, element_count: usize) -> Admission {
        if element_count > self.max_elements {
            Admission::Oversize
        } else {
            Admission::Render
        }
    }

    /// Stride for one axis: `max(1, dim / max_dim)` once the axis exceeds the
    /// ceiling, otherwise 1.
    pub fn stride(&self, dim: usize) -> usize {
        if dim > self.max_dim {
            (dim / self.max_dim.max(1)).max(1)
        } else {
            1
        }
    }

    /// Row/column strides for a rank-2 grid.
    pub fn strides(&self, rows: usize, cols: usize) -> (usize, usize) {
        (self.stride(rows), self.stride(cols))
    }

    /// Deterministic row/column decimation; a view, nothing is copied.
    pub fn subsample<'a>(&self, grid: ArrayView2<'a, f64>) -> ArrayView2<'a, f64> {
        let (rows, cols) = grid.dim();
        let (rs, cs) = self.strides(rows, cols);
        if rs == 1 && cs == 1 {
            return grid;
        }
        let (rs, cs) = (rs as isize, cs as isize);
        grid.slice_move(s![..;rs, ..;cs])
    }

    /// How many leading-axis slices of a rank-3 array get rendered.
    pub fn slice_count(&self, depth: usize) -> usize {
        depth.min(self.max_slices)
    }
}
