//! The generic value tree handed to the core by an external decoder.

use std::fmt;

use indexmap::IndexMap;
use ndarray::{Array1, ArrayD, IxDyn};
use serde::Deserialize;

use crate::errors::{SciVizError, SciVizResult};
use crate::models::ShapeDisplay;

/// Named children in declaration order.
pub type Fields = IndexMap<String, Node>;

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(true) => write!(f, "True"),
            Scalar::Bool(false) => write!(f, "False"),
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{}", format_float(*v)),
            Scalar::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Float formatting that keeps a trailing `.0` on integral values, the way
/// the decoded data's native tooling prints them.
pub fn format_float(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

// ---------------------------------------------------------------------------
// Arrays
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Int,
    Float,
    Bool,
}

fn check_len(shape: &[usize], len: usize) -> SciVizResult<()> {
    let expected = shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| {
            SciVizError::InvalidValue(format!("shape {} overflows", ShapeDisplay(shape)))
        })?;
    if expected != len {
        return Err(SciVizError::InvalidValue(format!(
            "shape {} needs {expected} elements, got {len}",
            ShapeDisplay(shape)
        )));
    }
    Ok(())
}

#[derive(Deserialize)]
struct RawNumeric {
    dtype: ElementType,
    shape: Vec<usize>,
    data: Vec<Option<f64>>,
}

/// Homogeneous real-valued array; integers and booleans are widened to f64
/// and remember their element type.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "RawNumeric")]
pub struct NumericArray {
    element: ElementType,
    data: ArrayD<f64>,
}

impl TryFrom<RawNumeric> for NumericArray {
    type Error = SciVizError;

    fn try_from(raw: RawNumeric) -> SciVizResult<Self> {
        let data = raw.data.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
        NumericArray::new(raw.dtype, raw.shape, data)
    }
}

impl NumericArray {
    pub fn new(element: ElementType, shape: Vec<usize>, data: Vec<f64>) -> SciVizResult<Self> {
        check_len(&shape, data.len())?;
        let data = ArrayD::from_shape_vec(IxDyn(&shape), data)
            .map_err(|e| SciVizError::InvalidValue(e.to_string()))?;
        Ok(Self { element, data })
    }

    pub fn from_array(element: ElementType, data: ArrayD<f64>) -> Self {
        Self { element, data }
    }

    pub fn element(&self) -> ElementType {
        self.element
    }

    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }
}

#[derive(Deserialize)]
struct RawComplex {
    shape: Vec<usize>,
    real: Vec<f64>,
    imag: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "RawComplex")]
pub struct ComplexArray {
    re: ArrayD<f64>,
    im: ArrayD<f64>,
}

impl TryFrom<RawComplex> for ComplexArray {
    type Error = SciVizError;

    fn try_from(raw: RawComplex) -> SciVizResult<Self> {
        ComplexArray::new(raw.shape, raw.real, raw.imag)
    }
}

impl ComplexArray {
    pub fn new(shape: Vec<usize>, real: Vec<f64>, imag: Vec<f64>) -> SciVizResult<Self> {
        check_len(&shape, real.len())?;
        check_len(&shape, imag.len())?;
        let re = ArrayD::from_shape_vec(IxDyn(&shape), real)
            .map_err(|e| SciVizError::InvalidValue(e.to_string()))?;
        let im = ArrayD::from_shape_vec(IxDyn(&shape), imag)
            .map_err(|e| SciVizError::InvalidValue(e.to_string()))?;
        Ok(Self { re, im })
    }

    pub fn re(&self) -> &ArrayD<f64> {
        &self.re
    }

    pub fn im(&self) -> &ArrayD<f64> {
        &self.im
    }
}

#[derive(Deserialize)]
struct RawText {
    shape: Vec<usize>,
    data: Vec<String>,
}

/// Array of strings (a non-numeric homogeneous array).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "RawText")]
pub struct TextArray {
    data: ArrayD<String>,
}

impl TryFrom<RawText> for TextArray {
    type Error = SciVizError;

    fn try_from(raw: RawText) -> SciVizResult<Self> {
        TextArray::new(raw.shape, raw.data)
    }
}

impl TextArray {
    pub fn new(shape: Vec<usize>, data: Vec<String>) -> SciVizResult<Self> {
        check_len(&shape, data.len())?;
        let data = ArrayD::from_shape_vec(IxDyn(&shape), data)
            .map_err(|e| SciVizError::InvalidValue(e.to_string()))?;
        Ok(Self { data })
    }

    pub fn data(&self) -> &ArrayD<String> {
        &self.data
    }
}

#[derive(Deserialize)]
struct RawCell {
    shape: Vec<usize>,
    items: Vec<Node>,
}

/// Heterogeneous cell-like collection; elements are arbitrary nodes.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "RawCell")]
pub struct CellArray {
    shape: Vec<usize>,
    items: Vec<Node>,
}

impl TryFrom<RawCell> for CellArray {
    type Error = SciVizError;

    fn try_from(raw: RawCell) -> SciVizResult<Self> {
        CellArray::new(raw.shape, raw.items)
    }
}

impl CellArray {
    pub fn new(shape: Vec<usize>, items: Vec<Node>) -> SciVizResult<Self> {
        check_len(&shape, items.len())?;
        Ok(Self { shape, items })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn items(&self) -> &[Node] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Deserialize)]
struct RawSparse {
    shape: (usize, usize),
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<f64>,
}

/// Two-dimensional matrix in coordinate (triplet) form.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "RawSparse")]
pub struct SparseMatrix {
    shape: (usize, usize),
    entries: Vec<(usize, usize, f64)>,
}

impl TryFrom<RawSparse> for SparseMatrix {
    type Error = SciVizError;

    fn try_from(raw: RawSparse) -> SciVizResult<Self> {
        if raw.rows.len() != raw.values.len() || raw.cols.len() != raw.values.len() {
            return Err(SciVizError::InvalidValue(format!(
                "sparse triplets disagree: {} rows, {} cols, {} values",
                raw.rows.len(),
                raw.cols.len(),
                raw.values.len()
            )));
        }
        let entries = raw
            .rows
            .into_iter()
            .zip(raw.cols)
            .zip(raw.values)
            .map(|((r, c), v)| (r, c, v))
            .collect();
        SparseMatrix::new(raw.shape, entries)
    }
}

impl SparseMatrix {
    pub fn new(shape: (usize, usize), entries: Vec<(usize, usize, f64)>) -> SciVizResult<Self> {
        if let Some((r, c, _)) = entries.iter().find(|(r, c, _)| *r >= shape.0 || *c >= shape.1) {
            return Err(SciVizError::InvalidValue(format!(
                "sparse entry ({r}, {c}) outside shape ({}, {})",
                shape.0, shape.1
            )));
        }
        Ok(Self { shape, entries })
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Dense copy; duplicate coordinates are summed.
    pub fn to_dense(&self) -> ndarray::Array2<f64> {
        let mut dense = ndarray::Array2::<f64>::zeros(self.shape);
        for &(r, c, v) in &self.entries {
            dense[[r, c]] += v;
        }
        dense
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// Any value found in a decoded container.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Scalar { value: Scalar },
    Array(NumericArray),
    Complex(ComplexArray),
    Text(TextArray),
    Struct { fields: Fields },
    Group { entries: Fields },
    Cell(CellArray),
    Sparse(SparseMatrix),
    /// Anything the decoder could not express (function handles, opaque
    /// objects, references).
    #[serde(other)]
    Unsupported,
}

impl Node {
    pub fn scalar(value: impl Into<Scalar>) -> Self {
        Node::Scalar {
            value: value.into(),
        }
    }

    /// One-dimensional float vector.
    pub fn vector(values: Vec<f64>) -> Self {
        Node::Array(NumericArray::from_array(
            ElementType::Float,
            Array1::from(values).into_dyn(),
        ))
    }

    /// One-dimensional integer vector.
    pub fn int_vector(values: Vec<i64>) -> Self {
        let data: Vec<f64> = values.into_iter().map(|v| v as f64).collect();
        Node::Array(NumericArray::from_array(
            ElementType::Int,
            Array1::from(data).into_dyn(),
        ))
    }

    pub fn array(element: ElementType, shape: Vec<usize>, data: Vec<f64>) -> SciVizResult<Self> {
        Ok(Node::Array(NumericArray::new(element, shape, data)?))
    }

    pub fn complex(shape: Vec<usize>, real: Vec<f64>, imag: Vec<f64>) -> SciVizResult<Self> {
        Ok(Node::Complex(ComplexArray::new(shape, real, imag)?))
    }

    pub fn structure<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Node)>,
        K: Into<String>,
    {
        Node::Struct {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn group<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Node)>,
        K: Into<String>,
    {
        Node::Group {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn cells(shape: Vec<usize>, items: Vec<Node>) -> SciVizResult<Self> {
        Ok(Node::Cell(CellArray::new(shape, items)?))
    }

    pub fn sparse(shape: (usize, usize), entries: Vec<(usize, usize, f64)>) -> SciVizResult<Self> {
        Ok(Node::Sparse(SparseMatrix::new(shape, entries)?))
    }

    /// Named children of a struct or group; `None` for every other node.
    pub fn children(&self) -> Option<&Fields> {
        match self {
            Node::Struct { fields } => Some(fields),
            Node::Group { entries } => Some(entries),
            _ => None,
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}
