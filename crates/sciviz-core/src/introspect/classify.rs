//! Node classification into a closed set of shapes.

use ndarray::{ArrayViewD, Axis};

use crate::container::node::{ElementType, Fields, Node, Scalar, SparseMatrix};
use crate::models::{ClassifiedNode, DtypeCategory, NodeKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Composite {
    Struct,
    Mapping,
}

/// A node the dispatcher renders directly.
#[derive(Debug)]
pub enum Leaf<'a> {
    Scalar(Scalar),
    /// Real-valued array with singleton axes collapsed, rank >= 1.
    Numeric {
        data: ArrayViewD<'a, f64>,
        dtype: DtypeCategory,
    },
    /// Complex-valued array of any rank.
    Complex {
        re: ArrayViewD<'a, f64>,
        im: ArrayViewD<'a, f64>,
    },
    /// Homogeneous string array, rank >= 1.
    Text(ArrayViewD<'a, String>),
    /// Heterogeneous cell collection; elements are never visited.
    Objects { shape: Vec<usize>, len: usize },
    Sparse(&'a SparseMatrix),
}

#[derive(Debug)]
pub enum Classified<'a> {
    Composite { kind: Composite, fields: &'a Fields },
    Leaf(Leaf<'a>),
    /// Not placeable; contributes zero records.
    Unsupported,
}

/// Drop every length-1 axis.
pub fn squeeze<'a, T>(view: ArrayViewD<'a, T>) -> ArrayViewD<'a, T> {
    let mut view = view;
    let mut axis = 0;
    while axis < view.ndim() {
        if view.len_of(Axis(axis)) == 1 {
            view = view.remove_axis(Axis(axis));
        } else {
            axis += 1;
        }
    }
    view
}

fn squeezed_shape(shape: &[usize]) -> Vec<usize> {
    shape.iter().copied().filter(|d| *d != 1).collect()
}

fn dtype_of(element: ElementType) -> DtypeCategory {
    match element {
        ElementType::Int => DtypeCategory::Integer,
        ElementType::Float => DtypeCategory::Float,
        ElementType::Bool => DtypeCategory::Boolean,
    }
}

fn scalar_from(value: f64, dtype: DtypeCategory) -> Scalar {
    match dtype {
        DtypeCategory::Integer => Scalar::Int(value as i64),
        DtypeCategory::Boolean => Scalar::Bool(value != 0.0),
        _ => Scalar::Float(value),
    }
}

/// Classify a node. Priority: struct, mapping, sparse, complex, scalar
/// (including rank-0 arrays), homogeneous array, object collection.
pub fn classify(node: &Node) -> Classified<'_> {
    match node {
        Node::Struct { fields } => Classified::Composite {
            kind: Composite::Struct,
            fields,
        },
        Node::Group { entries } => Classified::Composite {
            kind: Composite::Mapping,
            fields: entries,
        },
        Node::Sparse(matrix) => Classified::Leaf(Leaf::Sparse(matrix)),
        Node::Complex(array) => Classified::Leaf(Leaf::Complex {
            re: squeeze(array.re().view()),
            im: squeeze(array.im().view()),
        }),
        Node::Scalar { value } => Classified::Leaf(Leaf::Scalar(value.clone())),
        Node::Array(array) => {
            let dtype = dtype_of(array.element());
            let data = squeeze(array.data().view());
            if data.ndim() == 0 {
                let value = data.iter().next().copied().unwrap_or(f64::NAN);
                Classified::Leaf(Leaf::Scalar(scalar_from(value, dtype)))
            } else {
                Classified::Leaf(Leaf::Numeric { data, dtype })
            }
        }
        Node::Text(array) => {
            let data = squeeze(array.data().view());
            if data.ndim() == 0 {
                let value = data.iter().next().cloned().unwrap_or_default();
                Classified::Leaf(Leaf::Scalar(Scalar::Text(value)))
            } else {
                Classified::Leaf(Leaf::Text(data))
            }
        }
        Node::Cell(cells) => Classified::Leaf(Leaf::Objects {
            shape: squeezed_shape(cells.shape()),
            len: cells.len(),
        }),
        Node::Unsupported => Classified::Unsupported,
    }
}

impl Leaf<'_> {
    pub fn summary(&self) -> ClassifiedNode {
        match self {
            Leaf::Scalar(value) => ClassifiedNode {
                kind: NodeKind::Scalar,
                rank: 0,
                dtype: match value {
                    Scalar::Bool(_) => DtypeCategory::Boolean,
                    Scalar::Int(_) => DtypeCategory::Integer,
                    Scalar::Float(_) => DtypeCategory::Float,
                    Scalar::Text(_) => DtypeCategory::Textual,
                },
            },
            Leaf::Numeric { data, dtype } => ClassifiedNode {
                kind: NodeKind::NumericArray,
                rank: data.ndim(),
                dtype: *dtype,
            },
            Leaf::Complex { re, .. } => ClassifiedNode {
                kind: NodeKind::ComplexArray,
                rank: re.ndim(),
                dtype: DtypeCategory::Float,
            },
            Leaf::Text(data) => ClassifiedNode {
                kind: NodeKind::NumericArray,
                rank: data.ndim(),
                dtype: DtypeCategory::Textual,
            },
            Leaf::Objects { shape, .. } => ClassifiedNode {
                kind: NodeKind::ObjectCollection,
                rank: shape.len(),
                dtype: DtypeCategory::Textual,
            },
            Leaf::Sparse(_) => ClassifiedNode {
                kind: NodeKind::SparseMatrix,
                rank: 2,
                dtype: DtypeCategory::Float,
            },
        }
    }
}

impl Classified<'_> {
    pub fn summary(&self) -> Option<ClassifiedNode> {
        match self {
            Classified::Composite { kind, .. } => Some(ClassifiedNode {
                kind: match kind {
                    Composite::Struct => NodeKind::Struct,
                    Composite::Mapping => NodeKind::Mapping,
                },
                rank: 0,
                dtype: DtypeCategory::Textual,
            }),
            Classified::Leaf(leaf) => Some(leaf.summary()),
            Classified::Unsupported => None,
        }
    }
}
