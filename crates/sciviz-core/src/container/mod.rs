pub mod adapter;
pub mod node;

pub use adapter::{Container, ContainerFormat};
pub use node::{
    CellArray, ComplexArray, ElementType, Fields, NumericArray, Node, Scalar, SparseMatrix,
    TextArray,
};
