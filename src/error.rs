//! Crate-wide error kinds shared by the matrix, indexing and kernel layers.

use thiserror::Error;

/// Fatal, programmer-facing errors: out-of-bound matrix access.
///
/// Kernels propagate this with `?`; join/lookup drivers never catch it,
/// they let a failing kernel call abort the whole invocation.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum MatrixError {
    #[error("row index {row} out of range (rows = {rows})")]
    RowOutOfRange { row: usize, rows: usize },
    #[error("column index {col} out of range (cols = {cols})")]
    ColOutOfRange { col: usize, cols: usize },
    #[error("band access |{row}-{col}| > width {width}")]
    OutsideBand {
        row: usize,
        col: usize,
        width: usize,
    },
}

pub type MatrixResult<T> = Result<T, MatrixError>;
