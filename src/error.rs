//! Error type shared by the point models and the array dispatcher.

use crate::array::Type;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MaterialError {
    #[error("shape mismatch for {what}: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("selection mask may only contain 0 or 1, found {value}")]
    InvalidMask { value: usize },

    #[error("point {index:?} already has a material assigned")]
    AlreadyAssigned { index: Vec<usize> },

    #[error("{count} point(s) have no material assigned")]
    Unset { count: usize },

    #[error("parameter index {index} out of bounds for table of length {len}")]
    ParameterIndex { index: usize, len: usize },

    #[error("parameter table '{what}' has length {found}, expected {expected}")]
    ParameterTableLength {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("invalid value for parameter '{name}': {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("index {index:?} out of bounds for shape {shape:?}")]
    IndexOutOfBounds { index: Vec<usize>, shape: Vec<usize> },

    #[error("point {index:?} is {found}, expected {expected}")]
    WrongType {
        index: Vec<usize>,
        expected: Type,
        found: Type,
    },

    #[error("output array must be contiguous in standard (row-major) layout")]
    NonContiguous,
}

pub type Result<T> = std::result::Result<T, MaterialError>;
