//! Second- and fourth-order tensors in three dimensions.
//!
//! Second-order tensors are plain 3x3 matrices. Fourth-order tensors are stored as
//! 9x9 matrices where entry `(3i+j, 3k+l)` holds `C_ijkl`. At the array boundary
//! tensors are flattened row-major, i.e. `[i][j]` and `[i][j][k][l]`.
//!
//! The double contraction follows the convention `A : B = A_ij B_ji` and
//! `C : B = C_ijkl B_lk`, so that `I4 : A = A` and `I4rt : A = A^T`.
use crate::error::{MaterialError, Result};
use nalgebra::{Matrix3, SMatrix};
use ndarray::{ArrayBase, ArrayD, Data, Dimension, IxDyn};
use std::sync::OnceLock;

pub type Tensor2 = Matrix3<f64>;
pub type Tensor4 = SMatrix<f64, 9, 9>;

fn delta(i: usize, j: usize) -> f64 {
    if i == j {
        1.0
    } else {
        0.0
    }
}

/// Builds a fourth-order tensor from its components `f(i, j, k, l)`.
pub fn from_components(f: impl Fn(usize, usize, usize, usize) -> f64) -> Tensor4 {
    Tensor4::from_fn(|r, c| f(r / 3, r % 3, c / 3, c % 3))
}

pub fn o2() -> Tensor2 {
    Tensor2::zeros()
}

pub fn o4() -> Tensor4 {
    Tensor4::zeros()
}

pub fn i2() -> Tensor2 {
    Tensor2::identity()
}

/// `II = I2 ⊗ I2`
pub fn ii() -> &'static Tensor4 {
    static II: OnceLock<Tensor4> = OnceLock::new();
    II.get_or_init(|| from_components(|i, j, k, l| delta(i, j) * delta(k, l)))
}

/// Identity under the double contraction: `I4 : A = A`.
pub fn i4() -> &'static Tensor4 {
    static I4: OnceLock<Tensor4> = OnceLock::new();
    I4.get_or_init(|| from_components(|i, j, k, l| delta(i, l) * delta(j, k)))
}

/// Right-transposed identity: `I4rt : A = A^T`.
pub fn i4rt() -> &'static Tensor4 {
    static I4RT: OnceLock<Tensor4> = OnceLock::new();
    I4RT.get_or_init(|| from_components(|i, j, k, l| delta(i, k) * delta(j, l)))
}

/// Symmetric projection: `I4s : A = sym(A)`.
pub fn i4s() -> &'static Tensor4 {
    static I4S: OnceLock<Tensor4> = OnceLock::new();
    I4S.get_or_init(|| 0.5 * (*i4() + *i4rt()))
}

/// Deviatoric projection: `I4d : A = dev(sym(A))`.
pub fn i4d() -> &'static Tensor4 {
    static I4D: OnceLock<Tensor4> = OnceLock::new();
    I4D.get_or_init(|| *i4s() - *ii() / 3.0)
}

pub fn trace(a: &Tensor2) -> f64 {
    a.m11 + a.m22 + a.m33
}

pub fn hydrostatic(a: &Tensor2) -> f64 {
    trace(a) / 3.0
}

pub fn deviatoric(a: &Tensor2) -> Tensor2 {
    let (_, dev) = hydrostatic_deviatoric(a);
    dev
}

/// Splits `a` into its hydrostatic part `tr(a)/3` and its deviator.
pub fn hydrostatic_deviatoric(a: &Tensor2) -> (f64, Tensor2) {
    let m = hydrostatic(a);
    let mut dev = *a;
    dev.m11 -= m;
    dev.m22 -= m;
    dev.m33 -= m;
    (m, dev)
}

/// `A_ij B_ji`
pub fn ddot22(a: &Tensor2, b: &Tensor2) -> f64 {
    (a * b).trace()
}

/// `A_ij B_ij`, equal to [`ddot22`] when either tensor is symmetric.
pub fn ddot22s(a: &Tensor2, b: &Tensor2) -> f64 {
    a.dot(b)
}

/// `C_ijkl B_lk`
pub fn ddot42(c: &Tensor4, b: &Tensor2) -> Tensor2 {
    Tensor2::from_fn(|i, j| {
        let mut sum = 0.0;
        for k in 0..3 {
            for l in 0..3 {
                sum += c[(3 * i + j, 3 * k + l)] * b[(l, k)];
            }
        }
        sum
    })
}

/// `A_ijkl B_lkmn`
pub fn ddot44(a: &Tensor4, b: &Tensor4) -> Tensor4 {
    from_components(|i, j, m, n| {
        let mut sum = 0.0;
        for k in 0..3 {
            for l in 0..3 {
                sum += a[(3 * i + j, 3 * k + l)] * b[(3 * l + k, 3 * m + n)];
            }
        }
        sum
    })
}

/// `A_ij B_kl`
pub fn dyadic22(a: &Tensor2, b: &Tensor2) -> Tensor4 {
    from_components(|i, j, k, l| a[(i, j)] * b[(k, l)])
}

/// Von Mises equivalent stress `sqrt(3/2 s : s)`.
pub fn sigeq(sig: &Tensor2) -> f64 {
    let dev = deviatoric(sig);
    (1.5 * ddot22s(&dev, &dev)).sqrt()
}

/// Equivalent strain `sqrt(2/3 e : e)`.
pub fn epseq(eps: &Tensor2) -> f64 {
    let dev = deviatoric(eps);
    (2.0 / 3.0 * ddot22s(&dev, &dev)).sqrt()
}

pub fn from_row_slice(values: &[f64]) -> Tensor2 {
    Tensor2::from_row_slice(values)
}

pub fn write_row_slice(a: &Tensor2, out: &mut [f64]) {
    for i in 0..3 {
        for j in 0..3 {
            out[3 * i + j] = a[(i, j)];
        }
    }
}

/// Writes `C_ijkl` to `out[27i + 9j + 3k + l]`.
pub fn write_row_slice4(c: &Tensor4, out: &mut [f64]) {
    for r in 0..9 {
        for s in 0..9 {
            out[9 * r + s] = c[(r, s)];
        }
    }
}

pub(crate) fn append_shape(shape: &[usize], tail: &[usize]) -> Vec<usize> {
    shape.iter().chain(tail).copied().collect()
}

/// Shape of the leading (point) dimensions of an array of 3x3 tensors.
fn leading_shape(shape: &[usize]) -> Result<&[usize]> {
    match shape {
        [lead @ .., 3, 3] => Ok(lead),
        _ => Err(MaterialError::ShapeMismatch {
            what: "array of second-order tensors",
            expected: match shape.len() {
                0 | 1 => vec![3, 3],
                n => append_shape(&shape[..n - 2], &[3, 3]),
            },
            found: shape.to_vec(),
        }),
    }
}

fn map_tensors<S, D>(a: &ArrayBase<S, D>, f: impl Fn(&Tensor2) -> f64) -> Result<ArrayD<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let lead = leading_shape(a.shape())?.to_vec();
    let a = a.as_standard_layout();
    let values = a.as_slice().ok_or(MaterialError::NonContiguous)?;
    let out: Vec<f64> = values
        .chunks_exact(9)
        .map(|chunk| f(&from_row_slice(chunk)))
        .collect();
    ArrayD::from_shape_vec(IxDyn(&lead), out).map_err(|_| MaterialError::NonContiguous)
}

/// Equivalent stress of each tensor in an array shaped `[..., 3, 3]`.
pub fn sigeq_array<S, D>(a: &ArrayBase<S, D>) -> Result<ArrayD<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    map_tensors(a, sigeq)
}

/// Equivalent strain of each tensor in an array shaped `[..., 3, 3]`.
pub fn epseq_array<S, D>(a: &ArrayBase<S, D>) -> Result<ArrayD<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    map_tensors(a, epseq)
}

pub fn hydrostatic_array<S, D>(a: &ArrayBase<S, D>) -> Result<ArrayD<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    map_tensors(a, hydrostatic)
}

pub fn deviatoric_array<S, D>(a: &ArrayBase<S, D>) -> Result<ArrayD<f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    leading_shape(a.shape())?;
    let mut out = a.to_owned().into_dyn().as_standard_layout().into_owned();
    let values = out.as_slice_mut().ok_or(MaterialError::NonContiguous)?;
    for chunk in values.chunks_exact_mut(9) {
        let dev = deviatoric(&from_row_slice(chunk));
        write_row_slice(&dev, chunk);
    }
    Ok(out)
}

/// Repeats `values` (one flattened tensor) for every point of `shape`.
pub(crate) fn broadcast(shape: &[usize], tail: &[usize], values: &[f64]) -> ArrayD<f64> {
    let lead = shape.len();
    ArrayD::from_shape_fn(IxDyn(&append_shape(shape, tail)), |idx| {
        let pos = tail
            .iter()
            .enumerate()
            .fold(0, |acc, (d, n)| acc * n + idx[lead + d]);
        values[pos]
    })
}
