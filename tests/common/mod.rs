#![allow(dead_code)]

use elastoplastic::tensor::{from_row_slice, write_row_slice};
use elastoplastic::Tensor2;
use ndarray::{ArrayD, IxDyn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn rng() -> StdRng {
    StdRng::seed_from_u64(0x5eed)
}

/// Random symmetric strain with components in `[-scale, scale)`.
pub fn random_strain(rng: &mut StdRng, scale: f64) -> Tensor2 {
    let a = Tensor2::from_fn(|_, _| rng.gen_range(-scale..scale));
    0.5 * (a + a.transpose())
}

pub fn shear(epsm: f64, gamma: f64) -> Tensor2 {
    Tensor2::new(epsm, gamma, 0.0, gamma, epsm, 0.0, 0.0, 0.0, epsm)
}

/// Strain array shaped `[shape..., 3, 3]` holding `f(p)` at flat point `p`.
pub fn strain_array(shape: &[usize], mut f: impl FnMut(usize) -> Tensor2) -> ArrayD<f64> {
    let size: usize = shape.iter().product();
    let mut values = vec![0.0; 9 * size];
    for (p, chunk) in values.chunks_mut(9).enumerate() {
        write_row_slice(&f(p), chunk);
    }
    let mut full = shape.to_vec();
    full.extend([3, 3]);
    ArrayD::from_shape_vec(IxDyn(&full), values).unwrap()
}

/// Second-order tensor stored at flat point `p` of an array shaped `[..., 3, 3]`.
pub fn point(a: &ArrayD<f64>, p: usize) -> Tensor2 {
    from_row_slice(&a.as_slice().unwrap()[9 * p..9 * p + 9])
}

/// `C : B` evaluated on an array tangent at flat point `p`.
pub fn contract_point(c: &ArrayD<f64>, p: usize, b: &Tensor2) -> Tensor2 {
    let c = &c.as_slice().unwrap()[81 * p..81 * p + 81];
    Tensor2::from_fn(|i, j| {
        let mut sum = 0.0;
        for k in 0..3 {
            for l in 0..3 {
                sum += c[27 * i + 9 * j + 3 * k + l] * b[(l, k)];
            }
        }
        sum
    })
}
