//! Elasto-plastic response of material points under an imposed strain.
//!
//! Two point models are available: [`Elastic`] and [`LinearHardening`] (von Mises
//! plasticity with linear isotropic hardening). An [`Array`] holds a collection of
//! points, each assigned one of the models, and evaluates all of them in parallel.
//!
//! ```
//! use elastoplastic::Array;
//! use ndarray::{Array2, Array4};
//!
//! let mut mat = Array::matrix(2, 4);
//! mat.set_linear_hardening(&Array2::<usize>::ones((2, 4)), 10.0, 1.0, 0.1, 0.2)?;
//!
//! let mut eps = Array4::<f64>::zeros((2, 4, 3, 3));
//! eps.slice_mut(ndarray::s![.., .., 0, 1]).fill(0.5);
//! eps.slice_mut(ndarray::s![.., .., 1, 0]).fill(0.5);
//! mat.set_strain(&eps, true)?;
//! let sig = mat.stress();
//! let epsp = mat.epsp();
//! mat.increment();
//! # assert_eq!(sig.shape(), &[2, 4, 3, 3]);
//! # assert!(epsp.iter().all(|&e| e > 0.0));
//! # Ok::<(), elastoplastic::MaterialError>(())
//! ```
pub mod array;
pub mod elastic;
pub mod error;
pub mod interfaces;
pub mod linear_hardening;
pub mod tensor;
mod version;

#[cfg(feature = "python")]
mod python;

pub use array::{Array, Type};
pub use elastic::Elastic;
pub use error::{MaterialError, Result};
pub use interfaces::MaterialPoint;
pub use linear_hardening::LinearHardening;
pub use tensor::{Tensor2, Tensor4};
pub use version::{version, version_dependencies};
