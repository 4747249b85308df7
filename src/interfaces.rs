use crate::error::{MaterialError, Result};
use crate::tensor::{from_row_slice, write_row_slice, write_row_slice4, Tensor2, Tensor4};

/// A single material point driven by its total strain.
///
/// `set_strain` computes the response for a new strain without touching the
/// history; `increment` commits the current state as the start of the next step.
/// Calling `set_strain` several times before `increment` (as a Newton solver does)
/// always starts from the same committed state.
pub trait MaterialPoint {
    fn kappa(&self) -> f64;
    fn mu(&self) -> f64;

    fn set_strain(&mut self, eps: &Tensor2, compute_tangent: bool);
    fn strain(&self) -> &Tensor2;
    fn stress(&self) -> &Tensor2;
    /// Only up to date if the last `set_strain` requested it.
    fn tangent(&self) -> &Tensor4;
    /// Current (not yet committed) equivalent plastic strain.
    fn epsp(&self) -> f64;
    fn increment(&mut self);

    /// Reads the strain from 9 row-major values.
    fn set_strain_slice(&mut self, eps: &[f64; 9], compute_tangent: bool) {
        self.set_strain(&from_row_slice(eps), compute_tangent);
    }
    fn write_strain(&self, out: &mut [f64]) {
        write_row_slice(self.strain(), out);
    }
    fn write_stress(&self, out: &mut [f64]) {
        write_row_slice(self.stress(), out);
    }
    fn write_tangent(&self, out: &mut [f64]) {
        write_row_slice4(self.tangent(), out);
    }
}

pub(crate) fn check_positive(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(MaterialError::InvalidParameter { name, value })
    }
}

pub(crate) fn check_non_negative(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(MaterialError::InvalidParameter { name, value })
    }
}
