use crate::error::Result;
use crate::interfaces::{check_positive, MaterialPoint};
use crate::tensor::{hydrostatic_deviatoric, i2, i4d, ii, Tensor2, Tensor4};

/// Linear elasticity: `σ = K tr(ε) I + 2G dev(ε)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Elastic {
    kappa: f64,
    mu: f64,
    eps: Tensor2,
    sig: Tensor2,
    tangent: Tensor4,
}

impl Elastic {
    /// `kappa` is the bulk modulus K, `mu` the shear modulus G.
    pub fn new(kappa: f64, mu: f64) -> Result<Self> {
        let kappa = check_positive("kappa", kappa)?;
        let mu = check_positive("mu", mu)?;
        Ok(Self {
            kappa,
            mu,
            eps: Tensor2::zeros(),
            sig: Tensor2::zeros(),
            tangent: elastic_tangent(kappa, mu),
        })
    }

    /// Stress for a given strain, without changing the state.
    pub fn compute_stress(&self, eps: &Tensor2) -> Tensor2 {
        let (epsm, epsd) = hydrostatic_deviatoric(eps);
        3.0 * self.kappa * epsm * i2() + 2.0 * self.mu * epsd
    }

    /// Stress and (constant) tangent for a given strain, without changing the state.
    pub fn compute_tangent(&self, eps: &Tensor2) -> (Tensor2, Tensor4) {
        (self.compute_stress(eps), self.tangent)
    }
}

/// `C = K II + 2G I4d`
pub(crate) fn elastic_tangent(kappa: f64, mu: f64) -> Tensor4 {
    kappa * *ii() + 2.0 * mu * *i4d()
}

impl MaterialPoint for Elastic {
    fn kappa(&self) -> f64 {
        self.kappa
    }

    fn mu(&self) -> f64 {
        self.mu
    }

    fn set_strain(&mut self, eps: &Tensor2, _compute_tangent: bool) {
        self.eps = *eps;
        self.sig = self.compute_stress(eps);
    }

    fn strain(&self) -> &Tensor2 {
        &self.eps
    }

    fn stress(&self) -> &Tensor2 {
        &self.sig
    }

    fn tangent(&self) -> &Tensor4 {
        &self.tangent
    }

    fn epsp(&self) -> f64 {
        0.0
    }

    fn increment(&mut self) {}
}
